use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Build a `[rows, columns]` integer tensor from row-major values
pub fn int_matrix<B: Backend>(
    values: &[u32],
    rows: usize,
    columns: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    Tensor::from_data(
        Data::new(
            values.iter().map(|&e| (e as i64).elem()).collect(),
            Shape::new([rows, columns]),
        ),
        device,
    )
}

/// Build a 1D integer tensor, typically a batch of class ids
pub fn int_vector<B: Backend>(values: &[i64], device: &B::Device) -> Tensor<B, 1, Int> {
    Tensor::from_data(
        Data::new(
            values.iter().map(|&e| e.elem()).collect(),
            Shape::new([values.len()]),
        ),
        device,
    )
}

/// Copy a 2D float tensor into row vectors
pub fn float_rows<B: Backend>(tensor: Tensor<B, 2>) -> Vec<Vec<f64>> {
    let [_, columns] = tensor.dims();

    tensor
        .into_data()
        .convert::<f64>()
        .value
        .chunks(columns.max(1))
        .map(<[f64]>::to_vec)
        .collect()
}
