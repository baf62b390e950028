use std::path::Path;

use log::debug;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{Error, Result};

/// Token ids, attention mask and token type ids for a sequence of texts, each stored row-major
/// with a fixed row length of `max_length`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encodings {
    /// Token ids
    pub input_ids: Vec<u32>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,

    /// Segment ids
    pub token_type_ids: Vec<u32>,

    /// Number of encoded texts
    pub rows: usize,

    /// Length of every row
    pub max_length: usize,
}

impl Encodings {
    /// An empty set of rows of the given length
    pub fn empty(max_length: usize) -> Self {
        Self {
            input_ids: Vec::new(),
            attention_mask: Vec::new(),
            token_type_ids: Vec::new(),
            rows: 0,
            max_length,
        }
    }

    /// The `[rows, max_length]` shape shared by all three arrays
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.max_length]
    }

    /// The number of encoded texts
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether no text was encoded
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The token ids of one row
    pub fn input_ids(&self, row: usize) -> &[u32] {
        &self.input_ids[self.span(row)]
    }

    /// The attention mask of one row
    pub fn attention_mask(&self, row: usize) -> &[u32] {
        &self.attention_mask[self.span(row)]
    }

    /// The token type ids of one row
    pub fn token_type_ids(&self, row: usize) -> &[u32] {
        &self.token_type_ids[self.span(row)]
    }

    /// Append the rows of another set encoded with the same row length
    pub fn append(&mut self, other: Encodings) {
        self.input_ids.extend(other.input_ids);
        self.attention_mask.extend(other.attention_mask);
        self.token_type_ids.extend(other.token_type_ids);
        self.rows += other.rows;
    }

    fn span(&self, row: usize) -> std::ops::Range<usize> {
        row * self.max_length..(row + 1) * self.max_length
    }
}

/// Converts normalized text into fixed-length encodings
#[derive(Clone)]
pub struct Encoder {
    tokenizer: Tokenizer,
    max_length: usize,
    pad_id: u32,
}

impl Encoder {
    /// Configure a tokenizer to truncate and pad every text to exactly `max_length` tokens
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::Config("max sequence length must be positive".into()));
        }

        let pad_token = "[PAD]".to_string();
        let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(0);

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| Error::Tokenizer(e.to_string()))?;

        Ok(Self {
            tokenizer,
            max_length,
            pad_id,
        })
    }

    /// Load a `tokenizer.json` file
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self> {
        let path = path.as_ref();

        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            Error::CheckpointLoad(format!(
                "unable to load tokenizer from {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::new(tokenizer, max_length)
    }

    /// The configured tokenizer
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// The fixed row length
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encode texts in `batch_size` chunks of roughly equal size, preserving order.
    ///
    /// Chunking bounds peak memory only; the result is the same for any `batch_size`.
    pub fn encode<S: AsRef<str>>(&self, texts: &[S], batch_size: usize) -> Result<Encodings> {
        if batch_size == 0 {
            return Err(Error::Config("encoding batch size must be positive".into()));
        }

        let chunk_size = (texts.len() / batch_size).max(1);

        let mut encodings = Encodings::empty(self.max_length);

        for chunk in texts.chunks(chunk_size) {
            encodings.append(self.encode_chunk(chunk)?);
        }

        debug!(
            "Encoded {} texts in chunks of {} into {:?}",
            texts.len(),
            chunk_size,
            encodings.shape()
        );

        Ok(encodings)
    }

    fn encode_chunk<S: AsRef<str>>(&self, texts: &[S]) -> Result<Encodings> {
        let inputs: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();

        let encoded = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| Error::Tokenizer(e.to_string()))?;

        let mut encodings = Encodings::empty(self.max_length);

        for encoding in encoded.iter() {
            self.push_fitted(&mut encodings.input_ids, encoding.get_ids(), self.pad_id);
            self.push_fitted(&mut encodings.attention_mask, encoding.get_attention_mask(), 0);
            self.push_fitted(&mut encodings.token_type_ids, encoding.get_type_ids(), 0);
            encodings.rows += 1;
        }

        Ok(encodings)
    }

    /// Push exactly `max_length` values, truncating or padding with `pad`
    fn push_fitted(&self, target: &mut Vec<u32>, values: &[u32], pad: u32) {
        let kept = values.len().min(self.max_length);

        target.extend_from_slice(&values[..kept]);
        target.extend(std::iter::repeat(pad).take(self.max_length - kept));
    }
}
