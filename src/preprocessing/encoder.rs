//! Categorical encoding

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use super::UnknownCategoryPolicy;

/// Type of encoder to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncoderType {
    /// One indicator column per known category
    OneHot,
    /// Integer code from the column vocabulary
    Label,
}

/// Outcome of encoding one categorical value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    /// Seen during fit; index into the sorted vocabulary
    Known(usize),
    /// Unseen; substituted by the fallback class
    Fallback(usize),
    /// Unseen; encodes to all zeros
    Ignored,
}

impl Encoded {
    /// Vocabulary index used for the output, if any
    pub fn code(&self) -> Option<usize> {
        match self {
            Encoded::Known(c) | Encoded::Fallback(c) => Some(*c),
            Encoded::Ignored => None,
        }
    }
}

/// Categorical encoder with one sorted vocabulary per categorical column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    encoder_type: EncoderType,
    unknown_policy: UnknownCategoryPolicy,
    vocabularies: Vec<Vec<String>>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(encoder_type: EncoderType, unknown_policy: UnknownCategoryPolicy) -> Self {
        Self {
            encoder_type,
            unknown_policy,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the vocabulary of each (already imputed) categorical column
    pub fn fit(&mut self, columns: &[Vec<String>]) -> Result<&mut Self> {
        self.vocabularies = columns
            .iter()
            .map(|values| {
                let mut vocab: Vec<String> = values.to_vec();
                vocab.sort();
                vocab.dedup();
                vocab
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    pub fn encoder_type(&self) -> EncoderType {
        self.encoder_type
    }

    pub fn vocabulary(&self, idx: usize) -> Option<&[String]> {
        self.vocabularies.get(idx).map(|v| v.as_slice())
    }

    /// Encode a value of categorical column `idx`; unseen values never fail.
    pub fn encode(&self, idx: usize, value: &str) -> Result<Encoded> {
        let vocab = self.vocabulary_checked(idx)?;

        Ok(match vocab.binary_search_by(|known| known.as_str().cmp(value)) {
            Ok(code) => Encoded::Known(code),
            Err(_) => match self.unknown_policy {
                UnknownCategoryPolicy::FirstKnown if !vocab.is_empty() => Encoded::Fallback(0),
                _ => Encoded::Ignored,
            },
        })
    }

    /// Number of output columns for categorical column `idx`
    pub fn width(&self, idx: usize) -> Result<usize> {
        let vocab = self.vocabulary_checked(idx)?;
        Ok(match self.encoder_type {
            EncoderType::OneHot => vocab.len(),
            EncoderType::Label => 1,
        })
    }

    /// Write the encoding of `value` into `out`, which must be `width(idx)` long
    pub fn write(&self, idx: usize, value: &str, out: &mut [f64]) -> Result<Encoded> {
        let encoded = self.encode(idx, value)?;

        match self.encoder_type {
            EncoderType::OneHot => {
                out.iter_mut().for_each(|v| *v = 0.0);
                if let Some(code) = encoded.code() {
                    out[code] = 1.0;
                }
            }
            EncoderType::Label => {
                // Ignored cannot occur here: label encoding always has a fallback
                out[0] = encoded.code().unwrap_or(0) as f64;
            }
        }

        Ok(encoded)
    }

    /// Output column names for categorical column `idx` named `name`
    pub fn output_names(&self, idx: usize, name: &str) -> Result<Vec<String>> {
        let vocab = self.vocabulary_checked(idx)?;
        Ok(match self.encoder_type {
            EncoderType::OneHot => vocab.iter().map(|cat| format!("{}={}", name, cat)).collect(),
            EncoderType::Label => vec![name.to_string()],
        })
    }

    fn vocabulary_checked(&self, idx: usize) -> Result<&[String]> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }
        self.vocabulary(idx).ok_or_else(|| {
            PricingError::PreprocessingError(format!("no vocabulary for categorical column {}", idx))
        })
    }
}
