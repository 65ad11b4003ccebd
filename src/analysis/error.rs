use std::fmt;

/// Fatal conditions raised by the windowed entropy/volatility pipeline.
/// All of them are detected before any record is handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    InvalidConfiguration {
        reason: String,
    },
    MisalignedSequences {
        entropy_len: usize,
        volatility_len: usize,
        condition_len: usize,
    },
    /// The transition entropy estimator was handed a window with no symbols
    EmptyWindow,
    NonFinitePrice {
        index: usize,
        value: f64,
    },
}

impl PipelineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        PipelineError::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

impl std::error::Error for PipelineError {}
impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::InvalidConfiguration { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            PipelineError::MisalignedSequences {
                entropy_len,
                volatility_len,
                condition_len,
            } => write!(
                f,
                "Misaligned sequences: {} entropy values, {} volatility values, {} conditions",
                entropy_len, volatility_len, condition_len
            ),
            PipelineError::EmptyWindow => {
                write!(f, "Entropy requested for an empty window")
            }
            PipelineError::NonFinitePrice { index, value } => {
                write!(f, "Price at index {} is not finite ({})", index, value)
            }
        }
    }
}
