//! Flow pipeline error types.

use thiserror::Error;

/// Errors that can occur while reading events into the flow pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A record in the input stream is missing a required field or has the
    /// wrong type for it.
    #[error("Invalid event at record {index}: {field} {problem}")]
    InvalidEvent {
        index: usize,
        field: &'static str,
        problem: &'static str,
    },

    /// The payload could not be encoded as JSON.
    #[error("Failed to encode payload: {message}")]
    Encoding { message: String },
}

impl FlowError {
    /// Create an error for a required field that is absent.
    pub fn missing_field(index: usize, field: &'static str) -> Self {
        Self::InvalidEvent {
            index,
            field,
            problem: "is missing",
        }
    }

    /// Create an error for a field whose value has the wrong type.
    pub fn invalid_field(index: usize, field: &'static str) -> Self {
        Self::InvalidEvent {
            index,
            field,
            problem: "has an invalid value",
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::encoding(err.to_string())
    }
}

/// Errors reported by an [`crate::store::EventStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected one of its records.
    #[error(transparent)]
    InvalidRecord(#[from] FlowError),

    /// The store could not be queried.
    #[error("Event store query failed: {message}")]
    QueryFailed { message: String },
}

impl StoreError {
    /// Create a query failed error.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }
}

/// Errors reported by a [`crate::pipeline::TextGenerator`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The prompt exceeded the generator's size or token limit.
    #[error("Prompt of {prompt_bytes} bytes exceeds the generation limit")]
    PayloadTooLarge { prompt_bytes: usize },

    /// The generator refused or failed the request.
    #[error("Text generation failed: {message}")]
    Failed { message: String },
}

impl GenerationError {
    /// Create a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Errors from a full analysis round trip.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
