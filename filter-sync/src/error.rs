use facets_filter_core::FilterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("question {0} is not loaded")]
    UnknownQuestion(String),

    #[error("question {question_id} has no filter parameter {parameter_id}")]
    UnknownParameter {
        question_id: String,
        parameter_id: String,
    },

    #[error("field {0} is not a filterable field of this parameter")]
    UnknownField(String),

    #[error("filter parameter {0} has been unloaded")]
    Closed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
