use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("duplicate field term in ontology: {0}")]
    DuplicateTerm(String),

    #[error("ontology parent chain loops through: {}", .0.join(", "))]
    ParentCycle(Vec<String>),

    #[error("more than one filter targets field {0}")]
    DuplicateFilterField(String),

    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
