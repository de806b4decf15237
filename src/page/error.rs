use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page has no header line")]
    MissingHeader,

    #[error("Malformed page header: {0}")]
    MalformedHeader(String),

    #[error("Malformed index entry: {0}")]
    MalformedEntry(String),

    #[error("Record head page has no owner line: {0}")]
    MissingOwner(String),
}

pub type PageResult<T> = Result<T, PageError>;
