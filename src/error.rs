use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Malformed descriptor: {0}")]
    Descriptor(String),

    #[error("No element is selected in the locator finder")]
    NoFinderElement,

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
