use crate::storage::StorageError;

/// Custom error type for the personalization pipeline and its external collaborators.
#[derive(Debug)]
pub enum Error {
    /// Internal error: prompt substitution failed.
    PromptCreationFailure(subst::Error),

    /// Error calling ChatGPT.
    ChatGptError(async_openai::error::OpenAIError),

    /// The completion API answered without any message content.
    EmptyCompletion,

    /// A completion provider failed for a reason of its own.
    CompletionFailure(String),

    /// HTTP request to an external service failed.
    HttpError(reqwest::Error),

    /// The Shopify Admin API answered with something we cannot use.
    ShopifyError(String),

    /// Reading or writing a local file failed.
    IoError(std::io::Error),

    /// Page or asset storage failed.
    StorageError(StorageError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PromptCreationFailure(err) => write!(f, "Failed to create prompt: {}", err),
            Error::ChatGptError(err) => write!(f, "Error calling ChatGPT: {}", err),
            Error::EmptyCompletion => write!(f, "Completion API returned no content"),
            Error::CompletionFailure(msg) => write!(f, "Completion failed: {}", msg),
            Error::HttpError(err) => write!(f, "HTTP error: {}", err),
            Error::ShopifyError(msg) => write!(f, "Shopify API error: {}", msg),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::StorageError(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<subst::Error> for Error {
    fn from(err: subst::Error) -> Self {
        Error::PromptCreationFailure(err)
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Error::ChatGptError(err)
    }
}

/// Request errors occur when talking to Shopify or GitHub.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::StorageError(err)
    }
}
