use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScourError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Timed out during {phase} after {secs}s")]
    Timeout { phase: &'static str, secs: u64 },

    #[error("Insufficient content: {got} chars extracted, need at least {min}")]
    InsufficientContent { got: usize, min: usize },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Could not extract content from {url} ({tier} tier: {reason})")]
    Extraction {
        url: String,
        tier: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScourError>;
