use thiserror::Error;

/// Main error type for the Reelstitch library
#[derive(Error, Debug)]
pub enum AssemblerError {
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Media probing and synthesis errors
///
/// `OpenFailed` and `FormatMismatch` are per-asset conditions: batch callers
/// log them and continue with the remaining assets.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to open media file: {path} ({reason})")]
    OpenFailed { path: String, reason: String },

    #[error("Cannot normalize {path} to the output frame size: {reason}")]
    FormatMismatch { path: String, reason: String },

    #[error("Unsupported media format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Required tool not found on PATH: {tool}")]
    ToolMissing { tool: String },

    #[error("Fallback clip generation failed: {reason}")]
    FallbackFailed { reason: String },
}

/// Timeline reconciliation errors
#[derive(Error, Debug)]
pub enum TimelineError {
    /// No eligible video assets were available. Signals the fallback path,
    /// not a hard failure.
    #[error("No eligible video assets to reconcile")]
    EmptyInput,
}

/// Composition and encoding errors
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Video encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Output validation failed: {path} is {size} bytes (floor: {floor})")]
    ValidationFailed { path: String, size: u64, floor: u64 },

    #[error("Output generation failed: {reason}")]
    OutputFailed { reason: String },
}

/// Upstream provider errors (script, footage, narration)
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Script generation failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Footage fetch failed: {reason}")]
    FootageFailed { reason: String },

    #[error("Narration synthesis failed: {reason}")]
    NarrationFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using AssemblerError
pub type Result<T> = std::result::Result<T, AssemblerError>;

impl AssemblerError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Probing and provider calls might work on retry
            Self::Media(MediaError::OpenFailed { .. }) => true,
            Self::Provider(_) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Media(MediaError::OpenFailed { path, .. }) => {
                format!("Could not open media file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Media(MediaError::ToolMissing { tool }) => {
                format!("'{}' was not found on PATH. Please install FFmpeg.", tool)
            }
            Self::Compose(ComposeError::ValidationFailed { path, .. }) => {
                format!("The encoded output '{}' was below the minimum size and has been removed.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
