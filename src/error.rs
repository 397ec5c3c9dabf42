use thiserror::Error;

/// Error types for TableTalk
#[derive(Error, Debug)]
pub enum TableTalkError {
    #[error("Upload rejected: file is {size} bytes, maximum is {max} bytes")]
    UploadTooLarge { size: usize, max: usize },

    #[error("Upload rejected: unsupported file extension '{0}' (expected .csv or .xlsx)")]
    UnsupportedExtension(String),

    #[error("Upload rejected: malformed {format} data: {detail}")]
    MalformedUpload { format: String, detail: String },

    #[error("Failed to read uploaded file: {0}")]
    UploadRead(String),

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("No dataset loaded")]
    NoDataset,

    #[error("Inference transport error: {0}")]
    InferenceTransport(String),

    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),

    #[error("Speech capture timed out after {0} seconds")]
    CaptureTimeout(u64),

    #[error("Could not understand audio")]
    UnrecognizedSpeech,

    #[error("Speech service unavailable: {0}")]
    SpeechUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TableTalkError {
    /// True for failures the user can fix by changing their input,
    /// as opposed to service-side failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UploadTooLarge { .. }
                | Self::UnsupportedExtension(_)
                | Self::MalformedUpload { .. }
                | Self::EmptyQuestion
                | Self::NoDataset
        )
    }
}

/// Result type alias for TableTalk operations
pub type Result<T> = std::result::Result<T, TableTalkError>;
