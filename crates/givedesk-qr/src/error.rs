//! QR Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, QrError>;

/// QR rendering errors
#[derive(Error, Debug)]
pub enum QrError {
    /// Nothing to encode
    #[error("Enter some text or a URL to generate a QR code.")]
    EmptyText,

    /// Size, margin, ECC level or color could not be used
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The encoder rejected the data (usually too long for the ECC level)
    #[error("Encode error: {0}")]
    Encode(String),

    /// PNG encoding failed
    #[error("Image error: {0}")]
    Image(String),
}

impl QrError {
    /// Stable code for API responses
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "EMPTY_TEXT",
            Self::InvalidOption(_) => "INVALID_OPTION",
            Self::Encode(_) => "ENCODE_FAILED",
            Self::Image(_) => "IMAGE_FAILED",
        }
    }

    /// Whether the caller can fix this by changing the input
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Image(_))
    }
}

impl From<qrcode::types::QrError> for QrError {
    fn from(err: qrcode::types::QrError) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<image::ImageError> for QrError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}
