//! # givedesk-qr
//!
//! QR code rendering for the givedesk QR widget.
//!
//! The `qrcode` crate produces the module matrix; this crate applies the
//! widget's options (pixel size, quiet zone, colors) and writes PNG or SVG.
//!
//! ```rust,ignore
//! use givedesk_qr::{render, OutputFormat, QrOptions, QrRequest};
//!
//! let request = QrRequest::new("https://example.com", QrOptions::default())?;
//! let svg = render(&request, OutputFormat::Svg)?;
//! ```

mod error;
mod options;
mod render;

pub use error::{QrError, Result};
pub use options::{
    Color, EccLevel, OutputFormat, QrOptions, DEFAULT_MARGIN, DEFAULT_SIZE, MAX_MARGIN, MAX_SIZE,
    MIN_SIZE,
};
pub use render::{
    encode, render, render_image, render_png, render_svg, QrMatrix, QrRequest, RenderedQr,
};
