//! QR Rendering
//!
//! Encoding is delegated to the `qrcode` crate; this module only lays the
//! module matrix out, either as RGBA pixels (PNG) or as SVG paths.

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use qrcode::QrCode;

use crate::error::{QrError, Result};
use crate::options::{OutputFormat, QrOptions};

/// Pixels per module when the requested size is too small for the symbol
const FALLBACK_SCALE: f64 = 4.0;

/// Validated text plus render options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrRequest {
    text: String,
    options: QrOptions,
}

impl QrRequest {
    pub fn new(text: &str, options: QrOptions) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QrError::EmptyText);
        }
        options.validate()?;

        Ok(Self {
            text: text.to_string(),
            options,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn options(&self) -> &QrOptions {
        &self.options
    }
}

/// Square grid of dark/light modules, without quiet zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at (`row`, `col`) is dark
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.dark[row * self.width + col]
    }
}

/// Encode the request's text into a module matrix
pub fn encode(request: &QrRequest) -> Result<QrMatrix> {
    let code = QrCode::with_error_correction_level(
        request.text.as_bytes(),
        request.options.ecc.to_qrcode(),
    )?;

    Ok(QrMatrix {
        width: code.width(),
        dark: code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect(),
    })
}

/// Pixel geometry for a matrix at a given size and margin
#[derive(Clone, Copy, Debug, PartialEq)]
struct Layout {
    /// Symbol width in modules, quiet zone included
    modules: u32,
    scale: f64,
    /// Output width and height in pixels
    pixels: u32,
    /// Quiet zone width in pixels
    margin_px: u32,
}

impl Layout {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn new(matrix_width: usize, options: &QrOptions) -> Self {
        let modules = u32::try_from(matrix_width).unwrap_or(u32::MAX) + options.margin * 2;
        let (scale, pixels) = if options.size >= modules {
            (f64::from(options.size) / f64::from(modules), options.size)
        } else {
            (FALLBACK_SCALE, modules * FALLBACK_SCALE as u32)
        };

        Self {
            modules,
            scale,
            pixels,
            margin_px: (f64::from(options.margin) * scale).floor() as u32,
        }
    }

    /// Module coordinate for a pixel coordinate, `None` inside the quiet zone
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn module_at(&self, px: u32, matrix_width: usize) -> Option<usize> {
        if px < self.margin_px || px >= self.pixels - self.margin_px {
            return None;
        }
        let module = (f64::from(px - self.margin_px) / self.scale).floor() as usize;
        Some(module.min(matrix_width - 1))
    }
}

/// Render to RGBA pixels
pub fn render_image(request: &QrRequest) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let matrix = encode(request)?;
    let options = &request.options;
    let layout = Layout::new(matrix.width(), options);

    let dark = Rgba(options.dark.rgba());
    let light = Rgba(options.light.rgba());

    let image = ImageBuffer::from_fn(layout.pixels, layout.pixels, |x, y| {
        let row = layout.module_at(y, matrix.width());
        let col = layout.module_at(x, matrix.width());
        match (row, col) {
            (Some(row), Some(col)) if matrix.is_dark(row, col) => dark,
            _ => light,
        }
    });

    tracing::debug!(
        modules = layout.modules,
        pixels = layout.pixels,
        ecc = ?options.ecc,
        "Rendered QR image"
    );

    Ok(image)
}

/// Render to PNG bytes
pub fn render_png(request: &QrRequest) -> Result<Vec<u8>> {
    let image = DynamicImage::ImageRgba8(render_image(request)?);

    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;

    Ok(bytes.into_inner())
}

/// Render to an SVG document
///
/// The `viewBox` is in module units, so the image scales cleanly; `width`
/// and `height` carry the requested pixel size.
pub fn render_svg(request: &QrRequest) -> Result<String> {
    let matrix = encode(request)?;
    let options = &request.options;
    let layout = Layout::new(matrix.width(), options);
    let margin = options.margin as usize;

    let mut dark_path = String::new();
    for row in 0..matrix.width() {
        let mut col = 0;
        while col < matrix.width() {
            if !matrix.is_dark(row, col) {
                col += 1;
                continue;
            }
            let start = col;
            while col < matrix.width() && matrix.is_dark(row, col) {
                col += 1;
            }
            let run = col - start;
            dark_path.push_str(&format!(
                "M{} {}h{run}v1h-{run}z",
                start + margin,
                row + margin
            ));
        }
    }

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{px}" height="{px}" viewBox="0 0 {m} {m}" shape-rendering="crispEdges">"#,
        px = layout.pixels,
        m = layout.modules,
    );
    if options.light.a > 0 {
        svg.push_str(&format!(
            r#"<path fill="{}"{} d="M0 0h{m}v{m}H0z"/>"#,
            options.light.hex(),
            opacity_attr(options.light.opacity()),
            m = layout.modules,
        ));
    }
    svg.push_str(&format!(
        r#"<path fill="{}"{} d="{dark_path}"/></svg>"#,
        options.dark.hex(),
        opacity_attr(options.dark.opacity()),
    ));

    Ok(svg)
}

fn opacity_attr(opacity: Option<String>) -> String {
    opacity
        .map(|o| format!(r#" fill-opacity="{o}""#))
        .unwrap_or_default()
}

/// A rendered image ready to be served or saved
#[derive(Clone, Debug)]
pub struct RenderedQr {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: &'static str,
}

/// Render in the requested format
pub fn render(request: &QrRequest, format: OutputFormat) -> Result<RenderedQr> {
    let bytes = match format {
        OutputFormat::Png => render_png(request)?,
        OutputFormat::Svg => render_svg(request)?.into_bytes(),
    };

    Ok(RenderedQr {
        bytes,
        content_type: format.content_type(),
        file_name: format.file_name(),
    })
}
