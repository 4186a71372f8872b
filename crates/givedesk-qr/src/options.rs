//! Render Options
//!
//! Mirrors the widget's form fields: size, margin, ECC level and two colors.
//! Raw field values are parsed leniently, the way the form always has been:
//! unparsable numbers fall back to defaults, sizes are clamped.

use std::fmt;
use std::str::FromStr;

use qrcode::EcLevel;
use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};

pub const DEFAULT_SIZE: u32 = 256;
pub const MIN_SIZE: u32 = 64;
pub const MAX_SIZE: u32 = 4096;
pub const DEFAULT_MARGIN: u32 = 4;
pub const MAX_MARGIN: u32 = 64;

/// Error correction level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EccLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl EccLevel {
    pub(crate) const fn to_qrcode(self) -> EcLevel {
        match self {
            Self::L => EcLevel::L,
            Self::M => EcLevel::M,
            Self::Q => EcLevel::Q,
            Self::H => EcLevel::H,
        }
    }
}

impl FromStr for EccLevel {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "l" | "low" => Ok(Self::L),
            "m" | "medium" => Ok(Self::M),
            "q" | "quartile" => Ok(Self::Q),
            "h" | "high" => Ok(Self::H),
            other => Err(QrError::InvalidOption(format!(
                "unknown error correction level {other:?}"
            ))),
        }
    }
}

/// RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rrggbb`, without alpha
    pub fn hex(self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }

    /// Alpha as an SVG opacity, `None` when fully opaque
    pub fn opacity(self) -> Option<String> {
        (self.a < 0xff).then(|| format!("{:.2}", f32::from(self.a) / 255.0))
    }
}

impl FromStr for Color {
    type Err = QrError;

    /// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return Err(QrError::InvalidOption(format!("invalid color {s:?}"))),
        };

        let bytes = hex::decode(&expanded)
            .map_err(|_| QrError::InvalidOption(format!("invalid color {s:?}")))?;

        Ok(match bytes.as_slice() {
            [r, g, b] => Self::rgb(*r, *g, *b),
            [r, g, b, a] => Self { r: *r, g: *g, b: *b, a: *a },
            _ => return Err(QrError::InvalidOption(format!("invalid color {s:?}"))),
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "{}", self.hex())
        } else {
            write!(f, "{}{:02x}", self.hex(), self.a)
        }
    }
}

/// Everything that shapes the rendered image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrOptions {
    /// Requested image width and height in pixels
    pub size: u32,

    /// Quiet zone in modules
    pub margin: u32,

    pub ecc: EccLevel,

    pub dark: Color,

    pub light: Color,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            margin: DEFAULT_MARGIN,
            ecc: EccLevel::default(),
            dark: Color::BLACK,
            light: Color::WHITE,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Leading integer of a form value, so `"300px"` reads as 300 and `"2.5"` as 2
///
/// Accepts an optional sign; `None` when no digits lead the value. Overlong
/// digit runs saturate.
fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl QrOptions {
    /// Build options from raw form values
    ///
    /// Numbers are read from their leading digits. Values without any use the
    /// defaults. The size is clamped to at least [`MIN_SIZE`] and the margin to
    /// at least 0. ECC level and colors must parse if present.
    pub fn from_raw(
        size: Option<&str>,
        margin: Option<&str>,
        ecc: Option<&str>,
        dark: Option<&str>,
        light: Option<&str>,
    ) -> Result<Self> {
        let size = non_empty(size)
            .and_then(leading_int)
            .map_or(DEFAULT_SIZE, |s| to_u32(s.max(i64::from(MIN_SIZE))));
        let margin = non_empty(margin)
            .and_then(leading_int)
            .map_or(DEFAULT_MARGIN, |m| to_u32(m.max(0)));

        let options = Self {
            size,
            margin,
            ecc: non_empty(ecc)
                .map(str::parse::<EccLevel>)
                .transpose()?
                .unwrap_or_default(),
            dark: non_empty(dark)
                .map(str::parse::<Color>)
                .transpose()?
                .unwrap_or(Color::BLACK),
            light: non_empty(light)
                .map(str::parse::<Color>)
                .transpose()?
                .unwrap_or(Color::WHITE),
        };
        options.validate()?;
        Ok(options)
    }

    /// Bound the image so a single request cannot allocate without limit
    pub fn validate(&self) -> Result<()> {
        if self.size > MAX_SIZE {
            return Err(QrError::InvalidOption(format!(
                "size must be at most {MAX_SIZE} pixels"
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(QrError::InvalidOption(format!(
                "margin must be at most {MAX_MARGIN} modules"
            )));
        }
        Ok(())
    }
}

/// Download format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Png => "qr.png",
            Self::Svg => "qr.svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(QrError::InvalidOption(format!("unknown format {other:?}"))),
        }
    }
}
