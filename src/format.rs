use serde::{Deserialize, Serialize};

/// Output encodings. `Svg` is the vector fast path; everything else goes
/// through the raster stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
    Png,
    Webp,
    Jpeg,
    Avif,
}

impl ImageFormat {
    /// Strict membership test used by the positional ladder: only a token
    /// that is literally one of the supported format keywords (including
    /// the `jpg` alias) classifies as a format. Anything else is left to
    /// the color interpretation.
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Lenient parse for explicit format slots (a trailing extension or a
    /// p4 segment): strips a leading dot, applies aliases, and falls back
    /// to svg for anything unrecognized. Never errors.
    pub fn from_token(token: &str) -> Self {
        let token = token.strip_prefix('.').unwrap_or(token);
        Self::from_keyword(token).unwrap_or(Self::Svg)
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Avif => "image/avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
            Self::Avif => "avif",
        }
    }

    pub fn is_raster(self) -> bool {
        !matches!(self, Self::Svg)
    }
}
