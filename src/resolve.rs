use crate::color::normalize_color;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::fonts::get_font;
use crate::format::ImageFormat;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dimensions used when the size token has no parseable width. The
/// resolver is lenient by policy: a garbage size yields a default image,
/// not an error (`resolve_strict` is the opt-in failing variant).
const FALLBACK_SIZE: u32 = 400;

/// Maximum label length in code points, applied after newline conversion.
const MAX_LABEL_LEN: usize = 200;

/// Raw per-request input as split by the routing layer: the size segment,
/// up to three ambiguous positional segments, and the query parameters.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub size: String,
    pub positional: Vec<String>,
    pub text: Option<String>,
    pub font: Option<String>,
}

/// Validated, normalized rendering intent. Constructed once per request
/// by [`resolve`] and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub width: u32,
    pub height: u32,
    /// Normalized color token, or the literal `transparent`.
    pub background: String,
    pub text_color: String,
    pub label: String,
    /// Resolved font identifier (unknown values already mapped to the
    /// default).
    pub font: String,
    pub format: ImageFormat,
}

/// A positional path segment is either a format keyword or a color; the
/// membership test against the supported-format set always wins, so a
/// color that collides with a format name (literally "png") is
/// unreachable as a color value.
#[derive(Debug, Clone, PartialEq)]
pub enum PathToken {
    Format(ImageFormat),
    Color(String),
}

pub fn classify(token: &str) -> PathToken {
    match ImageFormat::from_keyword(token) {
        Some(format) => PathToken::Format(format),
        None => PathToken::Color(token.to_string()),
    }
}

static SCALE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@(\d+(?:\.\d+)?)x?$").unwrap());
static EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(svg|png|jpe?g|webp|avif)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedSize {
    pub width: u32,
    pub height: u32,
    /// Format taken from a trailing extension on the size token; applied
    /// last during resolution and wins over any positional format.
    pub format_override: Option<ImageFormat>,
    /// False when the token had no parseable numeric width and the
    /// fallback dimensions were used.
    pub had_width: bool,
}

/// Parse a size token: `W`, `WxH`, optional `@Nx` density suffix and
/// optional format extension (`600x400`, `400`, `300@2x`, `600x400.png`).
/// A missing height makes the image square; scale is capped and applied
/// before clamping.
pub fn parse_size(input: &str, config: &Config) -> ParsedSize {
    let mut size = input.trim().to_string();

    let mut scale = 1.0f32;
    let scale_match = SCALE_RE
        .captures(&size)
        .map(|caps| (caps.get(0).map_or(size.len(), |m| m.start()), caps[1].parse::<f32>()));
    if let Some((start, parsed)) = scale_match {
        // A degenerate @0x acts like no scale at all.
        scale = parsed
            .ok()
            .filter(|s| *s > 0.0)
            .unwrap_or(1.0)
            .min(config.max_scale);
        size.truncate(start);
    }

    let mut format_override = None;
    let ext_match = EXT_RE
        .captures(&size)
        .map(|caps| (caps.get(0).map_or(size.len(), |m| m.start()), ImageFormat::from_token(&caps[1])));
    if let Some((start, format)) = ext_match {
        format_override = Some(format);
        size.truncate(start);
    }

    let mut parts = size.split(['x', 'X', '×']);
    let width_raw = parts.next().and_then(leading_int);
    let height_raw = parts.next().and_then(leading_int);

    let had_width = width_raw.is_some();
    let width = width_raw.unwrap_or(FALLBACK_SIZE);
    let height = height_raw.unwrap_or(width);

    let clamp = |n: f32| -> u32 {
        (n.round() as u32).clamp(config.min_size, config.max_size)
    };

    ParsedSize {
        width: clamp(width as f32 * scale),
        height: clamp(height as f32 * scale),
        format_override,
        had_width,
    }
}

/// Leading-digits integer parse; zero counts as unparsed so `0x300`
/// still falls back rather than producing a degenerate width.
fn leading_int(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Turn raw path segments plus query parameters into an [`ImageSpec`].
///
/// Positional disambiguation is an ordered ladder: p2 is a format or the
/// background color; p3 (only reached when p2 was a color) is a format or
/// the text color; p4 (only reached when both were colors) is always a
/// format slot. At most one format fires, and a trailing extension on the
/// size token overrides it.
pub fn resolve(raw: &RawRequest, config: &Config) -> ImageSpec {
    let parsed = parse_size(&raw.size, config);
    build_spec(raw, parsed, config)
}

/// Like [`resolve`], but fails on a size token with no numeric width
/// instead of falling back to the default dimensions.
pub fn resolve_strict(raw: &RawRequest, config: &Config) -> Result<ImageSpec> {
    let parsed = parse_size(&raw.size, config);
    if !parsed.had_width {
        return Err(Error::InvalidDimension(raw.size.clone()));
    }
    Ok(build_spec(raw, parsed, config))
}

fn build_spec(raw: &RawRequest, parsed: ParsedSize, config: &Config) -> ImageSpec {
    let mut background = None;
    let mut text_color = None;
    let mut positional_format = None;

    for token in raw.positional.iter().take(3) {
        if background.is_some() && text_color.is_some() {
            // Both color slots filled: the last rung is a format slot no
            // matter what the token looks like.
            positional_format = Some(ImageFormat::from_token(token));
            break;
        }
        match classify(token) {
            PathToken::Format(format) => {
                positional_format = Some(format);
                break;
            }
            PathToken::Color(color) => {
                if background.is_none() {
                    background = Some(normalize_color(&color, &config.default_background));
                } else {
                    text_color = Some(normalize_color(&color, &config.default_text_color));
                }
            }
        }
    }

    let format = parsed
        .format_override
        .or(positional_format)
        .unwrap_or(ImageFormat::Svg);

    let label = normalize_text(raw.text.as_deref(), parsed.width, parsed.height);
    let font = get_font(raw.font.as_deref().unwrap_or(&config.default_font));

    ImageSpec {
        width: parsed.width,
        height: parsed.height,
        background: background.unwrap_or_else(|| config.default_background.clone()),
        text_color: text_color.unwrap_or_else(|| config.default_text_color.clone()),
        label,
        font: font.id.to_string(),
        format,
    }
}

/// Default the label to `"{width} x {height}"`, otherwise un-escape
/// literal `\n` sequences into real newlines, trim, and cap the length.
pub fn normalize_text(text: Option<&str>, width: u32, height: u32) -> String {
    match text {
        Some(text) if !text.is_empty() => text
            .replace("\\n", "\n")
            .trim()
            .chars()
            .take(MAX_LABEL_LEN)
            .collect(),
        _ => format!("{width} x {height}"),
    }
}
