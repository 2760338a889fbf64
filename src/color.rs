use once_cell::sync::Lazy;
use regex::Regex;

/// Named CSS colors accepted without further validation.
const NAMED_COLORS: &[&str] = &[
    "black", "white", "red", "green", "blue", "yellow", "orange", "purple",
    "pink", "cyan", "magenta", "gray", "grey", "silver", "maroon", "olive",
    "lime", "aqua", "teal", "navy", "fuchsia", "brown", "coral", "crimson",
    "gold", "indigo", "ivory", "khaki", "lavender", "lightblue", "lightgray",
    "lightgreen", "lightyellow", "darkblue", "darkgray", "darkgreen", "darkred",
];

static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-f]{3,4}|[0-9a-f]{6}|[0-9a-f]{8})$").unwrap());

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba?\s*\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})(?:\s*,\s*([\d.]+))?\s*\)$")
        .unwrap()
});

/// Validate and normalize a color token.
///
/// Accepts the `transparent` keyword, a fixed allow-list of named colors,
/// 3/4/6/8-digit hex with or without a leading `#` (normalized to include
/// it), and `rgb(r,g,b)` / `rgba(r,g,b,a)` with channels <= 255. Anything
/// else resolves to `fallback` silently; this function never errors.
pub fn normalize_color(color: &str, fallback: &str) -> String {
    let c = color.trim().to_ascii_lowercase();
    if c.is_empty() {
        return fallback.to_string();
    }

    if c == "transparent" {
        return c;
    }

    if NAMED_COLORS.contains(&c.as_str()) {
        return c;
    }

    if let Some(caps) = HEX_RE.captures(&c) {
        return format!("#{}", &caps[1]);
    }

    if let Some(caps) = RGB_RE.captures(&c) {
        let (r, g, b) = (&caps[1], &caps[2], &caps[3]);
        let in_range = |s: &str| s.parse::<u32>().map(|v| v <= 255).unwrap_or(false);
        if in_range(r) && in_range(g) && in_range(b) {
            return match caps.get(4) {
                Some(a) => format!("rgba({r},{g},{b},{})", a.as_str()),
                None => format!("rgb({r},{g},{b})"),
            };
        }
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "#555555";

    #[test]
    fn transparent_keyword_passes_through() {
        assert_eq!(normalize_color("transparent", FALLBACK), "transparent");
        assert_eq!(normalize_color("TRANSPARENT", FALLBACK), "transparent");
    }

    #[test]
    fn named_colors_pass_through_lowercased() {
        assert_eq!(normalize_color("Navy", FALLBACK), "navy");
        assert_eq!(normalize_color("  coral  ", FALLBACK), "coral");
    }

    #[test]
    fn hex_gains_leading_hash() {
        assert_eq!(normalize_color("ff5733", FALLBACK), "#ff5733");
        assert_eq!(normalize_color("#ff5733", FALLBACK), "#ff5733");
        assert_eq!(normalize_color("f00", FALLBACK), "#f00");
        assert_eq!(normalize_color("f00a", FALLBACK), "#f00a");
        assert_eq!(normalize_color("ff5733cc", FALLBACK), "#ff5733cc");
    }

    #[test]
    fn five_and_seven_digit_hex_are_rejected() {
        assert_eq!(normalize_color("ff573", FALLBACK), FALLBACK);
        assert_eq!(normalize_color("ff5733c", FALLBACK), FALLBACK);
    }

    #[test]
    fn rgb_channels_validated() {
        assert_eq!(normalize_color("rgb(255, 0, 128)", FALLBACK), "rgb(255,0,128)");
        assert_eq!(
            normalize_color("rgba(10, 20, 30, 0.5)", FALLBACK),
            "rgba(10,20,30,0.5)"
        );
        assert_eq!(normalize_color("rgb(256, 0, 0)", FALLBACK), FALLBACK);
    }

    #[test]
    fn garbage_resolves_to_fallback() {
        assert_eq!(normalize_color("not-a-color", FALLBACK), FALLBACK);
        assert_eq!(normalize_color("", FALLBACK), FALLBACK);
        assert_eq!(normalize_color("url(javascript:alert(1))", FALLBACK), FALLBACK);
    }
}
