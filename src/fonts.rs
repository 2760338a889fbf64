use once_cell::sync::Lazy;

/// A display font: the CSS family name plus the stylesheet URL embedded in
/// vector output so browsers can fetch it. Raster output falls back to
/// whatever the system font database resolves for the family.
#[derive(Debug, Clone)]
pub struct Font {
    pub id: &'static str,
    pub family: &'static str,
    pub url: String,
}

const DEFAULT_FONT: usize = 0;

static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    let entries: &[(&str, &str)] = &[
        // Sans-serif
        ("lato", "Lato"),
        ("roboto", "Roboto"),
        ("opensans", "Open Sans"),
        ("montserrat", "Montserrat"),
        ("poppins", "Poppins"),
        ("raleway", "Raleway"),
        ("oswald", "Oswald"),
        ("noto", "Noto Sans"),
        ("ptsans", "PT Sans"),
        ("sourcesans", "Source Sans 3"),
        ("inter", "Inter"),
        // Serif
        ("lora", "Lora"),
        ("playfair", "Playfair Display"),
        ("merriweather", "Merriweather"),
        // Monospace
        ("mono", "JetBrains Mono"),
        ("fira", "Fira Code"),
    ];
    entries
        .iter()
        .map(|&(id, family)| Font {
            id,
            family,
            url: format!(
                "https://fonts.googleapis.com/css2?family={}:wght@400;700&display=swap",
                family.replace(' ', "+")
            ),
        })
        .collect()
});

/// Look up a font by identifier. Lookup is case-insensitive and ignores
/// spaces and hyphens; unknown identifiers fall back to the default.
pub fn get_font(name: &str) -> &'static Font {
    let key: String = name
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    FONTS
        .iter()
        .find(|font| font.id == key)
        .unwrap_or(&FONTS[DEFAULT_FONT])
}

pub fn available_fonts() -> impl Iterator<Item = &'static str> {
    FONTS.iter().map(|font| font.id)
}
