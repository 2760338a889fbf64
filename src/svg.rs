use crate::fonts::get_font;
use crate::resolve::ImageSpec;

/// Render an [`ImageSpec`] into SVG markup: a full-canvas background rect
/// and a centered, possibly multi-line label. Pure function; all inputs
/// are pre-validated by the resolver.
pub fn render_svg(spec: &ImageSpec) -> String {
    let width = spec.width;
    let height = spec.height;
    let font = get_font(&spec.font);

    let font_size = (width.min(height) as f32 / 8.0).max(12.0);
    let safe_label = escape_xml(&spec.label);

    let lines: Vec<&str> = safe_label.split('\n').collect();
    let line_height = font_size * 1.2;
    let total_height = lines.len() as f32 * line_height;
    let start_y = (height as f32 - total_height) / 2.0 + font_size * 0.35;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    // The stylesheet import only matters when a browser displays the
    // markup; the raster stage resolves the family from the system font
    // database instead.
    svg.push_str(&format!(
        "<defs><style>@import url('{}');</style></defs>",
        escape_xml(&font.url)
    ));

    let fill = if spec.background == "transparent" {
        "none"
    } else {
        spec.background.as_str()
    };
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{fill}\"/>"
    ));

    svg.push_str(&format!(
        "<text x=\"50%\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}, system-ui, sans-serif\" font-size=\"{font_size:.2}\" font-weight=\"400\" fill=\"{}\">",
        font.family, spec.text_color
    ));
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            svg.push_str(&format!("<tspan x=\"50%\" dy=\"0\">{line}</tspan>"));
        } else {
            svg.push_str(&format!("<tspan x=\"50%\" dy=\"{line_height:.2}\">{line}</tspan>"));
        }
    }
    svg.push_str("</text>");

    svg.push_str("</svg>");
    svg
}

/// Escape the five XML metacharacters. Label content must never be able
/// to inject markup.
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
