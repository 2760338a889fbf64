use crate::error::{Error, Result};
use crate::fonts::get_font;
use crate::format::ImageFormat;
use crate::resolve::ImageSpec;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Fixed internal render density. Scale was already applied to the pixel
/// dimensions by the resolver; this only improves small-text
/// antialiasing.
const RASTER_DPI: f32 = 150.0;

const JPEG_QUALITY: u8 = 85;
const AVIF_SPEED: u8 = 6;
const AVIF_QUALITY: u8 = 80;

/// System font database, loaded once and shared across renders.
static FONTDB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

/// Convert vector markup into encoded raster bytes.
///
/// The format argument is taken on its own rather than trusted from
/// `spec.format`; anything that is not a raster format encodes as png.
pub fn rasterize(svg: &str, format: ImageFormat, spec: &ImageSpec) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.dpi = RASTER_DPI;
    opt.font_family = get_font(&spec.font).family.to_string();
    opt.fontdb = FONTDB.clone();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or(Error::Pixmap {
            width: size.width(),
            height: size.height(),
        })?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);

    let (width, height) = (size.width(), size.height());
    let rgba = demultiply(&pixmap);
    encode(&rgba, width, height, format)
}

fn encode(rgba: &[u8], width: u32, height: u32, format: ImageFormat) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        ImageFormat::Webp => {
            WebPEncoder::new_lossless(&mut out).write_image(
                rgba,
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel: flatten onto opaque white before
            // encoding.
            let rgb = flatten_onto_white(rgba);
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).write_image(
                &rgb,
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Avif => {
            AvifEncoder::new_with_speed_quality(&mut out, AVIF_SPEED, AVIF_QUALITY)
                .write_image(rgba, width, height, ExtendedColorType::Rgba8)?;
        }
        // png, plus the defensive fallback for anything unexpected.
        ImageFormat::Png | ImageFormat::Svg => {
            PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive)
                .write_image(rgba, width, height, ExtendedColorType::Rgba8)?;
        }
    }
    Ok(out)
}

/// tiny-skia pixmaps are premultiplied; the encoders expect straight
/// alpha.
fn demultiply(pixmap: &resvg::tiny_skia::Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    rgba
}

fn flatten_onto_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for pixel in rgba.chunks_exact(4) {
        let alpha = pixel[3] as u16;
        for channel in &pixel[..3] {
            rgb.push(((*channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::render_svg;

    fn spec(background: &str, format: ImageFormat) -> ImageSpec {
        ImageSpec {
            width: 64,
            height: 48,
            background: background.to_string(),
            text_color: "#555555".to_string(),
            label: "64 x 48".to_string(),
            font: "lato".to_string(),
            format,
        }
    }

    fn render(background: &str, format: ImageFormat) -> Vec<u8> {
        let spec = spec(background, format);
        let svg = render_svg(&spec);
        rasterize(&svg, format, &spec).expect("rasterize failed")
    }

    #[test]
    fn png_output_has_magic_and_dimensions() {
        let bytes = render("#336699", ImageFormat::Png);
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn webp_output_has_riff_header() {
        let bytes = render("#336699", ImageFormat::Webp);
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn transparent_png_keeps_alpha() {
        let bytes = render("transparent", ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        // Corner is outside the centered label, so it stays transparent.
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn jpeg_flattens_transparency_onto_white() {
        let bytes = render("transparent", ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        let rgb = decoded.to_rgb8();
        let corner = rgb.get_pixel(0, 0);
        // Allow for jpeg noise around pure white.
        assert!(corner[0] > 250 && corner[1] > 250 && corner[2] > 250);
    }

    #[test]
    fn svg_format_takes_the_png_fallback_path() {
        let bytes = render("#336699", ImageFormat::Svg);
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn flatten_math() {
        // Fully transparent pixel becomes white.
        assert_eq!(flatten_onto_white(&[10, 20, 30, 0]), vec![255, 255, 255]);
        // Fully opaque pixel is unchanged.
        assert_eq!(flatten_onto_white(&[10, 20, 30, 255]), vec![10, 20, 30]);
    }
}
