pub mod html;
pub mod recorder;
pub mod svg;
pub mod tikz;

pub use html::HtmlSurface;
pub use recorder::Recorder;
pub use svg::SvgSurface;
pub use tikz::TikzSurface;

use anyhow::Result;
use std::path::Path;

/// One finished output document, named after the diagram it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

pub fn write_output_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
        }
        None => {
            print!("{}", text);
        }
    }
    Ok(())
}

/// Rasterizes an SVG document, multiplying its intrinsic size by `scale`.
#[cfg(feature = "png")]
pub fn render_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Courier New".to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate {width}x{height} pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    Ok(pixmap.encode_png()?)
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, scale: f32) -> Result<()> {
    let png = render_png(svg, scale)?;
    std::fs::write(output, png)?;
    Ok(())
}
