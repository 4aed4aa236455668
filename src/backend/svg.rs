//! Standalone SVG documents, one per diagram.

use super::Document;
use crate::config::RenderConfig;
use crate::draw::{Arc, Class, FrameStack, Surface};
use crate::layout::{LayoutError, Point};
use crate::theme::Theme;

pub struct SvgSurface {
    theme: Theme,
    stylesheet: Option<String>,
    standalone: bool,
    frames: FrameStack,
    buf: String,
    name: Option<String>,
    path: String,
    path_class: Class,
    documents: Vec<Document>,
}

impl SvgSurface {
    pub fn new(theme: &Theme, render: &RenderConfig) -> Self {
        Self {
            theme: theme.clone(),
            stylesheet: render.stylesheet.clone(),
            standalone: true,
            frames: FrameStack::new(),
            buf: String::new(),
            name: None,
            path: String::new(),
            path_class: Class::Line,
            documents: Vec::new(),
        }
    }

    /// Documents without the XML prolog, for embedding in a page.
    pub fn inline(theme: &Theme, render: &RenderConfig) -> Self {
        Self {
            standalone: false,
            ..Self::new(theme, render)
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    fn style_block(&self) -> String {
        let t = &self.theme;
        let mut css = String::new();
        css.push_str(&format!(
            ".line{{fill:none;stroke:{};stroke-width:{}px;stroke-linecap:round}}",
            t.line_color, t.line_width
        ));
        css.push_str(&format!(".arrow,.end{{fill:{};stroke:none}}", t.line_color));
        css.push_str(&format!(
            ".box,.prod{{fill:{};stroke:{};stroke-width:{}px}}",
            t.box_fill, t.line_color, t.line_width
        ));
        let leaves = [Class::Literal, Class::Identifier, Class::Other, Class::Title]
            .map(|class| format!("rect.{}", class.name()))
            .join(",");
        css.push_str(&format!(
            "{}{{fill:{};stroke:{};stroke-width:{}px}}",
            leaves, t.box_fill, t.line_color, t.line_width
        ));
        for class in [Class::Literal, Class::Identifier, Class::Other, Class::Title] {
            css.push_str(&format!(
                "text.{}{{font-family:{};font-size:{}px;font-weight:{};fill:{}}}",
                class.name(),
                t.font_family,
                t.font_size,
                t.font_weight,
                t.text_fill(class)
            ));
        }
        css.push_str(&format!(
            "text.prod{{font-family:{};font-size:{}px;font-weight:{};fill:{};stroke:none}}",
            t.font_family, t.font_size, t.font_weight, t.text_color
        ));
        format!("<style>{}</style>", escape_xml(&css))
    }

    fn text_element(&mut self, x: f32, y: f32, anchor: Option<&str>, text: &str, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        let anchor = anchor
            .map(|a| format!(" text-anchor=\"{a}\""))
            .unwrap_or_default();
        self.buf.push_str(&format!(
            "<text class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" dominant-baseline=\"central\"{}>{}</text>",
            class.name(),
            p.x,
            p.y,
            anchor,
            escape_xml(text)
        ));
    }
}

impl Surface for SvgSurface {
    fn begin_frame(&mut self, origin: Point) {
        self.frames.push(origin);
    }

    fn end_frame(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()
    }

    fn begin_diagram(&mut self, x: f32, y: f32, w: f32, h: f32, name: &str) {
        let (width, height) = (w.ceil() + 1.0, h.ceil() + 1.0);
        self.buf.clear();
        if self.standalone {
            self.buf
                .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
            if let Some(href) = &self.stylesheet {
                self.buf.push_str(&format!(
                    "<?xml-stylesheet href=\"{}\" type=\"text/css\"?>\n",
                    escape_xml(href)
                ));
            }
        }
        self.buf.push_str(&format!(
            "<svg overflow=\"visible\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}px\" height=\"{height}px\" viewBox=\"0 0 {width} {height}\">",
        ));
        if self.stylesheet.is_none() {
            let style = self.style_block();
            self.buf.push_str(&style);
        }
        if self.theme.has_background() {
            self.buf.push_str(&format!(
                "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
                escape_xml(&self.theme.background)
            ));
        }
        self.name = Some(name.to_string());
        self.frames.push(Point::new(-x, -y));
    }

    fn end_diagram(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()?;
        self.buf.push_str("</svg>\n");
        self.documents.push(Document {
            name: self.name.take().unwrap_or_default(),
            content: std::mem::take(&mut self.buf),
        });
        Ok(())
    }

    fn begin_link(&mut self, name: &str) {
        self.buf
            .push_str(&format!("<a xlink:href=\"#{}\">", escape_xml(name)));
    }

    fn end_link(&mut self) {
        self.buf.push_str("</a>");
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "<rect class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/>",
            class.name(),
            p.x + 0.5,
            p.y + 0.5,
            w,
            h
        ));
    }

    fn rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "<rect class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\"/>",
            class.name(),
            p.x + 0.5,
            p.y + 0.5,
            w,
            h,
            h / 2.0,
            h / 2.0
        ));
    }

    fn circle(&mut self, x: f32, y: f32, r: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "<circle class=\"{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\"/>",
            class.name(),
            p.x + 0.5,
            p.y + 0.5,
            r
        ));
    }

    fn text(&mut self, x: f32, y: f32, _w: f32, h: f32, text: &str, class: Class) {
        self.text_element(x, y + h / 2.0, None, text, class);
    }

    fn centered_text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.text_element(x + w / 2.0, y + h / 2.0, Some("middle"), text, class);
    }

    fn begin_path(&mut self, x: f32, y: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.path = format!("M {:.2} {:.2}", p.x, p.y);
        self.path_class = class;
    }

    fn horizontal_to(&mut self, x: f32) {
        self.path.push_str(&format!(" H {:.2}", self.frames.x(x)));
    }

    fn vertical_to(&mut self, y: f32) {
        self.path.push_str(&format!(" V {:.2}", self.frames.y(y)));
    }

    fn arc(&mut self, r: f32, arc: Arc) {
        let d = arc.delta(r);
        self.path.push_str(&format!(
            " a {:.2} {:.2} 0 0 {} {:.2} {:.2}",
            r,
            r,
            u8::from(arc.clockwise()),
            d.x,
            d.y
        ));
    }

    fn arrow_head_left(&mut self, size: f32) {
        self.path.push_str(&format!(
            " l {:.2} {:.2} 0 {:.2} z",
            size,
            size / 2.0,
            -size
        ));
    }

    fn arrow_head_right(&mut self, size: f32) {
        self.path.push_str(&format!(
            " l {:.2} {:.2} 0 {:.2} z",
            -size,
            -size / 2.0,
            size
        ));
    }

    fn arrow_head_down(&mut self, size: f32) {
        self.path.push_str(&format!(
            " l {:.2} {:.2} {:.2} 0 z",
            -size / 2.0,
            -size,
            size
        ));
    }

    fn end_path(&mut self) {
        let d = std::mem::take(&mut self.path);
        self.buf.push_str(&format!(
            "<path class=\"{}\" d=\"{}\"/>",
            self.path_class.name(),
            d
        ));
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
