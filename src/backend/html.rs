//! HTML page embedding one inline SVG per diagram, each behind a named
//! anchor so identifier links resolve within the page.

use super::Document;
use super::svg::{SvgSurface, escape_xml};
use crate::config::RenderConfig;
use crate::draw::{Arc, Class, Surface};
use crate::layout::{LayoutError, Point};
use crate::theme::Theme;

pub struct HtmlSurface {
    svg: SvgSurface,
    title: String,
    stylesheet: Option<String>,
}

impl HtmlSurface {
    pub fn new(theme: &Theme, render: &RenderConfig) -> Self {
        Self {
            svg: SvgSurface::inline(theme, render),
            title: "Grammar".to_string(),
            stylesheet: render.stylesheet.clone(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Assembles the page from every diagram drawn so far.
    pub fn finish(self) -> Document {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str(&format!("<title>{}</title>\n", escape_xml(&self.title)));
        html.push_str("<meta charset=\"utf-8\">\n");
        if let Some(href) = &self.stylesheet {
            html.push_str(&format!(
                "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n",
                escape_xml(href)
            ));
        }
        html.push_str("</head>\n<body>\n");
        for diagram in self.svg.into_documents() {
            html.push_str(&format!("<div><a name=\"{}\">", escape_xml(&diagram.name)));
            html.push_str(diagram.content.trim_end());
            html.push_str("</a></div>\n");
        }
        html.push_str("</body>\n</html>\n");
        Document {
            name: self.title,
            content: html,
        }
    }
}

impl Surface for HtmlSurface {
    fn begin_frame(&mut self, origin: Point) {
        self.svg.begin_frame(origin);
    }

    fn end_frame(&mut self) -> Result<(), LayoutError> {
        self.svg.end_frame()
    }

    fn begin_diagram(&mut self, x: f32, y: f32, w: f32, h: f32, name: &str) {
        self.svg.begin_diagram(x, y, w, h, name);
    }

    fn end_diagram(&mut self) -> Result<(), LayoutError> {
        self.svg.end_diagram()
    }

    fn begin_link(&mut self, name: &str) {
        self.svg.begin_link(name);
    }

    fn end_link(&mut self) {
        self.svg.end_link();
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        self.svg.rectangle(x, y, w, h, class);
    }

    fn rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        self.svg.rounded_rectangle(x, y, w, h, class);
    }

    fn circle(&mut self, x: f32, y: f32, r: f32, class: Class) {
        self.svg.circle(x, y, r, class);
    }

    fn text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.svg.text(x, y, w, h, text, class);
    }

    fn centered_text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.svg.centered_text(x, y, w, h, text, class);
    }

    fn begin_path(&mut self, x: f32, y: f32, class: Class) {
        self.svg.begin_path(x, y, class);
    }

    fn horizontal_to(&mut self, x: f32) {
        self.svg.horizontal_to(x);
    }

    fn vertical_to(&mut self, y: f32) {
        self.svg.vertical_to(y);
    }

    fn arc(&mut self, r: f32, arc: Arc) {
        self.svg.arc(r, arc);
    }

    fn arrow_head_left(&mut self, size: f32) {
        self.svg.arrow_head_left(size);
    }

    fn arrow_head_right(&mut self, size: f32) {
        self.svg.arrow_head_right(size);
    }

    fn arrow_head_down(&mut self, size: f32) {
        self.svg.arrow_head_down(size);
    }

    fn end_path(&mut self) {
        self.svg.end_path();
    }
}
