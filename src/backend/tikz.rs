//! LaTeX output: one `figure` holding a `tikzpicture` per diagram.
//!
//! The picture is flipped with `yscale=-1` so render coordinates keep their
//! downward y axis. Lengths are written in em, 24 render units to the em.

use super::Document;
use crate::draw::{Arc, Class, FrameStack, Surface};
use crate::layout::{LayoutError, Point, TEXT_SIZE};

#[derive(Default)]
pub struct TikzSurface {
    frames: FrameStack,
    buf: String,
    name: Option<String>,
    path: String,
    pen: Point,
    documents: Vec<Document>,
}

fn em(v: f32) -> String {
    format!("{:.3}em", v / TEXT_SIZE)
}

fn coord(p: Point) -> String {
    format!("({},{})", em(p.x), em(p.y))
}

/// Start and end angles of the quarter circle for each turn.
fn arc_angles(arc: Arc) -> (i32, i32) {
    match arc {
        Arc::RightUp => (90, 0),
        Arc::RightDown => (-90, 0),
        Arc::LeftUp => (90, 180),
        Arc::LeftDown => (-90, -180),
        Arc::UpRight => (180, 270),
        Arc::UpLeft => (0, -90),
        Arc::DownRight => (180, 90),
        Arc::DownLeft => (0, 90),
    }
}

fn command(class: Class) -> &'static str {
    match class {
        Class::Arrow | Class::Terminator => "\\fill",
        _ => "\\draw",
    }
}

impl TikzSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    fn node(&mut self, at: Point, anchor: Option<&str>, text: &str, class: Class) {
        let p = self.frames.apply(at);
        let mut options = Vec::new();
        if let Some(anchor) = anchor {
            options.push(format!("anchor={anchor}"));
        }
        if matches!(class, Class::Literal | Class::Other) {
            options.push("font=\\ttfamily".to_string());
        }
        let options = if options.is_empty() {
            String::new()
        } else {
            format!("[{}]", options.join(", "))
        };
        self.buf.push_str(&format!(
            "\\draw {} node{} {{{}}};\n",
            coord(p),
            options,
            escape_tex(text)
        ));
    }
}

impl Surface for TikzSurface {
    fn begin_frame(&mut self, origin: Point) {
        self.frames.push(origin);
    }

    fn end_frame(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()
    }

    fn begin_diagram(&mut self, x: f32, y: f32, _w: f32, _h: f32, name: &str) {
        self.buf.clear();
        self.buf.push_str("\\begin{figure}[H]\n");
        self.buf
            .push_str(&format!("\\caption{{{}}}\n", escape_tex(name)));
        self.buf
            .push_str(&format!("\\label{{fig:{}}}\n", label_key(name)));
        self.buf.push_str("\\center\n\\begin{tikzpicture}[yscale=-1]\n");
        self.name = Some(name.to_string());
        self.frames.push(Point::new(-x, -y));
    }

    fn end_diagram(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()?;
        self.buf.push_str("\\end{tikzpicture}\n\\end{figure}\n");
        self.documents.push(Document {
            name: self.name.take().unwrap_or_default(),
            content: std::mem::take(&mut self.buf),
        });
        Ok(())
    }

    fn begin_link(&mut self, _name: &str) {}

    fn end_link(&mut self) {}

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "{} {} rectangle {};\n",
            command(class),
            coord(p),
            coord(p.moved(w, h))
        ));
    }

    fn rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "{} [rounded corners={}] {} rectangle {};\n",
            command(class),
            em(h / 2.0),
            coord(p),
            coord(p.moved(w, h))
        ));
    }

    fn circle(&mut self, x: f32, y: f32, r: f32, class: Class) {
        let p = self.frames.apply(Point::new(x, y));
        self.buf.push_str(&format!(
            "{} {} circle ({});\n",
            command(class),
            coord(p),
            em(r)
        ));
    }

    fn text(&mut self, x: f32, y: f32, _w: f32, h: f32, text: &str, class: Class) {
        self.node(Point::new(x, y + h / 2.0), Some("west"), text, class);
    }

    fn centered_text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.node(Point::new(x + w / 2.0, y + h / 2.0), None, text, class);
    }

    fn begin_path(&mut self, x: f32, y: f32, class: Class) {
        self.pen = self.frames.apply(Point::new(x, y));
        self.path = format!("{} {}", command(class), coord(self.pen));
    }

    fn horizontal_to(&mut self, x: f32) {
        self.pen.x = self.frames.x(x);
        self.path.push_str(&format!(" -- {}", coord(self.pen)));
    }

    fn vertical_to(&mut self, y: f32) {
        self.pen.y = self.frames.y(y);
        self.path.push_str(&format!(" -- {}", coord(self.pen)));
    }

    fn arc(&mut self, r: f32, arc: Arc) {
        let (start, end) = arc_angles(arc);
        self.path
            .push_str(&format!(" arc ({start}:{end}:{})", em(r)));
        self.pen = self.pen.offset(arc.delta(r));
    }

    fn arrow_head_left(&mut self, size: f32) {
        self.path.push_str(&format!(
            " -- ++({},{}) -- ++(0em,{}) -- cycle",
            em(size),
            em(size / 2.0),
            em(-size)
        ));
    }

    fn arrow_head_right(&mut self, size: f32) {
        self.path.push_str(&format!(
            " -- ++({},{}) -- ++(0em,{}) -- cycle",
            em(-size),
            em(-size / 2.0),
            em(size)
        ));
    }

    fn arrow_head_down(&mut self, size: f32) {
        self.path.push_str(&format!(
            " -- ++({},{}) -- ++({},0em) -- cycle",
            em(-size / 2.0),
            em(-size),
            em(size)
        ));
    }

    fn end_path(&mut self) {
        let path = std::mem::take(&mut self.path);
        self.buf.push_str(&path);
        self.buf.push_str(";\n");
    }
}

/// Escapes text for a TikZ node. Backslashes are dropped and underscores
/// become spaces.
pub fn escape_tex(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => {}
            '_' => out.push(' '),
            '{' | '}' | '&' | '%' | '$' | '#' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(ch),
        }
    }
    out
}

fn label_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Direction;

    fn replay(arc: Arc, r: f32) -> Point {
        let (start, end) = arc_angles(arc);
        let (s, e) = ((start as f32).to_radians(), (end as f32).to_radians());
        Point::new(r * (e.cos() - s.cos()), r * (e.sin() - s.sin()))
    }

    #[test]
    fn arc_angles_match_pen_deltas() {
        for arc in [
            Arc::RightUp,
            Arc::RightDown,
            Arc::LeftUp,
            Arc::LeftDown,
            Arc::UpRight,
            Arc::UpLeft,
            Arc::DownRight,
            Arc::DownLeft,
        ] {
            let got = replay(arc, 10.0);
            let want = arc.delta(10.0);
            assert!(
                (got.x - want.x).abs() < 1e-3 && (got.y - want.y).abs() < 1e-3,
                "{arc:?}: {got:?} != {want:?}"
            );
        }
    }

    #[test]
    fn figure_wraps_each_diagram() {
        let mut tex = TikzSurface::new();
        tex.begin_diagram(0.0, 0.0, 48.0, 24.0, "my_rule");
        tex.rectangle(0.0, 0.0, 48.0, 24.0, Class::Box);
        tex.circle(0.0, 12.0, 4.0, Class::Terminator);
        tex.end_diagram().unwrap();
        let doc = &tex.documents()[0];
        assert_eq!(doc.name, "my_rule");
        assert!(doc.content.starts_with("\\begin{figure}[H]\n\\caption{my rule}\n\\label{fig:my-rule}"));
        assert!(doc.content.contains("\\begin{tikzpicture}[yscale=-1]"));
        assert!(doc.content.contains("\\draw (0.000em,0.000em) rectangle (2.000em,1.000em);"));
        assert!(doc.content.contains("\\fill (0.000em,0.500em) circle (0.167em);"));
        assert!(doc.content.ends_with("\\end{tikzpicture}\n\\end{figure}\n"));
    }

    #[test]
    fn paths_track_the_pen() {
        let mut tex = TikzSurface::new();
        tex.begin_diagram(0.0, 0.0, 100.0, 100.0, "top");
        tex.connector(
            Direction::Right,
            Point::new(0.0, 0.0),
            Point::new(48.0, 48.0),
            Direction::Right,
            12.0,
            Class::Line,
        )
        .unwrap();
        tex.arrow_down(Point::new(0.0, 0.0), 5.0, 10.0);
        tex.end_diagram().unwrap();
        let content = &tex.documents()[0].content;
        assert!(content.contains(
            "\\draw (0.000em,0.000em) arc (-90:0:0.500em) -- (0.500em,1.500em) arc (180:90:0.500em) -- (2.000em,2.000em);"
        ));
        assert!(content.contains("\\fill (0.000em,0.208em) -- ++(-0.208em,-0.417em) -- ++(0.417em,0em) -- cycle;"));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_tex("{a_b}\\"), "\\{a b\\}");
        assert_eq!(escape_tex("50%"), "50\\%");
        let mut tex = TikzSurface::new();
        tex.begin_diagram(0.0, 0.0, 10.0, 10.0, "top");
        tex.centered_text(0.0, 0.0, 48.0, 24.0, "x", Class::Literal);
        tex.end_diagram().unwrap();
        assert!(tex.documents()[0]
            .content
            .contains("\\draw (1.000em,0.500em) node[font=\\ttfamily] {x};"));
    }
}
