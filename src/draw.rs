//! Drawing-surface protocol shared by every backend.
//!
//! The render pass speaks only in terms of [`Surface`]; coordinates it passes
//! are relative to the innermost frame opened with [`Surface::begin_frame`].

use crate::layout::{Direction, LayoutError, Point};

/// Semantic style tag for every primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Line,
    Arrow,
    Box,
    Production,
    Literal,
    Identifier,
    Terminator,
    Other,
    Title,
}

impl Class {
    pub const ALL: [Class; 9] = [
        Class::Line,
        Class::Arrow,
        Class::Box,
        Class::Production,
        Class::Literal,
        Class::Identifier,
        Class::Terminator,
        Class::Other,
        Class::Title,
    ];

    /// Name used for CSS classes and debug output.
    pub fn name(self) -> &'static str {
        match self {
            Class::Line => "line",
            Class::Arrow => "arrow",
            Class::Box => "box",
            Class::Production => "prod",
            Class::Literal => "literal",
            Class::Identifier => "ident",
            Class::Terminator => "end",
            Class::Other => "other",
            Class::Title => "title",
        }
    }
}

/// Quarter-circle turn: travelling along the first direction, leaving along
/// the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arc {
    RightUp,
    RightDown,
    LeftUp,
    LeftDown,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

impl Arc {
    /// Pen displacement produced by the turn.
    pub fn delta(self, r: f32) -> Point {
        match self {
            Arc::RightUp | Arc::UpRight => Point::new(r, -r),
            Arc::RightDown | Arc::DownRight => Point::new(r, r),
            Arc::LeftUp | Arc::UpLeft => Point::new(-r, -r),
            Arc::LeftDown | Arc::DownLeft => Point::new(-r, r),
        }
    }

    /// True when the turn is clockwise on a y-down canvas.
    pub fn clockwise(self) -> bool {
        matches!(
            self,
            Arc::RightDown | Arc::LeftUp | Arc::UpRight | Arc::DownLeft
        )
    }
}

/// Translation stack owned by a surface. The base frame is the identity and
/// cannot be popped.
#[derive(Debug, Clone)]
pub struct FrameStack {
    offsets: Vec<Point>,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self {
            offsets: vec![Point::default()],
        }
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, origin: Point) {
        let next = self.offset().offset(origin);
        self.offsets.push(next);
    }

    pub fn pop(&mut self) -> Result<(), LayoutError> {
        if self.offsets.len() <= 1 {
            return Err(LayoutError::FrameUnderflow);
        }
        self.offsets.pop();
        Ok(())
    }

    pub fn offset(&self) -> Point {
        self.offsets.last().copied().unwrap_or_default()
    }

    pub fn apply(&self, p: Point) -> Point {
        p.offset(self.offset())
    }

    pub fn x(&self, x: f32) -> f32 {
        x + self.offset().x
    }

    pub fn y(&self, y: f32) -> f32 {
        y + self.offset().y
    }

    /// Frames open above the base.
    pub fn depth(&self) -> usize {
        self.offsets.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathStep {
    HorizontalTo(f32),
    VerticalTo(f32),
    Arc(Arc),
}

/// Plans the connector that leaves `p1` travelling `entry` and arrives at
/// `p2` travelling `exit`, turning with radius `r`.
///
/// Pairs the diagram shapes never need are rejected instead of guessed.
pub fn plan_connector(
    entry: Direction,
    p1: Point,
    p2: Point,
    exit: Direction,
    r: f32,
) -> Result<Vec<PathStep>, LayoutError> {
    use Direction::{Down, Left, Right, Up};
    use PathStep::{Arc as Turn, HorizontalTo as H, VerticalTo as V};

    let steps = match (entry, exit) {
        (Right, Right) if p1.y == p2.y => vec![H(p2.x)],
        (Right, Right) if p1.x >= p2.x => Vec::new(),
        (Right, Right) if p1.y < p2.y => vec![
            Turn(Arc::RightDown),
            V(p2.y - r),
            Turn(Arc::DownRight),
            H(p2.x),
        ],
        (Right, Right) => vec![
            H(p2.x - r * 2.0),
            Turn(Arc::RightUp),
            V(p2.y + r),
            Turn(Arc::UpRight),
        ],
        (Right, Left) if p1.y < p2.y => vec![
            H(p1.x.max(p2.x)),
            Turn(Arc::RightDown),
            V(p2.y - r),
            Turn(Arc::DownLeft),
            H(p2.x),
        ],
        (Right, Left) => vec![
            H(p1.x.max(p2.x)),
            Turn(Arc::RightUp),
            V(p2.y + r),
            Turn(Arc::UpLeft),
            H(p2.x),
        ],
        (Right, Up) => vec![H(p2.x - r), Turn(Arc::RightUp), V(p2.y)],
        (Right, Down) => vec![H(p2.x - r), Turn(Arc::RightDown), V(p2.y)],

        (Left, Right) if p1.y < p2.y => vec![
            H(p1.x.min(p2.x)),
            Turn(Arc::LeftDown),
            V(p2.y - r),
            Turn(Arc::DownRight),
            H(p2.x),
        ],
        (Left, Right) => vec![
            H(p1.x.min(p2.x)),
            Turn(Arc::LeftUp),
            V(p2.y + r),
            Turn(Arc::UpRight),
            H(p2.x),
        ],
        (Left, Left) if p1.y == p2.y => vec![H(p2.x)],
        (Left, Left) if p1.y < p2.y => vec![
            Turn(Arc::LeftDown),
            V(p2.y - r),
            Turn(Arc::DownLeft),
            H(p2.x),
        ],
        (Left, Left) => vec![
            H(p2.x + r * 2.0),
            Turn(Arc::LeftUp),
            V(p2.y + r),
            Turn(Arc::UpLeft),
        ],
        (Left, Up) => vec![H(p2.x + r), Turn(Arc::LeftUp), V(p2.y)],
        (Left, Down) => vec![H(p2.x + r), Turn(Arc::LeftDown), V(p2.y)],

        (Up, Right) => vec![V(p2.y + r), Turn(Arc::UpRight), H(p2.x)],

        (Down, Right) => vec![V(p2.y - r), Turn(Arc::DownRight), H(p2.x)],
        (Down, Left) => vec![V(p2.y - r), Turn(Arc::DownLeft), H(p2.x)],
        (Down, Up) if p2.x < p1.x => vec![
            V(p1.y.max(p2.y)),
            Turn(Arc::DownLeft),
            H(p2.x + r),
            Turn(Arc::LeftUp),
            V(p2.y),
        ],
        (Down, Up) => vec![
            V(p1.y.max(p2.y)),
            Turn(Arc::DownRight),
            H(p2.x - r),
            Turn(Arc::RightUp),
            V(p2.y),
        ],
        (Down, Down) if p2.x < p1.x => vec![
            V(p1.y.max(p2.y) - r * 2.0),
            Turn(Arc::DownLeft),
            H(p2.x + r),
            Turn(Arc::LeftDown),
        ],
        (Down, Down) => vec![
            V(p1.y.max(p2.y) - r * 2.0),
            Turn(Arc::DownRight),
            H(p2.x - r),
            Turn(Arc::RightDown),
        ],

        (entry, exit) => return Err(LayoutError::UnsupportedConnector { entry, exit }),
    };
    Ok(steps)
}

/// Backend contract consumed by the render pass.
pub trait Surface {
    fn begin_frame(&mut self, origin: Point);
    fn end_frame(&mut self) -> Result<(), LayoutError>;

    /// Opens a document whose visible area is the `w`×`h` rectangle at
    /// (`x`, `y`) in render coordinates.
    fn begin_diagram(&mut self, x: f32, y: f32, w: f32, h: f32, name: &str);
    fn end_diagram(&mut self) -> Result<(), LayoutError>;

    fn begin_link(&mut self, name: &str);
    fn end_link(&mut self);

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class);
    fn rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class);
    fn circle(&mut self, x: f32, y: f32, r: f32, class: Class);
    fn text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class);
    fn centered_text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class);

    fn begin_path(&mut self, x: f32, y: f32, class: Class);
    fn horizontal_to(&mut self, x: f32);
    fn vertical_to(&mut self, y: f32);
    fn arc(&mut self, r: f32, arc: Arc);
    /// Closed arrowhead whose tip is the current pen position.
    fn arrow_head_left(&mut self, size: f32);
    fn arrow_head_right(&mut self, size: f32);
    fn arrow_head_down(&mut self, size: f32);
    fn end_path(&mut self);

    fn hline(&mut self, p1: Point, p2: Point, class: Class) {
        self.begin_path(p1.x, p1.y, class);
        self.horizontal_to(p2.x);
        self.end_path();
    }

    fn vline(&mut self, p1: Point, p2: Point, class: Class) {
        self.begin_path(p1.x, p1.y, class);
        self.vertical_to(p2.y);
        self.end_path();
    }

    fn connector(
        &mut self,
        entry: Direction,
        p1: Point,
        p2: Point,
        exit: Direction,
        r: f32,
        class: Class,
    ) -> Result<(), LayoutError> {
        let steps = plan_connector(entry, p1, p2, exit, r)?;
        if steps.is_empty() {
            return Ok(());
        }
        self.begin_path(p1.x, p1.y, class);
        for step in steps {
            match step {
                PathStep::HorizontalTo(x) => self.horizontal_to(x),
                PathStep::VerticalTo(y) => self.vertical_to(y),
                PathStep::Arc(arc) => self.arc(r, arc),
            }
        }
        self.end_path();
        Ok(())
    }

    /// Stub line of length `len` from `p` leftwards, capped by an arrowhead.
    fn arrow_left(&mut self, p: Point, len: f32, size: f32) {
        if len > size / 2.0 {
            self.begin_path(p.x, p.y, Class::Line);
            self.horizontal_to(p.x - len + size / 2.0);
            self.end_path();
        }
        self.begin_path(p.x - len, p.y, Class::Arrow);
        self.arrow_head_left(size);
        self.end_path();
    }

    fn arrow_right(&mut self, p: Point, len: f32, size: f32) {
        if len > size / 2.0 {
            self.begin_path(p.x, p.y, Class::Line);
            self.horizontal_to(p.x + len - size / 2.0);
            self.end_path();
        }
        self.begin_path(p.x + len, p.y, Class::Arrow);
        self.arrow_head_right(size);
        self.end_path();
    }

    fn arrow_down(&mut self, p: Point, len: f32, size: f32) {
        if len > size / 2.0 {
            self.begin_path(p.x, p.y, Class::Line);
            self.vertical_to(p.y + len - size / 2.0);
            self.end_path();
        }
        self.begin_path(p.x, p.y + len, Class::Arrow);
        self.arrow_head_down(size);
        self.end_path();
    }
}
