//! In-memory surface that keeps every call with coordinates resolved to
//! diagram space. Handy for inspecting what a grammar draws without parsing
//! backend output.

use crate::draw::{Arc, Class, FrameStack, Surface};
use crate::layout::{Direction, LayoutError, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    HorizontalTo(f32),
    VerticalTo(f32),
    Arc { radius: f32, arc: Arc },
    ArrowHead { direction: Direction, size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPath {
    pub class: Class,
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl RecordedPath {
    /// Pen positions after each segment, starting with the start point.
    pub fn points(&self) -> Vec<Point> {
        let mut pen = self.start;
        let mut points = vec![pen];
        for segment in &self.segments {
            pen = match *segment {
                Segment::HorizontalTo(x) => Point::new(x, pen.y),
                Segment::VerticalTo(y) => Point::new(pen.x, y),
                Segment::Arc { radius, arc } => pen.offset(arc.delta(radius)),
                Segment::ArrowHead { .. } => pen,
            };
            points.push(pen);
        }
        points
    }

    pub fn end(&self) -> Point {
        self.points().last().copied().unwrap_or(self.start)
    }

    pub fn arcs(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Arc { .. }))
            .count()
    }

    pub fn has_arrow_head(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::ArrowHead { .. }))
    }

    pub fn min_y(&self) -> f32 {
        self.points()
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min)
    }

    /// Every vertical segment as `(x, from_y, to_y)`.
    pub fn vertical_runs(&self) -> Vec<(f32, f32, f32)> {
        let points = self.points();
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Segment::VerticalTo(_)))
            .map(|(idx, _)| (points[idx].x, points[idx].y, points[idx + 1].y))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    BeginDiagram {
        name: String,
        width: f32,
        height: f32,
    },
    EndDiagram,
    BeginLink(String),
    EndLink,
    Rectangle {
        class: Class,
        rounded: bool,
        origin: Point,
        width: f32,
        height: f32,
    },
    Circle {
        class: Class,
        center: Point,
        radius: f32,
    },
    Text {
        class: Class,
        centered: bool,
        origin: Point,
        width: f32,
        height: f32,
        text: String,
    },
    Path(RecordedPath),
}

/// Extent of one recorded diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramBounds {
    pub name: String,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Default)]
pub struct Recorder {
    frames: FrameStack,
    calls: Vec<DrawCall>,
    current: Option<RecordedPath>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<DrawCall> {
        self.calls
    }

    pub fn paths(&self) -> Vec<&RecordedPath> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Path(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn open_frames(&self) -> usize {
        self.frames.depth()
    }

    pub fn diagrams(&self) -> Vec<DiagramBounds> {
        let mut out = Vec::new();
        let mut current: Option<DiagramBounds> = None;
        for call in &self.calls {
            let points: Vec<Point> = match call {
                DrawCall::BeginDiagram { name, .. } => {
                    current = Some(DiagramBounds {
                        name: name.clone(),
                        min_x: f32::INFINITY,
                        min_y: f32::INFINITY,
                        max_x: f32::NEG_INFINITY,
                        max_y: f32::NEG_INFINITY,
                    });
                    continue;
                }
                DrawCall::EndDiagram => {
                    out.extend(current.take());
                    continue;
                }
                DrawCall::Rectangle {
                    origin,
                    width,
                    height,
                    ..
                }
                | DrawCall::Text {
                    origin,
                    width,
                    height,
                    ..
                } => vec![*origin, origin.moved(*width, *height)],
                DrawCall::Circle { center, .. } => vec![*center],
                DrawCall::Path(path) => path.points(),
                DrawCall::BeginLink(_) | DrawCall::EndLink => continue,
            };
            if let Some(bounds) = current.as_mut() {
                for p in points {
                    bounds.min_x = bounds.min_x.min(p.x);
                    bounds.min_y = bounds.min_y.min(p.y);
                    bounds.max_x = bounds.max_x.max(p.x);
                    bounds.max_y = bounds.max_y.max(p.y);
                }
            }
        }
        out
    }

    fn segment(&mut self, segment: Segment) {
        if let Some(path) = self.current.as_mut() {
            path.segments.push(segment);
        }
    }
}

impl Surface for Recorder {
    fn begin_frame(&mut self, origin: Point) {
        self.frames.push(origin);
    }

    fn end_frame(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()
    }

    fn begin_diagram(&mut self, x: f32, y: f32, w: f32, h: f32, name: &str) {
        self.calls.push(DrawCall::BeginDiagram {
            name: name.to_string(),
            width: w,
            height: h,
        });
        self.frames.push(Point::new(-x, -y));
    }

    fn end_diagram(&mut self) -> Result<(), LayoutError> {
        self.frames.pop()?;
        self.calls.push(DrawCall::EndDiagram);
        Ok(())
    }

    fn begin_link(&mut self, name: &str) {
        self.calls.push(DrawCall::BeginLink(name.to_string()));
    }

    fn end_link(&mut self) {
        self.calls.push(DrawCall::EndLink);
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        self.calls.push(DrawCall::Rectangle {
            class,
            rounded: false,
            origin: self.frames.apply(Point::new(x, y)),
            width: w,
            height: h,
        });
    }

    fn rounded_rectangle(&mut self, x: f32, y: f32, w: f32, h: f32, class: Class) {
        self.calls.push(DrawCall::Rectangle {
            class,
            rounded: true,
            origin: self.frames.apply(Point::new(x, y)),
            width: w,
            height: h,
        });
    }

    fn circle(&mut self, x: f32, y: f32, r: f32, class: Class) {
        self.calls.push(DrawCall::Circle {
            class,
            center: self.frames.apply(Point::new(x, y)),
            radius: r,
        });
    }

    fn text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.calls.push(DrawCall::Text {
            class,
            centered: false,
            origin: self.frames.apply(Point::new(x, y)),
            width: w,
            height: h,
            text: text.to_string(),
        });
    }

    fn centered_text(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, class: Class) {
        self.calls.push(DrawCall::Text {
            class,
            centered: true,
            origin: self.frames.apply(Point::new(x, y)),
            width: w,
            height: h,
            text: text.to_string(),
        });
    }

    fn begin_path(&mut self, x: f32, y: f32, class: Class) {
        self.current = Some(RecordedPath {
            class,
            start: self.frames.apply(Point::new(x, y)),
            segments: Vec::new(),
        });
    }

    fn horizontal_to(&mut self, x: f32) {
        let x = self.frames.x(x);
        self.segment(Segment::HorizontalTo(x));
    }

    fn vertical_to(&mut self, y: f32) {
        let y = self.frames.y(y);
        self.segment(Segment::VerticalTo(y));
    }

    fn arc(&mut self, r: f32, arc: Arc) {
        self.segment(Segment::Arc {
            radius: r,
            arc,
        });
    }

    fn arrow_head_left(&mut self, size: f32) {
        self.segment(Segment::ArrowHead {
            direction: Direction::Left,
            size,
        });
    }

    fn arrow_head_right(&mut self, size: f32) {
        self.segment(Segment::ArrowHead {
            direction: Direction::Right,
            size,
        });
    }

    fn arrow_head_down(&mut self, size: f32) {
        self.segment(Segment::ArrowHead {
            direction: Direction::Down,
            size,
        });
    }

    fn end_path(&mut self) {
        if let Some(path) = self.current.take() {
            self.calls.push(DrawCall::Path(path));
        }
    }
}
