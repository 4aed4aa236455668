use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn moved(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn offset(self, delta: Point) -> Self {
        self.moved(delta.x, delta.y)
    }

    pub fn min(self, other: Point) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(self, other: Point) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn negate(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Axis-aligned box with flow anchors.
///
/// `x_anchor`/`y_anchor` are offsets from the top-left corner. The left and
/// right anchors sit on row `top + y_anchor`; the top-left/top-right anchors
/// sit on the top edge, `x_anchor` in from either side. Translating the box
/// never changes the offsets; only [`OrientedBox::include`] rewrites
/// `y_anchor`, to keep the anchor row where it was when the box grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OrientedBox {
    tl: Point,
    br: Point,
    x_anchor: f32,
    y_anchor: f32,
}

impl OrientedBox {
    /// Empty box at the origin.
    pub fn new(x_anchor: f32, y_anchor: f32) -> Self {
        Self {
            tl: Point::default(),
            br: Point::default(),
            x_anchor,
            y_anchor,
        }
    }

    pub fn x_anchor(&self) -> f32 {
        self.x_anchor
    }

    pub fn y_anchor(&self) -> f32 {
        self.y_anchor
    }

    pub fn set_y_anchor(&mut self, y_anchor: f32) {
        self.y_anchor = y_anchor;
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.br = self.tl.moved(width.max(0.0), height.max(0.0));
    }

    pub fn width(&self) -> f32 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> f32 {
        self.br.y - self.tl.y
    }

    pub fn top_left(&self) -> Point {
        self.tl
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.br.x, self.tl.y)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.tl.x, self.br.y)
    }

    pub fn bottom_right(&self) -> Point {
        self.br
    }

    fn anchor_row(&self) -> f32 {
        self.tl.y + self.y_anchor
    }

    pub fn left_anchor(&self) -> Point {
        Point::new(self.tl.x, self.anchor_row())
    }

    pub fn right_anchor(&self) -> Point {
        Point::new(self.br.x, self.anchor_row())
    }

    pub fn center_anchor(&self) -> Point {
        Point::new((self.tl.x + self.br.x) / 2.0, self.anchor_row())
    }

    pub fn top_center(&self) -> Point {
        Point::new((self.tl.x + self.br.x) / 2.0, self.tl.y)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new((self.tl.x + self.br.x) / 2.0, self.br.y)
    }

    pub fn top_left_anchor(&self) -> Point {
        Point::new(self.tl.x + self.x_anchor, self.tl.y)
    }

    pub fn top_right_anchor(&self) -> Point {
        Point::new(self.br.x - self.x_anchor, self.tl.y)
    }

    pub fn include_point(&mut self, p: Point) {
        if p.y < self.tl.y {
            self.y_anchor += self.tl.y - p.y;
        }
        self.tl = self.tl.min(p);
        self.br = self.br.max(p);
    }

    pub fn include(&mut self, other: &OrientedBox) {
        self.include_point(other.tl);
        self.include_point(other.br);
    }

    pub fn move_to(&mut self, p: Point) {
        let delta = Point::new(p.x - self.tl.x, p.y - self.tl.y);
        self.move_by(delta);
    }

    pub fn move_by(&mut self, delta: Point) {
        self.tl = self.tl.offset(delta);
        self.br = self.br.offset(delta);
    }

    pub fn move_left_anchor_to(&mut self, p: Point) {
        self.move_to(Point::new(p.x, p.y - self.y_anchor));
    }

    pub fn move_right_anchor_to(&mut self, p: Point) {
        let width = self.width();
        self.move_to(Point::new(p.x - width, p.y - self.y_anchor));
    }

    /// Shifts the box so its top-left corner is the origin and returns the
    /// applied delta, for moving child boxes along with it.
    pub fn normalize(&mut self) -> Point {
        let delta = self.tl.negate();
        self.move_by(delta);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_upward_keeps_anchor_row() {
        let mut b = OrientedBox::new(10.0, 24.0);
        b.set_size(40.0, 48.0);
        let row = b.left_anchor().y;
        b.include_point(Point::new(5.0, -30.0));
        assert_eq!(b.top_left(), Point::new(0.0, -30.0));
        assert_eq!(b.left_anchor().y, row);
        assert_eq!(b.y_anchor(), 54.0);
    }

    #[test]
    fn include_downward_and_sideways_leaves_anchor_alone() {
        let mut b = OrientedBox::new(10.0, 24.0);
        b.set_size(40.0, 48.0);
        b.include_point(Point::new(-20.0, 100.0));
        assert_eq!(b.y_anchor(), 24.0);
        assert_eq!(b.width(), 60.0);
        assert_eq!(b.height(), 100.0);
    }

    #[test]
    fn anchor_moves_preserve_size() {
        let mut b = OrientedBox::new(10.0, 20.0);
        b.set_size(30.0, 50.0);
        b.move_left_anchor_to(Point::new(100.0, 100.0));
        assert_eq!(b.left_anchor(), Point::new(100.0, 100.0));
        assert_eq!(b.top_left(), Point::new(100.0, 80.0));
        b.move_right_anchor_to(Point::new(0.0, 0.0));
        assert_eq!(b.right_anchor(), Point::new(0.0, 0.0));
        assert_eq!((b.width(), b.height()), (30.0, 50.0));
        assert_eq!(b.top_left_anchor(), Point::new(-20.0, -20.0));
        assert_eq!(b.top_right_anchor(), Point::new(-10.0, -20.0));
    }

    #[test]
    fn normalize_returns_delta() {
        let mut b = OrientedBox::new(0.0, 0.0);
        b.include_point(Point::new(-4.0, -6.0));
        b.include_point(Point::new(8.0, 2.0));
        let delta = b.normalize();
        assert_eq!(delta, Point::new(4.0, 6.0));
        assert_eq!(b.top_left(), Point::default());
        assert_eq!(b.bottom_right(), Point::new(12.0, 8.0));
    }
}
