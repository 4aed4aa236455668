use serde::Serialize;

use super::geometry::Point;

/// Flow axis and sense of the segment being laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Direction {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::None => Direction::None,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// The seven saved fields. Rail coordinates are in the frame of whichever
/// node currently owns the state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RailState {
    pub dir: Direction,
    pub use_left_rail: bool,
    pub use_right_rail: bool,
    pub left_rail: f32,
    pub right_rail: f32,
    pub rail_top: f32,
    pub rail_bottom: f32,
}

#[derive(Debug, Default)]
pub struct LayoutContext {
    state: RailState,
    saved: Vec<RailState>,
}

impl std::ops::Deref for LayoutContext {
    type Target = RailState;

    fn deref(&self) -> &RailState {
        &self.state
    }
}

impl std::ops::DerefMut for LayoutContext {
    fn deref_mut(&mut self) -> &mut RailState {
        &mut self.state
    }
}

impl LayoutContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_state(&mut self) {
        self.saved.push(self.state);
    }

    /// Restores the last saved state. Popping an empty stack leaves the live
    /// state untouched.
    pub fn pop_state(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn reverse_direction(&mut self) {
        self.state.dir = self.state.dir.reversed();
    }

    pub fn clear_rails(&mut self) {
        self.state.use_left_rail = false;
        self.state.use_right_rail = false;
    }

    /// Re-expresses rail coordinates relative to a child frame at `origin`.
    pub fn enter_frame(&mut self, origin: Point) {
        self.state.left_rail -= origin.x;
        self.state.right_rail -= origin.x;
        self.state.rail_top -= origin.y;
        self.state.rail_bottom -= origin.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for dir in [
            Direction::None,
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ] {
            assert_eq!(dir.reversed().reversed(), dir);
        }
        assert_eq!(Direction::Right.reversed(), Direction::Left);
        assert_eq!(Direction::Up.reversed(), Direction::Down);
    }

    #[test]
    fn push_pop_restores_all_fields() {
        let mut ctxt = LayoutContext::new();
        ctxt.dir = Direction::Right;
        ctxt.use_left_rail = true;
        ctxt.left_rail = 10.0;
        ctxt.rail_top = 4.0;
        let before = *ctxt;

        ctxt.push_state();
        ctxt.reverse_direction();
        ctxt.clear_rails();
        ctxt.enter_frame(Point::new(3.0, 2.0));
        assert_eq!(ctxt.dir, Direction::Left);
        assert_eq!(ctxt.left_rail, 7.0);
        assert_eq!(ctxt.rail_top, 2.0);
        assert_eq!(ctxt.depth(), 1);

        ctxt.pop_state();
        assert_eq!(*ctxt, before);
        assert_eq!(ctxt.depth(), 0);
    }
}
