//! Top-down pass: walks the grammar again with the same state discipline as
//! the size pass and turns every box into surface calls.

use std::collections::HashSet;

use crate::config::Config;
use crate::draw::{Class, Surface};
use crate::ir::{Grammar, LiteralKind, Node, NodeId};
use crate::layout::{
    ARROW_SIZE, BoxTable, CIRCLE, Direction, Layout, LayoutContext, LayoutError, OrientedBox,
    PADH, PADV, Point, RADIUS, TEXT_PAD, compute_layout,
};

/// Lays out `grammar` and draws it onto `surface`.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    grammar: &Grammar,
    config: &Config,
) -> Result<Layout, LayoutError> {
    let layout = compute_layout(grammar, &config.layout)?;
    render_layout(surface, grammar, &layout, config)?;
    Ok(layout)
}

/// Draws an already computed layout. Emits one diagram named `top`, or one
/// diagram per production when `split_productions` is set.
pub fn render_layout<S: Surface + ?Sized>(
    surface: &mut S,
    grammar: &Grammar,
    layout: &Layout,
    config: &Config,
) -> Result<(), LayoutError> {
    let mut renderer = Renderer::new(grammar, &layout.boxes, surface, config);
    let diagrams = if config.render.split_productions {
        renderer.split(layout.root)?
    } else {
        renderer.whole(layout.root)?
    };
    debug_assert_eq!(renderer.ctxt.depth(), 0);
    tracing::debug!(diagrams, "rendered railroad diagram");
    Ok(())
}

struct Renderer<'a, S: ?Sized> {
    grammar: &'a Grammar,
    boxes: &'a BoxTable,
    surface: &'a mut S,
    ctxt: LayoutContext,
    depth: usize,
    max_depth: usize,
    links: HashSet<&'a str>,
}

/// `b` translated so its top-left corner is the origin.
fn local(b: &OrientedBox) -> OrientedBox {
    let mut moved = *b;
    moved.move_to(Point::default());
    moved
}

impl<'a, S: Surface + ?Sized> Renderer<'a, S> {
    fn new(grammar: &'a Grammar, boxes: &'a BoxTable, surface: &'a mut S, config: &Config) -> Self {
        let links = if config.render.link_identifiers {
            grammar.production_names().into_iter().collect()
        } else {
            HashSet::new()
        };
        Self {
            grammar,
            boxes,
            surface,
            ctxt: LayoutContext::new(),
            depth: 0,
            max_depth: config.layout.max_depth,
            links,
        }
    }

    fn whole(&mut self, root: NodeId) -> Result<usize, LayoutError> {
        let top = self.boxed(root)?;
        let origin = top.top_left();
        self.surface
            .begin_diagram(origin.x, origin.y, top.width(), top.height(), "top");
        let mut above = false;
        self.render(root, &mut above)?;
        self.surface.end_diagram()?;
        Ok(1)
    }

    fn split(&mut self, root: NodeId) -> Result<usize, LayoutError> {
        let grammar = self.grammar;
        let Some(Node::Grammar { productions, .. }) = grammar.node(root) else {
            return Err(LayoutError::UnknownNode(root));
        };
        let items = match grammar.node(*productions) {
            Some(Node::ProductionList(items)) => items.clone(),
            Some(_) => vec![*productions],
            None => return Err(LayoutError::UnknownNode(*productions)),
        };

        let mut count = 0;
        for item in items {
            let Some(Node::Production { identifier, .. }) = grammar.node(item) else {
                tracing::warn!(node = %item, "skipping non-production entry in split mode");
                continue;
            };
            let name = grammar
                .node(*identifier)
                .and_then(Node::label)
                .unwrap_or("production");
            let prod = self.boxed(item)?;
            self.surface
                .begin_diagram(0.0, 0.0, prod.width(), prod.height(), name);
            self.surface.begin_frame(prod.top_left().negate());
            let mut above = false;
            self.render(item, &mut above)?;
            self.surface.end_frame()?;
            self.surface.end_diagram()?;
            count += 1;
        }
        Ok(count)
    }

    fn boxed(&self, id: NodeId) -> Result<OrientedBox, LayoutError> {
        self.boxes.get(id).copied()
    }

    fn render(&mut self, id: NodeId, above: &mut bool) -> Result<(), LayoutError> {
        if self.depth >= self.max_depth {
            return Err(LayoutError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        let result = self.scoped(|this| this.render_node(id, above));
        self.depth -= 1;
        result
    }

    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, LayoutError>,
    ) -> Result<T, LayoutError> {
        self.ctxt.push_state();
        let result = f(self);
        self.ctxt.pop_state();
        result
    }

    /// Runs `f` inside the coordinate frame of `me`.
    fn framed(
        &mut self,
        me: &OrientedBox,
        f: impl FnOnce(&mut Self) -> Result<(), LayoutError>,
    ) -> Result<(), LayoutError> {
        self.surface.begin_frame(me.top_left());
        f(self)?;
        self.surface.end_frame()
    }

    fn connector(
        &mut self,
        entry: Direction,
        p1: Point,
        p2: Point,
        exit: Direction,
    ) -> Result<(), LayoutError> {
        self.surface.connector(entry, p1, p2, exit, RADIUS, Class::Line)
    }

    fn render_node(&mut self, id: NodeId, above: &mut bool) -> Result<(), LayoutError> {
        let grammar = self.grammar;
        let me = self.boxed(id)?;
        match grammar.node(id).ok_or(LayoutError::UnknownNode(id))? {
            Node::Grammar {
                title,
                productions,
                comment,
            } => {
                self.ctxt.dir = Direction::None;
                self.ctxt.clear_rails();
                *above = false;
                self.framed(&me, |this| {
                    if let Some(title) = title {
                        this.render(*title, above)?;
                    }
                    this.render(*productions, above)?;
                    if let Some(comment) = comment {
                        this.render(*comment, above)?;
                    }
                    Ok(())
                })
            }
            Node::ProductionList(items) => {
                self.ctxt.dir = Direction::None;
                self.ctxt.clear_rails();
                *above = false;
                self.framed(&me, |this| {
                    for &item in items {
                        this.render(item, above)?;
                    }
                    Ok(())
                })
            }
            Node::Production {
                identifier,
                expression,
            } => self.production(&me, *identifier, *expression, above),
            Node::Alternation(alts) => {
                self.ctxt.enter_frame(me.top_left());
                self.framed(&me, |this| {
                    if alts.is_empty() {
                        Ok(())
                    } else if grammar.is_short(alts) {
                        this.short_alternation(&me, alts, *above)
                    } else {
                        this.long_alternation(&me, alts, *above)
                    }
                })
            }
            Node::Sequence(items) => {
                *above = false;
                self.ctxt.enter_frame(me.top_left());
                let last = items.len().saturating_sub(1);
                self.framed(&me, |this| {
                    for (idx, &item) in items.iter().enumerate() {
                        this.scoped(|this| {
                            if idx > 0 {
                                this.ctxt.use_left_rail = false;
                            }
                            if idx < last {
                                this.ctxt.use_right_rail = false;
                            }
                            this.render(item, above)
                        })?;
                    }
                    Ok(())
                })
            }
            Node::Repetition(body) => self.repetition(&me, *body, above),
            Node::OneOrMore { body, separator } => self.one_or_more(&me, *body, *separator, above),
            Node::Optional(body) => self.optional(&me, *body, above),
            Node::Literal { text, kind } => {
                let class = match kind {
                    LiteralKind::Quoted => Class::Literal,
                    LiteralKind::Special => Class::Other,
                    LiteralKind::Title => Class::Title,
                };
                self.leaf(&me, text, class, false);
                *above = false;
                Ok(())
            }
            Node::Identifier(name) => {
                let linked = self.ctxt.dir != Direction::None && self.links.contains(name.as_str());
                self.leaf(&me, name, Class::Identifier, linked);
                *above = false;
                Ok(())
            }
            Node::Other(text) => {
                self.leaf(&me, text, Class::Other, false);
                *above = false;
                Ok(())
            }
        }
    }

    fn production(
        &mut self,
        me: &OrientedBox,
        identifier: NodeId,
        expression: NodeId,
        above: &mut bool,
    ) -> Result<(), LayoutError> {
        self.ctxt.clear_rails();
        *above = false;
        let name = self.boxed(identifier)?;
        let expr = self.boxed(expression)?;
        self.framed(me, |this| {
            this.ctxt.dir = Direction::None;
            this.render(identifier, above)?;
            this.ctxt.dir = Direction::Right;
            this.render(expression, above)?;

            this.surface.hline(
                name.left_anchor().moved(PADH, 0.0),
                expr.left_anchor(),
                Class::Line,
            );
            let end = expr.right_anchor().moved(PADH * 2.0, 0.0);
            this.surface.hline(expr.right_anchor(), end, Class::Line);
            this.surface
                .circle(end.x + CIRCLE / 2.0, end.y, CIRCLE, Class::Terminator);
            Ok(())
        })
    }

    fn short_alternation(
        &mut self,
        me: &OrientedBox,
        alts: &[NodeId],
        above: bool,
    ) -> Result<(), LayoutError> {
        for &alt in alts {
            self.scoped(|this| {
                this.ctxt.dir = Direction::Down;
                this.ctxt.clear_rails();
                let mut inner_above = false;
                this.render(alt, &mut inner_above)
            })?;
        }

        let me = local(me);
        let boxes = alts
            .iter()
            .map(|&alt| self.boxed(alt))
            .collect::<Result<Vec<_>, _>>()?;
        let (Some(first), Some(last)) = (boxes.first().copied(), boxes.last().copied()) else {
            return Ok(());
        };
        let top = me.right_anchor();
        let bot = me.bottom_left().moved(RADIUS * 2.0, -RADIUS);

        if self.ctxt.dir == Direction::Right {
            if above {
                self.connector(Direction::Down, me.top_left_anchor(), last.top_center(), Direction::Down)?;
                self.connector(Direction::Down, first.bottom_center(), me.top_right_anchor(), Direction::Up)?;
            } else {
                let mid = me.bottom_right().moved(-RADIUS * 2.0, -RADIUS);
                self.connector(Direction::Right, me.left_anchor(), last.top_center(), Direction::Down)?;
                self.connector(Direction::Down, first.bottom_center(), mid, Direction::Right)?;
                self.connector(Direction::Right, mid, me.right_anchor(), Direction::Right)?;
            }
            for (idx, b) in boxes.iter().enumerate() {
                if idx > 0 {
                    let to = Point::new(b.bottom_center().x + RADIUS, bot.y);
                    self.connector(Direction::Down, b.bottom_center(), to, Direction::Right)?;
                }
                if idx + 1 < boxes.len() {
                    let from = Point::new(b.top_center().x - RADIUS, top.y);
                    self.connector(Direction::Right, from, b.top_center(), Direction::Down)?;
                }
            }
        } else {
            if above {
                self.connector(Direction::Down, me.top_right_anchor(), first.top_center(), Direction::Down)?;
                self.connector(Direction::Down, last.bottom_center(), me.top_left_anchor(), Direction::Up)?;
            } else {
                let mid = me.bottom_left().moved(RADIUS * 2.0, -RADIUS);
                self.connector(Direction::Left, me.right_anchor(), first.top_center(), Direction::Down)?;
                self.connector(Direction::Down, last.bottom_center(), mid, Direction::Left)?;
                self.connector(Direction::Left, mid, me.left_anchor(), Direction::Left)?;
            }
            for (idx, b) in boxes.iter().enumerate() {
                if idx > 0 {
                    let to = Point::new(b.top_center().x + RADIUS, top.y);
                    self.connector(Direction::Up, b.top_center(), to, Direction::Right)?;
                }
                if idx + 1 < boxes.len() {
                    let to = Point::new(b.bottom_center().x - RADIUS, bot.y);
                    self.connector(Direction::Down, b.bottom_center(), to, Direction::Left)?;
                }
            }
        }
        Ok(())
    }

    fn long_alternation(
        &mut self,
        me: &OrientedBox,
        alts: &[NodeId],
        above: bool,
    ) -> Result<(), LayoutError> {
        let boxes = alts
            .iter()
            .map(|&alt| self.boxed(alt))
            .collect::<Result<Vec<_>, _>>()?;
        let (Some(first), Some(last)) = (boxes.first().copied(), boxes.last().copied()) else {
            return Ok(());
        };

        self.scoped(|this| {
            let top = first.left_anchor().y + RADIUS;
            let bottom = last.right_anchor().y - RADIUS;
            if !this.ctxt.use_left_rail {
                this.ctxt.use_left_rail = true;
                this.ctxt.left_rail = RADIUS;
                this.ctxt.rail_top = top;
                this.ctxt.rail_bottom = bottom;
            }
            if !this.ctxt.use_right_rail {
                this.ctxt.use_right_rail = true;
                this.ctxt.right_rail = boxes
                    .iter()
                    .map(|b| b.right_anchor().x + RADIUS)
                    .fold(f32::MIN, f32::max);
                this.ctxt.rail_top = top;
                this.ctxt.rail_bottom = bottom;
            }
            tracing::trace!(
                left = this.ctxt.left_rail,
                right = this.ctxt.right_rail,
                top = this.ctxt.rail_top,
                bottom = this.ctxt.rail_bottom,
                "alternation rails"
            );
            let mut inner_above = false;
            for &alt in alts {
                this.render(alt, &mut inner_above)?;
            }
            Ok(())
        })?;

        let me = local(me);
        let mut entry = Direction::Right;
        let mut exit = Direction::Right;
        let mut start = me.left_anchor();
        let mut end = me.right_anchor();
        let mut on_left_rail = self.ctxt.use_left_rail;
        let mut on_right_rail = self.ctxt.use_right_rail;
        if on_left_rail {
            start.x = self.ctxt.left_rail;
            entry = Direction::Down;
        }
        if on_right_rail {
            end.x = self.ctxt.right_rail;
            exit = Direction::Up;
        }
        if above {
            on_left_rail = false;
            on_right_rail = false;
            start = me.top_left_anchor();
            end = me.top_right_anchor();
            entry = Direction::Down;
            exit = Direction::Up;
        }

        if on_left_rail {
            self.left_hook(start.x, &last)?;
        } else {
            self.connector(entry, start, last.left_anchor(), Direction::Right)?;
        }
        if on_right_rail {
            self.right_hook(end.x, &last)?;
        } else {
            self.connector(Direction::Right, last.right_anchor(), end, exit)?;
        }

        if !above {
            if on_left_rail {
                self.left_hook(start.x, &first)?;
            } else {
                self.surface.hline(start, first.left_anchor(), Class::Line);
                start.x += RADIUS;
            }
            if on_right_rail {
                let edge = Point::new(me.right_anchor().x, first.right_anchor().y);
                self.surface.hline(first.right_anchor(), edge, Class::Line);
            } else {
                self.surface.hline(first.right_anchor(), end, Class::Line);
                end.x -= RADIUS;
            }
        }

        let skip = usize::from(!above);
        let middle = boxes.get(skip..boxes.len() - 1).unwrap_or_default();
        for b in middle {
            if on_left_rail {
                self.left_hook(start.x, b)?;
            } else {
                let from = Point::new(start.x, b.left_anchor().y - RADIUS);
                self.connector(Direction::Down, from, b.left_anchor(), Direction::Right)?;
            }
            if on_right_rail {
                self.right_hook(end.x, b)?;
            } else {
                let to = Point::new(end.x, b.right_anchor().y - RADIUS);
                self.connector(Direction::Right, b.right_anchor(), to, Direction::Up)?;
            }
        }
        Ok(())
    }

    /// Joins an inherited left rail to the row of `b`. A row level with the
    /// rail's first row needs no turn.
    fn left_hook(&mut self, rail: f32, b: &OrientedBox) -> Result<(), LayoutError> {
        let row = b.left_anchor().y;
        if row - RADIUS < self.ctxt.rail_top {
            self.surface
                .hline(Point::new(rail, row), b.left_anchor(), Class::Line);
            return Ok(());
        }
        let from = Point::new(rail, self.ctxt.rail_bottom.min(row - RADIUS));
        self.connector(Direction::Down, from, b.left_anchor(), Direction::Right)
    }

    fn right_hook(&mut self, rail: f32, b: &OrientedBox) -> Result<(), LayoutError> {
        let to = Point::new(rail, self.ctxt.rail_bottom.min(b.right_anchor().y - RADIUS));
        self.connector(Direction::Right, b.right_anchor(), to, Direction::Up)
    }

    fn repetition(
        &mut self,
        me: &OrientedBox,
        body: NodeId,
        above: &mut bool,
    ) -> Result<(), LayoutError> {
        let body_above = self.scoped(|this| {
            this.ctxt.clear_rails();
            this.ctxt.reverse_direction();
            let mut body_above = true;
            this.framed(me, |this| this.render(body, &mut body_above))?;
            Ok(body_above)
        })?;

        self.forward_arrow(me);
        self.surface
            .hline(me.left_anchor(), me.right_anchor(), Class::Line);

        let e = self.boxed(body)?;
        let row = me.left_anchor().y;
        if body_above {
            let lanch = e.top_left_anchor().offset(me.top_left());
            let ranch = e.top_right_anchor().offset(me.top_left());
            let start = Point::new(ranch.x + RADIUS, row);
            let end = Point::new(lanch.x - RADIUS, row);
            self.connector(Direction::Left, start, lanch, Direction::Down)?;
            self.connector(Direction::Right, end, ranch, Direction::Down)?;
        } else {
            let lanch = e.left_anchor().offset(me.top_left());
            let ranch = e.right_anchor().offset(me.top_left());
            let start = Point::new(ranch.x, row);
            let end = Point::new(lanch.x, row);
            self.connector(Direction::Right, start, ranch, Direction::Left)?;
            self.connector(Direction::Left, lanch, end, Direction::Right)?;
        }
        *above = false;
        Ok(())
    }

    fn one_or_more(
        &mut self,
        me: &OrientedBox,
        body: NodeId,
        separator: Option<NodeId>,
        above: &mut bool,
    ) -> Result<(), LayoutError> {
        *above = false;
        let e = self.boxed(body)?;
        self.scoped(|this| {
            this.ctxt.clear_rails();
            this.framed(me, |this| {
                this.render(body, above)?;
                if let Some(separator) = separator {
                    this.ctxt.reverse_direction();
                    this.render(separator, above)?;
                }

                this.surface.hline(
                    Point::new(0.0, e.left_anchor().y),
                    e.left_anchor(),
                    Class::Line,
                );
                this.surface.hline(
                    e.right_anchor(),
                    Point::new(me.width(), e.right_anchor().y),
                    Class::Line,
                );

                if let Some(separator) = separator {
                    let s = this.boxed(separator)?;
                    this.connector(Direction::Right, e.right_anchor(), s.right_anchor(), Direction::Left)?;
                    this.connector(Direction::Left, s.left_anchor(), e.left_anchor(), Direction::Right)?;
                } else {
                    let lift = (e.right_anchor().y - e.top_right().y + PADH).max(RADIUS * 2.0);
                    let anch = e.right_anchor().moved(0.0, -lift);
                    this.connector(Direction::Right, e.right_anchor(), anch, Direction::Left)?;
                    this.connector(Direction::Left, anch, e.left_anchor(), Direction::Right)?;
                    let tip = anch.moved(-e.width() / 2.0, 0.0);
                    if this.ctxt.dir == Direction::Right {
                        this.surface.arrow_left(tip, 0.0, ARROW_SIZE);
                    } else {
                        this.surface.arrow_right(tip, 0.0, ARROW_SIZE);
                    }
                }
                Ok(())
            })
        })?;
        *above = false;
        Ok(())
    }

    fn optional(
        &mut self,
        me: &OrientedBox,
        body: NodeId,
        above: &mut bool,
    ) -> Result<(), LayoutError> {
        let body_above = self.scoped(|this| {
            this.ctxt.clear_rails();
            let mut body_above = true;
            this.framed(me, |this| this.render(body, &mut body_above))?;
            Ok(body_above)
        })?;

        let e = self.boxed(body)?;
        let start = me.left_anchor();
        let end = me.right_anchor();
        self.surface.hline(start, end, Class::Line);
        self.forward_arrow(me);

        if body_above {
            let lanch = e.top_left_anchor().offset(me.top_left());
            let ranch = e.top_right_anchor().offset(me.top_left());
            self.connector(Direction::Right, start, lanch, Direction::Down)?;
            self.connector(Direction::Up, ranch, end, Direction::Right)?;
        } else {
            let lanch = e.left_anchor().offset(me.top_left());
            let ranch = e.right_anchor().offset(me.top_left());
            if self.ctxt.use_left_rail {
                let from = Point::new(
                    self.ctxt.left_rail,
                    self.ctxt.rail_bottom.min(lanch.y - RADIUS),
                );
                self.connector(Direction::Down, from, lanch, Direction::Right)?;
            } else {
                self.connector(Direction::Right, start, lanch, Direction::Right)?;
            }
            if self.ctxt.use_right_rail {
                let to = Point::new(
                    self.ctxt.right_rail,
                    self.ctxt.rail_bottom.min(ranch.y - RADIUS),
                );
                self.connector(Direction::Right, ranch, to, Direction::Up)?;
            } else {
                self.connector(Direction::Right, ranch, end, Direction::Right)?;
            }
        }
        *above = false;
        Ok(())
    }

    /// Arrowhead in the middle of a bypass or loop line.
    fn forward_arrow(&mut self, me: &OrientedBox) {
        let tip = me.center_anchor().moved(ARROW_SIZE / 2.0, 0.0);
        if self.ctxt.dir == Direction::Right {
            self.surface.arrow_right(tip, 0.0, ARROW_SIZE);
        } else {
            self.surface.arrow_left(tip, 0.0, ARROW_SIZE);
        }
    }

    fn leaf(&mut self, me: &OrientedBox, text: &str, mut class: Class, linked: bool) {
        let mut p1 = me.top_left().moved(PADH, PADV);
        let mut p2 = me.bottom_right().moved(-PADH, -PADV);

        match self.ctxt.dir {
            Direction::None => {
                if class != Class::Title {
                    class = Class::Production;
                }
            }
            Direction::Up => {}
            Direction::Down => {
                p1 = p1.moved(0.0, ARROW_SIZE);
                self.surface
                    .arrow_down(me.top_center(), PADV + ARROW_SIZE, ARROW_SIZE);
                self.surface.vline(
                    me.bottom_center().moved(0.0, -PADV),
                    me.bottom_center(),
                    Class::Line,
                );
            }
            Direction::Left => {
                p2 = p2.moved(-ARROW_SIZE, 0.0);
                self.surface
                    .arrow_left(me.right_anchor(), PADH + ARROW_SIZE, ARROW_SIZE);
                self.surface.hline(
                    me.left_anchor(),
                    me.left_anchor().moved(PADH, 0.0),
                    Class::Line,
                );
            }
            Direction::Right => {
                p1 = p1.moved(ARROW_SIZE, 0.0);
                self.surface
                    .arrow_right(me.left_anchor(), PADH + ARROW_SIZE, ARROW_SIZE);
                self.surface.hline(
                    me.right_anchor(),
                    me.right_anchor().moved(-PADH, 0.0),
                    Class::Line,
                );
            }
        }

        if linked {
            self.surface.begin_link(text);
        }
        let (w, h) = (p2.x - p1.x, p2.y - p1.y);
        match class {
            Class::Production | Class::Title => {
                self.surface
                    .text(p1.x + PADH, p1.y, w, h - TEXT_PAD, text, class);
            }
            Class::Identifier => {
                self.surface.rectangle(p1.x, p1.y, w, h, class);
                self.surface
                    .centered_text(p1.x, p1.y, w, h - TEXT_PAD, text, class);
            }
            _ => {
                self.surface.rounded_rectangle(p1.x, p1.y, w, h, class);
                self.surface
                    .centered_text(p1.x, p1.y, w, h - TEXT_PAD, text, class);
            }
        }
        if linked {
            self.surface.end_link();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recorder::{DrawCall, Recorder};

    fn wrap(g: &mut Grammar, expr: NodeId) {
        let prod = g.production("rule", expr);
        let list = g.production_list(vec![prod]);
        g.grammar(None, list, None);
    }

    fn record(g: &Grammar, config: &Config) -> Recorder {
        let mut recorder = Recorder::new();
        render(&mut recorder, g, config).expect("render failed");
        recorder
    }

    #[test]
    fn state_stack_is_balanced_after_render() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let b = g.identifier("b");
        let alt = g.alternation(vec![a, b]);
        let rep = g.repetition(alt);
        wrap(&mut g, rep);

        let layout = compute_layout(&g, &Config::default().layout).unwrap();
        let mut recorder = Recorder::new();
        let config = Config::default();
        let mut renderer = Renderer::new(&g, &layout.boxes, &mut recorder, &config);
        renderer.whole(layout.root).unwrap();
        assert_eq!(renderer.ctxt.depth(), 0);
        assert_eq!(renderer.depth, 0);
        assert_eq!(recorder.open_frames(), 0);
    }

    #[test]
    fn optional_literal_draws_one_bypass_pair() {
        let mut g = Grammar::new();
        let x = g.literal("x");
        let opt = g.optional(x);
        wrap(&mut g, opt);
        let layout = compute_layout(&g, &Config::default().layout).unwrap();
        let me = *layout.boxes.get(opt).unwrap();
        let body = *layout.boxes.get(x).unwrap();
        let rec = record(&g, &Config::default());

        let arcs: Vec<_> = rec.paths().into_iter().filter(|p| p.arcs() == 2).collect();
        // one connector into the body, one back out
        assert_eq!(arcs.len(), 2);
        for path in &arcs {
            assert!(path.min_y() >= me.top_left().y);
        }
        // the body hangs below the bypass row
        assert!(body.top_left().y > me.y_anchor());
    }

    /// Diagram-space origin of the frame holding `target`'s box.
    fn frame_origin(
        g: &Grammar,
        layout: &Layout,
        from: NodeId,
        origin: Point,
        target: NodeId,
    ) -> Option<Point> {
        if from == target {
            return Some(origin);
        }
        let inner = origin.offset(layout.boxes.get(from).ok()?.top_left());
        g.node(from)?
            .children()
            .into_iter()
            .find_map(|child| frame_origin(g, layout, child, inner, target))
    }

    fn near(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 0.01 && (a.y - b.y).abs() < 0.01
    }

    #[test]
    fn repetition_topology_is_fixed() {
        for above_body in [false, true] {
            let mut g = Grammar::new();
            let body = if above_body {
                let a = g.literal("first");
                let b = g.literal("second");
                g.alternation(vec![a, b])
            } else {
                g.literal("x")
            };
            let rep = g.repetition(body);
            wrap(&mut g, rep);
            let rec = record(&g, &Config::default());

            let heads = rec.paths().iter().filter(|p| p.has_arrow_head()).count();
            // one per leaf plus the forward arrow
            let leaves = if above_body { 2 } else { 1 };
            assert_eq!(heads, leaves + 1, "above={above_body}");

            let layout = compute_layout(&g, &Config::default().layout).unwrap();
            let outer = frame_origin(&g, &layout, layout.root, Point::default(), rep).unwrap();
            let me = layout.boxes.get(rep).unwrap();
            let left = me.left_anchor().offset(outer);
            let right = me.right_anchor().offset(outer);

            let forward = rec
                .paths()
                .into_iter()
                .filter(|p| p.class == Class::Line && p.arcs() == 0)
                .filter(|p| near(p.start, left) && near(p.end(), right))
                .count();
            assert_eq!(forward, 1, "above={above_body}");

            let inner = outer.offset(me.top_left());
            let e = layout.boxes.get(body).unwrap();
            let anchors = if above_body {
                [e.top_left_anchor(), e.top_right_anchor()]
            } else {
                [e.left_anchor(), e.right_anchor()]
            }
            .map(|p| p.offset(inner));
            let on_row = |p: Point| (p.y - left.y).abs() < 0.01;
            let at_body = |p: Point| anchors.iter().any(|a| near(*a, p));
            let joins = rec
                .paths()
                .into_iter()
                .filter(|p| p.class == Class::Line && p.arcs() > 0)
                .filter(|p| {
                    (on_row(p.start) && at_body(p.end())) || (on_row(p.end()) && at_body(p.start))
                })
                .count();
            assert_eq!(joins, 2, "above={above_body}");
        }
    }

    #[test]
    fn long_alternation_allocates_two_rails() {
        let mut g = Grammar::new();
        let a = g.literal("aaaa");
        let b = g.literal("bbbb");
        let c = g.literal("cccc");
        let alt = g.alternation(vec![a, b, c]);
        wrap(&mut g, alt);
        let rec = record(&g, &Config::default());

        let runs: Vec<(f32, f32, f32)> = rec
            .paths()
            .iter()
            .flat_map(|p| p.vertical_runs())
            .filter(|(_, from, to)| (to - from).abs() > 1.0)
            .collect();
        let mut rails: Vec<i64> = runs.iter().map(|(x, _, _)| (x * 100.0).round() as i64).collect();
        rails.sort_unstable();
        rails.dedup();
        assert_eq!(rails.len(), 2, "vertical runs at {rails:?}");

        let layout = compute_layout(&g, &Config::default().layout).unwrap();
        let row = |id: NodeId| {
            let origin = frame_origin(&g, &layout, layout.root, Point::default(), id).unwrap();
            layout.boxes.get(id).unwrap().left_anchor().offset(origin).y
        };
        let (first_row, last_row) = (row(a), row(c));
        for rail in rails {
            let (top, bottom) = runs
                .iter()
                .filter(|(x, _, _)| (x * 100.0).round() as i64 == rail)
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (_, from, to)| {
                    (lo.min(from.min(*to)), hi.max(from.max(*to)))
                });
            assert!((top - (first_row + RADIUS)).abs() < 0.01, "rail {rail} top {top}");
            assert!((bottom - (last_row - RADIUS)).abs() < 0.01, "rail {rail} bottom {bottom}");
        }
    }

    #[test]
    fn identifiers_naming_productions_are_linked() {
        let mut g = Grammar::new();
        let other = g.identifier("digit");
        let rule = g.production("number", other);
        let d = g.literal("0");
        let digit = g.production("digit", d);
        let list = g.production_list(vec![rule, digit]);
        g.grammar(None, list, None);

        let rec = record(&g, &Config::default());
        let links: Vec<_> = rec
            .calls()
            .iter()
            .filter_map(|c| match c {
                DrawCall::BeginLink(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(links, ["digit"]);

        let mut config = Config::default();
        config.render.link_identifiers = false;
        let rec = record(&g, &config);
        assert!(!rec.calls().iter().any(|c| matches!(c, DrawCall::BeginLink(_))));
    }

    #[test]
    fn split_mode_emits_a_diagram_per_production() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let first = g.production("first", a);
        let b = g.literal("b");
        let second = g.production("second", b);
        let list = g.production_list(vec![first, second]);
        g.grammar(None, list, None);

        let mut config = Config::default();
        config.render.split_productions = true;
        let rec = record(&g, &config);
        let names: Vec<_> = rec.diagrams().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, ["first", "second"]);
        for diagram in rec.diagrams() {
            assert!(diagram.min_x >= 0.0 && diagram.min_y >= 0.0, "{diagram:?}");
        }
    }

    #[test]
    fn render_is_deterministic() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let sep = g.literal(",");
        let many = g.one_or_more(a, Some(sep));
        let c = g.identifier("c");
        let opt = g.optional(c);
        let seq = g.sequence(vec![many, opt]);
        wrap(&mut g, seq);
        let first = record(&g, &Config::default());
        let second = record(&g, &Config::default());
        assert_eq!(first.calls(), second.calls());
    }
}
