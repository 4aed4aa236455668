//! Bottom-up pass: every node's oriented box, built from its children's.
//!
//! Each call returns the node's box with its top-left corner at the origin
//! (grammar and production-list boxes start there and only grow down and
//! right). The parent positions the child and records the final box in the
//! table, so every table entry lives in its parent's frame.

use super::context::{Direction, LayoutContext};
use super::geometry::{OrientedBox, Point};
use super::{
    ARROW_SIZE, BoxTable, CIRCLE, HEADING_LEAD, LINE_HEIGHT, LayoutError, PADH, PADV, RADIUS,
    TEXT_RATIO,
};
use crate::ir::{Grammar, Node, NodeId};

type Placed = Vec<(NodeId, OrientedBox)>;

pub(super) struct Sizer<'a> {
    grammar: &'a Grammar,
    table: BoxTable,
    ctxt: LayoutContext,
    depth: usize,
    max_depth: usize,
}

fn fresh() -> OrientedBox {
    OrientedBox::new(PADH, LINE_HEIGHT / 2.0 + PADV)
}

impl<'a> Sizer<'a> {
    pub(super) fn new(grammar: &'a Grammar, max_depth: usize) -> Self {
        Self {
            grammar,
            table: BoxTable::with_capacity(grammar.len()),
            ctxt: LayoutContext::new(),
            depth: 0,
            max_depth,
        }
    }

    pub(super) fn run(mut self, root: NodeId) -> Result<BoxTable, LayoutError> {
        let mut above = false;
        let top = self.size(root, &mut above)?;
        self.table.insert(root, top)?;
        debug_assert_eq!(self.ctxt.depth(), 0);
        Ok(self.table)
    }

    fn size(&mut self, id: NodeId, above: &mut bool) -> Result<OrientedBox, LayoutError> {
        if self.depth >= self.max_depth {
            return Err(LayoutError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        let result = self.scoped(|this| this.size_node(id, above));
        self.depth -= 1;
        result
    }

    fn size_opt(&mut self, id: Option<NodeId>, above: &mut bool) -> Result<OrientedBox, LayoutError> {
        match id {
            Some(id) => self.size(id, above),
            None => Ok(fresh()),
        }
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

    fn place(&mut self, parts: Placed, delta: Point) -> Result<(), LayoutError> {
        for (id, mut placed) in parts {
            placed.move_by(delta);
            self.table.insert(id, placed)?;
        }
        Ok(())
    }

    fn size_node(&mut self, id: NodeId, above: &mut bool) -> Result<OrientedBox, LayoutError> {
        let grammar = self.grammar;
        match grammar.node(id).ok_or(LayoutError::UnknownNode(id))? {
            Node::Grammar {
                title,
                productions,
                comment,
            } => self.grammar_box(*title, *productions, *comment, above),
            Node::ProductionList(items) => self.production_list(items, above),
            Node::Production {
                identifier,
                expression,
            } => self.production(*identifier, *expression, above),
            Node::Alternation(alts) if alts.is_empty() => Ok(fresh()),
            Node::Alternation(alts) if grammar.is_short(alts) => self.short_alternation(alts),
            Node::Alternation(alts) => self.long_alternation(alts, above),
            Node::Sequence(items) => self.sequence(items, above),
            Node::Repetition(body) => self.repetition(*body, above),
            Node::OneOrMore { body, separator } => self.one_or_more(*body, *separator, above),
            Node::Optional(body) => self.optional(*body, above),
            Node::Literal { text, .. } | Node::Identifier(text) | Node::Other(text) => {
                *above = false;
                Ok(self.leaf(text))
            }
        }
    }

    fn grammar_box(
        &mut self,
        title: Option<NodeId>,
        productions: NodeId,
        comment: Option<NodeId>,
        above: &mut bool,
    ) -> Result<OrientedBox, LayoutError> {
        self.ctxt.dir = Direction::None;
        self.ctxt.clear_rails();
        *above = false;

        let mut me = fresh();
        let title_box = self.size_opt(title, above)?;
        let mut prods = self.size(productions, above)?;
        let mut comment_box = self.size_opt(comment, above)?;

        prods.move_to(title_box.bottom_left());
        comment_box.move_to(prods.bottom_left());
        me.include(&title_box);
        me.include(&prods);
        me.include(&comment_box);

        if let Some(title) = title {
            self.table.insert(title, title_box)?;
        }
        self.table.insert(productions, prods)?;
        if let Some(comment) = comment {
            self.table.insert(comment, comment_box)?;
        }
        Ok(me)
    }

    fn production_list(
        &mut self,
        items: &[NodeId],
        above: &mut bool,
    ) -> Result<OrientedBox, LayoutError> {
        self.ctxt.dir = Direction::None;
        self.ctxt.clear_rails();
        *above = false;

        let mut me = fresh();
        for &item in items {
            let mut placed = self.size(item, above)?;
            placed.move_to(me.bottom_left());
            me.include(&placed);
            self.table.insert(item, placed)?;
        }
        Ok(me)
    }

    fn production(
        &mut self,
        identifier: NodeId,
        expression: NodeId,
        above: &mut bool,
    ) -> Result<OrientedBox, LayoutError> {
        self.ctxt.clear_rails();
        *above = false;

        // The name is a heading; it gets the lead-in room a flow leaf would have.
        self.ctxt.dir = Direction::None;
        let mut name = self.size(identifier, above)?;
        name.include_point(name.top_right().moved(HEADING_LEAD, 0.0));
        name.set_y_anchor(LINE_HEIGHT + PADH);

        self.ctxt.dir = Direction::Right;
        let mut expr = self.size(expression, above)?;
        expr.move_left_anchor_to(name.right_anchor());

        let mut me = fresh();
        me.include(&name);
        me.include(&expr);
        me.include_point(expr.bottom_right().moved(PADH * 3.0 + CIRCLE, 0.0));

        let delta = me.normalize();
        self.place(vec![(identifier, name), (expression, expr)], delta)?;
        Ok(me)
    }

    fn short_alternation(&mut self, alts: &[NodeId]) -> Result<OrientedBox, LayoutError> {
        let mut me = fresh();
        let mut parts = Placed::with_capacity(alts.len());
        for &alt in alts {
            let mut placed = self.scoped(|this| {
                this.ctxt.clear_rails();
                this.ctxt.dir = Direction::Down;
                let mut inner_above = false;
                this.size(alt, &mut inner_above)
            })?;
            placed.move_to(me.top_right());
            me.include(&placed);
            parts.push((alt, placed));
        }

        let lift = PADV.max(RADIUS);
        me.set_y_anchor(-lift);
        me.include_point(Point::new(0.0, -lift * 2.0));
        if self.ctxt.dir == Direction::Right {
            me.include_point(me.bottom_right().moved(RADIUS * 2.0, lift * 2.0));
        } else {
            me.include_point(me.bottom_left().moved(-RADIUS * 2.0, lift * 2.0));
        }

        let delta = me.normalize();
        self.place(parts, delta)?;
        Ok(me)
    }

    fn long_alternation(
        &mut self,
        alts: &[NodeId],
        above: &mut bool,
    ) -> Result<OrientedBox, LayoutError> {
        let outer_above = *above;
        let mut me = fresh();
        let mut parts = Placed::with_capacity(alts.len());
        let mut inner_above = false;

        self.scoped(|this| {
            this.ctxt.use_left_rail = true;
            this.ctxt.use_right_rail = true;
            for (idx, &alt) in alts.iter().enumerate() {
                let mut placed = this.size(alt, &mut inner_above)?;
                if idx == 0 {
                    placed.move_left_anchor_to(me.left_anchor());
                } else if idx == 1 && !outer_above {
                    // keep the second row at least two radii below the first
                    let below = me.bottom_left();
                    let clear = me
                        .left_anchor()
                        .moved(0.0, RADIUS * 2.0 - placed.y_anchor());
                    placed.move_to(below.max(clear));
                } else {
                    placed.move_to(me.bottom_left());
                }
                me.include(&placed);
                parts.push((alt, placed));
            }
            Ok(())
        })?;

        if outer_above {
            me.include_point(Point::new(-RADIUS - PADH, me.left_anchor().y - RADIUS));
            me.include_point(me.bottom_right().moved(RADIUS + PADH, 0.0));
        } else {
            if !self.ctxt.use_left_rail {
                me.include_point(Point::new(-RADIUS * 2.0, 0.0));
            }
            if !self.ctxt.use_right_rail {
                me.include_point(me.bottom_right().moved(RADIUS * 2.0, 0.0));
            }
        }

        let delta = me.normalize();
        self.place(parts, delta)?;
        Ok(me)
    }

    fn sequence(&mut self, items: &[NodeId], above: &mut bool) -> Result<OrientedBox, LayoutError> {
        *above = false;
        let mut me = fresh();
        let Some(last) = items.len().checked_sub(1) else {
            return Ok(me);
        };

        let forward = self.ctxt.dir == Direction::Right;
        let mut anchor = if forward {
            me.left_anchor()
        } else {
            me.right_anchor()
        };
        let mut parts = Placed::with_capacity(items.len());
        for (idx, &item) in items.iter().enumerate() {
            let mut placed = self.scoped(|this| {
                if idx > 0 {
                    this.ctxt.use_left_rail = false;
                }
                if idx < last {
                    this.ctxt.use_right_rail = false;
                }
                this.size(item, above)
            })?;
            if forward {
                placed.move_left_anchor_to(anchor);
                anchor = placed.right_anchor();
            } else {
                placed.move_right_anchor_to(anchor);
                anchor = placed.left_anchor();
            }
            me.include(&placed);
            parts.push((item, placed));
        }

        let delta = me.normalize();
        let first_row = parts[0].1.left_anchor().y + delta.y;
        me.set_y_anchor(first_row - me.top_left().y);
        self.place(parts, delta)?;
        Ok(me)
    }

    fn repetition(&mut self, body: NodeId, above: &mut bool) -> Result<OrientedBox, LayoutError> {
        let (mut inner, body_above) = self.scoped(|this| {
            this.ctxt.clear_rails();
            this.ctxt.reverse_direction();
            let mut body_above = true;
            let inner = this.size(body, &mut body_above)?;
            Ok((inner, body_above))
        })?;

        let mut me = fresh();
        let side = if body_above {
            RADIUS - PADH
        } else {
            RADIUS + PADH
        };
        me.set_y_anchor(PADV + ARROW_SIZE / 2.0);
        me.include_point(Point::new(side, PADV * 2.0 + ARROW_SIZE));
        inner.move_to(me.bottom_right());
        if body_above {
            inner.move_by(Point::new(0.0, (RADIUS - PADV - ARROW_SIZE / 2.0).max(0.0)));
        } else {
            let gap = RADIUS * 2.0 - (inner.left_anchor().y - me.left_anchor().y);
            if gap > 0.0 {
                inner.move_by(Point::new(0.0, gap));
            }
        }
        me.include_point(inner.bottom_right().moved(side, 0.0));

        let delta = me.normalize();
        self.place(vec![(body, inner)], delta)?;
        *above = false;
        Ok(me)
    }

    fn one_or_more(
        &mut self,
        body: NodeId,
        separator: Option<NodeId>,
        above: &mut bool,
    ) -> Result<OrientedBox, LayoutError> {
        *above = false;
        let mut me = fresh();
        let parts = self.scoped(|this| {
            this.ctxt.clear_rails();
            let mut inner = this.size(body, above)?;
            inner.move_left_anchor_to(Point::new(RADIUS + PADH, me.left_anchor().y));

            let Some(separator) = separator else {
                let over = inner
                    .right_anchor()
                    .moved(0.0, -(RADIUS * 2.0 + ARROW_SIZE / 2.0 + PADH));
                let clear = inner.top_right().moved(0.0, -(ARROW_SIZE + PADH));
                me.include(&inner);
                me.include_point(over.min(clear).moved(RADIUS + PADH, 0.0));
                return Ok(vec![(body, inner)]);
            };

            this.ctxt.reverse_direction();
            let mut sep = this.size(separator, above)?;
            sep.move_to(inner.bottom_left());
            let gap = (RADIUS * 2.0 - (sep.right_anchor().y - inner.right_anchor().y)).max(0.0);
            sep.move_by(Point::new(0.0, gap));
            me.include(&inner);
            me.include(&sep);
            me.include_point(
                inner
                    .bottom_right()
                    .max(sep.bottom_right())
                    .moved(RADIUS + PADH, 0.0),
            );
            Ok(vec![(body, inner), (separator, sep)])
        })?;

        let delta = me.normalize();
        self.place(parts, delta)?;
        *above = false;
        Ok(me)
    }

    fn optional(&mut self, body: NodeId, above: &mut bool) -> Result<OrientedBox, LayoutError> {
        let (mut inner, body_above) = self.scoped(|this| {
            this.ctxt.clear_rails();
            let mut body_above = true;
            let inner = this.size(body, &mut body_above)?;
            Ok((inner, body_above))
        })?;

        let mut me = fresh();
        if body_above {
            let drop = (PADV + ARROW_SIZE + PADV).max(PADV + ARROW_SIZE / 2.0 + RADIUS);
            me.include_point(Point::new(RADIUS - PADV, drop));
        } else if self.ctxt.use_left_rail {
            me.include_point(Point::new(0.0, PADV * 2.0 + ARROW_SIZE));
        } else {
            me.include_point(Point::new(RADIUS * 2.0, PADV * 2.0 + ARROW_SIZE));
        }
        me.set_y_anchor(PADV + ARROW_SIZE / 2.0);

        inner.move_to(me.bottom_right());
        if body_above {
            me.include_point(inner.bottom_right().moved(RADIUS - PADH, 0.0));
        } else {
            let gap = RADIUS * 2.0 - (inner.left_anchor().y - me.left_anchor().y);
            if gap > 0.0 {
                inner.move_by(Point::new(0.0, gap));
            }
            if self.ctxt.use_right_rail {
                me.include_point(inner.bottom_right());
            } else {
                me.include_point(inner.bottom_right().moved(RADIUS * 2.0, 0.0));
            }
        }

        let delta = me.normalize();
        self.place(vec![(body, inner)], delta)?;
        *above = false;
        Ok(me)
    }

    fn leaf(&self, text: &str) -> OrientedBox {
        let chars = text.chars().count() as f32;
        let mut me = fresh();
        match self.ctxt.dir {
            Direction::None => me.set_size(chars * LINE_HEIGHT * TEXT_RATIO, LINE_HEIGHT + PADV * 2.0),
            Direction::Left | Direction::Right => me.set_size(
                (chars + 2.0) * LINE_HEIGHT * TEXT_RATIO + ARROW_SIZE + PADH * 2.0,
                LINE_HEIGHT + PADV * 2.0,
            ),
            Direction::Up | Direction::Down => me.set_size(
                (chars + 2.0) * LINE_HEIGHT * TEXT_RATIO + PADH * 2.0,
                LINE_HEIGHT + ARROW_SIZE + PADV * 2.0,
            ),
        }
        me
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::{Layout, compute_layout};

    fn wrap(g: &mut Grammar, expr: NodeId) -> NodeId {
        let prod = g.production("rule", expr);
        let list = g.production_list(vec![prod]);
        g.grammar(None, list, None);
        prod
    }

    fn layout(g: &Grammar) -> Layout {
        compute_layout(g, &LayoutConfig::default()).expect("layout failed")
    }

    #[test]
    fn single_literal_without_direction() {
        let mut g = Grammar::new();
        let lit = g.literal("a");
        let mut sizer = Sizer::new(&g, 16);
        let mut above = true;
        let b = sizer.size(lit, &mut above).unwrap();
        assert!(!above);
        assert_eq!(b.width(), 1.0 * LINE_HEIGHT * TEXT_RATIO);
        assert_eq!(b.height(), LINE_HEIGHT + 2.0 * PADV);
        assert_eq!(sizer.ctxt.depth(), 0);
    }

    #[test]
    fn every_box_is_well_formed() {
        let mut g = Grammar::new();
        let a = g.literal("alpha");
        let b = g.identifier("beta");
        let c = g.literal("+");
        let d = g.literal("-");
        let e = g.literal("*");
        let short = g.alternation(vec![c, d, e]);
        let opt = g.optional(short);
        let seq = g.sequence(vec![a, opt, b]);
        let f = g.literal("gamma");
        let sep = g.literal(",");
        let many = g.one_or_more(f, Some(sep));
        let rep = g.repetition(many);
        let alt = g.alternation(vec![seq, rep]);
        wrap(&mut g, alt);

        let laid = layout(&g);
        assert_eq!(laid.boxes.len(), g.len());
        for (id, b) in laid.boxes.iter() {
            assert!(b.width() >= 0.0, "{id} has negative width");
            assert!(b.height() >= 0.0, "{id} has negative height");
            assert!(b.top_left().x <= b.bottom_right().x);
            assert!(b.top_left().y <= b.bottom_right().y);
        }
    }

    #[test]
    fn sequence_children_abut() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let b = g.identifier("bee");
        let c = g.literal("c");
        let opt = g.optional(c);
        let seq = g.sequence(vec![a, b, opt]);
        wrap(&mut g, seq);

        let laid = layout(&g);
        let boxes: Vec<_> = [a, b, opt]
            .iter()
            .map(|id| *laid.boxes.get(*id).unwrap())
            .collect();
        for pair in boxes.windows(2) {
            assert_eq!(pair[0].right_anchor(), pair[1].left_anchor());
        }
        let seq_box = laid.boxes.get(seq).unwrap();
        assert_eq!(seq_box.y_anchor(), boxes[0].left_anchor().y);
    }

    #[test]
    fn reversed_sequence_abuts_right_to_left() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let b = g.literal("b");
        let seq = g.sequence(vec![a, b]);
        let rep = g.repetition(seq);
        wrap(&mut g, rep);

        let laid = layout(&g);
        let first = laid.boxes.get(a).unwrap();
        let second = laid.boxes.get(b).unwrap();
        assert_eq!(first.left_anchor(), second.right_anchor());
        assert!(second.top_left().x < first.top_left().x);
    }

    #[test]
    fn long_alternation_separates_first_two_rows() {
        let mut g = Grammar::new();
        let a = g.literal("first");
        let b = g.literal("second");
        let c = g.literal("third");
        let alt = g.alternation(vec![a, b, c]);
        wrap(&mut g, alt);

        let laid = layout(&g);
        let rows: Vec<f32> = [a, b, c]
            .iter()
            .map(|id| laid.boxes.get(*id).unwrap().left_anchor().y)
            .collect();
        assert!(rows[1] - rows[0] >= RADIUS * 2.0);
        assert!(rows[2] > rows[1]);
        let alt_box = laid.boxes.get(alt).unwrap();
        // rails on both sides
        assert_eq!(laid.boxes.get(a).unwrap().top_left().x, RADIUS * 2.0);
        assert_eq!(alt_box.y_anchor(), rows[0]);
    }

    #[test]
    fn optional_reserves_less_room_on_an_inherited_rail() {
        let mut g = Grammar::new();
        let x = g.literal("x");
        let opt = g.optional(x);
        let y = g.literal("y");
        let alt = g.alternation(vec![opt, y]);
        wrap(&mut g, alt);
        let on_rail = layout(&g);

        let mut h = Grammar::new();
        let x2 = h.literal("x");
        let opt2 = h.optional(x2);
        wrap(&mut h, opt2);
        let free = layout(&h);

        let w_rail = on_rail.boxes.get(opt).unwrap().width();
        let w_free = free.boxes.get(opt2).unwrap().width();
        assert!((w_free - w_rail - RADIUS * 4.0).abs() < 1e-3);
    }

    #[test]
    fn production_is_anchored_at_origin() {
        let mut g = Grammar::new();
        let x = g.literal("x");
        let prod = wrap(&mut g, x);
        let laid = layout(&g);
        let ident = match g.node(prod) {
            Some(Node::Production { identifier, .. }) => *identifier,
            _ => unreachable!(),
        };
        let name = laid.boxes.get(ident).unwrap();
        let expr = laid.boxes.get(x).unwrap();
        assert_eq!(name.top_left().x, 0.0);
        assert_eq!(name.right_anchor(), expr.left_anchor());
        assert_eq!(
            name.width(),
            4.0 * LINE_HEIGHT * TEXT_RATIO + HEADING_LEAD
        );
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut g = Grammar::new();
        let mut node = g.literal("x");
        for _ in 0..40 {
            node = g.optional(node);
        }
        wrap(&mut g, node);
        let err = compute_layout(&g, &LayoutConfig { max_depth: 16 }).unwrap_err();
        assert_eq!(err, LayoutError::NestingTooDeep(16));
        assert!(compute_layout(&g, &LayoutConfig { max_depth: 64 }).is_ok());
    }

    #[test]
    fn pushed_cycle_hits_the_depth_limit() {
        let mut g = Grammar::new();
        let a = g.push(Node::Optional(NodeId(1)));
        let b = g.push(Node::Optional(a));
        wrap(&mut g, b);
        let err = compute_layout(&g, &LayoutConfig { max_depth: 16 }).unwrap_err();
        assert_eq!(err, LayoutError::NestingTooDeep(16));
    }

    #[test]
    fn shared_subtree_is_rejected() {
        let mut g = Grammar::new();
        let x = g.literal("x");
        let seq = g.sequence(vec![x, x]);
        wrap(&mut g, seq);
        let err = compute_layout(&g, &LayoutConfig::default()).unwrap_err();
        assert_eq!(err, LayoutError::SharedNode(x));
    }
}
