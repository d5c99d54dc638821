//! Double-dispatch visitor framework over the closed LTLf node set.
//!
//! Adding a node variant means adding a field to [`NodeView`] and a method
//! to [`Visitor`], which in turn forces every implementor to handle it.
//! That is the point: the node set is closed, so there is no open-ended
//! extension mechanism here, just an exhaustive `match`.

use super::{AtomId, Context, Handle};

/// A single level of an LTLf formula, decomposed for dispatch. Returned by
/// [`Context::view`](super::Context::view).
#[derive(Clone, Debug)]
pub enum NodeView {
    True,
    False,
    Atom(AtomId),
    PropNot(AtomId),
    Not(Handle),
    And(Vec<Handle>),
    Or(Vec<Handle>),
    Implies(Handle, Handle),
    Equivalent(Handle, Handle),
    Xor(Handle, Handle),
    Next(Handle),
    WeakNext(Handle),
    Eventually(Handle),
    Always(Handle),
    Until(Handle, Handle),
    Release(Handle, Handle),
    TaggedNext(Handle),
}

/// A rewriting or reducing visitor over LTLf formulas.
///
/// Visitors are functional: implementations of [`Visitor::visit`] return a
/// value of `T` and do not mutate the formula they are visiting (only the
/// [`Context`], by interning new nodes). The framework itself performs no
/// caching across calls; a visitor that wants memoization keeps its own
/// cache, as [`crate::formula::nnf::ToNnf`] and [`crate::formula::xnf::Xnf`]
/// do.
pub trait Visitor<T> {
    fn visit_true(&mut self, ctx: &mut Context) -> T;
    fn visit_false(&mut self, ctx: &mut Context) -> T;
    fn visit_atom(&mut self, ctx: &mut Context, id: AtomId) -> T;
    fn visit_prop_not(&mut self, ctx: &mut Context, id: AtomId) -> T;
    fn visit_not(&mut self, ctx: &mut Context, child: Handle) -> T;
    fn visit_and(&mut self, ctx: &mut Context, children: &[Handle]) -> T;
    fn visit_or(&mut self, ctx: &mut Context, children: &[Handle]) -> T;
    fn visit_implies(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> T;
    fn visit_equivalent(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> T;
    fn visit_xor(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> T;
    fn visit_next(&mut self, ctx: &mut Context, child: Handle) -> T;
    fn visit_weak_next(&mut self, ctx: &mut Context, child: Handle) -> T;
    fn visit_eventually(&mut self, ctx: &mut Context, child: Handle) -> T;
    fn visit_always(&mut self, ctx: &mut Context, child: Handle) -> T;
    fn visit_until(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> T;
    fn visit_release(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> T;
    fn visit_tagged_next(&mut self, ctx: &mut Context, child: Handle) -> T;

    /// Dispatches on the node's variant. Implementors should not need to
    /// override this; it exists so a single call site (`visit(ctx, h)`) can
    /// replace the explicit `match` every visitor would otherwise repeat.
    fn visit(&mut self, ctx: &mut Context, h: Handle) -> T {
        match ctx.view(h) {
            NodeView::True => self.visit_true(ctx),
            NodeView::False => self.visit_false(ctx),
            NodeView::Atom(id) => self.visit_atom(ctx, id),
            NodeView::PropNot(id) => self.visit_prop_not(ctx, id),
            NodeView::Not(c) => self.visit_not(ctx, c),
            NodeView::And(cs) => self.visit_and(ctx, &cs),
            NodeView::Or(cs) => self.visit_or(ctx, &cs),
            NodeView::Implies(l, r) => self.visit_implies(ctx, l, r),
            NodeView::Equivalent(l, r) => self.visit_equivalent(ctx, l, r),
            NodeView::Xor(l, r) => self.visit_xor(ctx, l, r),
            NodeView::Next(c) => self.visit_next(ctx, c),
            NodeView::WeakNext(c) => self.visit_weak_next(ctx, c),
            NodeView::Eventually(c) => self.visit_eventually(ctx, c),
            NodeView::Always(c) => self.visit_always(ctx, c),
            NodeView::Until(l, r) => self.visit_until(ctx, l, r),
            NodeView::Release(l, r) => self.visit_release(ctx, l, r),
            NodeView::TaggedNext(c) => self.visit_tagged_next(ctx, c),
        }
    }
}

impl Handle {
    /// Dispatches `visitor` on this handle within `ctx`. Equivalent to
    /// `visitor.visit(ctx, self)`, provided for a more natural call order
    /// at use sites (`h.accept(ctx, &mut v)`).
    pub fn accept<T>(self, ctx: &mut Context, visitor: &mut dyn Visitor<T>) -> T {
        visitor.visit(ctx, self)
    }
}
