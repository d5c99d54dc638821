//! Algebraic simplification.
//!
//! Complements the normalization already performed by the [`Context`]
//! constructors (flattening, absorption and deduplication of `And`/`Or`,
//! double-negation elimination) with identities that only become visible
//! once an operand is a known constant, e.g. `phi U false = false` or
//! `true R phi = G phi`. Runs bottom-up and is safe to apply at any point
//! in the pipeline: before or after [`super::nnf::ToNnf`].

use std::collections::HashMap;

use super::visitor::Visitor;
use super::{AtomId, Context, Handle};

/// Re-interns an atom by id within `ctx`, preserving [`AtomId::END`] rather
/// than round-tripping it through a name (it has none).
fn reintern_atom(ctx: &mut Context, id: AtomId) -> Handle {
    if id == AtomId::END {
        ctx.make_end()
    } else {
        let name = ctx.atom_name(id).unwrap_or_default().to_owned();
        ctx.make_atom(&name)
    }
}

/// Rewrites a formula by folding constant operands of temporal and
/// propositional connectives, bottom-up, with per-handle memoization.
pub struct Simplify {
    cache: HashMap<Handle, Handle>,
}

impl Simplify {
    fn new() -> Self {
        Self { cache: HashMap::new() }
    }

    /// Simplifies `h`, returning a handle to the (possibly identical) result.
    pub fn simplify(ctx: &mut Context, h: Handle) -> Handle {
        let mut visitor = Self::new();
        visitor.rec(ctx, h)
    }

    fn rec(&mut self, ctx: &mut Context, h: Handle) -> Handle {
        if let Some(&cached) = self.cache.get(&h) {
            return cached;
        }
        let result = <Self as Visitor<Handle>>::visit(self, ctx, h);
        self.cache.insert(h, result);
        result
    }
}

impl Visitor<Handle> for Simplify {
    fn visit_true(&mut self, ctx: &mut Context) -> Handle {
        ctx.make_true()
    }

    fn visit_false(&mut self, ctx: &mut Context) -> Handle {
        ctx.make_false()
    }

    fn visit_atom(&mut self, ctx: &mut Context, id: AtomId) -> Handle {
        reintern_atom(ctx, id)
    }

    fn visit_prop_not(&mut self, ctx: &mut Context, id: AtomId) -> Handle {
        let a = reintern_atom(ctx, id);
        ctx.make_prop_not(a).expect("atom must accept PropNot")
    }

    fn visit_not(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        ctx.make_not(c).expect("simplify: shared context")
    }

    fn visit_and(&mut self, ctx: &mut Context, children: &[Handle]) -> Handle {
        let rewritten: Vec<Handle> = children.iter().map(|&c| self.rec(ctx, c)).collect();
        ctx.make_and(&rewritten).expect("simplify: shared context")
    }

    fn visit_or(&mut self, ctx: &mut Context, children: &[Handle]) -> Handle {
        let rewritten: Vec<Handle> = children.iter().map(|&c| self.rec(ctx, c)).collect();
        ctx.make_or(&rewritten).expect("simplify: shared context")
    }

    fn visit_implies(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let l = self.rec(ctx, lhs);
        let r = self.rec(ctx, rhs);
        if ctx.is_false(l) || ctx.is_true(r) {
            return ctx.make_true();
        }
        if ctx.is_true(l) {
            return r;
        }
        if ctx.is_false(r) {
            return ctx.make_not(l).expect("simplify: shared context");
        }
        ctx.make_implies(l, r).expect("simplify: shared context")
    }

    fn visit_equivalent(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let l = self.rec(ctx, lhs);
        let r = self.rec(ctx, rhs);
        if ctx.is_true(l) {
            return r;
        }
        if ctx.is_true(r) {
            return l;
        }
        if ctx.is_false(l) {
            return ctx.make_not(r).expect("simplify: shared context");
        }
        if ctx.is_false(r) {
            return ctx.make_not(l).expect("simplify: shared context");
        }
        ctx.make_equivalent(l, r).expect("simplify: shared context")
    }

    fn visit_xor(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let l = self.rec(ctx, lhs);
        let r = self.rec(ctx, rhs);
        if ctx.is_false(l) {
            return r;
        }
        if ctx.is_false(r) {
            return l;
        }
        if ctx.is_true(l) {
            return ctx.make_not(r).expect("simplify: shared context");
        }
        if ctx.is_true(r) {
            return ctx.make_not(l).expect("simplify: shared context");
        }
        ctx.make_xor(l, r).expect("simplify: shared context")
    }

    fn visit_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        ctx.make_next(c).expect("simplify: shared context")
    }

    fn visit_weak_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        ctx.make_weak_next(c).expect("simplify: shared context")
    }

    fn visit_eventually(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        if ctx.is_true(c) || ctx.is_false(c) {
            return c;
        }
        ctx.make_eventually(c).expect("simplify: shared context")
    }

    fn visit_always(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        if ctx.is_true(c) || ctx.is_false(c) {
            return c;
        }
        ctx.make_always(c).expect("simplify: shared context")
    }

    fn visit_until(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let l = self.rec(ctx, lhs);
        let r = self.rec(ctx, rhs);
        if ctx.is_false(r) {
            return r;
        }
        if ctx.is_true(r) {
            return r;
        }
        if ctx.is_false(l) {
            // phi U psi with phi never true only holds right away.
            return r;
        }
        if ctx.is_true(l) {
            return ctx.make_eventually(r).expect("simplify: shared context");
        }
        ctx.make_until(l, r).expect("simplify: shared context")
    }

    fn visit_release(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let l = self.rec(ctx, lhs);
        let r = self.rec(ctx, rhs);
        if ctx.is_false(r) {
            return r;
        }
        if ctx.is_true(l) {
            return r;
        }
        if ctx.is_false(l) {
            return ctx.make_always(r).expect("simplify: shared context");
        }
        if ctx.is_true(r) {
            return r;
        }
        ctx.make_release(l, r).expect("simplify: shared context")
    }

    fn visit_tagged_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let c = self.rec(ctx, child);
        ctx.make_tagged_next(c).expect("simplify: shared context")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_with_false_right_is_false() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let bot = ctx.make_false();
        let f = ctx.make_until(a, bot).unwrap();
        let s = Simplify::simplify(&mut ctx, f);
        assert!(ctx.is_false(s));
    }

    #[test]
    fn release_with_true_left_is_globally() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let top = ctx.make_true();
        let f = ctx.make_release(top, a).unwrap();
        let s = Simplify::simplify(&mut ctx, f);
        assert_eq!(s, a);
    }

    #[test]
    fn eventually_of_constant_is_constant() {
        let mut ctx = Context::new();
        let top = ctx.make_true();
        let f = ctx.make_eventually(top).unwrap();
        let s = Simplify::simplify(&mut ctx, f);
        assert!(ctx.is_true(s));
    }
}
