//! Negation normal form.
//!
//! Pushes negation down to the atoms, eliminating `Implies`, `Equivalent`
//! and `Xor` along the way and dualizing `Always`/`Eventually`,
//! `Until`/`Release` and `Next`/`WeakNext` wherever they fall under a
//! negation.

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

/// Rewrites a formula into negation normal form.
///
/// Implemented as a [`Visitor`] carrying a `negate` flag: visiting a node
/// with the flag set produces the NNF of *its negation*, which is how
/// `Not` is eliminated without ever constructing an intermediate `Not`
/// node for a non-atom. Results are memoized per `(handle, negate)` pair,
/// since the same subformula can be reached both negated and unnegated
/// within one call.
pub struct ToNnf {
    negate: bool,
    cache: HashMap<(Handle, bool), Handle>,
}

impl ToNnf {
    fn new() -> Self {
        Self {
            negate: false,
            cache: HashMap::new(),
        }
    }

    /// Computes the negation normal form of `h`.
    pub fn to_nnf(ctx: &mut Context, h: Handle) -> Handle {
        let mut visitor = Self::new();
        visitor.dispatch(ctx, h, false)
    }

    fn dispatch(&mut self, ctx: &mut Context, h: Handle, neg: bool) -> Handle {
        let key = (h, neg);
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        let saved = self.negate;
        self.negate = neg;
        let result = <Self as Visitor<Handle>>::visit(self, ctx, h);
        self.negate = saved;
        self.cache.insert(key, result);
        result
    }
}

impl Visitor<Handle> for ToNnf {
    fn visit_true(&mut self, ctx: &mut Context) -> Handle {
        if self.negate {
            ctx.make_false()
        } else {
            ctx.make_true()
        }
    }

    fn visit_false(&mut self, ctx: &mut Context) -> Handle {
        if self.negate {
            ctx.make_true()
        } else {
            ctx.make_false()
        }
    }

    fn visit_atom(&mut self, ctx: &mut Context, id: AtomId) -> Handle {
        let a = reintern_atom(ctx, id);
        if self.negate {
            ctx.make_prop_not(a).expect("atom must accept PropNot")
        } else {
            a
        }
    }

    fn visit_prop_not(&mut self, ctx: &mut Context, id: AtomId) -> Handle {
        let a = reintern_atom(ctx, id);
        if self.negate {
            a
        } else {
            ctx.make_prop_not(a).expect("atom must accept PropNot")
        }
    }

    fn visit_not(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        self.dispatch(ctx, child, !self.negate)
    }

    fn visit_and(&mut self, ctx: &mut Context, children: &[Handle]) -> Handle {
        let neg = self.negate;
        let rewritten: Vec<Handle> = children.iter().map(|&c| self.dispatch(ctx, c, neg)).collect();
        if neg {
            ctx.make_or(&rewritten)
        } else {
            ctx.make_and(&rewritten)
        }
        .expect("nnf: children share this context")
    }

    fn visit_or(&mut self, ctx: &mut Context, children: &[Handle]) -> Handle {
        let neg = self.negate;
        let rewritten: Vec<Handle> = children.iter().map(|&c| self.dispatch(ctx, c, neg)).collect();
        if neg {
            ctx.make_and(&rewritten)
        } else {
            ctx.make_or(&rewritten)
        }
        .expect("nnf: children share this context")
    }

    fn visit_implies(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        // lhs -> rhs == !lhs | rhs
        let neg = self.negate;
        let l = self.dispatch(ctx, lhs, !neg);
        let r = self.dispatch(ctx, rhs, neg);
        if neg {
            ctx.make_and(&[l, r])
        } else {
            ctx.make_or(&[l, r])
        }
        .expect("nnf: children share this context")
    }

    fn visit_equivalent(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        // lhs <-> rhs == (lhs & rhs) | (!lhs & !rhs); its negation is the xor expansion.
        let neg = self.negate;
        let l_pos = self.dispatch(ctx, lhs, false);
        let l_neg = self.dispatch(ctx, lhs, true);
        let r_pos = self.dispatch(ctx, rhs, false);
        let r_neg = self.dispatch(ctx, rhs, true);
        let (a, b) = if neg {
            (
                ctx.make_and(&[l_pos, r_neg]).expect("nnf: shared context"),
                ctx.make_and(&[l_neg, r_pos]).expect("nnf: shared context"),
            )
        } else {
            (
                ctx.make_and(&[l_pos, r_pos]).expect("nnf: shared context"),
                ctx.make_and(&[l_neg, r_neg]).expect("nnf: shared context"),
            )
        };
        ctx.make_or(&[a, b]).expect("nnf: shared context")
    }

    fn visit_xor(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        // lhs xor rhs == (lhs & !rhs) | (!lhs & rhs); negating it is the equivalence expansion.
        let neg = self.negate;
        let l_pos = self.dispatch(ctx, lhs, false);
        let l_neg = self.dispatch(ctx, lhs, true);
        let r_pos = self.dispatch(ctx, rhs, false);
        let r_neg = self.dispatch(ctx, rhs, true);
        let (a, b) = if neg {
            (
                ctx.make_and(&[l_pos, r_pos]).expect("nnf: shared context"),
                ctx.make_and(&[l_neg, r_neg]).expect("nnf: shared context"),
            )
        } else {
            (
                ctx.make_and(&[l_pos, r_neg]).expect("nnf: shared context"),
                ctx.make_and(&[l_neg, r_pos]).expect("nnf: shared context"),
            )
        };
        ctx.make_or(&[a, b]).expect("nnf: shared context")
    }

    fn visit_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let neg = self.negate;
        let c = self.dispatch(ctx, child, neg);
        if neg {
            ctx.make_weak_next(c)
        } else {
            ctx.make_next(c)
        }
        .expect("nnf: shared context")
    }

    fn visit_weak_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let neg = self.negate;
        let c = self.dispatch(ctx, child, neg);
        if neg {
            ctx.make_next(c)
        } else {
            ctx.make_weak_next(c)
        }
        .expect("nnf: shared context")
    }

    fn visit_eventually(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let neg = self.negate;
        let c = self.dispatch(ctx, child, neg);
        if neg {
            ctx.make_always(c)
        } else {
            ctx.make_eventually(c)
        }
        .expect("nnf: shared context")
    }

    fn visit_always(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        let neg = self.negate;
        let c = self.dispatch(ctx, child, neg);
        if neg {
            ctx.make_eventually(c)
        } else {
            ctx.make_always(c)
        }
        .expect("nnf: shared context")
    }

    fn visit_until(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let neg = self.negate;
        let l = self.dispatch(ctx, lhs, neg);
        let r = self.dispatch(ctx, rhs, neg);
        if neg {
            ctx.make_release(l, r)
        } else {
            ctx.make_until(l, r)
        }
        .expect("nnf: shared context")
    }

    fn visit_release(&mut self, ctx: &mut Context, lhs: Handle, rhs: Handle) -> Handle {
        let neg = self.negate;
        let l = self.dispatch(ctx, lhs, neg);
        let r = self.dispatch(ctx, rhs, neg);
        if neg {
            ctx.make_until(l, r)
        } else {
            ctx.make_release(l, r)
        }
        .expect("nnf: shared context")
    }

    fn visit_tagged_next(&mut self, ctx: &mut Context, child: Handle) -> Handle {
        // TaggedNext is only produced by xnf, after NNF has already run; treat
        // it like Next if NNF ever sees one (e.g. re-normalizing an xnf result).
        self.visit_next(ctx, child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Tag;

    #[test]
    fn nnf_is_idempotent() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let ab = ctx.make_implies(a, b).unwrap();
        let f = ctx.make_always(ab).unwrap();
        let n1 = ToNnf::to_nnf(&mut ctx, f);
        let n2 = ToNnf::to_nnf(&mut ctx, n1);
        assert_eq!(n1, n2);
    }

    #[test]
    fn implies_eliminated() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let f = ctx.make_implies(a, b).unwrap();
        let n = ToNnf::to_nnf(&mut ctx, f);
        assert_eq!(ctx.tag(n), Tag::Or);
    }

    #[test]
    fn until_release_dualize_under_negation() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let until = ctx.make_until(a, b).unwrap();
        let not_until = ctx.make_not(until).unwrap();
        let n = ToNnf::to_nnf(&mut ctx, not_until);
        assert_eq!(ctx.tag(n), Tag::Release);
    }
}
