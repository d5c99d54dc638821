//! Next-normal form (§4.C): rewrites an NNF formula into a Boolean
//! combination of atoms and [`TaggedNext`](super::Tag::TaggedNext) leaves.
//!
//! Unlike [`super::nnf::ToNnf`] and [`super::simplify::Simplify`], this
//! rewriter is not expressed through the generic [`Visitor`] trait: the
//! `Eventually`/`Always`/`Until`/`Release` rules need the *original*
//! handle (to tag it, per the "cyclic temporal unfolding without cyclic
//! objects" design note), not just its decomposed children, so it walks
//! [`Context::view`] directly.

use std::collections::HashMap;

use super::{Context, Handle, Tag};
use crate::error::{CynthiaError, Result};

/// Computes `xnf(h)`, memoizing per-handle within this call.
///
/// # Errors
///
/// Returns [`CynthiaError::InvalidArgument`] if `h` is not in negation
/// normal form, i.e. it (or a subformula) is a `Not`, `Implies`,
/// `Equivalent` or `Xor` node. Run [`super::nnf::ToNnf::to_nnf`] first.
pub fn xnf(ctx: &mut Context, h: Handle) -> Result<Handle> {
    Xnf::default().rec(ctx, h)
}

#[derive(Default)]
struct Xnf {
    cache: HashMap<Handle, Handle>,
}

impl Xnf {
    fn rec(&mut self, ctx: &mut Context, h: Handle) -> Result<Handle> {
        if let Some(&cached) = self.cache.get(&h) {
            return Ok(cached);
        }
        let result = self.rewrite(ctx, h)?;
        self.cache.insert(h, result);
        Ok(result)
    }

    /// Tags `h` itself as the residual obligation: `TaggedNext(h)`.
    fn tag(&self, ctx: &mut Context, h: Handle) -> Result<Handle> {
        ctx.make_tagged_next(h).map_err(CynthiaError::InvalidArgument)
    }

    fn rewrite(&mut self, ctx: &mut Context, h: Handle) -> Result<Handle> {
        use super::visitor::NodeView as V;
        match ctx.view(h) {
            V::True | V::False | V::Atom(_) | V::PropNot(_) => Ok(h),

            V::Not(_) | V::Implies(..) | V::Equivalent(..) | V::Xor(..) => {
                Err(CynthiaError::InvalidArgument(format!(
                    "xnf requires negation normal form, found a {:?} node",
                    ctx.tag(h)
                )))
            }

            V::And(children) => {
                let rewritten = self.rec_all(ctx, &children)?;
                ctx.make_and(&rewritten).map_err(CynthiaError::InvalidArgument)
            }
            V::Or(children) => {
                let rewritten = self.rec_all(ctx, &children)?;
                ctx.make_or(&rewritten).map_err(CynthiaError::InvalidArgument)
            }

            // X phi -> @(phi)
            V::Next(child) => self.tag(ctx, child),

            // W phi -> end | @(phi)
            V::WeakNext(child) => {
                let end = ctx.make_end();
                let tagged = self.tag(ctx, child)?;
                ctx.make_or(&[end, tagged]).map_err(CynthiaError::InvalidArgument)
            }

            // F phi -> xnf(phi) | @(F phi)
            V::Eventually(child) => {
                let x = self.rec(ctx, child)?;
                let tagged = self.tag(ctx, h)?;
                ctx.make_or(&[x, tagged]).map_err(CynthiaError::InvalidArgument)
            }

            // G phi -> xnf(phi) & (end | @(G phi))
            V::Always(child) => {
                let x = self.rec(ctx, child)?;
                let end = ctx.make_end();
                let tagged = self.tag(ctx, h)?;
                let tail = ctx.make_or(&[end, tagged]).map_err(CynthiaError::InvalidArgument)?;
                ctx.make_and(&[x, tail]).map_err(CynthiaError::InvalidArgument)
            }

            // phi U psi -> xnf(psi) | (xnf(phi) & @(phi U psi))
            V::Until(lhs, rhs) => {
                let xl = self.rec(ctx, lhs)?;
                let xr = self.rec(ctx, rhs)?;
                let tagged = self.tag(ctx, h)?;
                let pending = ctx.make_and(&[xl, tagged]).map_err(CynthiaError::InvalidArgument)?;
                ctx.make_or(&[xr, pending]).map_err(CynthiaError::InvalidArgument)
            }

            // phi R psi -> xnf(psi) & (xnf(phi) | end | @(phi R psi))
            V::Release(lhs, rhs) => {
                let xl = self.rec(ctx, lhs)?;
                let xr = self.rec(ctx, rhs)?;
                let end = ctx.make_end();
                let tagged = self.tag(ctx, h)?;
                let tail = ctx
                    .make_or(&[xl, end, tagged])
                    .map_err(CynthiaError::InvalidArgument)?;
                ctx.make_and(&[xr, tail]).map_err(CynthiaError::InvalidArgument)
            }

            // Re-normalizing an already-xnf'd formula: leave tags in place.
            V::TaggedNext(_) => Ok(h),
        }
    }

    fn rec_all(&mut self, ctx: &mut Context, children: &[Handle]) -> Result<Vec<Handle>> {
        children.iter().map(|&c| self.rec(ctx, c)).collect()
    }
}

/// Returns `true` if `h` is already in xnf: every node reachable from it
/// is drawn from {And, Or, PropNot, Atom, True, False, TaggedNext} (§8
/// invariant 4, "XNF totality"). `TaggedNext` subtrees are not descended
/// into, since xnf does not recurse under a tag.
pub fn is_xnf(ctx: &Context, h: Handle) -> bool {
    match ctx.tag(h) {
        Tag::True | Tag::False | Tag::Atom | Tag::PropNot | Tag::TaggedNext => true,
        Tag::And | Tag::Or => ctx.and_or_children(h).iter().all(|&c| is_xnf(ctx, c)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::nnf::ToNnf;

    #[test]
    fn next_becomes_tagged_next() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let f = ctx.make_next(a).unwrap();
        let x = xnf(&mut ctx, f).unwrap();
        assert_eq!(ctx.tag(x), Tag::TaggedNext);
    }

    #[test]
    fn xnf_is_total_over_nnf() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let until = ctx.make_until(a, b).unwrap();
        let always = ctx.make_always(until).unwrap();
        let nnf = ToNnf::to_nnf(&mut ctx, always);
        let x = xnf(&mut ctx, nnf).unwrap();
        assert!(is_xnf(&ctx, x));
    }

    #[test]
    fn non_nnf_input_is_rejected() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let implies = ctx.make_implies(a, b).unwrap();
        assert!(xnf(&mut ctx, implies).is_err());
    }

    #[test]
    fn eventually_tags_itself_not_its_child() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let f = ctx.make_eventually(a).unwrap();
        let x = xnf(&mut ctx, f).unwrap();
        // xnf(F a) = a | @(F a); the tagged leaf must be the Eventually
        // node itself (cyclic unfolding), not the atom.
        let children = ctx.and_or_children(x);
        assert_eq!(children.len(), 2);
        let tagged = children.iter().find(|&&c| ctx.tag(c) == Tag::TaggedNext).unwrap();
        let inner = match ctx.view(*tagged) {
            crate::formula::visitor::NodeView::TaggedNext(c) => c,
            _ => unreachable!(),
        };
        assert_eq!(ctx.tag(inner), Tag::Eventually);
    }
}
