//! Re-printing a handle as LTLf surface syntax.
//!
//! Mirrors the grammar accepted by [`crate::syntax`]: infix `&`/`|`/`!`/
//! `->`/`<->`/`^`, prefix temporal `X`/`W`/`F`/`G`, infix `U`/`R`, and
//! parenthesization driven by operator precedence rather than a blanket
//! wrap-everything style. Used for diagnostics (naming an offending
//! subformula) and for the reprint/reparse round-trip property.

use std::fmt;

use super::visitor::NodeView;
use super::{Context, Handle};

/// Binding power used to decide whether a child needs parentheses around
/// its printed form. Higher binds tighter.
#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
struct Power(u8);

const POW_IFF: Power = Power(1);
const POW_IMPLIES: Power = Power(2);
const POW_XOR: Power = Power(3);
const POW_OR: Power = Power(4);
const POW_AND: Power = Power(5);
const POW_UNTIL: Power = Power(6);
const POW_UNARY: Power = Power(7);

/// A `Display`-able view of `handle` within `ctx`. Construct with
/// [`Context::display`] (or [`Handle::display`]) rather than directly.
pub struct Show<'a> {
    ctx: &'a Context,
    handle: Handle,
}

impl Context {
    /// Returns a `Display`-able wrapper reprinting `h` as LTLf surface
    /// syntax (§6 "Reference grammar").
    pub fn display(&self, h: Handle) -> Show<'_> {
        Show { ctx: self, handle: h }
    }
}

impl Handle {
    /// Alias for [`Context::display`], for a more natural call order at use
    /// sites (`h.display(ctx)`).
    pub fn display(self, ctx: &Context) -> Show<'_> {
        ctx.display(self)
    }
}

impl fmt::Display for Show<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write(f, self.ctx, self.handle, Power(0))
    }
}

fn paren(f: &mut fmt::Formatter<'_>, ctx: &Context, h: Handle, parent: Power, own: Power) -> fmt::Result {
    if own < parent {
        write!(f, "(")?;
        write(f, ctx, h, Power(0))?;
        write!(f, ")")
    } else {
        write(f, ctx, h, own)
    }
}

fn write(f: &mut fmt::Formatter<'_>, ctx: &Context, h: Handle, parent: Power) -> fmt::Result {
    match ctx.view(h) {
        NodeView::True => write!(f, "true"),
        NodeView::False => write!(f, "false"),
        NodeView::Atom(id) => {
            if id == super::AtomId::END {
                write!(f, "<end>")
            } else {
                write!(f, "{}", ctx.atom_name(id).unwrap_or("?"))
            }
        }
        NodeView::PropNot(id) => {
            write!(f, "!")?;
            if id == super::AtomId::END {
                write!(f, "<end>")
            } else {
                write!(f, "{}", ctx.atom_name(id).unwrap_or("?"))
            }
        }
        NodeView::Not(c) => {
            write!(f, "!")?;
            paren(f, ctx, c, POW_UNARY, POW_UNARY)
        }
        NodeView::And(children) => infix(f, ctx, &children, "&", POW_AND, parent),
        NodeView::Or(children) => infix(f, ctx, &children, "|", POW_OR, parent),
        NodeView::Implies(l, r) => binary(f, ctx, l, r, "->", POW_IMPLIES, parent),
        NodeView::Equivalent(l, r) => binary(f, ctx, l, r, "<->", POW_IFF, parent),
        NodeView::Xor(l, r) => binary(f, ctx, l, r, "^", POW_XOR, parent),
        NodeView::Next(c) => prefix(f, ctx, c, "X"),
        NodeView::WeakNext(c) => prefix(f, ctx, c, "W"),
        NodeView::Eventually(c) => prefix(f, ctx, c, "F"),
        NodeView::Always(c) => prefix(f, ctx, c, "G"),
        NodeView::Until(l, r) => binary(f, ctx, l, r, "U", POW_UNTIL, parent),
        NodeView::Release(l, r) => binary(f, ctx, l, r, "R", POW_UNTIL, parent),
        NodeView::TaggedNext(c) => {
            write!(f, "@(")?;
            write(f, ctx, c, Power(0))?;
            write!(f, ")")
        }
    }
}

fn prefix(f: &mut fmt::Formatter<'_>, ctx: &Context, child: Handle, op: &str) -> fmt::Result {
    write!(f, "{} ", op)?;
    paren(f, ctx, child, POW_UNARY, POW_UNARY)
}

fn binary(
    f: &mut fmt::Formatter<'_>,
    ctx: &Context,
    l: Handle,
    r: Handle,
    op: &str,
    power: Power,
    parent: Power,
) -> fmt::Result {
    let need_parens = power < parent;
    if need_parens {
        write!(f, "(")?;
    }
    paren(f, ctx, l, power, power)?;
    write!(f, " {} ", op)?;
    paren(f, ctx, r, power, power)?;
    if need_parens {
        write!(f, ")")?;
    }
    Ok(())
}

fn infix(f: &mut fmt::Formatter<'_>, ctx: &Context, children: &[Handle], op: &str, power: Power, parent: Power) -> fmt::Result {
    let need_parens = power < parent;
    if need_parens {
        write!(f, "(")?;
    }
    for (i, &c) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        paren(f, ctx, c, power, power)?;
    }
    if need_parens {
        write!(f, ")")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_and_connectives_print() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let f = ctx.make_and(&[a, b]).unwrap();
        assert_eq!(ctx.display(f).to_string(), "a & b");
    }

    #[test]
    fn negated_atom_prints_with_bang() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let not_a = ctx.make_not(a).unwrap();
        assert_eq!(ctx.display(not_a).to_string(), "!a");
    }

    #[test]
    fn temporal_operators_print_with_space() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let g = ctx.make_always(a).unwrap();
        assert_eq!(ctx.display(g).to_string(), "G a");
    }

    #[test]
    fn nested_or_inside_and_is_parenthesized() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let c = ctx.make_atom("c");
        let or_ab = ctx.make_or(&[a, b]).unwrap();
        let f = ctx.make_and(&[or_ab, c]).unwrap();
        assert_eq!(ctx.display(f).to_string(), "(a | b) & c");
    }
}
