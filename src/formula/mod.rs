//! Hash-consed LTLf abstract syntax tree ("the term store").
//!
//! A [`Context`] is the factory and registry for formula nodes. Every
//! `make_*` constructor normalizes its arguments (flattening, deduplication,
//! trivial absorption, double-negation elimination) *before* looking the
//! result up in the intern table, so structurally equal formulas always
//! collapse onto the same [`Handle`]. Equality and hashing of formulas then
//! reduce to comparing/hashing the handle, not the tree.

pub mod display;
pub mod nnf;
pub mod simplify;
pub mod visitor;
pub mod xnf;

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};

pub use visitor::Visitor;

/// The id of an atomic proposition, dense from 0 over the propositions that
/// actually occur in a formula. [`AtomId::END`] is a reserved id outside
/// that range, standing for the "no further step exists" predicate used by
/// the xnf transformer (§4.C of the specification).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct AtomId(u32);

impl AtomId {
    /// The reserved atom id for the `end` predicate. Never a member of the
    /// environment/controller partition.
    pub const END: Self = Self(u32::MAX);

    /// Returns the dense index of this atom, or `None` for [`AtomId::END`].
    pub fn index(self) -> Option<usize> {
        if self == Self::END {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::END {
            write!(f, "<end>")
        } else {
            write!(f, "a{}", self.0)
        }
    }
}

/// Index of a node within a single [`Context`]'s node table. Meaningless
/// outside of that context; use [`Handle`] for anything crossing an API
/// boundary.
type Idx = u32;

/// Identifies which [`Context`] a [`Handle`] was created in, so that mixing
/// handles across contexts is a checked error rather than undefined
/// behaviour (§4.A "Failures").
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct ContextId(u32);

static NEXT_CONTEXT_ID: AtomicU32 = AtomicU32::new(0);

/// An opaque reference to an interned LTLf formula node.
///
/// A handle is only meaningful when paired with the [`Context`] that
/// created it; passing a handle to a different context's factory methods
/// fails with [`InvalidArgument`](crate::error::CynthiaError::InvalidArgument).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Handle {
    context: ContextId,
    index: Idx,
}

/// The variant tag of a formula node, used both for dispatch and as the
/// leading component of the canonical argument order (§3 invariant 2).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
#[repr(u8)]
pub enum Tag {
    True,
    False,
    Atom,
    PropNot,
    Not,
    And,
    Or,
    Implies,
    Equivalent,
    Xor,
    Next,
    WeakNext,
    Eventually,
    Always,
    Until,
    Release,
    TaggedNext,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
enum NodeKind {
    True,
    False,
    Atom(AtomId),
    PropNot(AtomId),
    Not(Idx),
    And(Vec<Idx>),
    Or(Vec<Idx>),
    Implies(Idx, Idx),
    Equivalent(Idx, Idx),
    Xor(Idx, Idx),
    Next(Idx),
    WeakNext(Idx),
    Eventually(Idx),
    Always(Idx),
    Until(Idx, Idx),
    Release(Idx, Idx),
    TaggedNext(Idx),
}

impl NodeKind {
    fn tag(&self) -> Tag {
        match self {
            Self::True => Tag::True,
            Self::False => Tag::False,
            Self::Atom(_) => Tag::Atom,
            Self::PropNot(_) => Tag::PropNot,
            Self::Not(_) => Tag::Not,
            Self::And(_) => Tag::And,
            Self::Or(_) => Tag::Or,
            Self::Implies(..) => Tag::Implies,
            Self::Equivalent(..) => Tag::Equivalent,
            Self::Xor(..) => Tag::Xor,
            Self::Next(_) => Tag::Next,
            Self::WeakNext(_) => Tag::WeakNext,
            Self::Eventually(_) => Tag::Eventually,
            Self::Always(_) => Tag::Always,
            Self::Until(..) => Tag::Until,
            Self::Release(..) => Tag::Release,
            Self::TaggedNext(_) => Tag::TaggedNext,
        }
    }
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    hash: u64,
}

/// Bidirectional table between atom names and their dense [`AtomId`]s.
#[derive(Debug, Default)]
struct AtomTable {
    names: Vec<String>,
    ids: HashMap<String, AtomId>,
}

impl AtomTable {
    fn intern(&mut self, name: &str) -> AtomId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = AtomId(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    fn name(&self, id: AtomId) -> Option<&str> {
        id.index().and_then(|i| self.names.get(i)).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// The hash-consed term store ("Context" of §4.A).
///
/// Owns every node ever constructed through it. Nodes are immutable once
/// interned; there is no API to mutate a node in place, only to construct a
/// (possibly already-existing) new one.
#[derive(Debug)]
pub struct Context {
    id: ContextId,
    nodes: Vec<NodeData>,
    intern: HashMap<NodeKind, Idx>,
    atoms: AtomTable,
}

impl Context {
    /// Creates a fresh, empty context.
    pub fn new() -> Self {
        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            nodes: Vec::with_capacity(256),
            intern: HashMap::with_capacity(256),
            atoms: AtomTable::default(),
        }
    }

    fn check_owns(&self, h: Handle) -> Result<Idx, String> {
        if h.context == self.id {
            Ok(h.index)
        } else {
            Err("handle belongs to a different context".to_owned())
        }
    }

    fn check_owns_all(&self, hs: &[Handle]) -> Result<Vec<Idx>, String> {
        hs.iter().map(|&h| self.check_owns(h)).collect()
    }

    fn node_hash(kind: &NodeKind) -> u64 {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the existing handle for `kind` if one is interned, otherwise
    /// allocates, caches the hash, and inserts a new node.
    fn intern(&mut self, kind: NodeKind) -> Handle {
        match self.intern.entry(kind) {
            Entry::Occupied(e) => Handle {
                context: self.id,
                index: *e.get(),
            },
            Entry::Vacant(e) => {
                let hash = Self::node_hash(e.key());
                let index = self.nodes.len() as Idx;
                self.nodes.push(NodeData {
                    kind: e.key().clone(),
                    hash,
                });
                e.insert(index);
                Handle {
                    context: self.id,
                    index,
                }
            }
        }
    }

    fn data(&self, idx: Idx) -> &NodeData {
        &self.nodes[idx as usize]
    }

    fn kind_of(&self, h: Handle) -> &NodeKind {
        &self.data(h.index).kind
    }

    /// Returns the variant tag of the formula referenced by `h`.
    ///
    /// # Panics
    ///
    /// Panics if `h` was not created by this context.
    pub fn tag(&self, h: Handle) -> Tag {
        self.kind_of(h).tag()
    }

    /// Order used to canonicalize `And`/`Or` argument lists (§3 invariant
    /// 2): by tag, then by cached structural hash, then by table index as a
    /// final deterministic tie-break (indices are assigned in construction
    /// order, so this is stable and total even across hash collisions).
    fn order_key(&self, idx: Idx) -> (Tag, u64, Idx) {
        let data = self.data(idx);
        (data.kind.tag(), data.hash, idx)
    }

    fn sort_dedup(&self, mut idxs: Vec<Idx>) -> Vec<Idx> {
        idxs.sort_by_key(|&i| self.order_key(i));
        idxs.dedup();
        idxs
    }

    // ---- primitive constructors -------------------------------------

    /// The constant `true`.
    pub fn make_true(&mut self) -> Handle {
        self.intern(NodeKind::True)
    }

    /// The constant `false`.
    pub fn make_false(&mut self) -> Handle {
        self.intern(NodeKind::False)
    }

    /// Interns an atomic proposition by name, assigning it a dense id on
    /// first use.
    pub fn make_atom(&mut self, name: &str) -> Handle {
        let id = self.atoms.intern(name);
        self.intern(NodeKind::Atom(id))
    }

    /// Returns the name of an atom, or `None` if `id` is [`AtomId::END`] or
    /// unknown.
    pub fn atom_name(&self, id: AtomId) -> Option<&str> {
        self.atoms.name(id)
    }

    /// Returns the number of distinct named atoms interned so far.
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Iterates over every named atom interned so far as `(name, id)`, in
    /// allocation order. Excludes the reserved [`AtomId::END`], which has
    /// no name and is never produced by [`Context::make_atom`].
    pub fn atoms_by_name(&self) -> impl Iterator<Item = (&str, AtomId)> {
        self.atoms
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), AtomId(i as u32)))
    }

    /// The reserved `end` atom (not a member of any partition), used by the
    /// xnf transformer.
    pub fn make_end(&mut self) -> Handle {
        self.intern(NodeKind::Atom(AtomId::END))
    }

    /// Negation of an atom: `PropNot(a)`. Fails with a description if `h`
    /// does not reference an atom (§3 invariant 6).
    pub fn make_prop_not(&mut self, h: Handle) -> Result<Handle, String> {
        let idx = self.check_owns(h)?;
        match self.data(idx).kind.clone() {
            NodeKind::Atom(id) => Ok(self.intern(NodeKind::PropNot(id))),
            _ => Err("PropNot argument must be an atom".to_owned()),
        }
    }

    /// General negation. Pushes through `PropNot`/double-negation per §3
    /// invariant 5: `Not(Not(φ)) = φ`, `Not(Atom(a)) = PropNot(a)`.
    pub fn make_not(&mut self, h: Handle) -> Result<Handle, String> {
        let idx = self.check_owns(h)?;
        match self.data(idx).kind.clone() {
            NodeKind::True => Ok(self.make_false()),
            NodeKind::False => Ok(self.make_true()),
            NodeKind::Atom(id) => Ok(self.intern(NodeKind::PropNot(id))),
            NodeKind::PropNot(id) => Ok(self.intern(NodeKind::Atom(id))),
            NodeKind::Not(child) => Ok(Handle {
                context: self.id,
                index: child,
            }),
            _ => Ok(self.intern(NodeKind::Not(idx))),
        }
    }

    fn flatten_and(&self, idxs: &[Idx]) -> Vec<Idx> {
        let mut out = Vec::with_capacity(idxs.len());
        for &i in idxs {
            match &self.data(i).kind {
                NodeKind::And(children) => out.extend_from_slice(children),
                _ => out.push(i),
            }
        }
        out
    }

    fn flatten_or(&self, idxs: &[Idx]) -> Vec<Idx> {
        let mut out = Vec::with_capacity(idxs.len());
        for &i in idxs {
            match &self.data(i).kind {
                NodeKind::Or(children) => out.extend_from_slice(children),
                _ => out.push(i),
            }
        }
        out
    }

    fn is_true_idx(&self, i: Idx) -> bool {
        matches!(self.data(i).kind, NodeKind::True)
    }

    fn is_false_idx(&self, i: Idx) -> bool {
        matches!(self.data(i).kind, NodeKind::False)
    }

    /// Whether `h` is the constant `True` node. Panics on a handle from a
    /// foreign context, matching [`Context::tag`].
    pub fn is_true(&self, h: Handle) -> bool {
        self.is_true_idx(self.check_owns(h).expect("foreign context handle"))
    }

    /// Whether `h` is the constant `False` node.
    pub fn is_false(&self, h: Handle) -> bool {
        self.is_false_idx(self.check_owns(h).expect("foreign context handle"))
    }

    /// Conjunction of zero or more formulas, with flattening, dedup,
    /// sorting, and trivial absorption applied (§3 invariants 2-4).
    pub fn make_and(&mut self, args: &[Handle]) -> Result<Handle, String> {
        let idxs = self.check_owns_all(args)?;
        let flat = self.flatten_and(&idxs);
        if flat.iter().any(|&i| self.is_false_idx(i)) {
            return Ok(self.make_false());
        }
        let mut kept: Vec<Idx> = flat.into_iter().filter(|&i| !self.is_true_idx(i)).collect();
        kept = self.sort_dedup(kept);
        match kept.len() {
            0 => Ok(self.make_true()),
            1 => Ok(Handle {
                context: self.id,
                index: kept[0],
            }),
            _ => Ok(self.intern(NodeKind::And(kept))),
        }
    }

    /// Disjunction of zero or more formulas, with flattening, dedup,
    /// sorting, and trivial absorption applied (§3 invariants 2-4).
    pub fn make_or(&mut self, args: &[Handle]) -> Result<Handle, String> {
        let idxs = self.check_owns_all(args)?;
        let flat = self.flatten_or(&idxs);
        if flat.iter().any(|&i| self.is_true_idx(i)) {
            return Ok(self.make_true());
        }
        let mut kept: Vec<Idx> = flat.into_iter().filter(|&i| !self.is_false_idx(i)).collect();
        kept = self.sort_dedup(kept);
        match kept.len() {
            0 => Ok(self.make_false()),
            1 => Ok(Handle {
                context: self.id,
                index: kept[0],
            }),
            _ => Ok(self.intern(NodeKind::Or(kept))),
        }
    }

    fn make_binary(
        &mut self,
        lhs: Handle,
        rhs: Handle,
        wrap: fn(Idx, Idx) -> NodeKind,
    ) -> Result<Handle, String> {
        let l = self.check_owns(lhs)?;
        let r = self.check_owns(rhs)?;
        Ok(self.intern(wrap(l, r)))
    }

    /// `lhs -> rhs`.
    pub fn make_implies(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_binary(lhs, rhs, NodeKind::Implies)
    }

    /// `lhs <-> rhs`.
    pub fn make_equivalent(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_binary(lhs, rhs, NodeKind::Equivalent)
    }

    /// `lhs xor rhs`.
    pub fn make_xor(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_binary(lhs, rhs, NodeKind::Xor)
    }

    fn make_unary(&mut self, h: Handle, wrap: fn(Idx) -> NodeKind) -> Result<Handle, String> {
        let idx = self.check_owns(h)?;
        Ok(self.intern(wrap(idx)))
    }

    /// `X φ` (strong next).
    pub fn make_next(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_unary(h, NodeKind::Next)
    }

    /// `X[!] φ` / weak next.
    pub fn make_weak_next(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_unary(h, NodeKind::WeakNext)
    }

    /// `F φ`.
    pub fn make_eventually(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_unary(h, NodeKind::Eventually)
    }

    /// `G φ`.
    pub fn make_always(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_unary(h, NodeKind::Always)
    }

    /// `lhs U rhs`.
    pub fn make_until(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_binary(lhs, rhs, NodeKind::Until)
    }

    /// `lhs R rhs`.
    pub fn make_release(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_binary(lhs, rhs, NodeKind::Release)
    }

    /// Internal-only marker used by the xnf transformer (§4.C). Not reachable
    /// from the surface grammar.
    pub(crate) fn make_tagged_next(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_unary(h, NodeKind::TaggedNext)
    }

    // ---- derived combinators (sugar over the primitives) --------------

    /// Alias for [`Context::make_implies`].
    pub fn implies(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_implies(lhs, rhs)
    }

    /// Alias for [`Context::make_equivalent`].
    pub fn iff(&mut self, lhs: Handle, rhs: Handle) -> Result<Handle, String> {
        self.make_equivalent(lhs, rhs)
    }

    /// Alias for [`Context::make_always`].
    pub fn globally(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_always(h)
    }

    /// Alias for [`Context::make_eventually`].
    pub fn finally(&mut self, h: Handle) -> Result<Handle, String> {
        self.make_eventually(h)
    }

    /// Conjunction over an iterator of formulas.
    pub fn and_all<I: IntoIterator<Item = Handle>>(&mut self, it: I) -> Result<Handle, String> {
        let args: Vec<Handle> = it.into_iter().collect();
        self.make_and(&args)
    }

    /// Disjunction over an iterator of formulas.
    pub fn or_all<I: IntoIterator<Item = Handle>>(&mut self, it: I) -> Result<Handle, String> {
        let args: Vec<Handle> = it.into_iter().collect();
        self.make_or(&args)
    }

    // ---- accessors used by visitors/search -----------------------------

    /// Returns the children of an `And`/`Or` node as handles, or an empty
    /// slice for any other tag.
    pub fn and_or_children(&self, h: Handle) -> Vec<Handle> {
        let wrap = |idxs: &[Idx]| {
            idxs.iter()
                .map(|&i| Handle {
                    context: self.id,
                    index: i,
                })
                .collect()
        };
        match self.kind_of(h) {
            NodeKind::And(c) | NodeKind::Or(c) => wrap(c),
            _ => Vec::new(),
        }
    }

    fn child(&self, i: Idx) -> Handle {
        Handle {
            context: self.id,
            index: i,
        }
    }

    /// Decomposes a node into a [`visitor::NodeView`] for double dispatch.
    pub fn view(&self, h: Handle) -> visitor::NodeView {
        use visitor::NodeView as V;
        match self.kind_of(h) {
            NodeKind::True => V::True,
            NodeKind::False => V::False,
            NodeKind::Atom(id) => V::Atom(*id),
            NodeKind::PropNot(id) => V::PropNot(*id),
            NodeKind::Not(c) => V::Not(self.child(*c)),
            NodeKind::And(cs) => V::And(cs.iter().map(|&i| self.child(i)).collect()),
            NodeKind::Or(cs) => V::Or(cs.iter().map(|&i| self.child(i)).collect()),
            NodeKind::Implies(l, r) => V::Implies(self.child(*l), self.child(*r)),
            NodeKind::Equivalent(l, r) => V::Equivalent(self.child(*l), self.child(*r)),
            NodeKind::Xor(l, r) => V::Xor(self.child(*l), self.child(*r)),
            NodeKind::Next(c) => V::Next(self.child(*c)),
            NodeKind::WeakNext(c) => V::WeakNext(self.child(*c)),
            NodeKind::Eventually(c) => V::Eventually(self.child(*c)),
            NodeKind::Always(c) => V::Always(self.child(*c)),
            NodeKind::Until(l, r) => V::Until(self.child(*l), self.child(*r)),
            NodeKind::Release(l, r) => V::Release(self.child(*l), self.child(*r)),
            NodeKind::TaggedNext(c) => V::TaggedNext(self.child(*c)),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_cons_identical_handles() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        let b = ctx.make_atom("y");
        let and1 = ctx.make_and(&[a, b]).unwrap();
        let and2 = ctx.make_and(&[b, a]).unwrap();
        assert_eq!(and1, and2, "canonical ordering must make And(a,b) == And(b,a)");
    }

    #[test]
    fn singleton_and_or_collapse() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        assert_eq!(ctx.make_and(&[a]).unwrap(), a);
        assert_eq!(ctx.make_or(&[a, a]).unwrap(), a);
    }

    #[test]
    fn double_negation_eliminated() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        let not_a = ctx.make_not(a).unwrap();
        let not_not_a = ctx.make_not(not_a).unwrap();
        assert_eq!(a, not_not_a);
    }

    #[test]
    fn not_atom_is_prop_not() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        let not_a = ctx.make_not(a).unwrap();
        assert_eq!(ctx.tag(not_a), Tag::PropNot);
    }

    #[test]
    fn trivial_absorption() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        let t = ctx.make_true();
        let f = ctx.make_false();
        assert_eq!(ctx.make_and(&[a, f]).unwrap(), f);
        assert_eq!(ctx.make_or(&[a, t]).unwrap(), t);
        assert_eq!(ctx.make_and(&[a, t]).unwrap(), a);
        assert_eq!(ctx.make_or(&[a, f]).unwrap(), a);
    }

    #[test]
    fn flattening() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let c = ctx.make_atom("c");
        let ab = ctx.make_and(&[a, b]).unwrap();
        let abc = ctx.make_and(&[ab, c]).unwrap();
        let direct = ctx.make_and(&[a, b, c]).unwrap();
        assert_eq!(abc, direct);
    }

    #[test]
    fn prop_not_requires_atom() {
        let mut ctx = Context::new();
        let a = ctx.make_atom("x");
        let not_a = ctx.make_not(a).unwrap();
        assert!(ctx.make_prop_not(not_a).is_err());
    }

    #[test]
    fn foreign_context_handle_rejected() {
        let mut ctx1 = Context::new();
        let ctx2_handle = {
            let mut ctx2 = Context::new();
            ctx2.make_atom("x")
        };
        assert!(ctx1.make_not(ctx2_handle).is_err());
    }
}
