//! Symbolic compilation of xnf expressions to Sentential Decision Diagrams
//! (§4.D), via the `rsdd` crate.
//!
//! Mirrors the shape of `lib/cudd`'s CUDD wrapper: a manager kept behind a
//! `RefCell` so that it can be mutated through a shared reference, a plain
//! value type for diagram nodes (`rsdd::repr::sdd::SddPtr`, already `Copy`,
//! so there is no need for a ref-counted wrapper type of our own the way
//! `Bdd` wraps a raw CUDD node), and a crate-local error enum for failures
//! the manager might report. Unlike CUDD, rsdd is safe Rust reached directly
//! rather than through FFI, so there is no C toolchain dependency and no
//! out-of-band error code to translate; [`SddError`] exists for the one
//! condition that remains user-triggerable (a variable never allocated
//! through this bridge) and as the landing spot the specification reserves
//! for "SDD library errors are fatal".

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

use rsdd::builder::sdd_builder::SddManager;
use rsdd::repr::sdd::SddPtr;
use rsdd::repr::var_label::VarLabel;
use rsdd::repr::vtree::VTree;

use crate::formula::visitor::NodeView;
use crate::formula::{AtomId, Context, Handle};

/// An error reported by the SDD bridge.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SddError {
    /// A variable label was used that this bridge never allocated.
    UnknownVariable,
    /// The underlying manager reported a failure (out of memory, a broken
    /// invariant). Always fatal to the enclosing search (§4.E "Failure").
    Internal(String),
}

impl fmt::Display for SddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable => write!(f, "SDD error: reference to an unallocated variable"),
            Self::Internal(msg) => write!(f, "SDD error: {msg}"),
        }
    }
}

impl Error for SddError {}

/// What an SDD variable stands for: either a named atom (shared between its
/// positive and negative literal) or a distinct `TaggedNext` subformula.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
enum VarKey {
    Atom(AtomId),
    Next(Handle),
}

/// One satisfying controller move discovered by [`SddBridge::models`]: a
/// total assignment to the requested Y-variables together with the unique
/// minimal set of `TaggedNext` handles it forces true.
pub struct Model {
    /// Values of the `yvars` passed to `models`, in the same order.
    pub y_values: Vec<bool>,
    /// The `TaggedNext` subformulas forced true by this assignment.
    pub forced: Vec<Handle>,
}

/// Thin wrapper around an `rsdd` SDD manager, providing the operations the
/// forward search (§4.E) needs: compiling an xnf expression, restricting it
/// by a partial assignment, and reading off satisfiability and entailment.
pub struct SddBridge {
    manager: RefCell<SddManager>,
    vars: HashMap<VarKey, VarLabel>,
    keys: HashMap<VarLabel, VarKey>,
    next_label: u64,
    compile_cache: HashMap<Handle, (SddPtr, HashSet<VarLabel>)>,
}

impl SddBridge {
    /// Creates a bridge with no variables allocated yet. Variables are
    /// added lazily as [`compile`](Self::compile) encounters new atoms or
    /// `TaggedNext` leaves; rsdd variable order is otherwise fixed for the
    /// lifetime of this bridge (§4.D "Guarantees").
    pub fn new() -> Self {
        // A single right-linear vtree over the (initially empty) variable
        // set; rsdd grows the manager's variable space as new labels are
        // requested via `var`.
        let vtree = VTree::right_linear(&[]);
        Self {
            manager: RefCell::new(SddManager::new(vtree)),
            vars: HashMap::new(),
            keys: HashMap::new(),
            next_label: 0,
            compile_cache: HashMap::new(),
        }
    }

    fn alloc(&mut self, key: VarKey) -> VarLabel {
        if let Some(&label) = self.vars.get(&key) {
            return label;
        }
        let label = VarLabel::new(self.next_label);
        self.next_label += 1;
        self.vars.insert(key, label);
        self.keys.insert(label, key);
        label
    }

    /// Idempotent allocation of the SDD variable standing for an atom.
    pub fn var_for_atom(&mut self, id: AtomId) -> VarLabel {
        self.alloc(VarKey::Atom(id))
    }

    /// Idempotent allocation of the SDD variable standing for a distinct
    /// `TaggedNext` subformula, keyed by its (hash-consed) handle so the
    /// same residual obligation always maps to the same variable.
    pub fn var_for_next(&mut self, h: Handle) -> VarLabel {
        self.alloc(VarKey::Next(h))
    }

    /// Recovers the `TaggedNext` handle a variable stands for, or `None` if
    /// it stands for a plain atom (or is unknown).
    fn next_handle_for_var(&self, v: VarLabel) -> Option<Handle> {
        match self.keys.get(&v) {
            Some(VarKey::Next(h)) => Some(*h),
            _ => None,
        }
    }

    fn literal(&mut self, label: VarLabel, positive: bool) -> SddPtr {
        self.manager.get_mut().var(label, positive)
    }

    /// Compiles an xnf expression into an SDD, returning the diagram
    /// together with the set of variables it actually depends on (the
    /// caller partitions this set into X/Y/TaggedNext variables using the
    /// active [`crate::partition::Partition`]).
    ///
    /// `And`/`Or` map to SDD conjunction/disjunction; `PropNot` and
    /// `TaggedNext` map to the (negative or positive) literal of the
    /// allocated variable; `True`/`False` map to the manager's constants.
    /// Recursion is memoized per handle, since the same xnf subformula is
    /// commonly shared across branches after hash-consing.
    ///
    /// # Errors
    ///
    /// Returns [`SddError::Internal`] if `h` contains a node xnf never
    /// produces (`Not`, `Implies`, `Equivalent`, `Xor`, `Next`, `WeakNext`,
    /// `Eventually`, `Always`, `Until`, `Release`) — i.e. the caller passed
    /// something that was not actually xnf'd first.
    pub fn compile(&mut self, ctx: &Context, h: Handle) -> Result<(SddPtr, HashSet<VarLabel>), SddError> {
        if let Some(cached) = self.compile_cache.get(&h) {
            return Ok(cached.clone());
        }
        let result = match ctx.view(h) {
            NodeView::True => (self.manager.get_mut().one(), HashSet::new()),
            NodeView::False => (self.manager.get_mut().zero(), HashSet::new()),
            NodeView::Atom(id) => {
                let label = self.var_for_atom(id);
                (self.literal(label, true), HashSet::from([label]))
            }
            NodeView::PropNot(id) => {
                let label = self.var_for_atom(id);
                (self.literal(label, false), HashSet::from([label]))
            }
            NodeView::TaggedNext(_) => {
                let label = self.var_for_next(h);
                (self.literal(label, true), HashSet::from([label]))
            }
            NodeView::And(children) => {
                let mut acc = self.manager.get_mut().one();
                let mut vars = HashSet::new();
                for c in children {
                    let (sdd, cvars) = self.compile(ctx, c)?;
                    acc = self.manager.get_mut().and(acc, sdd);
                    vars.extend(cvars);
                }
                (acc, vars)
            }
            NodeView::Or(children) => {
                let mut acc = self.manager.get_mut().zero();
                let mut vars = HashSet::new();
                for c in children {
                    let (sdd, cvars) = self.compile(ctx, c)?;
                    acc = self.manager.get_mut().or(acc, sdd);
                    vars.extend(cvars);
                }
                (acc, vars)
            }
            other => {
                return Err(SddError::Internal(format!(
                    "compile: expected an xnf node, found {other:?}"
                )))
            }
        };
        self.compile_cache.insert(h, result.clone());
        Ok(result)
    }

    /// Restricts `sdd` by a (possibly partial) assignment to its variables.
    pub fn restrict(&mut self, sdd: SddPtr, assignment: &[(VarLabel, bool)]) -> SddPtr {
        let mut cur = sdd;
        for &(label, value) in assignment {
            cur = self.manager.get_mut().condition(cur, label, value);
        }
        cur
    }

    /// Whether `sdd` has at least one satisfying assignment.
    pub fn is_sat(&self, sdd: SddPtr) -> bool {
        sdd != self.manager.borrow().zero()
    }

    /// Existential projection of `sdd` over `vars` — used to quantify over
    /// a block of environment or controller variables.
    pub fn exists(&mut self, sdd: SddPtr, vars: &[VarLabel]) -> SddPtr {
        let mut cur = sdd;
        for &label in vars {
            cur = self.manager.get_mut().exists(cur, label);
        }
        cur
    }

    /// Returns every *minimal* satisfying assignment to `vars` in `sdd`, each
    /// as the subset of `vars` set true (the rest false). "Minimal" means no
    /// proper subset of the returned set also satisfies `sdd`.
    ///
    /// `TaggedNext` variables never appear negated in xnf output, so `sdd`
    /// restricted to only those variables is a monotone Boolean function of
    /// them: its satisfying assignments form an upward-closed set, and a
    /// continuation that forces *more* tags true than necessary is always a
    /// strictly stronger (harder to win) obligation than one of its minimal
    /// sub-assignments. The search only ever needs to try the minimal ones —
    /// if a non-minimal continuation would win, so would the minimal
    /// continuation it forces-true-a-superset-of (§4.E step 6b). When `sdd`
    /// is satisfied by more than one minimal assignment (tags combined with
    /// `Or` rather than `And`), this returns all of them, not just their
    /// intersection — that distinction is exactly what makes a disjunction
    /// of obligations (e.g. `F x1 | F x2`) behave as a disjunction of
    /// continuations rather than collapsing to "no continuation is forced".
    ///
    /// # Panics
    ///
    /// Panics if `vars.len() >= 20` (the `2^|vars|` enumeration below would
    /// be impractical); no benchmark formula comes close to that many
    /// distinct `TaggedNext` obligations in one step.
    pub fn minimal_models(&mut self, sdd: SddPtr, vars: &[VarLabel]) -> Vec<Vec<VarLabel>> {
        let n = vars.len();
        assert!(n < 20, "too many TaggedNext obligations for exhaustive enumeration");
        let mut masks: Vec<u32> = (0..(1u32 << n)).collect();
        masks.sort_by_key(|m| m.count_ones());

        let mut minimal_masks: Vec<u32> = Vec::new();
        let mut out = Vec::new();
        for mask in masks.drain(..) {
            // Skip any mask that is a superset of an already-confirmed
            // minimal model; it cannot itself be minimal.
            if minimal_masks.iter().any(|&m| m & mask == m) {
                continue;
            }
            let assignment: Vec<(VarLabel, bool)> = vars
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, mask & (1 << i) != 0))
                .collect();
            let restricted = self.restrict(sdd, &assignment);
            if !self.is_sat(restricted) {
                continue;
            }
            minimal_masks.push(mask);
            out.push(
                vars.iter()
                    .enumerate()
                    .filter(|&(i, _)| mask & (1 << i) != 0)
                    .map(|(_, &v)| v)
                    .collect(),
            );
        }
        out
    }

    /// Enumerates every total assignment to `yvars` under which `sdd` is
    /// satisfiable, paired with every minimal `TaggedNext` continuation each
    /// one admits (§4.D `models`). A single `y_values` assignment can yield
    /// more than one [`Model`] when the obligations are combined with `Or`
    /// rather than `And` — each is an independent controller move the
    /// search layer must try in turn. `yvars` is expected to be small (the
    /// number of controller atoms in one formula), so this brute-forces all
    /// `2^|Y|` assignments rather than walking the diagram structurally.
    ///
    /// # Panics
    ///
    /// Panics if `yvars.len() >= 64` (assignments no longer fit in a
    /// `u64` bitmask); no benchmark formula comes close to that width.
    pub fn models(&mut self, sdd: SddPtr, yvars: &[VarLabel], nvars: &[VarLabel]) -> Vec<Model> {
        assert!(yvars.len() < 64, "controller alphabet too large for bitmask enumeration");
        let mut out = Vec::new();
        for bits in 0..(1u64 << yvars.len()) {
            let assignment: Vec<(VarLabel, bool)> = yvars
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, bits & (1 << i) != 0))
                .collect();
            let restricted = self.restrict(sdd, &assignment);
            if !self.is_sat(restricted) {
                continue;
            }
            let y_values: Vec<bool> = assignment.iter().map(|&(_, value)| value).collect();
            for model_vars in self.minimal_models(restricted, nvars) {
                let forced = model_vars.iter().filter_map(|&v| self.next_handle_for_var(v)).collect();
                out.push(Model {
                    y_values: y_values.clone(),
                    forced,
                });
            }
        }
        out
    }

    /// Splits a set of variables touched by a compiled expression into
    /// environment atoms, controller atoms and `TaggedNext` variables,
    /// given the formula's input/output [`crate::partition::Partition`].
    /// Returns `Err(AtomId)` for the first atom found in neither side of
    /// the partition (should not happen for a formula already validated by
    /// `Partition::validate`).
    pub fn partition_vars(
        &self,
        vars: &HashSet<VarLabel>,
        is_input: impl Fn(AtomId) -> bool,
        is_output: impl Fn(AtomId) -> bool,
    ) -> Result<(Vec<VarLabel>, Vec<VarLabel>, Vec<VarLabel>), AtomId> {
        let mut xvars = Vec::new();
        let mut yvars = Vec::new();
        let mut nvars = Vec::new();
        for &v in vars {
            match self.keys.get(&v) {
                Some(VarKey::Next(_)) => nvars.push(v),
                // `end` is bound by the search layer itself, not part of
                // either partition side.
                Some(VarKey::Atom(id)) if *id == AtomId::END => {}
                Some(VarKey::Atom(id)) if is_input(*id) => xvars.push(v),
                Some(VarKey::Atom(id)) if is_output(*id) => yvars.push(v),
                Some(VarKey::Atom(id)) => return Err(*id),
                None => unreachable!("variable label not tracked by this bridge"),
            }
        }
        Ok((xvars, yvars, nvars))
    }
}

impl Default for SddBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::nnf::ToNnf;
    use crate::formula::xnf::xnf;

    #[test]
    fn atom_and_its_negation_share_a_variable() {
        let mut bridge = SddBridge::new();
        let mut ctx = Context::new();
        let a = ctx.make_atom("a");
        let id = match ctx.view(a) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        };
        let v1 = bridge.var_for_atom(id);
        let v2 = bridge.var_for_atom(id);
        assert_eq!(v1, v2);
    }

    #[test]
    fn compile_and_is_satisfiable_unless_contradictory() {
        let mut ctx = Context::new();
        let mut bridge = SddBridge::new();
        let a = ctx.make_atom("a");
        let not_a = ctx.make_not(a).unwrap();
        let contradiction = ctx.make_and(&[a, not_a]).unwrap();
        let (sdd, _) = bridge.compile(&ctx, contradiction).unwrap();
        assert!(!bridge.is_sat(sdd));
    }

    #[test]
    fn eventually_forces_its_own_tag_when_nothing_else_holds() {
        let mut ctx = Context::new();
        let mut bridge = SddBridge::new();
        let a = ctx.make_atom("a");
        let ev = ctx.make_eventually(a).unwrap();
        let nnf = ToNnf::to_nnf(&mut ctx, ev);
        let x = xnf(&mut ctx, nnf).unwrap();
        // xnf(F a) = a | @(F a); under a = false, only the tag can hold.
        let (sdd, vars) = bridge.compile(&ctx, x).unwrap();
        let a_var = bridge.var_for_atom(match ctx.view(a) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        });
        let restricted = bridge.restrict(sdd, &[(a_var, false)]);
        assert!(bridge.is_sat(restricted));
        let nvars: Vec<VarLabel> = vars.into_iter().filter(|&v| v != a_var).collect();
        let models = bridge.minimal_models(restricted, &nvars);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].len(), 1);
    }

    #[test]
    fn disjoined_tags_yield_two_minimal_models_not_their_intersection() {
        // `@(n1) | @(n2)`: no single TaggedNext variable is forced across
        // every satisfying assignment (the old entailment-based
        // `forced_true` would report an empty intersection here), but there
        // are two distinct minimal models, `{n1}` and `{n2}`.
        let mut ctx = Context::new();
        let mut bridge = SddBridge::new();
        let a = ctx.make_atom("a");
        let b = ctx.make_atom("b");
        let tagged_a = ctx.make_tagged_next(a).unwrap();
        let tagged_b = ctx.make_tagged_next(b).unwrap();
        let disjunction = ctx.make_or(&[tagged_a, tagged_b]).unwrap();
        let (sdd, vars) = bridge.compile(&ctx, disjunction).unwrap();
        let nvars: Vec<VarLabel> = vars.into_iter().collect();
        let mut models = bridge.minimal_models(sdd, &nvars);
        assert_eq!(models.len(), 2);
        models.sort_by_key(|m| m.len());
        assert_eq!(models[0].len(), 1);
        assert_eq!(models[1].len(), 1);
    }
}
