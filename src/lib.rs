//! Cynthia: a realizability checker for LTLf reactive synthesis specifications.
//!
//! The data flow mirrors §2 of the specification: a surface-grammar parser
//! ([`syntax`]) builds a formula into a hash-consed [`formula::Context`]
//! (component A); the [`formula::xnf`] transformer and the
//! [`formula::visitor`]-based rewriters (component B/C) reduce it to a
//! next-normal form; the [`sdd`] bridge compiles that into a Sentential
//! Decision Diagram (component D); and [`search`] runs the depth-first
//! AND/OR game search over residual formulas (component E) to decide
//! realizability. [`partition`] reads the `.inputs:`/`.outputs:` file that
//! assigns every atom to the environment or the controller.
//!
//! This crate is a library first: the `cynthia` binary (`src/main.rs`) is a
//! thin CLI wrapper over [`check`]/[`synthesize`].

pub mod error;
pub mod formula;
pub mod options;
pub mod partition;
pub mod sdd;
pub mod search;
pub mod syntax;

use std::fmt;

use log::{debug, info};

use error::Result;
use formula::simplify::Simplify;
use formula::{Context, Handle};
use partition::Partition;
use search::{Search, SearchConfig, Verdict};

/// The realizability verdict for a specification (§1).
///
/// `Realizable` means a finite-state controller exists whose moves over
/// the controller propositions force every finite play to satisfy the
/// formula, no matter how the environment moves; `Unrealizable` means the
/// environment has a winning counter-strategy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Status {
    Realizable,
    Unrealizable,
}

impl From<Verdict> for Status {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Win => Self::Realizable,
            Verdict::Lose => Self::Unrealizable,
        }
    }
}

impl Status {
    /// The exit code this status maps to at the CLI boundary (§6):
    /// `0` realizable, `1` unrealizable.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Realizable => 0,
            Self::Unrealizable => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Realizable => "REALIZABLE",
                Self::Unrealizable => "UNREALIZABLE",
            }
        )
    }
}

/// Checks realizability of formula `phi` (already built in `ctx`) against
/// `partition`, using the given search configuration.
///
/// This is the entry point the CLI uses directly, so that
/// `--cycle-wins-controller` can flip [`search::SearchConfig::cycle`]
/// without going through the pinned-semantics [`synthesize`] wrapper.
///
/// # Errors
///
/// Returns [`error::CynthiaError::Partition`] if `phi` mentions an atom on
/// neither side of `partition`, or any error the search itself raises
/// (§4.E "Failure semantics").
pub fn check(ctx: &mut Context, phi: Handle, partition: &Partition, config: SearchConfig) -> Result<Status> {
    let (xatoms, yatoms) = partition.resolve(ctx)?;
    debug!("formula: {}", ctx.display(phi));
    debug!("inputs: {:?}, outputs: {:?}", partition.inputs(), partition.outputs());
    let simplified = Simplify::simplify(ctx, phi);
    let mut search = Search::new(ctx, &xatoms, &yatoms, config);
    let verdict = search.run(simplified)?;
    let status = Status::from(verdict);
    info!("verdict: {}", status);
    Ok(status)
}

/// Parses `ltl` and checks its realizability against the given input
/// (environment) and output (controller) atom names, using an explicit
/// search configuration.
///
/// Prefer [`synthesize`] unless the caller specifically needs a
/// non-default [`SearchConfig`] (e.g. the CLI's cycle tie-break flag);
/// library callers otherwise always get the pinned semantics.
///
/// # Errors
///
/// Returns [`error::CynthiaError::Parse`] on a malformed formula,
/// [`error::CynthiaError::Partition`] on a duplicated or unknown atom name,
/// or any error [`check`] raises.
pub fn synthesize_with_config(
    ltl: &str,
    ins: &[&str],
    outs: &[&str],
    config: SearchConfig,
) -> Result<Status> {
    let mut ctx = Context::new();
    let phi = syntax::parse(&mut ctx, ltl)?;
    let partition = Partition::new(
        ins.iter().map(|s| (*s).to_owned()).collect(),
        outs.iter().map(|s| (*s).to_owned()).collect(),
    )?;
    check(&mut ctx, phi, &partition, config)
}

/// Checks realizability of the LTLf formula `ltl`, with `ins` the
/// environment propositions and `outs` the controller propositions, using
/// the pinned default semantics (§4.E "cycle is Lose for the controller",
/// no cancellation).
///
/// # Errors
///
/// See [`synthesize_with_config`].
pub fn synthesize(ltl: &str, ins: &[&str], outs: &[&str]) -> Result<Status> {
    synthesize_with_config(ltl, ins, outs, SearchConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_cli_verdict_lines() {
        assert_eq!(Status::Realizable.to_string(), "REALIZABLE");
        assert_eq!(Status::Unrealizable.to_string(), "UNREALIZABLE");
    }

    #[test]
    fn simple_gf_response_is_realizable() {
        let status = synthesize("G (x1 -> F y1)", &["x1"], &["y1"]).unwrap();
        assert_eq!(status, Status::Realizable);
    }

    #[test]
    fn unknown_atom_in_formula_is_an_error() {
        let err = synthesize("a & b", &["a"], &[]).unwrap_err();
        assert!(matches!(err, error::CynthiaError::Partition(_)));
    }
}
