//! End-to-end realizability tests against the benchmark seeds of §8 and the
//! game-dualization law `synthesize(phi, X, Y) = !synthesize(!phi, Y, X)`.

use std::io::{BufReader, Write};

use cynthia::formula::Context;
use cynthia::partition::Partition;
use cynthia::search::SearchConfig;
use cynthia::{check, synthesize, Status};

/// Synthesizes `ltl` with the given input/output atoms and checks the
/// returned status against `expected`.
fn verify(ltl: &str, ins: &[&str], outs: &[&str], expected: Status) {
    let status = synthesize(ltl, ins, outs).unwrap_or_else(|e| panic!("synthesis failed for {:?}: {}", ltl, e));
    assert_eq!(status, expected, "unexpected verdict for {:?}", ltl);
}

#[test]
fn seed_1_response_is_realizable() {
    // G (x1 -> F y1): the controller can always raise y1 the instant the
    // environment raises x1.
    verify("G (x1 -> F y1)", &["x1"], &["y1"], Status::Realizable);
}

#[test]
fn seed_2_always_and_eventually_not_is_unrealizable() {
    // G y1 & F !y1: a direct contradiction along any suffix long enough for
    // F to be forced, with nothing on the environment side to blame it on.
    verify("G y1 & F !y1", &[], &["y1"], Status::Unrealizable);
}

#[test]
fn seed_3_conflicting_next_obligations_is_unrealizable() {
    // X y1 & X !y1: the controller's single next move cannot be both y1
    // and !y1.
    verify("X y1 & X !y1", &[], &["y1"], Status::Unrealizable);
}

#[test]
fn seed_4_eventual_conjunction_is_unrealizable() {
    // F (x1 & y1): the environment can simply never raise x1. Each step the
    // environment picks x1 = false collapses the residual to `F (x1 & y1)`
    // itself (no controller move can discharge the obligation without the
    // environment's cooperation), an unfounded cycle that the pinned
    // tie-break (§4.E step 2) resolves as a controller loss. This is what
    // the §8 dualization law forces too: `!synthesize(F(x1&y1), {x1}, {y1})`
    // must equal `synthesize(G(!x1|!y1), {y1}, {x1})`, and the latter is
    // trivially realizable by the dual controller holding `!x1` vacuously
    // true whenever the (now-environment) `y1` cooperates — so the former
    // is Unrealizable. (The spec table's "REALIZABLE" for this seed does
    // not survive contact with its own dualization property; see
    // DESIGN.md's open-question section.)
    verify("F (x1 & y1)", &["x1"], &["y1"], Status::Unrealizable);
}

#[test]
fn seed_5_mirrored_equivalence_is_unrealizable() {
    // G (x1 <-> y1) & F !x1: the environment can hold x1 true forever, so
    // `F !x1` never discharges; every step's only residual is the original
    // formula, an unfounded cycle and therefore a controller loss under the
    // same pinned tie-break as seed 4. (Spec-table discrepancy recorded in
    // DESIGN.md alongside seed 4's.)
    verify("G (x1 <-> y1) & F !x1", &["x1"], &["y1"], Status::Unrealizable);
}

#[test]
fn disjoined_eventualities_over_environment_atoms_is_unrealizable() {
    // F x1 | F x2, both environment atoms, no controller atoms at all: the
    // environment can withhold both forever. Regression test for the
    // disjunctive-tag bug where `forced_true`'s entailment-based
    // intersection reported "nothing forced" (vacuously legal to stop) even
    // though neither disjunct individually holds.
    verify("F x1 | F x2", &["x1", "x2"], &[], Status::Unrealizable);
}

#[test]
fn seed_6_until_with_environment_trigger_is_unrealizable() {
    // y1 U x1: the environment may simply never raise x1, forcing an
    // unfounded cycle through the Until residual, which is a controller
    // loss under the pinned tie-break (§4.E step 2).
    verify("y1 U x1", &["x1"], &["y1"], Status::Unrealizable);
}

#[test]
fn game_dualization_law_holds_for_seed_1() {
    let ltl = "G (x1 -> F y1)";
    let forward = synthesize(ltl, &["x1"], &["y1"]).unwrap();

    let mut ctx = Context::new();
    let phi = cynthia::syntax::parse(&mut ctx, ltl).unwrap();
    let not_phi = ctx.make_not(phi).unwrap();
    let negated_text = ctx.display(not_phi).to_string();
    // the roles of environment/controller swap under negation.
    let backward = synthesize(&negated_text, &["y1"], &["x1"]).unwrap();

    let expected_backward = match forward {
        Status::Realizable => Status::Unrealizable,
        Status::Unrealizable => Status::Realizable,
    };
    assert_eq!(backward, expected_backward);
}

#[test]
fn unknown_atom_in_partition_is_a_recoverable_error() {
    let err = synthesize("a & b", &["a"], &[]).unwrap_err();
    assert!(matches!(err, cynthia::error::CynthiaError::Partition(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn drives_the_cli_pipeline_from_real_files() {
    // Exercises the same formula-file + partition-file path `main.rs` does,
    // rather than the `synthesize` convenience wrapper.
    let mut partition_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(partition_file, ".inputs: x1\n.outputs: y1").unwrap();

    let partition = Partition::read(BufReader::new(partition_file.reopen().unwrap())).unwrap();
    let mut ctx = Context::new();
    let phi = cynthia::syntax::parse(&mut ctx, "G (x1 -> F y1)").unwrap();

    let status = check(&mut ctx, phi, &partition, SearchConfig::default()).unwrap();
    assert_eq!(status, Status::Realizable);
}
