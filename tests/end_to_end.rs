//! End-to-end scenarios (spec §8), driven through the full CLI/
//! orchestrator surface rather than calling `synth`/`ifm` directly —
//! complementing the narrower in-module unit tests those two engines
//! carry themselves.

use clap::Parser;
use demiurge_rs::backend;
use demiurge_rs::cli::Options;
use std::path::{Path, PathBuf};

fn write_and_run(dir_name: &str, file_name: &str, text: &str, extra_args: &[&str]) -> demiurge_rs::errors::Result<bool> {
    let dir = std::env::temp_dir().join("demiurge-rs-e2e").join(dir_name);
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join(file_name);
    std::fs::write(&input, text).unwrap();

    let mut args: Vec<&str> = vec!["demiurge", "--in"];
    let input_str = input.to_str().unwrap().to_string();
    args.push(&input_str);
    args.push("--realizability-only");
    args.extend_from_slice(extra_args);
    let opts = Options::parse_from(args);
    backend::orchestrate(&opts)
}

/// Scenario 1: two-state system, one latch `s`, no inputs, one
/// controllable `c`, transition `s' = c`, error `e = s`. Expected:
/// realizable.
#[test]
fn scenario_1_trivial_realizable_safety() {
    let text = "aag 2 1 1 1 0\n2\n4 2\n4\ni0 controllable_c\n";
    let realizable = write_and_run("s1", "s1.aag", text, &["--backend", "ifm"]).unwrap();
    assert!(realizable);
}

/// Scenario 2: one latch `s`, no controllables, error `e = s`, initial
/// `s = 1`. Expected: unrealizable, reported at the first IFM iteration.
#[test]
fn scenario_2_trivial_unrealizable() {
    // reset=1 forces the latch (and therefore the error bit) true in the
    // initial state.
    let text = "aag 1 0 1 1 0\n2 2 1\n2\n";
    let realizable = write_and_run("s2", "s2.aag", text, &["--backend", "ifm"]).unwrap();
    assert!(!realizable);
}

/// Scenario 3: latch `s`, uncontrollable `u`, controllable `c`, `s' = u`,
/// error `e = s`. Expected: unrealizable — the environment drives `s`
/// directly regardless of `c`.
#[test]
fn scenario_3_environment_forced_loss() {
    let text = "aag 3 2 1 1 0\n2\n4\n6 2\n6\ni0 u\ni1 controllable_c\n";
    let realizable = write_and_run("s3", "s3.aag", text, &["--backend", "ifm"]).unwrap();
    assert!(!realizable);
}

/// Scenario 4: two latches (`s0` a decoy, the auto-generated error latch
/// the other), controllable `c`, error iff `c = 0`. Expected: realizable;
/// the CNF template engine should find a working candidate at the
/// smallest template size (a template whose only slot is inactive,
/// leaving just the fixed `¬error` clause).
#[test]
fn scenario_4_one_step_look_ahead_realizable() {
    let text = "aag 2 1 1 1 0\n2\n4 2\n3\ni0 controllable_c\n";
    let realizable = write_and_run(
        "s4",
        "s4.aag",
        text,
        &["--backend", "templ", "--template-shape", "cnf", "--resolution-mode", "cegis"],
    )
    .unwrap();
    assert!(realizable);
}

/// Scenario 5: two latches `s0, s1`, two controllables `c0, c1`, error
/// iff either latch is currently set, `s0' = ¬c0`, `s1' = ¬c1`. The exact
/// winning region is `¬s0 ∧ ¬s1` — two independent unit clauses no
/// single CNF-template clause can express (a clause `¬s0 ∨ ¬s1` would
/// wrongly admit `s0=1, s1=0`) — forcing the CEGIS loop to grow the
/// template from N=1 to N=2 before it succeeds.
#[test]
fn scenario_5_cegis_counterexample_exclusion_grows_template() {
    let text = "aag 5 2 2 1 1\n2\n8\n4 3\n6 9\n11\n10 5 7\ni0 controllable_c0\ni1 controllable_c1\n";
    let realizable = write_and_run(
        "s5",
        "s5.aag",
        text,
        &["--backend", "templ", "--template-shape", "cnf", "--resolution-mode", "cegis"],
    )
    .unwrap();
    assert!(realizable);
}

/// Scenario 6: a three-latch shift chain `s0 <- u`, `s1 <- s0`, `s2 <-
/// s1`, error iff `s2` is set, with no controllable influence at all.
/// The environment can force `u=1` and walk the error bit through the
/// chain over several steps, so IFM's frame sequence must actually grow
/// for a few levels before the propagation fixed point `R_i == R_{i+1}`
/// is reached (spec §8's "frame propagation terminates"). This CLI-level
/// check only has visibility into the realizability verdict; the frame
/// sequence itself (monotonicity, `R_0 == E`, the fixed point, initial
/// avoidance) is asserted directly against the same shift-chain game in
/// `src/ifm/mod.rs`'s own test module, which can see frame state this
/// end-to-end harness cannot.
#[test]
fn scenario_6_frame_propagation_terminates() {
    let text = "aag 4 1 3 1 0\n2\n4 2\n6 4\n8 6\n8\ni0 u\n";
    let realizable = write_and_run("s6", "s6.aag", text, &["--backend", "ifm"]).unwrap();
    assert!(!realizable);
}

/// The `Store`/`Load` checkpoint back-ends (spec §4.9) round-trip a
/// winning region through `win/<basename>.dimacs`.
#[test]
fn store_then_load_checkpoint_round_trips() {
    let dir = std::env::temp_dir().join("demiurge-rs-e2e").join("checkpoint");
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("checkpoint.aag");
    std::fs::write(&input, "aag 2 1 1 1 0\n2\n4 2\n4\ni0 controllable_c\n").unwrap();

    let store_args = ["demiurge", "--in", input.to_str().unwrap(), "--backend", "ifm", "--extractor", "store"];
    let store_opts = Options::parse_from(store_args);
    assert!(backend::orchestrate(&store_opts).unwrap());

    let checkpoint = backend::extractor::checkpoint_path(&input);
    assert!(checkpoint.exists());

    let load_args = [
        "demiurge",
        "--in",
        input.to_str().unwrap(),
        "--backend",
        "load",
        "--realizability-only",
    ];
    let load_opts = Options::parse_from(load_args);
    assert!(backend::orchestrate(&load_opts).unwrap());

    let _ = std::fs::remove_file(checkpoint);
}

#[allow(dead_code)]
fn unused_path_helper(p: &Path) -> PathBuf {
    p.to_path_buf()
}
