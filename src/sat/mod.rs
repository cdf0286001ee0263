//! SAT backend interface (C3), grounded on `satgalaxy`'s per-backend
//! modules (`solver::cadical`, `solver::minisat`, …) dispatched through a
//! shared `Solver` trait — we keep that "one trait, many interchangeable
//! backends" shape, but the trait itself models the *incremental session*
//! contract of spec §4.3 rather than the teacher's one-shot `solve()`.

pub mod naive;
#[cfg(feature = "cadical-backend")]
pub mod cadical_backend;

use crate::cnf::{Cnf, Literal};
use crate::vars::Var;

/// An incremental SAT session (spec §4.3). Implementations are
/// interchangeable: one based on a CDCL core with assumption support
/// (the `cadical-backend` feature), one a small pure-Rust reference
/// solver ([`naive::SimpleSat`]) used when no native backend is compiled
/// in and for deterministic engine tests.
pub trait Sat {
    /// Begins a new session, declaring which variables the caller will
    /// later inspect in a model.
    fn start(&mut self, watch_vars: &[Var], randomize_models: bool);

    fn add_clause(&mut self, clause: &[Literal]);

    fn add_cnf(&mut self, cnf: &Cnf) {
        for clause in cnf.get_clauses() {
            self.add_clause(clause);
        }
    }

    fn add_neg_cube_as_clause(&mut self, cube: &[Literal]) {
        let clause: Vec<Literal> = cube.iter().map(|&l| -l).collect();
        self.add_clause(&clause);
    }

    fn is_sat_assuming(&mut self, assumptions: &[Literal]) -> bool;

    /// If SAT, `out` receives the model projected onto `project`,
    /// expressed as a cube. If UNSAT, `out` receives a subset of
    /// `assumptions` sufficient to cause unsatisfiability (an unsat core
    /// over the assumption literals). Returns whether the query was SAT.
    fn is_sat_model_or_core(
        &mut self,
        assumptions: &[Literal],
        project: &[Var],
        out: &mut Vec<Literal>,
    ) -> bool;
}

/// Naive minimization pass for an unsat core: drop each assumption
/// literal and re-test; keep it only if dropping it makes the remainder
/// SAT-again-unreachable (i.e. it is still needed). This is the baseline
/// described in spec §9 ("Unsat-core generalization"): not a correctness
/// requirement, central to performance; a naive drop-and-retest loop
/// suffices as a reference implementation.
pub fn minimize_core(sat: &mut dyn Sat, core: &[Literal]) -> Vec<Literal> {
    let mut minimized = core.to_vec();
    let mut i = 0;
    while i < minimized.len() {
        let mut trial = minimized.clone();
        trial.remove(i);
        if trial.is_empty() {
            i += 1;
            continue;
        }
        if !sat.is_sat_assuming(&trial) {
            minimized = trial;
        } else {
            i += 1;
        }
    }
    minimized
}
