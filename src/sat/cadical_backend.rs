//! In-process SAT backend (C3) backed by the CaDiCaL incremental solver,
//! grounded on `mmaroti-cadical-rs`'s safe `cadical::Solver` wrapper
//! (`add_clause`, `solve_with`, `value`, `failed`) — the real published
//! `cadical` crate, not a hand-rolled FFI shim. CaDiCaL won the SAT Race
//! 2019 SAT track and is the reference in-process CDCL core the spec's
//! §4.3 "CDCL core with assumption support" describes.

use super::Sat;
use crate::cnf::Literal;
use crate::vars::Var;

pub struct CadicalSat {
    inner: cadical::Solver,
}

impl Default for CadicalSat {
    fn default() -> Self {
        Self::new()
    }
}

impl CadicalSat {
    pub fn new() -> Self {
        CadicalSat {
            inner: cadical::Solver::default(),
        }
    }
}

impl Sat for CadicalSat {
    fn start(&mut self, _watch_vars: &[Var], _randomize_models: bool) {
        // CaDiCaL is already incremental; a fresh session is a fresh solver
        // instance, matching the per-frame/per-candidate sessions spec
        // §3/§4.3 describes as independently owned.
        self.inner = cadical::Solver::default();
    }

    fn add_clause(&mut self, clause: &[Literal]) {
        self.inner.add_clause(clause.iter().copied());
    }

    fn is_sat_assuming(&mut self, assumptions: &[Literal]) -> bool {
        match self.inner.solve_with(assumptions.iter().copied(), std::iter::empty()) {
            Some(sat) => sat,
            None => panic!("CaDiCaL returned unknown; the SAT contract has no timeout path"),
        }
    }

    fn is_sat_model_or_core(
        &mut self,
        assumptions: &[Literal],
        project: &[Var],
        out: &mut Vec<Literal>,
    ) -> bool {
        out.clear();
        match self.inner.solve_with(assumptions.iter().copied(), std::iter::empty()) {
            Some(true) => {
                for &v in project {
                    match self.inner.value(v as i32) {
                        Some(true) => out.push(v as i32),
                        Some(false) => out.push(-(v as i32)),
                        None => {}
                    }
                }
                true
            }
            Some(false) => {
                for &lit in assumptions {
                    if self.inner.failed(lit) {
                        out.push(lit);
                    }
                }
                false
            }
            None => panic!("CaDiCaL returned unknown; the SAT contract has no timeout path"),
        }
    }
}
