//! A small, self-contained reference SAT backend used when no native
//! solver is compiled in and for deterministic engine tests. It is a
//! brute-force decision procedure (sound and complete, just exponential),
//! not a CDCL solver — the synthetic instances exercised by the engine's
//! own test suite stay well within its practical variable count.

use super::Sat;
use crate::cnf::Literal;
use crate::vars::Var;
use std::collections::{BTreeSet, HashMap};

#[derive(Default)]
pub struct SimpleSat {
    clauses: Vec<Vec<Literal>>,
    vars: BTreeSet<u32>,
}

impl SimpleSat {
    pub fn new() -> Self {
        Self::default()
    }

    fn all_vars(&self, assumptions: &[Literal]) -> Vec<u32> {
        let mut vars = self.vars.clone();
        for &lit in assumptions {
            vars.insert(lit.unsigned_abs());
        }
        vars.into_iter().collect()
    }

    fn satisfies(&self, assignment: &HashMap<u32, bool>, assumptions: &[Literal]) -> bool {
        for &lit in assumptions {
            let v = lit.unsigned_abs();
            let want = lit > 0;
            if assignment.get(&v) != Some(&want) {
                return false;
            }
        }
        self.clauses.iter().all(|clause| {
            clause.iter().any(|&lit| {
                let v = lit.unsigned_abs();
                assignment.get(&v) == Some(&(lit > 0))
            })
        })
    }

    fn search(&self, assumptions: &[Literal]) -> Option<HashMap<u32, bool>> {
        let vars = self.all_vars(assumptions);
        let n = vars.len();
        assert!(
            n <= 24,
            "SimpleSat is a brute-force reference backend capped at 24 variables (got {n})"
        );
        for mask in 0..(1u64 << n) {
            let mut assignment = HashMap::with_capacity(n);
            for (i, &v) in vars.iter().enumerate() {
                assignment.insert(v, (mask >> i) & 1 == 1);
            }
            if self.satisfies(&assignment, assumptions) {
                return Some(assignment);
            }
        }
        None
    }
}

impl Sat for SimpleSat {
    fn start(&mut self, _watch_vars: &[Var], _randomize_models: bool) {
        self.clauses.clear();
        self.vars.clear();
    }

    fn add_clause(&mut self, clause: &[Literal]) {
        for &lit in clause {
            self.vars.insert(lit.unsigned_abs());
        }
        self.clauses.push(clause.to_vec());
    }

    fn is_sat_assuming(&mut self, assumptions: &[Literal]) -> bool {
        self.search(assumptions).is_some()
    }

    fn is_sat_model_or_core(
        &mut self,
        assumptions: &[Literal],
        project: &[Var],
        out: &mut Vec<Literal>,
    ) -> bool {
        out.clear();
        match self.search(assumptions) {
            Some(assignment) => {
                for &v in project {
                    if let Some(&val) = assignment.get(&v) {
                        out.push(if val { v as i32 } else { -(v as i32) });
                    }
                }
                true
            }
            None => {
                let minimized = super::minimize_core(self, assumptions);
                out.extend(minimized);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_conflict_is_unsat() {
        let mut s = SimpleSat::new();
        s.start(&[1], false);
        s.add_clause(&[1]);
        s.add_clause(&[-1]);
        assert!(!s.is_sat_assuming(&[]));
    }

    #[test]
    fn model_extraction_projects_requested_vars() {
        let mut s = SimpleSat::new();
        s.start(&[1, 2], false);
        s.add_clause(&[1, 2]);
        s.add_clause(&[-1, -2]);
        let mut out = Vec::new();
        let sat = s.is_sat_model_or_core(&[1], &[1, 2], &mut out);
        assert!(sat);
        assert!(out.contains(&1));
        assert!(out.contains(&-2));
    }

    #[test]
    fn unsat_core_is_subset_of_assumptions() {
        let mut s = SimpleSat::new();
        s.start(&[1], false);
        s.add_clause(&[1]);
        let mut out = Vec::new();
        let sat = s.is_sat_model_or_core(&[-1, 2], &[1, 2], &mut out);
        assert!(!sat);
        assert!(out.iter().all(|l| [-1, 2].contains(l)));
        assert!(out.contains(&-1));
    }
}
