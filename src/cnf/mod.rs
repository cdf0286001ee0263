//! CNF container (C1): an in-memory conjunction of clauses over signed
//! integer literals, grounded on `original_source/tool/src/CNF.h`/`CNF.cpp`
//! and spec §4.1. The original represents a CNF as a `list<vector<int>>`;
//! we use a `Vec<Vec<i32>>` instead (insertion order is still observable,
//! and random access is occasionally useful for the per-frame solver
//! bookkeeping of [`crate::ifm`]), matching spec §9's explicit guidance to
//! use "a clear double loop, not reproduce the source order" rather than
//! the original's iterator trick, and its instruction to drop the
//! `CNFSet` variant entirely.

pub mod dimacs;

use crate::vars::VarManager;
use std::collections::HashSet;

/// A nonzero signed literal; sign encodes polarity.
pub type Literal = i32;
/// A disjunction of distinct literals (no literal and its negation appear
/// together).
pub type Clause = Vec<Literal>;

/// An ordered conjunction of clauses. The empty clause represents
/// unsatisfiable; the empty set of clauses represents `TRUE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new() -> Self {
        Cnf { clauses: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.clauses.clear();
    }

    pub fn add_clause(&mut self, clause: impl Into<Clause>) {
        self.clauses.push(clause.into());
    }

    pub fn add1(&mut self, l1: Literal) {
        self.add_clause(vec![l1]);
    }

    pub fn add2(&mut self, l1: Literal, l2: Literal) {
        self.add_clause(vec![l1, l2]);
    }

    pub fn add3(&mut self, l1: Literal, l2: Literal, l3: Literal) {
        self.add_clause(vec![l1, l2, l3]);
    }

    pub fn add4(&mut self, l1: Literal, l2: Literal, l3: Literal, l4: Literal) {
        self.add_clause(vec![l1, l2, l3, l4]);
    }

    /// Conjuncts the CNF with a given cube: every literal becomes a unit
    /// clause.
    pub fn add_cube(&mut self, cube: &[Literal]) {
        for &lit in cube {
            self.add1(lit);
        }
    }

    /// Conjuncts the CNF with the negation of a clause, which is a cube:
    /// every literal of `clause`, negated, becomes a unit clause.
    pub fn add_neg_clause_as_cube(&mut self, clause: &[Literal]) {
        for &lit in clause {
            self.add1(-lit);
        }
    }

    /// Conjuncts the CNF with the negation of a cube, which is a clause:
    /// one clause containing the negation of every literal of `cube`.
    pub fn add_neg_cube_as_clause(&mut self, cube: &[Literal]) {
        let clause: Clause = cube.iter().map(|&l| -l).collect();
        self.add_clause(clause);
    }

    pub fn add_cnf(&mut self, other: &Cnf) {
        self.clauses.extend(other.clauses.iter().cloned());
    }

    /// Removes and returns some clause of minimum size. Ties are broken by
    /// earliest insertion order (deterministic given insertion order, per
    /// spec §4.1).
    pub fn remove_smallest(&mut self) -> Option<Clause> {
        if self.clauses.is_empty() {
            return None;
        }
        let (idx, _) = self
            .clauses
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.len())?;
        Some(self.clauses.remove(idx))
    }

    /// Removes and returns some (arbitrary, but deterministic) clause.
    pub fn remove_some_clause(&mut self) -> Option<Clause> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.remove(self.clauses.len() - 1))
        }
    }

    /// Adds `clause`, first removing every existing clause that is a
    /// (multiset-)superset of it. Returns whether any removal occurred.
    pub fn add_clause_and_simplify(&mut self, clause: impl Into<Clause>) -> bool {
        let clause: Clause = clause.into();
        let before = self.clauses.len();
        self.clauses.retain(|existing| !is_superset(existing, &clause));
        let removed = self.clauses.len() != before;
        self.clauses.push(clause);
        removed
    }

    /// Pairwise removal of any clause that is a superset of any other.
    /// Each pair is compared at most once, per spec §9's guidance to use a
    /// clear double loop rather than reproduce the original's
    /// past-the-end iterator bug.
    pub fn simplify(&mut self) {
        let n = self.clauses.len();
        let mut to_remove = vec![false; n];
        for i in 0..n {
            if to_remove[i] {
                continue;
            }
            for j in 0..n {
                if i == j || to_remove[j] {
                    continue;
                }
                if is_superset(&self.clauses[j], &self.clauses[i]) {
                    to_remove[j] = true;
                }
            }
        }
        let mut idx = 0;
        self.clauses.retain(|_| {
            let keep = !to_remove[idx];
            idx += 1;
            keep
        });
    }

    /// Normalizes to a set-of-sets and back: clauses are de-duplicated,
    /// and literals within each clause end up sorted, as a side effect.
    pub fn remove_duplicates(&mut self) {
        let mut seen: HashSet<Clause> = HashSet::new();
        let mut out = Vec::new();
        for clause in self.clauses.drain(..) {
            let mut sorted = clause;
            sorted.sort_unstable();
            sorted.dedup();
            if seen.insert(sorted.clone()) {
                out.push(sorted);
            }
        }
        self.clauses = out;
    }

    /// Replaces every literal whose absolute value is a `PRES_STATE`
    /// variable by its `NEXT_STATE` counterpart (preserving polarity), and
    /// vice versa.
    pub fn swap_present_next(&mut self, vm: &VarManager) {
        for clause in &mut self.clauses {
            for lit in clause.iter_mut() {
                let v = lit.unsigned_abs();
                use crate::vars::VarKind;
                match vm.kind_of(v) {
                    VarKind::PresState | VarKind::NextState => {
                        let swapped = vm.swapped(v) as i32;
                        *lit = if *lit < 0 { -swapped } else { swapped };
                    }
                    _ => {}
                }
            }
        }
    }

    /// Applies an injective variable map `m[|l|] * sign(l)` to every
    /// literal.
    pub fn rename(&mut self, m: &std::collections::HashMap<u32, u32>) {
        for clause in &mut self.clauses {
            for lit in clause.iter_mut() {
                let v = lit.unsigned_abs();
                if let Some(&mapped) = m.get(&v) {
                    *lit = if *lit < 0 { -(mapped as i32) } else { mapped as i32 };
                }
            }
        }
    }

    /// Unit-propagates a single assignment `v = b`: removes every clause
    /// satisfied by it, and removes the falsified literal from the rest.
    /// If a clause is emptied this way, the whole CNF collapses to a
    /// single empty clause (spec §3).
    pub fn set_var_value(&mut self, v: u32, b: bool) {
        let true_lit = v as i32 * if b { 1 } else { -1 };
        let false_lit = -true_lit;
        let mut collapsed = false;
        let mut out = Vec::with_capacity(self.clauses.len());
        for clause in self.clauses.drain(..) {
            if clause.contains(&true_lit) {
                continue;
            }
            let filtered: Clause = clause.into_iter().filter(|&l| l != false_lit).collect();
            if filtered.is_empty() {
                collapsed = true;
                break;
            }
            out.push(filtered);
        }
        self.clauses = if collapsed { vec![Vec::new()] } else { out };
    }

    /// Tseitin negation: for each clause of length > 1, allocates a fresh
    /// TMP variable `t` and emits `(¬t ∨ ¬l)` for every literal `l` in the
    /// clause; unit clauses contribute their negated literal directly; a
    /// final clause contains all the `t`s (and the negated unit literals).
    /// Equisatisfiable to the negation of `self` over the original
    /// variables, valid for use in any outer existential context over the
    /// introduced TMP variables (spec §4.1).
    pub fn negate(&self, vm: &mut VarManager) -> Cnf {
        let mut result = Cnf::new();
        let mut final_clause: Clause = Vec::new();
        for clause in &self.clauses {
            if clause.len() <= 1 {
                if let Some(&lit) = clause.first() {
                    final_clause.push(-lit);
                }
                // an empty clause (already UNSAT) contributes nothing:
                // its negation is TRUE and drops out of the disjunction.
                continue;
            }
            let t = vm.create_fresh_tmp() as i32;
            for &lit in clause {
                result.add2(-t, -lit);
            }
            final_clause.push(t);
        }
        if final_clause.is_empty() {
            // negating TRUE (the empty CNF) yields FALSE.
            result.add_clause(Vec::new());
        } else {
            result.add_clause(final_clause);
        }
        result
    }

    pub fn get_clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn nr_of_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn nr_of_lits(&self) -> usize {
        self.clauses.iter().map(|c| c.len()).sum()
    }

    pub fn max_var_used(&self) -> u32 {
        self.clauses
            .iter()
            .flat_map(|c| c.iter())
            .map(|l| l.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Purely syntactic check: every clause must contain at least one
    /// literal also in `cube`. No solver is invoked.
    pub fn is_sat_by(&self, cube: &[Literal]) -> bool {
        let set: HashSet<Literal> = cube.iter().copied().collect();
        self.clauses.iter().all(|clause| clause.iter().any(|l| set.contains(l)))
    }

    /// Serializes to DIMACS: header `p cnf <maxvar> <nclauses>`, clauses
    /// terminated by `0`.
    pub fn to_dimacs(&self, max_var: u32) -> String {
        let mut out = format!("p cnf {} {}\n", max_var, self.clauses.len());
        for clause in &self.clauses {
            for lit in clause {
                out.push_str(&lit.to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

/// `true` if every literal of `b` occurs in `a` (`a` is a multiset-superset
/// of `b`).
fn is_superset(a: &[Literal], b: &[Literal]) -> bool {
    b.iter().all(|lit| a.contains(lit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::VarKind;

    #[test]
    fn empty_cnf_is_sat_by_anything() {
        let cnf = Cnf::new();
        assert!(cnf.is_sat_by(&[]));
        assert!(cnf.is_sat_by(&[1, -2]));
        assert_eq!(cnf.nr_of_clauses(), 0);
    }

    #[test]
    fn single_empty_clause_is_unsat_by_anything() {
        let mut cnf = Cnf::new();
        cnf.add_clause(Vec::new());
        assert!(!cnf.is_sat_by(&[1, 2, 3]));
    }

    #[test]
    fn set_var_value_collapses_on_empty_unit_conflict() {
        let mut cnf = Cnf::new();
        cnf.add1(1);
        cnf.set_var_value(1, false);
        assert_eq!(cnf.get_clauses(), &[Vec::<i32>::new()]);
    }

    #[test]
    fn set_var_value_removes_satisfied_and_shrinks_others() {
        let mut cnf = Cnf::new();
        cnf.add2(1, 2);
        cnf.add2(-1, 3);
        cnf.set_var_value(1, true);
        assert_eq!(cnf.get_clauses(), &[vec![3]]);
    }

    #[test]
    fn simplify_is_idempotent() {
        let mut cnf = Cnf::new();
        cnf.add2(1, 2);
        cnf.add3(1, 2, 3);
        cnf.add1(1);
        cnf.simplify();
        let once = cnf.clone();
        cnf.simplify();
        assert_eq!(once, cnf);
        assert_eq!(cnf.nr_of_clauses(), 1);
    }

    #[test]
    fn add_clause_and_simplify_reports_removal() {
        let mut cnf = Cnf::new();
        cnf.add3(1, 2, 3);
        let removed = cnf.add_clause_and_simplify(vec![1, 2]);
        assert!(removed);
        assert_eq!(cnf.nr_of_clauses(), 1);
        let removed2 = cnf.add_clause_and_simplify(vec![4, 5]);
        assert!(!removed2);
        assert_eq!(cnf.nr_of_clauses(), 2);
    }

    #[test]
    fn remove_duplicates_sorts_and_dedups() {
        let mut cnf = Cnf::new();
        cnf.add_clause(vec![2, 1]);
        cnf.add_clause(vec![1, 2]);
        cnf.remove_duplicates();
        assert_eq!(cnf.nr_of_clauses(), 1);
        assert_eq!(cnf.get_clauses(), &[vec![1, 2]]);
        let mut again = cnf.clone();
        again.remove_duplicates();
        assert_eq!(again, cnf);
    }

    #[test]
    fn swap_present_next_round_trips() {
        let mut vm = VarManager::new();
        let (s_pres, s_next) = vm.create_state_pair("s");
        let u = vm.create(VarKind::Input, "u");
        let mut cnf = Cnf::new();
        cnf.add2(s_pres as i32, -(u as i32));
        let original = cnf.clone();
        cnf.swap_present_next(&vm);
        assert_eq!(cnf.get_clauses(), &[vec![s_next as i32, -(u as i32)]]);
        cnf.swap_present_next(&vm);
        assert_eq!(cnf, original);
    }

    #[test]
    fn negate_round_trip_on_total_assignments() {
        let mut vm = VarManager::new();
        vm.create(VarKind::Ctrl, "a");
        vm.create(VarKind::Ctrl, "b");
        let mut cnf = Cnf::new();
        cnf.add2(1, 2);
        cnf.add2(-1, -2);
        let neg = cnf.negate(&mut vm);
        // sigma = {1: true, 2: true} satisfies cnf (1 or 2) and (-1 or -2)? -> true,true: (1 or 2)=T, (-1 or -2)=F
        assert!(!cnf.is_sat_by(&[1, 2]));
        // its negation must be satisfiable when extended over the TMP vars.
        // t1 <-> (1 v 2) is false is impossible since it's syntactic; check via brute solver is out
        // of scope here, so we only check structural shape: one tmp per >1-len clause.
        assert_eq!(neg.nr_of_clauses(), 2 /* tseitin defs for clause 1 */ + 2 + 1);
    }
}
