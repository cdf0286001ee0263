//! Template-based winning-region synthesis (C6), grounded on
//! `original_source/tool/src/TemplateSynth.h`/`.cpp` and spec §4.6: search
//! for a CNF or AND-network parameterization `W(x,k)` of the winning
//! region, either in one QBF shot or via SAT-based CEGIS, growing the
//! template size on failure.
//!
//! The shared machinery (the growth schedule, the CNF-implication
//! encoding used to build the synthesis query, and the two resolution
//! loops) lives here; the two concrete template shapes are
//! [`cnf_template::CnfTemplate`] and [`and_network::AndNetworkTemplate`].

pub mod and_network;
pub mod cnf_template;

use crate::cnf::{Clause, Cnf, Literal};
use crate::errors::Result;
use crate::qbf::prefix_from_kinds;
use crate::qdimacs::Quant;
use crate::sat::Sat;
use crate::vars::{Var, VarKind, VarManager};
use std::collections::HashMap;

/// A winning-region template parameterization (spec §4.6). `TemplParam`
/// variables are allocated once at [`Template::new`] and shared across
/// every `instantiate` call (present-state, next-state, or a renamed
/// CEGIS counterexample copy); everything else `instantiate` needs is
/// allocated fresh per call.
pub trait Template: Sized {
    fn new(vm: &mut VarManager, size: usize, state_vars: &[Var]) -> Self;

    /// Instantiates the template's defining formula over `vars` (a list
    /// the same length as the `state_vars` given to [`Template::new`],
    /// positionally corresponding) — present-state, next-state, or a
    /// fresh renamed copy, depending on the caller. Does not include the
    /// fixed `¬error` conjunct; callers add that themselves (spec
    /// §4.6's "a fixed clause ¬error is always added").
    fn instantiate(&self, vm: &mut VarManager, vars: &[Var]) -> Cnf;

    /// Every `TemplParam` variable owned by this template.
    fn param_vars(&self) -> Vec<Var>;

    /// Extracts a concrete winning-region CNF from a (possibly partial)
    /// model over [`Template::param_vars`], per spec §4.6's "extracting W
    /// from k". `error_var` is the registry's `pres_error_var`.
    fn extract_w(&self, model: &[Literal], error_var: Var) -> Cnf;
}

/// The fixed transition-system relation the engines solve against,
/// independent of the AIGER front-end that produced it (kept out of
/// `synth`'s dependency surface so the engine is testable without an
/// AIGER parser).
pub struct GameRelation<'a> {
    pub t: &'a Cnf,
    pub i: &'a Cnf,
    pub e: &'a Cnf,
    pub not_e: &'a Cnf,
    /// Every variable id in `1..=ambient_max_var` belongs to the fixed
    /// transition system (allocated before any template or solve-time
    /// variable exists) and must be renamed wholesale when CEGIS mode
    /// specializes the universally-quantified verification formula to
    /// one counterexample (spec §4.6 "renamed copy of the constraints").
    pub ambient_max_var: Var,
}

/// `N = 1, 2, 3, 4` then doubling, capped at `2^(|states|-1)` (spec
/// §4.6's growth schedule, shared between the CNF and AND-network
/// templates).
pub struct GrowthSchedule {
    next: usize,
    cap: usize,
    done: bool,
}

impl GrowthSchedule {
    pub fn new(cap: usize) -> Self {
        GrowthSchedule {
            next: 1,
            cap: cap.max(1),
            done: false,
        }
    }
}

impl Iterator for GrowthSchedule {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let current = self.next.min(self.cap);
        if current == self.cap {
            self.done = true;
        } else {
            self.next = if self.next < 4 { self.next + 1 } else { self.next * 2 };
        }
        Some(current)
    }
}

/// `2^(num_states - 1)`, saturating, per spec §4.6's growth-schedule cap.
pub fn growth_cap(num_states: usize) -> usize {
    1usize.saturating_shl(num_states.saturating_sub(1) as u32).max(1)
}

/// Reifies `v ↔ (c_1 ∧ c_2 ∧ … ∧ c_n)` where each `c_i` is itself a
/// clause (disjunction of literals): `v → c_i` is the clause `c_i` with
/// `¬v` appended; `c_i → v` is, per-literal, `(¬ℓ ∨ v)` (since OR
/// distributes over the implication's right side). A fresh TMP variable
/// is allocated for `v`.
pub fn reify_and(vm: &mut VarManager, clauses: &[Clause]) -> (Var, Cnf) {
    let v = vm.create_fresh_tmp();
    let mut defs = Cnf::new();
    for clause in clauses {
        // v -> c_i
        let mut tc: Clause = vec![-(v as i32)];
        tc.extend(clause.iter().copied());
        defs.add_clause(tc);
        // c_i -> v, per literal: OR distributes over AND, so
        // (l_1 ∨ … ∨ l_m) -> v is (¬l_1 ∨ v) ∧ … ∧ (¬l_m ∨ v).
        for &lit in clause {
            defs.add2(-lit, v as i32);
        }
    }
    (v, defs)
}

/// `v ↔ (a ⊕ b)`, the standard 4-clause Tseitin XOR encoding.
pub fn reify_xor(vm: &mut VarManager, a: Literal, b: Literal) -> (Var, Cnf) {
    let v = vm.create_fresh_tmp();
    let vi = v as i32;
    let mut defs = Cnf::new();
    defs.add3(-vi, -a, -b);
    defs.add3(-vi, a, b);
    defs.add3(vi, -a, b);
    defs.add3(vi, a, -b);
    (v, defs)
}

/// `antecedent → consequent`, both given as CNFs, encoded as a CNF valid
/// in an outer existential context over the TMP variables it introduces
/// — the same shape as [`crate::cnf::Cnf::negate`] (distribute `¬A` as a
/// Tseitin-negated clause, but instead of closing the final disjunction
/// alone, add each clause of `consequent` to it in turn: `¬A ∨ B =
/// AND_j(¬A ∨ b_j)`).
pub fn implies_cnf(antecedent: &Cnf, consequent: &Cnf, vm: &mut VarManager) -> Cnf {
    let mut result = Cnf::new();
    let mut base: Clause = Vec::new();
    for clause in antecedent.get_clauses() {
        if clause.len() <= 1 {
            if let Some(&lit) = clause.first() {
                base.push(-lit);
            }
            continue;
        }
        let t = vm.create_fresh_tmp() as i32;
        for &lit in clause {
            result.add2(-t, -lit);
        }
        base.push(t);
    }
    if consequent.get_clauses().is_empty() {
        return result;
    }
    for clause in consequent.get_clauses() {
        let mut combined = base.clone();
        combined.extend(clause.iter().copied());
        result.add_clause(combined);
    }
    result
}

/// `template.instantiate(vars) ∧ ¬error_at(vars)` — the "fixed ¬error
/// clause is always added" rule of spec §4.6.
fn template_cnf_at<T: Template>(template: &T, vm: &mut VarManager, vars: &[Var], error_var: Var) -> Cnf {
    let mut c = template.instantiate(vm, vars);
    c.add1(-(error_var as i32));
    c
}

fn fix_params(cnf: &Cnf, model: &[Literal]) -> Cnf {
    let mut c = cnf.clone();
    for &lit in model {
        c.set_var_value(lit.unsigned_abs(), lit > 0);
    }
    c
}

fn fresh_rename_map(vm: &mut VarManager, ambient_max_var: Var) -> HashMap<Var, Var> {
    let mut map = HashMap::with_capacity(ambient_max_var as usize);
    for v in 1..=ambient_max_var {
        let kind = vm.kind_of(v);
        let fresh = vm.create(kind, format!("r{v}"));
        map.insert(v, fresh);
    }
    map
}

fn apply_rename(lits: &[Literal], map: &HashMap<Var, Var>) -> Vec<Literal> {
    lits.iter()
        .map(|&l| {
            let v = l.unsigned_abs();
            let nv = map[&v] as i32;
            if l < 0 {
                -nv
            } else {
                nv
            }
        })
        .collect()
}

/// The QBF one-shot resolution mode (spec §4.6): a single `is_sat_model`
/// call per template size with prefix `∃k.∀x,u.∃c,x',tmp`.
pub fn synthesize_qbf<T: Template>(
    vm: &mut VarManager,
    game: &GameRelation,
    qbf: &mut dyn crate::qbf::Qbf,
) -> Result<Option<(Cnf, Cnf)>> {
    let state_vars: Vec<Var> = vm.vars_of_kind(VarKind::PresState)[1..].to_vec();
    let error_var = vm.pres_error_var();
    let cap = growth_cap(vm.vars_of_kind(VarKind::PresState).len());
    for size in GrowthSchedule::new(cap) {
        let template = T::new(vm, size, &state_vars);
        let next_vars: Vec<Var> = state_vars.iter().map(|&v| vm.swapped(v)).collect();
        let error_next = vm.next_error_var();
        let w1 = template_cnf_at(&template, vm, &state_vars, error_var);
        let w2 = template_cnf_at(&template, vm, &next_vars, error_next);
        let c1 = implies_cnf(game.i, &w1, vm);
        let mut rhs = Cnf::new();
        rhs.add_cnf(game.t);
        rhs.add_cnf(&w2);
        let c2 = implies_cnf(&w1, &rhs, vm);
        let mut phi = Cnf::new();
        phi.add_cnf(&c1);
        phi.add_cnf(&c2);

        let max_var = vm.max_var();
        let mut prefix = vec![(Quant::Exists, template.param_vars())];
        prefix.extend(prefix_from_kinds(
            vm,
            &[
                (VarKind::PresState, Quant::ForAll),
                (VarKind::Input, Quant::ForAll),
                (VarKind::Ctrl, Quant::Exists),
                (VarKind::NextState, Quant::Exists),
                (VarKind::Tmp, Quant::Exists),
            ],
        ));
        let mut model = Vec::new();
        if qbf.is_sat_model(&prefix, &phi, max_var, &mut model)? {
            let w = template.extract_w(&model, error_var);
            let not_w = w.negate(vm);
            return Ok(Some((w, not_w)));
        }
        tracing::debug!(target: "debug", size, "QBF template synthesis UNSAT, growing");
    }
    Ok(None)
}

/// Bound on how many counterexamples CEGIS excludes at a single template
/// size before giving up and growing (a defensive cap; spec §8's
/// "template CEGIS progress" property only requires each iteration to add
/// a new counterexample, not that the loop is unbounded).
const MAX_CEGIS_ITERS: usize = 64;
const MAX_GENERALIZE_RETRIES: usize = 16;

/// The SAT-based CEGIS resolution mode (spec §4.6). `new_sat` is called
/// to create each of the candidate/verifier/generalizer sessions; the
/// candidate session is long-lived across counterexamples at a given
/// template size, the verifier/generalizer are rebuilt fresh per
/// candidate.
pub fn synthesize_cegis<T: Template>(
    vm: &mut VarManager,
    game: &GameRelation,
    new_sat: &mut dyn FnMut() -> Box<dyn Sat>,
) -> Result<Option<(Cnf, Cnf)>> {
    let state_vars: Vec<Var> = vm.vars_of_kind(VarKind::PresState)[1..].to_vec();
    let error_var = vm.pres_error_var();
    let cap = growth_cap(vm.vars_of_kind(VarKind::PresState).len());
    for size in GrowthSchedule::new(cap) {
        let template = T::new(vm, size, &state_vars);
        if let Some(result) =
            try_cegis_at_size(vm, game, &template, &state_vars, error_var, new_sat)?
        {
            return Ok(Some(result));
        }
        tracing::debug!(target: "debug", size, "CEGIS exhausted at this template size, growing");
    }
    Ok(None)
}

fn try_cegis_at_size<T: Template>(
    vm: &mut VarManager,
    game: &GameRelation,
    template: &T,
    state_vars: &[Var],
    error_var: Var,
    new_sat: &mut dyn FnMut() -> Box<dyn Sat>,
) -> Result<Option<(Cnf, Cnf)>> {
    let param_vars = template.param_vars();
    let next_vars: Vec<Var> = state_vars.iter().map(|&v| vm.swapped(v)).collect();
    let error_next = vm.next_error_var();

    let w1 = template_cnf_at(template, vm, state_vars, error_var);
    let w2 = template_cnf_at(template, vm, &next_vars, error_next);
    let c1 = implies_cnf(game.i, &w1, vm);
    let mut rhs = Cnf::new();
    rhs.add_cnf(game.t);
    rhs.add_cnf(&w2);
    let c2 = implies_cnf(&w1, &rhs, vm);

    let mut candidate = new_sat();
    candidate.start(&param_vars, false);
    candidate.add_cnf(&c1);
    candidate.add_cnf(&c2);

    let input_vars = vm.vars_of_kind(VarKind::Input).to_vec();
    let ctrl_vars = vm.vars_of_kind(VarKind::Ctrl).to_vec();

    for _ in 0..MAX_CEGIS_ITERS {
        if !candidate.is_sat_assuming(&[]) {
            return Ok(None);
        }
        let mut k_model = Vec::new();
        candidate.is_sat_model_or_core(&[], &param_vars, &mut k_model);

        let w1_fixed = fix_params(&w1, &k_model);
        let w2_fixed = fix_params(&w2, &k_model);

        let mut verifier = new_sat();
        verifier.start(&[], false);
        verifier.add_cnf(&w1_fixed);
        verifier.add_cnf(game.t);
        let not_w2 = w2_fixed.negate(vm);
        verifier.add_cnf(&not_w2);

        let mut witness_project = state_vars.to_vec();
        witness_project.extend(input_vars.iter().copied());
        witness_project.extend(ctrl_vars.iter().copied());

        let mut excluded_cube: Option<(Vec<Literal>, Vec<Literal>)> = None;
        for _ in 0..MAX_GENERALIZE_RETRIES {
            let mut witness = Vec::new();
            if !verifier.is_sat_model_or_core(&[], &witness_project, &mut witness) {
                // w1 -> (T ∧ w2) holds for every (x, u): this k works.
                let w_final = template.extract_w(&k_model, error_var);
                let not_w = w_final.negate(vm);
                return Ok(Some((w_final, not_w)));
            }
            let x0: Vec<Literal> = witness
                .iter()
                .copied()
                .filter(|&l| state_vars.contains(&l.unsigned_abs()))
                .collect();
            let u0: Vec<Literal> = witness
                .iter()
                .copied()
                .filter(|&l| input_vars.contains(&l.unsigned_abs()))
                .collect();
            let c0: Vec<Literal> = witness
                .iter()
                .copied()
                .filter(|&l| ctrl_vars.contains(&l.unsigned_abs()))
                .collect();

            let mut generalizer = new_sat();
            generalizer.start(&[], false);
            generalizer.add_cnf(game.t);
            generalizer.add_cnf(&w1_fixed);
            generalizer.add_cnf(&w2_fixed);
            let mut assumptions = x0.clone();
            assumptions.extend(u0.iter().copied());
            let mut core = Vec::new();
            let gen_sat = generalizer.is_sat_model_or_core(&assumptions, &ctrl_vars, &mut core);
            if gen_sat {
                // a working response exists for this (x0, u0) after all;
                // the verifier's witness (x0, u0, c0) was spurious, block
                // just that transition and retry the verifier.
                let block: Vec<Literal> = x0
                    .iter()
                    .chain(u0.iter())
                    .chain(c0.iter())
                    .map(|&l| -l)
                    .collect();
                verifier.add_clause(&block);
                continue;
            }
            excluded_cube = Some((x0, u0));
            break;
        }

        let (x0, u0) = match excluded_cube {
            Some(pair) => pair,
            None => {
                // generalizer kept finding spurious witnesses; give up at
                // this size rather than loop forever.
                return Ok(None);
            }
        };

        let renamed = build_renamed_counterexample(vm, game, template, state_vars, error_var, &x0, &u0);
        candidate.add_cnf(&renamed);
    }
    Ok(None)
}

/// Builds the renamed, (x0, u0)-specialized copy of the synthesis
/// constraints added to the candidate session on each counterexample
/// (spec §4.6): every ambient transition-system variable is re-allocated
/// fresh (sharing only the template's `k` parameters), and the
/// counterexample is pinned via unit clauses on the renamed copies of
/// the state/input variables.
fn build_renamed_counterexample<T: Template>(
    vm: &mut VarManager,
    game: &GameRelation,
    template: &T,
    state_vars: &[Var],
    error_var: Var,
    x0: &[Literal],
    u0: &[Literal],
) -> Cnf {
    let rename = fresh_rename_map(vm, game.ambient_max_var);

    let mut t_r = game.t.clone();
    t_r.rename(&rename);
    let mut i_r = game.i.clone();
    i_r.rename(&rename);

    let renamed_pres: Vec<Var> = state_vars.iter().map(|v| rename[v]).collect();
    let renamed_next: Vec<Var> = state_vars
        .iter()
        .map(|&v| rename[&vm.swapped(v)])
        .collect();
    let error_pres_r = rename[&error_var];
    let error_next_r = rename[&vm.swapped(error_var)];

    let w1_r = template_cnf_at(template, vm, &renamed_pres, error_pres_r);
    let w2_r = template_cnf_at(template, vm, &renamed_next, error_next_r);
    let c1 = implies_cnf(&i_r, &w1_r, vm);
    let mut rhs = Cnf::new();
    rhs.add_cnf(&t_r);
    rhs.add_cnf(&w2_r);
    let c2 = implies_cnf(&w1_r, &rhs, vm);

    let mut result = Cnf::new();
    result.add_cnf(&c1);
    result.add_cnf(&c2);
    result.add_cube(&apply_rename(x0, &rename));
    result.add_cube(&apply_rename(u0, &rename));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_schedule_matches_spec_sequence() {
        let sizes: Vec<usize> = GrowthSchedule::new(growth_cap(10)).take(7).collect();
        assert_eq!(sizes, vec![1, 2, 3, 4, 8, 16, 32]);
    }

    #[test]
    fn growth_schedule_respects_cap() {
        let sizes: Vec<usize> = GrowthSchedule::new(3).collect();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn implies_cnf_is_trivial_when_consequent_is_true() {
        let mut vm = VarManager::new();
        vm.create(VarKind::Ctrl, "a");
        let mut antecedent = Cnf::new();
        antecedent.add1(1);
        let consequent = Cnf::new();
        let result = implies_cnf(&antecedent, &consequent, &mut vm);
        assert_eq!(result.nr_of_clauses(), 0);
    }

    #[test]
    fn reify_xor_structurally_defines_four_clauses() {
        let mut vm = VarManager::new();
        vm.create(VarKind::Ctrl, "a");
        vm.create(VarKind::Ctrl, "b");
        let (_v, defs) = reify_xor(&mut vm, 1, 2);
        assert_eq!(defs.nr_of_clauses(), 4);
    }
}
