//! The CNF winning-region template (spec §4.6): width-`N`, one slot per
//! clause, each slot carrying an `active` parameter and, per state
//! variable, an `include`/`polarity` parameter pair.

use super::{reify_and, reify_xor, Template};
use crate::cnf::{Cnf, Literal};
use crate::vars::{Var, VarManager};

pub struct CnfTemplate {
    state_vars: Vec<Var>,
    active: Vec<Var>,
    include: Vec<Vec<Var>>,
    polarity: Vec<Vec<Var>>,
}

impl Template for CnfTemplate {
    fn new(vm: &mut VarManager, size: usize, state_vars: &[Var]) -> Self {
        let mut active = Vec::with_capacity(size);
        let mut include = Vec::with_capacity(size);
        let mut polarity = Vec::with_capacity(size);
        for _ in 0..size {
            active.push(vm.create_fresh_template_param());
            let mut inc_row = Vec::with_capacity(state_vars.len());
            let mut pol_row = Vec::with_capacity(state_vars.len());
            for _ in state_vars {
                inc_row.push(vm.create_fresh_template_param());
                pol_row.push(vm.create_fresh_template_param());
            }
            include.push(inc_row);
            polarity.push(pol_row);
        }
        CnfTemplate {
            state_vars: state_vars.to_vec(),
            active,
            include,
            polarity,
        }
    }

    fn instantiate(&self, vm: &mut VarManager, vars: &[Var]) -> Cnf {
        assert_eq!(vars.len(), self.state_vars.len());
        let mut cnf = Cnf::new();
        for i in 0..self.active.len() {
            let mut body: Vec<Literal> = Vec::with_capacity(vars.len());
            for j in 0..vars.len() {
                let (xor_v, xor_defs) = reify_xor(vm, vars[j] as i32, self.polarity[i][j] as i32);
                cnf.add_cnf(&xor_defs);
                let (act_v, act_defs) =
                    reify_and(vm, &[vec![self.include[i][j] as i32], vec![xor_v as i32]]);
                cnf.add_cnf(&act_defs);
                body.push(act_v as i32);
            }
            let mut clause = vec![-(self.active[i] as i32)];
            clause.extend(body);
            cnf.add_clause(clause);
        }
        cnf
    }

    fn param_vars(&self) -> Vec<Var> {
        let mut v = self.active.clone();
        for row in &self.include {
            v.extend(row.iter().copied());
        }
        for row in &self.polarity {
            v.extend(row.iter().copied());
        }
        v
    }

    fn extract_w(&self, model: &[Literal], error_var: Var) -> Cnf {
        let val = |v: Var| -> bool {
            model
                .iter()
                .find(|&&l| l.unsigned_abs() == v)
                .map(|&l| l > 0)
                .unwrap_or(false)
        };
        let mut w = Cnf::new();
        for i in 0..self.active.len() {
            if !val(self.active[i]) {
                continue;
            }
            let mut clause = Vec::new();
            for j in 0..self.state_vars.len() {
                if !val(self.include[i][j]) {
                    continue;
                }
                let v = self.state_vars[j] as i32;
                clause.push(if val(self.polarity[i][j]) { -v } else { v });
            }
            // An active slot with no included literals would add an
            // empty (always-false) clause, forcing W unsatisfiable —
            // not a shape any sound candidate should produce, but skip
            // it defensively rather than corrupt the extracted region.
            if !clause.is_empty() {
                w.add_clause(clause);
            }
        }
        w.add1(-(error_var as i32));
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::VarKind;

    #[test]
    fn instantiate_produces_one_clause_per_slot() {
        let mut vm = VarManager::new();
        let (s0, _) = vm.create_state_pair("err");
        let (s1, _) = vm.create_state_pair("s1");
        let _ = s0;
        let template = CnfTemplate::new(&mut vm, 2, &[s1]);
        let cnf = template.instantiate(&mut vm, &[s1]);
        // each slot's top-level implication clause, plus the reify_and/xor
        // definitional clauses behind it.
        assert!(cnf.nr_of_clauses() >= 2);
    }

    #[test]
    fn extract_w_skips_inactive_slots_and_reattaches_error() {
        let mut vm = VarManager::new();
        let (err, _) = vm.create_state_pair("err");
        let (s1, _) = vm.create_state_pair("s1");
        let template = CnfTemplate::new(&mut vm, 1, &[s1]);
        let active = template.active[0];
        let include = template.include[0][0];
        let polarity = template.polarity[0][0];
        let model = vec![active as i32, include as i32, -(polarity as i32)];
        let w = template.extract_w(&model, err);
        assert_eq!(w.nr_of_clauses(), 2);
        assert!(w.get_clauses().iter().any(|c| c == &vec![s1 as i32]));
        assert!(w
            .get_clauses()
            .iter()
            .any(|c| c == &vec![-(err as i32)]));
    }

    #[test]
    fn extract_w_empty_model_yields_only_fixed_error_clause() {
        let mut vm = VarManager::new();
        let (err, _) = vm.create_state_pair("err");
        let (_, _) = vm.create_state_pair("s1");
        let s1 = *vm.vars_of_kind(VarKind::PresState).last().unwrap();
        let template = CnfTemplate::new(&mut vm, 1, &[s1]);
        let w = template.extract_w(&[], err);
        assert_eq!(w.nr_of_clauses(), 1);
    }
}
