//! The AND-network winning-region template (spec §4.6): a chain of `N`
//! AND-gates, gate `g` free to wire in any non-error state variable or
//! the output of an earlier gate, each candidate input guarded by a
//! `used`/`negated` parameter pair; a final polarity parameter flips the
//! network's overall output.

use super::{reify_and, reify_xor, Template};
use crate::cnf::{Cnf, Literal};
use crate::vars::{Var, VarManager};

struct GateParams {
    used: Vec<Var>,
    negated: Vec<Var>,
}

pub struct AndNetworkTemplate {
    state_vars: Vec<Var>,
    gates: Vec<GateParams>,
    output_polarity: Var,
}

impl Template for AndNetworkTemplate {
    fn new(vm: &mut VarManager, size: usize, state_vars: &[Var]) -> Self {
        let mut gates = Vec::with_capacity(size);
        for g in 0..size {
            let n_inputs = state_vars.len() + g;
            let mut used = Vec::with_capacity(n_inputs);
            let mut negated = Vec::with_capacity(n_inputs);
            for _ in 0..n_inputs {
                used.push(vm.create_fresh_template_param());
                negated.push(vm.create_fresh_template_param());
            }
            gates.push(GateParams { used, negated });
        }
        let output_polarity = vm.create_fresh_template_param();
        AndNetworkTemplate {
            state_vars: state_vars.to_vec(),
            gates,
            output_polarity,
        }
    }

    fn instantiate(&self, vm: &mut VarManager, vars: &[Var]) -> Cnf {
        assert_eq!(vars.len(), self.state_vars.len());
        let mut cnf = Cnf::new();
        let mut gate_out: Vec<Var> = Vec::with_capacity(self.gates.len());
        for params in &self.gates {
            let mut inputs: Vec<i32> = vars.iter().map(|&v| v as i32).collect();
            inputs.extend(gate_out.iter().map(|&v| v as i32));
            let mut body_clauses: Vec<Vec<Literal>> = Vec::with_capacity(inputs.len());
            for (idx, &inp) in inputs.iter().enumerate() {
                let (xor_v, xor_defs) = reify_xor(vm, inp, params.negated[idx] as i32);
                cnf.add_cnf(&xor_defs);
                // used -> (input wire, possibly flipped): a single clause,
                // matching the CNF template's per-slot implication shape.
                body_clauses.push(vec![-(params.used[idx] as i32), xor_v as i32]);
            }
            let (out_v, out_defs) = reify_and(vm, &body_clauses);
            cnf.add_cnf(&out_defs);
            gate_out.push(out_v);
        }
        if let Some(&last_gate) = gate_out.last() {
            let (final_v, final_defs) = reify_xor(vm, last_gate as i32, self.output_polarity as i32);
            cnf.add_cnf(&final_defs);
            cnf.add1(final_v as i32);
        }
        cnf
    }

    fn param_vars(&self) -> Vec<Var> {
        let mut v = Vec::new();
        for gate in &self.gates {
            v.extend(gate.used.iter().copied());
            v.extend(gate.negated.iter().copied());
        }
        v.push(self.output_polarity);
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
        // With every parameter concrete, each gate collapses to a plain
        // conjunction of (possibly negated) state-var literals: a
        // reference to an earlier gate contributes that gate's own
        // flattened literal set, negated as a whole when `negated` is
        // set for that wire. Associativity of AND keeps the network's
        // overall value a single cube over present-state variables —
        // the only shape a fixed-parameter AND-network can produce
        // without reintroducing auxiliary (non-state) variables into W.
        let mut gate_literals: Vec<Vec<Literal>> = Vec::with_capacity(self.gates.len());
        for params in &self.gates {
            let mut lits: Vec<Literal> = Vec::new();
            for (idx, &used_param) in params.used.iter().enumerate() {
                if !val(used_param) {
                    continue;
                }
                let negate = val(params.negated[idx]);
                if idx < self.state_vars.len() {
                    let v = self.state_vars[idx] as i32;
                    lits.push(if negate { -v } else { v });
                } else {
                    let prior = idx - self.state_vars.len();
                    for &l in &gate_literals[prior] {
                        lits.push(if negate { -l } else { l });
                    }
                }
            }
            gate_literals.push(lits);
        }
        let mut cube = gate_literals.last().cloned().unwrap_or_default();
        if val(self.output_polarity) {
            cube = cube.iter().map(|&l| -l).collect();
        }
        cube.sort_unstable();
        cube.dedup();

        let mut w = Cnf::new();
        if !cube.is_empty() {
            w.add_cube(&cube);
        }
        w.add1(-(error_var as i32));
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_gate_instantiates_with_definitional_clauses() {
        let mut vm = VarManager::new();
        let (err, _) = vm.create_state_pair("err");
        let (s1, _) = vm.create_state_pair("s1");
        let _ = err;
        let template = AndNetworkTemplate::new(&mut vm, 1, &[s1]);
        let cnf = template.instantiate(&mut vm, &[s1]);
        assert!(cnf.nr_of_clauses() > 0);
    }

    #[test]
    fn extract_w_with_used_state_var_yields_cube_plus_error_clause() {
        let mut vm = VarManager::new();
        let (err, _) = vm.create_state_pair("err");
        let (s1, _) = vm.create_state_pair("s1");
        let template = AndNetworkTemplate::new(&mut vm, 1, &[s1]);
        let used = template.gates[0].used[0];
        let negated = template.gates[0].negated[0];
        let model = vec![used as i32, -(negated as i32), -(template.output_polarity as i32)];
        let w = template.extract_w(&model, err);
        assert_eq!(w.nr_of_clauses(), 2);
    }
}
