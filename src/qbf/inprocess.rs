//! In-process QBF backend (spec §4.4 "feeds the QBF solver through its
//! linking API"). No maintained Rust crate links a QBF solver in-process
//! the way `cadical` links CaDiCaL, so this backend is a self-contained
//! reference decision procedure: it recursively eliminates quantifier
//! blocks by brute-force enumeration, delegating the innermost
//! existential context (the implicitly-quantified Tseitin/auxiliary
//! suffix, per spec §9) to [`crate::sat::naive::SimpleSat`]. It is sound
//! and complete but exponential, so it is meant for modest instances —
//! the template sizes spec §4.6's CNF/AND-network templates start at —
//! and for engine tests; large instances should use [`super::external`].

use super::{leading_existential_split, Qbf};
use crate::cnf::{Cnf, Literal};
use crate::errors::Result;
use crate::qdimacs::{Prefix, Quant};
use crate::sat::naive::SimpleSat;
use crate::sat::Sat;
use crate::vars::Var;

const MAX_BRUTE_FORCE_VARS: usize = 22;

#[derive(Default)]
pub struct NaiveQbf;

impl NaiveQbf {
    pub fn new() -> Self {
        NaiveQbf
    }
}

fn decide_rec(prefix: &[(Quant, Vec<Var>)], cnf: &Cnf) -> bool {
    match prefix.split_first() {
        None => {
            let mut sat = SimpleSat::new();
            sat.start(&[], false);
            sat.add_cnf(cnf);
            sat.is_sat_assuming(&[])
        }
        Some(((quant, vars), rest)) => {
            assert!(
                vars.len() <= MAX_BRUTE_FORCE_VARS,
                "NaiveQbf brute-force block capped at {MAX_BRUTE_FORCE_VARS} variables"
            );
            let n = vars.len();
            for mask in 0..(1u64 << n) {
                let mut branch = cnf.clone();
                for (i, &v) in vars.iter().enumerate() {
                    branch.set_var_value(v, (mask >> i) & 1 == 1);
                }
                let r = decide_rec(rest, &branch);
                match quant {
                    Quant::Exists if r => return true,
                    Quant::ForAll if !r => return false,
                    _ => {}
                }
            }
            matches!(quant, Quant::ForAll)
        }
    }
}

impl Qbf for NaiveQbf {
    fn is_sat(&mut self, prefix: &Prefix, cnf: &Cnf, _max_var: Var) -> Result<bool> {
        Ok(decide_rec(prefix, cnf))
    }

    fn is_sat_model(
        &mut self,
        prefix: &Prefix,
        cnf: &Cnf,
        _max_var: Var,
        model: &mut Vec<Literal>,
    ) -> Result<bool> {
        model.clear();
        let (lead_vars, rest) = leading_existential_split(prefix);
        assert!(
            lead_vars.len() <= MAX_BRUTE_FORCE_VARS,
            "NaiveQbf brute-force block capped at {MAX_BRUTE_FORCE_VARS} variables"
        );
        let n = lead_vars.len();
        for mask in 0..(1u64 << n) {
            let mut branch = cnf.clone();
            for (i, &v) in lead_vars.iter().enumerate() {
                branch.set_var_value(v, (mask >> i) & 1 == 1);
            }
            if decide_rec(rest, &branch) {
                for (i, &v) in lead_vars.iter().enumerate() {
                    let bit = (mask >> i) & 1 == 1;
                    // check whether flipping v alone still satisfies the
                    // remainder: if so the preprocessor would report
                    // DONTCARE and we omit v from the cube (spec §4.4).
                    let mut flipped = cnf.clone();
                    for (j, &v2) in lead_vars.iter().enumerate() {
                        let b2 = if j == i { !bit } else { (mask >> j) & 1 == 1 };
                        flipped.set_var_value(v2, b2);
                    }
                    if !decide_rec(rest, &flipped) {
                        model.push(if bit { v as i32 } else { -(v as i32) });
                    }
                }
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdimacs::Quant;

    #[test]
    fn exists_forall_exists_basic() {
        // forall x exists y: x <-> y   (true)
        let mut cnf = Cnf::new();
        cnf.add2(-1, 2);
        cnf.add2(1, -2);
        let prefix = vec![(Quant::ForAll, vec![1]), (Quant::Exists, vec![2])];
        let mut qbf = NaiveQbf::new();
        assert!(qbf.is_sat(&prefix, &cnf, 2).unwrap());
    }

    #[test]
    fn unsat_universal_contradiction() {
        // forall x: x & -x (false)
        let mut cnf = Cnf::new();
        cnf.add1(1);
        cnf.add1(-1);
        let prefix = vec![(Quant::ForAll, vec![1])];
        let mut qbf = NaiveQbf::new();
        assert!(!qbf.is_sat(&prefix, &cnf, 1).unwrap());
    }

    #[test]
    fn model_extraction_finds_witness() {
        // exists k: k   (true, k=1)
        let mut cnf = Cnf::new();
        cnf.add1(1);
        let prefix = vec![(Quant::Exists, vec![1])];
        let mut qbf = NaiveQbf::new();
        let mut model = Vec::new();
        let sat = qbf.is_sat_model(&prefix, &cnf, 1, &mut model).unwrap();
        assert!(sat);
        assert_eq!(model, vec![1]);
    }

    #[test]
    fn model_extraction_omits_dontcare_vars() {
        // exists k1,k2: k1   (k2 is a don't-care)
        let mut cnf = Cnf::new();
        cnf.add1(1);
        let prefix = vec![(Quant::Exists, vec![1, 2])];
        let mut qbf = NaiveQbf::new();
        let mut model = Vec::new();
        qbf.is_sat_model(&prefix, &cnf, 2, &mut model).unwrap();
        assert!(model.contains(&1));
        assert!(!model.contains(&2) && !model.contains(&-2));
    }
}
