//! QBF backend interface (C4) and its two implementation families
//! (in-process, out-of-process), grounded on
//! `original_source/tool/src/QBFSolver.h`/`ExtQBFSolver.h`: `is_sat` and
//! `is_sat_model`, with a quantifier prefix given either by variable-kind
//! tag (resolved against the registry) or by explicit variable set (spec
//! §4.4). `original_source/tool/src/DepQBFApi.cpp`/`RareqsApi.cpp` are the
//! two concrete in-process backends in the original; we implement one
//! representative in-process backend plus the external-process family,
//! per `SPEC_FULL.md` §3.

pub mod external;
pub mod inprocess;

use crate::cnf::{Cnf, Literal};
use crate::errors::Result;
use crate::qdimacs::{Prefix, Quant};
use crate::vars::{Var, VarKind, VarManager};

/// Builds an explicit-variable-set [`Prefix`] from a sequence of
/// `(VarKind, Quant)` pairs, resolving each kind against the registry —
/// the "by variable-kind tag" representation of spec §3/§4.4.
pub fn prefix_from_kinds(vm: &VarManager, kinds: &[(VarKind, Quant)]) -> Prefix {
    kinds
        .iter()
        .map(|&(kind, q)| (q, vm.vars_of_kind(kind).to_vec()))
        .collect()
}

/// Decides a QBF (prefix + CNF), per spec §4.4.
pub trait Qbf {
    fn is_sat(&mut self, prefix: &Prefix, cnf: &Cnf, max_var: Var) -> Result<bool>;

    /// On SAT, `model` receives an assignment to the outermost ∃ block(s),
    /// expressed as a cube. Variables the preprocessor reports as
    /// DONTCARE are omitted from the cube.
    fn is_sat_model(
        &mut self,
        prefix: &Prefix,
        cnf: &Cnf,
        max_var: Var,
        model: &mut Vec<Literal>,
    ) -> Result<bool>;
}

pub(crate) fn leading_existential_split(prefix: &Prefix) -> (Vec<Var>, &[(Quant, Vec<Var>)]) {
    let mut idx = 0;
    let mut lead = Vec::new();
    while idx < prefix.len() && prefix[idx].0 == Quant::Exists {
        lead.extend(prefix[idx].1.iter().copied());
        idx += 1;
    }
    (lead, &prefix[idx..])
}
