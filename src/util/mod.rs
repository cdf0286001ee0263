//! Utilities (C10): set inclusion on sorted literal vectors, negation of
//! literal vectors, present↔next substitution, projection of models to
//! variable categories — grounded on the small free functions scattered
//! through `original_source/tool/src/CNF.cpp`/`Utils.h` and spec §4.10's
//! description of C10.

pub mod tempfile;

use crate::cnf::Literal;
use crate::vars::{Var, VarKind, VarManager};

/// `true` if every literal of `sorted_sub` occurs in `sorted_sup`. Both
/// vectors are assumed sorted ascending (as produced by
/// [`crate::cnf::Cnf::remove_duplicates`]), enabling a linear merge
/// instead of the `O(n*m)` scan [`crate::cnf::Cnf`]'s own superset check
/// uses on unsorted clauses.
pub fn is_subset_sorted(sorted_sub: &[Literal], sorted_sup: &[Literal]) -> bool {
    let mut j = 0;
    for &lit in sorted_sub {
        while j < sorted_sup.len() && sorted_sup[j] < lit {
            j += 1;
        }
        if j >= sorted_sup.len() || sorted_sup[j] != lit {
            return false;
        }
        j += 1;
    }
    true
}

/// Negates every literal of a cube or clause.
pub fn negate(lits: &[Literal]) -> Vec<Literal> {
    lits.iter().map(|&l| -l).collect()
}

/// Substitutes every present-state literal in a cube by its next-state
/// counterpart, and vice versa (the cube-level sibling of
/// [`crate::cnf::Cnf::swap_present_next`], used when building assumption
/// cubes for the per-frame solver sessions of [`crate::ifm`]).
pub fn swap_present_next_cube(cube: &[Literal], vm: &VarManager) -> Vec<Literal> {
    cube.iter()
        .map(|&lit| {
            let v = lit.unsigned_abs();
            match vm.kind_of(v) {
                VarKind::PresState | VarKind::NextState => {
                    let swapped = vm.swapped(v) as i32;
                    if lit < 0 {
                        -swapped
                    } else {
                        swapped
                    }
                }
                _ => lit,
            }
        })
        .collect()
}

/// Keeps only the literals of `cube` whose variable is of kind `kind`
/// ("projection of models to variable categories", C10).
pub fn project_to_kind(cube: &[Literal], vm: &VarManager, kind: VarKind) -> Vec<Literal> {
    cube.iter()
        .copied()
        .filter(|&lit| vm.kind_of(lit.unsigned_abs()) == kind)
        .collect()
}

/// Keeps only the literals of `cube` whose variable appears in `vars`.
pub fn project_to_vars(cube: &[Literal], vars: &[Var]) -> Vec<Literal> {
    cube.iter()
        .copied()
        .filter(|&lit| vars.contains(&lit.unsigned_abs()))
        .collect()
}
