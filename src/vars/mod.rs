//! Variable registry (C2): typed allocation of propositional variables.
//!
//! Grounded on the original `VarManager` (referenced throughout
//! `original_source/tool/src/CNF.h`) and on spec §4.2/§9. Unlike the
//! original, which is process-wide singleton state, this registry is an
//! explicit, passed-by-reference value per spec §9's "global registry"
//! design note: every CNF/engine operation that needs a fresh variable or
//! a variable-kind lookup takes `&VarManager` or `&mut VarManager`
//! explicitly.

use std::collections::HashMap;

/// The closed set of variable kinds from spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarKind {
    /// Uncontrollable (environment) input.
    Input,
    /// Controllable (system) input.
    Ctrl,
    /// Current-state latch.
    PresState,
    /// Next-state (successor) copy of a latch.
    NextState,
    /// Tseitin/auxiliary variable.
    Tmp,
    /// Template-synthesis parameter.
    TemplParam,
}

/// Positive-integer variable identity plus its kind and (optional) name.
pub type Var = u32;

#[derive(Debug, Clone)]
struct VarInfo {
    kind: VarKind,
    #[allow(dead_code)]
    name: String,
}

/// A scope marker returned by [`VarManager::push`], to be passed to
/// [`VarManager::reset_to_last_push`] — though in practice we always roll
/// back to the most recent push, matching the original's `push`/`popToMark`
/// stack discipline described in spec §4.2.
#[derive(Debug, Clone, Copy)]
pub struct Scope(usize);

/// Typed allocation of propositional variables (C2).
///
/// Invariant: `pres_state[i]` and `next_state[i]` are paired by index;
/// `pres_error_var()` is `pres_state[0]`; `next_error_var()` is
/// `next_state[0]`.
pub struct VarManager {
    next_id: Var,
    info: HashMap<Var, VarInfo>,
    by_kind: HashMap<VarKind, Vec<Var>>,
    /// Stack of `(next_id, by_kind[Tmp].len())` snapshots for push/pop
    /// scoping of the TMP namespace (spec §4.2, §9 "reset_to_last_push").
    scope_stack: Vec<(Var, usize)>,
}

impl Default for VarManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VarManager {
    pub fn new() -> Self {
        VarManager {
            next_id: 1,
            info: HashMap::new(),
            by_kind: HashMap::new(),
            scope_stack: Vec::new(),
        }
    }

    /// Allocates a fresh variable of the given kind.
    pub fn create(&mut self, kind: VarKind, name: impl Into<String>) -> Var {
        let id = self.next_id;
        self.next_id += 1;
        self.info.insert(
            id,
            VarInfo {
                kind,
                name: name.into(),
            },
        );
        self.by_kind.entry(kind).or_default().push(id);
        id
    }

    /// Allocates a `PRES_STATE`/`NEXT_STATE` pair in lock-step, preserving
    /// the positional correspondence `swap_present_next` in [`crate::cnf`]
    /// relies on.
    pub fn create_state_pair(&mut self, name: impl Into<String>) -> (Var, Var) {
        let name = name.into();
        let pres = self.create(VarKind::PresState, format!("{name}"));
        let next = self.create(VarKind::NextState, format!("{name}'"));
        (pres, next)
    }

    pub fn create_fresh_tmp(&mut self) -> Var {
        self.create(VarKind::Tmp, format!("tmp{}", self.next_id))
    }

    pub fn create_fresh_template_param(&mut self) -> Var {
        self.create(VarKind::TemplParam, format!("k{}", self.next_id))
    }

    pub fn kind_of(&self, v: Var) -> VarKind {
        self.info
            .get(&v)
            .unwrap_or_else(|| panic!("variable {v} was never allocated"))
            .kind
    }

    /// Variables of a given kind, in allocation (insertion) order.
    pub fn vars_of_kind(&self, kind: VarKind) -> &[Var] {
        self.by_kind.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn max_var(&self) -> Var {
        self.next_id - 1
    }

    /// `PRES_STATE[0]`, the error bit (spec §3).
    pub fn pres_error_var(&self) -> Var {
        self.vars_of_kind(VarKind::PresState)[0]
    }

    /// `NEXT_STATE[0]`, the error bit's successor.
    pub fn next_error_var(&self) -> Var {
        self.vars_of_kind(VarKind::NextState)[0]
    }

    /// Present-state variable paired with a given next-state variable, or
    /// vice versa, by positional correspondence (spec §4.1 "Swap
    /// present↔next"). Panics (an `InternalInvariantViolation`) if the two
    /// kinds have unequal cardinality, per spec's stated precondition.
    pub fn swapped(&self, v: Var) -> Var {
        let kind = self.kind_of(v);
        let (from, to) = match kind {
            VarKind::PresState => (VarKind::PresState, VarKind::NextState),
            VarKind::NextState => (VarKind::NextState, VarKind::PresState),
            other => panic!("swapped() called on non-state variable of kind {other:?}"),
        };
        let from_vec = self.vars_of_kind(from);
        let to_vec = self.vars_of_kind(to);
        crate::invariant!(
            from_vec.len() == to_vec.len(),
            "PRES_STATE and NEXT_STATE must have equal cardinality"
        );
        let idx = from_vec
            .iter()
            .position(|&x| x == v)
            .expect("variable must belong to its own kind's vector");
        to_vec[idx]
    }

    /// Opens a new scope; TMP variables created after this point are
    /// rolled back by a matching [`VarManager::reset_to_last_push`].
    pub fn push(&mut self) -> Scope {
        let mark = self.by_kind.get(&VarKind::Tmp).map(|v| v.len()).unwrap_or(0);
        self.scope_stack.push((self.next_id, mark));
        Scope(self.scope_stack.len() - 1)
    }

    /// Rolls back all TMP allocations made since the most recent
    /// [`VarManager::push`]. Other variable kinds are never reclaimed:
    /// only the TMP namespace is scoped, per spec §9.
    pub fn reset_to_last_push(&mut self) {
        let (saved_next_id, saved_tmp_len) = match self.scope_stack.pop() {
            Some(x) => x,
            None => return,
        };
        if let Some(tmp) = self.by_kind.get_mut(&VarKind::Tmp) {
            for v in tmp.drain(saved_tmp_len..) {
                self.info.remove(&v);
            }
        }
        self.next_id = saved_next_id;
    }
}
