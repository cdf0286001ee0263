//! Circuit extractors and the `Store`/`Load` checkpoint back-ends (spec
//! §4.8 tail, §4.9), grounded on
//! `original_source/tool/src/ImplExtractor.h`'s
//! `QBFCertImplExtractor`/`StoreImplExtractor`/`LoadSynth` trio
//! (`SPEC_FULL.md` §3).

use crate::cnf::Cnf;
use crate::errors::{DemiurgeError, Result};
use crate::qdimacs::{self, Prefix, Quant};
use crate::synth::implies_cnf;
use crate::util::tempfile::QbfTempFiles;
use crate::vars::{Var, VarKind, VarManager};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `win/<input-basename>.dimacs`, spec §4.9/§6.
pub fn checkpoint_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".into());
    Path::new("win").join(format!("{stem}.dimacs"))
}

/// `Load`: reads a previously stored winning region. Not an extractor —
/// it stands in for synthesis in the `--backend load` engine, skipping
/// both `synth` and `ifm` — but shares the checkpoint file format with
/// [`store`], so its reader lives next to the writer it is the dual of.
pub fn load_checkpoint(path: &Path, vm: &mut VarManager) -> Result<(Cnf, Cnf)> {
    let w = crate::cnf::dimacs::load(path, vm.max_var())?;
    let not_w = w.negate(vm);
    Ok((w, not_w))
}

/// `Store`: saves `W` as DIMACS under `win/<basename>.dimacs`, creating
/// the directory if necessary. Not an engine; pure file I/O (spec §4.9).
pub fn store(w: &Cnf, max_var: Var, input: &Path) -> Result<()> {
    let path = checkpoint_path(input);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    crate::cnf::dimacs::save(w, max_var, &path)?;
    tracing::info!(target: "log", path = %path.display(), "stored winning region checkpoint");
    Ok(())
}

/// An external circuit-certifying QBF solver (spec §4.4's "Certificate
/// interface"), invoked the same way [`crate::qbf::external::ExternalQbf`]
/// invokes a plain decision solver: the query is `∀x,u.∃c,x',tmp. W(x) →
/// (T(x,u,c,x') ∧ W(x'))` (the same implication shape `synth` builds, now
/// with `W` already concrete so no `∃k` block remains); the existential
/// block over `Ctrl` is the one a certifying solver is asked to realize
/// as a function of the preceding universal block, per
/// `original_source/tool/src/QBFCertImplExtractor.cpp`.
pub struct QbfCertExtractor {
    pub solver_path: PathBuf,
    pub tmp_dir: PathBuf,
}

impl QbfCertExtractor {
    /// Resolves the certifying solver against `DEMIURGETP` (spec §6
    /// "Environment"), the same resolution [`crate::qbf::external::ExternalQbf::from_env`]
    /// uses.
    pub fn from_env(tmp_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = std::env::var("DEMIURGETP").map_err(|_| {
            DemiurgeError::SolverUnavailable(
                "DEMIURGETP is not set; cannot locate the qbfcert certifying solver".into(),
            )
        })?;
        Ok(QbfCertExtractor {
            solver_path: PathBuf::from(dir).join("qbfcert"),
            tmp_dir: tmp_dir.into(),
        })
    }

    /// Builds the certificate query for a concrete winning region `w`
    /// (already `w1`-shaped: `w(x)` with the fixed `¬error` conjunct), and
    /// asks the certifying solver to realize the `Ctrl` block as a
    /// function of `PresState`/`Input`, writing the AIGER result to
    /// `out_path`. Controllable variables the solver's output omits are
    /// padded with constant 0 (spec §9's documented source behavior).
    pub fn extract(&self, vm: &mut VarManager, t: &Cnf, w: &Cnf, out_path: &Path) -> Result<()> {
        let w_next = {
            let mut c = w.clone();
            c.swap_present_next(vm);
            c
        };
        let mut rhs = Cnf::new();
        rhs.add_cnf(t);
        rhs.add_cnf(&w_next);
        let phi = implies_cnf(w, &rhs, vm);

        let prefix: Prefix = vec![
            (Quant::ForAll, vm.vars_of_kind(VarKind::PresState).to_vec()),
            (Quant::ForAll, vm.vars_of_kind(VarKind::Input).to_vec()),
            (Quant::Exists, vm.vars_of_kind(VarKind::Ctrl).to_vec()),
            (Quant::Exists, vm.vars_of_kind(VarKind::NextState).to_vec()),
            (Quant::Exists, vm.vars_of_kind(VarKind::Tmp).to_vec()),
        ];
        let max_var = vm.max_var();

        let files = QbfTempFiles::new(&self.tmp_dir, "cert")
            .map_err(|e| DemiurgeError::SolverUnavailable(e.to_string()))?;
        std::fs::write(&files.query, qdimacs::write(&prefix, &phi, max_var))?;

        let mut cmd = Command::new(&self.solver_path);
        cmd.arg(&files.query).arg("--aiger-output").arg(out_path);
        cmd.stdout(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            DemiurgeError::SolverUnavailable(format!(
                "failed to start {}: {e}",
                self.solver_path.display()
            ))
        })?;
        let status = child
            .wait()
            .map_err(|e| DemiurgeError::SolverUnavailable(e.to_string()))?;
        let code = status
            .code()
            .ok_or_else(|| DemiurgeError::SolverUnavailable("certifying solver terminated by signal".into()))?;
        if qdimacs::classify_exit_code(code) != Some(true) {
            return Err(DemiurgeError::SolverUnavailable(format!(
                "qbfcert did not report SAT (exit code {code}); the winning region should have been realizable"
            )));
        }
        if !out_path.exists() {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout)?;
            }
            return Err(DemiurgeError::SolverUnavailable(
                "qbfcert reported SAT but produced no AIGER certificate file".into(),
            ));
        }

        let declared = count_aiger_outputs(out_path)?;
        let expected = vm.vars_of_kind(VarKind::Ctrl).len();
        if declared < expected {
            tracing::debug!(
                target: "debug",
                declared,
                expected,
                "qbfcert certificate covers fewer controllables than exist; padding the rest as constant 0"
            );
            pad_missing_outputs_as_constant_zero(out_path, expected - declared)?;
        }
        Ok(())
    }
}

fn count_aiger_outputs(path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let header = text
        .lines()
        .next()
        .ok_or_else(|| DemiurgeError::SolverInconsistency("qbfcert produced an empty AIGER file".into()))?;
    let nums: Vec<usize> = header
        .split_whitespace()
        .skip(1)
        .map(|t| t.parse().unwrap_or(0))
        .collect();
    Ok(nums.get(3).copied().unwrap_or(0))
}

/// Appends `n` more `0` (constant-false) output lines and bumps the `O`
/// count in the header, per spec §9's "missing controllables are
/// irrelevant and may be synthesized as constant 0".
fn pad_missing_outputs_as_constant_zero(path: &Path, n: usize) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    if lines.is_empty() {
        return Err(DemiurgeError::SolverInconsistency("qbfcert produced an empty AIGER file".into()));
    }
    let mut header: Vec<usize> = lines[0]
        .split_whitespace()
        .skip(1)
        .map(|t| t.parse().unwrap_or(0))
        .collect();
    if header.len() != 5 {
        return Err(DemiurgeError::SolverInconsistency("malformed AIGER header from qbfcert".into()));
    }
    let input_count = header[1];
    header[3] += n;
    lines[0] = format!("aag {} {} {} {} {}", header[0], header[1], header[2], header[3], header[4]);
    let output_insert_at = 1 + input_count + header[2];
    for _ in 0..n {
        lines.insert(output_insert_at, "0".to_string());
    }
    std::fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnf::Cnf;

    #[test]
    fn checkpoint_path_uses_input_stem() {
        let path = checkpoint_path(Path::new("/tmp/systems/toggle.aag"));
        assert_eq!(path, Path::new("win/toggle.dimacs"));
    }

    #[test]
    fn store_then_load_round_trips_winning_region() {
        let mut vm = VarManager::new();
        let (s, _) = vm.create_state_pair("s");
        let mut w = Cnf::new();
        w.add1(-(s as i32));
        let input = Path::new("demiurge-rs-store-load-test.aag");
        store(&w, vm.max_var(), input).unwrap();
        let (loaded, _not_w) = load_checkpoint(&checkpoint_path(input), &mut vm).unwrap();
        assert_eq!(loaded.get_clauses(), w.get_clauses());
        let _ = std::fs::remove_file(checkpoint_path(input));
    }

    #[test]
    fn padding_bumps_output_count_and_appends_zero_lines() {
        let dir = std::env::temp_dir().join("demiurge-rs-pad-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cert.aag");
        std::fs::write(&path, "aag 3 1 0 1 1\n2\n6\n6 2 4\n").unwrap();
        pad_missing_outputs_as_constant_zero(&path, 1).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("aag 3 1 0 2 1"));
        assert_eq!(count_aiger_outputs(&path).unwrap(), 2);
    }
}
