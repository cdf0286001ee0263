//! Out-of-process QBF backend (C9 + spec §4.4's external family):
//! serializes to QDIMACS in a unique temp file, spawns the external
//! solver, parses the response by exit code (10 = SAT, 20 = UNSAT,
//! anything else fatal). Grounded on
//! `original_source/tool/src/ExtQBFSolver.cpp` (`dumpQBF` / `system()` /
//! `WEXITSTATUS` / `parseAnswer` / `parseModel`), re-expressed with
//! `std::process::Command` instead of `system()` and an RAII temp-file
//! guard instead of a manual `cleanup()` call (see
//! [`crate::util::tempfile`]).

use super::Qbf;
use crate::cnf::{Cnf, Literal};
use crate::errors::{DemiurgeError, Result};
use crate::qdimacs::{self, Prefix};
use crate::util::tempfile::QbfTempFiles;
use crate::vars::Var;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// An external QBF solver invoked per the QDIMACS file protocol. The
/// `DEMIURGETP` environment variable of spec §6 names the directory
/// containing solver executables; [`ExternalQbf::from_env`] resolves
/// `solver_name` against it.
pub struct ExternalQbf {
    pub solver_path: PathBuf,
    pub extra_args: Vec<String>,
    /// Appended to the command line only when a model is requested
    /// (mirrors the original's separate `getSolverCommand()` /
    /// `getSolverCommandModel()`).
    pub model_flag: Option<String>,
    pub timeout: Option<Duration>,
    pub tmp_dir: PathBuf,
}

impl ExternalQbf {
    pub fn new(solver_path: impl Into<PathBuf>, tmp_dir: impl Into<PathBuf>) -> Self {
        ExternalQbf {
            solver_path: solver_path.into(),
            extra_args: Vec::new(),
            model_flag: None,
            timeout: None,
            tmp_dir: tmp_dir.into(),
        }
    }

    /// Resolves `solver_name` against the `DEMIURGETP` environment
    /// variable (spec §6's "Environment").
    pub fn from_env(solver_name: &str, tmp_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = std::env::var("DEMIURGETP").map_err(|_| {
            DemiurgeError::SolverUnavailable(
                "DEMIURGETP is not set; cannot locate external solver executables".into(),
            )
        })?;
        Ok(Self::new(PathBuf::from(dir).join(solver_name), tmp_dir))
    }

    fn wait_with_timeout(&self, child: &mut Child) -> Result<ExitStatus> {
        match self.timeout {
            None => child
                .wait()
                .map_err(|e| DemiurgeError::SolverUnavailable(e.to_string())),
            Some(limit) => {
                let start = Instant::now();
                loop {
                    if let Some(status) = child
                        .try_wait()
                        .map_err(|e| DemiurgeError::SolverUnavailable(e.to_string()))?
                    {
                        return Ok(status);
                    }
                    if start.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(DemiurgeError::SolverUnavailable(format!(
                            "solver timed out after {:?}",
                            limit
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }
    }

    fn run(
        &self,
        prefix: &Prefix,
        cnf: &Cnf,
        max_var: Var,
        want_model: bool,
    ) -> Result<(bool, Vec<Literal>)> {
        let files = QbfTempFiles::new(&self.tmp_dir, "query")
            .map_err(|e| DemiurgeError::SolverUnavailable(e.to_string()))?;
        std::fs::write(&files.query, qdimacs::write(prefix, cnf, max_var))?;

        let mut cmd = Command::new(&self.solver_path);
        cmd.args(&self.extra_args);
        if want_model {
            if let Some(flag) = &self.model_flag {
                cmd.arg(flag);
            }
        }
        cmd.arg(&files.query);
        cmd.stdout(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            DemiurgeError::SolverUnavailable(format!(
                "failed to start {}: {e}",
                self.solver_path.display()
            ))
        })?;
        let status = self.wait_with_timeout(&mut child)?;
        let code = status
            .code()
            .ok_or_else(|| DemiurgeError::SolverUnavailable("solver terminated by signal".into()))?;

        match qdimacs::classify_exit_code(code) {
            Some(sat_from_code) => {
                if want_model {
                    let mut stdout = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        out.read_to_string(&mut stdout)?;
                    }
                    let (sat, model) = qdimacs::parse_model_output(&stdout)?;
                    if sat != sat_from_code {
                        return Err(DemiurgeError::SolverInconsistency(format!(
                            "exit code reported {sat_from_code} but answer stream reported {sat}"
                        )));
                    }
                    Ok((sat, model))
                } else {
                    Ok((sat_from_code, Vec::new()))
                }
            }
            None => Err(DemiurgeError::SolverUnavailable(format!(
                "solver terminated with strange exit code {code}"
            ))),
        }
        // `files` drops here on every path above, including the early
        // `?` returns, deleting both the query and answer files.
    }
}

impl Qbf for ExternalQbf {
    fn is_sat(&mut self, prefix: &Prefix, cnf: &Cnf, max_var: Var) -> Result<bool> {
        self.run(prefix, cnf, max_var, false).map(|(sat, _)| sat)
    }

    fn is_sat_model(
        &mut self,
        prefix: &Prefix,
        cnf: &Cnf,
        max_var: Var,
        model: &mut Vec<Literal>,
    ) -> Result<bool> {
        let (sat, m) = self.run(prefix, cnf, max_var, true)?;
        *model = m;
        Ok(sat)
    }
}
