//! Temp-file discipline for the out-of-process QBF driver (C9, spec §5):
//! `<tmp>/qbf_query_<base>_<pid>_<n>.qdimacs` and
//! `<tmp>/qbf_answer_<base>_<pid>_<n>.out`, created on first use and
//! deleted on every exit path. Grounded on
//! `original_source/tool/src/ExtQBFSolver.cpp`'s constructor (building the
//! unique names once) combined with an RAII guard — idiomatic Rust's
//! answer to the original's explicit `cleanup()` call on every return
//! path of `isSat`/`isSatModel`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A unique, paired (query, answer) temp-file name, removed on drop
/// regardless of how the owning scope exits (including panics/error
/// returns), satisfying spec §5's "deleted on every exit path" rule
/// without requiring callers to remember to clean up.
pub struct QbfTempFiles {
    pub query: PathBuf,
    pub answer: PathBuf,
}

impl QbfTempFiles {
    /// Creates the temp directory (if missing) and reserves a unique
    /// `(query, answer)` pair of paths under it.
    pub fn new(tmp_dir: &std::path::Path, base: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(tmp_dir)?;
        let pid = std::process::id();
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Ok(QbfTempFiles {
            query: tmp_dir.join(format!("qbf_query_{base}_{pid}_{n}.qdimacs")),
            answer: tmp_dir.join(format!("qbf_answer_{base}_{pid}_{n}.out")),
        })
    }
}

impl Drop for QbfTempFiles {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.query);
        let _ = std::fs::remove_file(&self.answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_paired() {
        let dir = std::env::temp_dir().join("demiurge-rs-test-tmp");
        let a = QbfTempFiles::new(&dir, "base").unwrap();
        let b = QbfTempFiles::new(&dir, "base").unwrap();
        assert_ne!(a.query, b.query);
        assert_ne!(a.answer, b.answer);
    }

    #[test]
    fn files_are_removed_on_drop() {
        let dir = std::env::temp_dir().join("demiurge-rs-test-tmp2");
        let path;
        {
            let guard = QbfTempFiles::new(&dir, "base").unwrap();
            std::fs::write(&guard.query, "p cnf 0 0\n").unwrap();
            path = guard.query.clone();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
