//! Install tasks and the worker that executes one of them end-to-end:
//! resolve the range against registry metadata, fetch the tarball, extract
//! it into place, report the outcome.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::InstallError;
use crate::extract;
use crate::manifest;
use crate::paths;
use crate::registry;
use crate::version;

/// One install request, immutable once enqueued.
#[derive(Debug, Clone)]
pub struct InstallTask {
    pub name: String,
    pub range: String,
    /// Directory the package directory is created under.
    pub destination: PathBuf,
    /// Seeded from the user's request rather than discovered transitively.
    pub is_root: bool,
}

/// Outcome of one task. `Ok` carries the downloaded byte count (0 when the
/// idempotency probe short-circuited).
#[derive(Debug)]
pub struct InstallResult {
    pub task: InstallTask,
    pub outcome: Result<u64, InstallError>,
    pub duration: Duration,
}

impl InstallResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Execute one install task. Every failure is captured into the result;
/// nothing panics across the dispatcher boundary.
pub fn process_install_task(task: InstallTask) -> InstallResult {
    let started = Instant::now();
    let outcome = run(&task);
    InstallResult {
        task,
        outcome,
        duration: started.elapsed(),
    }
}

/// An `npm:alias@range` requested range carries its effective range after
/// the final `@`; the task's own name is what gets fetched.
fn effective_range(range: &str) -> &str {
    if let Some(rest) = range.strip_prefix("npm:") {
        if let Some((_, tail)) = rest.rsplit_once('@') {
            return tail;
        }
    }
    range
}

fn run(task: &InstallTask) -> Result<u64, InstallError> {
    let range = effective_range(&task.range);
    let doc = registry::fetch_metadata(&task.name)?;
    let resolved = version::select_version(&doc, range)?;
    let record = doc
        .versions
        .get(&resolved)
        .ok_or_else(|| InstallError::NoMatchingVersion {
            package: task.name.clone(),
            requested: range.to_string(),
            candidates: doc.versions.keys().cloned().collect(),
        })?;

    std::fs::create_dir_all(&task.destination)
        .map_err(|e| InstallError::io("create install directory", e))?;
    let package_dir = paths::package_dir(&task.destination, &task.name);

    // Idempotency probe: same version already on disk means nothing to do.
    if manifest::installed_version(&package_dir).as_deref() == Some(resolved.as_str()) {
        return Ok(0);
    }

    let (stream, size) = registry::open_tarball(&record.dist.tarball)?;
    extract::extract_tar_gz(stream, &package_dir)?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_range_is_tail_after_final_at() {
        assert_eq!(effective_range("npm:other@^1.2.0"), "^1.2.0");
        assert_eq!(effective_range("npm:@scope/other@~2.0.0"), "~2.0.0");
        assert_eq!(effective_range("^1.2.0"), "^1.2.0");
        assert_eq!(effective_range("latest"), "latest");
    }
}
