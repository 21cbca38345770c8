//! Dispatcher: breadth-first transitive expansion over a fixed worker pool,
//! plus the public install operations built on it.
//!
//! Levels are explicit barriers: every task of depth k completes before any
//! task of depth k+1 starts. Within a level, tasks run on up to
//! MAX_CONCURRENT worker threads in unspecified order.

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::bin_links;
use crate::error::InstallError;
use crate::manifest;
use crate::paths::{self, NODE_MODULES_DIR};
use crate::task::{process_install_task, InstallResult, InstallTask};
use crate::utils;

/// Upper bound on concurrently running install workers.
pub const MAX_CONCURRENT: usize = 10;

/// Run one batch of jobs through a fixed pool of worker threads. Results
/// arrive in completion order; the result channel closes once every worker
/// has drained the queue.
pub(crate) fn run_batch<T, R, F>(items: Vec<T>, max_workers: usize, job: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    if items.is_empty() {
        return Vec::new();
    }
    let worker_count = max_workers.min(items.len()).max(1);
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let job = Arc::new(job);
    let (tx, rx) = mpsc::channel();
    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let queue = Arc::clone(&queue);
        let job = Arc::clone(&job);
        let tx = tx.clone();
        handles.push(thread::spawn(move || loop {
            let next = match queue.lock() {
                Ok(mut q) => q.pop_front(),
                Err(_) => None,
            };
            let Some(item) = next else {
                break;
            };
            if tx.send((job)(item)).is_err() {
                break;
            }
        }));
    }
    drop(tx);
    let mut results = Vec::new();
    for result in rx {
        results.push(result);
    }
    for handle in handles {
        let _ = handle.join();
    }
    results
}

/// Breadth-first transitive install. Each completed package's manifest
/// contributes child tasks for runtime dependencies whose names have not
/// been claimed yet; a name is installed at the depth that first discovered
/// it and never revisited. Failures don't stop siblings, only the failing
/// node's own subtree.
pub fn expand_install(seed: Vec<InstallTask>) -> Vec<InstallResult> {
    let mut installed: BTreeSet<String> = seed.iter().map(|t| t.name.clone()).collect();
    let mut queue = seed;
    let mut results = Vec::new();
    while !queue.is_empty() {
        let batch = std::mem::take(&mut queue);
        let batch_results = run_batch(batch, MAX_CONCURRENT, process_install_task);
        for result in &batch_results {
            if !result.is_ok() {
                continue;
            }
            let package_dir = paths::package_dir(&result.task.destination, &result.task.name);
            queue.extend(child_tasks(&package_dir, &mut installed));
        }
        results.extend(batch_results);
    }
    results
}

/// Tasks for the runtime dependencies declared by the package installed at
/// `package_dir`, skipping names already claimed. Claims the new names.
fn child_tasks(package_dir: &Path, installed: &mut BTreeSet<String>) -> Vec<InstallTask> {
    let Some(deps) = manifest::runtime_dependencies(&package_dir.join("package.json")) else {
        return Vec::new();
    };
    let mut tasks = Vec::new();
    for (dep, range) in deps {
        if installed.contains(&dep) {
            continue;
        }
        installed.insert(dep.clone());
        tasks.push(InstallTask {
            destination: paths::child_destination(package_dir, &dep),
            name: dep,
            range,
            is_root: false,
        });
    }
    tasks
}

/// Install every runtime dependency declared by ./package.json into
/// ./node_modules, then relink binary shims.
pub fn install_from_manifest() -> Result<Vec<InstallResult>, InstallError> {
    let manifest_path = Path::new("package.json");
    if !manifest_path.exists() {
        return Err(InstallError::io(
            "read package.json",
            "no package.json in current directory",
        ));
    }
    let pkg = manifest::read(manifest_path)?;
    if pkg.dependencies.is_empty() {
        return Ok(Vec::new());
    }
    let seed = pkg
        .dependencies
        .iter()
        .map(|(name, range)| InstallTask {
            name: name.clone(),
            range: range.clone(),
            destination: PathBuf::from(NODE_MODULES_DIR),
            is_root: true,
        })
        .collect();
    let results = expand_install(seed);
    if let Err(e) = bin_links::rebuild_bin_links(Path::new(NODE_MODULES_DIR)) {
        utils::log_error(&format!("failed to link binaries: {}", e));
    }
    Ok(results)
}

/// Install one package (and its transitive dependencies) into the project
/// tree, then record the requested range in package.json when one exists.
pub fn install_single(name: &str, range: &str) -> Result<Vec<InstallResult>, InstallError> {
    paths::validate_package_name(name)?;
    let seed = vec![InstallTask {
        name: name.to_string(),
        range: range.to_string(),
        destination: PathBuf::from(NODE_MODULES_DIR),
        is_root: true,
    }];
    let results = expand_install(seed);
    if results.first().is_some_and(InstallResult::is_ok) {
        if let Err(e) = bin_links::rebuild_bin_links(Path::new(NODE_MODULES_DIR)) {
            utils::log_error(&format!("failed to link binaries: {}", e));
        }
        let manifest_path = Path::new("package.json");
        if manifest_path.exists() {
            match manifest::add_dependency(manifest_path, name, range) {
                Ok(true) => utils::log("updated package.json"),
                Ok(false) => {}
                Err(e) => utils::log_error(&format!("failed to update package.json: {}", e)),
            }
        }
    }
    Ok(results)
}

/// Install one package into the user-global tree and link its binaries into
/// the sibling bin/ directory.
pub fn install_single_global(name: &str, range: &str) -> Result<Vec<InstallResult>, InstallError> {
    paths::validate_package_name(name)?;
    let global_dir = paths::global_install_dir()?;
    let bin_dir = paths::global_bin_dir()?;
    std::fs::create_dir_all(&global_dir)
        .map_err(|e| InstallError::io("create global install directory", e))?;
    std::fs::create_dir_all(&bin_dir)
        .map_err(|e| InstallError::io("create global bin directory", e))?;
    let seed = vec![InstallTask {
        name: name.to_string(),
        range: range.to_string(),
        destination: global_dir.clone(),
        is_root: true,
    }];
    let results = expand_install(seed);
    if results.first().is_some_and(InstallResult::is_ok) {
        let package_dir = paths::package_dir(&global_dir, name);
        if let Err(e) = bin_links::link_global_binaries(&package_dir, &bin_dir) {
            utils::log_error(&format!("failed to link binaries: {}", e));
        }
    }
    Ok(results)
}
