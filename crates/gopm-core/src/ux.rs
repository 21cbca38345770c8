//! Uninstall and update operations over the project tree and manifest.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::install;
use crate::manifest;
use crate::paths::{self, NODE_MODULES_DIR};
use crate::task::{InstallResult, InstallTask};
use crate::utils;

/// Remove a package directory from ./node_modules and drop its entry from
/// package.json. Returns false when the package was not installed.
pub fn uninstall(name: &str) -> Result<bool, InstallError> {
    paths::validate_package_name(name)?;
    let dir = paths::package_dir(Path::new(NODE_MODULES_DIR), name);
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir).map_err(|e| InstallError::io("remove package directory", e))?;

    let manifest_path = Path::new("package.json");
    if manifest_path.exists() {
        match manifest::remove_dependency(manifest_path, name) {
            Ok(true) => utils::log("updated package.json"),
            Ok(false) => {}
            Err(e) => utils::log_error(&format!("failed to update package.json: {}", e)),
        }
    }
    Ok(true)
}

/// Remove a package directory from the global tree. The manifest is a
/// project-only concern and is left alone.
pub fn uninstall_global(name: &str) -> Result<bool, InstallError> {
    paths::validate_package_name(name)?;
    let global_dir = paths::global_install_dir()?;
    let dir = paths::package_dir(&global_dir, name);
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir).map_err(|e| InstallError::io("remove package directory", e))?;
    Ok(true)
}

/// Re-resolve one dependency at `latest`, reinstall it, and pin the
/// manifest entry to the version that landed on disk.
pub fn update_package(name: &str) -> Result<Vec<InstallResult>, InstallError> {
    let manifest_path = Path::new("package.json");
    let pkg = manifest::read(manifest_path)?;
    if !pkg.dependencies.contains_key(name) {
        return Err(InstallError::io(
            "update",
            format!("package '{}' is not in dependencies", name),
        ));
    }
    let results = install::expand_install(vec![InstallTask {
        name: name.to_string(),
        range: "latest".to_string(),
        destination: PathBuf::from(NODE_MODULES_DIR),
        is_root: true,
    }]);
    record_resolved_versions(manifest_path, &results);
    Ok(results)
}

/// Update every runtime dependency to its latest version.
pub fn update_all() -> Result<Vec<InstallResult>, InstallError> {
    let manifest_path = Path::new("package.json");
    let pkg = manifest::read(manifest_path)?;
    if pkg.dependencies.is_empty() {
        return Ok(Vec::new());
    }
    let seed = pkg
        .dependencies
        .keys()
        .map(|name| InstallTask {
            name: name.clone(),
            range: "latest".to_string(),
            destination: PathBuf::from(NODE_MODULES_DIR),
            is_root: true,
        })
        .collect();
    let results = install::expand_install(seed);
    record_resolved_versions(manifest_path, &results);
    Ok(results)
}

/// Pin successfully updated root packages to the version their installed
/// manifest now reports. Best-effort: failures are logged, not raised.
fn record_resolved_versions(manifest_path: &Path, results: &[InstallResult]) {
    for result in results {
        if !result.task.is_root || !result.is_ok() {
            continue;
        }
        let dir = paths::package_dir(&result.task.destination, &result.task.name);
        let Some(resolved) = manifest::installed_version(&dir) else {
            continue;
        };
        match manifest::set_dependency(manifest_path, &result.task.name, &resolved) {
            Ok(true) => utils::log(&format!(
                "updated package.json: {} -> {}",
                result.task.name, resolved
            )),
            Ok(false) => {}
            Err(e) => utils::log_error(&format!("failed to update package.json: {}", e)),
        }
    }
}
