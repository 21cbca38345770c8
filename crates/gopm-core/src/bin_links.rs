//! Binary shims: populate `node_modules/.bin` (project mode) or the global
//! `bin/` directory (global mode) from each package's declared `bin`
//! entries. POSIX shims are relative symlinks; Windows gets `.cmd` wrappers
//! since symlink creation there needs elevation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::InstallError;
use crate::paths;

#[derive(Clone, Debug, Default)]
pub struct BinLinkReport {
    pub packages_scanned: usize,
    pub links_created: usize,
}

/// Scan every package under `node_modules` and (re)create its shims in
/// `node_modules/.bin`. Packages without a readable manifest or a `bin`
/// field are skipped.
pub fn rebuild_bin_links(node_modules: &Path) -> Result<BinLinkReport, InstallError> {
    let mut report = BinLinkReport::default();
    if !node_modules.is_dir() {
        return Ok(report);
    }
    let bin_dir = node_modules.join(".bin");
    fs::create_dir_all(&bin_dir).map_err(|e| InstallError::io("create .bin directory", e))?;

    let entries =
        fs::read_dir(node_modules).map_err(|e| InstallError::io("read node_modules", e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        if name.starts_with('@') {
            let scoped =
                fs::read_dir(&path).map_err(|e| InstallError::io("read scope directory", e))?;
            for child in scoped.flatten() {
                if child.path().is_dir() {
                    report.packages_scanned += 1;
                    let pkg_name = format!("{}/{}", name, child.file_name().to_string_lossy());
                    report.links_created += link_bins_for_package(node_modules, &pkg_name)?;
                }
            }
            continue;
        }
        report.packages_scanned += 1;
        report.links_created += link_bins_for_package(node_modules, &name)?;
    }
    Ok(report)
}

/// Create shims for one installed package. Returns how many were created.
pub fn link_bins_for_package(
    node_modules: &Path,
    package_name: &str,
) -> Result<usize, InstallError> {
    let pkg_dir = paths::package_dir(node_modules, package_name);
    let bins = match read_bin_entries(&pkg_dir.join("package.json"), package_name) {
        Some(bins) if !bins.is_empty() => bins,
        _ => return Ok(0),
    };
    let bin_dir = node_modules.join(".bin");
    fs::create_dir_all(&bin_dir).map_err(|e| InstallError::io("create .bin directory", e))?;

    let mut created = 0;
    for (bin_name, rel_target) in bins {
        let target = pkg_dir.join(&rel_target);
        if !target.exists() {
            continue;
        }
        create_shim(&bin_dir, &bin_name, &target)?;
        created += 1;
    }
    Ok(created)
}

/// Global mode: link the freshly installed package's bins into the user bin
/// directory.
pub fn link_global_binaries(package_dir: &Path, bin_dir: &Path) -> Result<(), InstallError> {
    let fallback = package_dir
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(bins) = read_bin_entries(&package_dir.join("package.json"), &fallback) else {
        return Ok(());
    };
    fs::create_dir_all(bin_dir).map_err(|e| InstallError::io("create bin directory", e))?;
    for (bin_name, rel_target) in bins {
        create_shim(bin_dir, &bin_name, &package_dir.join(rel_target))?;
    }
    Ok(())
}

/// Parse a manifest's `bin` field into shim-name → relative-path entries.
/// A bare string maps the package's base name to that path. Read leniently:
/// sub-manifest shapes vary.
fn read_bin_entries(
    manifest_path: &Path,
    package_name: &str,
) -> Option<BTreeMap<String, String>> {
    let s = fs::read_to_string(manifest_path).ok()?;
    let v: serde_json::Value = serde_json::from_str(&s).ok()?;
    let mut out = BTreeMap::new();
    match v.get("bin") {
        Some(serde_json::Value::String(path)) => {
            let name = v
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or(package_name);
            let base = name.rsplit('/').next().unwrap_or(name);
            if !base.is_empty() {
                out.insert(base.to_string(), path.clone());
            }
        }
        Some(serde_json::Value::Object(map)) => {
            for (bin_name, path) in map {
                if let Some(p) = path.as_str() {
                    out.insert(bin_name.clone(), p.to_string());
                }
            }
        }
        _ => {}
    }
    Some(out)
}

/// Relative path from `from` (a directory) to `to`, computed lexically.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from_comps: Vec<Component<'_>> = from.components().collect();
    let to_comps: Vec<Component<'_>> = to.components().collect();
    let mut shared = 0;
    while shared < from_comps.len()
        && shared < to_comps.len()
        && from_comps[shared] == to_comps[shared]
    {
        shared += 1;
    }
    let mut out = PathBuf::new();
    for _ in shared..from_comps.len() {
        out.push("..");
    }
    for comp in &to_comps[shared..] {
        out.push(comp.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(unix)]
fn create_shim(bin_dir: &Path, bin_name: &str, target: &Path) -> Result<(), InstallError> {
    let shim_path = bin_dir.join(bin_name);
    if fs::symlink_metadata(&shim_path).is_ok() {
        let _ = fs::remove_file(&shim_path);
    }
    let rel = relative_path(bin_dir, target);
    std::os::unix::fs::symlink(&rel, &shim_path)
        .map_err(|e| InstallError::io("create bin symlink", e))
}

#[cfg(windows)]
fn create_shim(bin_dir: &Path, bin_name: &str, target: &Path) -> Result<(), InstallError> {
    let shim_path = bin_dir.join(format!("{}.cmd", bin_name));
    if fs::symlink_metadata(&shim_path).is_ok() {
        let _ = fs::remove_file(&shim_path);
    }
    let base = target
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let contents = format!("@ECHO OFF\r\n\"%~dp0\\{}\" %*\r\n", base);
    fs::write(&shim_path, contents).map_err(|e| InstallError::io("write cmd shim", e))
}
