//! Typed package.json handling: the project manifest as a structured record
//! plus lenient readers for the sub-manifests of installed packages, whose
//! shapes vary too much for a strict decode.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InstallError;

/// The `bin` field: a single path (shim named after the package) or a
/// name-to-path map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bin {
    Single(String),
    Map(BTreeMap<String, String>),
}

/// The project's top-level manifest. Only this file is decoded strictly;
/// installed packages' own manifests go through the `Value`-based readers
/// below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageJson {
    pub name: String,
    pub version: String,
    pub description: String,
    pub main: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<Bin>,
    pub scripts: BTreeMap<String, String>,
    pub keywords: Vec<String>,
    pub author: String,
    pub license: String,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Read and decode a project manifest.
pub fn read(path: &Path) -> Result<PackageJson, InstallError> {
    let s = fs::read_to_string(path).map_err(|e| InstallError::io("read package.json", e))?;
    serde_json::from_str(&s).map_err(|e| InstallError::io("parse package.json", e))
}

/// Write a manifest with 2-space indentation and a trailing newline.
pub fn write(path: &Path, pkg: &PackageJson) -> Result<(), InstallError> {
    let body = serde_json::to_string_pretty(pkg).map_err(|e| InstallError::ManifestWrite {
        path: path.display().to_string(),
        source: e.to_string(),
    })?;
    fs::write(path, body + "\n").map_err(|e| InstallError::ManifestWrite {
        path: path.display().to_string(),
        source: e.to_string(),
    })
}

/// Record `(name, range)` under `dependencies` iff the name is absent.
/// Returns whether the file was rewritten. devDependencies are never
/// touched by an install.
pub fn add_dependency(path: &Path, name: &str, range: &str) -> Result<bool, InstallError> {
    let mut pkg = read(path)?;
    if pkg.dependencies.contains_key(name) {
        return Ok(false);
    }
    pkg.dependencies
        .insert(name.to_string(), range.to_string());
    write(path, &pkg)?;
    Ok(true)
}

/// Pin `name` to `version` under `dependencies`, overwriting any prior
/// range. Returns whether the entry existed.
pub fn set_dependency(path: &Path, name: &str, version: &str) -> Result<bool, InstallError> {
    let mut pkg = read(path)?;
    if !pkg.dependencies.contains_key(name) {
        return Ok(false);
    }
    pkg.dependencies
        .insert(name.to_string(), version.to_string());
    write(path, &pkg)?;
    Ok(true)
}

/// Drop `name` from `dependencies`. Returns whether anything changed.
pub fn remove_dependency(path: &Path, name: &str) -> Result<bool, InstallError> {
    let mut pkg = read(path)?;
    if pkg.dependencies.remove(name).is_none() {
        return Ok(false);
    }
    write(path, &pkg)?;
    Ok(true)
}

/// The `version` recorded by the manifest inside an installed package
/// directory, if one is readable. This is the idempotency probe.
pub fn installed_version(package_dir: &Path) -> Option<String> {
    let s = fs::read_to_string(package_dir.join("package.json")).ok()?;
    let v: serde_json::Value = serde_json::from_str(&s).ok()?;
    v.get("version")?.as_str().map(String::from)
}

/// Runtime dependencies declared by a manifest file, read leniently: fields
/// this engine does not need may hold any shape.
pub fn runtime_dependencies(path: &Path) -> Option<BTreeMap<String, String>> {
    let s = fs::read_to_string(path).ok()?;
    let v: serde_json::Value = serde_json::from_str(&s).ok()?;
    let mut out = BTreeMap::new();
    if let Some(deps) = v.get("dependencies").and_then(|d| d.as_object()) {
        for (name, range) in deps {
            if let Some(r) = range.as_str() {
                out.insert(name.clone(), r.to_string());
            }
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PackageJson {
        PackageJson {
            name: "fixture".to_string(),
            version: "1.0.0".to_string(),
            dependencies: BTreeMap::from([("left-pad".to_string(), "^1.3.0".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn write_uses_two_space_indent_and_trailing_newline() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("package.json");
        write(&path, &fixture()).unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.ends_with("}\n"));
        assert!(body.contains("  \"name\": \"fixture\""));
        assert!(body.contains("    \"left-pad\": \"^1.3.0\""));
    }

    #[test]
    fn add_dependency_keeps_existing_entries() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("package.json");
        write(&path, &fixture()).unwrap();

        assert!(add_dependency(&path, "semver", "latest").unwrap());
        let pkg = read(&path).unwrap();
        assert_eq!(pkg.dependencies["semver"], "latest");
        assert_eq!(pkg.dependencies["left-pad"], "^1.3.0");

        // Present already: untouched, not rewritten to the new range.
        assert!(!add_dependency(&path, "left-pad", "2.0.0").unwrap());
        assert_eq!(read(&path).unwrap().dependencies["left-pad"], "^1.3.0");
    }

    #[test]
    fn add_dependency_never_touches_dev_dependencies() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("package.json");
        let mut pkg = fixture();
        pkg.dev_dependencies
            .insert("jest".to_string(), "^29.0.0".to_string());
        write(&path, &pkg).unwrap();

        add_dependency(&path, "semver", "^7.0.0").unwrap();
        let after = read(&path).unwrap();
        assert_eq!(after.dev_dependencies.len(), 1);
        assert_eq!(after.dev_dependencies["jest"], "^29.0.0");
        assert!(!after.dependencies.contains_key("jest"));
    }

    #[test]
    fn remove_and_set_dependency() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("package.json");
        write(&path, &fixture()).unwrap();

        assert!(set_dependency(&path, "left-pad", "1.3.0").unwrap());
        assert_eq!(read(&path).unwrap().dependencies["left-pad"], "1.3.0");
        assert!(!set_dependency(&path, "missing", "1.0.0").unwrap());

        assert!(remove_dependency(&path, "left-pad").unwrap());
        assert!(!remove_dependency(&path, "left-pad").unwrap());
        assert!(read(&path).unwrap().dependencies.is_empty());
    }

    #[test]
    fn installed_version_probe() {
        let td = tempfile::tempdir().unwrap();
        let dir = td.path().join("left-pad");
        fs::create_dir_all(&dir).unwrap();
        assert_eq!(installed_version(&dir), None);
        fs::write(
            dir.join("package.json"),
            r#"{ "name": "left-pad", "version": "1.3.0" }"#,
        )
        .unwrap();
        assert_eq!(installed_version(&dir), Some("1.3.0".to_string()));
    }

    #[test]
    fn runtime_dependencies_tolerates_odd_fields() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("package.json");
        // Object-shaped author would fail a strict decode of PackageJson.
        fs::write(
            &path,
            r#"{
                "name": "demo",
                "author": { "name": "Jane" },
                "dependencies": { "b": "^1", "c": "~2.1", "weird": 42 }
            }"#,
        )
        .unwrap();
        let deps = runtime_dependencies(&path).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps["b"], "^1");
        assert_eq!(deps["c"], "~2.1");
    }
}
