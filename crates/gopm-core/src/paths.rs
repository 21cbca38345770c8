//! Install roots and directory mapping, including the `@scope/name` layout
//! rules shared by the worker and the dispatcher.

use std::path::{Path, PathBuf};

use crate::error::InstallError;
use crate::utils;

pub const NODE_MODULES_DIR: &str = "node_modules";

/// Split `@scope/name` into (`@scope`, `name`). None for unscoped names.
pub fn split_scoped(name: &str) -> Option<(&str, &str)> {
    if !name.starts_with('@') {
        return None;
    }
    let slash = name.find('/')?;
    Some((&name[..slash], &name[slash + 1..]))
}

/// Syntactic validity per the task contract: non-empty, and a name starting
/// with `@` must be exactly `@scope/name`.
pub fn validate_package_name(name: &str) -> Result<(), InstallError> {
    if name.is_empty() {
        return Err(InstallError::InvalidPackageName {
            name: name.to_string(),
        });
    }
    if name.starts_with('@') {
        match split_scoped(name) {
            Some((scope, bare))
                if scope.len() > 1 && !bare.is_empty() && !bare.contains('/') => {}
            _ => {
                return Err(InstallError::InvalidPackageName {
                    name: name.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Directory a package occupies under `destination`. Scope-aware: when the
/// destination already ends with the scope segment (the dispatcher enqueues
/// scoped children that way), only the bare name is appended.
pub fn package_dir(destination: &Path, name: &str) -> PathBuf {
    match split_scoped(name) {
        Some((scope, bare)) => {
            if destination.file_name().is_some_and(|f| f == scope) {
                destination.join(bare)
            } else {
                destination.join(scope).join(bare)
            }
        }
        None => destination.join(name),
    }
}

/// Destination directory for a child dependency of the package installed at
/// `parent_dir`. Scoped children nest one level deeper.
pub fn child_destination(parent_dir: &Path, dep_name: &str) -> PathBuf {
    let base = parent_dir.join(NODE_MODULES_DIR);
    match split_scoped(dep_name) {
        Some((scope, _)) => base.join(scope),
        None => base,
    }
}

/// Global install root: `{GOPM_ROOT}/lib/node_modules` when the env var is
/// set, otherwise the platform default under the home directory.
pub fn global_install_dir() -> Result<PathBuf, InstallError> {
    if let Ok(root) = std::env::var("GOPM_ROOT") {
        if !root.is_empty() {
            return Ok(PathBuf::from(root).join("lib").join(NODE_MODULES_DIR));
        }
    }
    let home = utils::home_dir()
        .ok_or_else(|| InstallError::io("locate home directory", "home directory not set"))?;
    #[cfg(windows)]
    {
        Ok(home
            .join("AppData")
            .join("Roaming")
            .join("npm")
            .join(NODE_MODULES_DIR))
    }
    #[cfg(not(windows))]
    {
        Ok(home.join(".npm-global").join("lib").join(NODE_MODULES_DIR))
    }
}

/// Where global binary shims land: the `bin/` sibling of the global
/// `node_modules` directory.
pub fn global_bin_dir() -> Result<PathBuf, InstallError> {
    let lib = global_install_dir()?;
    let parent = lib
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(parent.join("bin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_scoped_names() {
        assert_eq!(split_scoped("@babel/core"), Some(("@babel", "core")));
        assert_eq!(split_scoped("left-pad"), None);
        assert_eq!(split_scoped("@broken"), None);
    }

    #[test]
    fn validate_rejects_malformed_scopes() {
        assert!(validate_package_name("left-pad").is_ok());
        assert!(validate_package_name("@babel/core").is_ok());
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("@babel").is_err());
        assert!(validate_package_name("@/core").is_err());
        assert!(validate_package_name("@a/b/c").is_err());
    }

    #[test]
    fn package_dir_layout() {
        let base = Path::new("node_modules");
        assert_eq!(package_dir(base, "left-pad"), base.join("left-pad"));
        assert_eq!(
            package_dir(base, "@babel/core"),
            base.join("@babel").join("core")
        );
        // Destination already carries the scope segment.
        let scoped = base.join("@babel");
        assert_eq!(package_dir(&scoped, "@babel/core"), scoped.join("core"));
    }

    #[test]
    fn child_destination_nests_scopes() {
        let parent = Path::new("node_modules/a");
        assert_eq!(
            child_destination(parent, "b"),
            parent.join(NODE_MODULES_DIR)
        );
        assert_eq!(
            child_destination(parent, "@s/p"),
            parent.join(NODE_MODULES_DIR).join("@s")
        );
    }
}
