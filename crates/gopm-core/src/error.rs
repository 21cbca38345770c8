//! Core error type. Task-scoped failures are captured into the task's
//! `InstallResult`; operations bubble these up to the CLI.

use std::fmt;

/// Everything the install engine can fail with.
#[derive(Debug, Clone)]
pub enum InstallError {
    /// Registry returned non-200 for the metadata document.
    PackageNotFound { package: String },
    /// Registry returned non-200 for a tarball URL.
    TarballUnavailable { url: String, status: u16 },
    /// No version in the registry document satisfies the requested range.
    NoMatchingVersion {
        package: String,
        requested: String,
        candidates: Vec<String>,
    },
    /// The range parser could not classify the constraint.
    UnsupportedConstraint { constraint: String },
    /// A tar entry would have landed outside the destination directory.
    UnsafeEntryPath { entry: String },
    /// Package name failed syntactic validation.
    InvalidPackageName { name: String },
    /// Filesystem or transport failure.
    Io { operation: String, source: String },
    /// package.json could not be written back. Never fails an install.
    ManifestWrite { path: String, source: String },
}

impl InstallError {
    pub fn io(operation: &str, source: impl fmt::Display) -> Self {
        InstallError::Io {
            operation: operation.to_string(),
            source: source.to_string(),
        }
    }
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::PackageNotFound { package } => {
                write!(f, "package not found: {}", package)
            }
            InstallError::TarballUnavailable { url, status } => {
                write!(f, "failed to download {} (HTTP {})", url, status)
            }
            InstallError::NoMatchingVersion {
                package,
                requested,
                candidates,
            } => {
                write!(
                    f,
                    "no matching version of {} for {} (tried {})",
                    package,
                    requested,
                    candidates.join(", ")
                )
            }
            InstallError::UnsupportedConstraint { constraint } => {
                write!(f, "unsupported version constraint: {}", constraint)
            }
            InstallError::UnsafeEntryPath { entry } => {
                write!(f, "invalid file path in archive: {}", entry)
            }
            InstallError::InvalidPackageName { name } => {
                write!(f, "invalid package name: {}", name)
            }
            InstallError::Io { operation, source } => {
                write!(f, "{}: {}", operation, source)
            }
            InstallError::ManifestWrite { path, source } => {
                write!(f, "failed to update {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for InstallError {}
