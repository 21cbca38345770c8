//! Streaming extraction of gzip'd tar archives into a destination directory,
//! with lexical path-traversal guards. Nothing is buffered whole: the gzip
//! decoder wraps the network stream and each entry body is copied straight
//! to disk.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::InstallError;

/// Extract a gzip-compressed tar stream into `dest`. The conventional
/// leading `package/` segment is stripped from entry names; an entry whose
/// cleaned path would land outside `dest` fails the whole extraction.
/// Symlinks, devices and FIFOs are skipped.
pub fn extract_tar_gz<R: Read>(stream: R, dest: &Path) -> Result<(), InstallError> {
    fs::create_dir_all(dest).map_err(|e| InstallError::io("create package directory", e))?;
    let dest_clean = clean_path(dest);
    let gz = GzDecoder::new(stream);
    let mut archive = Archive::new(gz);
    let entries = archive
        .entries()
        .map_err(|e| InstallError::io("read archive", e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| InstallError::io("read archive entry", e))?;
        let raw = entry
            .path()
            .map_err(|e| InstallError::io("read archive entry name", e))?
            .into_owned();
        let Some(rel) = strip_package_prefix(&raw) else {
            continue;
        };
        let target = clean_path(&dest_clean.join(rel));
        if target == dest_clean || !target.starts_with(&dest_clean) {
            return Err(InstallError::UnsafeEntryPath {
                entry: raw.to_string_lossy().into_owned(),
            });
        }
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| InstallError::io("create directory from archive", e))?;
        } else if kind.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| InstallError::io("create parent directory", e))?;
            }
            // unpack streams the body and applies the header's mode bits
            entry
                .unpack(&target)
                .map_err(|e| InstallError::io("write file from archive", e))?;
        }
    }
    Ok(())
}

/// Drop the leading `package/` segment. An entry that is exactly the
/// top-level directory yields None (nothing to write); entries with a
/// different top-level name are kept whole.
fn strip_package_prefix(raw: &Path) -> Option<PathBuf> {
    let mut comps = raw.components();
    match comps.next() {
        Some(Component::Normal(seg)) if seg == "package" => {
            let rest = comps.as_path();
            if rest.as_os_str().is_empty() {
                None
            } else {
                Some(rest.to_path_buf())
            }
        }
        Some(_) => Some(raw.to_path_buf()),
        None => None,
    }
}

/// Lexically normalize a path: resolve `.` and `..` without touching the
/// filesystem. `..` at the front of a relative path collapses away, which is
/// fine for the containment check (the result simply stops matching `dest`).
fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
