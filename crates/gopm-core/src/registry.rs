//! Registry client: typed metadata documents and tarball streams over HTTP.
//!
//! Several metadata fields come back from the registry in more than one
//! shape (`author`, `license`, `repository`, `homepage` as string-or-object,
//! `bin` as string-or-map); each is decoded into a tagged union so that no
//! shape is silently dropped.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;

use crate::config;
use crate::error::InstallError;
use crate::http_client::{self, HttpError};
use crate::manifest::Bin;

/// `author` field: bare string or structured object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Text(String),
    Info {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

/// `license` field: SPDX-style string or `{ type, url }` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum License {
    Text(String),
    Info {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

/// `repository` field: bare URL string or `{ type, url }` object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Repository {
    Url(String),
    Info {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
}

/// `homepage` field: bare URL string or object with a `url` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Homepage {
    Url(String),
    Info {
        #[serde(default)]
        url: Option<String>,
    },
}

/// Tarball location and checksum for one published version.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dist {
    #[serde(default)]
    pub tarball: String,
    #[serde(default)]
    pub shasum: Option<String>,
}

/// Per-version facet of a registry document.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub homepage: Option<Homepage>,
    #[serde(default)]
    pub bin: Option<Bin>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dist: Dist,
}

/// The full metadata document the registry serves for one package name.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionRecord>,
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: BTreeMap<String, String>,
}

/// Fetch the registry metadata document for a package. Scoped names keep
/// their `/` intact; the registry accepts the un-escaped form.
pub fn fetch_metadata(package: &str) -> Result<RegistryDocument, InstallError> {
    let url = format!(
        "{}/{}",
        config::registry_url().trim_end_matches('/'),
        encode_name(package)
    );
    let body = http_client::get_bytes(&url).map_err(|err| match err {
        HttpError::Status(_) => InstallError::PackageNotFound {
            package: package.to_string(),
        },
        HttpError::Transport(msg) => InstallError::io("fetch registry metadata", msg),
    })?;
    serde_json::from_slice(&body).map_err(|e| InstallError::io("decode registry metadata", e))
}

/// Open a tarball stream. Returns the body reader and the Content-Length
/// reported by the server (0 when absent). The caller owns the stream.
pub fn open_tarball(url: &str) -> Result<(Box<dyn Read + Send>, u64), InstallError> {
    let resp = http_client::get(url).map_err(|err| match err {
        HttpError::Status(status) => InstallError::TarballUnavailable {
            url: url.to_string(),
            status,
        },
        HttpError::Transport(msg) => InstallError::io("fetch tarball", msg),
    })?;
    let size = resp
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    Ok((Box::new(resp.into_reader()), size))
}

/// Percent-encode a package name for the metadata URL, leaving `@` and the
/// scoped-name `/` intact.
fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'@' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
