//! Registry endpoint resolution: env override, optional .gopmrc, default.

use std::path::PathBuf;

use crate::utils;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Resolve the registry base URL: GOPM_REGISTRY env var, then the
/// `registryUrl` key of a JSON .gopmrc (current directory, then home), then
/// the default. Trailing slashes are trimmed.
pub fn registry_url() -> String {
    if let Ok(url) = std::env::var("GOPM_REGISTRY") {
        if !url.is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }
    for path in rc_candidates() {
        if path.is_file() {
            if let Ok(s) = std::fs::read_to_string(&path) {
                if let Ok(v) = serde_json::from_str::<serde_json::Value>(&s) {
                    if let Some(url) = v.get("registryUrl").and_then(|x| x.as_str()) {
                        return url.trim_end_matches('/').to_string();
                    }
                }
            }
            break;
        }
    }
    DEFAULT_REGISTRY_URL.to_string()
}

fn rc_candidates() -> Vec<PathBuf> {
    let mut out = vec![PathBuf::from(".gopmrc")];
    if let Some(home) = utils::home_dir() {
        out.push(home.join(".gopmrc"));
    }
    out
}
