//! Core library for gopm: version algebra, registry client, streaming
//! extraction, breadth-first install dispatch, bin shims and manifest
//! handling. Used by the CLI binary.

pub mod bin_links;
pub mod config;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod install;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod task;
pub mod utils;
pub mod ux;
pub mod version;

// Re-export the main API for the CLI
pub use bin_links::{link_bins_for_package, link_global_binaries, rebuild_bin_links, BinLinkReport};
pub use error::InstallError;
pub use install::{
    expand_install, install_from_manifest, install_single, install_single_global, MAX_CONCURRENT,
};
pub use manifest::{Bin, PackageJson};
pub use registry::{fetch_metadata, open_tarball, RegistryDocument, VersionRecord};
pub use task::{process_install_task, InstallResult, InstallTask};
pub use utils::{format_bytes, log, log_error};
pub use ux::{uninstall, uninstall_global, update_all, update_package};
pub use version::{compare_versions, range_matches, select_version, Constraint};
