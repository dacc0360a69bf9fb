// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use crate::cli::Args;
use crate::probe::ProbeConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Exporter configuration, built once from the parsed CLI and passed by
/// value; no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_address: String,
    pub mounts_file: PathBuf,
    /// Allowed file system types; empty means every type.
    pub fs_types: Vec<String>,
    pub probe: ProbeConfig,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        // `--check.fstypes ""` means "allow every type"; normalize that to
        // an empty allow-list.
        let fs_types: Vec<String> = args
            .fs_types
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();

        Config {
            listen_address: args.listen_address.clone(),
            mounts_file: args.mounts_file.clone(),
            fs_types,
            probe: ProbeConfig {
                timeout: Duration::from_secs(args.timeout_secs),
                read_file: args.read_file.clone(),
                probe_bin: None,
            },
        }
    }
}
