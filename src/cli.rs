// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "mountprobed")]
#[command(
    about = "Exports liveness metrics for mounted file systems, probing each one in a killable child process",
    long_about = None
)]
pub struct Args {
    /// Address on which to expose metrics
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:10458")]
    pub listen_address: String,

    /// Name of a file to read under each mount point; if unspecified,
    /// default to readdir() of the mount point
    #[arg(long = "check.read-file")]
    pub read_file: Option<String>,

    /// Seconds to wait until declaring a liveness check failed
    #[arg(long = "check.timeout", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Comma-separated file system types to include in the liveness check;
    /// pass the empty string to allow all
    #[arg(
        long = "check.fstypes",
        value_delimiter = ',',
        default_value = "nfs,nfs4,nfs3,cephfs,fuse.sshfs"
    )]
    pub fs_types: Vec<String>,

    /// Mount table to scan for candidate file systems
    #[arg(long = "check.mounts-file", default_value = crate::mounts::PROC_MOUNTS)]
    pub mounts_file: PathBuf,

    /// Print liveness check progress on standard error
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal probe-child invocation: <read|readdir> <path>
    #[arg(value_names = ["MODE", "PATH"], hide = true)]
    pub probe: Vec<String>,
}

impl Args {
    /// The two-argument trailing form marks this process as a probe child.
    pub fn probe_invocation(&self) -> Option<(&str, &Path)> {
        match self.probe.as_slice() {
            [mode, path] => Some((mode, Path::new(path))),
            _ => None,
        }
    }
}
