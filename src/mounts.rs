// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use anyhow::{Context, Result, bail};
use std::path::Path;

/// Default mount table on Linux.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// A file system as it was mounted at the time [`discover`] ran. Identity is
/// the mount point, which is what pairs a mount with its probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Read the mount table and return every mount whose file system type is in
/// `allowed_fs_types`. An empty allow-list (or one holding a single empty
/// string) allows every type.
///
/// An unreadable table or a malformed octal escape is an error: there is no
/// meaningful partial result without a mount list.
pub fn discover(mounts_file: &Path, allowed_fs_types: &[String]) -> Result<Vec<Mount>> {
    let contents = std::fs::read_to_string(mounts_file)
        .with_context(|| format!("failed to read mount table {}", mounts_file.display()))?;
    parse_mount_table(&contents, allowed_fs_types)
        .with_context(|| format!("failed to parse mount table {}", mounts_file.display()))
}

fn parse_mount_table(contents: &str, allowed_fs_types: &[String]) -> Result<Vec<Mount>> {
    let allow_all = allowed_fs_types.is_empty()
        || (allowed_fs_types.len() == 1 && allowed_fs_types[0].is_empty());

    let mut mounts = Vec::new();
    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        let (Some(device), Some(mount_point), Some(fs_type)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if !allow_all && !allowed_fs_types.iter().any(|t| t == fs_type) {
            continue;
        }
        mounts.push(Mount {
            device: unescape_octal(device)
                .with_context(|| format!("bad device field in line {line:?}"))?,
            mount_point: unescape_octal(mount_point)
                .with_context(|| format!("bad mount point field in line {line:?}"))?,
            fs_type: fs_type.to_string(),
        });
    }
    Ok(mounts)
}

/// Undo the kernel's `\NNN` octal quoting of special characters in
/// `/proc/mounts` fields, e.g. `This\040is\040a\040mountpoint` becomes
/// `This is a mountpoint`.
fn unescape_octal(quoted: &str) -> Result<String> {
    let mut unquoted = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unquoted.push(c);
            continue;
        }
        let digits: String = chars.by_ref().take(3).collect();
        if digits.chars().count() < 3 {
            bail!("truncated octal escape in {quoted:?}");
        }
        let value = u8::from_str_radix(&digits, 8)
            .with_context(|| format!("invalid octal escape \\{digits} in {quoted:?}"))?;
        unquoted.push(value as char);
    }
    Ok(unquoted)
}
