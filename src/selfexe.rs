// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Resolve the path of the currently running executable image (via
/// `/proc/self/exe` on Linux).
///
/// Probe children must be the identical build as the exporter that launches
/// them, so the path always comes from the live process image, never from
/// argv or a PATH lookup. Resolution is idempotent and side-effect free; a
/// platform without support reports an error rather than crashing.
pub fn locate() -> Result<PathBuf> {
    std::env::current_exe().context("cannot determine the path of the running executable")
}
