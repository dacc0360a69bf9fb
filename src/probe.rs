// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

//! The liveness-probe engine. A blocked filesystem syscall on a dead network
//! mount cannot be interrupted from inside the same process, so each probe
//! runs as a child re-exec of this binary (see `probe_mode`) that the parent
//! can kill when the timeout fires. One task per mount; a hung mount only
//! ever costs its own timeout window.

use crate::mounts::Mount;
use crate::{probe_mode, selfexe};
use log::{debug, error, warn};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The probe confirmed the filesystem responds.
    Live,
    /// The probe observed a genuine I/O failure and reported it before
    /// exiting.
    NotLive,
    /// The probe was killed by the timeout or never launched; the mount's
    /// true state is unknown.
    Inconclusive,
}

/// What one probe invocation established about one mount.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub verdict: Verdict,
    /// A failure was actually observed: the child reported an I/O error or
    /// could not be launched. A timeout kill is not an error; it is unknown.
    pub error: bool,
    /// Wall-clock time from launch to resolution. Approximately the timeout
    /// bound when the probe was killed, near zero on launch failure.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn is_live(&self) -> bool {
        self.verdict == Verdict::Live
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// One mount paired with its probe outcome. Produced by [`run_cycle`] in
/// discovery order.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub mount: Mount,
    pub outcome: ProbeOutcome,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// How long a probe may run before its child is killed.
    pub timeout: Duration,
    /// File to read under each mount point; `None` lists the mount point
    /// itself with readdir().
    pub read_file: Option<String>,
    /// Probe binary override; `None` resolves the running executable at
    /// launch. Tests inject stand-in binaries here.
    pub probe_bin: Option<PathBuf>,
}

/// Handle to a probe already in flight.
pub struct ProbeHandle {
    task: JoinHandle<ProbeOutcome>,
}

impl ProbeHandle {
    /// Wait for the probe to resolve. The probe runs on its own task from
    /// the moment it was launched, so joining late never delays it.
    pub async fn join(self) -> ProbeOutcome {
        self.task.await.unwrap_or_else(|err| {
            error!("probe task failed to join: {err}");
            ProbeOutcome {
                verdict: Verdict::Inconclusive,
                error: true,
                elapsed: Duration::ZERO,
            }
        })
    }
}

/// Launch one probe of `mount` and return immediately; the returned handle
/// resolves once the child exits, errors out, or is killed by the timeout.
pub fn launch(mount: &Mount, config: &ProbeConfig) -> ProbeHandle {
    let (mode, target) = match config.read_file {
        Some(ref name) => (probe_mode::MODE_READ, Path::new(&mount.mount_point).join(name)),
        None => (probe_mode::MODE_READDIR, PathBuf::from(&mount.mount_point)),
    };
    let mount_point = mount.mount_point.clone();
    let config = config.clone();
    ProbeHandle {
        task: tokio::spawn(async move { probe(&mount_point, mode, &target, &config).await }),
    }
}

async fn probe(mount_point: &str, mode: &str, target: &Path, config: &ProbeConfig) -> ProbeOutcome {
    let start = Instant::now();

    let bin = match config.probe_bin {
        Some(ref bin) => bin.clone(),
        None => match selfexe::locate() {
            Ok(path) => path,
            Err(err) => {
                error!("[{mount_point}] {err:#}");
                return inconclusive(true, start);
            }
        },
    };

    debug!(
        "[{mount_point}] starting liveness probe ({mode} {})",
        target.display()
    );

    let mut cmd = Command::new(&bin);
    cmd.arg(mode)
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(
                "[{mount_point}] failed to launch probe {}: {err}",
                bin.display()
            );
            return inconclusive(true, start);
        }
    };

    match timeout(config.timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let outcome = classify(mount_point, status, start.elapsed());
            debug!(
                "[{mount_point}] liveness probe ended ({:?} after {:.3}s)",
                outcome.verdict,
                outcome.elapsed_secs()
            );
            outcome
        }
        Ok(Err(err)) => {
            error!("[{mount_point}] failed to wait on probe: {err}");
            inconclusive(true, start)
        }
        Err(_) => {
            // Abandoning the wait is not enough: the child must be killed
            // and reaped, or a wedged syscall keeps its resources pinned to
            // this process indefinitely.
            warn!(
                "[{mount_point}] probe still running after {:.1}s, killing it",
                config.timeout.as_secs_f64()
            );
            if let Err(err) = child.kill().await {
                warn!("[{mount_point}] failed to kill timed-out probe: {err}");
            }
            inconclusive(false, start)
        }
    }
}

fn inconclusive(error: bool, start: Instant) -> ProbeOutcome {
    ProbeOutcome {
        verdict: Verdict::Inconclusive,
        error,
        elapsed: start.elapsed(),
    }
}

/// Map a probe child's termination to a verdict. Exit 0 is the liveness
/// protocol's "alive"; any other exit code is a failure the child observed
/// and reported; death by signal means our timeout killed it, which proves
/// nothing either way.
fn classify(mount_point: &str, status: ExitStatus, elapsed: Duration) -> ProbeOutcome {
    if status.success() {
        return ProbeOutcome {
            verdict: Verdict::Live,
            error: false,
            elapsed,
        };
    }
    match status.code() {
        Some(code) => {
            error!("[{mount_point}] probe reported failure (exit status {code})");
            ProbeOutcome {
                verdict: Verdict::NotLive,
                error: true,
                elapsed,
            }
        }
        None => ProbeOutcome {
            verdict: Verdict::Inconclusive,
            error: false,
            elapsed,
        },
    }
}

/// Probe every mount concurrently and pair each with its outcome.
///
/// Every probe is launched before any is joined, so total cycle latency is
/// bounded by the slowest single probe (at most the timeout), never by the
/// sum. Pairing is by the mount captured at launch, not completion order.
pub async fn run_cycle(mounts: Vec<Mount>, config: &ProbeConfig) -> Vec<ProbeResult> {
    let handles: Vec<(Mount, ProbeHandle)> = mounts
        .into_iter()
        .map(|mount| {
            let handle = launch(&mount, config);
            (mount, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (mount, handle) in handles {
        let outcome = handle.join().await;
        results.push(ProbeResult { mount, outcome });
    }
    results
}
