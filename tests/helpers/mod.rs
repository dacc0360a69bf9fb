// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const BIN: &str = env!("CARGO_BIN_EXE_mountprobed");

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a running mountprobed exporter.
pub struct DaemonHandle {
    child: Child,
    log_lines: Arc<Mutex<Vec<String>>>,
    _stdout_thread: std::thread::JoinHandle<()>,
    _stderr_thread: std::thread::JoinHandle<()>,
}

impl DaemonHandle {
    /// Start the exporter on an ephemeral port with the given extra flags.
    pub fn start(extra_args: &[&str]) -> Self {
        let mut child = Command::new(BIN)
            .arg("--web.listen-address")
            .arg("127.0.0.1:0")
            .args(extra_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start mountprobed");

        let stdout = child.stdout.take().expect("failed to capture stdout");
        let stderr = child.stderr.take().expect("failed to capture stderr");
        let log_lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let lines_clone = Arc::clone(&log_lines);
        let lines_clone2 = Arc::clone(&log_lines);

        // simple_logger writes INFO to stdout, WARN/ERROR to stderr.
        let stdout_thread = std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        eprintln!("[daemon] {l}");
                        lines_clone.lock().unwrap().push(l);
                    }
                    Err(_) => break,
                }
            }
        });

        let stderr_thread = std::thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        eprintln!("[daemon:err] {l}");
                        lines_clone2.lock().unwrap().push(l);
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            child,
            log_lines,
            _stdout_thread: stdout_thread,
            _stderr_thread: stderr_thread,
        }
    }

    /// Wait until a log line containing `pattern` appears, or timeout.
    pub fn wait_for_log(&self, pattern: &str, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let lines = self.log_lines.lock().unwrap();
                if let Some(line) = lines.iter().find(|l| l.contains(pattern)) {
                    return Some(line.clone());
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    /// The `host:port` the exporter actually bound, scraped from its logs.
    pub fn metrics_addr(&self) -> String {
        let line = self
            .wait_for_log("serving metrics on http://", DEFAULT_TIMEOUT)
            .expect("daemon never logged its listen address");
        let start = line.find("http://").unwrap() + "http://".len();
        let end = line[start..].find('/').expect("malformed address log") + start;
        line[start..end].to_string()
    }

    /// Send SIGTERM and wait for the exporter to exit.
    pub fn stop(&mut self) -> ExitStatus {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        signal::kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM)
            .expect("failed to send SIGTERM to daemon");

        let deadline = Instant::now() + DEFAULT_TIMEOUT;
        loop {
            match self.child.try_wait().expect("failed to check daemon status") {
                Some(status) => return status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        return self.child.wait().expect("failed to wait on killed daemon");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Plain HTTP/1.0 GET; returns the status line and the body.
pub fn http_get(addr: &str, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).expect("failed to connect to daemon");
    stream
        .set_read_timeout(Some(Duration::from_secs(30)))
        .expect("failed to set read timeout");
    write!(stream, "GET {path} HTTP/1.0\r\nHost: localhost\r\n\r\n").expect("failed to send request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("failed to read response");

    let status_line = response.lines().next().unwrap_or_default().to_string();
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status_line, body)
}

/// Write a mount-table file with one line per (device, mount_point, fs_type).
pub fn write_mount_table(path: &std::path::Path, entries: &[(&str, &str, &str)]) {
    let mut contents = String::new();
    for (device, mount_point, fs_type) in entries {
        contents.push_str(&format!("{device} {mount_point} {fs_type} rw 0 0\n"));
    }
    std::fs::write(path, contents).expect("failed to write mount table");
}
