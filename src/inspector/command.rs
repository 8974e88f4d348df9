// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! External tool runner with a hard deadline.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ProbeError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run `program` and return its stdout.
///
/// The child is killed once `timeout` elapses. A non-zero exit status is a
/// failure. Stdout is drained on a helper thread so a chatty tool cannot
/// block on a full pipe while we wait for it.
pub(crate) fn run(
    probe: &str,
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, ProbeError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ProbeError::io(probe, &format!("cannot run {}", program), e))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProbeError::new(probe, format!("{} has no stdout", program)))?;
    let reader = thread::spawn(move || {
        let mut buf = String::new();
        stdout.read_to_string(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::timeout(probe, program, timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(ProbeError::io(probe, &format!("waiting for {}", program), e));
            }
        }
    };

    let output = reader
        .join()
        .map_err(|_| ProbeError::new(probe, format!("reading {} output panicked", program)))?
        .map_err(|e| ProbeError::io(probe, &format!("reading {} output", program), e))?;

    if !status.success() {
        return Err(ProbeError::new(
            probe,
            format!("{} exited with {}", program, status),
        ));
    }
    Ok(output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let out = run("test", "sh", &["-c", "echo hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_run_times_out() {
        let start = Instant::now();
        let err = run("test", "sh", &["-c", "sleep 5"], Duration::from_millis(100)).unwrap_err();
        assert!(err.cause.contains("did not finish within 100 ms"));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_nonzero_exit() {
        let err = run("test", "sh", &["-c", "exit 3"], Duration::from_secs(5)).unwrap_err();
        assert_eq!(err.probe_name, "test");
        assert!(err.cause.starts_with("sh exited with"));
    }

    #[test]
    fn test_run_missing_program() {
        let err = run(
            "gpu",
            "definitely-not-a-real-tool-5c1f",
            &[],
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.cause.starts_with("cannot run definitely-not-a-real-tool-5c1f"));
    }
}
