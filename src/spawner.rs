//! Process spawning seam.
//!
//! The engine never calls `std::process::Command` directly; it goes through
//! a [`ProcessSpawner`], which offers two separate capabilities:
//!
//! - `run_foreground`: run through the shell, stream output, wait for exit
//! - `launch_detached`: start and return at once; only a reaper waits on it
//!
//! [`SystemSpawner`] is the real implementation. Tests swap in their own.

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

/// A program invocation resolved against the current working directory.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub program: &'a str,
    pub args: &'a [String],
    pub cwd: &'a Path,
}

impl SpawnRequest<'_> {
    /// Program and arguments joined back into a single shell line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Starts subprocesses on behalf of a script run.
pub trait ProcessSpawner {
    /// Run the request through the system shell and wait for it.
    ///
    /// Returns the exit code, or `None` if the process was killed by a signal.
    fn run_foreground(&self, request: &SpawnRequest<'_>) -> io::Result<Option<i32>>;

    /// Start the request fully detached and return without waiting.
    fn launch_detached(&self, request: &SpawnRequest<'_>) -> io::Result<()>;
}

impl<S: ProcessSpawner + ?Sized> ProcessSpawner for &S {
    fn run_foreground(&self, request: &SpawnRequest<'_>) -> io::Result<Option<i32>> {
        (**self).run_foreground(request)
    }

    fn launch_detached(&self, request: &SpawnRequest<'_>) -> io::Result<()> {
        (**self).launch_detached(request)
    }
}

/// Spawns real processes with `sh -c`.
///
/// Foreground output is copied to this process's stdout and stderr as it
/// arrives. Foreground children are registered with the global
/// [`ChildRegistry`] while they run; detached ones never are.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn run_foreground(&self, request: &SpawnRequest<'_>) -> io::Result<Option<i32>> {
        let line = request.command_line();
        debug!(command = %line, cwd = %request.cwd.display(), "spawning foreground command");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .current_dir(request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .in_new_process_group()
            .spawn()?;
        let pid = child.id();

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }

        let stdout_pump = child
            .stdout
            .take()
            .map(|mut out| thread::spawn(move || pump(&mut out, &mut io::stdout())));
        let stderr_pump = child
            .stderr
            .take()
            .map(|mut err| thread::spawn(move || pump(&mut err, &mut io::stderr())));

        let status = child.wait();

        for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
            if pump.join().is_err() {
                warn!(pid, "output pump thread panicked");
            }
        }

        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(pid);
        }

        let status = status?;
        debug!(pid, code = ?status.code(), "foreground command exited");
        Ok(status.code())
    }

    fn launch_detached(&self, request: &SpawnRequest<'_>) -> io::Result<()> {
        debug!(
            program = request.program,
            args = ?request.args,
            cwd = %request.cwd.display(),
            "launching background command"
        );

        // Not registered for cleanup. A reaper thread owns the handle so the
        // exited child does not linger as a zombie while the run continues.
        let mut child = Command::new(request.program)
            .args(request.args)
            .current_dir(request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .detached_from_parent()
            .spawn()?;
        let pid = child.id();
        debug!(pid, "background command started");

        thread::spawn(move || match child.wait() {
            Ok(status) => debug!(pid, code = ?status.code(), "background command exited"),
            Err(e) => warn!(pid, error = %e, "failed to reap background command"),
        });
        Ok(())
    }
}

/// Copy a child stream to one of ours until EOF.
fn pump(source: &mut impl io::Read, sink: &mut impl Write) {
    let mut buf = [0u8; 8192];
    loop {
        match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if sink.write_all(&buf[..n]).and_then(|_| sink.flush()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_command_line_joins_program_and_args() {
        let args = vec!["-la".to_string(), "/tmp".to_string()];
        let request = SpawnRequest {
            program: "ls",
            args: &args,
            cwd: Path::new("/"),
        };
        assert_eq!(request.command_line(), "ls -la /tmp");
    }

    #[test]
    fn test_foreground_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["7".to_string()];
        let request = SpawnRequest {
            program: "exit",
            args: &args,
            cwd: dir.path(),
        };
        let code = SystemSpawner.run_foreground(&request).unwrap();
        assert_eq!(code, Some(7));
    }

    #[test]
    fn test_foreground_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["marker".to_string()];
        let request = SpawnRequest {
            program: "touch",
            args: &args,
            cwd: dir.path(),
        };
        assert_eq!(SystemSpawner.run_foreground(&request).unwrap(), Some(0));
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_foreground_missing_cwd_is_spawn_error() {
        let request = SpawnRequest {
            program: "true",
            args: &[],
            cwd: Path::new("/definitely/not/here"),
        };
        assert!(SystemSpawner.run_foreground(&request).is_err());
    }

    #[test]
    fn test_detached_returns_before_child_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["2".to_string()];
        let request = SpawnRequest {
            program: "sleep",
            args: &args,
            cwd: dir.path(),
        };
        let start = Instant::now();
        SystemSpawner.launch_detached(&request).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    /// Hands out its bytes in fixed chunks, failing once with `Interrupted`
    struct ChunkedReader {
        chunks: Vec<&'static [u8]>,
        interrupt_first: bool,
        reads: usize,
    }

    impl io::Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.interrupt_first {
                self.interrupt_first = false;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_pump_copies_until_eof() {
        let mut source = io::Cursor::new(b"line one\nline two\n".to_vec());
        let mut sink = Vec::new();
        pump(&mut source, &mut sink);
        assert_eq!(sink, b"line one\nline two\n");
    }

    #[test]
    fn test_pump_retries_after_interrupt() {
        let mut source = ChunkedReader {
            chunks: vec![b"abc".as_slice(), b"def".as_slice()],
            interrupt_first: true,
            reads: 0,
        };
        let mut sink = Vec::new();
        pump(&mut source, &mut sink);
        assert_eq!(sink, b"abcdef");
        assert_eq!(source.reads, 4);
    }

    #[test]
    fn test_pump_stops_when_sink_fails() {
        let mut source = ChunkedReader {
            chunks: vec![b"abc".as_slice(), b"def".as_slice(), b"ghi".as_slice()],
            interrupt_first: false,
            reads: 0,
        };
        pump(&mut source, &mut BrokenSink);
        assert_eq!(source.reads, 1);
    }

    #[test]
    fn test_detached_unknown_program_fails() {
        let dir = tempfile::tempdir().unwrap();
        let request = SpawnRequest {
            program: "no-such-program-stepscript",
            args: &[],
            cwd: dir.path(),
        };
        assert!(SystemSpawner.launch_detached(&request).is_err());
    }
}
