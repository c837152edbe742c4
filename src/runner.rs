//! External process execution.
//!
//! Every invocation carries its own working directory; there is no ambient
//! "current directory" shared between pipeline stages. Callers that need to
//! bound a network-bound command (such as `git push`) attach a timeout.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    directory: Utf8PathBuf,
    removed_env: Vec<String>,
    timeout: Option<Duration>,
}

impl Invocation {
    /// Describe `program` run inside `directory`.
    #[must_use]
    pub fn new(program: impl Into<String>, directory: &Utf8Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            directory: directory.to_owned(),
            removed_env: Vec::new(),
            timeout: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Remove `name` from the child's environment.
    #[must_use]
    pub fn without_env(mut self, name: impl Into<String>) -> Self {
        self.removed_env.push(name.into());
        self
    }

    /// Kill the child if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments passed to the program.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The working directory for the child.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// Environment variables removed for the child.
    #[must_use]
    pub fn removed_env(&self) -> &[String] {
        &self.removed_env
    }

    /// Upper bound on the child's run time, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Render the command line for diagnostics.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run the invocation to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while spawning or waiting for the child,
    /// or [`io::ErrorKind::TimedOut`] if the invocation's timeout elapsed.
    fn run(&self, invocation: &Invocation) -> io::Result<Output>;
}

/// Runs commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<Output> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(invocation.directory.as_std_path())
            .stdin(Stdio::null());
        for name in &invocation.removed_env {
            cmd.env_remove(name);
        }
        log::debug!(
            "running `{}` in {}",
            invocation.command_line(),
            invocation.directory
        );

        match invocation.timeout {
            Some(timeout) => run_with_timeout(&mut cmd, timeout),
            None => cmd.output(),
        }
    }
}

fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Output> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd.spawn()?;

    // Drain both pipes while waiting so a chatty child cannot fill one and
    // block before it exits.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    match child.wait_timeout(timeout)? {
        Some(status) => Ok(Output {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        }),
        None => {
            // Best effort: the child may already have exited.
            let _ = child.kill();
            let _ = child.wait();
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {} seconds", timeout.as_secs()),
            ))
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        pipe.read_to_end(&mut buffer)?;
        Ok(buffer)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    reader
        .join()
        .map_err(|_| io::Error::other("output reader thread panicked"))?
}

/// Combine a command's stdout and stderr for diagnostics.
#[must_use]
pub fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (true, _) => stderr.trim().to_owned(),
        (false, true) => stdout.trim().to_owned(),
        (false, false) => format!("{}\n{}", stdout.trim(), stderr.trim()),
    }
}
