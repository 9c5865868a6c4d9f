#![allow(dead_code, unused_imports)]

use std::{
    net::{IpAddr, SocketAddr, TcpStream},
    path::PathBuf,
    process::{Child, Stdio},
    thread,
    time::{Duration, Instant},
};
/// Re-export some common utilities for system tests
pub use {
    anyhow::Result,
    assert_cmd::{cargo::CommandCargoExt, prelude::*, Command},
    assert_fs::{fixture::ChildPath, prelude::*, TempDir},
    predicates::prelude::*,
    pretty_assertions::{
        assert_eq as pretty_assert_eq, assert_ne as pretty_assert_ne,
        assert_str_eq as pretty_assert_str_eq,
    },
    regex_util::*,
    std::{error::Error, fmt::Display, fs, io, io::Write, path::Path, process::Output},
    testresult::{TestError, TestResult},
    thread_safe_port_distributor::{get_free_port, PortGuard},
};

use hub_share::{
    config::upload::{UploadArgs, DEFAULT_MAX_UPLOAD_SIZE},
    server::{handler::build_router, HubServer},
    target::ServeTarget,
};

pub mod thread_safe_port_distributor;

pub const BIN_NAME: &str = "hub";
pub const IP: &str = "127.0.0.1";

/// Convenience to return stdout/stderr without risking switching them (if instead a tuple of two Strings were used)
pub struct StdoutStderr {
    pub stdout: String,
    pub stderr: String,
}

/// Converts process output to their `status`, `stdout`, and `stderr` components,
/// asserts the output status is success (and prints diagnostics if it isn't), and finally
/// returns `stdout` & `stderr` as Strings for convenience, wrapped in a `StdoutStderr` instance for type-safety.
pub fn process_output_to_stdio_if_success(output: Output) -> Result<StdoutStderr> {
    let Output {
        status,
        stdout,
        stderr,
    } = output;

    let stdout = String::from_utf8(stdout)?;
    let stderr = String::from_utf8(stderr)?;

    assert!(
        status.success(),
        "Command failed with status: {status}\n - stdout: {stdout}\n - stderr: {stderr}"
    );

    Ok(StdoutStderr { stdout, stderr })
}

/// Upload settings pointing at `dir`
pub fn upload_args(dir: &Path, max_size: Option<u64>) -> UploadArgs {
    UploadArgs {
        dir: dir.to_path_buf(),
        max_size: max_size.unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
    }
}

/// Build the handlers for `target` and serve them on an OS assigned localhost port from a background thread.
///
/// The server thread lives until the test process exits.
pub fn serve_in_background(target: &ServeTarget, upload: &UploadArgs) -> Result<String> {
    let router = build_router(target, upload)?;
    let server = HubServer::bind(IP.parse()?, 0, router)?;
    let addr = server.local_addr()?;
    thread::Builder::new()
        .name(format!("hub server {addr}"))
        .spawn(move || server.serve())?;
    Ok(format!("http://{addr}"))
}

/// Blocking client that reports redirects instead of following them
pub fn client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// The `hub` binary running as a server, killed on drop
pub struct ServerProcess {
    child: Option<Child>,
    pub port: PortGuard,
}

impl ServerProcess {
    /// Spawn `hub --ip 127.0.0.1 --port <free> <args..>`, feeding `stdin` to the process
    /// (or `/dev/null` if `None`) and wait until it accepts connections.
    pub fn spawn<I, S>(args: I, stdin: Option<&[u8]>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        match stdin {
            Some(input) => Self::spawn_inner(args, Stdio::piped(), Some(input)),
            None => Self::spawn_inner(args, Stdio::null(), None),
        }
    }

    /// Like [`ServerProcess::spawn`] but with any `stdin` (a file, a socket, ..) left as is
    pub fn spawn_with_stdin<I, S>(args: I, stdin: Stdio) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Self::spawn_inner(args, stdin, None)
    }

    fn spawn_inner<I, S>(args: I, stdin: Stdio, input: Option<&[u8]>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let port = get_free_port(IP).expect("No free port");
        let mut cmd = std::process::Command::cargo_bin(BIN_NAME)?;
        cmd.args(["--ip", IP, "--port", port.as_str()])
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn()?;
        if let Some(input) = input {
            // Dropping the handle closes the pipe so the server sees EOF
            let mut pipe = child.stdin.take().expect("stdin is piped");
            pipe.write_all(input)?;
        }

        let mut process = Self {
            child: Some(child),
            port,
        };
        process.wait_until_listening(Duration::from_secs(20))?;
        Ok(process)
    }

    pub fn url(&self) -> String {
        format!("http://{IP}:{}", self.port.as_str())
    }

    fn wait_until_listening(&mut self, timeout: Duration) -> Result<()> {
        let addr = SocketAddr::new(IP.parse()?, self.port.as_u16());
        let start = Instant::now();
        while start.elapsed() < timeout {
            if TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok() {
                return Ok(());
            }
            if let Some(status) = self.child.as_mut().and_then(|c| c.try_wait().ok().flatten()) {
                anyhow::bail!("Server exited early with {status}");
            }
            thread::sleep(Duration::from_millis(50));
        }
        anyhow::bail!("Server didn't start listening on {addr} within {timeout:?}")
    }

    /// Stop the server and collect everything it printed
    pub fn stop(mut self) -> Result<StdoutStderr> {
        let mut child = self.child.take().expect("child is only taken once");
        child.kill()?;
        let Output { stdout, stderr, .. } = child.wait_with_output()?;
        Ok(StdoutStderr {
            stdout: String::from_utf8(stdout)?,
            stderr: String::from_utf8(stderr)?,
        })
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
