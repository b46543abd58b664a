//! Single-child process supervisor.
//!
//! The child runs in its own process group so a restart takes down everything
//! it spawned. A restart SIGKILLs the group and reaps the child before the
//! replacement is spawned, so two generations never overlap.

use crate::error::ProcessError;
use crate::process::CommandSpec;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Lifecycle of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No child: never started, or the last spawn failed.
    Idle,
    /// A child is tracked (it may have exited on its own since).
    Running,
    /// Shut down; the last child was killed and reaped.
    Stopped,
}

/// How children are launched. They inherit the host's environment, stdio and
/// working directory; `dir` and `envs` override.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl LaunchOptions {
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

struct Tracked {
    child: Child,
    pid: u32,
    pgid: i32,
}

struct Lifecycle {
    spec: Option<CommandSpec>,
    current: Option<Tracked>,
    state: SupervisorState,
}

struct Shared {
    options: LaunchOptions,
    lifecycle: Mutex<Lifecycle>,
    /// Taken without the lifecycle lock so an interrupt can act while a
    /// restart is waiting. Held across spawn and registration of the group.
    gate: parking_lot::Mutex<Gate>,
    interrupt: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct Gate {
    /// Group of the live child, 0 when none.
    pgid: i32,
    /// Set by the interrupt listener; no child is spawned afterwards.
    interrupted: bool,
}

impl Shared {
    /// Refuse further spawns and kill the tracked group. Returns whether a
    /// live group was signalled.
    fn interrupt(&self) -> bool {
        let pgid = {
            let mut gate = self.gate.lock();
            gate.interrupted = true;
            std::mem::take(&mut gate.pgid)
        };
        Self::kill(pgid)
    }

    fn kill_tracked(&self) -> bool {
        let pgid = std::mem::take(&mut self.gate.lock().pgid);
        Self::kill(pgid)
    }

    fn kill(pgid: i32) -> bool {
        if pgid == 0 {
            return false;
        }
        match kill_group(pgid) {
            Ok(killed) => killed,
            Err(err) => {
                tracing::warn!(pgid, %err, "failed to kill process group");
                false
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(listener) = self.interrupt.get_mut().take() {
            listener.abort();
        }
        self.kill_tracked();
    }
}

/// Owns one logical command and at most one live child running it.
///
/// Cloning yields another handle to the same child.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

impl Supervisor {
    pub fn new(options: LaunchOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                lifecycle: Mutex::new(Lifecycle {
                    spec: None,
                    current: None,
                    state: SupervisorState::Idle,
                }),
                gate: parking_lot::Mutex::new(Gate::default()),
                interrupt: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Spawn `spec` and remember it for later restarts.
    ///
    /// A child that is already running is killed and reaped first. The spec is
    /// kept even when spawning fails, so [`restart`](Self::restart) retries it.
    ///
    /// # Errors
    ///
    /// [`ProcessError::Spawn`] when the program cannot be started.
    pub async fn start(&self, spec: CommandSpec) -> Result<u32, ProcessError> {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        lifecycle.spec = Some(spec);
        self.stop_current(&mut lifecycle).await?;
        self.spawn(&mut lifecycle)
    }

    /// Kill and reap the current child, then run the same command again.
    ///
    /// Returns the new child's pid. Only returns after the previous group has
    /// been signalled and its leader reaped.
    ///
    /// # Errors
    ///
    /// [`ProcessError::NotStarted`] before any [`start`](Self::start); otherwise
    /// kill, wait or spawn failures.
    pub async fn restart(&self) -> Result<u32, ProcessError> {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        if lifecycle.spec.is_none() {
            return Err(ProcessError::NotStarted);
        }
        self.stop_current(&mut lifecycle).await?;
        self.spawn(&mut lifecycle)
    }

    /// Kill and reap the current child and move to [`SupervisorState::Stopped`].
    pub async fn shutdown(&self) -> Result<(), ProcessError> {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        self.stop_current(&mut lifecycle).await?;
        lifecycle.state = SupervisorState::Stopped;
        Ok(())
    }

    pub async fn state(&self) -> SupervisorState {
        self.shared.lifecycle.lock().await.state
    }

    /// Pid of the tracked child, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.shared
            .lifecycle
            .lock()
            .await
            .current
            .as_ref()
            .map(|tracked| tracked.pid)
    }

    /// The command passed to the last [`start`](Self::start).
    pub async fn command(&self) -> Option<CommandSpec> {
        self.shared.lifecycle.lock().await.spec.clone()
    }

    /// Listen for an interrupt on behalf of this supervisor.
    ///
    /// When `trigger` resolves, the tracked process group is SIGKILLed and
    /// `on_interrupt` is called with whether a live group was killed. The host
    /// process decides what to do next (normally exit). From then on `start`
    /// and `restart` return [`ProcessError::Interrupted`]. Installing again
    /// replaces the previous listener.
    pub fn install_interrupt_handler<F, H>(&self, trigger: F, on_interrupt: H)
    where
        F: Future + Send + 'static,
        H: FnOnce(bool) + Send + 'static,
    {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let listener = tokio::spawn(async move {
            trigger.await;
            let killed = shared
                .upgrade()
                .is_some_and(|shared| shared.interrupt());
            tracing::debug!(killed, "interrupt received");
            on_interrupt(killed);
        });

        if let Some(previous) = self.shared.interrupt.lock().replace(listener) {
            previous.abort();
        }
    }

    async fn stop_current(&self, lifecycle: &mut Lifecycle) -> Result<(), ProcessError> {
        let Some(mut tracked) = lifecycle.current.take() else {
            return Ok(());
        };

        self.shared.gate.lock().pgid = 0;
        if let Err(source) = terminate(&mut tracked) {
            let pgid = tracked.pgid;
            self.shared.gate.lock().pgid = pgid;
            lifecycle.current = Some(tracked);
            return Err(ProcessError::Kill { pgid, source });
        }

        let status = tracked
            .child
            .wait()
            .await
            .map_err(|source| ProcessError::Wait {
                pid: tracked.pid,
                source,
            })?;
        tracing::debug!(pid = tracked.pid, %status, "child reaped");
        lifecycle.state = SupervisorState::Idle;
        Ok(())
    }

    fn spawn(&self, lifecycle: &mut Lifecycle) -> Result<u32, ProcessError> {
        let spec = lifecycle.spec.as_ref().ok_or(ProcessError::NotStarted)?;
        let options = &self.shared.options;

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &options.dir {
            command.current_dir(dir);
        }
        command.envs(options.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        #[cfg(unix)]
        command.process_group(0);

        let spawn_error = |source| ProcessError::Spawn {
            program: spec.program.clone(),
            source,
        };

        // An interrupt either sees the new group or stops it from being spawned.
        let mut gate = self.shared.gate.lock();
        if gate.interrupted {
            return Err(ProcessError::Interrupted);
        }
        let child = command.spawn().map_err(spawn_error)?;
        let Some(pid) = child.id() else {
            return Err(spawn_error(io::Error::other("child exited before its pid was read")));
        };

        // process_group(0) makes the child the leader of a group named after it.
        let pgid = pid as i32;
        gate.pgid = pgid;
        drop(gate);
        lifecycle.current = Some(Tracked { child, pid, pgid });
        lifecycle.state = SupervisorState::Running;
        tracing::debug!(pid, command = %spec, "child started");
        Ok(pid)
    }
}

#[cfg(unix)]
fn terminate(tracked: &mut Tracked) -> io::Result<()> {
    kill_group(tracked.pgid).map(|_| ())
}

#[cfg(not(unix))]
fn terminate(tracked: &mut Tracked) -> io::Result<()> {
    match tracked.child.start_kill() {
        Err(err) if err.kind() != io::ErrorKind::InvalidInput => Err(err),
        _ => Ok(()),
    }
}

/// SIGKILL a whole process group. `Ok(false)` when it no longer exists.
#[cfg(unix)]
fn kill_group(pgid: i32) -> io::Result<bool> {
    // SAFETY: killpg has no memory-safety preconditions.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(false)
    } else {
        Err(err)
    }
}

/// Without process groups only the direct child can be killed.
#[cfg(not(unix))]
fn kill_group(pid: i32) -> io::Result<bool> {
    let status = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()?;
    Ok(status.success())
}
