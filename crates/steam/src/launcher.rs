//! Starting and gracefully stopping the Steam client.

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use crate::paths::ResolvedInstallation;
use crate::{Result, SteamError};

/// Arguments that skip Steam's file verification on start.
///
/// Steam drops the first token of a raw command line as if it were its own
/// path, so the flag only takes effect when passed twice.
pub const NO_VERIFY_FILES_ARGS: &str = "-noverifyfiles -noverifyfiles";

/// Asks a running Steam client to exit.
pub const SHUTDOWN_ARGS: &str = "-shutdown";

/// A spawned process. Dropping it releases its handles without waiting.
pub trait SpawnedProcess {
    /// Blocks until the process exits.
    fn wait(&mut self) -> io::Result<()>;
}

impl SpawnedProcess for Child {
    fn wait(&mut self) -> io::Result<()> {
        Child::wait(self).map(|_| ())
    }
}

/// Creates processes from an executable path and a raw argument string.
pub trait Spawner {
    type Child: SpawnedProcess;

    fn spawn(&self, exe: &Path, args: Option<&str>) -> io::Result<Self::Child>;
}

impl<S: Spawner + ?Sized> Spawner for &S {
    type Child = S::Child;

    fn spawn(&self, exe: &Path, args: Option<&str>) -> io::Result<Self::Child> {
        (**self).spawn(exe, args)
    }
}

/// [`Spawner`] built on [`std::process::Command`].
///
/// On Windows the child gets its own process group and `args` is appended to
/// the command line verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpawner;

impl Spawner for CommandSpawner {
    type Child = Child;

    fn spawn(&self, exe: &Path, args: Option<&str>) -> io::Result<Child> {
        let mut command = Command::new(exe);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        add_args(&mut command, args);
        command.spawn()
    }
}

#[cfg(target_os = "windows")]
fn add_args(command: &mut Command, args: Option<&str>) {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
    if let Some(args) = args {
        command.raw_arg(args);
    }
}

#[cfg(not(target_os = "windows"))]
fn add_args(command: &mut Command, args: Option<&str>) {
    if let Some(args) = args {
        command.args(args.split_whitespace());
    }
}

/// Launches and shuts down Steam through a [`Spawner`].
///
/// The executable is not checked for existence first; a stale path surfaces
/// as a [`SteamError::LaunchProcess`] from the OS.
#[derive(Debug, Clone)]
pub struct LaunchController<S> {
    spawner: S,
}

impl<S: Spawner> LaunchController<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Starts Steam without waiting for it.
    pub fn launch(&self, install: &ResolvedInstallation) -> Result<()> {
        self.spawn(install, None)?;
        tracing::info!(exe = %install, "Steam launched");
        Ok(())
    }

    /// Starts Steam, skipping its file verification.
    pub fn launch_fast(&self, install: &ResolvedInstallation) -> Result<()> {
        self.spawn(install, Some(NO_VERIFY_FILES_ARGS))?;
        tracing::info!(exe = %install, "Steam launched without file verification");
        Ok(())
    }

    /// Asks Steam to exit and blocks until the helper process it spawns for
    /// that has exited. There is no timeout.
    pub fn shutdown(&self, install: &ResolvedInstallation) -> Result<()> {
        let mut helper = self.spawn(install, Some(SHUTDOWN_ARGS))?;
        helper.wait().map_err(SteamError::WaitForExit)?;
        tracing::info!("Steam shutdown requested");
        Ok(())
    }

    fn spawn(&self, install: &ResolvedInstallation, args: Option<&str>) -> Result<S::Child> {
        tracing::debug!(exe = %install, args = args.unwrap_or(""), "spawning Steam");
        self.spawner
            .spawn(&install.exe_path(), args)
            .map_err(SteamError::LaunchProcess)
    }
}

impl Default for LaunchController<CommandSpawner> {
    fn default() -> Self {
        Self::new(CommandSpawner)
    }
}
