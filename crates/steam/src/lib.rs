pub mod client;
pub mod controller;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod launcher;
pub mod paths;
pub mod process;
pub mod registry;
pub mod username;
pub mod users;
pub mod vdf;

use std::fmt;
use std::io;

// Re-export primary types.
pub use client::Steam;
pub use controller::ProcessController;
pub use launcher::{CommandSpawner, LaunchController, SpawnedProcess, Spawner};
pub use paths::{InstallDirectory, ResolvedInstallation, STEAM_EXE, normalize_path};
pub use process::{ProcessMatch, ProcessTable, Scan, SystemProcessTable, scan};
pub use registry::{ConfigStore, PathStore, RegistryStore};
pub use username::{Username, UsernameError};
pub use users::{LoginUser, load_login_users, login_users, parse_login_users};

/// Result alias for Steam operations.
pub type Result<T> = std::result::Result<T, SteamError>;

/// The step of an operation that failed.
///
/// Ordered in the sequence a full lifecycle touches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    ReadRegistry,
    WriteRegistry,
    ResolvePath,
    LaunchProcess,
    WaitForExit,
    EnumerateProcesses,
    TerminateProcess,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::ReadRegistry => write!(f, "read-registry"),
            Phase::WriteRegistry => write!(f, "write-registry"),
            Phase::ResolvePath => write!(f, "resolve-path"),
            Phase::LaunchProcess => write!(f, "launch-process"),
            Phase::WaitForExit => write!(f, "wait-for-exit"),
            Phase::EnumerateProcesses => write!(f, "enumerate-processes"),
            Phase::TerminateProcess => write!(f, "terminate-process"),
        }
    }
}

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("failed to read Steam's registry value: {0}")]
    ReadRegistry(io::Error),

    #[error("failed to write Steam's registry value: {0}")]
    WriteRegistry(io::Error),

    #[error("malformed Steam install path: {0:?}")]
    MalformedInstallPath(String),

    #[error("failed to launch Steam: {0}")]
    LaunchProcess(io::Error),

    #[error("failed to wait for Steam to exit: {0}")]
    WaitForExit(io::Error),

    #[error("failed to enumerate processes: {0}")]
    EnumerateProcesses(io::Error),

    #[error("failed to terminate a Steam process: {0}")]
    TerminateProcess(io::Error),

    #[error("the auto-login username in the registry is invalid: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("VDF parse error: {0}")]
    Vdf(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl SteamError {
    /// Returns the phase this error was raised in, if it belongs to one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SteamError::ReadRegistry(_) | SteamError::InvalidUsername(_) => {
                Some(Phase::ReadRegistry)
            }
            SteamError::WriteRegistry(_) => Some(Phase::WriteRegistry),
            SteamError::MalformedInstallPath(_) => Some(Phase::ResolvePath),
            SteamError::LaunchProcess(_) => Some(Phase::LaunchProcess),
            SteamError::WaitForExit(_) => Some(Phase::WaitForExit),
            SteamError::EnumerateProcesses(_) => Some(Phase::EnumerateProcesses),
            SteamError::TerminateProcess(_) => Some(Phase::TerminateProcess),
            SteamError::Vdf(_) | SteamError::Io(_) => None,
        }
    }

    /// Returns the raw OS error code carried by this error, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            SteamError::ReadRegistry(e)
            | SteamError::WriteRegistry(e)
            | SteamError::LaunchProcess(e)
            | SteamError::WaitForExit(e)
            | SteamError::EnumerateProcesses(e)
            | SteamError::TerminateProcess(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
