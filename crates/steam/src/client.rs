//! The installed Steam client.

use crate::Result;
use crate::controller::ProcessController;
use crate::launcher::{CommandSpawner, LaunchController, Spawner};
use crate::paths::{InstallDirectory, ResolvedInstallation};
use crate::process::{ProcessTable, SystemProcessTable};
use crate::registry::{ConfigStore, PathStore, RegistryStore};
use crate::username::Username;
use crate::users::{LoginUser, login_users};

/// Handle to the installed Steam client.
///
/// Resolves the installation once on construction; call
/// [`refresh`](Self::refresh) to pick up a changed registry value.
#[derive(Debug)]
pub struct Steam<C = RegistryStore, T = SystemProcessTable, S = CommandSpawner> {
    paths: PathStore<C>,
    processes: ProcessController<T>,
    launcher: LaunchController<S>,
    install: ResolvedInstallation,
    dir: InstallDirectory,
}

impl Steam {
    /// Locates Steam through the current user's registry.
    pub fn new() -> Result<Self> {
        Self::with_parts(RegistryStore::new(), SystemProcessTable::new(), CommandSpawner)
    }
}

impl<C: ConfigStore, T: ProcessTable, S: Spawner> Steam<C, T, S> {
    /// Builds a client over the given collaborators.
    pub fn with_parts(store: C, table: T, spawner: S) -> Result<Self> {
        let paths = PathStore::new(store);
        let install = paths.resolve_executable_path()?;
        let dir = InstallDirectory::derive(&install)?;
        Ok(Self {
            paths,
            processes: ProcessController::new(table),
            launcher: LaunchController::new(spawner),
            install,
            dir,
        })
    }

    /// Re-reads the executable path from the registry.
    pub fn refresh(&mut self) -> Result<()> {
        let install = self.paths.resolve_executable_path()?;
        self.dir = InstallDirectory::derive(&install)?;
        self.install = install;
        Ok(())
    }

    pub fn installation(&self) -> &ResolvedInstallation {
        &self.install
    }

    pub fn install_dir(&self) -> &InstallDirectory {
        &self.dir
    }

    pub fn processes(&self) -> &ProcessController<T> {
        &self.processes
    }

    /// Checks if any Steam process is running.
    pub fn is_running(&self) -> Result<bool> {
        self.processes.is_running(&self.dir)
    }

    /// Kills all Steam processes.
    ///
    /// Returns whether any were found and killed.
    pub fn kill(&self) -> Result<bool> {
        self.processes.kill_all(&self.dir)
    }

    /// Launches Steam.
    ///
    /// See also: [`Self::launch_fast`].
    pub fn launch(&self) -> Result<()> {
        self.launcher.launch(&self.install)
    }

    /// Launches Steam, skipping Steam's file checks.
    pub fn launch_fast(&self) -> Result<()> {
        self.launcher.launch_fast(&self.install)
    }

    /// Gracefully shuts down Steam, blocking until the shutdown request has
    /// been handed over.
    pub fn shutdown(&self) -> Result<()> {
        self.launcher.shutdown(&self.install)
    }

    /// Sets the Steam user that Steam will attempt to automatically log into.
    pub fn set_auto_login_user(&self, username: &Username) -> Result<()> {
        self.paths.set_auto_login_user(username)
    }

    /// Gets the Steam user that Steam will attempt to automatically log into.
    pub fn get_auto_login_user(&self) -> Result<Username> {
        self.paths.get_auto_login_user()
    }

    /// Lists the accounts that have logged into this installation.
    pub fn login_users(&self) -> Result<Vec<LoginUser>> {
        login_users(&self.dir)
    }
}
