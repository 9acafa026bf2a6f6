//! Registry-backed Steam values: the executable path and the auto-login user.
//!
//! The key/value primitive is abstracted behind [`ConfigStore`]; the Windows
//! implementation lives in `registry_windows.rs`.

use std::io;

use crate::paths::ResolvedInstallation;
use crate::username::Username;
use crate::{Result, SteamError};

/// Steam's subkey under `HKEY_CURRENT_USER`.
pub const STEAM_SUBKEY: &str = r"SOFTWARE\Valve\Steam";

/// Value holding the path of the Steam executable.
pub const STEAM_EXE_VALUE: &str = "SteamExe";

/// Value holding the account Steam logs into on start.
pub const AUTO_LOGIN_USER_VALUE: &str = "AutoLoginUser";

/// Longest path the executable value may hold, terminator included.
pub const MAX_PATH: usize = 260;

/// `ERROR_MORE_DATA`, reported when a value does not fit its buffer.
const ERROR_MORE_DATA: i32 = 234;

/// String get/set on Steam's per-user configuration key.
pub trait ConfigStore {
    fn get_string(&self, name: &str) -> io::Result<String>;
    fn set_string(&self, name: &str, value: &str) -> io::Result<()>;
}

impl<C: ConfigStore + ?Sized> ConfigStore for &C {
    fn get_string(&self, name: &str) -> io::Result<String> {
        (**self).get_string(name)
    }

    fn set_string(&self, name: &str, value: &str) -> io::Result<()> {
        (**self).set_string(name, value)
    }
}

/// [`ConfigStore`] over `HKEY_CURRENT_USER\SOFTWARE\Valve\Steam`.
#[derive(Debug, Clone, Copy)]
pub struct RegistryStore {
    subkey: &'static str,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self {
            subkey: STEAM_SUBKEY,
        }
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for RegistryStore {
    fn get_string(&self, name: &str) -> io::Result<String> {
        platform::read_value(self.subkey, name)
    }

    fn set_string(&self, name: &str, value: &str) -> io::Result<()> {
        platform::write_value(self.subkey, name, value)
    }
}

/// Reads and writes the Steam values held in a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct PathStore<C> {
    store: C,
}

impl<C: ConfigStore> PathStore<C> {
    pub fn new(store: C) -> Self {
        Self { store }
    }

    /// Reads and normalizes the Steam executable path.
    ///
    /// A value longer than [`MAX_PATH`] is rejected rather than truncated.
    pub fn resolve_executable_path(&self) -> Result<ResolvedInstallation> {
        let raw = self
            .store
            .get_string(STEAM_EXE_VALUE)
            .map_err(SteamError::ReadRegistry)?;
        let install = ResolvedInstallation::from_raw(&raw);
        if install.len() + 1 > MAX_PATH {
            return Err(SteamError::ReadRegistry(io::Error::from_raw_os_error(
                ERROR_MORE_DATA,
            )));
        }
        tracing::debug!(path = %install, "resolved Steam executable");
        Ok(install)
    }

    /// Sets the account Steam will automatically log into.
    pub fn set_auto_login_user(&self, username: &Username) -> Result<()> {
        self.store
            .set_string(AUTO_LOGIN_USER_VALUE, username.as_str())
            .map_err(SteamError::WriteRegistry)?;
        tracing::info!(%username, "auto-login user updated");
        Ok(())
    }

    /// Gets the account Steam will automatically log into.
    pub fn get_auto_login_user(&self) -> Result<Username> {
        let raw = self
            .store
            .get_string(AUTO_LOGIN_USER_VALUE)
            .map_err(SteamError::ReadRegistry)?;
        Ok(Username::try_from(raw.trim_end_matches('\0'))?)
    }
}

// Platform-specific registry access.
#[cfg(target_os = "windows")]
#[path = "registry_windows.rs"]
mod platform;

#[cfg(not(target_os = "windows"))]
mod platform {
    use std::io;

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "the Windows registry is not available on this platform",
        )
    }

    pub fn read_value(_subkey: &str, _name: &str) -> io::Result<String> {
        Err(unsupported())
    }

    pub fn write_value(_subkey: &str, _name: &str, _value: &str) -> io::Result<()> {
        Err(unsupported())
    }
}
