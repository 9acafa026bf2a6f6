use std::fmt;
use std::path::PathBuf;

use crate::SteamError;

/// File name of the Steam client executable, as it appears at the end of a
/// normalized install path.
pub const STEAM_EXE: &str = "steam.exe";

/// Normalizes a raw registry path: forward slashes become backslashes, every
/// character is lowercased and trailing NUL terminators are dropped.
pub fn normalize_path(raw: &str) -> String {
    raw.trim_end_matches('\0')
        .chars()
        .map(|c| if c == '/' { '\\' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// The normalized path of the installed Steam executable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedInstallation {
    path: String,
    len: usize,
}

impl ResolvedInstallation {
    /// Normalizes `raw` into a resolved installation.
    pub fn from_raw(raw: &str) -> Self {
        let path = normalize_path(raw);
        let len = path.encode_utf16().count();
        Self { path, len }
    }

    /// Returns the normalized executable path.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Length of the path in UTF-16 units, terminator excluded.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the executable path as a `PathBuf`.
    pub fn exe_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

impl fmt::Display for ResolvedInstallation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Directory Steam is installed in, derived from a [`ResolvedInstallation`].
///
/// The trailing separator is kept, so `directory + STEAM_EXE` reproduces the
/// executable path exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallDirectory {
    path: String,
}

impl InstallDirectory {
    /// Strips [`STEAM_EXE`] from the end of the resolved path.
    ///
    /// Only a path that actually ends in `steam.exe` is accepted, rather than
    /// blindly cutting a fixed number of characters, and the directory keeps
    /// its trailing `\`.
    pub fn derive(install: &ResolvedInstallation) -> Result<Self, SteamError> {
        match install.as_str().strip_suffix(STEAM_EXE) {
            Some(dir) => Ok(Self {
                path: dir.to_owned(),
            }),
            None => Err(SteamError::MalformedInstallPath(install.as_str().to_owned())),
        }
    }

    /// Returns the directory as a string, separator included.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Length of the directory in UTF-16 units.
    pub fn len(&self) -> usize {
        self.path.encode_utf16().count()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Whether `candidate` starts with this directory, compared
    /// case-insensitively.
    ///
    /// No separator is required after the prefix; the derived directory
    /// already ends in one.
    pub fn contains(&self, candidate: &str) -> bool {
        let mut rest = candidate.chars();
        self.path.chars().all(|expected| match rest.next() {
            Some(c) => eq_ignore_case(c, expected),
            None => false,
        })
    }

    /// Returns Steam's `config` directory.
    pub fn config_dir(&self) -> PathBuf {
        PathBuf::from(&self.path).join("config")
    }

    /// Returns the path to `loginusers.vdf`.
    pub fn login_users_path(&self) -> PathBuf {
        self.config_dir().join("loginusers.vdf")
    }
}

impl fmt::Display for InstallDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_slashes_and_case() {
        assert_eq!(
            normalize_path("C:/Foo/STEAM.EXE"),
            normalize_path(r"c:\foo\steam.exe")
        );
        assert_eq!(normalize_path("C:/Foo/STEAM.EXE"), r"c:\foo\steam.exe");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_path(r"D:/Program Files (x86)\Steam/Steam.exe");
        assert_eq!(normalize_path(&once), once);
    }

    #[test]
    fn terminator_is_not_counted() {
        let install = ResolvedInstallation::from_raw("C:/Steam/steam.exe\0");
        assert_eq!(install.as_str(), r"c:\steam\steam.exe");
        assert_eq!(install.len(), 18);
    }

    #[test]
    fn directory_plus_exe_is_path() {
        for raw in [
            "C:/Games/Steam/Steam.exe",
            r"D:\Program Files (x86)\Steam\steam.exe",
            "steam.exe",
        ] {
            let install = ResolvedInstallation::from_raw(raw);
            let dir = InstallDirectory::derive(&install).unwrap();
            assert_eq!(format!("{dir}{STEAM_EXE}"), install.as_str());
            assert_eq!(dir.len(), install.len() - STEAM_EXE.len());
        }
    }

    #[test]
    fn derive_games_directory() {
        let install = ResolvedInstallation::from_raw("C:/Games/Steam/Steam.exe");
        let dir = InstallDirectory::derive(&install).unwrap();
        assert_eq!(dir.as_str(), r"c:\games\steam\");
    }

    #[test]
    fn derive_rejects_short_path() {
        let install = ResolvedInstallation::from_raw("exe");
        let err = InstallDirectory::derive(&install).unwrap_err();
        assert!(matches!(err, SteamError::MalformedInstallPath(p) if p == "exe"));
    }

    #[test]
    fn derive_rejects_other_executable() {
        let install = ResolvedInstallation::from_raw(r"C:\Steam\steamwebhelper.exe");
        assert!(InstallDirectory::derive(&install).is_err());
    }

    #[test]
    fn contains_ignores_case() {
        let install = ResolvedInstallation::from_raw("C:/Games/Steam/Steam.exe");
        let dir = InstallDirectory::derive(&install).unwrap();
        assert!(dir.contains(r"C:\GAMES\Steam\bin\cef\steamwebhelper.exe"));
        assert!(dir.contains(r"c:\games\steam\steam.exe"));
        assert!(!dir.contains(r"c:\games\other\steam.exe"));
    }

    #[test]
    fn contains_rejects_shorter_candidate() {
        let install = ResolvedInstallation::from_raw("C:/Games/Steam/Steam.exe");
        let dir = InstallDirectory::derive(&install).unwrap();
        assert!(!dir.contains(r"c:\games\steam"));
        assert!(!dir.contains(""));
    }

    #[test]
    fn contains_stops_at_separator() {
        let install = ResolvedInstallation::from_raw("C:/Games/Steam/Steam.exe");
        let dir = InstallDirectory::derive(&install).unwrap();
        assert!(!dir.contains(r"c:\games\steamlibrary\game.exe"));
    }

    #[test]
    fn login_users_location() {
        let install = ResolvedInstallation::from_raw("/opt/steam/steam.exe");
        let dir = InstallDirectory::derive(&install).unwrap();
        assert!(dir.login_users_path().ends_with("loginusers.vdf"));
        assert!(
            dir.login_users_path()
                .to_string_lossy()
                .contains("config")
        );
    }
}
