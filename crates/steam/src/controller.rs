//! Steam process controller: status detection and forced termination.
//!
//! Every query takes a fresh snapshot of the process table; nothing is
//! tracked between calls.

use crate::paths::InstallDirectory;
use crate::process::{ProcessTable, Scan, SystemProcessTable, scan};
use crate::{Result, SteamError};

/// Queries and kills the processes running from a Steam install directory.
#[derive(Debug, Clone)]
pub struct ProcessController<T> {
    table: T,
}

impl<T: ProcessTable> ProcessController<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Lazily scans for processes under `dir`.
    pub fn matches<'a>(&'a self, dir: &'a InstallDirectory) -> Result<Scan<'a, T>> {
        scan(&self.table, dir)
    }

    /// Returns `true` if any process is running from `dir`.
    ///
    /// Stops at the first match.
    pub fn is_running(&self, dir: &InstallDirectory) -> Result<bool> {
        Ok(self.matches(dir)?.next().is_some())
    }

    /// Terminates every process running from `dir`.
    ///
    /// Returns whether any were found and killed.
    pub fn kill_all(&self, dir: &InstallDirectory) -> Result<bool> {
        let mut killed = false;
        self.kill_all_into(dir, &mut killed)?;
        Ok(killed)
    }

    /// Like [`kill_all`](Self::kill_all), but records kills in `killed`.
    ///
    /// `killed` is only ever set, never cleared, so a caller-supplied `true`
    /// survives a scan with no matches. Stops at the first termination
    /// failure; processes killed before it stay killed and are reflected in
    /// `killed`.
    pub fn kill_all_into(&self, dir: &InstallDirectory, killed: &mut bool) -> Result<()> {
        for process in self.matches(dir)? {
            if let Err(e) = process.terminate() {
                tracing::warn!(pid = process.pid(), error = %e, "failed to terminate Steam process");
                return Err(SteamError::TerminateProcess(e));
            }
            tracing::info!(pid = process.pid(), image = process.image_path(), "terminated Steam process");
            *killed = true;
        }
        Ok(())
    }
}

impl Default for ProcessController<SystemProcessTable> {
    fn default() -> Self {
        Self::new(SystemProcessTable::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;
    use crate::fake::{ERROR_ACCESS_DENIED, FakeProcess, FakeProcessTable};
    use crate::paths::ResolvedInstallation;

    fn steam_dir() -> InstallDirectory {
        InstallDirectory::derive(&ResolvedInstallation::from_raw(r"C:\Steam\steam.exe")).unwrap()
    }

    #[test]
    fn not_running_without_matches() {
        let table = FakeProcessTable::new(vec![FakeProcess::new(10, r"c:\windows\explorer.exe")]);
        let ctrl = ProcessController::new(&table);
        assert!(!ctrl.is_running(&steam_dir()).unwrap());
        assert_eq!(table.live_handles(), 0);
    }

    #[test]
    fn running_stops_at_first_match() {
        let table = FakeProcessTable::new(vec![
            FakeProcess::new(10, r"c:\windows\explorer.exe"),
            FakeProcess::new(11, r"c:\steam\steam.exe"),
            FakeProcess::new(12, r"c:\steam\steamwebhelper.exe"),
        ]);
        let ctrl = ProcessController::new(&table);
        assert!(ctrl.is_running(&steam_dir()).unwrap());
        assert_eq!(table.attempted(), vec![10, 11]);
        assert_eq!(table.opens(), table.closes());
    }

    #[test]
    fn running_fails_when_snapshot_fails() {
        let table = FakeProcessTable::new(Vec::new()).failing_snapshot(ERROR_ACCESS_DENIED);
        let err = ProcessController::new(&table)
            .is_running(&steam_dir())
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::EnumerateProcesses));
    }

    #[test]
    fn kill_without_matches_keeps_seed() {
        let table = FakeProcessTable::new(vec![FakeProcess::new(10, r"c:\windows\explorer.exe")]);
        let ctrl = ProcessController::new(&table);

        let mut killed = false;
        ctrl.kill_all_into(&steam_dir(), &mut killed).unwrap();
        assert!(!killed);

        let mut killed = true;
        ctrl.kill_all_into(&steam_dir(), &mut killed).unwrap();
        assert!(killed);

        assert!(table.terminated().is_empty());
    }

    #[test]
    fn kill_terminates_every_match() {
        let table = FakeProcessTable::new(vec![
            FakeProcess::new(11, r"c:\steam\steam.exe"),
            FakeProcess::new(10, r"c:\windows\explorer.exe"),
            FakeProcess::new(12, r"C:\Steam\bin\cef\cef.win7x64\steamwebhelper.exe"),
        ]);
        let ctrl = ProcessController::new(&table);
        assert!(ctrl.kill_all(&steam_dir()).unwrap());
        assert_eq!(table.terminated(), vec![11, 12]);
        assert_eq!(table.live_handles(), 0);
    }

    #[test]
    fn kill_stops_at_first_failure() {
        let table = FakeProcessTable::new(vec![
            FakeProcess::new(11, r"c:\steam\steam.exe"),
            FakeProcess::new(12, r"c:\steam\steamwebhelper.exe").failing_terminate(ERROR_ACCESS_DENIED),
            FakeProcess::new(13, r"c:\steam\gameoverlayui.exe"),
        ]);
        let ctrl = ProcessController::new(&table);

        let mut killed = false;
        let err = ctrl.kill_all_into(&steam_dir(), &mut killed).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::TerminateProcess));
        assert_eq!(err.os_code(), Some(ERROR_ACCESS_DENIED));
        assert!(killed);
        assert_eq!(table.terminated(), vec![11]);
        assert_eq!(table.attempted(), vec![11, 12]);
        assert_eq!(table.opens(), table.closes());
    }
}
