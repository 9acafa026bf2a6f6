//! Process discovery: finds every live process whose executable image lives
//! under the Steam install directory.
//!
//! The OS process table is abstracted behind [`ProcessTable`]; the Windows
//! implementation lives in `process_windows.rs`.

use std::fmt;
use std::io;

use crate::paths::InstallDirectory;
use crate::{Result, SteamError};

/// Exit code handed to terminated processes.
pub const KILL_EXIT_CODE: u32 = 1;

/// Access to the OS process table.
///
/// Failures from [`open`](ProcessTable::open) and
/// [`image_path`](ProcessTable::image_path) are expected (privilege, exited
/// processes) and make the scanner skip that process.
pub trait ProcessTable {
    type Handle;

    /// Ids of every live process.
    fn snapshot(&self) -> io::Result<Vec<u32>>;

    /// Opens a process with rights to query its image and terminate it.
    fn open(&self, pid: u32) -> io::Result<Self::Handle>;

    /// Full path of the process' executable image.
    fn image_path(&self, handle: &Self::Handle) -> io::Result<String>;

    fn terminate(&self, handle: &Self::Handle, exit_code: u32) -> io::Result<()>;

    /// Releases a handle returned by [`open`](ProcessTable::open).
    fn close(&self, handle: &Self::Handle);
}

impl<T: ProcessTable + ?Sized> ProcessTable for &T {
    type Handle = T::Handle;

    fn snapshot(&self) -> io::Result<Vec<u32>> {
        (**self).snapshot()
    }

    fn open(&self, pid: u32) -> io::Result<Self::Handle> {
        (**self).open(pid)
    }

    fn image_path(&self, handle: &Self::Handle) -> io::Result<String> {
        (**self).image_path(handle)
    }

    fn terminate(&self, handle: &Self::Handle, exit_code: u32) -> io::Result<()> {
        (**self).terminate(handle, exit_code)
    }

    fn close(&self, handle: &Self::Handle) {
        (**self).close(handle)
    }
}

/// An open process, closed when dropped.
///
/// Yielded by [`Scan`] for processes under the install directory; the scanner
/// also uses it to hold candidates while their image path is checked.
pub struct ProcessMatch<'t, T: ProcessTable + ?Sized> {
    table: &'t T,
    pid: u32,
    image_path: String,
    handle: T::Handle,
}

impl<'t, T: ProcessTable + ?Sized> ProcessMatch<'t, T> {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Terminates the process with [`KILL_EXIT_CODE`].
    pub fn terminate(&self) -> io::Result<()> {
        self.table.terminate(&self.handle, KILL_EXIT_CODE)
    }
}

impl<T: ProcessTable + ?Sized> Drop for ProcessMatch<'_, T> {
    fn drop(&mut self) {
        self.table.close(&self.handle);
    }
}

impl<T: ProcessTable + ?Sized> fmt::Debug for ProcessMatch<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessMatch")
            .field("pid", &self.pid)
            .field("image_path", &self.image_path)
            .finish_non_exhaustive()
    }
}

/// Lazy sequence of processes running from the install directory.
///
/// Handles of processes that do not match are closed before `next` returns,
/// so dropping a partially consumed scan leaks nothing.
pub struct Scan<'t, T: ProcessTable + ?Sized> {
    table: &'t T,
    dir: &'t InstallDirectory,
    pids: std::vec::IntoIter<u32>,
}

impl<'t, T: ProcessTable + ?Sized> Iterator for Scan<'t, T> {
    type Item = ProcessMatch<'t, T>;

    fn next(&mut self) -> Option<Self::Item> {
        for pid in self.pids.by_ref() {
            let handle = match self.table.open(pid) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::trace!(pid, error = %e, "skipping process that cannot be opened");
                    continue;
                }
            };
            let mut process = ProcessMatch {
                table: self.table,
                pid,
                image_path: String::new(),
                handle,
            };
            match self.table.image_path(&process.handle) {
                Ok(path) if self.dir.contains(&path) => {
                    tracing::debug!(pid, image = %path, "found Steam process");
                    process.image_path = path;
                    return Some(process);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::trace!(pid, error = %e, "skipping process without image path");
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pids.len()))
    }
}

/// Snapshots the process table and returns the processes under `dir`.
pub fn scan<'t, T: ProcessTable + ?Sized>(
    table: &'t T,
    dir: &'t InstallDirectory,
) -> Result<Scan<'t, T>> {
    let pids = table.snapshot().map_err(SteamError::EnumerateProcesses)?;
    tracing::debug!(count = pids.len(), "process snapshot taken");
    Ok(Scan {
        table,
        dir,
        pids: pids.into_iter(),
    })
}

/// The process table of the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessTable;

impl SystemProcessTable {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTable for SystemProcessTable {
    type Handle = platform::RawHandle;

    fn snapshot(&self) -> io::Result<Vec<u32>> {
        platform::snapshot()
    }

    fn open(&self, pid: u32) -> io::Result<Self::Handle> {
        platform::open(pid)
    }

    fn image_path(&self, handle: &Self::Handle) -> io::Result<String> {
        platform::image_path(handle)
    }

    fn terminate(&self, handle: &Self::Handle, exit_code: u32) -> io::Result<()> {
        platform::terminate(handle, exit_code)
    }

    fn close(&self, handle: &Self::Handle) {
        platform::close(handle);
    }
}

// Platform-specific process table.
#[cfg(target_os = "windows")]
#[path = "process_windows.rs"]
mod platform;

#[cfg(not(target_os = "windows"))]
mod platform {
    use std::io;

    pub type RawHandle = u32;

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "process control is only implemented for Windows",
        )
    }

    pub fn snapshot() -> io::Result<Vec<u32>> {
        Err(unsupported())
    }

    pub fn open(_pid: u32) -> io::Result<RawHandle> {
        Err(unsupported())
    }

    pub fn image_path(_handle: &RawHandle) -> io::Result<String> {
        Err(unsupported())
    }

    pub fn terminate(_handle: &RawHandle, _exit_code: u32) -> io::Result<()> {
        Err(unsupported())
    }

    pub fn close(_handle: &RawHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;
    use crate::fake::{FakeProcess, FakeProcessTable};
    use crate::paths::ResolvedInstallation;

    fn steam_dir() -> InstallDirectory {
        InstallDirectory::derive(&ResolvedInstallation::from_raw("C:/Games/Steam/Steam.exe"))
            .unwrap()
    }

    fn mixed_table() -> FakeProcessTable {
        FakeProcessTable::new(vec![
            FakeProcess::new(4, r"C:\Windows\System32\svchost.exe"),
            FakeProcess::new(42, r"c:\games\steam\steamwebhelper.exe"),
            FakeProcess::new(7, r"c:\games\steam\steam.exe").unopenable(),
            FakeProcess::new(8, r"c:\games\steam\gameoverlayui.exe").unqueryable(),
            FakeProcess::new(43, r"C:\GAMES\STEAM\steam.exe"),
            FakeProcess::new(99, r"c:\games\steamlibrary\common\game.exe"),
        ])
    }

    #[test]
    fn yields_only_processes_under_directory() {
        let table = mixed_table();
        let dir = steam_dir();
        let pids: Vec<u32> = scan(&table, &dir).unwrap().map(|m| m.pid()).collect();
        assert_eq!(pids, vec![42, 43]);
    }

    #[test]
    fn match_reports_image_path() {
        let table = mixed_table();
        let dir = steam_dir();
        let first = scan(&table, &dir).unwrap().next().unwrap();
        assert_eq!(first.image_path(), r"c:\games\steam\steamwebhelper.exe");
    }

    #[test]
    fn every_opened_handle_is_closed() {
        let table = mixed_table();
        let dir = steam_dir();
        let count = scan(&table, &dir).unwrap().count();
        assert_eq!(count, 2);
        assert_eq!(table.opens(), 5);
        assert_eq!(table.opens(), table.closes());
    }

    #[test]
    fn abandoned_scan_leaks_nothing() {
        let table = mixed_table();
        let dir = steam_dir();
        {
            let mut matches = scan(&table, &dir).unwrap();
            let first = matches.next().unwrap();
            assert_eq!(first.pid(), 42);
            assert_eq!(table.live_handles(), 1);
        }
        assert_eq!(table.live_handles(), 0);
        assert_eq!(table.opens(), 2);
    }

    #[test]
    fn empty_table_yields_nothing() {
        let table = FakeProcessTable::new(Vec::new());
        let dir = steam_dir();
        assert_eq!(scan(&table, &dir).unwrap().count(), 0);
    }

    #[test]
    fn snapshot_failure_is_enumeration_error() {
        let table = FakeProcessTable::new(Vec::new()).failing_snapshot(5);
        let dir = steam_dir();
        let err = scan(&table, &dir).err().unwrap();
        assert_eq!(err.phase(), Some(Phase::EnumerateProcesses));
        assert_eq!(err.os_code(), Some(5));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn system_table_is_unsupported_off_windows() {
        let err = SystemProcessTable::new().snapshot().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
