//! In-memory collaborators for tests: a key/value store, a process table that
//! counts handle opens and closes, and a spawner that records its calls.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::launcher::{SpawnedProcess, Spawner};
use crate::process::ProcessTable;
use crate::registry::ConfigStore;

/// `ERROR_FILE_NOT_FOUND`, what the registry reports for a missing value.
pub const ERROR_FILE_NOT_FOUND: i32 = 2;

/// `ERROR_ACCESS_DENIED`.
pub const ERROR_ACCESS_DENIED: i32 = 5;

/// [`ConfigStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    write_error: Option<i32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, name: &str, value: &str) -> Self {
        self.values
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
        self
    }

    /// Makes every write fail with the given OS error code.
    pub fn failing_writes(mut self, code: i32) -> Self {
        self.write_error = Some(code);
        self
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.values.borrow().get(name).cloned()
    }
}

impl ConfigStore for MemoryStore {
    fn get_string(&self, name: &str) -> io::Result<String> {
        self.value(name)
            .ok_or_else(|| io::Error::from_raw_os_error(ERROR_FILE_NOT_FOUND))
    }

    fn set_string(&self, name: &str, value: &str) -> io::Result<()> {
        if let Some(code) = self.write_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        self.values
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A process entry in a [`FakeProcessTable`].
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pid: u32,
    image: String,
    openable: bool,
    queryable: bool,
    terminate_error: Option<i32>,
}

impl FakeProcess {
    pub fn new(pid: u32, image: &str) -> Self {
        Self {
            pid,
            image: image.to_owned(),
            openable: true,
            queryable: true,
            terminate_error: None,
        }
    }

    /// Opening this process fails with access denied.
    pub fn unopenable(mut self) -> Self {
        self.openable = false;
        self
    }

    /// This process opens but its image path cannot be queried.
    pub fn unqueryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    pub fn failing_terminate(mut self, code: i32) -> Self {
        self.terminate_error = Some(code);
        self
    }
}

/// Handle issued by [`FakeProcessTable`]. Deliberately not `Clone`.
#[derive(Debug)]
pub struct FakeHandle {
    pid: u32,
}

/// [`ProcessTable`] over a fixed list of processes.
#[derive(Debug, Default)]
pub struct FakeProcessTable {
    processes: Vec<FakeProcess>,
    snapshot_error: Option<i32>,
    exit_after: Option<usize>,
    snapshots: Cell<usize>,
    attempted: RefCell<Vec<u32>>,
    terminated: RefCell<Vec<u32>>,
    opens: Cell<usize>,
    closes: Cell<usize>,
}

impl FakeProcessTable {
    pub fn new(processes: Vec<FakeProcess>) -> Self {
        Self {
            processes,
            ..Self::default()
        }
    }

    /// Makes the snapshot fail with the given OS error code.
    pub fn failing_snapshot(mut self, code: i32) -> Self {
        self.snapshot_error = Some(code);
        self
    }

    /// Every process exits once `snapshots` snapshots have been taken; later
    /// snapshots are empty.
    pub fn exiting_after(mut self, snapshots: usize) -> Self {
        self.exit_after = Some(snapshots);
        self
    }

    /// Snapshots taken so far.
    pub fn snapshots(&self) -> usize {
        self.snapshots.get()
    }

    /// Successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.get()
    }

    pub fn closes(&self) -> usize {
        self.closes.get()
    }

    /// Handles opened and not yet closed.
    pub fn live_handles(&self) -> usize {
        self.opens.get() - self.closes.get()
    }

    /// Every pid an open was attempted on, in order.
    pub fn attempted(&self) -> Vec<u32> {
        self.attempted.borrow().clone()
    }

    /// Pids terminated successfully, in order.
    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.borrow().clone()
    }

    fn find(&self, pid: u32) -> Option<&FakeProcess> {
        self.processes.iter().find(|p| p.pid == pid)
    }
}

impl ProcessTable for FakeProcessTable {
    type Handle = FakeHandle;

    fn snapshot(&self) -> io::Result<Vec<u32>> {
        if let Some(code) = self.snapshot_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        let taken = self.snapshots.get();
        self.snapshots.set(taken + 1);
        if self.exit_after.is_some_and(|n| taken >= n) {
            return Ok(Vec::new());
        }
        Ok(self.processes.iter().map(|p| p.pid).collect())
    }

    fn open(&self, pid: u32) -> io::Result<FakeHandle> {
        self.attempted.borrow_mut().push(pid);
        match self.find(pid) {
            Some(p) if p.openable => {
                self.opens.set(self.opens.get() + 1);
                Ok(FakeHandle { pid })
            }
            Some(_) => Err(io::Error::from_raw_os_error(ERROR_ACCESS_DENIED)),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no such process")),
        }
    }

    fn image_path(&self, handle: &FakeHandle) -> io::Result<String> {
        match self.find(handle.pid) {
            Some(p) if p.queryable => Ok(p.image.clone()),
            _ => Err(io::Error::from_raw_os_error(ERROR_ACCESS_DENIED)),
        }
    }

    fn terminate(&self, handle: &FakeHandle, _exit_code: u32) -> io::Result<()> {
        if let Some(code) = self.find(handle.pid).and_then(|p| p.terminate_error) {
            return Err(io::Error::from_raw_os_error(code));
        }
        self.terminated.borrow_mut().push(handle.pid);
        Ok(())
    }

    fn close(&self, _handle: &FakeHandle) {
        self.closes.set(self.closes.get() + 1);
    }
}

/// One recorded [`FakeSpawner::spawn`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCall {
    pub exe: PathBuf,
    pub args: Option<String>,
}

/// [`Spawner`] that records calls and hands out counted children.
#[derive(Debug, Default)]
pub struct FakeSpawner {
    calls: RefCell<Vec<SpawnCall>>,
    spawn_error: Option<i32>,
    wait_error: Option<i32>,
    live: Rc<Cell<usize>>,
    waits: Rc<Cell<usize>>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_spawn(mut self, code: i32) -> Self {
        self.spawn_error = Some(code);
        self
    }

    pub fn failing_wait(mut self, code: i32) -> Self {
        self.wait_error = Some(code);
        self
    }

    pub fn calls(&self) -> Vec<SpawnCall> {
        self.calls.borrow().clone()
    }

    /// Children spawned and not yet dropped.
    pub fn live_children(&self) -> usize {
        self.live.get()
    }

    pub fn waits(&self) -> usize {
        self.waits.get()
    }
}

impl Spawner for FakeSpawner {
    type Child = FakeChild;

    fn spawn(&self, exe: &Path, args: Option<&str>) -> io::Result<FakeChild> {
        self.calls.borrow_mut().push(SpawnCall {
            exe: exe.to_path_buf(),
            args: args.map(str::to_owned),
        });
        if let Some(code) = self.spawn_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        self.live.set(self.live.get() + 1);
        Ok(FakeChild {
            live: Rc::clone(&self.live),
            waits: Rc::clone(&self.waits),
            wait_error: self.wait_error,
        })
    }
}

/// Child handed out by [`FakeSpawner`].
#[derive(Debug)]
pub struct FakeChild {
    live: Rc<Cell<usize>>,
    waits: Rc<Cell<usize>>,
    wait_error: Option<i32>,
}

impl SpawnedProcess for FakeChild {
    fn wait(&mut self) -> io::Result<()> {
        self.waits.set(self.waits.get() + 1);
        match self.wait_error {
            Some(code) => Err(io::Error::from_raw_os_error(code)),
            None => Ok(()),
        }
    }
}

impl Drop for FakeChild {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}
