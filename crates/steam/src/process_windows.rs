//! Win32 process table.

use std::io;
use std::mem::size_of;

use windows_sys::Win32::Foundation::{CloseHandle, ERROR_INSUFFICIENT_BUFFER, HANDLE};
use windows_sys::Win32::System::ProcessStatus::K32EnumProcesses;
use windows_sys::Win32::System::Threading::{
    OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
    QueryFullProcessImageNameW, TerminateProcess,
};

pub type RawHandle = HANDLE;

/// Process ids requested by the first snapshot attempt.
const INITIAL_PIDS: usize = 1024;

/// Image path buffer sizes, in UTF-16 units.
const INITIAL_IMAGE_PATH: usize = 260;
const MAX_IMAGE_PATH: usize = 32_768;

/// Snapshots every live process id.
///
/// `K32EnumProcesses` cannot report how many ids it dropped, so a full buffer
/// is treated as possibly truncated and the call is retried with twice the room.
pub fn snapshot() -> io::Result<Vec<u32>> {
    let mut pids = vec![0u32; INITIAL_PIDS];
    loop {
        let capacity = u32::try_from(pids.len() * size_of::<u32>())
            .map_err(|_| io::Error::new(io::ErrorKind::OutOfMemory, "too many processes"))?;
        let mut written = 0u32;
        // SAFETY: `pids` is valid for `capacity` bytes and `written` is a live u32.
        let ok = unsafe { K32EnumProcesses(pids.as_mut_ptr(), capacity, &mut written) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        if written < capacity {
            pids.truncate(written as usize / size_of::<u32>());
            return Ok(pids);
        }
        let grown = pids.len() * 2;
        pids.resize(grown, 0);
    }
}

pub fn open(pid: u32) -> io::Result<HANDLE> {
    // SAFETY: plain FFI call; a null return signals failure.
    let handle =
        unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_TERMINATE, 0, pid) };
    if handle.is_null() {
        Err(io::Error::last_os_error())
    } else {
        Ok(handle)
    }
}

pub fn image_path(handle: &HANDLE) -> io::Result<String> {
    let mut buf = vec![0u16; INITIAL_IMAGE_PATH];
    loop {
        let mut len = buf.len() as u32;
        // SAFETY: `buf` holds `len` UTF-16 units; `handle` is an open process handle.
        let ok = unsafe {
            QueryFullProcessImageNameW(*handle, PROCESS_NAME_WIN32, buf.as_mut_ptr(), &mut len)
        };
        if ok != 0 {
            return Ok(String::from_utf16_lossy(&buf[..len as usize]));
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(ERROR_INSUFFICIENT_BUFFER as i32)
            || buf.len() >= MAX_IMAGE_PATH
        {
            return Err(err);
        }
        let grown = (buf.len() * 2).min(MAX_IMAGE_PATH);
        buf.resize(grown, 0);
    }
}

pub fn terminate(handle: &HANDLE, exit_code: u32) -> io::Result<()> {
    // SAFETY: `handle` was opened with PROCESS_TERMINATE.
    if unsafe { TerminateProcess(*handle, exit_code) } == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub fn close(handle: &HANDLE) {
    // SAFETY: each handle is closed exactly once, by the guard that owns it.
    unsafe {
        CloseHandle(*handle);
    }
}
