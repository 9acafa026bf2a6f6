//! Account switching: stop Steam, change the auto-login user, start it again.

use std::thread;
use std::time::{Duration, Instant};

use steamswitch_steam::{ConfigStore, ProcessTable, Spawner, Steam, Username};

/// Interval between checks while waiting for Steam to exit.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub struct SwitchOptions {
    /// Launch with file verification skipped.
    pub fast: bool,
    /// How long Steam gets to exit after `-shutdown` before it is killed.
    pub grace: Duration,
    pub poll: Duration,
}

/// Outcome of a switch, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    /// Steam was not running.
    NotRunning,
    /// Steam exited on its own after the shutdown request.
    Gracefully,
    /// Steam outlived the grace period and was killed.
    Killed,
}

/// Restarts Steam logged into `username`.
pub fn switch<C, T, S>(
    steam: &Steam<C, T, S>,
    username: &Username,
    options: SwitchOptions,
) -> steamswitch_steam::Result<Stopped>
where
    C: ConfigStore,
    T: ProcessTable,
    S: Spawner,
{
    let stopped = stop(steam, options)?;

    steam.set_auto_login_user(username)?;
    tracing::info!(user = %username, "auto-login user set");

    if options.fast {
        steam.launch_fast()?;
    } else {
        steam.launch()?;
    }
    tracing::info!(fast = options.fast, "Steam launched");

    Ok(stopped)
}

fn stop<C, T, S>(
    steam: &Steam<C, T, S>,
    options: SwitchOptions,
) -> steamswitch_steam::Result<Stopped>
where
    C: ConfigStore,
    T: ProcessTable,
    S: Spawner,
{
    if !steam.is_running()? {
        return Ok(Stopped::NotRunning);
    }

    tracing::info!("asking Steam to shut down");
    steam.shutdown()?;

    // A grace period too large to represent waits without a deadline.
    let deadline = Instant::now().checked_add(options.grace);
    loop {
        if !steam.is_running()? {
            tracing::info!("Steam exited");
            return Ok(Stopped::Gracefully);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        thread::sleep(options.poll);
    }

    tracing::warn!(
        grace_secs = options.grace.as_secs(),
        "Steam still running after grace period, killing"
    );
    steam.kill()?;
    Ok(Stopped::Killed)
}
