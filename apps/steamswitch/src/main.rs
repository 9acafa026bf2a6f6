//! steamswitch entry point.

mod config;
mod switch;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use steamswitch_steam::registry::RegistryStore;
use steamswitch_steam::{PathStore, Steam, SteamError, Username};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::switch::{POLL_INTERVAL, Stopped, SwitchOptions};

/// Exit code for a malformed value in Steam's configuration (sysexits `EX_CONFIG`).
const EXIT_CONFIG: u8 = 78;
/// Exit code for any other Steam failure (sysexits `EX_UNAVAILABLE`).
const EXIT_UNAVAILABLE: u8 = 69;

#[derive(Parser)]
#[command(name = "steamswitch", version, about = "Switch the Steam account that logs in automatically")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current auto-login user
    Get,
    /// Set the auto-login user without restarting Steam
    Set { username: Username },
    /// Restart Steam logged into another account
    Switch {
        username: Username,
        /// Skip Steam's file verification on launch
        #[arg(long)]
        fast: bool,
    },
    /// List the accounts that have logged into this installation
    Users,
    /// Show the install path and whether Steam is running
    Status,
    /// Start Steam
    Launch {
        /// Skip Steam's file verification on launch
        #[arg(long)]
        fast: bool,
    },
    /// Ask Steam to shut down and wait for the request to be accepted
    Shutdown,
    /// Terminate every process running from the Steam directory
    Kill,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.os_code() {
                Some(code) => tracing::error!(phase = ?e.phase(), os_code = code, "{e}"),
                None => tracing::error!(phase = ?e.phase(), "{e}"),
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(err: &SteamError) -> u8 {
    match err {
        SteamError::InvalidUsername(_) => EXIT_CONFIG,
        _ => EXIT_UNAVAILABLE,
    }
}

fn run(command: Command, config: &Config) -> steamswitch_steam::Result<()> {
    match command {
        Command::Get => {
            let user = PathStore::new(RegistryStore::new()).get_auto_login_user()?;
            println!("{user}");
        }
        Command::Set { username } => {
            PathStore::new(RegistryStore::new()).set_auto_login_user(&username)?;
            tracing::info!(user = %username, "auto-login user set");
        }
        Command::Switch { username, fast } => {
            let steam = Steam::new()?;
            let options = SwitchOptions {
                fast: fast || config.fast_launch,
                grace: config.shutdown_timeout(),
                poll: POLL_INTERVAL,
            };
            match switch::switch(&steam, &username, options)? {
                Stopped::NotRunning => tracing::debug!("Steam was not running"),
                Stopped::Gracefully => tracing::debug!("Steam shut down gracefully"),
                Stopped::Killed => tracing::debug!("Steam was killed"),
            }
        }
        Command::Users => {
            let steam = Steam::new()?;
            for user in steam.login_users()? {
                let marker = if user.most_recent { "*" } else { " " };
                println!(
                    "{marker} {:<32} {:<20} {}",
                    user.account_name, user.persona_name, user.steam_id
                );
            }
        }
        Command::Status => {
            let steam = Steam::new()?;
            println!("install:   {}", steam.installation());
            println!("directory: {}", steam.install_dir());
            println!("running:   {}", steam.is_running()?);
        }
        Command::Launch { fast } => {
            let steam = Steam::new()?;
            if fast || config.fast_launch {
                steam.launch_fast()?;
            } else {
                steam.launch()?;
            }
        }
        Command::Shutdown => {
            Steam::new()?.shutdown()?;
        }
        Command::Kill => {
            let killed = Steam::new()?.kill()?;
            if !killed {
                tracing::info!("no Steam processes found");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use steamswitch_steam::UsernameError;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn username_argument_is_validated() {
        assert!(Cli::try_parse_from(["steamswitch", "set", "ab"]).is_err());
        assert!(Cli::try_parse_from(["steamswitch", "set", "bad name"]).is_err());

        let cli = Cli::try_parse_from(["steamswitch", "switch", "Alt_Account", "--fast"]).unwrap();
        match cli.command {
            Command::Switch { username, fast } => {
                assert_eq!(username.as_str(), "alt_account");
                assert!(fast);
            }
            _ => panic!("expected switch"),
        }
    }

    #[test]
    fn exit_codes() {
        assert_eq!(
            exit_code(&SteamError::InvalidUsername(UsernameError::TooLong)),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code(&SteamError::TerminateProcess(std::io::Error::from_raw_os_error(5))),
            EXIT_UNAVAILABLE
        );
    }
}
