//! Command-line session demo.
//!
//! ```text
//! SESSIONWARD_BASE_URL=http://localhost:3000 \
//! SESSIONWARD_STORAGE_PATH=./session.json \
//!     login-cli login a@b.com pw
//! login-cli status
//! login-cli --storage ./session.json refresh
//! login-cli logout
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sessionward::logging;
use sessionward::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "login-cli")]
#[command(about = "Sign in to an identity backend and keep the session fresh")]
#[command(version)]
struct Cli {
    /// Identity backend URL (overrides SESSIONWARD_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Session file (overrides SESSIONWARD_STORAGE_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the stored session and print it (default)
    Status,

    /// Sign in with email and password
    Login { email: String, password: String },

    /// Create an account, then sign in with it
    SignUp {
        name: String,
        email: String,
        password: String,
    },

    /// Renew the stored credentials now
    Refresh,

    /// Sign out and forget the stored session
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(storage) = cli.storage {
        config.storage_path = Some(storage);
    }
    tracing::info!(base_url = %config.base_url, "starting");

    let client = match SessionClientBuilder::from_config(config).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("could not build client: {e}");
            return ExitCode::FAILURE;
        }
    };

    client.initialize().await;

    let result = match cli.command.unwrap_or(Command::Status) {
        Command::Status => Ok(()),
        Command::Login { email, password } => client.login(&email, &password).await,
        Command::SignUp {
            name,
            email,
            password,
        } => client.sign_up(&name, &email, &password).await,
        Command::Refresh => {
            println!("refresh: {:?}", client.refresh().await);
            Ok(())
        }
        Command::Logout => {
            client.logout();
            // Give the background terminate call a moment before exiting.
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        }
    };

    print_state(&client.state(), client.phase());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_state(state: &AuthState, phase: SessionPhase) {
    println!("phase: {phase:?}");
    match &state.user {
        Some(user) => println!("user:  #{} {}", user.id, user.name),
        None => println!("user:  (signed out)"),
    }
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign_up_takes_three_positionals() {
        let cli = Cli::try_parse_from(["login-cli", "sign-up", "A", "a@b.com", "pw"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::SignUp { ref name, ref email, ref password })
                if name == "A" && email == "a@b.com" && password == "pw"
        ));
    }

    #[test]
    fn test_parse_without_subcommand_defaults_to_status() {
        let cli = Cli::try_parse_from(["login-cli", "--storage", "s.json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.storage, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn test_parse_login_missing_password_is_rejected() {
        assert!(Cli::try_parse_from(["login-cli", "login", "a@b.com"]).is_err());
    }
}
