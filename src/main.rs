//! Bot Creator - Main Entry Point
//!
//! Creates a Telegram bot through BotFather on behalf of your account,
//! then sets its description and avatar.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use bot_creator::botfather::CreationRequest;
use bot_creator::config::{CreatorSettings, TelegramConfig};
use bot_creator::provision::{self, ProvisionJob, ProvisionReport};
use bot_creator::telegram::{TelegramError, UserClient};

/// Telegram userbot that creates bots through BotFather.
#[derive(Parser, Debug)]
#[command(name = "bot_creator")]
#[command(about = "Create and configure Telegram bots through BotFather")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env", global = true)]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorize the user session used to talk to BotFather.
    Login,

    /// Show whether credentials and session are ready.
    Status,

    /// Create a bot, then set its description and avatar.
    Create {
        /// Display name of the new bot.
        #[arg(short, long)]
        name: String,

        /// Desired username (a generated one is used if omitted or taken).
        #[arg(short, long)]
        username: Option<String>,

        /// Description text (defaults to BOT_DESCRIPTION).
        #[arg(short, long, conflicts_with = "no_description")]
        description: Option<String>,

        /// Do not set a description.
        #[arg(long)]
        no_description: bool,

        /// Image file to use as the bot's avatar.
        #[arg(short, long)]
        avatar: Option<PathBuf>,

        /// Seconds to wait after each message (defaults to MESSAGE_DELAY_SECS).
        #[arg(long)]
        delay: Option<u64>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    match args.command {
        Command::Login => login().await.map(|()| ExitCode::SUCCESS),
        Command::Status => status().await.map(|()| ExitCode::SUCCESS),
        Command::Create {
            name,
            username,
            description,
            no_description,
            avatar,
            delay,
            json,
        } => {
            let settings = CreatorSettings::from_env_with_defaults();
            let delay = delay.map_or_else(|| settings.message_delay(), Duration::from_secs);

            let mut request = CreationRequest::new(name, delay);
            if let Some(username) = username {
                request = request.with_handle(username);
            }

            let job = ProvisionJob {
                request,
                description: (!no_description)
                    .then(|| description.unwrap_or_else(|| settings.description.clone())),
                avatar,
            };

            let report = create(&settings, &job).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }

            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs one provisioning job, turning setup errors into a failed report.
async fn create(settings: &CreatorSettings, job: &ProvisionJob) -> ProvisionReport {
    let name = job.request.name.as_str();

    if let Err(e) = settings.validate() {
        return ProvisionReport::failed(name, e.to_string());
    }

    match TelegramConfig::from_env() {
        Ok(config) => provision::run(&config, settings, job).await,
        Err(e) => ProvisionReport::failed(name, e.to_string()),
    }
}

/// Prints whether the creator is ready to run.
async fn status() -> Result<()> {
    let settings = CreatorSettings::from_env_with_defaults();

    println!("Bot Creator\n");
    println!("Username prefix: {}", settings.username_prefix);
    println!("Message delay: {}s", settings.message_delay_secs);
    println!("Agent: @{}", settings.botfather_username);
    if let Err(e) = settings.validate() {
        println!("Settings: invalid ({e})");
    }

    let config = match TelegramConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Status: Not configured ({e})");
            print_setup_help();
            return Ok(());
        }
    };

    if !tokio::fs::try_exists(&config.session_path)
        .await
        .unwrap_or(false)
    {
        println!("Status: Not authorized (no session at {})", config.session_path.display());
        println!("Run: bot_creator login");
        return Ok(());
    }

    let client = UserClient::connect(&config)
        .await
        .context("Failed to connect to Telegram")?;

    match client.whoami().await {
        Ok(account) => println!("Status: Ready, authorized as {}", account.display_name()),
        Err(TelegramError::NotAuthorized) => {
            println!("Status: Not authorized");
            println!("Run: bot_creator login");
        }
        Err(e) => println!("Status: Error ({e})"),
    }

    client.disconnect();
    Ok(())
}

fn print_setup_help() {
    println!("\nConfiguration required:");
    println!("1. Go to https://my.telegram.org/apps and create an application");
    println!("2. Add its credentials to .env:");
    println!("   TELEGRAM_API_ID=your_api_id");
    println!("   TELEGRAM_API_HASH=your_api_hash");
    println!("3. Run: bot_creator login");
}

/// Authorizes the session interactively.
async fn login() -> Result<()> {
    let config = match TelegramConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            print_setup_help();
            return Err(e).context("Failed to load Telegram configuration from environment");
        }
    };

    let client = UserClient::connect(&config)
        .await
        .context("Failed to connect to Telegram")?;

    then_disconnect(authorize(&client, &config), || client.disconnect()).await
}

/// Awaits `work`, then runs `disconnect` whatever the outcome.
async fn then_disconnect<T>(
    work: impl Future<Output = Result<T>>,
    disconnect: impl FnOnce(),
) -> Result<T> {
    let result = work.await;
    disconnect();
    result
}

async fn authorize(client: &UserClient, config: &TelegramConfig) -> Result<()> {
    if client
        .is_authorized()
        .await
        .context("Failed to check authorization")?
    {
        info!("Session is already authorized");
    } else {
        authenticate(client, config).await?;
    }

    match client.whoami().await {
        Ok(account) => println!("Authorized as: {}", account.display_name()),
        Err(e) => warn!("Could not fetch account info: {}", e),
    }
    println!("Setup complete! You can now create bots with `bot_creator create`.");

    Ok(())
}

/// Handles Telegram authentication.
async fn authenticate(client: &UserClient, config: &TelegramConfig) -> Result<()> {
    info!("Authentication required");

    let phone: String = Input::new()
        .with_prompt("Enter phone number (with country code, e.g. +1234567890)")
        .interact_text()?;

    let token = client
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    info!("Login code sent to your Telegram app");

    let code: String = Input::new()
        .with_prompt("Enter verification code from Telegram")
        .interact_text()?;

    match client.sign_in(&token, &code).await {
        Ok(()) => Ok(()),
        Err(TelegramError::PasswordRequired(password_token)) => {
            info!("Two-factor authentication is enabled");

            let hint = password_token.hint().unwrap_or("no hint");
            info!("Password hint: {}", hint);

            let password: String = Password::new()
                .with_prompt("Enter 2FA password")
                .interact()?;

            client
                .check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;

            Ok(())
        }
        Err(e) => Err(e).context("Authentication failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[tokio::test]
    async fn test_failed_login_still_disconnects() {
        let disconnected = Cell::new(false);

        let result: Result<()> = then_disconnect(
            async { Err(anyhow::anyhow!("Failed to check authorization")) },
            || disconnected.set(true),
        )
        .await;

        assert!(result.is_err());
        assert!(disconnected.get());
    }

    #[tokio::test]
    async fn test_successful_login_disconnects_once() {
        let calls = Cell::new(0);

        let result = then_disconnect(async { Ok(42) }, || calls.set(calls.get() + 1)).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }
}
