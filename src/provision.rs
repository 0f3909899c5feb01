//! One complete provisioning run: create a bot, then configure it.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::botfather::{AgentChannel, BotCreator, CreationRequest, CreationResult, HandleGenerator};
use crate::config::{CreatorSettings, TelegramConfig, validate_description};
use crate::telegram::{BotFatherChat, TelegramError, UserClient};

/// What to create and how to configure it.
#[derive(Debug, Clone)]
pub struct ProvisionJob {
    /// The creation request.
    pub request: CreationRequest,

    /// Description to apply, `None` to skip the step.
    pub description: Option<String>,

    /// Avatar image to upload, `None` to skip the step.
    pub avatar: Option<PathBuf>,
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Requested display name.
    pub name: String,

    /// Creation outcome.
    pub result: CreationResult,

    /// Whether the description was confirmed (`None` if not attempted).
    pub description_set: Option<bool>,

    /// Whether the avatar was confirmed (`None` if not attempted).
    pub avatar_set: Option<bool>,

    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl ProvisionReport {
    fn new(name: &str, result: CreationResult) -> Self {
        Self {
            name: name.to_owned(),
            result,
            description_set: None,
            avatar_set: None,
            finished_at: Utc::now(),
        }
    }

    /// A report for a run that failed before creation was attempted.
    #[must_use]
    pub fn failed(name: &str, error: impl Into<String>) -> Self {
        Self::new(name, CreationResult::failure(error))
    }

    /// Whether the bot was created.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

fn step_status(step: Option<bool>) -> &'static str {
    match step {
        Some(true) => "Set",
        Some(false) => "Not set",
        None => "Skipped",
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.result.token(), self.result.handle()) {
            (Some(token), Some(handle)) => {
                writeln!(f, "Bot created successfully")?;
                writeln!(f)?;
                writeln!(f, "Name: {}", self.name)?;
                writeln!(f, "Username: @{handle}")?;
                writeln!(f, "Token: {token}")?;
                writeln!(f)?;
                writeln!(f, "Description: {}", step_status(self.description_set))?;
                writeln!(f, "Avatar: {}", step_status(self.avatar_set))?;
                if self.avatar_set == Some(false) {
                    writeln!(f, "Set the avatar manually via @BotFather.")?;
                }
                write!(f, "Save the token securely.")
            }
            _ => write!(
                f,
                "Error: {}",
                self.result.error().unwrap_or("Unknown error")
            ),
        }
    }
}

/// Creates the bot and applies the optional configuration steps.
pub async fn provision_with<C: AgentChannel>(
    creator: &BotCreator<C>,
    job: &ProvisionJob,
) -> ProvisionReport {
    let result = creator.provision(&job.request).await;
    let mut report = ProvisionReport::new(&job.request.name, result);

    let Some(handle) = report.result.token().and(report.result.handle()).map(str::to_owned) else {
        return report;
    };

    if let Some(description) = &job.description {
        report.description_set = Some(match validate_description(description) {
            Ok(()) => creator.set_description(&handle, description).await,
            Err(e) => {
                warn!("Skipping description: {}", e);
                false
            }
        });
    }

    if let Some(avatar) = &job.avatar {
        report.avatar_set = Some(creator.set_avatar(&handle, avatar).await);
    }

    report.finished_at = Utc::now();
    report
}

/// Connects with the saved session and runs one job against BotFather.
///
/// Every failure ends up in the report; nothing is raised.
pub async fn run(
    config: &TelegramConfig,
    settings: &CreatorSettings,
    job: &ProvisionJob,
) -> ProvisionReport {
    let name = job.request.name.as_str();

    let generator = match HandleGenerator::new(&settings.username_prefix) {
        Ok(generator) => generator,
        Err(e) => return ProvisionReport::failed(name, e.to_string()),
    };

    let client = match UserClient::connect(config).await {
        Ok(client) => client,
        Err(e) => return ProvisionReport::failed(name, e.to_string()),
    };

    let report = match open_botfather(&client, settings).await {
        Ok(chat) => {
            provision_with(&creator_for(chat, generator, job), job).await
        }
        Err(e) => ProvisionReport::failed(name, e.to_string()),
    };

    client.disconnect();
    report
}

/// Builds a creator paced by the job's delay, so creation and configuration
/// wait the same amount after each message.
fn creator_for<C: AgentChannel>(
    channel: C,
    generator: HandleGenerator,
    job: &ProvisionJob,
) -> BotCreator<C> {
    BotCreator::new(channel, generator, job.request.delay)
}

async fn open_botfather(
    client: &UserClient,
    settings: &CreatorSettings,
) -> Result<BotFatherChat, TelegramError> {
    let account = client.whoami().await?;
    info!("Authorized as: {}", account.display_name());

    client.open_chat(&settings.botfather_username).await
}
