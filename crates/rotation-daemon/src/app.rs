//! CLI definition and runtime wiring

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::sync::Arc;
use std::time::Duration;

use rotation_adapters::{
    AuthorizedUserToken, ClientCredentials, GoogleWorkspace, GraphQlStateClient, TokenSource,
    WebhookNotifier,
};
use rotation_core::{
    Clock, DailySchedule, Notifier, RemoteState, RotationWorkflow, RunMode, Runner,
    SpreadsheetProvider, SystemClock,
};

use crate::config::Settings;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// `sheet-rotation [--once]`
#[must_use]
pub fn command() -> Command {
    Command::new("sheet-rotation")
        .version(crate::VERSION)
        .about("Rotates the attendance spreadsheet once a day")
        .arg(
            Arg::new("once")
                .long("once")
                .action(ArgAction::SetTrue)
                .help("Run one rotation now and exit"),
        )
}

/// Run mode selected on the command line
#[must_use]
pub fn run_mode(matches: &ArgMatches) -> RunMode {
    if matches.get_flag("once") {
        RunMode::Once
    } else {
        RunMode::Daily
    }
}

/// Construct every client once and hand them to a [`Runner`]
pub async fn build_runner(settings: &Settings) -> anyhow::Result<Runner> {
    let http = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let tokens: Arc<dyn TokenSource> = Arc::new(
        AuthorizedUserToken::from_file(http.clone(), &settings.token_path)
            .await
            .context("failed to load Google credentials")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let spreadsheets = Arc::new(SpreadsheetProvider::new(
        GoogleWorkspace::new(http.clone(), tokens),
        clock.clone(),
        settings.report.clone(),
    ));
    let remote: Arc<dyn RemoteState> = Arc::new(GraphQlStateClient::new(
        http.clone(),
        settings.eureka_url.clone(),
        ClientCredentials {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
        },
    ));
    let notifier: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(http, settings.webhook_url.clone()));
    if settings.webhook_url.is_none() {
        tracing::warn!("WEBHOOK_URL not set, failures will only be logged");
    }

    let workflow = RotationWorkflow::new(spreadsheets, remote, settings.clear_range);
    Ok(Runner::new(
        workflow,
        notifier,
        clock,
        DailySchedule::new(settings.clear_time),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_daily() {
        let matches = command().try_get_matches_from(["sheet-rotation"]).unwrap();
        assert_eq!(run_mode(&matches), RunMode::Daily);
    }

    #[test]
    fn once_flag_selects_one_shot() {
        let matches = command()
            .try_get_matches_from(["sheet-rotation", "--once"])
            .unwrap();
        assert_eq!(run_mode(&matches), RunMode::Once);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(command()
            .try_get_matches_from(["sheet-rotation", "--twice"])
            .is_err());
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }
}
