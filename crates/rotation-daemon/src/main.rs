use anyhow::Context;
use rotation_daemon::{build_runner, command, logging, run_mode, LogFormat, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = command().get_matches();
    let mode = run_mode(&matches);

    let settings = Settings::from_env();
    logging::init(
        settings
            .as_ref()
            .map_or_else(|_| LogFormat::default(), |s| s.log_format),
    );
    let settings = settings.context("invalid configuration")?;
    tracing::info!(
        version = rotation_daemon::VERSION,
        clear_time = %settings.clear_time,
        clear_range = %settings.clear_range,
        ?mode,
        "starting sheet rotation"
    );

    let mut runner = build_runner(&settings).await?;

    if runner.run(mode).await {
        Ok(())
    } else {
        tracing::error!("one-shot rotation failed");
        std::process::exit(1);
    }
}
