use std::sync::Arc;

use anyhow::Context;

use astrometry_bot::handler::{Bot, BotSettings};
use astrometry_bot::security::FileSystemGuard;
use astrometry_bot::solver::AstrometryClient;
use astrometry_bot::telegram::TelegramClient;
use astrometry_bot::{config, server};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(config::log_level_from_env());
    }
    builder.init();

    log::info!("Starting astrometry bot v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config().context("Failed to load configuration")?;
    log::info!(
        "Solver API at {}, polling {}x{}s for jobs and {}x{}s for solutions",
        config.api_url,
        config.submission_poll_attempts,
        config.submission_poll_delay_secs,
        config.job_poll_attempts,
        config.job_poll_delay_secs
    );

    // Leftovers from a previous run
    if let Err(e) = FileSystemGuard::cleanup_temp_files() {
        log::warn!("Failed to cleanup temp files: {}", e);
    }

    let solver = AstrometryClient::new(&config.api_url)?;
    let files = TelegramClient::new(&config.telegram_api_url, &config.bot_token)?;
    let notifier = TelegramClient::new(&config.telegram_api_url, &config.bot_token)?;

    if let Some(webhook_url) = &config.webhook_url {
        if let Err(e) = notifier
            .set_webhook(webhook_url, config.webhook_secret.as_deref())
            .await
        {
            log::error!("Failed to register webhook {}: {}", webhook_url, e);
        }
    }

    let settings = BotSettings {
        api_key: config.api_key.clone(),
        site_url: config.site_url(),
        solver: config.solver_settings(),
        rate_limit_window: config.rate_limit_window(),
    };
    let bot = Arc::new(Bot::new(solver, files, notifier, settings));

    server::run_server(bot, config.webhook_secret.clone(), config.port)
        .await
        .context("Webhook server failed")?;

    log::info!("Shutting down");
    Ok(())
}
