use std::sync::Arc;
use std::time::Duration;

use alphadash::{
    init_logging, log_app_start, log_feed_started, logging_config_from_env, FeedConfig, FeedTask,
    TokenListClient,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(&logging_cfg);

    let config = feed_config_from_env();
    let source = Arc::new(TokenListClient::new(
        config.endpoint_url.as_str(),
        Duration::from_millis(config.request_timeout_ms),
    )?);

    log_feed_started(&config);
    let task = FeedTask::spawn(source, config);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => log_view_line(&task),
        }
    }

    task.stop();
    Ok(())
}

fn feed_config_from_env() -> FeedConfig {
    let mut config = FeedConfig::default();

    if let Ok(url) = std::env::var("ALPHADASH_FEED_URL") {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            config.endpoint_url = trimmed.to_string();
        }
    }

    if let Some(refresh_ms) = std::env::var("ALPHADASH_FEED_REFRESH_MS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
    {
        config.refresh_interval_ms = refresh_ms;
    }

    config
}

fn log_view_line(task: &FeedTask) {
    let (countdown, page, error) = task.with_feed(|feed| {
        (
            feed.countdown_seconds(),
            feed.page(),
            feed.last_error().map(str::to_string),
        )
    });

    match error {
        Some(error) => info!(
            component = "feed_watch",
            event = "feed.view",
            countdown,
            rows = page.tokens.len(),
            filtered = page.filtered_count,
            total_pages = page.total_pages,
            error = %error
        ),
        None => info!(
            component = "feed_watch",
            event = "feed.view",
            countdown,
            rows = page.tokens.len(),
            filtered = page.filtered_count,
            total_pages = page.total_pages
        ),
    }
}
