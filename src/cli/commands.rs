use std::sync::Arc;

use crate::app::{AppContext, PostwatchError, Result};
use crate::config::Config;
use crate::daemon::{daemon_status, stop_daemon, Daemon, DaemonConfig};
use crate::notifier::build_notifier;
use crate::store::NotifiedStore;
use crate::tracker::TickSettings;

fn load_valid_config(ctx: &AppContext) -> Result<Config> {
    let config = ctx.load_config()?;
    config.validate()?;
    Ok(config)
}

pub async fn run_once(ctx: &AppContext) -> Result<()> {
    let config = load_valid_config(ctx)?;
    let notifier = build_notifier(&config.notifier)?;
    let tracker = ctx.build_tracker(&config.scraper).await?;

    let settings = TickSettings::from_config(&config);
    println!("Checking {} ({})", settings.target, settings.policy.describe());

    let report = tracker.tick(&settings, notifier.as_ref()).await?;
    println!("{}", report.summary());
    Ok(())
}

pub async fn preview(ctx: &AppContext) -> Result<()> {
    let config = load_valid_config(ctx)?;
    let tracker = ctx.build_tracker(&config.scraper).await?;

    let settings = TickSettings::from_config(&config);
    let outcome = tracker.preview(&settings).await?;

    if outcome.eligible.is_empty() {
        println!(
            "No new posts ({} already notified, {} not recent)",
            outcome.already_notified, outcome.not_recent
        );
        return Ok(());
    }

    for post in &outcome.eligible {
        let id = if post.id.is_empty() { "(no id)" } else { post.id.as_str() };
        println!("{} [{}] {}", id, post.recency_label, post.display_author());
        if !post.link.is_empty() {
            println!("  {}", post.link);
        }
    }
    println!(
        "\n{} would be delivered ({} already notified, {} not recent)",
        outcome.eligible.len(),
        outcome.already_notified,
        outcome.not_recent
    );
    Ok(())
}

pub fn clear(ctx: &AppContext) -> Result<()> {
    let removed = ctx.store.clear_notified_set()?;
    println!("Cleared {} notified posts", removed);
    Ok(())
}

pub fn list_notified(ctx: &AppContext, limit: usize) -> Result<()> {
    let total = ctx.store.notified_count()?;
    if total == 0 {
        println!("No notified posts");
        return Ok(());
    }

    for entry in ctx.store.recent_notified(limit)? {
        let id = if entry.id.is_empty() { "(no id)" } else { entry.id.as_str() };
        println!("{} {}", entry.notified_at.format("%Y-%m-%d %H:%M:%S"), id);
    }
    println!("{} notified in total", total);
    Ok(())
}

pub async fn start_daemon(
    ctx: Arc<AppContext>,
    interval: Option<&str>,
    no_initial_tick: bool,
    log: Option<std::path::PathBuf>,
) -> Result<()> {
    let interval_override = interval
        .map(DaemonConfig::parse_interval)
        .transpose()
        .map_err(PostwatchError::Config)?;

    let config = DaemonConfig {
        interval_override,
        tick_on_start: !no_initial_tick,
        log_file: log,
    };

    let mut daemon = Daemon::new(ctx, config);
    daemon.run().await
}

pub fn stop() -> Result<()> {
    stop_daemon().map_err(PostwatchError::Other)?;
    println!("Daemon stopped");
    Ok(())
}

pub fn status(ctx: &AppContext) -> Result<()> {
    println!("{}", daemon_status());
    println!("{} notified posts recorded", ctx.store.notified_count()?);
    Ok(())
}

pub fn config_path(ctx: &AppContext) {
    println!("{}", ctx.config_path.display());
}

pub fn config_check(ctx: &AppContext) -> Result<()> {
    let config = load_valid_config(ctx)?;
    let interval = config.refresh_interval_secs()?;
    println!("Config OK: {}", ctx.config_path.display());
    println!("  tracking: {}", config.tracker.url.trim());
    println!("  every:    {}", DaemonConfig::format_interval(interval));
    println!("  policy:   {}", config.policy.to_policy().describe());
    println!("  notifier: {}", build_notifier(&config.notifier)?.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotifiedSet;

    #[test]
    fn test_clear_empties_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::in_memory(dir.path().join("config.toml")).unwrap();
        let set: NotifiedSet = ["p1", "p2"].into_iter().collect();
        ctx.store.save_notified_set(&set).unwrap();

        clear(&ctx).unwrap();
        assert_eq!(ctx.store.notified_count().unwrap(), 0);
    }

    #[test]
    fn test_config_check_rejects_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::in_memory(dir.path().join("config.toml")).unwrap();
        assert!(config_check(&ctx).is_err());
    }

    #[test]
    fn test_config_check_accepts_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tracker]\nurl = \"https://www.facebook.com/groups/1\"\n").unwrap();
        let ctx = AppContext::in_memory(path).unwrap();
        assert!(config_check(&ctx).is_ok());
    }

    #[test]
    fn test_start_daemon_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(AppContext::in_memory(dir.path().join("config.toml")).unwrap());
        let result = tokio_test::block_on(start_daemon(ctx, Some("soon"), false, None));
        assert!(matches!(result, Err(PostwatchError::Config(_))));
    }
}
