//! Background daemon driving the refresh cycle.
//!
//! Reloads the monitored page on a fixed interval and runs one tracker tick
//! per interval. The configuration file is re-read before every tick; a
//! failing tick is logged and the loop carries on.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::Notify;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::warn;

use crate::app::{AppContext, PostwatchError};
use crate::notifier::build_notifier;
use crate::scraper::ScraperConfig;
use crate::store::SqliteStore;
use crate::tracker::{TickSettings, Tracker};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Fixed interval in seconds; `None` follows `tracker.refresh_interval`
    pub interval_override: Option<u64>,
    /// Whether to run a tick immediately on start
    pub tick_on_start: bool,
    /// Log file path (None = stdout)
    pub log_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_override: None,
            tick_on_start: true,
            log_file: None,
        }
    }
}

impl DaemonConfig {
    /// Parse interval string like "30s", "5m", "1h", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        let too_large = || format!("Interval too large: {}", s);

        let secs = if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map_err(|_| format!("Invalid hours: {}", hours))?
                .checked_mul(3600)
                .ok_or_else(too_large)?
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .map_err(|_| format!("Invalid minutes: {}", minutes))?
                .checked_mul(60)
                .ok_or_else(too_large)?
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .map_err(|_| format!("Invalid days: {}", days))?
                .checked_mul(86400)
                .ok_or_else(too_large)?
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))?
        } else {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '30s', '5m', '1h'", s))?
        };

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(secs)
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

/// Tracker bound to the scraper settings its browser was launched with
struct ActiveTracker {
    scraper_config: ScraperConfig,
    tracker: Tracker<SqliteStore>,
}

/// Daemon runner
pub struct Daemon {
    ctx: Arc<AppContext>,
    config: DaemonConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    active: Option<ActiveTracker>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>, config: DaemonConfig) -> Self {
        Self {
            ctx,
            config,
            running: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
            active: None,
        }
    }

    /// Get the PID file path
    pub fn pid_file_path() -> Option<PathBuf> {
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .map(|d| d.join("postwatch").join("daemon.pid"))
    }

    /// Check if another daemon is already running
    pub fn is_running() -> bool {
        Self::read_pid().is_some_and(Self::process_exists)
    }

    fn read_pid() -> Option<u32> {
        let pid_path = Self::pid_file_path()?;
        let pid_str = fs::read_to_string(pid_path).ok()?;
        pid_str.trim().parse::<u32>().ok()
    }

    #[cfg(unix)]
    fn process_exists(pid: u32) -> bool {
        use std::process::Command;
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    fn process_exists(pid: u32) -> bool {
        use std::process::Command;
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid)])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    /// Write PID file
    fn write_pid_file(&self) -> std::io::Result<()> {
        if let Some(pid_path) = Self::pid_file_path() {
            if let Some(parent) = pid_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&pid_path)?;
            writeln!(file, "{}", std::process::id())?;
        }
        Ok(())
    }

    /// Remove PID file
    fn remove_pid_file(&self) {
        if let Some(pid_path) = Self::pid_file_path() {
            let _ = fs::remove_file(pid_path);
        }
    }

    /// Write an operator-facing status line with timestamp
    fn log(&self, msg: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] {}", timestamp, msg);

        if let Some(ref log_path) = self.config.log_file {
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
            {
                let _ = writeln!(file, "{}", line);
            }
        } else {
            println!("{}", line);
        }
    }

    /// Interval for the next cycle: CLI override, then config, then 30s
    fn current_interval_secs(&self) -> u64 {
        if let Some(secs) = self.config.interval_override {
            return secs;
        }
        self.ctx
            .load_config()
            .ok()
            .and_then(|config| config.refresh_interval_secs().ok())
            .unwrap_or(30)
    }

    fn new_timer(secs: u64) -> Interval {
        let mut timer = interval(Duration::from_secs(secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer
    }

    fn spawn_signal_handler(&self) {
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();

        #[cfg(unix)]
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) =
                match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                    (Ok(term), Ok(int)) => (term, int),
                    _ => {
                        warn!("Failed to install signal handlers");
                        return;
                    }
                };

            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        });

        #[cfg(windows)]
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            running.store(false, Ordering::SeqCst);
            shutdown.notify_one();
        });
    }

    /// Run the daemon
    pub async fn run(&mut self) -> crate::app::Result<()> {
        if Self::is_running() {
            return Err(PostwatchError::Other(
                "Another daemon instance is already running".to_string(),
            ));
        }

        self.write_pid_file().map_err(|e| {
            PostwatchError::Other(format!("Failed to write PID file: {}", e))
        })?;

        self.spawn_signal_handler();

        let mut interval_secs = self.current_interval_secs();
        self.log(&format!(
            "postwatch daemon started (refresh interval: {}, PID: {})",
            DaemonConfig::format_interval(interval_secs),
            std::process::id()
        ));

        if self.config.tick_on_start {
            self.run_tick().await;
        }

        let mut timer = Self::new_timer(interval_secs);
        timer.tick().await; // Skip the first immediate tick

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = timer.tick() => {},
                _ = self.shutdown.notified() => break,
            }

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            self.run_tick().await;

            let wanted = self.current_interval_secs();
            if wanted != interval_secs {
                self.log(&format!(
                    "Refresh interval changed to {}",
                    DaemonConfig::format_interval(wanted)
                ));
                interval_secs = wanted;
                timer = Self::new_timer(interval_secs);
                timer.tick().await;
            }
        }

        self.log("Daemon shutting down...");
        self.remove_pid_file();

        Ok(())
    }

    /// Run a single tick with a freshly loaded configuration
    async fn run_tick(&mut self) {
        let start = Utc::now();

        let config = match self.ctx.load_config() {
            Ok(config) => config,
            Err(e) => {
                self.log(&format!("Skipping tick, could not load config: {}", e));
                return;
            }
        };
        if let Err(e) = config.validate() {
            self.log(&format!("Skipping tick: {}", e));
            return;
        }

        let notifier = match build_notifier(&config.notifier) {
            Ok(notifier) => notifier,
            Err(e) => {
                self.log(&format!("Skipping tick, notifier unavailable: {}", e));
                return;
            }
        };

        // Relaunch the browser when its settings changed
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.scraper_config != config.scraper)
        {
            self.log("Scraper settings changed, restarting browser");
            self.active = None;
        }

        if self.active.is_none() {
            match self.ctx.build_tracker(&config.scraper).await {
                Ok(tracker) => {
                    self.active = Some(ActiveTracker {
                        scraper_config: config.scraper.clone(),
                        tracker,
                    });
                }
                Err(e) => {
                    self.log(&format!("Failed to start browser: {}", e));
                    return;
                }
            }
        }

        let Some(active) = self.active.as_ref() else {
            return;
        };

        let settings = TickSettings::from_config(&config);
        let result = active.tracker.tick(&settings, notifier.as_ref()).await;
        let elapsed = Utc::now().signed_duration_since(start);

        match result {
            Ok(report) => self.log(&format!(
                "Tick complete: {} ({:.1}s)",
                report.summary(),
                elapsed.num_milliseconds() as f64 / 1000.0
            )),
            Err(e) => {
                self.log(&format!("Tick failed: {}", e));
                // A broken browser session is rebuilt on the next tick
                if matches!(e, PostwatchError::Scraper(_)) {
                    self.active = None;
                }
            }
        }
    }
}

/// Stop a running daemon by reading PID file and sending signal
pub fn stop_daemon() -> Result<(), String> {
    let pid_path =
        Daemon::pid_file_path().ok_or_else(|| "Could not determine PID file path".to_string())?;

    if !pid_path.exists() {
        return Err("No daemon is running (PID file not found)".to_string());
    }

    let pid_str =
        fs::read_to_string(&pid_path).map_err(|e| format!("Failed to read PID file: {}", e))?;

    let pid: u32 = pid_str
        .trim()
        .parse()
        .map_err(|_| "Invalid PID in PID file".to_string())?;

    #[cfg(unix)]
    {
        use std::process::Command;
        let status = Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .status()
            .map_err(|e| format!("Failed to send signal: {}", e))?;

        if status.success() {
            let _ = fs::remove_file(&pid_path);
            Ok(())
        } else {
            Err(format!("Failed to stop daemon (PID {})", pid))
        }
    }

    #[cfg(windows)]
    {
        use std::process::Command;
        let status = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .status()
            .map_err(|e| format!("Failed to stop process: {}", e))?;

        if status.success() {
            let _ = fs::remove_file(&pid_path);
            Ok(())
        } else {
            Err(format!("Failed to stop daemon (PID {})", pid))
        }
    }
}

/// Check daemon status
pub fn daemon_status() -> String {
    if let Some(pid_path) = Daemon::pid_file_path() {
        if pid_path.exists() {
            return match Daemon::read_pid() {
                Some(pid) if Daemon::process_exists(pid) => {
                    format!("Daemon is running (PID: {})", pid)
                }
                _ => "Daemon is not running (stale PID file)".to_string(),
            };
        }
    }
    "Daemon is not running".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(DaemonConfig::parse_interval("30s").unwrap(), 30);
        assert_eq!(DaemonConfig::parse_interval("5m").unwrap(), 300);
        assert_eq!(DaemonConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(DaemonConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(DaemonConfig::parse_interval("45").unwrap(), 45);
        assert_eq!(DaemonConfig::parse_interval(" 2M ").unwrap(), 120);
        assert!(DaemonConfig::parse_interval("invalid").is_err());
        assert!(DaemonConfig::parse_interval("0s").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_overflow() {
        let err = DaemonConfig::parse_interval("999999999999999999d").unwrap_err();
        assert!(err.contains("too large"));
        assert!(DaemonConfig::parse_interval("18446744073709551615h").is_err());
        assert!(DaemonConfig::parse_interval("307445734561825861m").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(DaemonConfig::format_interval(30), "30s");
        assert_eq!(DaemonConfig::format_interval(300), "5m");
        assert_eq!(DaemonConfig::format_interval(3600), "1h");
        assert_eq!(DaemonConfig::format_interval(86400), "1d");
        assert_eq!(DaemonConfig::format_interval(90), "90s");
    }

    #[test]
    fn test_interval_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(AppContext::in_memory(dir.path().join("config.toml")).unwrap());
        let daemon = Daemon::new(
            ctx,
            DaemonConfig {
                interval_override: Some(7),
                ..Default::default()
            },
        );
        assert_eq!(daemon.current_interval_secs(), 7);
    }

    #[test]
    fn test_interval_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tracker]\nrefresh_interval = \"2m\"\n").unwrap();

        let ctx = Arc::new(AppContext::in_memory(path).unwrap());
        let daemon = Daemon::new(ctx, DaemonConfig::default());
        assert_eq!(daemon.current_interval_secs(), 120);
    }

    #[tokio::test]
    async fn test_tick_skipped_without_tracking_url() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(AppContext::in_memory(dir.path().join("config.toml")).unwrap());
        let mut daemon = Daemon::new(
            ctx,
            DaemonConfig {
                log_file: Some(dir.path().join("daemon.log")),
                ..Default::default()
            },
        );

        daemon.run_tick().await;

        assert!(daemon.active.is_none());
        let log = fs::read_to_string(dir.path().join("daemon.log")).unwrap();
        assert!(log.contains("Skipping tick"));
    }
}
