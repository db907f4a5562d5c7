use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use volume_booster::booster::validation::{recommended_config, validate_raw};
use volume_booster::booster::{
    Booster, BoosterConfig, RetryPolicy, Supervisor, SupervisorOutcome, ThreadRandom,
};
use volume_booster::config::{Config, SharedConfigSource};
use volume_booster::exchanges::{Exchange, PaperExchange};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

/// `--seed=N` makes side and amount draws reproducible.
fn parse_seed() -> Option<u64> {
    env::args()
        .skip(1)
        .find_map(|arg| arg.strip_prefix("--seed=").and_then(|s| s.parse().ok()))
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() {
    let config_path = parse_config_path();

    let cfg = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };

    init_tracing(cfg.app.log_level.as_deref());

    info!(
        config = %config_path,
        app = %cfg.app.name,
        env = %cfg.app.env,
        "Configuration loaded"
    );

    let report = validate_raw(&cfg.booster);
    for warning in &report.warnings {
        warn!(warning = %warning, "Booster config warning");
    }
    for err in &report.errors {
        warn!(error = %err, "Booster config error, normalised value will be used");
    }

    // The paper facade is the only built-in trading facade.
    let exchange: Option<Arc<dyn Exchange>> = cfg
        .paper
        .as_ref()
        .map(|paper| Arc::new(PaperExchange::from_config(paper)) as Arc<dyn Exchange>);
    if exchange.is_none() {
        warn!("No paper section configured, booster has no trading facade");
    }

    if !report.is_valid() {
        let venue = exchange.as_ref().map_or("default", |e| e.name());
        let mut suggested: Vec<_> = recommended_config(venue).into_iter().collect();
        suggested.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in suggested {
            info!(exchange = venue, key = %key, value = %value, "Recommended booster setting");
        }
    }

    let booster = Booster::new(BoosterConfig {
        exchange,
        config_source: Some(Arc::new(SharedConfigSource::new(cfg.booster.clone()))),
        symbols: cfg.symbols.clone(),
        engine: cfg.engine.clone(),
        random: Some(Box::new(match parse_seed() {
            Some(seed) => ThreadRandom::seeded(seed),
            None => ThreadRandom::new(),
        })),
    });

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        ctrl_c.cancel();
    });

    let supervisor = Supervisor::new(RetryPolicy::from_config(cfg.engine.retry.as_ref()));
    match supervisor.run(&booster, &cancel).await {
        SupervisorOutcome::Started { attempts } => {
            info!(attempts, "Volume booster running");
        }
        SupervisorOutcome::GaveUp {
            attempts,
            last_error,
        } => {
            error!(attempts, error = %last_error, "Volume booster failed to start");
            return;
        }
        SupervisorOutcome::Fatal(e) => {
            error!(error = %e, "Volume booster failed to start");
            return;
        }
        SupervisorOutcome::Cancelled => return,
    }

    let mut status_timer = tokio::time::interval(STATUS_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = status_timer.tick() => {
                let status = booster.status().await;
                let stats = booster.stats().await;
                info!(
                    current_volume = %status.current_volume.round_dp(2),
                    target_volume = %status.target_volume,
                    progress_percent = status.progress_percent,
                    remaining_volume = %status.remaining_volume.round_dp(2),
                    orders_placed = stats.orders_placed,
                    success_rate = stats.success_rate(),
                    uptime = ?booster.uptime().await,
                    "Volume booster status"
                );
                if !status.is_running {
                    break;
                }
            }
        }
    }

    booster.stop().await;
}
