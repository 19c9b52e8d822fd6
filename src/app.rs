// src/app.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::Scheduler;
use crate::config::{Config, LoggingCfg};
use crate::domain::notification::{MessageTemplate, NotificationDispatcher, Notifier};
use crate::domain::price::{PriceSource, PriceTracker};
use crate::infrastructure::http::{self, AppState};
use crate::infrastructure::{ChannelBroadcaster, HttpPriceSource, LogNotifier, MailApiNotifier};

/// Everything the scheduler and the HTTP layer share
pub struct Components {
    pub tracker: Arc<PriceTracker>,
    pub hub: Option<ChannelBroadcaster>,
}

/// `RUST_LOG` if set, otherwise the configured level
pub fn init_logging(cfg: &LoggingCfg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let result = if cfg.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    if let Err(e) = result {
        eprintln!("logging already initialised: {}", e);
    }
}

pub fn build_dispatcher(
    cfg: &Config,
    hub: Option<&ChannelBroadcaster>,
) -> Result<NotificationDispatcher> {
    let template = MessageTemplate::new(cfg.tracker.city.clone(), cfg.tracker.currency_symbol.clone());
    let mut dispatcher = NotificationDispatcher::new(template);

    if !cfg.notify.recipients.is_empty() {
        let notifier: Arc<dyn Notifier> = match (&cfg.notify.mail, cfg.notify.dry_run) {
            (Some(mail), false) => {
                let notifier = MailApiNotifier::from_config(mail, &cfg.notify.sender)?;
                if std::env::var(&mail.api_key_env).is_err() {
                    warn!("⚠️  {} is not set, mail API requests will be unauthenticated", mail.api_key_env);
                }
                Arc::new(notifier)
            }
            (None, false) => {
                warn!("⚠️  Recipients configured without [notify.mail]; alerts will only be logged");
                Arc::new(LogNotifier)
            }
            (_, true) => Arc::new(LogNotifier),
        };
        info!("📬 Alerts go to {} recipient(s) via {}", cfg.notify.recipients.len(), notifier.name());
        dispatcher = dispatcher.with_notifier(notifier, cfg.notify.recipients.clone());
    }

    if let Some(hub) = hub {
        dispatcher = dispatcher.with_broadcaster(
            Arc::new(hub.clone()),
            cfg.broadcast.channel.clone(),
            cfg.broadcast.event.clone(),
        );
    }

    Ok(dispatcher)
}

/// Composition root: the only place tracker state and history are created
pub fn build(cfg: &Config) -> Result<Components> {
    cfg.validate()?;

    let source: Arc<dyn PriceSource> = Arc::new(HttpPriceSource::from_config(&cfg.source)?);
    let hub = cfg
        .broadcast
        .enabled
        .then(|| ChannelBroadcaster::new(cfg.broadcast.capacity));
    let dispatcher = build_dispatcher(cfg, hub.as_ref())?;
    let tracker = Arc::new(PriceTracker::new(source, dispatcher, cfg.reporting_offset()?));

    Ok(Components { tracker, hub })
}

pub async fn run(cfg: Config) -> Result<()> {
    info!("🚀 Starting gold price tracker");
    info!("Configuration: {:?}", cfg);

    let Components { tracker, hub } = build(&cfg)?;

    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("failed to bind HTTP server at {}", cfg.server.bind))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for shutdown signal: {}", e);
            // keep the sender alive so the service keeps running
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let scheduler = Scheduler::new(
        Arc::clone(&tracker),
        Duration::from_secs(cfg.tracker.interval_secs),
    )
    .run_on_start(cfg.tracker.run_on_start);

    let state = AppState { tracker, hub };
    let (_, served) = tokio::join!(
        scheduler.run(shutdown_rx.clone()),
        http::serve(listener, state, shutdown_rx),
    );
    served?;

    info!("✅ Gold price tracker stopped");
    Ok(())
}

/// One fetch through the configured source; no history, no alerts
pub async fn check(cfg: Config) -> Result<()> {
    cfg.validate()?;
    let source = HttpPriceSource::from_config(&cfg.source)?;

    let reading = source.fetch().await?;
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}
