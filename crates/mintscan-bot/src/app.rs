//! Application wiring.
//!
//! Startup order:
//! - verify the remote table (fatal on failure)
//! - start the optional metrics exporter
//! - run the feed connection with the ingester until interrupted

use crate::config::{AppConfig, StoreCredentials};
use crate::error::AppResult;
use crate::ingest::{IngestStats, Ingestor};
use mintscan_persistence::CsvLedger;
use mintscan_store::{DynRemoteStore, SupabaseStore};
use mintscan_ws::{ConnectionManager, FeedTransport, TungsteniteTransport};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    store: DynRemoteStore,
}

impl Application {
    /// Create the application with the hosted remote store.
    pub fn new(config: AppConfig, credentials: &StoreCredentials) -> AppResult<Self> {
        let store = SupabaseStore::new(config.store_config(credentials))?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create the application with a caller-supplied remote store.
    pub fn with_store(config: AppConfig, store: DynRemoteStore) -> Self {
        Self { config, store }
    }

    /// Run against the live feed until Ctrl-C.
    pub async fn run(self) -> AppResult<IngestStats> {
        self.run_until(Box::new(TungsteniteTransport), shutdown_signal())
            .await
    }

    /// Run over `transport` until `shutdown` completes.
    ///
    /// Returns an error only for startup faults. Once the feed loop is
    /// running, every fault is logged and recovered.
    pub async fn run_until<S>(
        self,
        transport: Box<dyn FeedTransport>,
        shutdown: S,
    ) -> AppResult<IngestStats>
    where
        S: Future<Output = ()>,
    {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            feed = %self.config.feed.url,
            ledger = %self.config.ledger.path.display(),
            table = %self.config.store.table,
            "Starting mintscan token ingester"
        );

        if let Err(e) = self.store.ensure_ready().await {
            error!(error = %e, "Remote store is not ready");
            return Err(e.into());
        }

        let metrics_handle = self.config.telemetry.metrics_port.map(|port| {
            tokio::spawn(async move {
                if let Err(e) = mintscan_telemetry::serve_metrics(port).await {
                    warn!(error = %e, port, "Metrics exporter stopped");
                }
            })
        });

        let ledger = CsvLedger::new(&self.config.ledger.path);
        let mut ingestor = Ingestor::new(ledger, self.store.clone());
        let manager = ConnectionManager::new(self.config.connection_config(), transport);

        info!("Monitoring feed. Press Ctrl+C to stop.");
        {
            let feed = manager.run(&mut ingestor);
            tokio::pin!(feed);

            let interrupted = tokio::select! {
                () = &mut feed => false,
                () = shutdown => true,
            };

            if interrupted {
                info!("Shutdown signal received, stopping feed");
                manager.shutdown();
                feed.await;
            }
        }

        if let Some(handle) = metrics_handle {
            handle.abort();
        }

        let stats = ingestor.stats().clone();
        stats.log_summary();
        info!(reconnects = manager.reconnect_count(), "mintscan stopped");
        Ok(stats)
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
