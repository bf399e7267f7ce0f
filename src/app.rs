use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use sqlx::SqlitePool;
use tokio::time::timeout;
use tokio_cron_scheduler::JobScheduler;

use crate::{
    config::AppConfig,
    db::{self, feeds::FeedRepository, history::HistoryRepository, PersistenceError},
    fetch::FeedFetcher,
    http::{self, ApiState},
    infrastructure::{directories::ResolvedPaths, instance_guard::InstanceGuard, shutdown::Shutdown},
    reader::ReaderService,
    tasks::scheduler::{configure_maintenance_jobs, MaintenanceCallback},
};

pub struct FeedReaderApp {
    _instance_guard: InstanceGuard,
    scheduler: JobScheduler,
    reader: Arc<ReaderService>,
    history: HistoryRepository,
    feeds: FeedRepository,
    pool: SqlitePool,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl FeedReaderApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let instance_guard = InstanceGuard::acquire(&paths)?;
        let pool = db::init_pool(&paths.db_path).await?;
        let history = HistoryRepository::new(pool.clone());
        let feeds = FeedRepository::new(pool.clone());

        let http_client = Client::builder()
            .user_agent(format!("rustlefeed/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let fetcher = FeedFetcher::new(http_client, config.fetch.clone());

        let classifier = history.load_classifier(config.classifier.alpha).await?;
        let reader = Arc::new(ReaderService::new(fetcher, classifier));

        for (id, url) in feeds.load().await? {
            reader.restore(&url, id).await;
        }
        let report = reader.sync().await;
        tracing::info!(
            target: "app",
            synced = report.synced,
            failed = report.failed,
            pending = report.pending,
            "initial sync complete"
        );

        let maintenance =
            build_maintenance_callback(reader.clone(), history.clone(), feeds.clone());
        let scheduler =
            configure_maintenance_jobs(&config.scheduler.cron_specs, maintenance).await?;

        Ok(Self {
            _instance_guard: instance_guard,
            scheduler,
            reader,
            history,
            feeds,
            pool,
            shutdown,
            config,
        })
    }

    pub async fn run(self) -> Result<()> {
        let FeedReaderApp {
            _instance_guard,
            mut scheduler,
            reader,
            history,
            feeds,
            pool,
            shutdown,
            config,
        } = self;

        tracing::info!("rustlefeed started");

        let state = ApiState {
            reader: reader.clone(),
            feeds: feeds.clone(),
        };
        let mut shutdown_listener = shutdown.subscribe();
        let shutdown_timeout = Duration::from_secs(5);
        let mut server_future = Box::pin(http::serve(
            state,
            &config.server.bind_addr,
            shutdown.subscribe(),
        ));
        let mut server_completed = false;

        tokio::select! {
            _ = shutdown_listener.notified() => {
                tracing::info!("shutdown signal received (CTRL+C / SIGTERM)");
            }
            res = &mut server_future => {
                server_completed = true;
                if let Err(err) = res {
                    tracing::error!(?err, "http server exited with error");
                } else {
                    tracing::info!("http server stopped");
                }
            }
        }

        shutdown.trigger();

        if !server_completed {
            match timeout(shutdown_timeout, &mut server_future).await {
                Ok(Err(err)) => {
                    tracing::error!(?err, "http server exited with error");
                }
                Ok(Ok(())) => {}
                Err(_) => {
                    tracing::warn!(
                        target: "http",
                        "server did not stop within {:?}; continuing shutdown",
                        shutdown_timeout
                    );
                }
            }
        }

        // The in-memory judged log is the training set for the next run, so
        // the final flush happens before anything else winds down.
        if let Err(err) = persist_state(&reader, &history, &feeds).await {
            tracing::error!(target: "db", error = %err, "failed to persist state at shutdown");
        }

        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(?err, "scheduler shutdown failed");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        if timeout(shutdown_timeout, pool.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "database pool did not close within {:?}",
                shutdown_timeout
            );
        }

        tracing::info!("rustlefeed stopped");
        Ok(())
    }
}

async fn persist_state(
    reader: &ReaderService,
    history: &HistoryRepository,
    feeds: &FeedRepository,
) -> Result<(), PersistenceError> {
    let judged = reader.judged_snapshot().await;
    history.save(&judged).await?;
    let rows = reader.persistent_rows().await;
    feeds.save(&rows).await?;
    tracing::info!(
        target: "db",
        judged = judged.len(),
        feeds = rows.len(),
        "state persisted"
    );
    Ok(())
}

fn build_maintenance_callback(
    reader: Arc<ReaderService>,
    history: HistoryRepository,
    feeds: FeedRepository,
) -> MaintenanceCallback {
    Arc::new(move || {
        let reader = reader.clone();
        let history = history.clone();
        let feeds = feeds.clone();
        tokio::spawn(async move {
            if let Err(err) = persist_state(&reader, &history, &feeds).await {
                tracing::error!(target: "db", error = %err, "periodic persist failed");
            }
            let _ = reader.sync().await;
        });
    })
}
