use std::sync::Arc;

use crate::app::App;
use crate::configs::Settings;

pub mod app;
pub mod configs;
pub mod errors;
pub mod hardware;
pub mod models;
pub mod repositories;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let app = App::new(settings).await?;

    let mut snapshots = app.station.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            match serde_json::to_string(&snapshot) {
                Ok(json) => tracing::debug!("snapshot: {}", json),
                Err(e) => tracing::warn!("Failed to encode snapshot: {}", e),
            }
        }
    });

    tracing::info!("Station started, sensors: {:?}", app.station.sensor_health());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    app.shutdown().await
}
