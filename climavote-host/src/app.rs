use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::configs::{SchemaManager, Settings, Storage};
use crate::hardware::open_devices;
use crate::services::{AuthService, HistoryService, StationConfig, StationHandle, StationService};

/// Everything a front end needs to drive the station.
pub struct App {
    pub storage: Arc<Storage>,
    pub auth_service: Arc<AuthService>,
    pub history_service: Arc<HistoryService>,
    pub station: StationHandle,
    task: JoinHandle<()>,
}

impl App {
    pub async fn new(settings: &Arc<Settings>) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);

        let devices = open_devices(settings.station.mode, &settings.hardware);
        let config = StationConfig::new(&settings.station, devices.mode);
        let (station, task) = StationService::new(storage.clone(), devices, config).start();

        Ok(Self {
            auth_service: Arc::new(AuthService::new(storage.clone())),
            history_service: Arc::new(HistoryService::new(storage.clone())),
            storage,
            station,
            task,
        })
    }

    /// Stops the station, waits for its loop to finish and closes the database.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        if let Err(e) = self.station.shutdown().await {
            tracing::warn!("Station already stopped: {}", e);
        }
        self.task.await?;
        self.storage.close().await;

        Ok(())
    }
}
