#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use climavote_core::acquisition::{AcquisitionMode, Readings};
use climavote_host::configs::{Database, SchemaManager, Storage};
use climavote_host::hardware::{Devices, SimulatedPins, SimulatedSensorBus};
use climavote_host::models::User;
use climavote_host::services::{AuthService, HistoryService, StationConfig, StationHandle, StationService};
use tokio::task::JoinHandle;

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub auth_service: Arc<AuthService>,
    pub history_service: Arc<HistoryService>,
}

impl MockApp {
    pub async fn new() -> Self {
        let storage = Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        Self {
            auth_service: Arc::new(AuthService::new(storage.clone())),
            history_service: Arc::new(HistoryService::new(storage.clone())),
            storage,
        }
    }

    /// Simulated station that only polls when refreshed.
    pub fn start_station(&self, readings: Readings) -> (StationHandle, JoinHandle<()>) {
        let devices = Devices {
            mode: AcquisitionMode::Simulated,
            sensors: Box::new(SimulatedSensorBus::with_readings(readings)),
            pins: Box::new(SimulatedPins::default()),
        };
        let config = StationConfig {
            interval: Duration::from_secs(3600),
            release_delay: Duration::from_millis(50),
        };

        StationService::new(self.storage.clone(), devices, config).start()
    }

    pub async fn create_test_user(&self, username: &str) -> User {
        self.auth_service.register(username, "password123").await.unwrap()
    }
}
