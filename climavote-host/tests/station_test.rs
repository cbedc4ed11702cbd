use std::time::Duration;

use climavote_core::acquisition::{Provenance, Readings};
use climavote_core::comfort::RangeStatus;
use climavote_core::{Direction, Parameter};
use climavote_host::services::{HistoryPeriod, Optimization, VoteStatus};

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_ballot_drives_target_and_history() {
    let app = MockApp::new().await;
    let user = app.create_test_user("heidi").await;
    let (station, _task) = app.start_station(Readings::default());

    for _ in 0..4 {
        let receipts = station
            .submit_ballot(user.id, vec![(Parameter::Light, -2), (Parameter::Noise, 1)], None)
            .await
            .unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[1].status, VoteStatus::Ignored);
    }

    let receipts = station
        .submit_ballot(
            user.id,
            vec![(Parameter::Light, -2), (Parameter::Noise, 1)],
            Some(String::from("too dark")),
        )
        .await
        .unwrap();
    let VoteStatus::Applied { adjustment, .. } = receipts[0].status else {
        panic!("expected applied batch, got {:?}", receipts[0].status);
    };
    assert_eq!(adjustment.direction, Direction::Up);
    assert_eq!(adjustment.target, 402.0);

    let view = station.snapshot();
    let light = view.parameter(Parameter::Light).unwrap();
    assert!(light.monitoring.active);
    assert_eq!(light.indicator, Some(Direction::Up));

    station.poll_now().await.unwrap();
    assert_eq!(station.current_value(Parameter::Light), 402.0);
    assert!(!station.monitoring_state(Parameter::Light).active);

    let comments = app.history_service.comment_history().await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment, "too dark");
    assert_eq!(comments[0].parameter, "light");

    let feedback = app.history_service.feedback_history(user.id).await.unwrap();
    assert!(feedback[0].message.starts_with("Exact match reached for light"));
    assert!(feedback[1].message.starts_with("Increase light"));

    let samples = app.history_service.sensor_history(HistoryPeriod::LastHours(1)).await.unwrap();
    assert_eq!(samples.last().map(|sample| sample.light), Some(402));
}

#[tokio::test]
async fn test_fractional_light_target_is_reached() {
    let app = MockApp::new().await;
    let user = app.create_test_user("ivan").await;
    let (station, _task) = app.start_station(Readings::default());

    let mut receipt = None;
    for value in [-1, -1, -1, -2, -2] {
        receipt = Some(station.submit_vote(user.id, Parameter::Light, value, None).await.unwrap());
    }
    let VoteStatus::Applied { mean, adjustment } = receipt.unwrap().status else {
        panic!("expected the fifth vote to complete the batch");
    };
    assert!((mean + 1.4).abs() < 1e-9);
    assert!((adjustment.target - 401.4).abs() < 1e-9);
    assert_eq!(adjustment.direction, Direction::Up);

    station.poll_now().await.unwrap();

    assert_eq!(station.current_value(Parameter::Light), 402.0);
    assert!(!station.monitoring_state(Parameter::Light).active);
}

#[tokio::test]
async fn test_manual_optimization_and_stop() {
    let app = MockApp::new().await;
    let readings = Readings {
        temperature: 27.0,
        ..Readings::default()
    };
    let (station, _task) = app.start_station(readings);
    station.poll_now().await.unwrap();

    assert_eq!(station.status(Parameter::Temperature), RangeStatus::Critical);

    let result = station
        .request_manual_optimization(Parameter::Temperature, None)
        .await
        .unwrap();
    let Optimization::Started { target, direction, .. } = result else {
        panic!("expected optimization to start, got {:?}", result);
    };
    assert_eq!(target, 22.5);
    assert_eq!(direction, Direction::Down);

    assert!(station.stop_monitoring(Parameter::Temperature).await.unwrap());
    assert!(!station.stop_monitoring(Parameter::Temperature).await.unwrap());

    let view = station.snapshot();
    assert_eq!(view.parameter(Parameter::Temperature).unwrap().indicator, None);
}

#[tokio::test]
async fn test_simulated_health_and_statistics() {
    let app = MockApp::new().await;
    let (station, _task) = app.start_station(Readings::default());

    station.start_monitoring(Parameter::Humidity, 60.0, Direction::Up).await.unwrap();
    station.poll_now().await.unwrap();

    let health = station.sensor_health();
    assert!(health.climate.working);
    assert_eq!(health.climate.provenance, Provenance::Simulated);

    let summary = app
        .history_service
        .parameter_statistics(Parameter::Humidity, HistoryPeriod::All)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.max, 60.0);
    assert!(summary.count >= 1);
}

#[tokio::test]
async fn test_indicator_self_test_lights_then_clears() {
    let app = MockApp::new().await;
    let (station, _task) = app.start_station(Readings::default());

    let runner = station.clone();
    let test = tokio::spawn(async move { runner.run_indicator_test().await });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let view = station.snapshot();
    assert_eq!(view.parameter(Parameter::Temperature).unwrap().indicator, Some(Direction::Down));

    test.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let view = station.snapshot();
    for parameter in Parameter::ALL {
        assert_eq!(view.parameter(parameter).unwrap().indicator, None);
    }
}
