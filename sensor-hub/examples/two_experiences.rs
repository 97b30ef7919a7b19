use log::{error, info};
use std::sync::Arc;
use tokio::time::Duration;

use sensor_hub::{HubConfig, SensorEvent, SensorHub, SensorKind};
use test_utils::MockPlatform;

#[tokio::main]
async fn main() {
    env_logger::init();

    let add_sensor_noise = true;
    let platform = Arc::new(MockPlatform::new(add_sensor_noise));
    let config = HubConfig::default().with_error_reporter(|err| error!("Reported: {}", err));
    let hub = SensorHub::new(platform.clone(), config).unwrap();

    // A level meter reading the accelerometer slowly
    let level = hub.binding("@demo/level");
    level
        .subscribe(SensorKind::Accelerometer, |_id, event: Arc<SensorEvent>| {
            if let Some(acc) = event.as_reading().and_then(|reading| reading.as_vector()) {
                let tilt = (acc.x().hypot(acc.y()) / acc.z()).atan().to_degrees();
                info!("[level] tilt {:.2} deg", tilt);
            }
        })
        .unwrap();
    level
        .set_update_interval(SensorKind::Accelerometer, 250.0)
        .unwrap();

    // A game sampling accelerometer and device motion fast
    let game = hub.binding("@demo/game");
    for kind in [SensorKind::Accelerometer, SensorKind::DeviceMotion] {
        game.subscribe(kind, move |_id, event: Arc<SensorEvent>| match event.as_ref() {
            SensorEvent::Reading(reading) => {
                info!("[game] {} at {:.3}", reading.kind(), reading.timestamp_secs())
            }
            SensorEvent::Unavailable { kind, reason } => {
                error!("[game] lost {}: {}", kind, reason)
            }
        })
        .unwrap();
        game.set_update_interval(kind, 50.0).unwrap();
    }

    info!(
        "Accelerometer sampling every {:?}, gravity {} m/s^2",
        hub.effective_interval(SensorKind::Accelerometer),
        level.gravity().unwrap()
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    info!("Game closed, removed from {:?}", game.teardown());
    info!(
        "Accelerometer sampling every {:?}",
        hub.effective_interval(SensorKind::Accelerometer)
    );
    tokio::time::sleep(Duration::from_secs(1)).await;

    level.teardown();
    info!(
        "Delivery stats: {:?}, readings emitted: {}",
        hub.delivery_stats(SensorKind::Accelerometer),
        platform.emitted()
    );
}
