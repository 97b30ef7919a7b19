//! Emulates device sensors by generating noisy readings from tokio tasks.

use dashmap::DashMap;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};

use sensor_common::constants::STANDARD_GRAVITY;
use sensor_common::errors::SensorError;
use sensor_common::traits::{PlatformSensor, ReadingSink};
use sensor_common::types::{Clock, DeviceMotion, Reading, RotationAngles, SensorKind, XYZ};

use crate::gaussian::GaussianNoise;

const GAUSSIAN_SENSOR_MEAN: f64 = 0f64;
const GAUSSIAN_SENSOR_STDEV: f64 = 0.05;
const EARTH_FIELD_UT: [f64; 3] = [22.0, -4.5, -41.0];
const MAGNETOMETER_BIAS_UT: [f64; 3] = [3.0, -1.5, 0.8];

struct MockTask {
    interval: watch::Sender<Duration>,
    abort_signal: Arc<Notify>,
}

/// Platform that samples every kind from a tokio task at the requested
/// interval. Must be created inside a tokio runtime.
pub struct MockPlatform {
    runtime: Option<Handle>,
    tasks: DashMap<SensorKind, MockTask>,
    sensor_noise: Option<GaussianNoise>,
    emitted: Arc<AtomicU64>,
    gravity: f64,
}

impl MockPlatform {
    pub fn new(add_sensor_noise: bool) -> Self {
        Self {
            runtime: Handle::try_current().ok(),
            tasks: DashMap::new(),
            sensor_noise: add_sensor_noise
                .then(|| GaussianNoise::new(GAUSSIAN_SENSOR_MEAN, GAUSSIAN_SENSOR_STDEV))
                .flatten(),
            emitted: Arc::new(AtomicU64::new(0)),
            gravity: STANDARD_GRAVITY,
        }
    }

    /// Number of readings pushed to the hub since creation.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn is_running(&self, kind: SensorKind) -> bool {
        self.tasks.contains_key(&kind)
    }
}

fn generate_reading(
    kind: SensorKind,
    gravity: f64,
    noise: Option<&GaussianNoise>,
    rng: &mut StdRng,
) -> Result<Reading, SensorError> {
    let mut noisy = |data: XYZ| match noise {
        Some(noise) => noise.add_noise_xyz(rng, data),
        None => data,
    };
    let timestamp = Clock::now().as_secs();
    match kind {
        // device at rest, screen up: measured in g
        SensorKind::Accelerometer => Reading::vector(kind, timestamp, noisy(XYZ::new([0.0, 0.0, -1.0]))),
        SensorKind::Gyroscope => Reading::vector(kind, timestamp, noisy(XYZ::default())),
        SensorKind::Magnetometer => Reading::vector(kind, timestamp, noisy(XYZ::new(EARTH_FIELD_UT))),
        SensorKind::MagnetometerUncalibrated => Reading::vector(
            kind,
            timestamp,
            noisy(XYZ::new(EARTH_FIELD_UT) + XYZ::new(MAGNETOMETER_BIAS_UT)),
        ),
        SensorKind::DeviceMotion => {
            let acceleration = noisy(XYZ::default());
            let rotation_rate = noisy(XYZ::default());
            Reading::motion(
                timestamp,
                DeviceMotion::from_parts(
                    acceleration,
                    XYZ::new([0.0, 0.0, -gravity]),
                    RotationAngles::default(),
                    RotationAngles::new(rotation_rate.z(), rotation_rate.x(), rotation_rate.y()),
                    0,
                ),
            )
        }
    }
}

impl PlatformSensor for MockPlatform {
    fn start(
        &self,
        kind: SensorKind,
        interval: Duration,
        sink: ReadingSink,
    ) -> Result<(), SensorError> {
        let runtime = self
            .runtime
            .clone()
            .ok_or_else(|| SensorError::unavailable(kind, "no tokio runtime"))?;

        let (interval_tx, mut interval_rx) = watch::channel(interval);
        let abort_signal = Arc::new(Notify::new());
        let noise = self.sensor_noise.clone();
        let emitted = self.emitted.clone();
        let gravity = self.gravity;
        let task_abort_signal = abort_signal.clone();

        runtime.spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut period = *interval_rx.borrow_and_update();
            info!("Mock {} started every {:?}", kind, period);
            loop {
                tokio::select! {
                    _ = task_abort_signal.notified() => {
                        break;
                    }
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        period = *interval_rx.borrow_and_update();
                        debug!("Mock {} interval set to {:?}", kind, period);
                    }
                    _ = tokio::time::sleep(period) => {
                        let reading = match generate_reading(kind, gravity, noise.as_ref(), &mut rng) {
                            Ok(reading) => reading,
                            Err(e) => {
                                sink.fail(e.to_string());
                                break;
                            }
                        };
                        if !sink.deliver(reading) {
                            break;
                        }
                        emitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
            info!("Mock {} stopped", kind);
        });

        // replaces (and stops) a task left over from a previous start
        if let Some(previous) = self.tasks.insert(
            kind,
            MockTask {
                interval: interval_tx,
                abort_signal,
            },
        ) {
            previous.abort_signal.notify_one();
        }
        Ok(())
    }

    fn set_interval(&self, kind: SensorKind, interval: Duration) {
        if let Some(task) = self.tasks.get(&kind) {
            task.interval.send_replace(interval);
        }
    }

    fn stop(&self, kind: SensorKind) {
        if let Some((_, task)) = self.tasks.remove(&kind) {
            task.abort_signal.notify_one();
        }
    }

    fn gravity(&self) -> f64 {
        self.gravity
    }
}

impl Drop for MockPlatform {
    fn drop(&mut self) {
        for entry in self.tasks.iter() {
            entry.value().abort_signal.notify_one();
        }
    }
}
