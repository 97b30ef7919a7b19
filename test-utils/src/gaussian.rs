use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use sensor_common::types::XYZ;

/// Functionality to add some Gaussian noise.
#[derive(Clone, Debug)]
pub struct GaussianNoise {
    normal: Normal<f64>,
}

impl GaussianNoise {
    /// Creates new distribution from mean and stdev. Returns None if stdev
    /// is negative or not finite.
    pub fn new(mean: f64, stdev: f64) -> Option<Self> {
        if !stdev.is_finite() || stdev < 0.0 {
            return None;
        }
        Normal::new(mean, stdev).ok().map(|normal| Self { normal })
    }

    /// Sample from distribution
    pub fn draw_sample(&self, rng: &mut StdRng) -> f64 {
        self.normal.sample(rng)
    }

    /// Adds noise to each axis of a measurement
    pub fn add_noise_xyz(&self, rng: &mut StdRng, data: XYZ) -> XYZ {
        let [x, y, z] = data.inner();
        XYZ::new([
            x + self.draw_sample(rng),
            y + self.draw_sample(rng),
            z + self.draw_sample(rng),
        ])
    }
}
