//! Channel for errors raised where no caller can receive them.

use log::{error, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use sensor_common::errors::SensorError;

use crate::config::ErrorReporter;

pub(crate) struct Diagnostics {
    reporter: Option<ErrorReporter>,
    reported: AtomicU64,
}

impl Diagnostics {
    pub(crate) fn new(reporter: Option<ErrorReporter>) -> Self {
        Self {
            reporter,
            reported: AtomicU64::new(0),
        }
    }

    /// Logs `err` and forwards it to the installed reporter, if any.
    pub(crate) fn report(&self, err: &SensorError) {
        match err {
            SensorError::CallbackFailure { .. } => error!("{}", err),
            _ => warn!("{}", err),
        }
        self.reported.fetch_add(1, Ordering::Relaxed);

        if let Some(reporter) = &self.reporter {
            if panic::catch_unwind(AssertUnwindSafe(|| reporter(err))).is_err() {
                error!("Error reporter panicked while handling: {}", err);
            }
        }
    }

    pub(crate) fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}
