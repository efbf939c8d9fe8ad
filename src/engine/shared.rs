//! Thread-shareable engine handle.
//!
//! Configuration, state and the sample log sit behind one mutex, so every
//! mutation and every tick sees a consistent snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::RailUpdate;
use crate::engine::{InclineEngine, Sample, TickOutcome};
use crate::engine::telemetry::Telemetry;
use crate::geometry::RailPose;

/// Cloneable handle to an engine shared between threads.
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<InclineEngine>>,
}

impl SharedEngine {
    /// Wrap an engine.
    #[must_use]
    pub fn new(engine: InclineEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // Poisoned locks are recovered: engine methods never panic mid-update.
    fn lock(&self) -> MutexGuard<'_, InclineEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&InclineEngine) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` with exclusive access under the lock.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut InclineEngine) -> R) -> R {
        f(&mut self.lock())
    }

    /// Advance by `dt` seconds.
    pub fn tick(&self, dt: f64) -> TickOutcome {
        self.lock().tick(dt)
    }

    /// Merge a rail update.
    pub fn configure(&self, update: RailUpdate) {
        self.lock().configure(update);
    }

    /// Begin or resume integration.
    pub fn start(&self) {
        self.lock().start();
    }

    /// Suspend integration.
    pub fn pause(&self) {
        self.lock().pause();
    }

    /// Return to the top of the rail.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Telemetry and pose taken under a single lock.
    #[must_use]
    pub fn snapshot(&self) -> (Telemetry, RailPose) {
        let engine = self.lock();
        (*engine.telemetry(), engine.pose())
    }

    /// Copy of the sample log.
    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        self.lock().samples().to_vec()
    }
}

impl From<InclineEngine> for SharedEngine {
    fn from(engine: InclineEngine) -> Self {
        Self::new(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_shared_control_surface() {
        let shared = SharedEngine::default();
        shared.start();
        assert!(shared.with(InclineEngine::is_running));

        shared.tick(0.01);
        shared.pause();
        assert!(!shared.with(InclineEngine::is_running));
        assert_eq!(shared.samples().len(), 1);

        shared.reset();
        assert!(shared.samples().is_empty());
    }

    #[test]
    fn test_driver_and_controller_threads() {
        let shared = SharedEngine::default();
        shared.with_mut(|engine| engine.set_rail_length(1000.0));
        shared.start();

        let driver = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    shared.tick(0.0025);
                }
            })
        };
        let controller = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    shared.configure(RailUpdate {
                        mass_kg: Some(1.0 + f64::from(i % 10)),
                        ..RailUpdate::default()
                    });
                    let (telemetry, pose) = shared.snapshot();
                    assert!(telemetry.speed_mps >= 0.0);
                    assert!(pose.ball_position.is_finite());
                }
            })
        };

        assert!(driver.join().is_ok());
        assert!(controller.join().is_ok());
        assert_eq!(shared.with(InclineEngine::tick_count), 2_000);
    }
}
