//! Engine behind one lock.

use std::sync::Arc;

use halo_shared::LandmarkFrame;
use parking_lot::{Mutex, MutexGuard};

use crate::compositor::DrawList;
use crate::config::{LiveSettings, SettingsUpdate};
use crate::engine::{Engine, FrameStats};
use crate::error::HaloResult;
use crate::particles::CommitReceipt;
use crate::sync::CommitSender;

/// Cloneable handle to an engine shared between an input thread and a
/// frame driver.
///
/// Every method holds the lock for its whole duration: a commit is never
/// observed half-applied by a tick, and a tick never sees a commit arrive
/// midway.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
    live: Arc<LiveSettings>,
    sender: CommitSender,
}

impl SharedEngine {
    /// Wraps an engine.
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        let live = Arc::clone(engine.live());
        let sender = engine.commit_sender();
        Self {
            inner: Arc::new(Mutex::new(engine)),
            live,
            sender,
        }
    }

    /// Commits immediately, waiting for any running tick to finish.
    pub fn try_commit_text(&self, text: &str) -> HaloResult<CommitReceipt> {
        self.inner.lock().try_commit_text(text)
    }

    /// Commits immediately; rejections are logged.
    pub fn commit_text(&self, text: &str) {
        self.inner.lock().commit_text(text);
    }

    /// Clears immediately.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Non-blocking commit path: queued, applied at the start of the next tick.
    #[must_use]
    pub fn commit_sender(&self) -> CommitSender {
        self.sender.clone()
    }

    /// Live settings update. Needs no lock.
    pub fn set_config(&self, update: SettingsUpdate) {
        self.live.apply(update);
    }

    /// Runs one tick and returns its statistics.
    pub fn tick(&self, frame: &LandmarkFrame, dt: f32) -> FrameStats {
        let mut engine = self.inner.lock();
        engine.on_frame(frame, dt);
        engine.stats()
    }

    /// Runs one tick and hands the draw list to `render` while still locked.
    pub fn tick_with<R>(&self, frame: &LandmarkFrame, dt: f32, render: impl FnOnce(&DrawList) -> R) -> R {
        let mut engine = self.inner.lock();
        render(engine.on_frame(frame, dt))
    }

    /// Locks the engine for direct access.
    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock()
    }
}
