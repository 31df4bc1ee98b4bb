//! Background motion listener.
//!
//! Bridges a [`MotionSource`] to the [`ShakeDetector`] and publishes each
//! detected shake on a [`ShakeBus`]. Start and stop are driven from outside;
//! the listener knows nothing about UI visibility beyond the booleans given to
//! [`MotionListener::apply_lifecycle`].
//!
//! The detector lives inside the spawned callback task, so nothing else can
//! touch it. Every `start` builds a fresh detector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bus::ShakeBus;
use super::detector::{ShakeDetector, ShakeSettings};
use super::source::{MotionSource, SamplingRate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerState {
    Stopped,
    Running,
    /// Started, but the source has no sensor. Never produces shakes.
    Inert,
}

/// Counters shared with the callback task.
#[derive(Debug, Default)]
struct Counters {
    samples: AtomicU64,
    shakes: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListenerStats {
    pub samples: u64,
    pub shakes: u64,
}

pub struct MotionListener {
    source: Box<dyn MotionSource>,
    bus: ShakeBus,
    settings: ShakeSettings,
    rate: SamplingRate,
    state: ListenerState,
    task: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl MotionListener {
    pub fn new(source: Box<dyn MotionSource>, bus: ShakeBus, settings: ShakeSettings) -> Self {
        Self {
            source,
            bus,
            settings,
            rate: SamplingRate::Normal,
            state: ListenerState::Stopped,
            task: None,
            counters: Arc::new(Counters::default()),
        }
    }

    /// `Stopped` once the source has run dry, even without a `stop` call.
    pub fn state(&self) -> ListenerState {
        match &self.task {
            Some(task) if task.is_finished() => ListenerState::Stopped,
            _ => self.state,
        }
    }

    pub fn bus(&self) -> &ShakeBus {
        &self.bus
    }

    /// Samples and shakes seen since construction.
    pub fn stats(&self) -> ListenerStats {
        ListenerStats {
            samples: self.counters.samples.load(Ordering::Relaxed),
            shakes: self.counters.shakes.load(Ordering::Relaxed),
        }
    }

    /// Register with the source and begin detecting. No-op if already started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> ListenerState {
        self.reap_finished();
        if self.state != ListenerState::Stopped {
            return self.state;
        }

        let Some(mut rx) = self.source.register(self.rate) else {
            warn!("motion sensor unavailable, shake detection inert");
            self.state = ListenerState::Inert;
            return self.state;
        };

        let bus = self.bus.clone();
        let counters = self.counters.clone();
        let mut detector = ShakeDetector::new(self.settings);
        self.task = Some(tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                counters.samples.fetch_add(1, Ordering::Relaxed);
                if detector.detect_shake(&sample) {
                    counters.shakes.fetch_add(1, Ordering::Relaxed);
                    let reached = bus.publish();
                    info!(
                        at_ms = sample.timestamp_ms,
                        speed = detector.last_speed().unwrap_or_default(),
                        subscribers = reached,
                        "shake detected"
                    );
                }
            }
            debug!("motion stream closed");
        }));

        info!(rate = ?self.rate, "motion listener started");
        self.state = ListenerState::Running;
        self.state
    }

    fn reap_finished(&mut self) {
        if self.task.as_ref().is_some_and(|t| t.is_finished()) {
            self.task = None;
            self.source.unregister();
            self.state = ListenerState::Stopped;
            debug!("motion stream ended");
        }
    }

    /// Unregister from the source and cancel the callback task. Idempotent.
    pub fn stop(&mut self) {
        if self.state == ListenerState::Stopped {
            return;
        }
        self.source.unregister();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        info!("motion listener stopped");
        self.state = ListenerState::Stopped;
    }

    /// Run only while shake detection is enabled and the app is visible.
    pub fn apply_lifecycle(&mut self, shake_enabled: bool, app_visible: bool) -> ListenerState {
        if shake_enabled && app_visible {
            self.start()
        } else {
            self.stop();
            self.state
        }
    }

    /// Wait until the source runs dry. Returns immediately when not running.
    pub async fn drained(&mut self) -> ListenerStats {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "motion task ended abnormally");
            }
            self.source.unregister();
            self.state = ListenerState::Stopped;
        }
        self.stats()
    }
}

impl Drop for MotionListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
