//! Jerk-based shake detector.
//!
//! Each accepted sample is compared against the previous accepted one: the
//! change in the summed axes divided by the elapsed time, scaled by
//! [`SPEED_SCALE`], gives a "speed" that is roughly independent of the
//! sampling rate. A shake fires when the speed exceeds the threshold and the
//! cooldown since the last shake has elapsed.
//!
//! The baseline starts zeroed, so the first accepted sample is measured
//! against `(0, 0, 0)` at `t = 0`. That can produce a reading right after a
//! listener restart while the device is already moving; it is left as is.

use serde::{Deserialize, Serialize};

/// Speed above which a sample counts as a shake (strict comparison).
pub const SHAKE_THRESHOLD: f64 = 800.0;
/// Samples closer than this to the previous accepted one are dropped.
pub const MIN_SAMPLE_INTERVAL_MS: u64 = 100;
/// Minimum spacing between two reported shakes.
pub const SHAKE_COOLDOWN_MS: u64 = 2000;
/// Scales `delta / elapsed_ms` into the speed metric.
pub const SPEED_SCALE: f64 = 10_000.0;

/// One accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_ms: u64,
}

impl MotionSample {
    pub fn new(timestamp_ms: u64, x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, timestamp_ms }
    }

    fn axis_sum(&self) -> f64 {
        self.x + self.y + self.z
    }
}

/// Tunables for [`ShakeDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeSettings {
    pub threshold: f64,
    pub min_sample_interval_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for ShakeSettings {
    fn default() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            min_sample_interval_ms: MIN_SAMPLE_INTERVAL_MS,
            cooldown_ms: SHAKE_COOLDOWN_MS,
        }
    }
}

/// Stateful shake filter. Owned by exactly one listener task.
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    settings: ShakeSettings,
    last_x: f64,
    last_y: f64,
    last_z: f64,
    last_update_ms: u64,
    last_shake_ms: Option<u64>,
    last_speed: Option<f64>,
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(ShakeSettings::default())
    }
}

impl ShakeDetector {
    pub fn new(settings: ShakeSettings) -> Self {
        Self {
            settings,
            last_x: 0.0,
            last_y: 0.0,
            last_z: 0.0,
            last_update_ms: 0,
            last_shake_ms: None,
            last_speed: None,
        }
    }

    pub fn settings(&self) -> &ShakeSettings {
        &self.settings
    }

    /// Speed computed for the most recently accepted sample.
    pub fn last_speed(&self) -> Option<f64> {
        self.last_speed
    }

    pub fn last_shake_ms(&self) -> Option<u64> {
        self.last_shake_ms
    }

    /// Feed one sample. Returns `true` when it completes a shake.
    pub fn detect_shake(&mut self, sample: &MotionSample) -> bool {
        let elapsed = sample.timestamp_ms.saturating_sub(self.last_update_ms);
        if elapsed <= self.settings.min_sample_interval_ms {
            return false;
        }

        let previous = self.last_x + self.last_y + self.last_z;
        let delta = (sample.axis_sum() - previous).abs();
        let speed = delta * SPEED_SCALE / elapsed as f64;

        self.last_x = sample.x;
        self.last_y = sample.y;
        self.last_z = sample.z;
        self.last_update_ms = sample.timestamp_ms;
        self.last_speed = Some(speed);

        if speed > self.settings.threshold && self.cooled_down(sample.timestamp_ms) {
            self.last_shake_ms = Some(sample.timestamp_ms);
            return true;
        }
        false
    }

    /// Forget the baseline and the last shake.
    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }

    fn cooled_down(&self, now_ms: u64) -> bool {
        match self.last_shake_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.settings.cooldown_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(t: u64, x: f64, y: f64, z: f64) -> MotionSample {
        MotionSample::new(t, x, y, z)
    }

    #[test]
    fn worked_example_fires_then_cools_down_then_fires() {
        let mut d = ShakeDetector::default();
        assert!(!d.detect_shake(&s(0, 0.0, 0.0, 0.0)));
        // 50 / 150 * 10000 ~= 3333
        assert!(d.detect_shake(&s(150, 0.0, 0.0, 50.0)));
        assert!((d.last_speed().unwrap() - 3333.33).abs() < 0.01);

        assert!(!d.detect_shake(&s(300, 0.0, 0.0, 100.0)));
        assert!(d.last_speed().unwrap() > SHAKE_THRESHOLD);

        assert!(!d.detect_shake(&s(2050, 0.0, 0.0, 0.0)));
        assert!(d.detect_shake(&s(2200, 0.0, 0.0, 50.0)));
        assert_eq!(d.last_shake_ms(), Some(2200));
    }

    #[test]
    fn samples_within_min_interval_are_ignored() {
        let mut d = ShakeDetector::default();
        assert!(d.detect_shake(&s(200, 0.0, 0.0, 50.0)));
        // 100 ms is not strictly greater than the interval
        assert!(!d.detect_shake(&s(300, 0.0, 0.0, -500.0)));
        assert_eq!(d.last_speed().map(|v| v.round()), Some(2500.0));
    }

    #[test]
    fn ignored_samples_do_not_move_baseline() {
        let mut d = ShakeDetector::default();
        d.detect_shake(&s(1000, 1.0, 1.0, 1.0));
        d.detect_shake(&s(1050, 9.0, 9.0, 9.0));
        // compared against (1,1,1) @ 1000, not the dropped sample
        d.detect_shake(&s(1200, 1.0, 1.0, 2.0));
        assert!((d.last_speed().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn speed_exactly_at_threshold_does_not_fire() {
        let mut d = ShakeDetector::default();
        d.detect_shake(&s(1000, 0.0, 0.0, 0.0));
        // 16 / 200 * 10000 = 800
        assert!(!d.detect_shake(&s(1200, 0.0, 0.0, 16.0)));
        assert_eq!(d.last_speed(), Some(800.0));
    }

    #[test]
    fn cooldown_boundary_is_strict() {
        let mut d = ShakeDetector::default();
        assert!(d.detect_shake(&s(200, 0.0, 0.0, 50.0)));
        assert!(!d.detect_shake(&s(2050, 0.0, 0.0, 0.0)));
        // exactly 2000 ms after the last shake
        assert!(!d.detect_shake(&s(2200, 0.0, 0.0, 50.0)));
        assert!(!d.detect_shake(&s(2350, 0.0, 0.0, 50.0)));
        assert!(d.detect_shake(&s(2500, 0.0, 0.0, 0.0)));
    }

    #[test]
    fn custom_settings_are_honoured() {
        let mut d = ShakeDetector::new(ShakeSettings {
            threshold: 10_000.0,
            ..ShakeSettings::default()
        });
        assert!(!d.detect_shake(&s(150, 0.0, 0.0, 50.0)));
    }

    #[test]
    fn reset_restores_zero_baseline() {
        let mut d = ShakeDetector::default();
        assert!(d.detect_shake(&s(150, 0.0, 0.0, 50.0)));
        d.reset();
        assert!(d.last_shake_ms().is_none());
        assert!(d.detect_shake(&s(300, 0.0, 0.0, 50.0)));
    }
}
