//! Shake-to-add gesture: sample filter, motion sources, listener and the
//! broadcast channel consumers subscribe to.

mod bus;
mod detector;
mod listener;
mod source;

pub use bus::{ShakeBus, ShakeEvent, ShakeSubscription};
pub use detector::{
    MotionSample, ShakeDetector, ShakeSettings, MIN_SAMPLE_INTERVAL_MS, SHAKE_COOLDOWN_MS,
    SHAKE_THRESHOLD, SPEED_SCALE,
};
pub use listener::{ListenerState, ListenerStats, MotionListener};
pub use source::{
    parse_sample_line, ChannelSource, MotionSource, ReplaySource, SampleFeed, SamplingRate,
    UnavailableSource,
};
