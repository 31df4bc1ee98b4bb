//! Motion sources the listener can register with.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::detector::MotionSample;

/// Requested accelerometer delivery rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingRate {
    Fastest,
    Game,
    Ui,
    #[default]
    Normal,
}

/// Something that delivers accelerometer samples.
///
/// `register` returning `None` means the hardware is missing; callers treat
/// that as inert operation, not as an error.
pub trait MotionSource: Send {
    fn register(&mut self, rate: SamplingRate) -> Option<mpsc::Receiver<MotionSample>>;
    fn unregister(&mut self);
}

/// Device without an accelerometer.
#[derive(Debug, Default)]
pub struct UnavailableSource;

impl MotionSource for UnavailableSource {
    fn register(&mut self, _rate: SamplingRate) -> Option<mpsc::Receiver<MotionSample>> {
        None
    }

    fn unregister(&mut self) {}
}

/// Live source fed through a [`SampleFeed`] handle.
///
/// Samples pushed while nothing is registered are dropped, the same way a
/// sensor has nobody to report to.
#[derive(Debug)]
pub struct ChannelSource {
    capacity: usize,
    slot: Arc<Mutex<Option<mpsc::Sender<MotionSample>>>>,
}

/// Producer side of a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct SampleFeed {
    slot: Arc<Mutex<Option<mpsc::Sender<MotionSample>>>>,
}

impl ChannelSource {
    pub fn new(capacity: usize) -> (Self, SampleFeed) {
        let slot = Arc::new(Mutex::new(None));
        let source = Self {
            capacity: capacity.max(1),
            slot: slot.clone(),
        };
        (source, SampleFeed { slot })
    }
}

impl MotionSource for ChannelSource {
    fn register(&mut self, _rate: SamplingRate) -> Option<mpsc::Receiver<MotionSample>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut slot = self.slot.lock().ok()?;
        *slot = Some(tx);
        Some(rx)
    }

    fn unregister(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }
}

impl SampleFeed {
    /// Offer one sample. Returns `false` if it was dropped.
    pub fn push(&self, sample: MotionSample) -> bool {
        let Ok(slot) = self.slot.lock() else {
            return false;
        };
        match slot.as_ref() {
            Some(tx) => tx.try_send(sample).is_ok(),
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

/// Finite recorded sample stream. Ends once every sample was delivered.
///
/// Samples are delivered at their recorded spacing, the first one right
/// away, the way a sensor would report them.
#[derive(Debug, Default)]
pub struct ReplaySource {
    samples: Vec<MotionSample>,
    feeder: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(samples: Vec<MotionSample>) -> Self {
        Self {
            samples,
            feeder: None,
        }
    }

    /// Parse `timestamp_ms,x,y,z` lines. Blank lines and `#` comments are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Self, String> {
        let mut samples = Vec::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let sample = parse_sample_line(trimmed)
                .ok_or_else(|| format!("line {}: expected timestamp_ms,x,y,z", idx + 1))?;
            samples.push(sample);
        }
        Ok(Self::new(samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl MotionSource for ReplaySource {
    /// Must be called from within a tokio runtime.
    fn register(&mut self, _rate: SamplingRate) -> Option<mpsc::Receiver<MotionSample>> {
        self.unregister();
        let (tx, rx) = mpsc::channel(16);
        let samples = self.samples.clone();
        self.feeder = Some(tokio::spawn(async move {
            let started = Instant::now();
            let first_ms = samples.first().map_or(0, |s| s.timestamp_ms);
            for sample in samples {
                let offset = sample.timestamp_ms.saturating_sub(first_ms);
                sleep_until(started + Duration::from_millis(offset)).await;
                if tx.send(sample).await.is_err() {
                    break;
                }
            }
        }));
        Some(rx)
    }

    fn unregister(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Parse one `timestamp_ms,x,y,z` record.
pub fn parse_sample_line(line: &str) -> Option<MotionSample> {
    let mut parts = line.split(',').map(str::trim);
    let timestamp_ms = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MotionSample::new(timestamp_ms, x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sample_lines() {
        let s = parse_sample_line("150, 0.5,-1,9.81").unwrap();
        assert_eq!(s.timestamp_ms, 150);
        assert_eq!(s.x, 0.5);
        assert_eq!(s.y, -1.0);
        assert_eq!(s.z, 9.81);

        assert!(parse_sample_line("150,1,2").is_none());
        assert!(parse_sample_line("150,1,2,3,4").is_none());
        assert!(parse_sample_line("-5,1,2,3").is_none());
        assert!(parse_sample_line("abc,1,2,3").is_none());
    }

    #[test]
    fn replay_skips_comments_and_reports_bad_lines() {
        let src = ReplaySource::from_lines("# t,x,y,z\n0,0,0,0\n\n150,0,0,50".lines()).unwrap();
        assert_eq!(src.len(), 2);

        let err = ReplaySource::from_lines("0,0,0,0\nnope".lines()).unwrap_err();
        assert!(err.starts_with("line 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn replay_keeps_recorded_spacing_then_closes() {
        let mut src = ReplaySource::new(vec![
            MotionSample::new(1_000, 0.0, 0.0, 0.0),
            MotionSample::new(1_150, 0.0, 0.0, 50.0),
            MotionSample::new(3_200, 0.0, 0.0, 0.0),
        ]);
        let mut rx = src.register(SamplingRate::Normal).unwrap();
        let started = Instant::now();

        assert_eq!(rx.recv().await.unwrap().timestamp_ms, 1_000);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(rx.recv().await.unwrap().timestamp_ms, 1_150);
        assert_eq!(started.elapsed(), Duration::from_millis(150));
        assert_eq!(rx.recv().await.unwrap().timestamp_ms, 3_200);
        assert_eq!(started.elapsed(), Duration::from_millis(2_200));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn replay_unregister_stops_delivery() {
        let mut src = ReplaySource::new(vec![
            MotionSample::new(0, 0.0, 0.0, 0.0),
            MotionSample::new(5_000, 0.0, 0.0, 50.0),
        ]);
        let mut rx = src.register(SamplingRate::Normal).unwrap();
        assert_eq!(rx.recv().await.unwrap().timestamp_ms, 0);
        src.unregister();
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn feed_drops_samples_while_unregistered() {
        let (mut src, feed) = ChannelSource::new(4);
        assert!(!feed.push(MotionSample::new(1, 0.0, 0.0, 0.0)));

        let mut rx = src.register(SamplingRate::Normal).unwrap();
        assert!(feed.is_registered());
        assert!(feed.push(MotionSample::new(2, 0.0, 0.0, 0.0)));
        assert_eq!(rx.try_recv().unwrap().timestamp_ms, 2);

        src.unregister();
        assert!(!feed.push(MotionSample::new(3, 0.0, 0.0, 0.0)));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn unavailable_source_never_registers() {
        let mut src = UnavailableSource;
        assert!(src.register(SamplingRate::Normal).is_none());
        assert_eq!(SamplingRate::default(), SamplingRate::Normal);
    }
}
