//! Wall-clock timing envelopes bracketing an instrumented operation.
//!
//! Timestamps are split into whole seconds and remainder milliseconds because
//! that is the shape the telemetry backend expects on the wire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_unix_millis(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_millis(&self) -> u64 {
        // A clock set before the epoch reads as zero.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
            })
    }
}

/// Clock whose reading only changes when told to.
///
/// A reading of `0` produces [`Timestamp::ZERO`], which is indistinguishable
/// from an envelope that was never finalized.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `millis` since the Unix epoch.
    #[must_use]
    pub const fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(step))
            })
            .ok();
    }
}

impl Clock for ManualClock {
    fn now_unix_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Wall-clock instant with millisecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp")]
pub struct Timestamp {
    seconds: u64,
    milliseconds: u16,
}

#[derive(Deserialize)]
struct RawTimestamp {
    seconds: u64,
    milliseconds: u16,
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = Error;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        if raw.milliseconds >= 1000 {
            return Err(Error::InvalidTimestamp {
                milliseconds: raw.milliseconds,
            });
        }
        Ok(Self {
            seconds: raw.seconds,
            milliseconds: raw.milliseconds,
        })
    }
}

impl Timestamp {
    /// Sentinel used for the end of an envelope that has not been finalized.
    pub const ZERO: Self = Self {
        seconds: 0,
        milliseconds: 0,
    };

    /// Splits milliseconds since the Unix epoch into seconds and remainder.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_unix_millis(millis: u64) -> Self {
        Self {
            seconds: millis / 1000,
            // Always below 1000.
            milliseconds: (millis % 1000) as u16,
        }
    }

    /// Reads the supplied clock.
    #[must_use]
    pub fn now<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::from_unix_millis(clock.now_unix_millis())
    }

    /// Whole seconds since the Unix epoch.
    #[must_use]
    pub const fn seconds(self) -> u64 {
        self.seconds
    }

    /// Milliseconds past [`Self::seconds`], in `0..1000`.
    #[must_use]
    pub const fn milliseconds(self) -> u16 {
        self.milliseconds
    }

    /// Recombines the split value into milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_unix_millis(self) -> u64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(self.milliseconds as u64)
    }

    /// Returns `true` for the zero sentinel.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.seconds == 0 && self.milliseconds == 0
    }
}

/// Start/end bracket of one instrumented operation.
///
/// Created by [`start_timing`] with `end` set to [`Timestamp::ZERO`], then
/// replaced by the value returned from [`TimingEnvelope::finalize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimingEnvelope {
    #[serde(rename = "startTime")]
    start: Timestamp,
    #[serde(rename = "endTime")]
    end: Timestamp,
}

impl TimingEnvelope {
    /// Opens an envelope at the current reading of `clock`.
    #[must_use]
    pub fn start_with<C: Clock + ?Sized>(clock: &C) -> Self {
        Self {
            start: Timestamp::now(clock),
            end: Timestamp::ZERO,
        }
    }

    /// Returns a copy of this envelope closed at the current reading of `clock`.
    #[must_use]
    pub fn finalize_with<C: Clock + ?Sized>(&self, clock: &C) -> Self {
        Self {
            start: self.start,
            end: Timestamp::now(clock),
        }
    }

    /// Returns a copy of this envelope closed at the current wall-clock time.
    #[must_use]
    pub fn finalize(&self) -> Self {
        self.finalize_with(&SystemClock)
    }

    /// Builds an envelope from explicit timestamps.
    #[must_use]
    pub const fn from_parts(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// When the operation started.
    #[must_use]
    pub const fn started_at(&self) -> Timestamp {
        self.start
    }

    /// When the operation ended, or [`Timestamp::ZERO`] before finalization.
    #[must_use]
    pub const fn ended_at(&self) -> Timestamp {
        self.end
    }

    /// Returns `true` once the end timestamp has been captured.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        !self.end.is_zero()
    }

    /// Time between start and end, or `None` before finalization.
    ///
    /// Saturates at zero if the wall clock stepped backwards.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.is_finalized().then(|| {
            Duration::from_millis(
                self.end
                    .as_unix_millis()
                    .saturating_sub(self.start.as_unix_millis()),
            )
        })
    }
}

/// Opens a timing envelope at the current wall-clock time.
#[must_use]
pub fn start_timing() -> TimingEnvelope {
    TimingEnvelope::start_with(&SystemClock)
}

/// Returns `envelope` closed at the current wall-clock time.
#[must_use]
pub fn finalize_timing(envelope: &TimingEnvelope) -> TimingEnvelope {
    envelope.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_seconds_and_milliseconds() {
        let clock = ManualClock::new(1_000_500);
        let envelope = TimingEnvelope::start_with(&clock);
        assert_eq!(envelope.started_at().seconds(), 1000);
        assert_eq!(envelope.started_at().milliseconds(), 500);
        assert_eq!(envelope.ended_at(), Timestamp::ZERO);
        assert!(!envelope.is_finalized());

        clock.set(1_002_125);
        let finalized = envelope.finalize_with(&clock);
        assert_eq!(finalized.started_at(), envelope.started_at());
        assert_eq!(finalized.ended_at().seconds(), 1002);
        assert_eq!(finalized.ended_at().milliseconds(), 125);
        assert_eq!(finalized.elapsed(), Some(Duration::from_millis(1625)));

        // The input envelope is untouched.
        assert!(!envelope.is_finalized());
        assert_eq!(envelope.elapsed(), None);
    }

    #[test]
    fn system_clock_end_never_precedes_start() {
        let envelope = start_timing();
        let finalized = finalize_timing(&envelope);
        assert!(finalized.ended_at().seconds() >= finalized.started_at().seconds());
        assert!(finalized.ended_at() >= finalized.started_at());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(999);
        clock.advance(Duration::from_millis(2));
        assert_eq!(Timestamp::now(&clock), Timestamp::from_unix_millis(1001));
        assert_eq!(Timestamp::now(&clock).as_unix_millis(), 1001);
    }

    #[test]
    fn backwards_clock_saturates_elapsed() {
        let envelope = TimingEnvelope::from_parts(
            Timestamp::from_unix_millis(5_000),
            Timestamp::from_unix_millis(4_000),
        );
        assert_eq!(envelope.elapsed(), Some(Duration::ZERO));
    }

    #[test]
    fn rejects_millisecond_overflow() {
        let err = serde_json::from_value::<Timestamp>(json!({"seconds": 1, "milliseconds": 5000}))
            .unwrap_err();
        assert!(err.to_string().contains("below 1000"));

        let parsed: Timestamp =
            serde_json::from_value(json!({"seconds": 1, "milliseconds": 999})).unwrap();
        assert_eq!(parsed.as_unix_millis(), 1999);
    }

    #[test]
    fn epoch_reading_is_indistinguishable_from_unfinalized() {
        let clock = ManualClock::new(0);
        let envelope = TimingEnvelope::start_with(&clock).finalize_with(&clock);
        assert!(!envelope.is_finalized());
        assert_eq!(envelope.elapsed(), None);
    }

    #[test]
    fn serializes_with_wire_names() {
        let clock = ManualClock::new(1_000_500);
        let envelope = TimingEnvelope::start_with(&clock);
        let value = serde_json::to_value(envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "startTime": { "seconds": 1000, "milliseconds": 500 },
                "endTime": { "seconds": 0, "milliseconds": 0 }
            })
        );
    }
}
