//! Profile Sinks
//!
//! The DSP side of arbitration: whatever actually applies a profile to the
//! amplifier. The arbitrator only ever talks to a [`ProfileSink`]; the bus
//! transaction behind it is someone else's problem.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{DspError, ProfileId};

/// Capability to apply a DSP profile.
///
/// Calls are synchronous and may block for the duration of the DSP
/// transaction. Pushing the same profile twice must be harmless.
pub trait ProfileSink: Send + Sync {
    fn push_profile(&self, profile: ProfileId) -> Result<(), DspError>;

    /// Label used in log lines
    fn name(&self) -> &str {
        "dsp"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAN-OUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Pushes every profile to several sinks in order, e.g. both amplifiers of a
/// stereo pair sharing one audio path.
///
/// Stops at the first failing sink. Sinks before it have already applied the
/// profile, so the pair may be split across two profiles. The arbitrator
/// re-pushes its next winner after any failure, even one matching the last
/// applied profile, which brings every member back together.
pub struct FanOutSink {
    sinks: Vec<Arc<dyn ProfileSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink (builder style)
    pub fn with(mut self, sink: Arc<dyn ProfileSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for FanOutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSink for FanOutSink {
    fn push_profile(&self, profile: ProfileId) -> Result<(), DspError> {
        for sink in &self.sinks {
            sink.push_profile(profile).inspect_err(|e| {
                log::error!("{}: profile {} push failed: {}", sink.name(), profile, e);
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fan-out"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDING (dry-run) SINK
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct RecordingState {
    pushed: Vec<ProfileId>,
    attempts: usize,
    fail_next: usize,
    fail_profiles: HashSet<ProfileId>,
}

/// Dry-run sink: records every successfully applied profile and can be told
/// to fail.
///
/// Used by `pa-scenectl` to replay transitions without hardware, and by
/// tests to observe the push sequence.
#[derive(Debug)]
pub struct RecordingSink {
    name: String,
    state: Mutex<RecordingState>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::named("dry-run")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(RecordingState::default()),
        }
    }

    /// Fail the next `count` pushes regardless of profile
    pub fn fail_next(&self, count: usize) {
        self.state.lock().fail_next = count;
    }

    /// Fail every push of `profile` until [`Self::clear_failures`]
    pub fn fail_profile(&self, profile: ProfileId) {
        self.state.lock().fail_profiles.insert(profile);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.fail_next = 0;
        state.fail_profiles.clear();
    }

    /// Successfully applied profiles, oldest first
    pub fn pushed(&self) -> Vec<ProfileId> {
        self.state.lock().pushed.clone()
    }

    /// Last successfully applied profile
    pub fn last(&self) -> Option<ProfileId> {
        self.state.lock().pushed.last().copied()
    }

    /// Number of push calls, failed ones included
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.pushed.clear();
        state.attempts = 0;
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSink for RecordingSink {
    fn push_profile(&self, profile: ProfileId) -> Result<(), DspError> {
        let mut state = self.state.lock();
        state.attempts += 1;

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(DspError::NotReady);
        }
        if state.fail_profiles.contains(&profile) {
            return Err(DspError::Rejected(profile));
        }

        state.pushed.push(profile);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_records() {
        let sink = RecordingSink::new();
        sink.push_profile(ProfileId(1)).unwrap();
        sink.push_profile(ProfileId(4)).unwrap();
        assert_eq!(sink.pushed(), vec![ProfileId(1), ProfileId(4)]);
        assert_eq!(sink.last(), Some(ProfileId(4)));
        assert_eq!(sink.attempts(), 2);
    }

    #[test]
    fn test_recording_sink_fail_next() {
        let sink = RecordingSink::new();
        sink.fail_next(1);
        assert_eq!(sink.push_profile(ProfileId(2)), Err(DspError::NotReady));
        assert!(sink.push_profile(ProfileId(2)).is_ok());
        assert_eq!(sink.pushed(), vec![ProfileId(2)]);
        assert_eq!(sink.attempts(), 2);
    }

    #[test]
    fn test_recording_sink_fail_profile() {
        let sink = RecordingSink::new();
        sink.fail_profile(ProfileId(5));
        assert_eq!(
            sink.push_profile(ProfileId(5)),
            Err(DspError::Rejected(ProfileId(5)))
        );
        assert!(sink.push_profile(ProfileId(3)).is_ok());

        sink.clear_failures();
        assert!(sink.push_profile(ProfileId(5)).is_ok());
    }

    #[test]
    fn test_fan_out_pushes_in_order() {
        let left = Arc::new(RecordingSink::named("left"));
        let right = Arc::new(RecordingSink::named("right"));
        let fan = FanOutSink::new().with(left.clone()).with(right.clone());
        assert_eq!(fan.len(), 2);

        fan.push_profile(ProfileId(3)).unwrap();
        assert_eq!(left.pushed(), vec![ProfileId(3)]);
        assert_eq!(right.pushed(), vec![ProfileId(3)]);
    }

    #[test]
    fn test_fan_out_stops_at_first_failure() {
        let left = Arc::new(RecordingSink::named("left"));
        let right = Arc::new(RecordingSink::named("right"));
        let tail = Arc::new(RecordingSink::named("tail"));
        right.fail_next(1);

        let fan = FanOutSink::new()
            .with(left.clone())
            .with(right.clone())
            .with(tail.clone());

        assert_eq!(fan.push_profile(ProfileId(6)), Err(DspError::NotReady));
        assert_eq!(left.pushed(), vec![ProfileId(6)]);
        assert!(right.pushed().is_empty());
        assert_eq!(tail.attempts(), 0);
    }

    #[test]
    fn test_empty_fan_out_succeeds() {
        let fan = FanOutSink::default();
        assert!(fan.is_empty());
        assert!(fan.push_profile(ProfileId(0)).is_ok());
    }
}
