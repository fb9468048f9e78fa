//! Dry-run replay of a transition script
//!
//! Runs parsed [`Step`]s against an arbitrator backed by a [`RecordingSink`]
//! and collects what happened, so `run` only has to print it.

use std::fmt::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use pa_scene::{ArbitratorSnapshot, ProfileId, RecordingSink, SceneArbitrator, SceneConfig};

use crate::script::Step;

/// Failures to script on the dry-run DSP
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// Profiles the DSP rejects for the whole run
    pub profiles: Vec<ProfileId>,
    /// Number of pushes to fail from the start
    pub next: usize,
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    /// Arbitration result after the step
    pub active: Option<ProfileId>,
    /// Profile the DSP held after the step
    pub applied: Option<ProfileId>,
    /// Push failure message; the replay carries on after it
    pub desync: Option<String>,
}

/// Everything a replay produced
#[derive(Debug, Clone)]
pub struct Replay {
    pub outcomes: Vec<StepOutcome>,
    pub snapshot: ArbitratorSnapshot,
    /// Profiles the DSP accepted, oldest first
    pub pushed: Vec<ProfileId>,
    /// Push calls, failed ones included
    pub attempts: usize,
}

impl Replay {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.desync.is_some()).count()
    }

    /// Text report: one line per step, the final table and the push list.
    /// With `json` only the final snapshot is printed, as JSON.
    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            return Ok(self.snapshot.to_json()?);
        }

        let mut out = String::new();
        for (i, o) in self.outcomes.iter().enumerate() {
            writeln!(
                out,
                "[{:>3}] {:<16} active {:<5} applied {:<5} {}",
                i + 1,
                o.step.to_string(),
                fmt_profile(o.active),
                fmt_profile(o.applied),
                o.desync
                    .as_deref()
                    .map_or_else(|| "ok".to_string(), |e| format!("DSP desync: {}", e))
            )?;
        }

        let pushed: Vec<String> = self.pushed.iter().map(|p| p.to_string()).collect();
        writeln!(out)?;
        writeln!(out, "{}", self.snapshot)?;
        writeln!(
            out,
            "pushed: [{}]  ({} attempts, {} failed)",
            pushed.join(", "),
            self.attempts,
            self.failures()
        )?;
        Ok(out)
    }
}

/// Replay `steps` from idle. Push failures are recorded and the replay
/// continues; any other error stops it.
pub fn replay(config: &SceneConfig, steps: &[Step], failures: &FailurePlan) -> Result<Replay> {
    let sink = Arc::new(RecordingSink::new());
    for profile in &failures.profiles {
        sink.fail_profile(*profile);
    }
    sink.fail_next(failures.next);

    let arbitrator =
        SceneArbitrator::from_config(config, sink.clone()).context("Invalid scene table")?;
    log::debug!("Replaying {} steps", steps.len());

    let mut outcomes = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let desync = match step.apply(&arbitrator) {
            Ok(()) => None,
            Err(e) if e.is_push_failure() => Some(e.to_string()),
            Err(e) => return Err(e).with_context(|| format!("step {} ({})", i + 1, step)),
        };
        outcomes.push(StepOutcome {
            step: *step,
            active: arbitrator.get_active_profile(),
            applied: arbitrator.applied_profile(),
            desync,
        });
    }

    Ok(Replay {
        outcomes,
        snapshot: arbitrator.snapshot(),
        pushed: sink.pushed(),
        attempts: sink.attempts(),
    })
}

fn fmt_profile(profile: Option<ProfileId>) -> String {
    profile.map_or_else(|| "-".to_string(), |p| p.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_steps;
    use pa_scene::SceneId;

    fn steps(raw: &[&str]) -> Vec<Step> {
        let raw: Vec<String> = raw.iter().map(|s| s.to_string()).collect();
        parse_steps(&raw).unwrap()
    }

    #[test]
    fn test_clean_run() {
        let run = replay(
            &SceneConfig::default(),
            &steps(&["deep_buffer+", "voice+", "voice-"]),
            &FailurePlan::default(),
        )
        .unwrap();

        assert_eq!(run.outcomes.len(), 3);
        assert!(run.outcomes.iter().all(|o| o.desync.is_none()));
        assert_eq!(run.pushed, vec![ProfileId(5), ProfileId(3), ProfileId(5)]);
        assert_eq!(run.attempts, 3);
        assert_eq!(run.snapshot.winner, Some(SceneId::DeepBuffer));
        assert!(run.snapshot.in_sync);
    }

    #[test]
    fn test_rejected_profile_keeps_going() {
        let plan = FailurePlan {
            profiles: vec![ProfileId(3)],
            next: 0,
        };
        let run = replay(
            &SceneConfig::default(),
            &steps(&["deep_buffer+", "voice+", "hac+", "hac-", "voice-"]),
            &plan,
        )
        .unwrap();

        assert_eq!(run.outcomes.len(), 5);
        let voice = &run.outcomes[1];
        assert!(voice.desync.as_deref().is_some_and(|e| e.contains("#3")));
        assert_eq!(voice.active, Some(ProfileId(3)));
        assert_eq!(voice.applied, Some(ProfileId(5)));

        // hac+ succeeds, hac- falls back to the rejected voice profile again
        assert_eq!(run.outcomes[2].applied, Some(ProfileId(7)));
        assert!(run.outcomes[2].desync.is_none());
        assert!(run.outcomes[3].desync.is_some());
        assert!(run.outcomes[4].desync.is_none());

        assert_eq!(run.failures(), 2);
        assert_eq!(run.pushed, vec![ProfileId(5), ProfileId(7), ProfileId(5)]);
        assert!(run.snapshot.in_sync);
    }

    #[test]
    fn test_fail_next_then_resync() {
        let plan = FailurePlan {
            profiles: Vec::new(),
            next: 1,
        };
        let run = replay(&SceneConfig::default(), &steps(&["bypass+", "resync"]), &plan).unwrap();

        assert!(run.outcomes[0].desync.is_some());
        assert_eq!(run.outcomes[0].applied, None);
        assert!(run.outcomes[1].desync.is_none());
        assert_eq!(run.outcomes[1].applied, Some(ProfileId(1)));
        assert_eq!(run.pushed, vec![ProfileId(1)]);
        assert_eq!(run.attempts, 2);
    }

    #[test]
    fn test_unresolved_desync_shows_in_report() {
        let plan = FailurePlan {
            profiles: Vec::new(),
            next: 1,
        };
        let run = replay(&SceneConfig::default(), &steps(&["voice+"]), &plan).unwrap();
        assert!(!run.snapshot.in_sync);

        let text = run.render(false).unwrap();
        assert!(text.contains("DSP desync"));
        assert!(text.contains("(DSP out of sync)"));
        assert!(text.contains("pushed: []  (1 attempts, 1 failed)"));
    }

    #[test]
    fn test_invalid_step_stops_before_replay() {
        let raw: Vec<String> = ["voice+", "karaoke+"].iter().map(|s| s.to_string()).collect();
        let err = parse_steps(&raw).unwrap_err();
        assert!(err.to_string().contains("karaoke"));
    }

    #[test]
    fn test_invalid_table_is_fatal() {
        let config = SceneConfig::default()
            .with_override(SceneId::Voice, Some(1), None)
            .with_override(SceneId::Voice, None, Some(ProfileId(9)));
        let err = replay(&config, &steps(&["voice+"]), &FailurePlan::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid scene table"));
    }

    #[test]
    fn test_json_report() {
        let run = replay(
            &SceneConfig::default(),
            &steps(&["handset+", "calibration+"]),
            &FailurePlan::default(),
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&run.render(true).unwrap()).unwrap();
        assert_eq!(json["winner"], "calibration");
        assert_eq!(json["active_profile"], 0);
        assert_eq!(json["applied_profile"], 0);
        assert_eq!(json["in_sync"], true);
        assert_eq!(json["scenes"].as_array().map(Vec::len), Some(8));
        assert_eq!(json["scenes"][2]["active_count"], 1);
    }
}
