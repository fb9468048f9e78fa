//! Diagnostics snapshot of the arbitrator state

use serde::Serialize;
use std::fmt;

use crate::ProfileId;
use crate::scene::SceneId;

/// One scene row in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneStatus {
    pub id: SceneId,
    pub name: String,
    pub priority: u32,
    pub dsp_profile: ProfileId,
    pub active_count: u32,
    pub is_active: bool,
}

/// State of an arbitrator taken under a single lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbitratorSnapshot {
    /// All scenes in id order
    pub scenes: Vec<SceneStatus>,
    /// Winning scene, if any is active
    pub winner: Option<SceneId>,
    /// Profile arbitration selected
    pub active_profile: Option<ProfileId>,
    /// Profile the DSP last accepted
    pub applied_profile: Option<ProfileId>,
    /// `active_profile` has reached the DSP (or nothing is active)
    pub in_sync: bool,
}

impl ArbitratorSnapshot {
    /// Scenes with a non-zero count
    pub fn active_scenes(&self) -> impl Iterator<Item = &SceneStatus> {
        self.scenes.iter().filter(|s| s.is_active)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn fmt_profile(profile: Option<ProfileId>) -> String {
    profile.map_or_else(|| "-".to_string(), |p| p.to_string())
}

impl fmt::Display for ArbitratorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>2}  {:<12} {:>8}  {:>7}  {:>5}",
            "id", "scene", "priority", "profile", "count"
        )?;
        for s in &self.scenes {
            let marker = if Some(s.id) == self.winner { '*' } else { ' ' };
            writeln!(
                f,
                "{:>2}{} {:<12} {:>8}  {:>7}  {:>5}",
                s.id.index(),
                marker,
                s.name,
                s.priority,
                s.dsp_profile.to_string(),
                s.active_count
            )?;
        }
        write!(
            f,
            "active {}  applied {}{}",
            fmt_profile(self.active_profile),
            fmt_profile(self.applied_profile),
            if self.in_sync { "" } else { "  (DSP out of sync)" }
        )
    }
}
