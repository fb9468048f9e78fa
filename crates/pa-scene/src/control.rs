//! Control Surface
//!
//! Mixer-control style front end for one amplifier instance: a boolean
//! switch per scene that forwards writes to the shared arbitrator, plus
//! read-only profile controls for diagnostics.
//!
//! Several surfaces may share one arbitrator. In a stereo configuration the
//! left and right amplifiers each expose their own controls, but scene state
//! belongs to the logical audio path, so both drive the same
//! `Arc<SceneArbitrator>`.

use std::sync::Arc;

use crate::arbitrator::SceneArbitrator;
use crate::config::PushFailurePolicy;
use crate::scene::SceneId;
use crate::{AmpChannel, ProfileId, SceneError, SceneResult};

/// Integer value of a mixer control. Switches read 0/1 and treat any
/// non-zero write as "on"; profile controls read `-1` for "none".
pub type ControlValue = i64;

/// Name of the read-only control reporting the arbitration winner's profile
pub const ACTIVE_PROFILE_CONTROL: &str = "Active Profile";

/// Name of the read-only control reporting the profile the DSP accepted
pub const APPLIED_PROFILE_CONTROL: &str = "Applied Profile";

fn profile_value(profile: Option<ProfileId>) -> ControlValue {
    profile.map_or(-1, |p| ControlValue::from(p.as_u32()))
}

/// Per-scene switch control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSwitch {
    pub scene: SceneId,
    pub name: String,
}

impl SceneSwitch {
    fn new(scene: SceneId, prefix: &str) -> Self {
        Self {
            scene,
            name: format!("{}{} Scene Switch", prefix, scene.name()),
        }
    }
}

/// Controls exposed by one amplifier instance
pub struct ControlSurface {
    channel: AmpChannel,
    arbitrator: Arc<SceneArbitrator>,
    policy: PushFailurePolicy,
    switches: Vec<SceneSwitch>,
    active_profile_name: String,
    applied_profile_name: String,
}

impl ControlSurface {
    pub fn new(
        channel: AmpChannel,
        arbitrator: Arc<SceneArbitrator>,
        policy: PushFailurePolicy,
    ) -> Self {
        let prefix = channel.control_prefix();
        Self {
            channel,
            arbitrator,
            policy,
            switches: SceneId::ALL
                .iter()
                .map(|scene| SceneSwitch::new(*scene, prefix))
                .collect(),
            active_profile_name: format!("{}{}", prefix, ACTIVE_PROFILE_CONTROL),
            applied_profile_name: format!("{}{}", prefix, APPLIED_PROFILE_CONTROL),
        }
    }

    pub fn channel(&self) -> AmpChannel {
        self.channel
    }

    pub fn arbitrator(&self) -> &Arc<SceneArbitrator> {
        &self.arbitrator
    }

    pub fn switches(&self) -> &[SceneSwitch] {
        &self.switches
    }

    /// Every control name this surface answers to
    pub fn control_names(&self) -> Vec<&str> {
        self.switches
            .iter()
            .map(|s| s.name.as_str())
            .chain([
                self.active_profile_name.as_str(),
                self.applied_profile_name.as_str(),
            ])
            .collect()
    }

    fn find_switch(&self, name: &str) -> Option<&SceneSwitch> {
        self.switches.iter().find(|s| s.name == name)
    }

    fn is_read_only(&self, name: &str) -> bool {
        name == self.active_profile_name || name == self.applied_profile_name
    }

    /// Write a control.
    ///
    /// Scene switches forward to activate/deactivate. A failed DSP push is
    /// handled per [`PushFailurePolicy`]; the scene count has changed either
    /// way.
    pub fn put(&self, name: &str, value: ControlValue) -> SceneResult<()> {
        let Some(switch) = self.find_switch(name) else {
            if self.is_read_only(name) {
                return Err(SceneError::ReadOnlyControl(name.to_string()));
            }
            return Err(SceneError::UnknownControl(name.to_string()));
        };

        let result = if value != 0 {
            self.arbitrator.activate(switch.scene)
        } else {
            self.arbitrator.deactivate(switch.scene)
        };

        match result {
            Err(e) if e.is_push_failure() && self.policy == PushFailurePolicy::LogDesync => {
                log::warn!(
                    "{}: '{}' = {} accepted but DSP is out of sync ({})",
                    self.channel.display_name(),
                    name,
                    value,
                    e
                );
                Ok(())
            }
            other => other,
        }
    }

    /// Read a control
    pub fn get(&self, name: &str) -> SceneResult<ControlValue> {
        if let Some(switch) = self.find_switch(name) {
            return Ok(ControlValue::from(self.arbitrator.is_active(switch.scene)));
        }
        if name == self.active_profile_name {
            return Ok(profile_value(self.arbitrator.get_active_profile()));
        }
        if name == self.applied_profile_name {
            return Ok(profile_value(self.arbitrator.applied_profile()));
        }
        Err(SceneError::UnknownControl(name.to_string()))
    }

    /// Write the switch of `scene` directly
    pub fn set_scene(&self, scene: SceneId, on: bool) -> SceneResult<()> {
        let name = self.switches[scene.index()].name.clone();
        self.put(&name, ControlValue::from(on))
    }
}
