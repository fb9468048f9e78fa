//! Scene Configuration
//!
//! JSON description of the scene table: per-scene priority and DSP profile
//! overrides on top of the built-in defaults, plus how the control surface
//! reacts to DSP push failures.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "scenes": [
//!     { "scene": "voice", "priority": 1, "dsp_profile": 12 },
//!     { "scene": "hac", "dsp_profile": 12 }
//!   ],
//!   "push_failure_policy": "reject"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::scene::{SceneId, SceneTable};
use crate::{ProfileId, SCENE_COUNT, SceneError, SceneResult};

/// Config format version
pub const CONFIG_VERSION: &str = "1.0";

/// What a control write does when the DSP push behind it fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushFailurePolicy {
    /// Accept the write (the scene count did change) and log the desync
    #[default]
    LogDesync,
    /// Return the push error to the writer
    Reject,
}

/// Override for one scene; unset fields keep the default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneOverride {
    pub scene: SceneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsp_profile: Option<ProfileId>,
}

/// Scene arbitration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Config format version
    pub version: String,
    /// Per-scene overrides, at most one per scene
    pub scenes: Vec<SceneOverride>,
    /// Control surface behaviour on DSP push failure
    pub push_failure_policy: PushFailurePolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            scenes: Vec::new(),
            push_failure_policy: PushFailurePolicy::default(),
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override (builder style)
    pub fn with_override(
        mut self,
        scene: SceneId,
        priority: Option<u32>,
        dsp_profile: Option<ProfileId>,
    ) -> Self {
        self.scenes.push(SceneOverride {
            scene,
            priority,
            dsp_profile,
        });
        self
    }

    pub fn with_policy(mut self, policy: PushFailurePolicy) -> Self {
        self.push_failure_policy = policy;
        self
    }

    /// Parse and validate a config from JSON
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;

        if let Some(version) = raw.get("version") {
            match version.as_str() {
                Some(CONFIG_VERSION) => {}
                _ => {
                    return Err(SceneError::Config(format!(
                        "Unsupported config version: {}",
                        version
                    )));
                }
            }
        }

        let config: Self = serde_json::from_value(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded scene config {:?} ({} overrides)",
            path,
            config.scenes.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SceneResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Reject duplicate scene entries
    pub fn validate(&self) -> SceneResult<()> {
        let mut seen = [false; SCENE_COUNT];
        for entry in &self.scenes {
            let slot = &mut seen[entry.scene.index()];
            if *slot {
                return Err(SceneError::Config(format!(
                    "Scene {} configured more than once",
                    entry.scene
                )));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Resolve defaults plus overrides into the fixed table
    pub fn build_table(&self) -> SceneResult<SceneTable> {
        self.validate()?;

        let mut table = SceneTable::default();
        for entry in &self.scenes {
            let desc = table.get_mut(entry.scene);
            if let Some(priority) = entry.priority {
                desc.priority = priority;
            }
            if let Some(profile) = entry.dsp_profile {
                desc.dsp_profile = profile;
            }
        }
        Ok(table)
    }
}
