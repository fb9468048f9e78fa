//! # Scene Arbitration
//!
//! Picks the single DSP algorithm profile a smart power amplifier should run
//! while several acoustic scenes (calibration, bypass, handset, voice, VoIP,
//! deep-buffer, fast-track, hearing-aid-compatible) may be active at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                    SCENE ARBITRATION                            │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   Control surface                   SceneArbitrator             │
//! │   ┌──────────────────────┐         ┌──────────────────────┐    │
//! │   │ "Voice Scene Switch" │──put───▶│ ref-counted scenes    │    │
//! │   │ "Bypass Scene Switch"│         │ (one Mutex)           │    │
//! │   │ "Active Profile" (ro)│◀──get───│ re-evaluate winner    │    │
//! │   └──────────────────────┘         └──────────┬───────────┘    │
//! │                                               │ push_profile   │
//! │                                    ┌──────────▼───────────┐    │
//! │                                    │ ProfileSink (DSP)     │    │
//! │                                    └──────────────────────┘    │
//! │                                                                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The winner is the active scene with the numerically lowest priority,
//! lowest id on ties. A profile is pushed only when the winner's profile
//! differs from the one last applied; nothing is pushed when no scene is
//! active.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pa_scene::{RecordingSink, SceneArbitrator, SceneId, SceneTable};
//!
//! let sink = Arc::new(RecordingSink::new());
//! let arbitrator = SceneArbitrator::new(SceneTable::default(), sink.clone());
//!
//! arbitrator.activate(SceneId::DeepBuffer)?;
//! arbitrator.activate(SceneId::Voice)?; // voice wins, its profile is pushed
//! arbitrator.deactivate(SceneId::Voice)?; // back to deep-buffer
//! ```

pub mod arbitrator;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod scene;
pub mod sink;

pub use arbitrator::SceneArbitrator;
pub use config::{PushFailurePolicy, SceneConfig, SceneOverride, CONFIG_VERSION};
pub use control::{
    ACTIVE_PROFILE_CONTROL, APPLIED_PROFILE_CONTROL, ControlSurface, ControlValue, SceneSwitch,
};
pub use diagnostics::{ArbitratorSnapshot, SceneStatus};
pub use scene::{SceneDescriptor, SceneId, SceneTable};
pub use sink::{FanOutSink, ProfileSink, RecordingSink};

pub use pa_core::{AmpChannel, DspError, ProfileId};

use thiserror::Error;

/// Scene arbitration error types
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Invalid scene id: {0}")]
    InvalidSceneId(u32),

    #[error("Activation count overflow for scene {0}")]
    ActivationOverflow(SceneId),

    #[error("Unknown scene name: {0}")]
    UnknownSceneName(String),

    #[error("Failed to push profile {profile} to DSP: {source}")]
    ProfilePushFailed {
        profile: ProfileId,
        #[source]
        source: DspError,
    },

    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Control is read-only: {0}")]
    ReadOnlyControl(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Push failures leave the scene counts updated; everything else is
    /// rejected before any state changes.
    pub fn is_push_failure(&self) -> bool {
        matches!(self, SceneError::ProfilePushFailed { .. })
    }
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Number of managed scenes (fixed table size)
pub const SCENE_COUNT: usize = 8;
