//! Scene Arbitrator
//!
//! Ref-counts scene activations and keeps the DSP on the profile of the
//! highest-precedence active scene.
//!
//! ## Locking
//!
//! All mutable state sits behind one `parking_lot::Mutex`. The DSP push is
//! made with the lock held, so a slow DSP serializes every transition behind
//! it, and the order of pushes seen by the sink always matches the order in
//! which transitions took the lock.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::SceneConfig;
use crate::diagnostics::{ArbitratorSnapshot, SceneStatus};
use crate::scene::{SceneDescriptor, SceneId, SceneTable};
use crate::sink::ProfileSink;
use crate::{ProfileId, SCENE_COUNT, SceneError, SceneResult};

/// Mutable arbitration state
#[derive(Debug, Default)]
struct ArbiterState {
    /// Activation ref-count per scene, indexed by `SceneId::index()`
    counts: [u32; SCENE_COUNT],
    /// Last profile the sink accepted; `None` until the first push succeeds
    applied: Option<ProfileId>,
    /// A push failed since the last successful one. The DSP may hold a
    /// partly applied profile, so the next winner is pushed even when it
    /// matches `applied`.
    dirty: bool,
}

impl ArbiterState {
    #[inline]
    fn is_active(&self, scene: SceneId) -> bool {
        self.counts[scene.index()] > 0
    }
}

/// Scene arbitrator owned by one logical audio path.
///
/// Share it between control handlers with `Arc<SceneArbitrator>`; all
/// operations take `&self`.
pub struct SceneArbitrator {
    table: SceneTable,
    sink: Arc<dyn ProfileSink>,
    state: Mutex<ArbiterState>,
}

impl SceneArbitrator {
    /// Create an arbitrator over a fixed scene table
    pub fn new(table: SceneTable, sink: Arc<dyn ProfileSink>) -> Self {
        log::debug!("Scene arbitrator created (sink: {})", sink.name());
        Self {
            table,
            sink,
            state: Mutex::new(ArbiterState::default()),
        }
    }

    /// Create an arbitrator from a validated configuration
    pub fn from_config(config: &SceneConfig, sink: Arc<dyn ProfileSink>) -> SceneResult<Self> {
        Ok(Self::new(config.build_table()?, sink))
    }

    pub fn table(&self) -> &SceneTable {
        &self.table
    }

    pub fn descriptor(&self, scene: SceneId) -> &SceneDescriptor {
        self.table.get(scene)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Register one more user of `scene` and re-evaluate the DSP profile.
    ///
    /// On `ProfilePushFailed` the count has still been incremented. A count
    /// already at `u32::MAX` is rejected with `ActivationOverflow` and left
    /// unchanged.
    pub fn activate(&self, scene: SceneId) -> SceneResult<()> {
        let mut state = self.state.lock();
        let count = &mut state.counts[scene.index()];
        let Some(next) = count.checked_add(1) else {
            log::error!("Scene {} activation count overflow, rejected", scene);
            return Err(SceneError::ActivationOverflow(scene));
        };
        *count = next;
        log::debug!("Scene {} activated (count {})", scene, next);

        self.reevaluate(&mut state)
    }

    /// Release one user of `scene` and re-evaluate the DSP profile.
    ///
    /// Deactivating an inactive scene leaves its count at zero.
    pub fn deactivate(&self, scene: SceneId) -> SceneResult<()> {
        let mut state = self.state.lock();
        let count = &mut state.counts[scene.index()];
        if *count == 0 {
            log::debug!("Scene {} deactivated while inactive", scene);
        } else {
            *count -= 1;
            log::debug!("Scene {} deactivated (count {})", scene, *count);
        }

        self.reevaluate(&mut state)
    }

    /// [`Self::activate`] with a raw table index from a control handler
    pub fn activate_index(&self, index: u32) -> SceneResult<()> {
        self.activate(SceneId::try_from(index)?)
    }

    /// [`Self::deactivate`] with a raw table index from a control handler
    pub fn deactivate_index(&self, index: u32) -> SceneResult<()> {
        self.deactivate(SceneId::try_from(index)?)
    }

    /// Re-run arbitration without touching any count.
    ///
    /// This is the explicit retry after a failed push: nothing is retried
    /// automatically.
    pub fn resync(&self) -> SceneResult<()> {
        let mut state = self.state.lock();
        self.reevaluate(&mut state)
    }

    /// Device teardown: drop every activation and forget the applied
    /// profile. Nothing is pushed.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = ArbiterState::default();
        log::info!("Scene arbitrator reset");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Profile of the winning scene, `None` when no scene is active.
    ///
    /// This is the arbitration result, which can differ from
    /// [`Self::applied_profile`] after a failed push.
    pub fn get_active_profile(&self) -> Option<ProfileId> {
        let state = self.state.lock();
        self.select_winner(&state)
            .map(|scene| self.table.get(scene).dsp_profile)
    }

    /// Winning scene, `None` when no scene is active
    pub fn winner(&self) -> Option<SceneId> {
        let state = self.state.lock();
        self.select_winner(&state)
    }

    /// Last profile the DSP accepted
    pub fn applied_profile(&self) -> Option<ProfileId> {
        self.state.lock().applied
    }

    pub fn active_count(&self, scene: SceneId) -> u32 {
        self.state.lock().counts[scene.index()]
    }

    pub fn is_active(&self, scene: SceneId) -> bool {
        self.state.lock().is_active(scene)
    }

    /// False while the winner's profile has not reached the DSP, or while a
    /// failed push has not been followed by a successful one
    pub fn is_in_sync(&self) -> bool {
        let state = self.state.lock();
        self.in_sync(&state)
    }

    /// Consistent copy of the whole state for diagnostics
    pub fn snapshot(&self) -> ArbitratorSnapshot {
        let state = self.state.lock();
        let winner = self.select_winner(&state);

        ArbitratorSnapshot {
            scenes: self
                .table
                .iter()
                .map(|desc| SceneStatus {
                    id: desc.id,
                    name: desc.name().to_string(),
                    priority: desc.priority,
                    dsp_profile: desc.dsp_profile,
                    active_count: state.counts[desc.id.index()],
                    is_active: state.is_active(desc.id),
                })
                .collect(),
            winner,
            active_profile: winner.map(|scene| self.table.get(scene).dsp_profile),
            applied_profile: state.applied,
            in_sync: self.in_sync(&state),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Arbitration
    // ─────────────────────────────────────────────────────────────────────────

    /// Active scene with the lowest priority value; the first one in id
    /// order wins ties.
    fn select_winner(&self, state: &ArbiterState) -> Option<SceneId> {
        let mut best: Option<&SceneDescriptor> = None;
        for desc in self.table.iter() {
            if !state.is_active(desc.id) {
                continue;
            }
            if best.is_none_or(|b| desc.priority < b.priority) {
                best = Some(desc);
            }
        }
        best.map(|desc| desc.id)
    }

    fn in_sync(&self, state: &ArbiterState) -> bool {
        if state.dirty {
            return false;
        }
        match self.select_winner(state) {
            Some(scene) => state.applied == Some(self.table.get(scene).dsp_profile),
            None => true,
        }
    }

    fn reevaluate(&self, state: &mut ArbiterState) -> SceneResult<()> {
        let Some(winner) = self.select_winner(state) else {
            // No managed scene active: the current DSP profile stays as is.
            log::trace!("No active scene, DSP profile left unchanged");
            return Ok(());
        };

        let profile = self.table.get(winner).dsp_profile;
        if state.applied == Some(profile) && !state.dirty {
            return Ok(());
        }

        match self.sink.push_profile(profile) {
            Ok(()) => {
                log::info!(
                    "DSP profile {} -> {} (scene {})",
                    state
                        .applied
                        .map_or_else(|| "none".to_string(), |p| p.to_string()),
                    profile,
                    winner
                );
                state.applied = Some(profile);
                state.dirty = false;
                Ok(())
            }
            Err(source) => {
                log::error!(
                    "{}: failed to apply profile {} for scene {}: {}",
                    self.sink.name(),
                    profile,
                    winner,
                    source
                );
                state.dirty = true;
                Err(SceneError::ProfilePushFailed { profile, source })
            }
        }
    }
}
