//! Scene Table
//!
//! Fixed set of acoustic scenes, each bound to a DSP profile and a
//! priority (lower value = higher precedence).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ProfileId, SCENE_COUNT, SceneError, SceneResult};

/// Acoustic scene managed by the arbitrator.
///
/// The discriminant is the stable table index; iteration order everywhere
/// is ascending index, which is also the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SceneId {
    Calibration = 0,
    Bypass = 1,
    Handset = 2,
    Voice = 3,
    #[serde(rename = "voip")]
    VoIP = 4,
    DeepBuffer = 5,
    FastTrack = 6,
    /// Hearing-aid-compatible
    Hac = 7,
}

impl SceneId {
    /// All scenes in table order
    pub const ALL: [SceneId; SCENE_COUNT] = [
        SceneId::Calibration,
        SceneId::Bypass,
        SceneId::Handset,
        SceneId::Voice,
        SceneId::VoIP,
        SceneId::DeepBuffer,
        SceneId::FastTrack,
        SceneId::Hac,
    ];

    /// Table index
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Convert from table index
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable label (diagnostics and control names)
    pub fn name(self) -> &'static str {
        match self {
            SceneId::Calibration => "Calibration",
            SceneId::Bypass => "Bypass",
            SceneId::Handset => "Handset",
            SceneId::Voice => "Voice",
            SceneId::VoIP => "VoIP",
            SceneId::DeepBuffer => "DeepBuffer",
            SceneId::FastTrack => "FastTrack",
            SceneId::Hac => "HAC",
        }
    }
}

impl TryFrom<u32> for SceneId {
    type Error = SceneError;

    fn try_from(value: u32) -> SceneResult<Self> {
        usize::try_from(value)
            .ok()
            .and_then(Self::from_index)
            .ok_or(SceneError::InvalidSceneId(value))
    }
}

impl FromStr for SceneId {
    type Err = SceneError;

    /// Case-insensitive; `_`, `-` and spaces are ignored so
    /// `deep_buffer`, `Deep-Buffer` and `DeepBuffer` all match.
    fn from_str(s: &str) -> SceneResult<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Self::ALL
            .iter()
            .copied()
            .find(|scene| scene.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| SceneError::UnknownSceneName(s.to_string()))
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static attributes of one scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub id: SceneId,
    /// Profile pushed to the DSP when this scene wins arbitration
    pub dsp_profile: ProfileId,
    /// Lower value = higher precedence
    pub priority: u32,
}

impl SceneDescriptor {
    pub fn new(id: SceneId, dsp_profile: ProfileId, priority: u32) -> Self {
        Self {
            id,
            dsp_profile,
            priority,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// Fixed scene table, one descriptor per [`SceneId`], indexed by id.
///
/// Built once (from defaults or a [`crate::SceneConfig`]) and never resized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTable {
    descriptors: [SceneDescriptor; SCENE_COUNT],
}

impl SceneTable {
    /// Build a table from a per-scene closure returning `(profile, priority)`
    pub fn from_fn(mut f: impl FnMut(SceneId) -> (ProfileId, u32)) -> Self {
        let descriptors = SceneId::ALL.map(|id| {
            let (profile, priority) = f(id);
            SceneDescriptor::new(id, profile, priority)
        });
        Self { descriptors }
    }

    /// Default priority of a scene
    pub fn default_priority(id: SceneId) -> u32 {
        match id {
            SceneId::Calibration => 0,
            SceneId::Bypass => 1,
            SceneId::Hac => 2,
            SceneId::Handset => 3,
            SceneId::Voice => 4,
            SceneId::VoIP => 5,
            SceneId::DeepBuffer => 6,
            SceneId::FastTrack => 7,
        }
    }

    /// Default profile of a scene: one profile per scene, numbered by index
    pub fn default_profile(id: SceneId) -> ProfileId {
        ProfileId(id as u32)
    }

    #[inline]
    pub fn get(&self, id: SceneId) -> &SceneDescriptor {
        &self.descriptors[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: SceneId) -> &mut SceneDescriptor {
        &mut self.descriptors[id.index()]
    }

    /// Descriptors in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &SceneDescriptor> {
        self.descriptors.iter()
    }
}

impl Default for SceneTable {
    fn default() -> Self {
        Self::from_fn(|id| (Self::default_profile(id), Self::default_priority(id)))
    }
}

impl fmt::Display for SceneTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>2}  {:<12} {:>8}  {:>7}", "id", "scene", "priority", "profile")?;
        for desc in self.iter() {
            writeln!(
                f,
                "{:>2}  {:<12} {:>8}  {:>7}",
                desc.id.index(),
                desc.name(),
                desc.priority,
                desc.dsp_profile.to_string()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_index_roundtrip() {
        for (i, scene) in SceneId::ALL.iter().enumerate() {
            assert_eq!(scene.index(), i);
            assert_eq!(SceneId::from_index(i), Some(*scene));
        }
        assert_eq!(SceneId::from_index(SCENE_COUNT), None);
    }

    #[test]
    fn test_try_from_out_of_range() {
        assert_eq!(SceneId::try_from(3).unwrap(), SceneId::Voice);
        assert!(matches!(
            SceneId::try_from(8),
            Err(SceneError::InvalidSceneId(8))
        ));
        assert!(matches!(
            SceneId::try_from(u32::MAX),
            Err(SceneError::InvalidSceneId(u32::MAX))
        ));
    }

    #[test]
    fn test_parse_scene_names() {
        assert_eq!("voice".parse::<SceneId>().unwrap(), SceneId::Voice);
        assert_eq!("deep_buffer".parse::<SceneId>().unwrap(), SceneId::DeepBuffer);
        assert_eq!("Fast-Track".parse::<SceneId>().unwrap(), SceneId::FastTrack);
        assert_eq!("VOIP".parse::<SceneId>().unwrap(), SceneId::VoIP);
        assert_eq!("hac".parse::<SceneId>().unwrap(), SceneId::Hac);
        assert!(matches!(
            "karaoke".parse::<SceneId>(),
            Err(SceneError::UnknownSceneName(_))
        ));
    }

    #[test]
    fn test_default_table() {
        let table = SceneTable::default();
        assert_eq!(table.get(SceneId::Voice).priority, 4);
        assert_eq!(table.get(SceneId::DeepBuffer).priority, 6);
        assert_eq!(table.get(SceneId::Voice).dsp_profile, ProfileId(3));

        // Default priorities are unique so there are no ties out of the box
        let mut priorities: Vec<u32> = table.iter().map(|d| d.priority).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), SCENE_COUNT);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&SceneId::VoIP).unwrap(), "\"voip\"");
        assert_eq!(
            serde_json::from_str::<SceneId>("\"deep_buffer\"").unwrap(),
            SceneId::DeepBuffer
        );
    }

    #[test]
    fn test_table_display_lists_every_scene() {
        let text = SceneTable::default().to_string();
        for scene in SceneId::ALL {
            assert!(text.contains(scene.name()));
        }
    }
}
