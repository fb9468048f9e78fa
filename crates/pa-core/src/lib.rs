//! pa-core: Shared types for the smart power-amplifier codec stack
//!
//! Small vocabulary used by every other crate in the workspace: DSP profile
//! identifiers, amplifier channel placement and the DSP error type.

mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a DSP algorithm profile (one parameter set in the loaded
/// container, selected per acoustic scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

impl ProfileId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for ProfileId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Placement of one amplifier instance on the audio path.
///
/// A stereo configuration has a `Left` and a `Right` device; single-speaker
/// boards use `Mono`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AmpChannel {
    #[default]
    Mono = 0,
    Left = 1,
    Right = 2,
}

impl AmpChannel {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            AmpChannel::Mono => "Mono",
            AmpChannel::Left => "Left",
            AmpChannel::Right => "Right",
        }
    }

    /// Prefix prepended to control names so stereo instances don't collide.
    pub fn control_prefix(&self) -> &'static str {
        match self {
            AmpChannel::Mono => "",
            AmpChannel::Left => "Left ",
            AmpChannel::Right => "Right ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_id_display() {
        assert_eq!(ProfileId(7).to_string(), "#7");
        assert_eq!(ProfileId::from(2).as_u32(), 2);
    }

    #[test]
    fn test_profile_id_serde_transparent() {
        let json = serde_json::to_string(&ProfileId(5)).unwrap();
        assert_eq!(json, "5");
    }

    #[test]
    fn test_channel_prefix() {
        assert_eq!(AmpChannel::Mono.control_prefix(), "");
        assert_eq!(AmpChannel::Left.control_prefix(), "Left ");
        assert_eq!(AmpChannel::Right.display_name(), "Right");
    }
}
