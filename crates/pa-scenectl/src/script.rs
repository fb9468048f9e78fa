//! Transition script steps
//!
//! A step is `<scene>+` (activate), `<scene>-` (deactivate) or `resync`.
//! Scene names are matched like [`SceneId`]'s `FromStr`: `deep_buffer+`,
//! `Voice-`, `hac+`.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use pa_scene::{SceneArbitrator, SceneId, SceneResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Activate(SceneId),
    Deactivate(SceneId),
    Resync,
}

impl Step {
    pub fn apply(self, arbitrator: &SceneArbitrator) -> SceneResult<()> {
        match self {
            Step::Activate(scene) => arbitrator.activate(scene),
            Step::Deactivate(scene) => arbitrator.deactivate(scene),
            Step::Resync => arbitrator.resync(),
        }
    }
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("resync") {
            return Ok(Step::Resync);
        }

        if let Some(name) = s.strip_suffix('+') {
            Ok(Step::Activate(name.parse()?))
        } else if let Some(name) = s.strip_suffix('-') {
            Ok(Step::Deactivate(name.parse()?))
        } else {
            bail!("step '{}' must end in '+' or '-', or be 'resync'", s)
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Activate(scene) => write!(f, "{}+", scene),
            Step::Deactivate(scene) => write!(f, "{}-", scene),
            Step::Resync => f.write_str("resync"),
        }
    }
}

/// Parse all steps up front so a typo fails before anything runs
pub fn parse_steps(raw: &[String]) -> Result<Vec<Step>> {
    raw.iter().map(|s| s.parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!("voice+".parse::<Step>().unwrap(), Step::Activate(SceneId::Voice));
        assert_eq!(
            "deep_buffer-".parse::<Step>().unwrap(),
            Step::Deactivate(SceneId::DeepBuffer)
        );
        assert_eq!("Resync".parse::<Step>().unwrap(), Step::Resync);
    }

    #[test]
    fn test_parse_errors() {
        assert!("voice".parse::<Step>().is_err());
        assert!("karaoke+".parse::<Step>().is_err());
        assert!(parse_steps(&["voice+".into(), "bogus".into()]).is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for step in [Step::Activate(SceneId::VoIP), Step::Deactivate(SceneId::Hac), Step::Resync] {
            assert_eq!(step.to_string().parse::<Step>().unwrap(), step);
        }
    }
}
