//! Error types for the amplifier stack

use thiserror::Error;

use crate::ProfileId;

/// Failure reported by the DSP / algorithm-parameter side when a profile
/// cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DspError {
    #[error("DSP not ready")]
    NotReady,

    #[error("profile {0} rejected by DSP")]
    Rejected(ProfileId),

    #[error("profile {0} not present in loaded parameters")]
    UnknownProfile(ProfileId),

    #[error("bus error: {0}")]
    Bus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsp_error_display() {
        assert_eq!(
            DspError::Rejected(ProfileId(3)).to_string(),
            "profile #3 rejected by DSP"
        );
        assert_eq!(DspError::NotReady.to_string(), "DSP not ready");
        assert_eq!(
            DspError::Bus("i2c nak".into()).to_string(),
            "bus error: i2c nak"
        );
    }
}
