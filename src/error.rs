use thiserror::Error;

/// Configuration rejected at construction time, before any search happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("the environment must expose at least one action")]
    EmptyActionSpace,

    #[error("max_episode_steps must be positive")]
    ZeroEpisodeSteps,

    #[error("max_depth must be positive")]
    ZeroMaxDepth,

    #[error("gambler_percent must lie in [0, 1], got {0}")]
    GamblerPercentOutOfRange(f64),

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("frame skip must be positive")]
    ZeroFrameSkip,

    #[error("time limit must be positive")]
    ZeroTimeLimit,

    #[error("timestep_limit must be positive")]
    ZeroTimestepLimit,
}

/// Checks that a tunable is a finite, non-negative number.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}
