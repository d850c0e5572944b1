//! Module defining the environment capability consumed by the search.

use std::path::Path;

/// Result of advancing an environment by one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<O, I>{
    /// Observation after the step.
    pub observation: O,
    /// Reward collected during the step.
    pub reward: f64,
    /// `true` when the environment reached a terminal state.
    pub done: bool,
    /// Environment specific diagnostic data.
    pub info: I,
}

/// Trait defining the interface for a deterministic environment that can be searched.
///
/// The search never snapshots environment state. It relies on the environment
/// being a pure function of its initial state and the actions fed to it: after
/// `reset`, the same action prefix must always yield the same rewards, the same
/// `done` flags and the same observations.
///
/// # Type Parameters
/// - `N`: The number of discrete actions. Legal actions are `0..N`,
///        fixed at compile time.
pub trait Environment<const N: usize>{
    /// Observation returned by `reset` and `step`.
    type Observation;

    /// Diagnostic data returned alongside each step.
    type Info;

    /// Fault raised by the underlying emulator. The search never recovers
    /// from it; it is handed back to the caller unchanged.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Restores the canonical initial state.
    ///
    /// Must be deterministic given a fixed configuration.
    fn reset(&mut self) -> Result<Self::Observation, Self::Error>;

    /// Advances the environment by one step with the given action.
    ///
    /// # Parameters
    /// - `action`: The index of the action to play, in `0..N`.
    fn step(&mut self, action: usize) -> Result<Step<Self::Observation, Self::Info>, Self::Error>;

    /// Side-effecting visualization hook, irrelevant to correctness.
    fn render(&mut self){}
}

/// Environments able to persist a replayed trajectory to a movie file.
///
/// Between `start_recording` and `stop_recording` every `reset`/`step` call is
/// captured by the environment.
pub trait Recorder<const N: usize>: Environment<N>{
    /// Starts capturing input to the file at `path`.
    fn start_recording(&mut self, path: &Path) -> Result<(), Self::Error>;

    /// Stops capturing and flushes the movie file.
    fn stop_recording(&mut self) -> Result<(), Self::Error>;
}

/// Replays `actions` from the initial state while recording them to `path`.
///
/// Recording is stopped even when a step fails; the step error wins over any
/// error from stopping.
pub fn record_trajectory<E, const N: usize>(env: &mut E, actions: &[usize], path: &Path) -> Result<(), E::Error>
where
    E: Recorder<N>,
{
    env.start_recording(path)?;

    let replay = (|| -> Result<(), E::Error> {
        env.reset()?;
        for &action in actions {
            env.step(action)?;
        }
        Ok(())
    })();

    let stop = env.stop_recording();
    replay.and(stop)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::test_utils::{EnvFault, RecordingEnv, RewardTableEnv};

    #[test]
    fn test_record_trajectory() -> Result<(), EnvFault>{
        let mut env = RecordingEnv::new(RewardTableEnv::<2>::new(vec![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]));

        record_trajectory(&mut env, &[0, 1, 1], Path::new("best.bk2"))?;

        assert_eq!(env.movies, vec![(PathBuf::from("best.bk2"), vec![0, 1, 1])]);
        assert!(!env.is_recording());
        Ok(())
    }

    #[test]
    fn test_record_trajectory_stops_on_fault(){
        let mut env = RecordingEnv::new(RewardTableEnv::<2>::new(vec![[0.0, 0.0]]).failing_at(1));

        let result = record_trajectory(&mut env, &[0, 0, 0], Path::new("broken.bk2"));

        assert!(result.is_err());
        assert!(!env.is_recording());
    }
}
