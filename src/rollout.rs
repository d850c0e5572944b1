//! Deterministic replay of a candidate action sequence.

use crate::Environment;

/// Outcome of one rollout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rollout{
    /// Number of actions actually executed, at most the input length.
    pub steps: usize,
    /// Reward accumulated over the executed steps.
    pub total_reward: f64,
}

/// Replays `actions` from the environment's initial state.
///
/// Resets the environment, then steps through `actions` in order, summing
/// reward, and stops the first time the environment reports termination.
/// The rollout holds exclusive access to the environment for its whole
/// duration and never touches the search tree.
///
/// For a deterministic environment, two calls with the same `actions` return
/// the same result; the search relies on this since it never snapshots state.
///
/// # Parameters
/// - `env`: The environment to drive.
/// - `actions`: The candidate sequence, usually longer than the episode.
/// - `render`: Calls `Environment::render` before every step when `true`.
///
/// # Returns
/// The executed step count and total reward, or the first environment fault.
pub fn rollout<E, const N: usize>(env: &mut E, actions: &[usize], render: bool) -> Result<Rollout, E::Error>
where
    E: Environment<N> + ?Sized,
{
    env.reset()?;

    let mut result = Rollout { steps: 0, total_reward: 0.0 };
    for &action in actions{
        if render{
            env.render();
        }

        let step = env.step(action)?;
        result.steps += 1;
        result.total_reward += step.reward;

        if step.done{
            break;
        }
    }

    Ok(result)
}
