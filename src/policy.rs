//! Per-episode action selection.
//!
//! A candidate episode is produced by walking a cursor down the search tree.
//! While the cursor is inside explored territory, a [`SelectionPolicy`] picks
//! each action. As soon as an action has no child, the cursor falls off the
//! tree and every remaining action is uniformly random; the walk never
//! re-enters the tree.

use log::trace;
use rand::{rngs::StdRng, Rng};

use crate::{error::non_negative, utils::choose_uniform, ConfigError, NodeId, SearchTree};

/// Default scale of the visit-decayed exploration probability.
pub const EXPLORATION_PARAM: f64 = 0.005;

/// Chooses the action to play at an explored node.
///
/// This is the seam where alternative value estimators plug in. Policies
/// only read the tree; the walk and the fall-off rule are shared.
///
/// # Type Parameters
/// - `N`: The number of discrete actions.
pub trait SelectionPolicy<const N: usize>{
    /// Picks an action in `0..N` for the cursor `node`.
    fn choose(&self, tree: &SearchTree<N>, node: NodeId, rng: &mut StdRng) -> usize;
}

/// Samples a uniformly random legal action from the action space `0..N`.
#[inline]
pub fn sample_action<const N: usize>(rng: &mut StdRng) -> usize{
    rng.random_range(0..N)
}

/// Exploration probability at a node visited `visits` times.
///
/// `exploration_param / ln(visits + 2)`, so well-explored nodes become more
/// exploitative.
#[inline]
pub fn epsilon(exploration_param: f64, visits: u64) -> f64{
    exploration_param / ((visits + 2) as f64).ln()
}

/// Epsilon draw shared by the tree policies.
///
/// # Returns
/// `Some(action)` when the draw explores, `None` when the caller should exploit.
#[inline]
pub(crate) fn explore<const N: usize>(exploration_param: f64, visits: u64, rng: &mut StdRng) -> Option<usize>{
    if rng.random::<f64>() < epsilon(exploration_param, visits){
        let action = sample_action::<N>(rng);
        trace!("exploring action {action} at a node with {visits} visits");
        Some(action)
    }
    else{ None }
}

/// Produces a full-length candidate action sequence.
///
/// # Parameters
/// - `tree`: The search tree, read only.
/// - `policy`: Picks actions while the cursor is inside the tree.
/// - `max_episode_steps`: Length of the produced sequence. Usually longer than
///                        real episodes; the unused tail is dropped after rollout.
/// - `rng`: Source of every random choice.
///
/// # Returns
/// Exactly `max_episode_steps` actions.
pub fn select_actions<P, const N: usize>(tree: &SearchTree<N>, policy: &P, max_episode_steps: usize, rng: &mut StdRng) -> Vec<usize>
where
    P: SelectionPolicy<N> + ?Sized,
{
    let mut cursor = Some(tree.root());
    let mut actions = Vec::with_capacity(max_episode_steps);

    for step in 0..max_episode_steps{
        let action = match cursor{
            Some(node) => policy.choose(tree, node, rng),
            None => sample_action::<N>(rng)
        };

        if let Some(node) = cursor{
            cursor = tree.child(node, action);
            if cursor.is_none(){
                trace!("left the explored tree at step {step}");
            }
        }

        actions.push(action);
    }

    actions
}

/// The Brute policy: epsilon-greedy by visit count.
///
/// Explores with probability [`epsilon`], otherwise plays uniformly among the
/// actions with the highest known value.
#[derive(Clone, Debug, PartialEq)]
pub struct EpsilonGreedy{
    exploration_param: f64
}

impl Default for EpsilonGreedy{
    fn default() -> Self{
        EpsilonGreedy { exploration_param: EXPLORATION_PARAM }
    }
}

impl EpsilonGreedy{
    /// Creates the policy with a custom exploration scale.
    ///
    /// # Returns
    /// `Err(ConfigError::InvalidParameter)` if `exploration_param` is negative or not finite.
    pub fn new(exploration_param: f64) -> Result<Self, ConfigError>{
        non_negative("exploration_param", exploration_param)?;
        Ok(EpsilonGreedy { exploration_param })
    }

    #[inline]
    pub fn exploration_param(&self) -> f64{
        self.exploration_param
    }
}

impl<const N: usize> SelectionPolicy<N> for EpsilonGreedy{
    fn choose(&self, tree: &SearchTree<N>, node: NodeId, rng: &mut StdRng) -> usize{
        if let Some(action) = explore::<N>(self.exploration_param, tree.stats(node).visits(), rng){
            return action;
        }

        choose_uniform(&tree.best_actions(node), rng).unwrap_or_else(|| sample_action::<N>(rng))
    }
}

/// Baseline policy that ignores the tree and always plays at random.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformRandom;

impl<const N: usize> SelectionPolicy<N> for UniformRandom{
    fn choose(&self, _tree: &SearchTree<N>, _node: NodeId, rng: &mut StdRng) -> usize{
        sample_action::<N>(rng)
    }
}
