//! Episodic search agent: select, roll out, update.
//!
//! An [`Agent`] owns the environment, the search tree and the random number
//! generator. Each call to [`Agent::run_episode`] performs one synchronous
//! pass of the pipeline:
//!
//! 1. select a full-length candidate sequence from the tree,
//! 2. replay it against the environment from the initial state,
//! 3. back-propagate the reward along the executed prefix.
//!
//! The Brute, Q and random agents differ only in their [`SelectionPolicy`].

use log::debug;
use rand::rngs::StdRng;

use crate::{
    policy::select_actions, rollout::rollout, utils::seeded_rng, ConfigError, Environment,
    EpsilonGreedy, Lookahead, LookaheadConfig, SearchTree, SelectionPolicy, UniformRandom,
};

/// Configuration shared by every agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig{
    /// Length of each candidate sequence. Should exceed the longest real episode.
    pub max_episode_steps: usize,
    /// Render the environment before every rollout step.
    pub render: bool,
    /// Seed of the search random number generator.
    ///
    /// `Some(value)` makes the search reproducible for a deterministic
    /// environment. `None` seeds from the system time.
    pub seed: Option<u64>,
}

impl AgentConfig{
    /// - `max_episode_steps`: 4500
    /// - `render`: `false`
    /// - `seed`: `None`
    pub const DEFAULT: AgentConfig = AgentConfig{
        max_episode_steps: 4500,
        render: false,
        seed: None,
    };

    pub fn validate(&self) -> Result<(), ConfigError>{
        if self.max_episode_steps == 0{
            return Err(ConfigError::ZeroEpisodeSteps);
        }
        Ok(())
    }
}

impl Default for AgentConfig{
    fn default() -> Self{
        Self::DEFAULT
    }
}

/// Result of one episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode{
    /// The actions actually executed, in order.
    pub actions: Vec<usize>,
    /// Total reward of the rollout.
    pub total_reward: f64,
    /// Nodes added to the tree by this episode.
    pub new_nodes: usize,
}

/// A tree search agent over a deterministic environment.
///
/// # Type Parameters
/// - `E`: The environment, exclusively owned.
/// - `P`: The action selection policy.
/// - `N`: The number of discrete actions.
pub struct Agent<E, P, const N: usize>{
    env: E,
    policy: P,
    tree: SearchTree<N>,
    rng: StdRng,
    max_episode_steps: usize,
    render: bool,
}

/// Greedy agent: epsilon-greedy by visit count.
pub type Brute<E, const N: usize> = Agent<E, EpsilonGreedy, N>;
/// Lookahead agent: gambler gate plus bounded Bellman backup.
pub type Q<E, const N: usize> = Agent<E, Lookahead, N>;

impl<E, P, const N: usize> Agent<E, P, N>
where
    E: Environment<N>,
    P: SelectionPolicy<N>,
{
    /// Creates an agent with an empty tree.
    ///
    /// # Returns
    /// `Err(ConfigError)` if `config` is invalid or the environment has no actions.
    pub fn new(env: E, policy: P, config: &AgentConfig) -> Result<Self, ConfigError>{
        if N == 0{
            return Err(ConfigError::EmptyActionSpace);
        }
        config.validate()?;

        Ok(Agent{
            env,
            policy,
            tree: SearchTree::new(),
            rng: seeded_rng(config.seed),
            max_episode_steps: config.max_episode_steps,
            render: config.render,
        })
    }

    /// Runs one select, rollout, update pass.
    ///
    /// # Returns
    /// The executed actions and their total reward. Environment faults are
    /// returned unchanged and leave the tree untouched.
    pub fn run_episode(&mut self) -> Result<Episode, E::Error>{
        let mut actions = select_actions(&self.tree, &self.policy, self.max_episode_steps, &mut self.rng);

        let result = rollout(&mut self.env, &actions, self.render)?;
        actions.truncate(result.steps);

        let new_nodes = self.tree.update(&actions, result.total_reward);
        debug!(
            "episode: {} steps, reward {}, {} new nodes, {} total",
            result.steps, result.total_reward, new_nodes, self.tree.node_count()
        );

        Ok(Episode { actions, total_reward: result.total_reward, new_nodes })
    }

    /// The search tree built so far.
    #[inline]
    pub fn tree(&self) -> &SearchTree<N>{
        &self.tree
    }

    /// Total number of nodes in the tree, root included.
    #[inline]
    pub fn node_count(&self) -> usize{
        self.tree.node_count()
    }

    /// The action selection policy.
    #[inline]
    pub fn policy(&self) -> &P{
        &self.policy
    }

    /// The environment between episodes.
    #[inline]
    pub fn env(&self) -> &E{
        &self.env
    }

    /// Mutable access to the environment between episodes.
    #[inline]
    pub fn env_mut(&mut self) -> &mut E{
        &mut self.env
    }

    /// Length of each candidate sequence.
    #[inline]
    pub fn max_episode_steps(&self) -> usize{
        self.max_episode_steps
    }

    /// Consumes the agent, discarding the tree and returning the environment.
    pub fn into_env(self) -> E{
        self.env
    }
}

impl<E: Environment<N>, const N: usize> Agent<E, EpsilonGreedy, N>{
    /// Creates a Brute agent with the default exploration scale.
    pub fn brute(env: E, config: &AgentConfig) -> Result<Self, ConfigError>{
        Self::new(env, EpsilonGreedy::default(), config)
    }
}

impl<E: Environment<N>, const N: usize> Agent<E, Lookahead, N>{
    /// Creates a Q agent.
    ///
    /// # Returns
    /// `Err(ConfigError)` if either configuration is invalid.
    pub fn q(env: E, config: &AgentConfig, lookahead: LookaheadConfig) -> Result<Self, ConfigError>{
        Self::new(env, Lookahead::new(lookahead)?, config)
    }
}

impl<E: Environment<N>, const N: usize> Agent<E, UniformRandom, N>{
    /// Creates a baseline agent that plays uniformly random sequences.
    pub fn random(env: E, config: &AgentConfig) -> Result<Self, ConfigError>{
        Self::new(env, UniformRandom, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{EnvFault, PrefixEnv, RewardTableEnv};

    fn config(max_episode_steps: usize, seed: u64) -> AgentConfig{
        AgentConfig { max_episode_steps, render: false, seed: Some(seed) }
    }

    #[test]
    fn test_invalid_config(){
        let env = RewardTableEnv::<2>::new(vec![[0.0, 0.0]]);
        assert_eq!(Brute::brute(env, &config(0, 1)).err(), Some(ConfigError::ZeroEpisodeSteps));

        let env = RewardTableEnv::<2>::new(vec![[0.0, 0.0]]);
        let lookahead = LookaheadConfig { max_depth: 0, ..LookaheadConfig::DEFAULT };
        assert_eq!(Q::q(env, &config(10, 1), lookahead).err(), Some(ConfigError::ZeroMaxDepth));
    }

    #[test]
    fn test_empty_action_space_rejected(){
        let env = RewardTableEnv::<0>::new(vec![[]]);
        assert_eq!(Brute::brute(env, &config(3, 1)).err(), Some(ConfigError::EmptyActionSpace));

        let env = RewardTableEnv::<0>::new(vec![[]]);
        assert_eq!(Q::q(env, &config(3, 1), LookaheadConfig::DEFAULT).err(), Some(ConfigError::EmptyActionSpace));

        let env = RewardTableEnv::<0>::new(vec![[]]);
        assert_eq!(Agent::random(env, &config(3, 1)).err(), Some(ConfigError::EmptyActionSpace));
    }

    #[test]
    fn test_first_episode_single_step_env() -> Result<(), EnvFault>{
        for seed in 0..20{
            let env = RewardTableEnv::<2>::new(vec![[1.0, 0.0]]);
            let mut agent = Brute::brute(env, &config(1, seed)).unwrap();

            let episode = agent.run_episode()?;
            assert_eq!(episode.actions.len(), 1);
            assert_eq!(episode.new_nodes, 1);

            let tree = agent.tree();
            let root = tree.root();
            assert_eq!(tree.stats(root).visits(), 1);

            let played = episode.actions[0];
            let child = tree.child(root, played).unwrap();
            assert_eq!(tree.stats(child).value(), if played == 0 { 1.0 } else { 0.0 });
            assert!(tree.child(root, 1 - played).is_none());
        }
        Ok(())
    }

    #[test]
    fn test_steps_bounded_by_termination() -> Result<(), EnvFault>{
        let env = RewardTableEnv::<3>::new(vec![[0.0, 1.0, 2.0]; 3]);
        let mut agent = Brute::brute(env, &config(5, 3)).unwrap();

        for _ in 0..50{
            let episode = agent.run_episode()?;
            assert!(episode.actions.len() <= 3);
        }
        assert_eq!(agent.tree().stats(agent.tree().root()).visits(), 50);
        Ok(())
    }

    #[test]
    fn test_executed_prefix_only_in_tree() -> Result<(), EnvFault>{
        let env = RewardTableEnv::<2>::new(vec![[0.0, 0.0]; 2]);
        let mut agent = Brute::brute(env, &config(100, 8)).unwrap();

        agent.run_episode()?;
        // root plus two executed steps, never the 98 speculative ones
        assert_eq!(agent.node_count(), 3);
        Ok(())
    }

    #[test]
    fn test_node_count_tracks_new_nodes() -> Result<(), EnvFault>{
        let env = PrefixEnv::<3>::new(vec![2, 0, 1, 1]);
        let mut agent = Brute::brute(env, &config(10, 21)).unwrap();

        let mut total = 1;
        for _ in 0..30{
            total += agent.run_episode()?.new_nodes;
        }
        assert_eq!(agent.node_count(), total);
        Ok(())
    }

    #[test]
    fn test_brute_finds_hidden_sequence() -> Result<(), EnvFault>{
        // a wrong action ends the episode, so progress past the best known
        // prefix only comes from epsilon exploration
        let env = PrefixEnv::<2>::new(vec![1, 0, 0, 1, 1]);
        let mut agent = Agent::new(env, EpsilonGreedy::new(0.5).unwrap(), &config(8, 13)).unwrap();

        let mut best = f64::NEG_INFINITY;
        for _ in 0..500{
            best = best.max(agent.run_episode()?.total_reward);
        }
        assert_eq!(best, 5.0);
        Ok(())
    }

    #[test]
    fn test_q_finds_hidden_sequence() -> Result<(), EnvFault>{
        let env = PrefixEnv::<2>::new(vec![0, 1, 1, 0]);
        let lookahead = LookaheadConfig { gambler_percent: 0.7, max_depth: 2, ..LookaheadConfig::DEFAULT };
        let mut agent = Q::q(env, &config(6, 17), lookahead).unwrap();

        let mut best = f64::NEG_INFINITY;
        for _ in 0..500{
            best = best.max(agent.run_episode()?.total_reward);
        }
        assert_eq!(best, 4.0);
        Ok(())
    }

    #[test]
    fn test_seeded_agents_are_reproducible() -> Result<(), EnvFault>{
        let run = |seed| -> Result<Vec<Episode>, EnvFault> {
            let env = RewardTableEnv::<3>::new(vec![[0.0, 1.0, 0.5]; 6]);
            let mut agent = Brute::brute(env, &config(8, seed)).unwrap();
            (0..20).map(|_| agent.run_episode()).collect()
        };

        assert_eq!(run(99)?, run(99)?);
        Ok(())
    }

    #[test]
    fn test_fault_leaves_tree_untouched(){
        let env = RewardTableEnv::<2>::new(vec![[0.0, 0.0]; 4]).failing_at(1);
        let mut agent = Agent::random(env, &config(4, 5)).unwrap();

        assert_eq!(agent.run_episode(), Err(EnvFault(1)));
        assert_eq!(agent.node_count(), 1);
        assert_eq!(agent.tree().stats(agent.tree().root()).visits(), 0);
    }
}
