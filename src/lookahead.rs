//! Bounded-depth value lookahead used by the Q agent.
//!
//! Instead of reading a child's best reward directly, each candidate action is
//! scored by a Bellman-style backup along the most promising line below it:
//!
//! ```text
//! backup(n, d) = n.value                                       if d >= max_depth or n is a leaf
//!              = gamma * (backup(b, d + 1) + discount * m) + bonus(n)   otherwise
//! ```
//!
//! where `b` is the child with the highest exploration bonus and `m` the best
//! child value. Only one child is followed per level, so the backup is a chain
//! and is evaluated with an explicit stack instead of recursion.

use log::trace;
use rand::{rngs::StdRng, Rng};

use crate::{
    error::non_negative,
    policy::{explore, sample_action, EXPLORATION_PARAM},
    search_tree::best_of,
    utils::choose_uniform,
    ConfigError, NodeId, NodeStats, SearchTree, SelectionPolicy,
};

/// Tunables of the lookahead policy.
#[derive(Clone, Debug, PartialEq)]
pub struct LookaheadConfig{
    /// Probability of consulting the lookahead at an explored node. The rest
    /// of the time a random action is played. `1.0` never gambles.
    pub gambler_percent: f64,
    /// Weight of the best child value at each level.
    pub discount: f64,
    /// Weight of the deeper part of the backup.
    pub gamma: f64,
    /// `k` in the exploration bonus `u + k / n`.
    pub exploration_constant: f64,
    /// Number of levels the backup may descend below a candidate child.
    pub max_depth: usize,
    /// Scale of the visit-decayed epsilon exploration applied before the gambler gate.
    pub exploration_param: f64,
}

impl LookaheadConfig{
    /// Gambler 0.8, discount and gamma 0.8, no bonus constant, one level deep.
    pub const DEFAULT: LookaheadConfig = LookaheadConfig{
        gambler_percent: 0.8,
        discount: 0.8,
        gamma: 0.8,
        exploration_constant: 0.0,
        max_depth: 1,
        exploration_param: EXPLORATION_PARAM,
    };

    /// Rejects configurations that cannot drive a search.
    pub fn validate(&self) -> Result<(), ConfigError>{
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if !(0.0..=1.0).contains(&self.gambler_percent){
            return Err(ConfigError::GamblerPercentOutOfRange(self.gambler_percent));
        }
        non_negative("discount", self.discount)?;
        non_negative("gamma", self.gamma)?;
        non_negative("exploration_constant", self.exploration_constant)?;
        non_negative("exploration_param", self.exploration_param)
    }
}

impl Default for LookaheadConfig{
    fn default() -> Self{
        Self::DEFAULT
    }
}

/// Upper-confidence style bonus `u + k / n`.
///
/// An unvisited node has infinite priority instead of dividing by zero.
#[inline]
pub fn exploration_bonus(value: f64, visits: u64, k: f64) -> f64{
    if visits == 0 { f64::INFINITY } else { value + k / visits as f64 }
}

/// The Q policy: epsilon exploration, then the gambler gate, then lookahead exploitation.
#[derive(Clone, Debug, PartialEq)]
pub struct Lookahead{
    config: LookaheadConfig
}

impl Lookahead{
    /// Creates the policy from a validated configuration.
    ///
    /// # Returns
    /// `Err(ConfigError)` when `config` is out of range.
    pub fn new(config: LookaheadConfig) -> Result<Self, ConfigError>{
        config.validate()?;
        Ok(Lookahead { config })
    }

    /// The validated configuration.
    #[inline]
    pub fn config(&self) -> &LookaheadConfig{
        &self.config
    }

    #[inline]
    fn bonus(&self, stats: &NodeStats) -> f64{
        exploration_bonus(stats.value(), stats.visits(), self.config.exploration_constant)
    }

    /// Bounded backup of `node`, evaluated iteratively.
    ///
    /// The walk follows the best-bonus child (lowest action id on ties) at
    /// most `max_depth` times and stops early at a leaf.
    pub fn backup<const N: usize>(&self, tree: &SearchTree<N>, node: NodeId) -> f64{
        let mut levels: Vec<(f64, f64)> = Vec::new();
        let mut current = node;

        while levels.len() < self.config.max_depth{
            let mut best: Option<(NodeId, f64)> = None;
            let mut max_child_value = f64::NEG_INFINITY;

            for (_, child) in tree.node(current).children(){
                let stats = tree.stats(child);
                let bonus = self.bonus(stats);

                max_child_value = max_child_value.max(stats.value());
                if best.map_or(true, |(_, b)| bonus > b){
                    best = Some((child, bonus));
                }
            }

            let Some((next, _)) = best else { break };

            levels.push((self.bonus(tree.stats(current)), max_child_value));
            current = next;
        }

        let leaf = tree.stats(current).value();
        levels.iter().rev().fold(leaf, |deeper, &(bonus, max_child_value)| {
            self.config.gamma * (deeper + self.config.discount * max_child_value) + bonus
        })
    }

    /// Lookahead score of every action at `node`; actions without a child are `-inf`.
    pub fn action_scores<const N: usize>(&self, tree: &SearchTree<N>, node: NodeId) -> [f64; N]{
        let node = tree.node(node);
        std::array::from_fn(|action| {
            node.get_child(action).map_or(f64::NEG_INFINITY, |child| self.backup(tree, child))
        })
    }
}

impl<const N: usize> SelectionPolicy<N> for Lookahead{
    fn choose(&self, tree: &SearchTree<N>, node: NodeId, rng: &mut StdRng) -> usize{
        if let Some(action) = explore::<N>(self.config.exploration_param, tree.stats(node).visits(), rng){
            return action;
        }

        if rng.random::<f64>() > self.config.gambler_percent{
            let action = sample_action::<N>(rng);
            trace!("gambling on action {action}");
            return action;
        }

        let scores = self.action_scores(tree, node);
        choose_uniform(&best_of(&scores), rng).unwrap_or_else(|| sample_action::<N>(rng))
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::seeded_rng;

    use super::*;

    fn config(max_depth: usize) -> LookaheadConfig{
        LookaheadConfig{
            gambler_percent: 1.0,
            discount: 0.5,
            gamma: 0.5,
            exploration_constant: 2.0,
            max_depth,
            exploration_param: 0.0,
        }
    }

    #[test]
    fn test_validate(){
        assert!(LookaheadConfig::DEFAULT.validate().is_ok());
        assert_eq!(Lookahead::new(LookaheadConfig { max_depth: 0, ..config(1) }), Err(ConfigError::ZeroMaxDepth));
        assert_eq!(
            Lookahead::new(LookaheadConfig { gambler_percent: 1.5, ..config(1) }),
            Err(ConfigError::GamblerPercentOutOfRange(1.5))
        );
        assert!(Lookahead::new(LookaheadConfig { gambler_percent: -0.1, ..config(1) }).is_err());
        assert!(Lookahead::new(LookaheadConfig { gamma: f64::NAN, ..config(1) }).is_err());
        assert!(Lookahead::new(LookaheadConfig { discount: -1.0, ..config(1) }).is_err());
    }

    #[test]
    fn test_exploration_bonus(){
        assert_eq!(exploration_bonus(3.0, 0, 1.0), f64::INFINITY);
        assert_eq!(exploration_bonus(3.0, 4, 2.0), 3.5);
        assert_eq!(exploration_bonus(3.0, 4, 0.0), 3.0);
    }

    #[test]
    fn test_backup_leaf_is_raw_value(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0], 4.0);

        let policy = Lookahead::new(config(3)).unwrap();
        let leaf = tree.find(&[0]).unwrap();
        assert_eq!(policy.backup(&tree, leaf), 4.0);
    }

    #[test]
    fn test_backup_one_level(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0, 0], 2.0);
        tree.update(&[0, 1], 6.0);

        // node [0]: value 6, visits 2; children [0,0] (2, 1 visit) and [0,1] (6, 1 visit)
        let policy = Lookahead::new(config(1)).unwrap();
        let node = tree.find(&[0]).unwrap();

        // best bonus child is [0,1] with 6 + 2/1 = 8; its backup at depth 1 is its raw value 6
        let expected = 0.5 * (6.0 + 0.5 * 6.0) + (6.0 + 2.0 / 2.0);
        assert!((policy.backup(&tree, node) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_backup_respects_max_depth(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0, 0, 0, 0, 0], 1.0);

        let node = tree.find(&[0]).unwrap();
        let shallow = Lookahead::new(config(1)).unwrap().backup(&tree, node);
        let deep = Lookahead::new(config(3)).unwrap().backup(&tree, node);

        // every node on the chain has value 1 and one visit, so bonus = 3
        let depth_1 = 0.5 * (1.0 + 0.5) + 3.0;
        let depth_2 = 0.5 * (depth_1 + 0.5) + 3.0;
        let depth_3 = 0.5 * (depth_2 + 0.5) + 3.0;
        assert!((shallow - depth_1).abs() < 1e-12);
        assert!((deep - depth_3).abs() < 1e-12);
    }

    #[test]
    fn test_backup_deep_chain_does_not_overflow(){
        let mut tree = SearchTree::<1>::new();
        tree.update(&vec![0; 50_000], 1.0);

        let policy = Lookahead::new(config(100_000)).unwrap();
        assert!(policy.backup(&tree, tree.root()).is_finite());
    }

    #[test]
    fn test_action_scores_unexplored_is_neg_infinity(){
        let mut tree = SearchTree::<3>::new();
        tree.update(&[1], 2.0);

        let scores = Lookahead::new(config(1)).unwrap().action_scores(&tree, tree.root());
        assert_eq!(scores[0], f64::NEG_INFINITY);
        assert_eq!(scores[1], 2.0);
        assert_eq!(scores[2], f64::NEG_INFINITY);
    }

    #[test]
    fn test_choose_prefers_higher_backup(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0], 1.0);
        tree.update(&[1, 0], 3.0);

        let policy = Lookahead::new(config(2)).unwrap();
        let mut rng = seeded_rng(Some(1));
        for _ in 0..50{
            assert_eq!(SelectionPolicy::<2>::choose(&policy, &tree, tree.root(), &mut rng), 1);
        }
    }

    #[test]
    fn test_choose_breaks_ties_uniformly(){
        let mut tree = SearchTree::<3>::new();
        tree.update(&[0], 5.0);
        tree.update(&[2], 5.0);

        let policy = Lookahead::new(LookaheadConfig { exploration_constant: 0.0, ..config(1) }).unwrap();
        let mut rng = seeded_rng(Some(9));
        let mut counts = [0usize; 3];
        for _ in 0..2000{
            counts[SelectionPolicy::<3>::choose(&policy, &tree, tree.root(), &mut rng)] += 1;
        }

        assert_eq!(counts[1], 0);
        assert!(counts[0] > 850 && counts[2] > 850, "{counts:?}");
    }

    #[test]
    fn test_gambler_zero_always_random(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0], 10.0);

        let policy = Lookahead::new(LookaheadConfig { gambler_percent: 0.0, ..config(1) }).unwrap();
        let mut rng = seeded_rng(Some(6));
        let picks: Vec<usize> = (0..200).map(|_| SelectionPolicy::<2>::choose(&policy, &tree, tree.root(), &mut rng)).collect();

        assert!(picks.contains(&1));
    }
}
