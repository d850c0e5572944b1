//! Search tree over action sequences and the reward back-propagation step.

use crate::{Node, NodeId, Tree};

/// Statistics of one partial action sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStats{
    /// Best total episode reward of any rollout through this node.
    value: f64,
    /// Number of rollouts whose executed path passed through this node.
    visits: u64,
}

impl NodeStats{
    /// Statistics of a node no rollout has touched yet.
    ///
    /// The value loses to any real reward.
    pub const UNVISITED: NodeStats = NodeStats { value: f64::NEG_INFINITY, visits: 0 };

    /// Best total reward observed through this node.
    #[inline]
    pub fn value(&self) -> f64{
        self.value
    }

    /// Number of rollouts that passed through this node.
    #[inline]
    pub fn visits(&self) -> u64{
        self.visits
    }

    /// Folds one rollout result into the statistics.
    ///
    /// `value` never decreases and `visits` grows by exactly one.
    #[inline]
    fn record(&mut self, total_reward: f64){
        self.value = self.value.max(total_reward);
        self.visits += 1;
    }
}

/// Tree of every executed action prefix, keyed by action id.
///
/// A child exists for action `a` under a node iff some rollout executed `a`
/// right after reaching that node. The tree only grows.
///
/// # Type Parameters
/// - `N`: The number of discrete actions.
pub struct SearchTree<const N: usize>{
    tree: Tree<NodeStats, N>
}

impl<const N: usize> Default for SearchTree<N>{
    fn default() -> Self{
        Self::new()
    }
}

impl<const N: usize> SearchTree<N>{
    /// Creates a tree holding only an unvisited root.
    pub fn new() -> Self{
        SearchTree { tree: Tree::new(NodeStats::UNVISITED) }
    }

    /// The root, standing for the initial state.
    #[inline]
    pub fn root(&self) -> NodeId{
        self.tree.root()
    }

    /// Total number of nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize{
        self.tree.len()
    }

    /// Statistics of node `id`.
    #[inline]
    pub fn stats(&self, id: NodeId) -> &NodeStats{
        self.tree.node(id).get()
    }

    /// Node `id` with its child slots.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<NodeStats, N>{
        self.tree.node(id)
    }

    /// The child reached by `action` from `id`, if it was ever executed.
    #[inline]
    pub fn child(&self, id: NodeId, action: usize) -> Option<NodeId>{
        self.tree.child(id, action)
    }

    /// Follows `actions` from the root.
    ///
    /// # Returns
    /// The node reached, or `None` if the path leaves the tree.
    pub fn find(&self, actions: &[usize]) -> Option<NodeId>{
        actions.iter().try_fold(self.root(), |node, &action| self.child(node, action))
    }

    /// Gets the child for `action`, creating an unvisited one if absent.
    ///
    /// # Returns
    /// The child and whether it was created by this call.
    ///
    /// # Panics
    /// If `action >= N`.
    pub fn get_or_create_child(&mut self, node: NodeId, action: usize) -> (NodeId, bool){
        match self.tree.child(node, action){
            Some(child) => (child, false),
            None => (self.tree.add_child(node, action, NodeStats::UNVISITED), true)
        }
    }

    /// Value of every legal action at `node`; actions without a child are `-inf`.
    pub fn action_values(&self, node: NodeId) -> [f64; N]{
        let node = self.tree.node(node);
        std::array::from_fn(|action| {
            node.get_child(action).map_or(f64::NEG_INFINITY, |child| self.stats(child).value)
        })
    }

    /// Every action whose value is maximal at `node`.
    ///
    /// Actions without a child count as `-inf`, so a node with no children
    /// returns all of `0..N`. The caller breaks ties uniformly at random.
    pub fn best_actions(&self, node: NodeId) -> Vec<usize>{
        best_of(&self.action_values(node))
    }

    /// Back-propagates one rollout along its executed actions.
    ///
    /// Updates the root, then walks `executed` creating missing children, and
    /// records `total_reward` on every node of the path.
    ///
    /// # Parameters
    /// - `executed`: The actions actually executed by the rollout, never the
    ///               speculative tail that was cut off by termination.
    /// - `total_reward`: The rollout's accumulated reward.
    ///
    /// # Returns
    /// The number of nodes created by this call.
    pub fn update(&mut self, executed: &[usize], total_reward: f64) -> usize{
        let mut node = self.root();
        self.tree.node_mut(node).get_mut().record(total_reward);

        let mut created = 0;
        for &action in executed{
            let (child, new) = self.get_or_create_child(node, action);
            created += new as usize;

            node = child;
            self.tree.node_mut(node).get_mut().record(total_reward);
        }

        created
    }
}

/// Indices holding the maximal value in `values`.
///
/// Returns every index when all values are `-inf` and an empty list only for
/// an empty slice.
pub(crate) fn best_of(values: &[f64]) -> Vec<usize>{
    let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values.iter().enumerate().filter(|&(_, &v)| v == best).map(|(i, _)| i).collect()
}

#[cfg(test)]
mod tests {
    use crate::utils::{choose_uniform, seeded_rng};

    use super::*;

    #[test]
    fn test_new_tree(){
        let tree = SearchTree::<2>::new();

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.stats(tree.root()).visits(), 0);
        assert_eq!(tree.stats(tree.root()).value(), f64::NEG_INFINITY);
        assert_eq!(tree.best_actions(tree.root()), vec![0, 1]);
    }

    #[test]
    fn test_update_single_step(){
        let mut tree = SearchTree::<2>::new();

        assert_eq!(tree.update(&[0], 1.0), 1);

        let root = tree.root();
        assert_eq!(tree.stats(root).visits(), 1);
        assert_eq!(tree.stats(root).value(), 1.0);

        let child = tree.child(root, 0).unwrap();
        assert_eq!(tree.stats(child).value(), 1.0);
        assert_eq!(tree.stats(child).visits(), 1);
        assert!(tree.child(root, 1).is_none());
    }

    #[test]
    fn test_update_same_path_twice(){
        let mut tree = SearchTree::<3>::new();

        assert_eq!(tree.update(&[2, 0, 1], 4.0), 3);
        assert_eq!(tree.update(&[2, 0, 1], 4.0), 0);
        assert_eq!(tree.node_count(), 4);

        let leaf = tree.find(&[2, 0, 1]).unwrap();
        assert_eq!(tree.stats(leaf).visits(), 2);
        assert_eq!(tree.stats(tree.root()).visits(), 2);
    }

    #[test]
    fn test_update_shared_prefix(){
        let mut tree = SearchTree::<3>::new();

        assert_eq!(tree.update(&[1, 1], 2.0), 2);
        assert_eq!(tree.update(&[1, 2, 0], 5.0), 2);

        let shared = tree.find(&[1]).unwrap();
        assert_eq!(tree.stats(shared).visits(), 2);
        assert_eq!(tree.stats(shared).value(), 5.0);
        assert_eq!(tree.stats(tree.find(&[1, 1]).unwrap()).value(), 2.0);
        assert!(tree.find(&[0]).is_none());
    }

    #[test]
    fn test_update_value_never_decreases(){
        let mut tree = SearchTree::<2>::new();

        tree.update(&[0, 1], 10.0);
        tree.update(&[0, 1], -3.0);

        let node = tree.find(&[0, 1]).unwrap();
        assert_eq!(tree.stats(node).value(), 10.0);
        assert_eq!(tree.stats(node).visits(), 2);
        assert_eq!(tree.stats(tree.root()).value(), 10.0);
    }

    #[test]
    fn test_update_empty_path(){
        let mut tree = SearchTree::<2>::new();

        assert_eq!(tree.update(&[], 0.5), 0);
        assert_eq!(tree.stats(tree.root()).visits(), 1);
        assert_eq!(tree.stats(tree.root()).value(), 0.5);
    }

    #[test]
    fn test_get_or_create_child(){
        let mut tree = SearchTree::<4>::new();
        let root = tree.root();

        let (a, created) = tree.get_or_create_child(root, 3);
        assert!(created);
        let (b, created) = tree.get_or_create_child(root, 3);
        assert!(!created);
        assert_eq!(a, b);
        assert_eq!(*tree.stats(a), NodeStats::UNVISITED);
    }

    #[test]
    fn test_best_actions(){
        let mut tree = SearchTree::<4>::new();
        tree.update(&[0], 1.0);
        tree.update(&[2], 3.0);
        tree.update(&[3], 3.0);

        assert_eq!(tree.best_actions(tree.root()), vec![2, 3]);
        assert_eq!(tree.action_values(tree.root()), [1.0, f64::NEG_INFINITY, 3.0, 3.0]);
    }

    #[test]
    fn test_best_actions_tie_has_no_positional_bias(){
        let mut tree = SearchTree::<2>::new();
        tree.update(&[0], 5.0);
        tree.update(&[1], 5.0);

        let mut rng = seeded_rng(Some(11));
        let mut counts = [0usize; 2];
        for _ in 0..2000{
            let best = tree.best_actions(tree.root());
            counts[choose_uniform(&best, &mut rng).unwrap()] += 1;
        }

        assert!(counts[0] > 850 && counts[1] > 850, "{counts:?}");
    }
}
