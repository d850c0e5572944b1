//! Arena tree data structure used by the search

/// Index of a node inside a [`Tree`] arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the tree structure
///
/// # Type Parameters
/// - `T`: The data type stored in the node
/// - `N`: The number of child slots
pub struct Node<T, const N: usize>{
    children: [Option<NodeId>; N],
    data: T
}

impl<T, const N: usize> Node<T, N>{
    #[inline]
    fn new(data: T) -> Self{
        Node { children: [None; N], data }
    }

    /// Gets the child id at the specified slot
    ///
    /// # Parameters
    /// - `i`: The child index (out of range returns `None`)
    #[inline]
    pub fn get_child(&self, i: usize) -> Option<NodeId>{
        self.children.get(i).copied().flatten()
    }

    /// Iterates over `(slot, child)` pairs of existing children
    #[inline]
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.children.iter().enumerate().filter_map(|(i, c)| c.map(|c| (i, c)))
    }

    /// Returns `true` if no child slot is filled
    #[inline]
    pub fn is_leaf(&self) -> bool{
        self.children.iter().all(Option::is_none)
    }

    /// Gets a reference to the node's data
    #[inline]
    pub fn get(&self) -> &T{
        &self.data
    }

    /// Gets a mutable reference to the node's data
    #[inline]
    pub fn get_mut(&mut self) -> &mut T{
        &mut self.data
    }
}

/// Grow-only tree stored in a single arena.
///
/// The root is created with the tree and never replaced. Nodes are never
/// removed, so a `NodeId` stays valid for the lifetime of the tree. Each
/// node has at most one parent, which is not stored.
pub struct Tree<T, const N: usize>{
    nodes: Vec<Node<T, N>>
}

impl<T, const N: usize> Tree<T, N>{
    /// Creates a new tree holding only a root with the given data
    #[inline]
    pub fn new(root_data: T) -> Self{
        Tree { nodes: vec![Node::new(root_data)] }
    }

    /// Id of the root node
    #[inline]
    pub fn root(&self) -> NodeId{
        NodeId(0)
    }

    /// Number of nodes in the tree, root included
    #[inline]
    pub fn len(&self) -> usize{
        self.nodes.len()
    }

    /// Gets a node by id
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<T, N>{
        &self.nodes[id.0]
    }

    /// Gets a node mutably by id
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T, N>{
        &mut self.nodes[id.0]
    }

    /// Child of `parent` at slot `i`, if any
    #[inline]
    pub fn child(&self, parent: NodeId, i: usize) -> Option<NodeId>{
        self.node(parent).get_child(i)
    }

    /// Adds a new child node at the specified slot
    ///
    /// # Parameters
    /// - `parent`: The parent node
    /// - `i`: The slot to add the child at (must be < N and empty)
    /// - `data`: The data for the new child
    ///
    /// # Returns
    /// Id of the newly created child node
    #[inline]
    pub fn add_child(&mut self, parent: NodeId, i: usize, data: T) -> NodeId{
        debug_assert!(self.child(parent, i).is_none(), "child slot {i} already filled");

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        self.nodes[parent.0].children[i] = Some(id);
        id
    }
}
