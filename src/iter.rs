//! Ordered traversal: full walks, prefix walks, ancestor paths.

use crate::{CritBitTree, NodeRef, Ptr};

impl<V> CritBitTree<V> {
    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self, self.root, &[])
    }

    /// Entries whose key starts with `prefix`, in ascending key order.
    pub fn prefix_iter<'a>(&'a self, prefix: &'a [u8]) -> Iter<'a, V> {
        Iter::new(self, self.prefix_root(prefix), prefix)
    }

    /// Entries whose key is a prefix of `path`, shortest first.
    pub fn path_iter<'a, 'p>(&'a self, path: &'p [u8]) -> PathIter<'a, 'p, V> {
        PathIter {
            tree: self,
            path,
            next: self.root,
        }
    }

    /// Calls `visitor` on every entry in key order until it returns `true`.
    ///
    /// Returns whether the visitor stopped the walk.
    pub fn walk<'a, F>(&'a self, mut visitor: F) -> bool
    where
        F: FnMut(&'a [u8], &'a V) -> bool,
    {
        self.iter().any(|(k, v)| visitor(k, v))
    }

    /// Like [`walk`](Self::walk), restricted to keys starting with `prefix`.
    pub fn walk_prefix<'a, F>(&'a self, prefix: &[u8], mut visitor: F) -> bool
    where
        F: FnMut(&'a [u8], &'a V) -> bool,
    {
        Iter::new(self, self.prefix_root(prefix), &[])
            .any(|(k, v)| k.starts_with(prefix) && visitor(k, v))
    }

    /// Like [`walk`](Self::walk), over the stored keys that are prefixes of
    /// `path`, shortest first.
    pub fn walk_path<'a, F>(&'a self, path: &[u8], mut visitor: F) -> bool
    where
        F: FnMut(&'a [u8], &'a V) -> bool,
    {
        let mut iter = PathIter {
            tree: self,
            path,
            next: self.root,
        };
        iter.any(|(k, v)| visitor(k, v))
    }

    pub fn minimum(&self) -> Option<(&[u8], &V)> {
        self.edge_leaf(0)
    }

    pub fn maximum(&self) -> Option<(&[u8], &V)> {
        self.edge_leaf(1)
    }

    /// The longest stored key that is a prefix of `query`.
    pub fn longest_prefix<'a>(&'a self, query: &[u8]) -> Option<(&'a [u8], &'a V)> {
        PathIter {
            tree: self,
            path: query,
            next: self.root,
        }
        .last()
    }

    fn edge_leaf(&self, dir: usize) -> Option<(&[u8], &V)> {
        let mut current = self.root?;
        loop {
            match self.node(current) {
                NodeRef::Branch(branch) => current = branch.children[dir],
                NodeRef::Leaf(leaf) => return Some((&leaf.key[..], &leaf.value)),
            }
        }
    }

    /// Smallest subtree holding every key that starts with `prefix`.
    ///
    /// Branches testing a byte inside `prefix` have one side that cannot hold
    /// a match; below the first branch past `prefix` every leaf is a candidate.
    /// Candidates still need a `starts_with` check, since the subtree is chosen
    /// from bits of `prefix` alone.
    fn prefix_root(&self, prefix: &[u8]) -> Option<Ptr> {
        let mut current = self.root?;
        while let NodeRef::Branch(branch) = self.node(current) {
            if branch.disc.pos() >= prefix.len() {
                break;
            }
            current = branch.children[branch.disc.direction(prefix)];
        }
        Some(current)
    }
}

impl<'a, V> IntoIterator for &'a CritBitTree<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a subtree, yielding keys that start with `prefix`.
pub struct Iter<'a, V> {
    tree: &'a CritBitTree<V>,
    prefix: &'a [u8],
    stack: Vec<Ptr>,
}

impl<'a, V> Iter<'a, V> {
    fn new(tree: &'a CritBitTree<V>, start: Option<Ptr>, prefix: &'a [u8]) -> Self {
        let mut stack = Vec::new();
        stack.extend(start);
        Self {
            tree,
            prefix,
            stack,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ptr) = self.stack.pop() {
            match self.tree.node(ptr) {
                NodeRef::Leaf(leaf) => {
                    if leaf.key.starts_with(self.prefix) {
                        return Some((&leaf.key[..], &leaf.value));
                    }
                }
                NodeRef::Branch(branch) => {
                    self.stack.push(branch.children[1]);
                    self.stack.push(branch.children[0]);
                }
            }
        }
        None
    }
}

/// Iterator over the stored keys that are prefixes of a path, shortest first.
///
/// A stored key `k` that prefixes the path either ends the descent itself or
/// hangs as a leaf off the branch that tests the end-of-key flag at
/// `k.len()`, on the side the path does not take. Checking the untaken child
/// of every branch on the way down therefore finds all of them.
pub struct PathIter<'a, 'p, V> {
    tree: &'a CritBitTree<V>,
    path: &'p [u8],
    next: Option<Ptr>,
}

impl<'a, V> PathIter<'a, '_, V> {
    fn matching_leaf(&self, ptr: Ptr) -> Option<(&'a [u8], &'a V)> {
        match self.tree.node(ptr) {
            NodeRef::Leaf(leaf) if self.path.starts_with(&leaf.key) => {
                Some((&leaf.key[..], &leaf.value))
            }
            _ => None,
        }
    }
}

impl<'a, V> Iterator for PathIter<'a, '_, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ptr) = self.next.take() {
            match self.tree.node(ptr) {
                NodeRef::Leaf(_) => return self.matching_leaf(ptr),
                NodeRef::Branch(branch) => {
                    let dir = branch.disc.direction(self.path);
                    self.next = Some(branch.children[dir]);
                    if let Some(entry) = self.matching_leaf(branch.children[1 - dir]) {
                        return Some(entry);
                    }
                }
            }
        }
        None
    }
}
