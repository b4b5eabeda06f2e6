//! # critbit
//!
//! An ordered map from byte strings to values, stored as a crit-bit tree
//! (a binary PATRICIA trie). Every key lives in exactly one leaf and every
//! internal node tests a single bit, so the tree holds `n` leaves and `n - 1`
//! branches regardless of key length.
//!
//! Besides point operations the tree answers prefix queries: all keys under a
//! prefix ([`CritBitTree::walk_prefix`]), all stored keys that are prefixes of a
//! path ([`CritBitTree::walk_path`]) and the longest such key
//! ([`CritBitTree::longest_prefix`]).
//!
//! ## Example
//!
//! ```rust
//! use critbit::CritBitTree;
//!
//! let mut tree: CritBitTree<u64> = CritBitTree::new();
//! tree.insert(b"foo", 1);
//! tree.insert(b"foo/bar", 2);
//! tree.insert(b"zipzap", 3);
//!
//! assert_eq!(tree.get(b"foo/bar"), Some(&2));
//! assert_eq!(tree.longest_prefix(b"foo/baz"), Some((&b"foo"[..], &1)));
//!
//! let keys: Vec<&[u8]> = tree.prefix_iter(b"foo").map(|(k, _)| k).collect();
//! assert_eq!(keys, vec![&b"foo"[..], &b"foo/bar"[..]]);
//! ```

#![deny(unsafe_code)]

mod bits;
mod debug;
mod iter;

pub use bits::Discriminator;
pub use iter::{Iter, PathIter};

use bits::critical_bit;

// =============================================================================
// Pointer type
// =============================================================================

/// Tagged 32-bit node pointer.
///
/// - Bit 31 = 1: leaf (index into `leaves`)
/// - Bit 31 = 0: branch (index into `branches`)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Ptr(u32);

impl Ptr {
    const LEAF_BIT: u32 = 1u32 << 31;
    const INDEX_MASK: u32 = Self::LEAF_BIT - 1;

    #[inline]
    fn leaf(idx: u32) -> Self {
        debug_assert!(idx <= Self::INDEX_MASK);
        Self(idx | Self::LEAF_BIT)
    }

    #[inline]
    fn branch(idx: u32) -> Self {
        debug_assert!(idx <= Self::INDEX_MASK);
        Self(idx)
    }

    #[inline]
    fn is_leaf(self) -> bool {
        (self.0 & Self::LEAF_BIT) != 0
    }

    #[inline]
    fn index(self) -> usize {
        (self.0 & Self::INDEX_MASK) as usize
    }
}

// =============================================================================
// Nodes
// =============================================================================

#[derive(Clone)]
struct Leaf<V> {
    key: Box<[u8]>,
    value: V,
}

#[derive(Clone, Copy)]
struct Branch {
    children: [Ptr; 2],
    disc: Discriminator,
}

/// Borrowed view of a node, resolved from a [`Ptr`].
enum NodeRef<'a, V> {
    Leaf(&'a Leaf<V>),
    Branch(&'a Branch),
}

// =============================================================================
// CritBitTree
// =============================================================================

/// An ordered map from byte strings to `V` backed by a crit-bit tree.
///
/// Nodes are kept in two arenas (leaves and branches) addressed by tagged
/// 32-bit pointers; slots freed by [`remove`](Self::remove) are reused by later
/// insertions.
#[derive(Clone)]
pub struct CritBitTree<V> {
    /// Leaf arena. `None` marks a free slot.
    leaves: Vec<Option<Leaf<V>>>,
    free_leaves: Vec<u32>,
    /// Branch arena. Free slots keep stale contents and are listed in `free_branches`.
    branches: Vec<Branch>,
    free_branches: Vec<u32>,
    root: Option<Ptr>,
    count: usize,
}

impl<V> CritBitTree<V> {
    pub fn new() -> Self {
        Self {
            leaves: Vec::new(),
            free_leaves: Vec::new(),
            branches: Vec::new(),
            free_branches: Vec::new(),
            root: None,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Removes every entry. Returns `false` if the tree was already empty.
    pub fn clear(&mut self) -> bool {
        if self.root.is_none() {
            return false;
        }
        tracing::trace!(entries = self.count, "clear");
        self.leaves.clear();
        self.free_leaves.clear();
        self.branches.clear();
        self.free_branches.clear();
        self.root = None;
        self.count = 0;
        true
    }

    /// Approximate heap bytes held by the node arenas, excluding value-owned heap data.
    pub fn memory_usage(&self) -> usize {
        let key_bytes: usize = self.leaves.iter().flatten().map(|l| l.key.len()).sum();
        key_bytes
            + self.leaves.capacity() * std::mem::size_of::<Option<Leaf<V>>>()
            + self.free_leaves.capacity() * 4
            + self.branches.capacity() * std::mem::size_of::<Branch>()
            + self.free_branches.capacity() * 4
    }

    pub fn shrink_to_fit(&mut self) {
        self.leaves.shrink_to_fit();
        self.free_leaves.shrink_to_fit();
        self.branches.shrink_to_fit();
        self.free_branches.shrink_to_fit();
    }

    // -------------------------------------------------------------------------
    // Arena access
    // -------------------------------------------------------------------------

    #[inline]
    fn node(&self, ptr: Ptr) -> NodeRef<'_, V> {
        if ptr.is_leaf() {
            NodeRef::Leaf(self.leaf(ptr))
        } else {
            NodeRef::Branch(&self.branches[ptr.index()])
        }
    }

    #[inline]
    fn leaf(&self, ptr: Ptr) -> &Leaf<V> {
        debug_assert!(ptr.is_leaf());
        self.leaves[ptr.index()]
            .as_ref()
            .expect("reachable leaf must be live")
    }

    #[inline]
    fn leaf_mut(&mut self, ptr: Ptr) -> &mut Leaf<V> {
        debug_assert!(ptr.is_leaf());
        self.leaves[ptr.index()]
            .as_mut()
            .expect("reachable leaf must be live")
    }

    fn alloc_leaf(&mut self, key: &[u8], value: V) -> Ptr {
        let leaf = Some(Leaf {
            key: key.into(),
            value,
        });
        let idx = match self.free_leaves.pop() {
            Some(idx) => {
                self.leaves[idx as usize] = leaf;
                idx
            }
            None => {
                self.leaves.push(leaf);
                (self.leaves.len() - 1) as u32
            }
        };
        Ptr::leaf(idx)
    }

    fn free_leaf(&mut self, ptr: Ptr) -> Leaf<V> {
        let leaf = self.leaves[ptr.index()]
            .take()
            .expect("freed leaf must be live");
        self.free_leaves.push(ptr.index() as u32);
        leaf
    }

    fn alloc_branch(&mut self, branch: Branch) -> Ptr {
        let idx = match self.free_branches.pop() {
            Some(idx) => {
                self.branches[idx as usize] = branch;
                idx
            }
            None => {
                self.branches.push(branch);
                (self.branches.len() - 1) as u32
            }
        };
        Ptr::branch(idx)
    }

    fn free_branch(&mut self, ptr: Ptr) {
        debug_assert!(!ptr.is_leaf());
        self.free_branches.push(ptr.index() as u32);
    }

    /// Points the slot `(branch, dir)` at `child`, or the root when `slot` is `None`.
    #[inline]
    fn set_slot(&mut self, slot: Option<(Ptr, usize)>, child: Ptr) {
        match slot {
            Some((branch, dir)) => self.branches[branch.index()].children[dir] = child,
            None => self.root = Some(child),
        }
    }

    /// Follows `key` through the branches to the leaf it would share the most bits with.
    fn nearest_leaf(&self, key: &[u8]) -> Option<Ptr> {
        let mut current = self.root?;
        while !current.is_leaf() {
            let branch = &self.branches[current.index()];
            current = branch.children[branch.disc.direction(key)];
        }
        Some(current)
    }
}

impl<V> CritBitTree<V> {
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let leaf = self.leaf(self.nearest_leaf(key)?);
        (*leaf.key == *key).then_some(&leaf.value)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let ptr = self.nearest_leaf(key)?;
        let leaf = self.leaf_mut(ptr);
        (*leaf.key == *key).then_some(&mut leaf.value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let Some(nearest) = self.nearest_leaf(key) else {
            self.root = Some(self.alloc_leaf(key, value));
            self.count = 1;
            return None;
        };

        let candidate = self.leaf_mut(nearest);
        let Some(crit) = critical_bit(&candidate.key, key) else {
            return Some(std::mem::replace(&mut candidate.value, value));
        };

        // Re-descend to the first subtree whose discriminator is not shallower
        // than the new one; the new branch takes its place.
        let mut slot: Option<(Ptr, usize)> = None;
        let mut current = self.root.expect("non-empty tree has a root");
        while !current.is_leaf() {
            let branch = &self.branches[current.index()];
            if branch.disc >= crit {
                break;
            }
            let dir = branch.disc.direction(key);
            slot = Some((current, dir));
            current = branch.children[dir];
        }

        let new_leaf = self.alloc_leaf(key, value);
        let new_dir = crit.direction(key);
        let mut children = [current; 2];
        children[new_dir] = new_leaf;
        let branch = self.alloc_branch(Branch {
            children,
            disc: crit,
        });
        self.set_slot(slot, branch);
        self.count += 1;

        tracing::trace!(pos = crit.pos(), bit = crit.bit(), "spliced branch");
        None
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        // (branch, taken direction) of the leaf's parent and grandparent.
        let mut parent: Option<(Ptr, usize)> = None;
        let mut grandparent: Option<(Ptr, usize)> = None;
        let mut current = self.root?;
        while !current.is_leaf() {
            let branch = &self.branches[current.index()];
            let dir = branch.disc.direction(key);
            grandparent = parent;
            parent = Some((current, dir));
            current = branch.children[dir];
        }

        if *self.leaf(current).key != *key {
            return None;
        }

        let removed = self.free_leaf(current);
        self.count -= 1;

        match parent {
            None => self.root = None,
            Some((parent_ptr, dir)) => {
                let parent_branch = self.branches[parent_ptr.index()];
                let sibling = parent_branch.children[1 - dir];
                self.free_branch(parent_ptr);
                self.set_slot(grandparent, sibling);
                tracing::trace!(
                    pos = parent_branch.disc.pos(),
                    bit = parent_branch.disc.bit(),
                    "collapsed branch"
                );
            }
        }

        Some(removed.value)
    }
}

impl<V> Default for CritBitTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for CritBitTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for CritBitTree<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for CritBitTree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}


#[cfg(test)]
mod proptests;
