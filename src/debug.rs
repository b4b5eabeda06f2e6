//! Diagnostics over the raw node graph: Graphviz export and integrity checks.
//!
//! Both read node shape directly rather than going through the map API, and
//! their output format is not part of the stable interface.

use std::io::{self, Write};

use crate::bits::critical_bit;
use crate::{CritBitTree, Discriminator, NodeRef, Ptr};

impl<V> CritBitTree<V> {
    /// Writes the tree as a Graphviz `dot` graph.
    ///
    /// Leaves are labelled with their key (lossy UTF-8), branches with
    /// `pos:<byte offset>, bit:<bit index>`, where bit 8 is the end-of-key
    /// flag and bits 7..=0 are the byte's bits from most to least significant.
    pub fn write_dot<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "digraph critbit {{")?;
        writeln!(w, "    node [style=filled];")?;

        // Pre-order, child 0 first: (node, parent id).
        let mut stack: Vec<(Ptr, Option<usize>)> = Vec::new();
        stack.extend(self.root.map(|root| (root, None)));
        let mut next_id = 0usize;
        while let Some((ptr, parent)) = stack.pop() {
            let id = next_id;
            next_id += 1;
            match self.node(ptr) {
                NodeRef::Leaf(leaf) => {
                    let label = String::from_utf8_lossy(&leaf.key);
                    writeln!(w, "    n{id} [label={label:?}];")?;
                }
                NodeRef::Branch(branch) => {
                    writeln!(
                        w,
                        "    n{id} [label=\"pos:{}, bit:{}\"];",
                        branch.disc.pos(),
                        branch.disc.bit()
                    )?;
                    stack.push((branch.children[1], Some(id)));
                    stack.push((branch.children[0], Some(id)));
                }
            }
            if let Some(parent) = parent {
                writeln!(w, "    n{parent} -> n{id};")?;
            }
        }

        writeln!(w, "}}")
    }

    /// Convenience wrapper around [`write_dot`](Self::write_dot).
    pub fn to_dot(&self) -> String {
        let mut buf = Vec::new();
        self.write_dot(&mut buf)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Verify tree integrity - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen = Seen {
            leaves: vec![false; self.leaves.len()],
            branches: vec![false; self.branches.len()],
            leaf_count: 0,
            branch_count: 0,
        };

        if let Some(root) = self.root {
            let mut path = Vec::new();
            self.verify_node(root, &mut path, &mut seen, &mut issues);
        }

        if seen.leaf_count != self.count {
            issues.push(format!(
                "reachable leaves {} != len {}",
                seen.leaf_count, self.count
            ));
        }
        if self.count > 0 && seen.branch_count != self.count - 1 {
            issues.push(format!(
                "{} branches for {} leaves",
                seen.branch_count, self.count
            ));
        }
        if self.root.is_none() && self.count != 0 {
            issues.push(format!("no root but len {}", self.count));
        }

        let live_leaves = self.leaves.iter().flatten().count();
        if live_leaves != seen.leaf_count {
            issues.push(format!(
                "{live_leaves} live leaf slots, {} reachable",
                seen.leaf_count
            ));
        }
        let live_branches = self.branches.len() - self.free_branches.len();
        if live_branches != seen.branch_count {
            issues.push(format!(
                "{live_branches} live branch slots, {} reachable",
                seen.branch_count
            ));
        }

        issues
    }

    /// Checks the subtree at `ptr` and returns the key of its first leaf.
    fn verify_node<'a>(
        &'a self,
        ptr: Ptr,
        path: &mut Vec<(Discriminator, usize)>,
        seen: &mut Seen,
        issues: &mut Vec<String>,
    ) -> Option<&'a [u8]> {
        let (visited, idx) = if ptr.is_leaf() {
            (&mut seen.leaves, ptr.index())
        } else {
            (&mut seen.branches, ptr.index())
        };
        match visited.get_mut(idx) {
            Some(true) => {
                issues.push(format!("{ptr:?} reached twice"));
                return None;
            }
            Some(flag) => *flag = true,
            None => {
                issues.push(format!("{ptr:?} out of arena bounds"));
                return None;
            }
        }

        if ptr.is_leaf() {
            seen.leaf_count += 1;
            let Some(leaf) = self.leaves[idx].as_ref() else {
                issues.push(format!("{ptr:?} points at a freed leaf slot"));
                return None;
            };
            for &(disc, dir) in path.iter() {
                if disc.direction(&leaf.key) != dir {
                    issues.push(format!(
                        "leaf {:?} sits on side {dir} of {disc:?}",
                        String::from_utf8_lossy(&leaf.key)
                    ));
                }
            }
            return Some(&leaf.key[..]);
        }

        seen.branch_count += 1;
        let branch = self.branches[idx];
        if let Some(&(parent, _)) = path.last() {
            if branch.disc <= parent {
                issues.push(format!(
                    "branch {:?} is not deeper than its parent {parent:?}",
                    branch.disc
                ));
            }
        }

        let mut first_keys = [None; 2];
        for (dir, first_key) in first_keys.iter_mut().enumerate() {
            path.push((branch.disc, dir));
            *first_key = self.verify_node(branch.children[dir], path, seen, issues);
            path.pop();
        }

        if let [Some(left), Some(right)] = first_keys {
            if critical_bit(left, right) != Some(branch.disc) {
                issues.push(format!(
                    "branch {:?} does not split {:?} from {:?}",
                    branch.disc,
                    String::from_utf8_lossy(left),
                    String::from_utf8_lossy(right)
                ));
            }
        }
        first_keys[0]
    }
}

struct Seen {
    leaves: Vec<bool>,
    branches: Vec<bool>,
    leaf_count: usize,
    branch_count: usize,
}
