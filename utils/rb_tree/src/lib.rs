//! A reusable ordered red-black tree container (spec §4.9).
//!
//! The original C implementation (`original_source/src/lib/rjs_rbt.c`) is
//! intrusive: nodes are embedded fields of the owning struct, linked by raw
//! `left`/`right`/`parent|color` pointers, and the caller is responsible for
//! positioning a new node via its own binary search before calling insert.
//! Per the teacher's own design notes on this kind of structure ("prefer
//! ownership-explicit containers keyed by handles; reserve intrusive layout
//! for the mark stack and the microtask queue where the allocation save
//! matters"), this rewrite keeps the shape of the operations
//! (`first`/`last`/`next`/`prev`/`insert`/`remove`) and the classic
//! three-case removal fixup, but backs the tree with an arena (`Vec<Node>`)
//! addressed by small integer handles instead of raw pointers, and does its
//! own key comparison during insertion rather than requiring the caller to
//! pre-position the node.

use std::cmp::Ordering;

/// A handle into a [`RbTree`]'s arena. Stable across insertions; invalidated
/// only by removing the node it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// An intrusive-style red-black tree, reimplemented over an arena of handles.
///
/// Used throughout the engine wherever an ordered container is needed over
/// a dynamic key set: the job queue's delay-ordered timers, and any
/// ordered-map built-in that needs deterministic iteration order by
/// insertion-adjacent key ordering.
pub struct RbTree<K, V> {
    arena: Vec<Option<Node<K, V>>>,
    root: Option<NodeId>,
    len: usize,
}

impl<K: Ord, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> RbTree<K, V> {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.arena[id.0].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.arena[id.0].as_mut().expect("dangling NodeId")
    }

    pub fn get(&self, id: NodeId) -> (&K, &V) {
        let n = self.node(id);
        (&n.key, &n.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.node_mut(id).value
    }

    /// Leftmost node: the minimum key.
    pub fn first(&self) -> Option<NodeId> {
        let mut cur = self.root?;
        while let Some(l) = self.node(cur).left {
            cur = l;
        }
        Some(cur)
    }

    /// Rightmost node: the maximum key.
    pub fn last(&self) -> Option<NodeId> {
        let mut cur = self.root?;
        while let Some(r) = self.node(cur).right {
            cur = r;
        }
        Some(cur)
    }

    /// In-order successor of `id`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        if let Some(mut cur) = self.node(id).right {
            while let Some(l) = self.node(cur).left {
                cur = l;
            }
            return Some(cur);
        }
        let mut cur = id;
        let mut parent = self.node(cur).parent;
        while let Some(p) = parent {
            if self.node(p).left == Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.node(p).parent;
        }
        None
    }

    /// In-order predecessor of `id`.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        if let Some(mut cur) = self.node(id).left {
            while let Some(r) = self.node(cur).right {
                cur = r;
            }
            return Some(cur);
        }
        let mut cur = id;
        let mut parent = self.node(cur).parent;
        while let Some(p) = parent {
            if self.node(p).right == Some(cur) {
                return Some(p);
            }
            cur = p;
            parent = self.node(p).parent;
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut cur = self.first();
        std::iter::from_fn(move || {
            let id = cur?;
            cur = self.next(id);
            Some(self.get(id))
        })
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.arena.push(Some(node));
        NodeId(self.arena.len() - 1)
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.node(id).color == Color::Red)
    }

    /// Inserts `key`/`value`, performing the binary search to find the
    /// insertion point internally (the arena rewrite's one behavioral
    /// departure from the intrusive original, which left positioning to the
    /// caller). Returns the new node's handle; if `key` already exists, the
    /// old value is replaced in place and its handle returned.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        let mut parent = None;
        let mut cur = self.root;
        let mut went_left = false;
        while let Some(id) = cur {
            parent = Some(id);
            match key.cmp(&self.node(id).key) {
                Ordering::Less => {
                    went_left = true;
                    cur = self.node(id).left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.node(id).right;
                }
                Ordering::Equal => {
                    self.node_mut(id).value = value;
                    return id;
                }
            }
        }

        let id = self.alloc(Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        self.len += 1;

        match parent {
            None => self.root = Some(id),
            Some(p) if went_left => self.node_mut(p).left = Some(id),
            Some(p) => self.node_mut(p).right = Some(id),
        }

        self.fixup_insert(id);
        id
    }

    fn rotate_left(&mut self, id: NodeId) {
        let r = self.node(id).right.expect("rotate_left needs a right child");
        let r_left = self.node(r).left;

        self.node_mut(id).right = r_left;
        if let Some(rl) = r_left {
            self.node_mut(rl).parent = Some(id);
        }

        let parent = self.node(id).parent;
        self.node_mut(r).parent = parent;
        match parent {
            None => self.root = Some(r),
            Some(p) if self.node(p).left == Some(id) => self.node_mut(p).left = Some(r),
            Some(p) => self.node_mut(p).right = Some(r),
        }

        self.node_mut(r).left = Some(id);
        self.node_mut(id).parent = Some(r);
    }

    fn rotate_right(&mut self, id: NodeId) {
        let l = self.node(id).left.expect("rotate_right needs a left child");
        let l_right = self.node(l).right;

        self.node_mut(id).left = l_right;
        if let Some(lr) = l_right {
            self.node_mut(lr).parent = Some(id);
        }

        let parent = self.node(id).parent;
        self.node_mut(l).parent = parent;
        match parent {
            None => self.root = Some(l),
            Some(p) if self.node(p).right == Some(id) => self.node_mut(p).right = Some(l),
            Some(p) => self.node_mut(p).left = Some(l),
        }

        self.node_mut(l).right = Some(id);
        self.node_mut(id).parent = Some(l);
    }

    fn fixup_insert(&mut self, mut id: NodeId) {
        while let Some(parent) = self.node(id).parent {
            if self.node(parent).color == Color::Black {
                break;
            }
            let grandparent = self.node(parent).parent.expect("red root is impossible");
            let parent_is_left = self.node(grandparent).left == Some(parent);
            let uncle = if parent_is_left {
                self.node(grandparent).right
            } else {
                self.node(grandparent).left
            };

            if self.is_red(uncle) {
                self.node_mut(parent).color = Color::Black;
                self.node_mut(uncle.expect("checked red above")).color = Color::Black;
                self.node_mut(grandparent).color = Color::Red;
                id = grandparent;
                continue;
            }

            if parent_is_left {
                if self.node(parent).right == Some(id) {
                    id = parent;
                    self.rotate_left(id);
                }
                let parent = self.node(id).parent.expect("just rotated");
                let grandparent = self.node(parent).parent.expect("just rotated");
                self.node_mut(parent).color = Color::Black;
                self.node_mut(grandparent).color = Color::Red;
                self.rotate_right(grandparent);
            } else {
                if self.node(parent).left == Some(id) {
                    id = parent;
                    self.rotate_right(id);
                }
                let parent = self.node(id).parent.expect("just rotated");
                let grandparent = self.node(parent).parent.expect("just rotated");
                self.node_mut(parent).color = Color::Black;
                self.node_mut(grandparent).color = Color::Red;
                self.rotate_left(grandparent);
            }
            break;
        }
        self.node_mut(self.root.expect("just inserted")).color = Color::Black;
    }

    /// Removes the node at `id`, returning its key/value.
    ///
    /// Handles the textbook three cases (zero, one, or two children) by
    /// splicing in the in-order successor when a node has two children,
    /// then rebalancing via the fixup walk - same structure as
    /// `rjs_rbt_remove`'s `zero_one_child`/two-children split.
    pub fn remove(&mut self, id: NodeId) -> (K, V) {
        self.len -= 1;

        let (left, right) = (self.node(id).left, self.node(id).right);
        let splice_target = if left.is_some() && right.is_some() {
            // Two children: splice out the in-order successor instead, and
            // move its key/value into `id`'s slot so the handle we return
            // data for is the one the caller asked to remove.
            let succ = self.next(id).expect("two children implies a successor");
            self.swap_key_value(id, succ);
            succ
        } else {
            id
        };

        let child = self
            .node(splice_target)
            .left
            .or(self.node(splice_target).right);
        let parent = self.node(splice_target).parent;
        let was_black = self.node(splice_target).color == Color::Black;

        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(p) if self.node(p).left == Some(splice_target) => self.node_mut(p).left = child,
            Some(p) => self.node_mut(p).right = child,
        }

        if was_black {
            self.fixup_remove(child, parent);
        }

        let removed = self.arena[splice_target.0].take().expect("just spliced");
        (removed.key, removed.value)
    }

    fn swap_key_value(&mut self, a: NodeId, b: NodeId) {
        // Only keys/values move; structural links (color/parent/children)
        // stay with their original arena slot so in-flight handles to the
        // untouched node keep pointing at a tree-structurally valid slot.
        let (a_ptr, b_ptr) = (a.0, b.0);
        self.arena.swap(a_ptr, b_ptr);
        // After swapping the whole Node, restore the structural fields of
        // each slot (they describe *position*, which didn't move) while
        // letting key/value (the *content*) ride along with the swap.
        let a_node = self.arena[a_ptr].take().expect("present");
        let b_node = self.arena[b_ptr].take().expect("present");
        self.arena[a_ptr] = Some(Node {
            key: b_node.key,
            value: b_node.value,
            color: a_node.color,
            parent: a_node.parent,
            left: a_node.left,
            right: a_node.right,
        });
        self.arena[b_ptr] = Some(Node {
            key: a_node.key,
            value: a_node.value,
            color: b_node.color,
            parent: b_node.parent,
            left: b_node.left,
            right: b_node.right,
        });
    }

    fn fixup_remove(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while node != self.root && !self.is_red(node) {
            let p = match parent {
                Some(p) => p,
                None => break,
            };
            let node_is_left = self.node(p).left == node;
            let mut sibling = if node_is_left {
                self.node(p).right
            } else {
                self.node(p).left
            };

            if self.is_red(sibling) {
                let s = sibling.expect("checked red");
                self.node_mut(s).color = Color::Black;
                self.node_mut(p).color = Color::Red;
                if node_is_left {
                    self.rotate_left(p);
                } else {
                    self.rotate_right(p);
                }
                sibling = if node_is_left { self.node(p).right } else { self.node(p).left };
            }

            let s = match sibling {
                Some(s) => s,
                None => break,
            };
            let s_left_red = self.is_red(self.node(s).left);
            let s_right_red = self.is_red(self.node(s).right);

            if !s_left_red && !s_right_red {
                self.node_mut(s).color = Color::Red;
                node = Some(p);
                parent = self.node(p).parent;
                continue;
            }

            if node_is_left {
                if !s_right_red {
                    if let Some(sl) = self.node(s).left {
                        self.node_mut(sl).color = Color::Black;
                    }
                    self.node_mut(s).color = Color::Red;
                    self.rotate_right(s);
                }
                let s = self.node(p).right.expect("sibling still on the right");
                self.node_mut(s).color = self.node(p).color;
                self.node_mut(p).color = Color::Black;
                if let Some(sr) = self.node(s).right {
                    self.node_mut(sr).color = Color::Black;
                }
                self.rotate_left(p);
            } else {
                if !s_left_red {
                    if let Some(sr) = self.node(s).right {
                        self.node_mut(sr).color = Color::Black;
                    }
                    self.node_mut(s).color = Color::Red;
                    self.rotate_left(s);
                }
                let s = self.node(p).left.expect("sibling still on the left");
                self.node_mut(s).color = self.node(p).color;
                self.node_mut(p).color = Color::Black;
                if let Some(sl) = self.node(s).left {
                    self.node_mut(sl).color = Color::Black;
                }
                self.rotate_right(p);
            }
            node = self.root;
            parent = None;
        }
        if let Some(n) = node {
            self.node_mut(n).color = Color::Black;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_iteration_after_scattered_inserts() {
        let mut t = RbTree::new();
        for k in [5, 1, 9, 3, 7, 2, 8, 4, 6, 0] {
            t.insert(k, k.to_string());
        }
        let keys: Vec<_> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn first_last_next_prev_round_trip() {
        let mut t = RbTree::new();
        let ids: Vec<_> = (0..20).map(|k| t.insert(k, ())).collect();
        assert_eq!(t.get(t.first().unwrap()).0, &0);
        assert_eq!(t.get(t.last().unwrap()).0, &19);

        let mut forward = vec![];
        let mut cur = t.first();
        while let Some(id) = cur {
            forward.push(*t.get(id).0);
            cur = t.next(id);
        }
        assert_eq!(forward, (0..20).collect::<Vec<_>>());

        let mut backward = vec![];
        let mut cur = t.last();
        while let Some(id) = cur {
            backward.push(*t.get(id).0);
            cur = t.prev(id);
        }
        assert_eq!(backward, (0..20).rev().collect::<Vec<_>>());

        let _ = ids;
    }

    #[test]
    fn remove_every_node_in_random_order_keeps_order_invariant() {
        let mut t = RbTree::new();
        let mut ids = vec![];
        for k in 0..50 {
            ids.push((k, t.insert(k, k)));
        }
        // remove in a scattered order: evens first, then odds
        for &(k, id) in ids.iter().filter(|(k, _)| k % 2 == 0) {
            let (rk, rv) = t.remove(id);
            assert_eq!(rk, k);
            assert_eq!(rv, k);
        }
        let remaining: Vec<_> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(remaining, (0..50).filter(|k| k % 2 != 0).collect::<Vec<_>>());
        assert_eq!(t.len(), 25);
    }
}
