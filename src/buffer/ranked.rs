//! Order-statistics tree.
//!
//! A treap whose nodes live in a `Vec` arena and carry their subtree size,
//! so that inserting at a rank, removing at a rank and finding the rank of
//! an entry are all O(log n) expected. Ordering is not stored in the tree:
//! callers locate positions with a comparison closure and then edit by rank.
//!
//! Every entry also carries a mark, and subtrees count their marked entries,
//! so the number of marked entries before a rank is O(log n) as well.

use std::cmp::Ordering;

/// Sentinel for "no child".
const NIL: usize = usize::MAX;

/// Stable handle to an entry. Stays valid until that entry is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct Node<E> {
    entry: Option<E>,
    left: usize,
    right: usize,
    size: usize,
    marked: bool,
    marked_size: usize,
    priority: u64,
}

#[derive(Clone, Debug)]
pub struct RankedTree<E> {
    nodes: Vec<Node<E>>,
    free: Vec<usize>,
    root: usize,
    seed: u64,
}

/// splitmix64, deterministic so that runs are reproducible.
fn next_priority(seed: &mut u64) -> u64 {
    *seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *seed;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl<E> RankedTree<E> {
    pub fn new() -> Self {
        RankedTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            seed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root == NIL
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = NIL;
    }

    #[inline]
    fn size(&self, n: usize) -> usize {
        if n == NIL {
            0
        } else {
            self.nodes[n].size
        }
    }

    #[inline]
    fn marked_size(&self, n: usize) -> usize {
        if n == NIL {
            0
        } else {
            self.nodes[n].marked_size
        }
    }

    fn update(&mut self, n: usize) {
        let (left, right) = (self.nodes[n].left, self.nodes[n].right);
        self.nodes[n].size = 1 + self.size(left) + self.size(right);
        self.nodes[n].marked_size =
            usize::from(self.nodes[n].marked) + self.marked_size(left) + self.marked_size(right);
    }

    fn alloc(&mut self, entry: E, marked: bool) -> usize {
        let node = Node {
            entry: Some(entry),
            left: NIL,
            right: NIL,
            size: 1,
            marked,
            marked_size: usize::from(marked),
            priority: next_priority(&mut self.seed),
        };
        match self.free.pop() {
            Some(n) => {
                self.nodes[n] = node;
                n
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Splits `t` into its first `k` entries and the rest.
    fn split(&mut self, t: usize, k: usize) -> (usize, usize) {
        if t == NIL {
            return (NIL, NIL);
        }
        let left_size = self.size(self.nodes[t].left);
        if k <= left_size {
            let (a, b) = self.split(self.nodes[t].left, k);
            self.nodes[t].left = b;
            self.update(t);
            (a, t)
        } else {
            let (a, b) = self.split(self.nodes[t].right, k - left_size - 1);
            self.nodes[t].right = a;
            self.update(t);
            (t, b)
        }
    }

    fn merge(&mut self, a: usize, b: usize) -> usize {
        if a == NIL {
            return b;
        }
        if b == NIL {
            return a;
        }
        if self.nodes[a].priority > self.nodes[b].priority {
            let right = self.merge(self.nodes[a].right, b);
            self.nodes[a].right = right;
            self.update(a);
            a
        } else {
            let left = self.merge(a, self.nodes[b].left);
            self.nodes[b].left = left;
            self.update(b);
            b
        }
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    /// Inserts so that the new entry ends up at `rank` (clamped to `len`).
    /// The entry is marked.
    pub fn insert_at(&mut self, rank: usize, entry: E) -> NodeId {
        self.insert_marked(rank, entry, true)
    }

    pub fn insert_marked(&mut self, rank: usize, entry: E, marked: bool) -> NodeId {
        let n = self.alloc(entry, marked);
        let rank = rank.min(self.len());
        let (a, b) = self.split(self.root, rank);
        let left = self.merge(a, n);
        self.root = self.merge(left, b);
        NodeId(n)
    }

    pub fn remove_at(&mut self, rank: usize) -> Option<E> {
        if rank >= self.len() {
            return None;
        }
        let (a, b) = self.split(self.root, rank);
        let (m, c) = self.split(b, 1);
        self.root = self.merge(a, c);

        let entry = self.nodes[m].entry.take();
        self.nodes[m].left = NIL;
        self.nodes[m].right = NIL;
        self.free.push(m);
        entry
    }

    pub fn get(&self, mut rank: usize) -> Option<&E> {
        let mut t = self.root;
        while t != NIL {
            let left_size = self.size(self.nodes[t].left);
            match rank.cmp(&left_size) {
                Ordering::Less => t = self.nodes[t].left,
                Ordering::Equal => return self.nodes[t].entry.as_ref(),
                Ordering::Greater => {
                    rank -= left_size + 1;
                    t = self.nodes[t].right;
                }
            }
        }
        None
    }

    pub fn marked_len(&self) -> usize {
        self.marked_size(self.root)
    }

    /// Number of marked entries ranked strictly before `rank`.
    pub fn marked_before(&self, mut rank: usize) -> usize {
        let mut t = self.root;
        let mut marked = 0;
        while t != NIL && rank > 0 {
            let node = &self.nodes[t];
            let left_size = self.size(node.left);
            if rank <= left_size {
                t = node.left;
            } else {
                marked += self.marked_size(node.left) + usize::from(node.marked);
                rank -= left_size + 1;
                t = node.right;
            }
        }
        marked
    }

    pub fn is_marked(&self, mut rank: usize) -> bool {
        let mut t = self.root;
        while t != NIL {
            let left_size = self.size(self.nodes[t].left);
            match rank.cmp(&left_size) {
                Ordering::Less => t = self.nodes[t].left,
                Ordering::Equal => return self.nodes[t].marked,
                Ordering::Greater => {
                    rank -= left_size + 1;
                    t = self.nodes[t].right;
                }
            }
        }
        false
    }

    /// Recomputes every mark with `mark`, in rank order.
    pub fn remark(&mut self, mut mark: impl FnMut(&E) -> bool) {
        let root = self.root;
        self.remark_subtree(root, &mut mark);
    }

    fn remark_subtree(&mut self, t: usize, mark: &mut impl FnMut(&E) -> bool) {
        if t == NIL {
            return;
        }
        let (left, right) = (self.nodes[t].left, self.nodes[t].right);
        self.remark_subtree(left, mark);
        self.nodes[t].marked = match self.nodes[t].entry.as_ref() {
            Some(entry) => mark(entry),
            None => unreachable!("live tree node without an entry"),
        };
        self.remark_subtree(right, mark);
        self.update(t);
    }

    pub fn entry(&self, node: NodeId) -> Option<&E> {
        self.nodes.get(node.0)?.entry.as_ref()
    }

    /// Binary search by a closure that orders each visited entry against the
    /// target, like `slice::binary_search_by`.
    ///
    /// `Ok(rank)` if an entry compares equal, otherwise `Err(rank)` where the
    /// target would be inserted.
    pub fn search_by(&self, mut compare: impl FnMut(&E) -> Ordering) -> Result<usize, usize> {
        let mut t = self.root;
        let mut before = 0;
        while t != NIL {
            let node = &self.nodes[t];
            let ordering = match node.entry.as_ref() {
                Some(entry) => compare(entry),
                None => unreachable!("live tree node without an entry"),
            };
            match ordering {
                Ordering::Less => {
                    before += self.size(node.left) + 1;
                    t = node.right;
                }
                Ordering::Greater => t = node.left,
                Ordering::Equal => return Ok(before + self.size(node.left)),
            }
        }
        Err(before)
    }

    /// Current rank of a live entry, located through `compare`, which must
    /// be the ordering the tree was built with.
    pub fn rank_of(&self, node: NodeId, compare: impl Fn(&E, &E) -> Ordering) -> Option<usize> {
        let target = self.entry(node)?;
        self.search_by(|entry| compare(entry, target)).ok()
    }

    pub fn iter(&self) -> Iter<'_, E> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.descend(self.root);
        iter
    }
}

impl<E> Default for RankedTree<E> {
    fn default() -> Self {
        RankedTree::new()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// In-order iterator.
pub struct Iter<'a, E> {
    tree: &'a RankedTree<E>,
    stack: Vec<usize>,
    remaining: usize,
}

impl<'a, E> Iter<'a, E> {
    fn descend(&mut self, mut t: usize) {
        while t != NIL {
            self.stack.push(t);
            t = self.tree.nodes[t].left;
        }
    }
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        let t = self.stack.pop()?;
        self.descend(self.tree.nodes[t].right);
        self.remaining -= 1;
        self.tree.nodes[t].entry.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, E> ExactSizeIterator for Iter<'a, E> {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
