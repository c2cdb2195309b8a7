//! Insertion-ordered map backed by a balanced search tree.
//!
//! This module provides [`OrderedMap`], the container behind JSON objects and
//! untyped maps. It keeps two topologies over the same set of nodes:
//!
//! - **Tree links**: an AVL tree ordered by a [`Comparator`], giving O(log n)
//!   insert, lookup and removal.
//! - **Order links**: a doubly linked list threading every node in insertion
//!   order through a sentinel header, giving O(1) access to the first and last
//!   entries and stable iteration.
//!
//! Rotations only ever touch the tree links. The order links are spliced when a
//! node is inserted or removed, never while rebalancing.
//!
//! ## Examples
//!
//! ```rust
//! use jsonbind::OrderedMap;
//!
//! let mut map = OrderedMap::new();
//! map.insert("a", 1);
//! map.insert("c", 2);
//! map.insert("b", 3);
//!
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, vec!["a", "c", "b"]);
//!
//! let sorted: Vec<_> = map.iter_sorted().map(|(k, _)| *k).collect();
//! assert_eq!(sorted, vec!["a", "b", "c"]);
//! ```

use std::any::type_name;
use std::borrow::Borrow;
use std::cmp::{max, Ordering};
use std::convert::Infallible;
use std::fmt;

use crate::error::{Error, Result};

const NIL: usize = usize::MAX;
const HEADER: usize = usize::MAX - 1;

/// A possibly partial ordering over map keys.
///
/// Returning `None` marks a pair of keys as incomparable. Inserting such a key
/// fails with [`Error::NotComparable`]; looking one up reports it as absent.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Option<Ordering>;
}

/// A comparator that orders every pair of keys, enabling infallible inserts.
pub trait TotalComparator<K: ?Sized>: Comparator<K> {
    fn compare_total(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their own [`PartialOrd`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: PartialOrd + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Option<Ordering> {
        a.partial_cmp(b)
    }
}

impl<K: Ord + ?Sized> TotalComparator<K> for NaturalOrder {
    #[inline]
    fn compare_total(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys with a caller-supplied total ordering function.
///
/// # Examples
///
/// ```rust
/// use jsonbind::{FnOrder, OrderedMap};
///
/// let mut map = OrderedMap::with_comparator(FnOrder(|a: &i32, b: &i32| b.cmp(a)));
/// map.insert(1, "one");
/// map.insert(3, "three");
/// map.insert(2, "two");
///
/// let descending: Vec<_> = map.iter_sorted().map(|(k, _)| *k).collect();
/// assert_eq!(descending, vec![3, 2, 1]);
/// ```
#[derive(Clone, Copy)]
pub struct FnOrder<F>(pub F);

impl<F> fmt::Debug for FnOrder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnOrder")
    }
}

impl<K: ?Sized, F: Fn(&K, &K) -> Ordering> Comparator<K> for FnOrder<F> {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Option<Ordering> {
        Some((self.0)(a, b))
    }
}

impl<K: ?Sized, F: Fn(&K, &K) -> Ordering> TotalComparator<K> for FnOrder<F> {
    #[inline]
    fn compare_total(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

fn split_entry<K, V>(node: &mut Node<K, V>) -> (&K, &mut V) {
    (&node.key, &mut node.value)
}

#[derive(Debug, Clone, Copy)]
struct Links {
    prev: usize,
    next: usize,
}

#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    parent: usize,
    left: usize,
    right: usize,
    height: usize,
    order: Links,
}

enum Lookup {
    Empty,
    Found(usize),
    Vacant { parent: usize, ordering: Ordering },
}

/// A map that iterates in insertion order and searches in comparator order.
///
/// Re-inserting an existing key replaces its value without moving it. Two maps
/// are equal when they hold the same entries, whatever their insertion order.
///
/// # Examples
///
/// ```rust
/// use jsonbind::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.insert("first".to_string(), 1);
/// map.insert("second".to_string(), 2);
/// assert_eq!(map.insert("first".to_string(), 10), Some(1));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Clone)]
pub struct OrderedMap<K, V, C = NaturalOrder> {
    nodes: Vec<Node<K, V>>,
    header: Links,
    root: usize,
    comparator: C,
}

impl<K, V> OrderedMap<K, V, NaturalOrder> {
    /// Creates an empty map ordered by the keys' natural order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> OrderedMap<K, V, C> {
    /// Creates an empty map ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        OrderedMap {
            nodes: Vec::new(),
            header: Links {
                prev: HEADER,
                next: HEADER,
            },
            root: NIL,
            comparator,
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the comparator ordering this map.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = NIL;
        self.header = Links {
            prev: HEADER,
            next: HEADER,
        };
    }

    /// Returns the oldest entry still in the map.
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entry_at(self.header.next)
    }

    /// Returns the most recently inserted entry.
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.entry_at(self.header.prev)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.header.next,
            back: self.header.prev,
            remaining: self.nodes.len(),
        }
    }

    /// Iterates entries in insertion order with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.order();
        let mut slots: Vec<Option<&mut Node<K, V>>> = self.nodes.iter_mut().map(Some).collect();
        let entries: Vec<(&K, &mut V)> = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .map(split_entry)
            .collect();
        IterMut {
            inner: entries.into_iter(),
        }
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Iterates mutable values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }

    /// Iterates entries in ascending comparator order (an in-order tree walk).
    pub fn iter_sorted(&self) -> Sorted<'_, K, V> {
        Sorted {
            nodes: &self.nodes,
            cursor: self.subtree_first(self.root),
        }
    }

    /// Looks up the value for `key`. Incomparable keys are reported as absent.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).map(|index| &self.nodes[index].value)
    }

    /// Looks up the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).and_then(|index| self.entry_at(index))
    }

    /// Looks up a mutable value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let index = self.find(key)?;
        Some(&mut self.nodes[index].value)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).is_some()
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let index = self.find(key)?;
        Some(self.remove_at(index))
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.header.next;
        while cursor != HEADER {
            let mut next = self.nodes[cursor].order.next;
            let node = &mut self.nodes[cursor];
            if !keep(&node.key, &mut node.value) {
                let moved_from = self.nodes.len() - 1;
                self.remove_at(cursor);
                if next == moved_from {
                    next = cursor;
                }
            }
            cursor = next;
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut cursor = self.root;
        while cursor != NIL {
            let node = &self.nodes[cursor];
            cursor = match self.comparator.compare(key, node.key.borrow())? {
                Ordering::Equal => return Some(cursor),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    fn locate<E>(
        &self,
        key: &K,
        order: &impl Fn(&C, &K, &K) -> std::result::Result<Ordering, E>,
    ) -> std::result::Result<Lookup, E> {
        let mut cursor = self.root;
        if cursor == NIL {
            return Ok(Lookup::Empty);
        }
        loop {
            let node = &self.nodes[cursor];
            let ordering = order(&self.comparator, key, &node.key)?;
            let child = match ordering {
                Ordering::Equal => return Ok(Lookup::Found(cursor)),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            if child == NIL {
                return Ok(Lookup::Vacant {
                    parent: cursor,
                    ordering,
                });
            }
            cursor = child;
        }
    }

    fn insert_with<E>(
        &mut self,
        key: K,
        value: V,
        order: impl Fn(&C, &K, &K) -> std::result::Result<Ordering, E>,
    ) -> std::result::Result<Option<V>, E> {
        let (parent, ordering) = match self.locate(&key, &order)? {
            Lookup::Found(index) => {
                return Ok(Some(std::mem::replace(&mut self.nodes[index].value, value)));
            }
            Lookup::Empty => (NIL, Ordering::Equal),
            Lookup::Vacant { parent, ordering } => (parent, ordering),
        };

        let index = self.nodes.len();
        let tail = self.header.prev;
        self.nodes.push(Node {
            key,
            value,
            parent,
            left: NIL,
            right: NIL,
            height: 1,
            order: Links {
                prev: tail,
                next: HEADER,
            },
        });
        self.links_mut(tail).next = index;
        self.header.prev = index;

        if parent == NIL {
            self.root = index;
        } else {
            if ordering == Ordering::Less {
                self.nodes[parent].left = index;
            } else {
                self.nodes[parent].right = index;
            }
            self.rebalance(parent, true);
        }
        Ok(None)
    }

    fn remove_at(&mut self, index: usize) -> (K, V) {
        let Links { prev, next } = self.nodes[index].order;
        self.links_mut(prev).next = next;
        self.links_mut(next).prev = prev;
        self.detach(index);

        let removed = self.nodes.swap_remove(index);
        if index < self.nodes.len() {
            self.relocate(self.nodes.len(), index);
        }
        (removed.key, removed.value)
    }

    /// Removes `node` from the tree only. A node with two children is replaced
    /// by its in-order neighbour, whose order links stay untouched.
    fn detach(&mut self, node: usize) {
        let Node {
            left,
            right,
            parent: original_parent,
            ..
        } = self.nodes[node];

        if left != NIL && right != NIL {
            let adjacent = if self.height(left) > self.height(right) {
                self.subtree_last(left)
            } else {
                self.subtree_first(right)
            };
            self.detach(adjacent);

            let mut left_height = 0;
            let left = self.nodes[node].left;
            if left != NIL {
                left_height = self.nodes[left].height;
                self.nodes[adjacent].left = left;
                self.nodes[left].parent = adjacent;
                self.nodes[node].left = NIL;
            }
            let mut right_height = 0;
            let right = self.nodes[node].right;
            if right != NIL {
                right_height = self.nodes[right].height;
                self.nodes[adjacent].right = right;
                self.nodes[right].parent = adjacent;
                self.nodes[node].right = NIL;
            }
            self.nodes[adjacent].height = max(left_height, right_height) + 1;
            self.replace_in_parent(node, adjacent);
            return;
        } else if left != NIL {
            self.replace_in_parent(node, left);
            self.nodes[node].left = NIL;
        } else if right != NIL {
            self.replace_in_parent(node, right);
            self.nodes[node].right = NIL;
        } else {
            self.replace_in_parent(node, NIL);
        }
        self.rebalance(original_parent, false);
    }

    /// Repoints every link that referenced slot `from` at slot `to`.
    fn relocate(&mut self, from: usize, to: usize) {
        let Node {
            parent,
            left,
            right,
            order,
            ..
        } = self.nodes[to];
        if parent == NIL {
            self.root = to;
        } else if self.nodes[parent].left == from {
            self.nodes[parent].left = to;
        } else {
            self.nodes[parent].right = to;
        }
        if left != NIL {
            self.nodes[left].parent = to;
        }
        if right != NIL {
            self.nodes[right].parent = to;
        }
        self.links_mut(order.prev).next = to;
        self.links_mut(order.next).prev = to;
    }

    fn replace_in_parent(&mut self, node: usize, replacement: usize) {
        let parent = self.nodes[node].parent;
        self.nodes[node].parent = NIL;
        if replacement != NIL {
            self.nodes[replacement].parent = parent;
        }
        if parent == NIL {
            self.root = replacement;
        } else if self.nodes[parent].left == node {
            self.nodes[parent].left = replacement;
        } else {
            self.nodes[parent].right = replacement;
        }
    }

    fn rebalance(&mut self, unbalanced: usize, insert: bool) {
        let mut node = unbalanced;
        while node != NIL {
            let left = self.nodes[node].left;
            let right = self.nodes[node].right;
            let left_height = self.height(left);
            let right_height = self.height(right);

            match left_height as isize - right_height as isize {
                -2 => {
                    let right_delta = self.height(self.nodes[right].left) as isize
                        - self.height(self.nodes[right].right) as isize;
                    if right_delta == -1 || (right_delta == 0 && !insert) {
                        self.rotate_left(node);
                    } else {
                        self.rotate_right(right);
                        self.rotate_left(node);
                    }
                    if insert {
                        break;
                    }
                }
                2 => {
                    let left_delta = self.height(self.nodes[left].left) as isize
                        - self.height(self.nodes[left].right) as isize;
                    if left_delta == 1 || (left_delta == 0 && !insert) {
                        self.rotate_right(node);
                    } else {
                        self.rotate_left(left);
                        self.rotate_right(node);
                    }
                    if insert {
                        break;
                    }
                }
                0 => {
                    self.nodes[node].height = left_height + 1;
                    if insert {
                        break;
                    }
                }
                _ => {
                    self.nodes[node].height = max(left_height, right_height) + 1;
                    if !insert {
                        break;
                    }
                }
            }
            node = self.nodes[node].parent;
        }
    }

    fn rotate_left(&mut self, root: usize) {
        let left = self.nodes[root].left;
        let pivot = self.nodes[root].right;
        let pivot_left = self.nodes[pivot].left;
        let pivot_right = self.nodes[pivot].right;

        self.nodes[root].right = pivot_left;
        if pivot_left != NIL {
            self.nodes[pivot_left].parent = root;
        }
        self.replace_in_parent(root, pivot);
        self.nodes[pivot].left = root;
        self.nodes[root].parent = pivot;

        self.nodes[root].height = max(self.height(left), self.height(pivot_left)) + 1;
        self.nodes[pivot].height = max(self.nodes[root].height, self.height(pivot_right)) + 1;
    }

    fn rotate_right(&mut self, root: usize) {
        let pivot = self.nodes[root].left;
        let right = self.nodes[root].right;
        let pivot_left = self.nodes[pivot].left;
        let pivot_right = self.nodes[pivot].right;

        self.nodes[root].left = pivot_right;
        if pivot_right != NIL {
            self.nodes[pivot_right].parent = root;
        }
        self.replace_in_parent(root, pivot);
        self.nodes[pivot].right = root;
        self.nodes[root].parent = pivot;

        self.nodes[root].height = max(self.height(right), self.height(pivot_right)) + 1;
        self.nodes[pivot].height = max(self.nodes[root].height, self.height(pivot_left)) + 1;
    }

    #[inline]
    fn height(&self, index: usize) -> usize {
        if index == NIL {
            0
        } else {
            self.nodes[index].height
        }
    }

    fn subtree_first(&self, mut index: usize) -> usize {
        while index != NIL && self.nodes[index].left != NIL {
            index = self.nodes[index].left;
        }
        index
    }

    fn subtree_last(&self, mut index: usize) -> usize {
        while index != NIL && self.nodes[index].right != NIL {
            index = self.nodes[index].right;
        }
        index
    }

    fn links_mut(&mut self, index: usize) -> &mut Links {
        if index == HEADER {
            &mut self.header
        } else {
            &mut self.nodes[index].order
        }
    }

    fn entry_at(&self, index: usize) -> Option<(&K, &V)> {
        self.nodes.get(index).map(|node| (&node.key, &node.value))
    }

    fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.header.next;
        while cursor != HEADER {
            order.push(cursor);
            cursor = self.nodes[cursor].order.next;
        }
        order
    }
}

impl<K, V, C: Comparator<K>> OrderedMap<K, V, C> {
    /// Inserts `key`, returning the previous value if it was present.
    ///
    /// Fails with [`Error::NotComparable`] when the comparator cannot order the
    /// key; the map is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonbind::{Error, OrderedMap};
    ///
    /// let mut map = OrderedMap::new();
    /// assert_eq!(map.try_insert(1.5, "a"), Ok(None));
    /// assert!(matches!(map.try_insert(f64::NAN, "b"), Err(Error::NotComparable { .. })));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let not_comparable = || Error::NotComparable {
            key: format!("of type {}", type_name::<K>()),
        };
        if self.comparator.compare(&key, &key) != Some(Ordering::Equal) {
            return Err(not_comparable());
        }
        self.insert_with(key, value, |c, a, b| c.compare(a, b).ok_or(()))
            .map_err(|()| not_comparable())
    }
}

impl<K, V, C: TotalComparator<K>> OrderedMap<K, V, C> {
    /// Inserts `key`, returning the previous value if it was present.
    ///
    /// An existing key keeps its insertion-order position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.insert_with(key, value, |c, a, b| {
            Ok::<Ordering, Infallible>(c.compare_total(a, b))
        }) {
            Ok(previous) => previous,
            Err(never) => match never {},
        }
    }
}

impl<K, V, C: Default> Default for OrderedMap<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for OrderedMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V: PartialEq, C: Comparator<K>> PartialEq for OrderedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, C> FromIterator<(K, V)> for OrderedMap<K, V, C>
where
    C: TotalComparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C: TotalComparator<K>> Extend<(K, V)> for OrderedMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrderedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C> IntoIterator for OrderedMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        let order = self.order();
        let mut slots: Vec<Option<Node<K, V>>> = self.nodes.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .map(|node| (node.key, node.value))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// Insertion-order iterator over an [`OrderedMap`].
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.front];
        self.front = node.order.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.back];
        self.back = node.order.prev;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Insertion-order iterator with mutable values.
pub struct IterMut<'a, K, V> {
    inner: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Comparator-order iterator over an [`OrderedMap`].
pub struct Sorted<'a, K, V> {
    nodes: &'a [Node<K, V>],
    cursor: usize,
}

impl<'a, K, V> Iterator for Sorted<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let current = self.cursor;
        let node = &self.nodes[current];

        if node.right != NIL {
            let mut next = node.right;
            while self.nodes[next].left != NIL {
                next = self.nodes[next].left;
            }
            self.cursor = next;
        } else {
            let mut child = current;
            let mut parent = node.parent;
            while parent != NIL && self.nodes[parent].right == child {
                child = parent;
                parent = self.nodes[parent].parent;
            }
            self.cursor = parent;
        }
        Some((&node.key, &node.value))
    }
}
