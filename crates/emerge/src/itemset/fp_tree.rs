//! A weighted FP-tree stored as an arena of nodes.

use std::collections::{HashMap, HashSet};

use crate::AttributeId;

/// A node in the tree. The root is the only node without an item.
#[derive(Debug, Clone)]
struct Node {
    /// The item this node represents, `None` for the root.
    item: Option<AttributeId>,
    /// The total weight of the transactions whose prefix ends here.
    count: f64,
    /// The index of the parent node, `None` for the root.
    parent: Option<usize>,
    /// Child node indices, by item.
    children: HashMap<AttributeId, usize>,
}

impl Node {
    /// A fresh node with zero weight.
    fn new(item: Option<AttributeId>, parent: Option<usize>) -> Self {
        Self {
            item,
            count: 0.0,
            parent,
            children: HashMap::new(),
        }
    }
}

/// A prefix tree over transactions whose items are ordered by a fixed rank.
///
/// Nodes live in a single `Vec` and refer to each other by index. The header
/// table lists, for every ranked item, the indices of the nodes holding it.
/// Items without a rank are never inserted.
#[derive(Debug, Clone)]
pub struct FpTree {
    /// The arena. Index 0 is the root.
    nodes: Vec<Node>,
    /// For each item, the nodes that hold it.
    header: HashMap<AttributeId, Vec<usize>>,
    /// Item order, most frequent first. Lower rank is closer to the root.
    order: Vec<AttributeId>,
    /// The inverse of `order`.
    rank: HashMap<AttributeId, usize>,
}

impl Default for FpTree {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl FpTree {
    /// An empty tree admitting the items of `order`, most frequent first.
    #[must_use]
    pub fn new(order: &[AttributeId]) -> Self {
        let mut tree = Self {
            nodes: vec![Node::new(None, None)],
            header: HashMap::new(),
            order: Vec::with_capacity(order.len()),
            rank: HashMap::with_capacity(order.len()),
        };
        for &item in order {
            tree.admit(item);
        }
        tree
    }

    /// An empty tree admitting the items whose count is at least `min_count`,
    /// ordered by descending count and then ascending id.
    #[must_use]
    pub fn from_counts(counts: &HashMap<AttributeId, f64>, min_count: f64) -> Self {
        let mut frequent = counts
            .iter()
            .filter(|(_, &c)| c >= min_count)
            .map(|(&i, &c)| (i, c))
            .collect::<Vec<_>>();
        frequent.sort_by(|(ia, ca), (ib, cb)| cb.total_cmp(ca).then_with(|| ia.cmp(ib)));
        let order = frequent.into_iter().map(|(i, _)| i).collect::<Vec<_>>();
        Self::new(&order)
    }

    /// Build a tree from weighted transactions, keeping only items whose
    /// total weight is at least `min_count`.
    #[must_use]
    pub fn from_weighted(transactions: &[(Vec<AttributeId>, f64)], min_count: f64) -> Self {
        let mut counts = HashMap::new();
        for (items, weight) in transactions {
            for &item in items.iter().collect::<HashSet<_>>() {
                *counts.entry(item).or_insert(0.0) += weight;
            }
        }
        let mut tree = Self::from_counts(&counts, min_count);
        for (items, weight) in transactions {
            tree.insert(items, *weight);
        }
        tree
    }

    /// Append `item` to the end of the order if it has no rank yet. Returns its rank.
    pub fn admit(&mut self, item: AttributeId) -> usize {
        if let Some(&r) = self.rank.get(&item) {
            return r;
        }
        let r = self.order.len();
        self.order.push(item);
        self.rank.insert(item, r);
        r
    }

    /// The rank of `item`, if it is admitted.
    #[must_use]
    pub fn rank_of(&self, item: AttributeId) -> Option<usize> {
        self.rank.get(&item).copied()
    }

    /// The admitted items, most frequent first.
    #[must_use]
    pub fn order(&self) -> &[AttributeId] {
        &self.order
    }

    /// The number of nodes, excluding the root.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether the tree holds no transactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Insert a transaction with the given weight. Items without a rank are dropped.
    pub fn insert(&mut self, items: &[AttributeId], weight: f64) {
        let mut ranked = items
            .iter()
            .filter_map(|&i| self.rank.get(&i).map(|&r| (r, i)))
            .collect::<Vec<_>>();
        ranked.sort_unstable();
        ranked.dedup();

        let mut current = 0;
        for (_, item) in ranked {
            current = match self.nodes[current].children.get(&item) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::new(Some(item), Some(current)));
                    self.nodes[current].children.insert(item, child);
                    self.header.entry(item).or_default().push(child);
                    child
                }
            };
            self.nodes[current].count += weight;
        }
    }

    /// The total weight of the transactions containing `item`.
    #[must_use]
    pub fn item_count(&self, item: AttributeId) -> f64 {
        self.header
            .get(&item)
            .map_or(0.0, |nodes| nodes.iter().map(|&n| self.nodes[n].count).sum())
    }

    /// The items on the path from the root down to, but excluding, `node`.
    fn prefix_of(&self, node: usize) -> Vec<AttributeId> {
        let mut prefix = Vec::new();
        let mut current = self.nodes[node].parent;
        while let Some(n) = current {
            if let Some(item) = self.nodes[n].item {
                prefix.push(item);
            }
            current = self.nodes[n].parent;
        }
        prefix.reverse();
        prefix
    }

    /// The conditional pattern base of `item`: for every node holding it, the
    /// prefix path above that node weighted by the node's count.
    #[must_use]
    pub fn prefix_paths(&self, item: AttributeId) -> Vec<(Vec<AttributeId>, f64)> {
        self.header.get(&item).map_or_else(Vec::new, |nodes| {
            nodes
                .iter()
                .map(|&n| (self.prefix_of(n), self.nodes[n].count))
                .filter(|(path, _)| !path.is_empty())
                .collect()
        })
    }

    /// The total weight of the transactions containing every item of `itemset`.
    ///
    /// Walks the nodes of the lowest-ranked item and checks that each of
    /// their ancestors covers the remaining items.
    #[must_use]
    pub fn support_of(&self, itemset: &[AttributeId]) -> f64 {
        let mut ranked = Vec::with_capacity(itemset.len());
        for &item in itemset {
            match self.rank.get(&item) {
                Some(&r) => ranked.push((r, item)),
                None => return 0.0,
            }
        }
        let Some(&(_, deepest)) = ranked.iter().max() else {
            return 0.0;
        };
        let rest = ranked
            .iter()
            .map(|&(_, i)| i)
            .filter(|&i| i != deepest)
            .collect::<HashSet<_>>();

        self.header.get(&deepest).map_or(0.0, |nodes| {
            nodes
                .iter()
                .filter(|&&n| {
                    let mut missing = rest.len();
                    let mut current = self.nodes[n].parent;
                    while let Some(p) = current {
                        if missing == 0 {
                            break;
                        }
                        if self.nodes[p].item.is_some_and(|i| rest.contains(&i)) {
                            missing -= 1;
                        }
                        current = self.nodes[p].parent;
                    }
                    missing == 0
                })
                .map(|&n| self.nodes[n].count)
                .sum()
        })
    }

    /// Recover the weighted transactions held by the tree.
    ///
    /// A node whose count exceeds the sum of its children's counts ends that
    /// many transactions; each becomes one path from the root to the node.
    #[must_use]
    pub fn weighted_paths(&self) -> Vec<(Vec<AttributeId>, f64)> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(n, node)| {
                let below = node.children.values().map(|&c| self.nodes[c].count).sum::<f64>();
                let residual = node.count - below;
                // Rounding in `below` grows with the number of children and the size of the count.
                #[allow(clippy::cast_precision_loss)]
                let tolerance = f64::EPSILON * node.count.abs() * (node.children.len() + 1) as f64;
                (residual > tolerance).then(|| {
                    let mut path = self.prefix_of(n);
                    if let Some(item) = node.item {
                        path.push(item);
                    }
                    (path, residual)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use float_cmp::approx_eq;

    use super::FpTree;

    fn example() -> FpTree {
        let mut tree = FpTree::new(&[1, 2, 3]);
        tree.insert(&[1, 2], 1.0);
        tree.insert(&[3, 2, 1], 1.0);
        tree.insert(&[2, 3], 1.0);
        tree.insert(&[1, 3], 1.0);
        tree
    }

    #[test]
    fn shares_prefixes() {
        let tree = example();
        // 1 -> 2 -> 3, 1 -> 3, 2 -> 3
        assert_eq!(tree.num_nodes(), 6);
        assert!(approx_eq!(f64, tree.item_count(1), 3.0));
        assert!(approx_eq!(f64, tree.item_count(2), 3.0));
        assert!(approx_eq!(f64, tree.item_count(3), 3.0));
    }

    #[test]
    fn drops_unranked_items() {
        let mut tree = FpTree::new(&[1]);
        tree.insert(&[1, 9], 2.0);
        assert_eq!(tree.num_nodes(), 1);
        assert!(approx_eq!(f64, tree.item_count(9), 0.0));
        assert!(approx_eq!(f64, tree.item_count(1), 2.0));
    }

    #[test]
    fn support_of_sets() {
        let tree = example();
        assert!(approx_eq!(f64, tree.support_of(&[1, 2]), 2.0));
        assert!(approx_eq!(f64, tree.support_of(&[2, 3]), 2.0));
        assert!(approx_eq!(f64, tree.support_of(&[1, 2, 3]), 1.0));
        assert!(approx_eq!(f64, tree.support_of(&[1, 4]), 0.0));
        assert!(approx_eq!(f64, tree.support_of(&[]), 0.0));
    }

    #[test]
    fn prefix_paths_of_item() {
        let tree = example();
        let mut paths = tree.prefix_paths(3);
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(paths, vec![(vec![1], 1.0), (vec![1, 2], 1.0), (vec![2], 1.0)]);
    }

    #[test]
    fn tiny_weights_survive_a_rebuild() {
        let mut tree = FpTree::new(&[1, 2]);
        tree.insert(&[1], 1e-17);
        tree.insert(&[1, 2], 1e-17);

        let mut paths = tree.weighted_paths();
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].0, vec![1]);
        assert_eq!(paths[1].0, vec![1, 2]);
        assert!(approx_eq!(f64, paths[0].1, 1e-17, epsilon = 0.0, ulps = 2));
        assert!(approx_eq!(f64, paths[1].1, 1e-17, epsilon = 0.0, ulps = 2));

        let rebuilt = FpTree::from_weighted(&paths, 0.0);
        assert!(approx_eq!(f64, rebuilt.item_count(1), tree.item_count(1), epsilon = 0.0, ulps = 2));
        assert!(approx_eq!(f64, rebuilt.support_of(&[1, 2]), 1e-17, epsilon = 0.0, ulps = 2));
    }

    #[test]
    fn weighted_paths_rebuild_the_tree() {
        let tree = example();
        let mut paths = tree.weighted_paths();
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            paths,
            vec![(vec![1, 2], 1.0), (vec![1, 2, 3], 1.0), (vec![1, 3], 1.0), (vec![2, 3], 1.0)]
        );

        let rebuilt = FpTree::from_weighted(&paths, 0.0);
        let sets: Vec<Vec<u32>> = vec![vec![1], vec![2], vec![3], vec![1, 2], vec![1, 3], vec![2, 3], vec![1, 2, 3]];
        for set in &sets {
            assert!(approx_eq!(f64, rebuilt.support_of(set), tree.support_of(set)));
        }
    }

    #[test]
    fn order_from_counts() {
        let counts = HashMap::from([(5, 2.0), (3, 4.0), (7, 2.0), (9, 0.5)]);
        let tree = FpTree::from_counts(&counts, 1.0);
        assert_eq!(tree.order(), &[3, 5, 7]);
    }
}
