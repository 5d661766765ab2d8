// ABOUTME: Union-find partitioning of order-change edges
// ABOUTME: Groups node indices into connected components before classification

use std::collections::BTreeMap;

use super::OrderChange;

/// Weighted union-find with path compression over the dense index space
/// `0..n`.
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Compress the walked path
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        // Attach the smaller tree under the larger one
        let (small, large) = if self.size[ra] < self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = large;
        self.size[large] += self.size[small];
    }
}

/// Partition `0..n` into connected components, merging along every edge in
/// either direction. Returns root -> ascending member indices; indices
/// untouched by any edge come back as singletons, which the caller skips as
/// no-op reorders.
pub fn components(n: usize, edges: &[OrderChange]) -> BTreeMap<usize, Vec<usize>> {
    let mut uf = UnionFind::new(n);
    for edge in edges {
        uf.union(edge.prev, edge.next);
    }

    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for node in 0..n {
        let root = uf.find(node);
        by_root.entry(root).or_default().push(node);
    }
    by_root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(prev: usize, next: usize) -> OrderChange {
        OrderChange { prev, next }
    }

    #[test]
    fn test_no_edges_yields_singletons() {
        let comps = components(3, &[]);
        assert_eq!(comps.len(), 3);
        assert!(comps.values().all(|members| members.len() == 1));
    }

    #[test]
    fn test_chain_edges_form_one_component() {
        let comps = components(4, &[edge(0, 1), edge(1, 2)]);
        let mut sizes: Vec<usize> = comps.values().map(|m| m.len()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 3]);

        let big = comps.values().find(|m| m.len() == 3).unwrap();
        assert_eq!(*big, vec![0, 1, 2]);
    }

    #[test]
    fn test_direction_is_ignored_when_merging() {
        // Same partition regardless of edge orientation
        let forward = components(3, &[edge(0, 1), edge(1, 2)]);
        let backward = components(3, &[edge(1, 0), edge(2, 1)]);
        let fwd: Vec<_> = forward.values().collect();
        let bwd: Vec<_> = backward.values().collect();
        assert_eq!(fwd, bwd);
    }

    #[test]
    fn test_disjoint_components_stay_apart() {
        let comps = components(6, &[edge(0, 1), edge(3, 4), edge(4, 5)]);
        let mut sizes: Vec<usize> = comps.values().map(|m| m.len()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn test_cycle_edges_form_one_component() {
        let comps = components(3, &[edge(0, 1), edge(1, 2), edge(2, 0)]);
        assert_eq!(comps.len(), 1);
        assert_eq!(*comps.values().next().unwrap(), vec![0, 1, 2]);
    }
}
