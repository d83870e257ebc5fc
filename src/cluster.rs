//! Connected-component grouping of match edges into duplicate groups.
//!
//! Two images land in the same group iff a chain of matches connects them,
//! even when they are not directly within the cutoff of each other.
//! Perceptual similarity is not transitive, so a group can contain members
//! that are only indirectly similar; callers should treat groups as "review
//! together", not "all pairwise identical".

use std::collections::HashMap;

use crate::matcher::MatchEdge;

/// A set of mutually-reachable images. The lexicographically smallest id is
/// the canonical key; the rest are its duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    pub duplicates: Vec<String>,
}

/// Partition image ids into duplicate groups via Union-Find over the match
/// edges.
///
/// Singletons are dropped. Output is fully deterministic: members are sorted
/// lexicographically within each group, the smallest becomes the key, and
/// groups are sorted by key — independent of edge order or traversal.
pub fn build_groups(ids: &[String], edges: &[MatchEdge]) -> Vec<DuplicateGroup> {
    let n = ids.len();
    if n < 2 || edges.is_empty() {
        return Vec::new();
    }

    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = vec![0; n];

    // Find with path compression
    fn find(parent: &mut [usize], i: usize) -> usize {
        if parent[i] != i {
            parent[i] = find(parent, parent[i]);
        }
        parent[i]
    }

    // Union by rank
    fn union(parent: &mut [usize], rank: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra == rb {
            return;
        }
        match rank[ra].cmp(&rank[rb]) {
            std::cmp::Ordering::Less => parent[ra] = rb,
            std::cmp::Ordering::Greater => parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                parent[rb] = ra;
                rank[ra] += 1;
            }
        }
    }

    for edge in edges {
        union(&mut parent, &mut rank, edge.a, edge.b);
    }

    // Collect connected components
    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(i);
    }

    let mut groups: Vec<DuplicateGroup> = components
        .into_values()
        .filter(|members| members.len() >= 2)
        .map(|members| {
            let mut names: Vec<String> = members.iter().map(|&i| ids[i].clone()).collect();
            names.sort();
            let key = names.remove(0);
            DuplicateGroup { key, duplicates: names }
        })
        .collect();

    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn edge(a: usize, b: usize, distance: f64) -> MatchEdge {
        MatchEdge { a, b, distance }
    }

    #[test]
    fn test_no_edges_no_groups() {
        let groups = build_groups(&ids(&["a.jpg", "b.jpg", "c.jpg"]), &[]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_single_input_no_groups() {
        let groups = build_groups(&ids(&["a.jpg"]), &[]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_transitive_chain_forms_one_group() {
        // A~B and B~C match but A~C does not; all three still group together
        // and the lexicographically smallest id is the key.
        let names = ids(&["a.jpg", "b.jpg", "c.jpg"]);
        let edges = vec![edge(0, 1, 0.05), edge(1, 2, 0.08)];

        let groups = build_groups(&names, &edges);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "a.jpg");
        assert_eq!(groups[0].duplicates, vec!["b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_separate_components_stay_separate() {
        let names = ids(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
        let edges = vec![edge(0, 1, 0.02), edge(2, 3, 0.03)];

        let groups = build_groups(&names, &edges);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "a.jpg");
        assert_eq!(groups[0].duplicates, vec!["b.jpg"]);
        assert_eq!(groups[1].key, "c.jpg");
        assert_eq!(groups[1].duplicates, vec!["d.jpg"]);
    }

    #[test]
    fn test_groups_are_disjoint() {
        let names = ids(&["a", "b", "c", "d", "e", "f"]);
        let edges = vec![edge(0, 1, 0.1), edge(1, 2, 0.1), edge(4, 5, 0.1)];

        let groups = build_groups(&names, &edges);
        let mut seen = std::collections::HashSet::new();
        for g in &groups {
            assert!(seen.insert(g.key.clone()));
            for d in &g.duplicates {
                assert!(seen.insert(d.clone()), "{} appears in two groups", d);
            }
        }
    }

    #[test]
    fn test_key_independent_of_edge_order() {
        let names = ids(&["z.jpg", "m.jpg", "a.jpg"]);
        let forward = vec![edge(0, 1, 0.1), edge(1, 2, 0.1)];
        let backward = vec![edge(1, 2, 0.1), edge(0, 1, 0.1)];

        let g1 = build_groups(&names, &forward);
        let g2 = build_groups(&names, &backward);
        assert_eq!(g1, g2);
        assert_eq!(g1[0].key, "a.jpg");
        assert_eq!(g1[0].duplicates, vec!["m.jpg", "z.jpg"]);
    }
}
