use crate::similarity::{SimilarityEdge, SimilaritySignal};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A maximal set of chunks connected through accepted similarity edges.
///
/// `signal` is the strongest signal present among the component's edges;
/// `max_similarity` is the maximum edge score inside the component. A
/// chunk belongs to at most one group per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Group id, stable within one run
    pub id: usize,

    /// Arena indices of member chunks
    pub members: BTreeSet<usize>,

    /// Maximum edge score inside the component
    pub max_similarity: f32,

    /// Strongest signal present among the component's edges
    pub signal: SimilaritySignal,
}

impl DuplicateGroup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Merge pairwise edges into duplicate groups via connected components.
///
/// Chunk ids are vertices, accepted edges undirected connections;
/// components are found with a breadth-first traversal. Transitivity is
/// intentional: A–B and B–C group A, B, and C together even if A and C
/// were never directly compared. Output ordering is deterministic:
/// largest group first, ties broken by smallest member id.
#[must_use]
pub fn group(edges: &[SimilarityEdge]) -> Vec<DuplicateGroup> {
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.a).or_default().push(edge.b);
        adjacency.entry(edge.b).or_default().push(edge.a);
    }

    // vertex -> component root, discovered via BFS in sorted vertex order
    let mut component_of: HashMap<usize, usize> = HashMap::new();
    let mut vertices: Vec<usize> = adjacency.keys().copied().collect();
    vertices.sort_unstable();

    let mut components: Vec<BTreeSet<usize>> = Vec::new();
    for &start in &vertices {
        if component_of.contains_key(&start) {
            continue;
        }
        let index = components.len();
        let mut members = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        component_of.insert(start, index);
        while let Some(vertex) = queue.pop_front() {
            members.insert(vertex);
            if let Some(neighbors) = adjacency.get(&vertex) {
                for &next in neighbors {
                    if !component_of.contains_key(&next) {
                        component_of.insert(next, index);
                        queue.push_back(next);
                    }
                }
            }
        }
        components.push(members);
    }

    // aggregate edge score/signal per component
    let mut max_similarity: Vec<f32> = vec![0.0; components.len()];
    let mut strongest: Vec<Option<SimilaritySignal>> = vec![None; components.len()];
    for edge in edges {
        let index = component_of[&edge.a];
        debug_assert_eq!(index, component_of[&edge.b], "edge spans two components");
        if edge.score > max_similarity[index] {
            max_similarity[index] = edge.score;
        }
        if strongest[index].map_or(true, |current| edge.signal > current) {
            strongest[index] = Some(edge.signal);
        }
    }

    let mut groups: Vec<DuplicateGroup> = components
        .into_iter()
        .enumerate()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(index, members)| DuplicateGroup {
            id: 0,
            members,
            max_similarity: max_similarity[index],
            signal: strongest[index].unwrap_or(SimilaritySignal::Structural),
        })
        .collect();

    groups.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.members.first().cmp(&b.members.first()))
    });
    for (id, group) in groups.iter_mut().enumerate() {
        group.id = id;
    }
    groups
}
