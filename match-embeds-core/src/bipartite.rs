// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An undirected bipartite graph with swap-and-pop edge removal and a
//! maximum-cardinality matching routine.
//!
//! Both the universe graph U and the predicate graph P (see the crate-level
//! documentation) are instances of this type; the only thing distinguishing them
//! is what a vertex index *means* to their owner.

use fixedbitset::FixedBitSet;

/// A left-vertex/right-vertex pair identifying an edge, as produced by
/// [`BipartiteGraph::commit_edge`] and [`BipartiteGraph::unit_prop`] for later undo.
pub type VertexPair = (u32, u32);

/// An undirected bipartite graph with `left_size` left vertices and `right_size`
/// right vertices, stored as adjacency lists on both sides.
///
/// Edges are only ever removed after construction (via [`remove_edge`] /
/// [`commit_edge`] / [`unit_prop`]), and restored only through [`add_edge`] with the
/// exact pair that was removed, so a compact swap-and-pop representation is used
/// throughout; the order of entries within an adjacency list carries no meaning.
///
/// [`remove_edge`]: BipartiteGraph::remove_edge
/// [`commit_edge`]: BipartiteGraph::commit_edge
/// [`unit_prop`]: BipartiteGraph::unit_prop
/// [`add_edge`]: BipartiteGraph::add_edge
#[derive(Clone, Debug)]
pub struct BipartiteGraph {
    left_adj: Vec<Vec<u32>>,
    right_adj: Vec<Vec<u32>>,
}

// Adjacency order is not observable (see module docs): two graphs are equal iff
// every vertex has the same neighbor *set*, regardless of order.
impl PartialEq for BipartiteGraph {
    fn eq(&self, other: &Self) -> bool {
        fn sorted_adj(adj: &[Vec<u32>]) -> Vec<Vec<u32>> {
            adj.iter()
                .map(|neighbors| {
                    let mut neighbors = neighbors.clone();
                    neighbors.sort_unstable();
                    neighbors
                })
                .collect()
        }
        self.left_adj.len() == other.left_adj.len()
            && self.right_adj.len() == other.right_adj.len()
            && sorted_adj(&self.left_adj) == sorted_adj(&other.left_adj)
            && sorted_adj(&self.right_adj) == sorted_adj(&other.right_adj)
    }
}

impl Eq for BipartiteGraph {}

impl BipartiteGraph {
    /// Creates an edgeless graph with the given left and right side sizes.
    pub fn new(left_size: usize, right_size: usize) -> Self {
        Self {
            left_adj: vec![Vec::new(); left_size],
            right_adj: vec![Vec::new(); right_size],
        }
    }

    pub fn left_size(&self) -> usize {
        self.left_adj.len()
    }

    pub fn right_size(&self) -> usize {
        self.right_adj.len()
    }

    /// Neighbors of left-vertex `u`, in unspecified order.
    pub fn left_adj(&self, u: u32) -> &[u32] {
        &self.left_adj[u as usize]
    }

    /// Neighbors of right-vertex `v`, in unspecified order.
    pub fn right_adj(&self, v: u32) -> &[u32] {
        &self.right_adj[v as usize]
    }

    pub fn left_degree(&self, u: u32) -> usize {
        self.left_adj[u as usize].len()
    }

    pub fn right_degree(&self, v: u32) -> usize {
        self.right_adj[v as usize].len()
    }

    /// Appends edge `(u, v)`. Used only during construction and to restore edges
    /// removed earlier with the exact same pair (`add_back`'s job).
    pub fn add_edge(&mut self, u: u32, v: u32) {
        self.left_adj[u as usize].push(v);
        self.right_adj[v as usize].push(u);
    }

    /// Linear scan for `(u, v)`; acceptable since adjacencies stay small once
    /// filtering has run.
    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        self.left_adj[u as usize].contains(&v)
    }

    /// Removes the edge at position `pos` of `u`'s adjacency list (and the
    /// symmetric entry on the other side) via swap-and-pop.
    ///
    /// `pos` indexes into a single scan of `left_adj(u)`; it is not a stable
    /// handle across other mutations.
    pub fn remove_edge(&mut self, u: u32, pos: usize) {
        let v = self.left_adj[u as usize].swap_remove(pos);
        let rpos = self.right_adj[v as usize]
            .iter()
            .position(|&x| x == u)
            .expect("bipartite adjacency symmetry invariant violated");
        self.right_adj[v as usize].swap_remove(rpos);
    }

    /// Decides that `u`'s only neighbor is `v`: removes every other edge incident
    /// to `u`, logging each removed `(u, w)` pair to `removed_out`.
    ///
    /// Returns `false` iff `(u, v)` was not already an edge; in that case the
    /// graph is left unmodified.
    pub fn commit_edge(&mut self, u: u32, v: u32, removed_out: &mut Vec<VertexPair>) -> bool {
        if !self.has_edge(u, v) {
            return false;
        }
        let mut i = 0;
        while i < self.left_adj[u as usize].len() {
            let w = self.left_adj[u as usize][i];
            if w == v {
                i += 1;
            } else {
                removed_out.push((u, w));
                self.remove_edge(u, i);
            }
        }
        true
    }

    /// While any left vertex has exactly one remaining neighbor, commits that
    /// edge and removes every *other* left-neighbor of the forced partner (they
    /// now conflict with it). Returns `false` iff some vertex reaches degree 0.
    pub fn unit_prop(&mut self, removed_out: &mut Vec<VertexPair>) -> bool {
        let mut settled = vec![false; self.left_adj.len()];
        loop {
            let next = (0..self.left_adj.len())
                .find(|&u| !settled[u] && self.left_adj[u].len() == 1);
            let Some(u) = next else { break };
            settled[u] = true;
            let u = u as u32;
            let v = self.left_adj[u as usize][0];
            if !self.commit_edge(u, v, removed_out) {
                return false;
            }
            let mut i = 0;
            while i < self.right_adj[v as usize].len() {
                let w = self.right_adj[v as usize][i];
                if w == u {
                    i += 1;
                    continue;
                }
                removed_out.push((w, v));
                let pos = self.left_adj[w as usize]
                    .iter()
                    .position(|&x| x == v)
                    .expect("bipartite adjacency symmetry invariant violated");
                self.remove_edge(w, pos);
                if self.left_adj[w as usize].is_empty() {
                    return false;
                }
            }
        }
        self.left_adj.iter().all(|adj| !adj.is_empty())
    }

    /// Computes a maximum-cardinality matching by augmenting-path search (Kuhn's
    /// algorithm), extending whatever partial matching is already recorded in
    /// `match1`/`match2`. `vis` is scratch space sized to the right side, cleared
    /// fresh before each left vertex's augmenting attempt.
    ///
    /// Returns the total matching size. On return, `match1[u] == v as i64` iff
    /// `match2[v] == u as i64` iff `(u, v)` is in the matching.
    pub fn max_matching(&self, match1: &mut [i64], match2: &mut [i64], vis: &mut FixedBitSet) -> usize {
        let mut size = match1.iter().filter(|&&m| m >= 0).count();
        for u in 0..self.left_adj.len() {
            if match1[u] >= 0 {
                continue;
            }
            vis.clear();
            if self.try_augment(u as u32, match1, match2, vis) {
                size += 1;
            }
        }
        size
    }

    fn try_augment(&self, u: u32, match1: &mut [i64], match2: &mut [i64], vis: &mut FixedBitSet) -> bool {
        for &v in &self.left_adj[u as usize] {
            if vis.contains(v as usize) {
                continue;
            }
            vis.insert(v as usize);
            let partner = match2[v as usize];
            if partner < 0 || self.try_augment(partner as u32, match1, match2, vis) {
                match1[u as usize] = v as i64;
                match2[v as usize] = u as i64;
                return true;
            }
        }
        false
    }
}
