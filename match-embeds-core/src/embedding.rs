// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An embedding instance: the universe graph, the predicate graph, and the
//! arc-consistency filter that keeps them in sync.

use crate::bipartite::{BipartiteGraph, VertexPair};
use crate::decision::Decision;
use crate::signature::Signature;
use crate::structure::{Structure, Tuple};

/// Holds the universe graph U and predicate graph P for a candidate embedding of
/// structure A into structure B, and keeps them arc-consistent as decisions are
/// made and undone.
///
/// Built once via [`Embedding::build`]; during search only [`decide`], [`filter`]
/// and [`add_back`] run, each of which only removes or restores edges. No new
/// edge is ever added except as the exact inverse of one recorded in a
/// decision's undo logs.
///
/// [`decide`]: Embedding::decide
/// [`filter`]: Embedding::filter
/// [`add_back`]: Embedding::add_back
#[derive(Clone, Debug)]
pub struct Embedding {
    u_graph: BipartiteGraph,
    p_graph: BipartiteGraph,
    u_labels: Vec<Tuple>,
    v_labels: Vec<Tuple>,
    // (p-vertex, position) occurrences of each universe-left vertex among A's
    // tuples; built once, immutable thereafter.
    u_inv_label: Vec<Vec<(u32, u32)>>,
    #[allow(dead_code)] // kept for symmetry with u_inv_label / future B-side queries
    v_inv_label: Vec<Vec<(u32, u32)>>,
    valid: bool,
}

impl Embedding {
    /// Builds U and P from structures `a` and `b`. `a`'s tuples become P's left
    /// vertices, `b`'s become P's right vertices, matching `a`'s elements to U's
    /// left side and `b`'s to U's right side.
    pub fn build<S: Signature>(a: &Structure<S>, b: &Structure<S>) -> Self {
        let (u_graph, mut valid) = fill_u_graph(a, b);

        let u_labels: Vec<Tuple> = a.tuples().collect();
        let v_labels: Vec<Tuple> = b.tuples().collect();

        let mut p_graph = BipartiteGraph::new(u_labels.len(), v_labels.len());
        if valid {
            for (i, t_a) in u_labels.iter().enumerate() {
                for (j, t_b) in v_labels.iter().enumerate() {
                    if t_a.predicate == t_b.predicate
                        && t_a.arity() == t_b.arity()
                        && t_a
                            .args
                            .iter()
                            .zip(t_b.args.iter())
                            .all(|(&x, &y)| u_graph.has_edge(x, y))
                    {
                        p_graph.add_edge(i as u32, j as u32);
                    }
                }
            }
            for i in 0..u_labels.len() {
                if p_graph.left_degree(i as u32) == 0 {
                    valid = false;
                    break;
                }
            }
        }

        let mut u_inv_label = vec![Vec::new(); u_graph.left_size()];
        let mut v_inv_label = vec![Vec::new(); u_graph.right_size()];
        for (i, t) in u_labels.iter().enumerate() {
            for (pos, &elem) in t.args.iter().enumerate() {
                u_inv_label[elem as usize].push((i as u32, pos as u32));
            }
        }
        for (j, t) in v_labels.iter().enumerate() {
            for (pos, &elem) in t.args.iter().enumerate() {
                v_inv_label[elem as usize].push((j as u32, pos as u32));
            }
        }

        Self {
            u_graph,
            p_graph,
            u_labels,
            v_labels,
            u_inv_label,
            v_inv_label,
            valid,
        }
    }

    pub fn universe_graph(&self) -> &BipartiteGraph {
        &self.u_graph
    }

    pub fn universe_graph_mut(&mut self) -> &mut BipartiteGraph {
        &mut self.u_graph
    }

    pub fn predicate_graph(&self) -> &BipartiteGraph {
        &self.p_graph
    }

    pub fn u_label(&self, p: u32) -> &Tuple {
        &self.u_labels[p as usize]
    }

    pub fn v_label(&self, q: u32) -> &Tuple {
        &self.v_labels[q as usize]
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Commits to decision `d` (`d.u` may only embed to `d.v`) and runs arc
    /// consistency to quiescence, logging every removed edge into `d`'s undo
    /// logs.
    pub fn decide(&mut self, d: &mut Decision) {
        if !self.u_graph.commit_edge(d.u, d.v, &mut d.remove_u) {
            self.valid = false;
            return;
        }
        // Filter the tuples most directly affected by this decision first, to
        // avoid a full scan before anything has actually changed.
        let affected: Vec<u32> = self.u_inv_label[d.u as usize]
            .iter()
            .map(|&(p, _pos)| p)
            .collect();
        for p in affected {
            self.filter_one(p, &mut d.remove_u, &mut d.remove_p);
            if !self.valid {
                return;
            }
        }
        self.filter(&mut d.remove_u, &mut d.remove_p);
    }

    /// Runs `filter_one` over every left tuple of P until a full pass removes
    /// nothing. Returns `false` iff the graph became invalid.
    pub fn filter(&mut self, remove_u: &mut Vec<VertexPair>, remove_p: &mut Vec<VertexPair>) -> bool {
        let mut changed = true;
        while self.valid && changed {
            changed = false;
            for p in 0..self.p_graph.left_size() as u32 {
                if self.filter_one(p, remove_u, remove_p) {
                    changed = true;
                }
                if !self.valid {
                    return false;
                }
            }
        }
        true
    }

    /// Restores every edge removed earlier and marks the graph valid again.
    /// Callers are responsible for passing the exact lists a single `decide`
    /// produced; passing any other list silently corrupts the graphs.
    pub fn add_back(&mut self, p_edges: &[VertexPair], u_edges: &[VertexPair]) {
        for &(p, q) in p_edges {
            self.p_graph.add_edge(p, q);
        }
        for &(u, v) in u_edges {
            self.u_graph.add_edge(u, v);
        }
        self.valid = true;
    }

    /// The arc-consistency kernel for a single left tuple `p` of P. Returns
    /// whether any edge of U or P was actually removed as a result.
    fn filter_one(&mut self, p: u32, remove_u: &mut Vec<VertexPair>, remove_p: &mut Vec<VertexPair>) -> bool {
        let start_u = remove_u.len();
        let start_p = remove_p.len();
        let p_vars = self.u_labels[p as usize].args.clone();

        // Pass 1: prune P from U. For each q in A_p, if some positional pair
        // (x_i, y_i) is no longer an edge of U, q can no longer witness p.
        let mut i = 0;
        while i < self.p_graph.left_adj(p).len() {
            let q = self.p_graph.left_adj(p)[i];
            let q_vars = self.v_labels[q as usize].args.clone();
            let supported = p_vars
                .iter()
                .zip(q_vars.iter())
                .all(|(&x, &y)| self.u_graph.has_edge(x, y));
            if supported {
                i += 1;
            } else {
                remove_p.push((p, q));
                self.p_graph.remove_edge(p, i);
            }
        }

        let degree = self.p_graph.left_degree(p);
        if degree == 0 {
            self.valid = false;
            return true;
        }
        if degree == 1 {
            // Unit propagation on P: p can only map to q*, so every argument of
            // p must map to the corresponding argument of q*.
            let q = self.p_graph.left_adj(p)[0];
            if !self.p_graph.commit_edge(p, q, remove_p) {
                self.valid = false;
                return true;
            }
            let q_vars = self.v_labels[q as usize].args.clone();
            for (&x, &y) in p_vars.iter().zip(q_vars.iter()) {
                if !self.u_graph.commit_edge(x, y, remove_u) {
                    self.valid = false;
                    return true;
                }
            }
            return remove_u.len() > start_u || remove_p.len() > start_p;
        }

        // Pass 2: prune U from P. x_i may only point to y if some surviving
        // (p, q) has q's i-th argument equal to y.
        for (pos, &x) in p_vars.iter().enumerate() {
            let mut j = 0;
            while j < self.u_graph.left_adj(x).len() {
                let y = self.u_graph.left_adj(x)[j];
                let supported = self
                    .p_graph
                    .left_adj(p)
                    .iter()
                    .any(|&q| self.v_labels[q as usize].args[pos] == y);
                if supported {
                    j += 1;
                } else {
                    remove_u.push((x, y));
                    self.u_graph.remove_edge(x, j);
                }
            }
            let xi_degree = self.u_graph.left_degree(x);
            if xi_degree == 0 {
                self.valid = false;
                return true;
            }
            if xi_degree == 1 {
                let y = self.u_graph.left_adj(x)[0];
                if !self.u_graph.commit_edge(x, y, remove_u) {
                    self.valid = false;
                    return true;
                }
            }
        }

        remove_u.len() > start_u || remove_p.len() > start_p
    }
}

#[cfg(not(feature = "parallel"))]
fn fill_u_graph<S: Signature>(a: &Structure<S>, b: &Structure<S>) -> (BipartiteGraph, bool) {
    let mut u_graph = BipartiteGraph::new(a.universe_size(), b.universe_size());
    let mut valid = true;
    for i in 0..a.universe_size() {
        let mut any = false;
        for j in 0..b.universe_size() {
            if a.signature(i as u32).le(b.signature(j as u32)) {
                u_graph.add_edge(i as u32, j as u32);
                any = true;
            }
        }
        if !any {
            valid = false;
        }
    }
    (u_graph, valid)
}

// Signature comparison is embarrassingly parallel over left vertices: each
// worker fills a disjoint slice of adjacency lists, and the results are
// merged sequentially afterward.
#[cfg(feature = "parallel")]
fn fill_u_graph<S>(a: &Structure<S>, b: &Structure<S>) -> (BipartiteGraph, bool)
where
    S: Signature + Sync,
{
    let left = a.universe_size();
    let right = b.universe_size();
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);
    let chunk = left.div_ceil(workers).max(1);

    let mut per_vertex: Vec<Vec<u32>> = Vec::with_capacity(left);
    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for start in (0..left).step_by(chunk) {
            let end = (start + chunk).min(left);
            handles.push(scope.spawn(move || {
                let mut local = Vec::with_capacity(end - start);
                for i in start..end {
                    let mut neighbors = Vec::new();
                    for j in 0..right {
                        if a.signature(i as u32).le(b.signature(j as u32)) {
                            neighbors.push(j as u32);
                        }
                    }
                    local.push(neighbors);
                }
                local
            }));
        }
        for handle in handles {
            per_vertex.extend(handle.join().expect("signature comparison worker panicked"));
        }
    });

    let mut u_graph = BipartiteGraph::new(left, right);
    let mut valid = true;
    for (i, neighbors) in per_vertex.into_iter().enumerate() {
        if neighbors.is_empty() {
            valid = false;
        }
        for j in neighbors {
            u_graph.add_edge(i as u32, j);
        }
    }
    (u_graph, valid)
}
