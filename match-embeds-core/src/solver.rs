// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level search: unit-propagate, match, detect conflicts, decide, and
//! backtrack with blame until an embedding is found or none remains.

use fixedbitset::FixedBitSet;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::decision::Decision;
use crate::embedding::Embedding;
use crate::selection::{select_variable, Heuristic};
use crate::signature::Signature;
use crate::structure::Structure;

/// Owns an [`Embedding`] plus the decision stack and scratch buffers needed to
/// search it: a conflict-history vector, the current partial matching
/// (`match1`/`match2`), and a reusable matching-visited set.
///
/// [`Embedding`] handles all graph bookkeeping; `Solver` only ever decides,
/// backtracks, and reads matching/conflict state off it.
pub struct Solver {
    embedding: Embedding,
    decisions: Vec<Decision>,
    heuristic: Heuristic,
    conflict_history: Vec<u64>,
    match1: Vec<i64>,
    match2: Vec<i64>,
    vis: FixedBitSet,
    rng: StdRng,
}

impl Solver {
    /// Creates a solver over `embedding`, seeded explicitly for reproducibility;
    /// there is no ambient time-based seeding.
    pub fn new(embedding: Embedding, heuristic: Heuristic, seed: u64) -> Self {
        let left = embedding.universe_graph().left_size();
        let right = embedding.universe_graph().right_size();
        Self {
            embedding,
            decisions: Vec::new(),
            heuristic,
            conflict_history: vec![0; left],
            match1: vec![-1; left],
            match2: vec![-1; right],
            vis: FixedBitSet::with_capacity(right),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs the search to completion. Returns `true` iff an embedding of A into
    /// B exists; on `true`, [`into_witness`](Solver::into_witness) recovers it.
    pub fn solve(&mut self) -> bool {
        if !self.embedding.is_valid() {
            return false;
        }

        let mut discard_u = Vec::new();
        let mut discard_p = Vec::new();
        if !self.embedding.universe_graph_mut().unit_prop(&mut discard_u) {
            return false;
        }
        self.embedding.filter(&mut discard_u, &mut discard_p);
        if !self.embedding.is_valid() {
            return false;
        }

        loop {
            self.unmatch_stale_edges();

            self.vis.clear();
            let matched = self.embedding.universe_graph().max_matching(
                &mut self.match1,
                &mut self.match2,
                &mut self.vis,
            );
            if matched < self.embedding.universe_graph().left_size() {
                if !self.backtrack() {
                    return false;
                }
                continue;
            }

            let conflicts = self.conflict_set();
            if conflicts.is_empty() {
                return true;
            }

            let selected = select_variable(
                &self.embedding,
                &conflicts,
                self.heuristic,
                &mut self.conflict_history,
                &mut self.rng,
            );
            let Some(x) = selected else {
                if !self.backtrack() {
                    return false;
                }
                continue;
            };

            let v = self.match1[x as usize];
            debug_assert!(v >= 0, "a full matching guarantees every variable is matched");
            let mut d = Decision::new(x, v as u32);
            self.embedding.decide(&mut d);
            self.decisions.push(d);
            if !self.embedding.is_valid() && !self.backtrack() {
                return false;
            }
        }
    }

    /// Consumes the solver and returns the witness matching: `witness[a] = b`
    /// means element `a` of A maps to element `b` of B. Only meaningful after
    /// [`solve`](Solver::solve) returned `true`.
    pub fn into_witness(self) -> Vec<u32> {
        self.match1
            .into_iter()
            .map(|v| u32::try_from(v).expect("witness elements must all be matched on success"))
            .collect()
    }

    fn unmatch_stale_edges(&mut self) {
        let u_graph = self.embedding.universe_graph();
        for u in 0..self.match1.len() {
            let v = self.match1[u];
            if v >= 0 && !u_graph.has_edge(u as u32, v as u32) {
                self.match1[u] = -1;
                self.match2[v as usize] = -1;
            }
        }
    }

    /// Left tuples of P with no surviving witness under the current matching.
    fn conflict_set(&self) -> Vec<u32> {
        let p_graph = self.embedding.predicate_graph();
        (0..p_graph.left_size() as u32)
            .filter(|&p| {
                let x = &self.embedding.u_label(p).args;
                !p_graph.left_adj(p).iter().any(|&q| {
                    let y = &self.embedding.v_label(q).args;
                    x.iter()
                        .zip(y.iter())
                        .all(|(&xi, &yi)| self.match1[xi as usize] == yi as i64)
                })
            })
            .collect()
    }

    /// Pops the top decision, undoes everything it caused, and permanently
    /// blames its edge. Returns `false` iff the stack was already empty (no
    /// embedding exists).
    fn backtrack(&mut self) -> bool {
        let Some(d) = self.decisions.pop() else {
            return false;
        };
        self.embedding.add_back(&d.remove_p, &d.remove_u);

        let pos = self
            .embedding
            .universe_graph()
            .left_adj(d.u)
            .iter()
            .position(|&v| v == d.v);
        debug_assert!(
            pos.is_some(),
            "blamed edge must survive add_back: commit_edge never removes the committed edge itself"
        );
        if let Some(pos) = pos {
            self.embedding.universe_graph_mut().remove_edge(d.u, pos);
            if let Some(parent) = self.decisions.last_mut() {
                parent.remove_u.push((d.u, d.v));
            }
        }
        true
    }
}

/// The core's single entry point: does an embedding of `a` into `b` exist?
pub fn match_embeds<S: Signature>(
    a: &Structure<S>,
    b: &Structure<S>,
    heuristic: Heuristic,
    seed: u64,
) -> bool {
    let embedding = Embedding::build(a, b);
    Solver::new(embedding, heuristic, seed).solve()
}

/// Like [`match_embeds`], but also recovers a witness matching on success.
pub fn match_embeds_with_witness<S: Signature>(
    a: &Structure<S>,
    b: &Structure<S>,
    heuristic: Heuristic,
    seed: u64,
) -> Option<Vec<u32>> {
    let embedding = Embedding::build(a, b);
    let mut solver = Solver::new(embedding, heuristic, seed);
    if solver.solve() {
        Some(solver.into_witness())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::MultiSetSignature;
    use crate::structure::StructureBuilder;

    const ALL_HEURISTICS: [Heuristic; 9] = [
        Heuristic::MinRemainingValues,
        Heuristic::MaxRemainingValues,
        Heuristic::MinConflicts,
        Heuristic::MaxConflicts,
        Heuristic::MinConflictHistory,
        Heuristic::MaxConflictHistory,
        Heuristic::FirstVar,
        Heuristic::WeightedRandom,
        Heuristic::UniformRandom,
    ];

    fn build(props_a: &[(u32, &[u32])], props_b: &[(u32, &[u32])]) -> (Structure<MultiSetSignature>, Structure<MultiSetSignature>) {
        let mut a = StructureBuilder::<MultiSetSignature>::new();
        for &(pred, args) in props_a {
            a.add_proposition(pred, args.to_vec());
        }
        let mut b = StructureBuilder::<MultiSetSignature>::new();
        for &(pred, args) in props_b {
            b.add_proposition(pred, args.to_vec());
        }
        (a.build(), b.build())
    }

    #[test]
    fn identity_scenario_succeeds() {
        // A = B = {P(x), Q(x,y), Q(y,x)}.
        let (a, b) = build(
            &[(0, &[0]), (1, &[0, 1]), (1, &[1, 0])],
            &[(0, &[0]), (1, &[0, 1]), (1, &[1, 0])],
        );
        let witness = match_embeds_with_witness(&a, &b, Heuristic::MinRemainingValues, 0);
        assert!(witness.is_some());
        let witness = witness.unwrap();
        assert_eq!(witness.len(), 2);
        assert_ne!(witness[0], witness[1], "embeddings are injective");
    }

    #[test]
    fn arity_mismatch_fails() {
        let (a, b) = build(&[(0, &[0])], &[(0, &[0, 1])]);
        assert!(!match_embeds(&a, &b, Heuristic::MinRemainingValues, 0));
    }

    #[test]
    fn subgraph_into_triangle_succeeds() {
        // A = {E(a,b), E(b,c)}; B = the directed 3-cycle on {1,2,3}.
        let (a, b) = build(
            &[(0, &[0, 1]), (0, &[1, 2])],
            &[(0, &[0, 1]), (0, &[1, 2]), (0, &[2, 0])],
        );
        assert!(match_embeds(&a, &b, Heuristic::MinRemainingValues, 0));
    }

    #[test]
    fn signature_mismatch_fails_before_search() {
        // Element 0 of A occupies position 0 of predicate 0 three times; no
        // element of B does so more than twice.
        let (a, b) = build(
            &[(0, &[0, 1]), (0, &[0, 2]), (0, &[0, 3])],
            &[(0, &[10, 11]), (0, &[10, 12]), (0, &[20, 13])],
        );
        assert!(!match_embeds(&a, &b, Heuristic::MinRemainingValues, 0));
    }

    #[test]
    fn requires_backtracking_succeeds() {
        // A = {R(a,b), R(b,a), S(a)}; B = {R(1,2), R(2,1), R(2,3), R(3,2), S(2)}.
        // The greedy first attempt a->1 fails S; the solver must backtrack to
        // a->2.
        let (a, b) = build(
            &[(0, &[0, 1]), (0, &[1, 0]), (1, &[0])],
            &[(0, &[1, 2]), (0, &[2, 1]), (0, &[2, 3]), (0, &[3, 2]), (1, &[2])],
        );
        let witness = match_embeds_with_witness(&a, &b, Heuristic::MinRemainingValues, 0);
        assert!(witness.is_some());
        let witness = witness.unwrap();
        // a (index 0) must land on the element bearing S, i.e. source element 2.
        assert_eq!(witness[0], 2);
    }

    #[test]
    fn self_loop_distinction_fails_end_to_end() {
        // A = {E(a,a)}; B = {E(1,2), E(2,1)}. No element of B has a self-loop.
        let (a, b) = build(&[(0, &[0, 0])], &[(0, &[0, 1]), (0, &[1, 0])]);
        assert!(!match_embeds(&a, &b, Heuristic::MinRemainingValues, 0));
    }

    #[test]
    fn heuristic_choice_does_not_change_the_answer() {
        let (a, b) = build(
            &[(0, &[0, 1]), (0, &[1, 0]), (1, &[0])],
            &[(0, &[1, 2]), (0, &[2, 1]), (0, &[2, 3]), (0, &[3, 2]), (1, &[2])],
        );
        let results: Vec<bool> = ALL_HEURISTICS
            .iter()
            .map(|&h| match_embeds(&a, &b, h, 0))
            .collect();
        assert!(results.iter().all(|&r| r == results[0]));
        assert!(results[0]);
    }

    #[test]
    fn soundness_of_witness_on_subgraph_scenario() {
        let (a, b) = build(
            &[(0, &[0, 1]), (0, &[1, 2])],
            &[(0, &[0, 1]), (0, &[1, 2]), (0, &[2, 0])],
        );
        let witness = match_embeds_with_witness(&a, &b, Heuristic::FirstVar, 7).unwrap();

        // Injective.
        let mut seen = std::collections::HashSet::new();
        assert!(witness.iter().all(|&v| seen.insert(v)));

        // Every tuple of A maps to a tuple of B under the witness.
        let b_tuples: std::collections::HashSet<(u32, Vec<u32>)> =
            b.tuples().map(|t| (t.predicate, t.args)).collect();
        for t in a.tuples() {
            let mapped: Vec<u32> = t.args.iter().map(|&e| witness[e as usize]).collect();
            assert!(b_tuples.contains(&(t.predicate, mapped)));
        }
    }
}
