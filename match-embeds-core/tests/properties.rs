// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-based tests for the solver's universal invariants: soundness,
//! completeness against a brute-force enumerator, heuristic independence,
//! filter monotonicity, the backtrack round-trip, and signature necessity.

use std::collections::HashSet;

use match_embeds_core::{match_embeds, match_embeds_with_witness, Decision, Embedding, Heuristic, MultiSetSignature, Structure, StructureBuilder};
use proptest::prelude::*;

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

/// Two unary/binary predicates is enough vocabulary to exercise arc
/// consistency and backtracking without blowing up brute-force verification.
fn structure_strategy(universe: u32, max_tuples: usize) -> impl Strategy<Item = Vec<(u32, Vec<u32>)>> {
    let elem = 0..universe.max(1);
    prop::collection::vec(
        prop_oneof![
            elem.clone().prop_map(|x| (0u32, vec![x])),
            (elem.clone(), elem.clone()).prop_map(|(x, y)| (1u32, vec![x, y])),
        ],
        0..=max_tuples,
    )
}

fn build_structure(universe: u32, props: &[(u32, Vec<u32>)]) -> Structure<MultiSetSignature> {
    let mut builder = StructureBuilder::<MultiSetSignature>::new();
    if universe > 0 {
        builder.add_element(universe - 1);
    }
    for (pred, args) in props {
        builder.add_proposition(*pred, args.clone());
    }
    builder.build()
}

/// Enumerates every injective map `0..|A| -> 0..|B|` and checks tuple
/// preservation directly; a brute-force oracle for structures this small.
fn brute_force_embeds(a: &Structure<MultiSetSignature>, b: &Structure<MultiSetSignature>) -> bool {
    let na = a.universe_size();
    let nb = b.universe_size();
    if na > nb {
        return false;
    }
    let b_tuples: HashSet<(u32, Vec<u32>)> = b.tuples().map(|t| (t.predicate, t.args)).collect();
    let a_tuples: Vec<(u32, Vec<u32>)> = a.tuples().map(|t| (t.predicate, t.args)).collect();

    let mut targets: Vec<usize> = (0..nb).collect();
    let mut assignment = vec![0usize; na];
    fn backtrack(
        depth: usize,
        na: usize,
        targets: &mut Vec<usize>,
        used: &mut Vec<bool>,
        assignment: &mut Vec<usize>,
        a_tuples: &[(u32, Vec<u32>)],
        b_tuples: &HashSet<(u32, Vec<u32>)>,
    ) -> bool {
        if depth == na {
            return a_tuples.iter().all(|(pred, args)| {
                let mapped: Vec<u32> = args.iter().map(|&e| assignment[e as usize] as u32).collect();
                b_tuples.contains(&(*pred, mapped))
            });
        }
        for i in 0..targets.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            assignment[depth] = targets[i];
            if backtrack(depth + 1, na, targets, used, assignment, a_tuples, b_tuples) {
                return true;
            }
            used[i] = false;
        }
        false
    }
    let mut used = vec![false; nb];
    backtrack(0, na, &mut targets, &mut used, &mut assignment, &a_tuples, &b_tuples)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn completeness_matches_brute_force(
        props_a in structure_strategy(5, 6),
        props_b in structure_strategy(6, 8),
    ) {
        let a = build_structure(5, &props_a);
        let b = build_structure(6, &props_b);
        let expected = brute_force_embeds(&a, &b);
        let actual = match_embeds(&a, &b, Heuristic::MinRemainingValues, 0);
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn heuristic_choice_never_changes_the_answer(
        props_a in structure_strategy(4, 5),
        props_b in structure_strategy(5, 6),
    ) {
        let a = build_structure(4, &props_a);
        let b = build_structure(5, &props_b);
        let results: Vec<bool> = ALL_HEURISTICS.iter().map(|&h| match_embeds(&a, &b, h, 42)).collect();
        prop_assert!(results.iter().all(|&r| r == results[0]));
    }

    #[test]
    fn soundness_of_witness(
        props_a in structure_strategy(5, 6),
        props_b in structure_strategy(6, 8),
    ) {
        let a = build_structure(5, &props_a);
        let b = build_structure(6, &props_b);
        if let Some(witness) = match_embeds_with_witness(&a, &b, Heuristic::MinRemainingValues, 0) {
            let mut seen = HashSet::new();
            prop_assert!(witness.iter().all(|&v| seen.insert(v)), "witness must be injective");

            let b_tuples: HashSet<(u32, Vec<u32>)> = b.tuples().map(|t| (t.predicate, t.args)).collect();
            for t in a.tuples() {
                let mapped: Vec<u32> = t.args.iter().map(|&e| witness[e as usize]).collect();
                prop_assert!(b_tuples.contains(&(t.predicate, mapped)), "witness must preserve every tuple");
            }
        }
    }

    #[test]
    fn signature_necessity_holds_for_every_surviving_edge(
        props_a in structure_strategy(5, 6),
        props_b in structure_strategy(6, 8),
    ) {
        let a = build_structure(5, &props_a);
        let b = build_structure(6, &props_b);
        let mut e = Embedding::build(&a, &b);
        let mut remove_u = Vec::new();
        let mut remove_p = Vec::new();
        e.filter(&mut remove_u, &mut remove_p);
        for u in 0..e.universe_graph().left_size() as u32 {
            for &v in e.universe_graph().left_adj(u) {
                prop_assert!(a.signature(u).le(b.signature(v)));
            }
        }
    }

    #[test]
    fn filter_reaches_a_fixed_point(
        props_a in structure_strategy(5, 6),
        props_b in structure_strategy(6, 8),
    ) {
        let a = build_structure(5, &props_a);
        let b = build_structure(6, &props_b);
        let mut e = Embedding::build(&a, &b);
        let mut remove_u = Vec::new();
        let mut remove_p = Vec::new();
        e.filter(&mut remove_u, &mut remove_p);

        let before_u = remove_u.len();
        let before_p = remove_p.len();
        e.filter(&mut remove_u, &mut remove_p);
        prop_assert_eq!(remove_u.len(), before_u, "a second filter pass removes no further U edges");
        prop_assert_eq!(remove_p.len(), before_p, "a second filter pass removes no further P edges");
    }

    #[test]
    fn decide_then_add_back_restores_adjacency(
        props_a in structure_strategy(5, 6),
        props_b in structure_strategy(6, 8),
    ) {
        let a = build_structure(5, &props_a);
        let b = build_structure(6, &props_b);
        let mut e = Embedding::build(&a, &b);
        if e.is_valid() && e.universe_graph().left_size() > 0 {
            let u = 0u32;
            if let Some(&v) = e.universe_graph().left_adj(u).first() {
                let u_before = e.universe_graph().clone();
                let p_before = e.predicate_graph().clone();

                let mut d = Decision::new(u, v);
                e.decide(&mut d);
                e.add_back(&d.remove_p, &d.remove_u);

                prop_assert_eq!(e.universe_graph(), &u_before);
                prop_assert_eq!(e.predicate_graph(), &p_before);
            }
        }
    }
}
