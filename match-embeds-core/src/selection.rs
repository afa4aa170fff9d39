// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Variable-selection heuristics: given the current conflict set, pick one
//! element to decide next.

use indexmap::{IndexMap, IndexSet};
use rand::Rng;

use crate::embedding::Embedding;

/// Which heuristic [`select_variable`] should use to pick the next decision
/// variable out of the current conflict set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Heuristic {
    /// Prefer the candidate with the fewest remaining values in U (most
    /// constrained first).
    MinRemainingValues,
    /// Prefer the candidate with the most remaining values in U.
    MaxRemainingValues,
    /// Prefer the candidate involved in the fewest current conflicts.
    MinConflicts,
    /// Prefer the candidate involved in the most current conflicts.
    MaxConflicts,
    /// Prefer the candidate with the smallest cumulative conflict count across
    /// the whole search so far.
    MinConflictHistory,
    /// Prefer the candidate with the largest cumulative conflict count across
    /// the whole search so far.
    MaxConflictHistory,
    /// Take the first eligible argument of the first conflict tuple.
    FirstVar,
    /// Pick uniformly from the multiset of (conflict, argument) occurrences,
    /// i.e. weighted by how many conflicts each candidate appears in.
    WeightedRandom,
    /// Pick uniformly from the set of eligible candidates.
    UniformRandom,
}

impl Default for Heuristic {
    fn default() -> Self {
        // Matches the C++ driver's default (`MatchEmbeds`'s default argument).
        Heuristic::MinRemainingValues
    }
}

/// Selects one element to decide next out of `conflicts` (left-tuple indices of
/// P with no current tuple-level witness).
///
/// A candidate is *eligible* if it appears as an argument of some conflict tuple
/// and still has more than one candidate in U (i.e. is undecided). Returns
/// `None` if some conflict tuple has no eligible argument at all, an immediate
/// dead end. `conflict_history` is updated in place for the history-based
/// heuristics regardless of which heuristic is active, since the original
/// counts every step, not just the ones that use it.
#[allow(clippy::too_many_arguments)]
pub fn select_variable(
    embedding: &Embedding,
    conflicts: &[u32],
    heuristic: Heuristic,
    conflict_history: &mut [u64],
    rng: &mut impl Rng,
) -> Option<u32> {
    let u_graph = embedding.universe_graph();
    let is_eligible = |x: u32| u_graph.left_degree(x) > 1;

    let picked = match heuristic {
        Heuristic::FirstVar => {
            let first = conflicts.first()?;
            embedding
                .u_label(*first)
                .args
                .iter()
                .copied()
                .find(|&x| is_eligible(x))
        }
        Heuristic::WeightedRandom => {
            let mut occurrences = Vec::new();
            for &p in conflicts {
                let args = &embedding.u_label(p).args;
                let before = occurrences.len();
                occurrences.extend(args.iter().copied().filter(|&x| is_eligible(x)));
                if occurrences.len() == before {
                    return None;
                }
            }
            let idx = rng.gen_range(0..occurrences.len());
            Some(occurrences[idx])
        }
        Heuristic::UniformRandom => {
            let mut candidates: IndexSet<u32> = IndexSet::new();
            for &p in conflicts {
                let args = &embedding.u_label(p).args;
                let mut any = false;
                for &x in args {
                    if is_eligible(x) {
                        candidates.insert(x);
                        any = true;
                    }
                }
                if !any {
                    return None;
                }
            }
            let idx = rng.gen_range(0..candidates.len());
            candidates.get_index(idx).copied()
        }
        scored => {
            let mut scores: IndexMap<u32, u64> = IndexMap::new();
            for &p in conflicts {
                let args = &embedding.u_label(p).args;
                let mut any = false;
                for &x in args {
                    if !is_eligible(x) {
                        continue;
                    }
                    any = true;
                    let value = match scored {
                        Heuristic::MinRemainingValues | Heuristic::MaxRemainingValues => {
                            u_graph.left_degree(x) as u64
                        }
                        Heuristic::MinConflicts | Heuristic::MaxConflicts => {
                            *scores.get(&x).unwrap_or(&0) + 1
                        }
                        Heuristic::MinConflictHistory | Heuristic::MaxConflictHistory => {
                            conflict_history[x as usize] += 1;
                            conflict_history[x as usize]
                        }
                        _ => unreachable!("non-scored heuristic handled above"),
                    };
                    scores.insert(x, value);
                }
                if !any {
                    return None;
                }
            }
            let maximize = matches!(
                scored,
                Heuristic::MaxRemainingValues | Heuristic::MaxConflicts | Heuristic::MaxConflictHistory
            );
            best_by_insertion_order(&scores, maximize)
        }
    };
    if let Some(x) = picked {
        debug_assert!(u_graph.left_degree(x) > 1);
    }
    picked
}

/// Finds the arg-min (or arg-max, if `maximize`) of `scores`, breaking ties by
/// insertion order: the first key seen with the extremal value wins.
fn best_by_insertion_order(scores: &IndexMap<u32, u64>, maximize: bool) -> Option<u32> {
    let mut best: Option<(u32, u64)> = None;
    for (&key, &value) in scores {
        best = Some(match best {
            None => (key, value),
            Some((best_key, best_value)) => {
                let take_new = if maximize {
                    value > best_value
                } else {
                    value < best_value
                };
                if take_new {
                    (key, value)
                } else {
                    (best_key, best_value)
                }
            }
        });
    }
    best.map(|(key, _)| key)
}
