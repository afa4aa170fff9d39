// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides embeddability of one finite relational structure into another: an
//! injective map from A's universe into B's that preserves every tuple of
//! every relation. Generalizes subgraph isomorphism; NP-hard in general, so
//! this crate is a specialized constraint solver rather than a general SAT/CP
//! front end.
//!
//! The pipeline: a pair of [`Structure`] values is turned into an
//! [`Embedding`] (two coupled bipartite graphs, kept arc-consistent), which a
//! [`Solver`] then searches over using one of nine [`Heuristic`] variable
//! orderings, backtracking with blame on conflict.
//!
//! This crate does no file I/O and has no notion of a textual structure
//! format or symbol interning; that lives in the command-line driver.

pub mod bipartite;
pub mod decision;
pub mod embedding;
pub mod selection;
pub mod signature;
pub mod solver;
pub mod structure;

pub use bipartite::{BipartiteGraph, VertexPair};
pub use decision::Decision;
pub use embedding::Embedding;
pub use selection::{select_variable, Heuristic};
pub use signature::{MultiSetSignature, Signature};
pub use solver::{match_embeds, match_embeds_with_witness, Solver};
pub use structure::{Structure, StructureBuilder, Tuple};
