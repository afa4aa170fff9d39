// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A tentative commitment `u -> v` in the universe graph, together with the
//! complete undo logs needed to reverse it exactly on backtrack.

use crate::bipartite::VertexPair;

/// One entry of the solver's decision stack.
///
/// `remove_u` and `remove_p` accumulate every edge removed from the universe and
/// predicate graphs, respectively, as a consequence of committing to `u -> v` and
/// the arc-consistency propagation that followed. [`Embedding::add_back`] restores
/// exactly these edges when this decision is undone.
///
/// [`Embedding::add_back`]: crate::embedding::Embedding::add_back
#[derive(Clone, Debug, Default)]
pub struct Decision {
    pub u: u32,
    pub v: u32,
    pub remove_u: Vec<VertexPair>,
    pub remove_p: Vec<VertexPair>,
}

impl Decision {
    pub fn new(u: u32, v: u32) -> Self {
        Self {
            u,
            v,
            remove_u: Vec::new(),
            remove_p: Vec::new(),
        }
    }
}
