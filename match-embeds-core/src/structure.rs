// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only relational structures: a universe of densely-indexed elements
//! together with, for each predicate symbol, a set of tuples of elements.

use std::collections::BTreeSet;

use crate::signature::Signature;

/// A predicate index plus its ordered argument tuple.
///
/// Ported from `prop` in the original `definitions.h`; arity is fixed per
/// predicate but `Tuple` itself treats arity tuple-by-tuple.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Tuple {
    pub predicate: u32,
    pub args: Vec<u32>,
}

impl Tuple {
    pub fn new(predicate: u32, args: Vec<u32>) -> Self {
        Self { predicate, args }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

/// A finite first-order relational structure: a universe of elements, normalized
/// to dense indices `0..universe_size()`, and a set of tuples per predicate.
///
/// `Structure` is built incrementally via [`StructureBuilder`] and is immutable
/// once built; [`crate::embedding::Embedding`] is the only consumer that reaches
/// past its public API (via [`Structure::tuples`] / [`Structure::signature`]).
#[derive(Clone, Debug)]
pub struct Structure<S: Signature> {
    signatures: Vec<S>,
    // Tuples, grouped by predicate; the order of predicates and of tuples within
    // a predicate is irrelevant to correctness and is whatever the builder saw.
    relations: Vec<BTreeSet<Vec<u32>>>,
}

impl<S: Signature> Structure<S> {
    pub fn universe_size(&self) -> usize {
        self.signatures.len()
    }

    pub fn predicate_count(&self) -> usize {
        self.relations.len()
    }

    pub fn signature(&self, element: u32) -> &S {
        &self.signatures[element as usize]
    }

    /// Iterates over every `(predicate, tuple)` pair in this structure. Tuples
    /// are unique per `(predicate, elements)`; iteration order is unspecified.
    pub fn tuples(&self) -> impl Iterator<Item = Tuple> + '_ {
        self.relations.iter().enumerate().flat_map(|(pred, set)| {
            set.iter()
                .map(move |args| Tuple::new(pred as u32, args.clone()))
        })
    }

    pub fn tuple_count(&self) -> usize {
        self.relations.iter().map(|set| set.len()).sum()
    }
}

/// Incrementally builds a [`Structure`], assigning dense element indices as new
/// elements are seen and updating each element's signature as tuples are added.
///
/// The element/predicate *symbol* tables this replaces the original's
/// class-level statics with live in the caller (e.g. a parser's interner, see
/// `match-embeds-cli`); `StructureBuilder` only ever sees already-dense indices.
#[derive(Clone, Debug, Default)]
pub struct StructureBuilder<S: Signature> {
    signatures: Vec<S>,
    relations: Vec<BTreeSet<Vec<u32>>>,
}

impl<S: Signature> StructureBuilder<S> {
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Registers element `index`, growing the universe (and allocating a fresh
    /// signature) if it has not been seen before. Elements must be added (here or
    /// via [`add_proposition`]) in an order consistent with their dense index,
    /// i.e. `index <= universe_size()` at the time of the call.
    ///
    /// [`add_proposition`]: StructureBuilder::add_proposition
    pub fn add_element(&mut self, index: u32) {
        let index = index as usize;
        if index >= self.signatures.len() {
            self.signatures.resize_with(index + 1, || S::new(index as u32));
        }
    }

    /// Adds a tuple of predicate `predicate` over `args` (all dense element
    /// indices), updating every argument's signature. A no-op if this exact
    /// `(predicate, args)` pair was already added.
    pub fn add_proposition(&mut self, predicate: u32, args: Vec<u32>) {
        for &a in &args {
            self.add_element(a);
        }
        let predicate_ix = predicate as usize;
        if self.relations.len() <= predicate_ix {
            self.relations.resize_with(predicate_ix + 1, BTreeSet::new);
        }
        if self.relations[predicate_ix].insert(args.clone()) {
            let arity = args.len();
            for (position, &element) in args.iter().enumerate() {
                self.signatures[element as usize].update(predicate, arity, position);
            }
        }
    }

    pub fn build(self) -> Structure<S> {
        Structure {
            signatures: self.signatures,
            relations: self.relations,
        }
    }
}
