// Copyright (c) The match-embeds Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line driver: reads files each containing two back-to-back textual
//! structures, decides embeddability of the first into the second, and
//! prints `True` or `False` per file. Parse errors are diagnosed to stderr
//! and that file is skipped; the process always exits 0.

mod interner;
mod parser;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use match_embeds_core::{match_embeds_with_witness, Heuristic, MultiSetSignature, Structure, StructureBuilder};
use serde::Serialize;
use tracing::{error, info};

use interner::Interner;
use parser::{parse_structures, RawStructure};

/// Fixed by default so runs are reproducible without a flag; there is no
/// ambient time-seeded RNG. Spells "match_em" as big-endian bytes.
const DEFAULT_SEED: u64 = 0x6d61_7463_685f_656d;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeuristicArg {
    MinRemainingValues,
    MaxRemainingValues,
    MinConflicts,
    MaxConflicts,
    MinConflictHistory,
    MaxConflictHistory,
    FirstVar,
    WeightedRandom,
    UniformRandom,
}

impl From<HeuristicArg> for Heuristic {
    fn from(h: HeuristicArg) -> Self {
        match h {
            HeuristicArg::MinRemainingValues => Heuristic::MinRemainingValues,
            HeuristicArg::MaxRemainingValues => Heuristic::MaxRemainingValues,
            HeuristicArg::MinConflicts => Heuristic::MinConflicts,
            HeuristicArg::MaxConflicts => Heuristic::MaxConflicts,
            HeuristicArg::MinConflictHistory => Heuristic::MinConflictHistory,
            HeuristicArg::MaxConflictHistory => Heuristic::MaxConflictHistory,
            HeuristicArg::FirstVar => Heuristic::FirstVar,
            HeuristicArg::WeightedRandom => Heuristic::WeightedRandom,
            HeuristicArg::UniformRandom => Heuristic::UniformRandom,
        }
    }
}

/// Decides embeddability of one relational structure into another.
#[derive(Parser, Debug)]
#[command(name = "match-embeds", about = "Decides embeddability of one relational structure into another")]
struct Cli {
    /// Files to check; each contains two structures back-to-back.
    files: Vec<PathBuf>,

    /// Variable-selection heuristic driving the search.
    #[arg(long, value_enum, default_value = "min-remaining-values")]
    heuristic: HeuristicArg,

    /// RNG seed for the randomized heuristics.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Emit one JSON object per file instead of a bare True/False line.
    #[arg(long)]
    json: bool,

    /// Increase diagnostic verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct JsonResult {
    file: String,
    result: bool,
    witness: Option<Vec<String>>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let heuristic: Heuristic = cli.heuristic.into();
    for file in &cli.files {
        if let Err(err) = run_one(file, heuristic, cli.seed, cli.json) {
            error!(file = %file.display(), error = %err, "skipping file");
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run_one(path: &PathBuf, heuristic: Heuristic, seed: u64, json: bool) -> Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let (raw_a, raw_b) = parse_structures(&contents)?;

    let mut predicates = Interner::new();
    let mut elems_a = Interner::new();
    let mut elems_b = Interner::new();
    let a = build_structure(&raw_a, &mut predicates, &mut elems_a);
    let b = build_structure(&raw_b, &mut predicates, &mut elems_b);

    let witness = match_embeds_with_witness(&a, &b, heuristic, seed);
    let result = witness.is_some();

    if json {
        let witness_names = witness
            .as_ref()
            .map(|w| w.iter().map(|&v| elems_b.resolve(v).unwrap_or("?").to_owned()).collect());
        let out = JsonResult {
            file: path.display().to_string(),
            result,
            witness: witness_names,
        };
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("{}", if result { "True" } else { "False" });
    }
    info!(file = %path.display(), result, "decided");
    Ok(())
}

fn build_structure(raw: &RawStructure, predicates: &mut Interner, elems: &mut Interner) -> Structure<MultiSetSignature> {
    let mut builder = StructureBuilder::<MultiSetSignature>::new();
    for prop in raw {
        let pred = predicates.intern(&prop.symbol);
        let args: Vec<u32> = prop.args.iter().map(|name| elems.intern(name)).collect();
        builder.add_proposition(pred, args);
    }
    builder.build()
}
