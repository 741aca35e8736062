use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use noisefilters::{
    Column, Dataset, Evaluation, Filter, Inffc, InffcConfig, LabelColumn, Rnn, Voting,
};

#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// Filter to run: rnn or inffc.
    #[arg(short, long, default_value = "inffc")]
    filter: String,
    /// 0-based label column position; defaults to the last column.
    #[arg(short, long)]
    label: Option<usize>,
    /// Use consensus voting instead of majority voting.
    #[arg(long)]
    consensus: bool,
    /// Noise score removal threshold.
    #[arg(long, default_value_t = 0.0)]
    score_threshold: f64,
    /// Tab-separated input (header line, one row per line). Without it a
    /// built-in two-cluster table with flipped labels is used.
    dataset: Option<PathBuf>,
}

/// Two numeric clusters of 50 rows each with ten labels flipped at fixed
/// positions.
fn demo_dataset() -> (Dataset, BTreeSet<usize>) {
    let flipped: BTreeSet<usize> = [3, 11, 24, 37, 42, 55, 61, 76, 83, 97]
        .iter()
        .copied()
        .collect();
    let mut x1 = Vec::new();
    let mut x2 = Vec::new();
    let mut labels = Vec::new();
    for i in 0..100 {
        let offset = if i < 50 { 0.0 } else { 8.0 };
        x1.push(offset + (i % 10) as f64 * 0.2);
        x2.push(offset + (i / 10 % 5) as f64 * 0.2);
        let clean = if i < 50 { "x" } else { "y" };
        let noisy = if i < 50 { "y" } else { "x" };
        labels.push(if flipped.contains(&(i + 1)) { noisy } else { clean });
    }
    let ds = Dataset::new(vec![
        Column::numeric("x1", x1),
        Column::numeric("x2", x2),
        Column::categorical("class", &labels),
    ])
    .expect("demo dataset is well-formed");
    (ds, flipped)
}

fn main() {
    env_logger::init();

    let argv = Argv::parse();
    log::info!("argv: {:?}", argv);

    let (ds, truth) = match &argv.dataset {
        Some(path) => {
            let f = File::open(path).expect("failed to open the input file");
            (Dataset::try_from(f).expect("failed to read the input file"), None)
        }
        None => {
            let (ds, flipped) = demo_dataset();
            (ds, Some(flipped))
        }
    };
    let label = argv.label.map(LabelColumn::Index).unwrap_or_default();
    log::info!("dataset: {} rows, {} columns", ds.len(), ds.n_cols());

    let begin = Instant::now();
    let result = match argv.filter.as_str() {
        "rnn" => Rnn.apply(&ds, label).expect("rnn failed"),
        "inffc" => {
            let config = InffcConfig {
                voting: if argv.consensus { Voting::Consensus } else { Voting::Majority },
                score_threshold: argv.score_threshold,
                ..InffcConfig::default()
            };
            let filter = Inffc::with_default_ensemble(config).expect("bad configuration");
            filter.apply(&ds, label).expect("inffc failed")
        }
        other => panic!("unknown filter: {}", other),
    };
    log::info!("took: {:?}", begin.elapsed());

    println!("{}", result.provenance());
    for note in result.notes() {
        println!("  {}", note);
    }
    if let Some(truth) = truth {
        println!("{}", Evaluation::of(&result, &truth));
    }
    let clean = result.clean_data(&ds).expect("reconstruction failed");
    println!("clean data: {} of {} rows", clean.len(), ds.len());
    println!(
        "{}",
        serde_json::to_string_pretty(&result).expect("failed to serialize the result")
    );
}
