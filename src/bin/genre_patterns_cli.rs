use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use genre_patterns::config::AppConfig;
use genre_patterns::corpus::{AggregationReport, GenreTable, PatternAggregator, ResolutionTable};
use genre_patterns::encoding::PatternEncoder;
use genre_patterns::error::ErrorCode;
use genre_patterns::eval::CrossValidatedEvaluator;
use genre_patterns::report::SignatureCounter;
use genre_patterns::store::ResultsStore;

#[derive(Parser, Debug)]
#[command(
    name = "genre_patterns_cli",
    about = "Pattern-signature genre classification over a symbolic-music corpus"
)]
struct Cli {
    /// Optional JSON config overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate the corpus and cross-validate a classifier per family
    Classify {
        /// Directory of combined (pitch+rhythm) pattern files
        #[arg(long)]
        patterns_dir: PathBuf,
        /// Optional directory of rhythm-only pattern files
        #[arg(long)]
        rhythm_dir: Option<PathBuf>,
        #[arg(long)]
        genres: PathBuf,
        #[arg(long)]
        resolutions: PathBuf,
        /// Results file, rewritten after every family
        #[arg(long)]
        output: PathBuf,
        /// Override the configured genre dataset
        #[arg(long)]
        dataset: Option<String>,
    },
    /// Count rhythm-only signatures per genre across the corpus
    Count {
        #[arg(long)]
        patterns_dir: PathBuf,
        #[arg(long)]
        genres: PathBuf,
        #[arg(long)]
        resolutions: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Datasets to count; defaults to every dataset in the table
        #[arg(long)]
        dataset: Vec<String>,
        /// Divide signature ticks by their gcd before counting
        #[arg(long)]
        normalize: bool,
    },
    /// Encode one pattern file and print its signatures
    Encode {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        tpqn: u32,
        /// Use the rhythm-only policy instead of the combined one
        #[arg(long)]
        rhythm: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Classify {
            patterns_dir,
            rhythm_dir,
            genres,
            resolutions,
            output,
            dataset,
        } => run_classify(
            config,
            &patterns_dir,
            rhythm_dir.as_deref(),
            &genres,
            &resolutions,
            &output,
            dataset,
        ),
        Commands::Count {
            patterns_dir,
            genres,
            resolutions,
            output,
            dataset,
            normalize,
        } => run_count(
            config, &patterns_dir, &genres, &resolutions, &output, dataset, normalize,
        ),
        Commands::Encode { file, tpqn, rhythm } => run_encode(config, &file, tpqn, rhythm),
    }
}

fn run_classify(
    mut config: AppConfig,
    patterns_dir: &std::path::Path,
    rhythm_dir: Option<&std::path::Path>,
    genres_path: &std::path::Path,
    resolutions_path: &std::path::Path,
    output: &std::path::Path,
    dataset: Option<String>,
) -> Result<ExitCode> {
    if let Some(dataset) = dataset {
        config.corpus.genre_dataset = dataset;
    }

    let genres = GenreTable::load(genres_path)
        .with_context(|| format!("loading genre table {}", genres_path.display()))?;
    let resolutions = ResolutionTable::load(resolutions_path)
        .with_context(|| format!("loading resolution table {}", resolutions_path.display()))?;
    if !genres.has_dataset(&config.corpus.genre_dataset) {
        bail!(
            "genre table has no dataset {:?} (available: {:?})",
            config.corpus.genre_dataset,
            genres.dataset_names()
        );
    }

    let aggregator =
        PatternAggregator::new(&config.encoding, &config.corpus, &genres, &resolutions);
    let corpus = aggregator
        .aggregate(patterns_dir, rhythm_dir)
        .with_context(|| format!("scanning {}", patterns_dir.display()))?;
    print_aggregation_summary(&corpus.report);

    let evaluator = CrossValidatedEvaluator::new(&config.eval);
    let mut store = ResultsStore::new(output);
    let run = evaluator
        .evaluate_corpus(&corpus, &mut store)
        .with_context(|| format!("persisting results to {}", output.display()))?;

    println!(
        "Evaluated {} famil{}, skipped {}",
        run.evaluated.len(),
        if run.evaluated.len() == 1 { "y" } else { "ies" },
        run.skipped.len()
    );
    for skipped in &run.skipped {
        println!("  skipped {}: {}", skipped.family, skipped.reason.message());
    }
    println!("Results written to {}", store.path().display());

    Ok(ExitCode::from(0))
}

fn run_count(
    mut config: AppConfig,
    patterns_dir: &std::path::Path,
    genres_path: &std::path::Path,
    resolutions_path: &std::path::Path,
    output: &std::path::Path,
    datasets: Vec<String>,
    normalize: bool,
) -> Result<ExitCode> {
    config.encoding.normalize_gcd = normalize;

    let genres = GenreTable::load(genres_path)
        .with_context(|| format!("loading genre table {}", genres_path.display()))?;
    let resolutions = ResolutionTable::load(resolutions_path)
        .with_context(|| format!("loading resolution table {}", resolutions_path.display()))?;

    let datasets = if datasets.is_empty() {
        genres.dataset_names().iter().map(|s| s.to_string()).collect()
    } else {
        datasets
    };
    for dataset in &datasets {
        if !genres.has_dataset(dataset) {
            bail!("genre table has no dataset {:?}", dataset);
        }
    }

    let counter = SignatureCounter::new(&config.encoding, &config.corpus, &genres, &resolutions);
    let (summary, report) = counter
        .count(patterns_dir, &datasets)
        .with_context(|| format!("scanning {}", patterns_dir.display()))?;
    print_aggregation_summary(&report);

    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(output, json).with_context(|| format!("writing {}", output.display()))?;
    println!("Counts written to {}", output.display());

    Ok(ExitCode::from(0))
}

fn run_encode(
    config: AppConfig,
    file: &std::path::Path,
    tpqn: u32,
    rhythm: bool,
) -> Result<ExitCode> {
    use genre_patterns::corpus::PatternFile;

    let parsed = PatternFile::load(file, &config.corpus.reserved_keys)
        .with_context(|| format!("loading {}", file.display()))?;
    let encoder = PatternEncoder::new(&config.encoding);

    for (family, patterns) in &parsed.families {
        for pattern in patterns {
            if pattern.len() < config.encoding.min_raw_events
                || pattern.len() > config.encoding.max_raw_events
            {
                continue;
            }
            let signature = if rhythm {
                encoder.encode_rhythm_only(pattern, tpqn)
            } else {
                encoder.encode_combined(pattern, tpqn)
            };
            match signature {
                Some(signature) => println!("{family}\t{signature}"),
                None => println!("{family}\t<rejected>"),
            }
        }
    }
    Ok(ExitCode::from(0))
}

fn print_aggregation_summary(report: &AggregationReport) {
    println!(
        "Tracks: {} seen, {} aggregated, {} skipped",
        report.tracks_seen,
        report.tracks_aggregated,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!(
            "  skipped {} (code {}): {}",
            skipped.track_id,
            skipped.reason.code(),
            skipped.reason.message()
        );
    }
}
