use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use benchalign::aligner::scoring::{translate, EngineCosts, PenaltyModel};
use benchalign::aligner::utils::verify;
use benchalign::aligner::{align_packed, AlignmentResult, BandedAlignmentDriver, DriverConfig};
use benchalign::engine::{FullMatrixEngine, PackedEngine, ReferenceBandedEngine};
use benchalign::errors::BenchAlignError;
use benchalign::io::{emit, load_pairs, AlignmentRecord, OutputFormat, SequencePair};

mod cli;

use cli::{AlignArgs, CliArgs, CliSubcommand, EngineKind};

/// Install the stderr logger. `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).init();

    Ok(())
}

/// Parse a single value, or two comma-separated values for a two-piece model.
fn parse_tiers(name: &str, value: &str) -> Result<(i32, Option<i32>)> {
    let values = value.split(',')
        .map(|v| v.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid {name} value: {value:?}"))?;

    match values[..] {
        [first] => Ok((first, None)),
        [first, second] => Ok((first, Some(second))),
        _ => bail!("Expected one or two comma-separated {name} values, got {value:?}"),
    }
}

fn penalties_from_args(args: &AlignArgs) -> Result<PenaltyModel> {
    let (gap_open, gap_open2) = parse_tiers("gap open", &args.cost_gap_open)?;
    let (gap_extend, gap_extend2) = parse_tiers("gap extend", &args.cost_gap_extend)?;

    let penalties = PenaltyModel::from_parts(
        args.score_match,
        args.cost_mismatch,
        gap_open,
        gap_extend,
        gap_open2,
        gap_extend2,
    )?;

    Ok(penalties)
}

#[derive(Debug, Default)]
struct BenchmarkSummary {
    num_aligned: usize,
    num_failed: usize,
    num_check_failed: usize,
    total_align_time: Duration,
}

impl BenchmarkSummary {
    fn add(&mut self, record: &AlignmentRecord, check_failed: bool) {
        if record.is_ok() {
            self.num_aligned += 1;
        } else {
            self.num_failed += 1;
        }

        if check_failed {
            self.num_check_failed += 1;
        }

        self.total_align_time += Duration::from_nanos(record.elapsed_ns);
    }
}

/// Align all pairs on a pool of worker threads, and write the results in input order. With
/// `check`, each alignment is replayed against its pair.
fn align_all<F>(
    pairs: &[SequencePair],
    num_threads: usize,
    costs: &EngineCosts,
    format: OutputFormat,
    writer: &mut dyn Write,
    check: bool,
    align: F,
) -> Result<BenchmarkSummary>
where
    F: Fn(&SequencePair) -> Result<AlignmentResult, BenchAlignError> + Sync,
{
    let with_view = format == OutputFormat::Pretty;
    let (tx_work, rx_work) = crossbeam_channel::unbounded::<usize>();
    let (tx_out, rx_out) = crossbeam_channel::unbounded::<(usize, AlignmentRecord, bool)>();

    thread::scope(|scope| -> Result<BenchmarkSummary> {
        for _ in 0..num_threads.max(1) {
            let rx_work = rx_work.clone();
            let tx_out = tx_out.clone();
            let align = &align;

            scope.spawn(move || {
                while let Ok(ix) = rx_work.recv() {
                    let pair = &pairs[ix];

                    let start = Instant::now();
                    let result = align(pair);
                    let elapsed = start.elapsed();

                    if let Err(ref err) = result {
                        warn!(id = %pair.id, "Alignment failed: {err}");
                    }

                    let check_failed = check
                        && matches!(&result, Ok(aln) if !verify(&pair.pattern, &pair.text, aln));
                    if check_failed {
                        warn!(id = %pair.id, "Alignment does not fit the input sequences");
                    }

                    let record = AlignmentRecord::new(pair, &result, costs, elapsed, with_view);
                    if tx_out.send((ix, record, check_failed)).is_err() {
                        break;
                    }
                }
            });
        }

        drop(tx_out);

        for ix in 0..pairs.len() {
            tx_work.send(ix)?;
        }

        drop(tx_work);

        let mut pending = FxHashMap::default();
        let mut next_ix = 0;
        let mut summary = BenchmarkSummary::default();

        while let Ok((ix, record, check_failed)) = rx_out.recv() {
            pending.insert(ix, (record, check_failed));

            while let Some((record, check_failed)) = pending.remove(&next_ix) {
                summary.add(&record, check_failed);
                emit(writer, format, &record)?;
                next_ix += 1;
            }
        }

        Ok(summary)
    })
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let penalties = penalties_from_args(args)?;
    let costs = translate(&penalties)
        .with_context(|| "Could not translate alignment penalties.")?;
    debug!(?costs, "Translated penalties");

    let pairs = load_pairs(&args.sequences, args.input_type.map(Into::into))
        .with_context(|| format!("Could not read sequence pairs from {:?}.", args.sequences))?;
    info!("Loaded {} sequence pairs", pairs.len());

    let mut writer: Box<dyn Write> = if let Some(output) = &args.output {
        Box::new(BufWriter::new(File::create(output)?))
    } else {
        Box::new(BufWriter::new(io::stdout().lock()))
    };

    let format = OutputFormat::from(args.output_type);
    let config = DriverConfig {
        padding: args.padding,
        xdrop: args.xdrop,
        fill_cap: args.fill_cap.unwrap_or(u32::MAX),
        max_fill_steps: None,
    };

    let start = Instant::now();
    let summary = match args.engine {
        EngineKind::Banded => {
            let driver = BandedAlignmentDriver::new(config);
            let engine = driver.init_engine::<ReferenceBandedEngine>(&costs)
                .with_context(|| "Could not initialize the banded engine.")?
                .with_block_size(args.block_size);

            align_all(&pairs, args.threads, &costs, format, &mut writer, args.check, |pair| {
                driver.align(&engine, &pair.pattern, &pair.text)
            })?
        },
        EngineKind::Full => {
            let engine = FullMatrixEngine::init(&costs)
                .with_context(|| "Could not initialize the full matrix engine.")?;

            align_all(&pairs, args.threads, &costs, format, &mut writer, args.check, |pair| {
                let mut engine = engine.clone();
                align_packed(&mut engine, &pair.pattern, &pair.text)
            })?
        },
    };

    writer.flush()?;

    let wall_time = start.elapsed();
    let mean_time = summary.total_align_time
        .checked_div(pairs.len().max(1) as u32)
        .unwrap_or_default();

    info!(
        "Aligned {} pairs ({} failed) in {:.3?}, total alignment time {:.3?}, mean {:.3?} per pair",
        summary.num_aligned, summary.num_failed, wall_time, summary.total_align_time, mean_time
    );

    if args.check {
        info!("{} alignments failed the check", summary.num_check_failed);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    match &args.command {
        Some(CliSubcommand::Align(v)) => align_subcommand(v)?,
        None => bail!("No subcommand given."),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use benchalign::aligner::Operation;

    use super::*;

    fn costs() -> EngineCosts {
        translate(&PenaltyModel::SingleAffine { match_score: 1, mismatch: 4, gap_open: 6, gap_extend: 2 }).unwrap()
    }

    /// Labels every position as a match, without looking at the sequences.
    fn all_matches(pair: &SequencePair) -> Result<AlignmentResult, BenchAlignError> {
        Ok(std::iter::repeat(Operation::Match).take(pair.pattern.len()).collect())
    }

    #[test]
    fn test_align_all_counts_failed_checks() {
        let pairs = vec![
            SequencePair::new("pair1", b"ACGT".to_vec(), b"ACGT".to_vec()),
            SequencePair::new("pair2", b"ACGT".to_vec(), b"ACCT".to_vec()),
            SequencePair::new("pair3", b"ACGT".to_vec(), b"AC".to_vec()),
        ];

        let mut out = Vec::new();
        let summary = align_all(&pairs, 2, &costs(), OutputFormat::Cigar, &mut out, true, all_matches).unwrap();

        assert_eq!(summary.num_aligned, 3);
        assert_eq!(summary.num_failed, 0);
        assert_eq!(summary.num_check_failed, 2);

        let out = String::from_utf8(out).unwrap();
        let ids: Vec<_> = out.lines().map(|line| line.split('\t').next().unwrap()).collect();
        assert_eq!(ids, ["pair1", "pair2", "pair3"]);

        let mut out = Vec::new();
        let summary = align_all(&pairs, 1, &costs(), OutputFormat::Cigar, &mut out, false, all_matches).unwrap();
        assert_eq!(summary.num_check_failed, 0);
    }

    #[test]
    fn test_align_all_checks_real_alignments() {
        let pairs = vec![
            SequencePair::new("pair1", b"ACGTACGT".to_vec(), b"ACGACGTT".to_vec()),
            SequencePair::new("pair2", b"ACGT".to_vec(), b"AGT".to_vec()),
        ];

        let costs = costs();
        let engine = FullMatrixEngine::init(&costs).unwrap();

        let mut out = Vec::new();
        let summary = align_all(&pairs, 2, &costs, OutputFormat::Json, &mut out, true, |pair| {
            let mut engine = engine.clone();
            align_packed(&mut engine, &pair.pattern, &pair.text)
        }).unwrap();

        assert_eq!(summary.num_aligned, 2);
        assert_eq!(summary.num_check_failed, 0);
    }
}
