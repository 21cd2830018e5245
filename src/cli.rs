use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use benchalign::io::{InputFormat, OutputFormat};

/// The alignment engines available to the benchmark
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Block-wise banded fill with X-drop, driven section by section
    Banded,

    /// Full dynamic programming matrix with a packed CIGAR as output
    Full,
}

/// Input file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputType {
    /// A '>' pattern line followed by a '<' text line per pair
    Pairs,

    /// FASTA, each two consecutive records form a pair
    Fasta,
}

impl From<InputType> for InputFormat {
    fn from(value: InputType) -> Self {
        match value {
            InputType::Pairs => Self::Pairs,
            InputType::Fasta => Self::Fasta,
        }
    }
}

/// The various output formats for alignment results
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputType {
    /// Tab separated values with the CIGAR string
    Cigar,

    /// JSON lines
    Json,

    /// Human readable alignment view
    Pretty,
}

impl From<OutputType> for OutputFormat {
    fn from(value: OutputType) -> Self {
        match value {
            OutputType::Cigar => Self::Cigar,
            OutputType::Json => Self::Json,
            OutputType::Pretty => Self::Pretty,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliSubcommand {
    /// Globally align sequence pairs and report timings
    Align(AlignArgs),
}

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Sequence pairs to align. Gzipped files are supported.
    #[clap(help_heading = "Inputs")]
    pub sequences: PathBuf,

    /// Input file type. If not given, derived from the file extension.
    #[arg(value_enum, short = 'i', long)]
    #[clap(help_heading = "Inputs")]
    pub input_type: Option<InputType>,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    pub output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long, default_value = "cigar")]
    #[clap(help_heading = "Outputs")]
    pub output_type: OutputType,

    /// Replay every alignment against its input sequences, and report alignments that do not fit
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    pub check: bool,

    /// Alignment engine to benchmark
    #[arg(value_enum, short = 'E', long, default_value = "banded")]
    #[clap(help_heading = "Alignment configuration")]
    pub engine: EngineKind,

    /// Score for matching bases. Values of zero or less are treated as a score of one.
    #[arg(short = 'a', default_value = "0")]
    #[clap(help_heading = "Alignment configuration")]
    pub score_match: i32,

    /// Penalty for mismatching bases
    #[arg(short = 'n', default_value = "4")]
    #[clap(help_heading = "Alignment configuration")]
    pub cost_mismatch: i32,

    /// Penalty for opening a new gap. Use two comma-separated values for two-piece gap penalties.
    /// Examples: "6" (single-tier), "6,24" (two-piece)
    #[arg(short = 'g', default_value = "6")]
    #[clap(help_heading = "Alignment configuration")]
    pub cost_gap_open: String,

    /// Penalty for extending a gap. Use two comma-separated values for two-piece gap penalties.
    /// Examples: "2" (single-tier), "2,1" (two-piece)
    #[arg(short = 'e', default_value = "2")]
    #[clap(help_heading = "Alignment configuration")]
    pub cost_gap_extend: String,

    /// X-drop threshold of the banded engine
    #[arg(short = 'x', long, default_value = "100")]
    #[clap(help_heading = "Banded engine")]
    pub xdrop: i32,

    /// Number of padding symbols appended to each sequence
    #[arg(long, default_value = "32")]
    #[clap(help_heading = "Banded engine")]
    pub padding: usize,

    /// Maximum number of symbols the banded engine takes from a section per fill step
    #[arg(long, default_value = "32")]
    #[clap(help_heading = "Banded engine")]
    pub block_size: usize,

    /// Maximum number of positions a single fill step may advance. Unbounded if not given.
    #[arg(long)]
    #[clap(help_heading = "Banded engine")]
    pub fill_cap: Option<u32>,

    /// Number of worker threads
    #[arg(short = 't', long, default_value = "1")]
    #[clap(help_heading = "Performance")]
    pub threads: usize,
}
