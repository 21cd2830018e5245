use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// The stage of the alignment pipeline that produced an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlignStage {
    Encode,
    Fill,
    Trace,
    Decode,
    Reconcile,
}

impl Display for AlignStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Encode => "encode",
            Self::Fill => "fill",
            Self::Trace => "trace",
            Self::Decode => "decode",
            Self::Reconcile => "reconcile",
        };

        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum BenchAlignError {
    /// The input sequence contains a symbol outside the nucleotide alphabet
    InvalidSymbol { position: usize, symbol: u8 },

    /// A packed operation used an operation selector outside `{Match, Delete, Insert}`
    InvalidOperationCode { index: usize, code: u32 },

    /// The decoded operations do not add up to the aligned length reported by the engine
    DecodedLengthMismatch { decoded: usize, reported: usize },

    /// An operation wanted to consume a pattern or text position past the end of the input
    OperationsExceedInput { operation_index: usize, pattern_pos: usize, text_pos: usize },

    /// The operations did not account for the full pattern and text
    UnconsumedInput {
        pattern_consumed: usize,
        pattern_length: usize,
        text_consumed: usize,
        text_length: usize,
    },

    /// Could not reserve memory for an alignment buffer
    AllocationFailure { stage: AlignStage, requested: usize },

    /// The alignment engine signalled an internal fault
    EngineFailure { stage: AlignStage, reason: String },

    /// The penalty parameters can not be translated to engine costs
    InvalidPenalties(String),

    /// The input file is not in a supported sequence pair format. `record` is the line number
    /// for line based inputs, and the record number for FASTA.
    MalformedInput { record: usize, reason: String },

    /// Could not serialize an alignment result
    SerializationError { source: serde_json::Error },

    /// Other IO errors
    IOError(io::Error),
}

impl BenchAlignError {
    /// The pipeline stage that failed, if this error originates from an alignment call.
    pub fn stage(&self) -> Option<AlignStage> {
        match *self {
            Self::InvalidSymbol { .. } => Some(AlignStage::Encode),
            Self::InvalidOperationCode { .. } | Self::DecodedLengthMismatch { .. } => Some(AlignStage::Decode),
            Self::OperationsExceedInput { .. } | Self::UnconsumedInput { .. } => Some(AlignStage::Reconcile),
            Self::AllocationFailure { stage, .. } | Self::EngineFailure { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the error indicates the engine and the adapter disagree about the alignment.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOperationCode { .. }
                | Self::DecodedLengthMismatch { .. }
                | Self::OperationsExceedInput { .. }
                | Self::UnconsumedInput { .. }
        )
    }
}

impl Error for BenchAlignError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            Self::SerializationError { ref source } => Some(source),
            Self::IOError(ref source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for BenchAlignError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}

impl From<serde_json::Error> for BenchAlignError {
    fn from(value: serde_json::Error) -> Self {
        Self::SerializationError { source: value }
    }
}

impl Display for BenchAlignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::InvalidSymbol { position, symbol } =>
                write!(f, "Invalid nucleotide {:?} at position {position}!", symbol as char),
            Self::InvalidOperationCode { index, code } =>
                write!(f, "Packed operation #{index} has unknown operation code {code}!"),
            Self::DecodedLengthMismatch { decoded, reported } =>
                write!(f, "Decoded {decoded} operations, but the engine reported an aligned length of {reported}!"),
            Self::OperationsExceedInput { operation_index, pattern_pos, text_pos } =>
                write!(f, "Operation #{operation_index} runs past the end of the input (pattern position {pattern_pos}, text position {text_pos})!"),
            Self::UnconsumedInput { pattern_consumed, pattern_length, text_consumed, text_length } =>
                write!(f, "Alignment consumed {pattern_consumed}/{pattern_length} pattern and {text_consumed}/{text_length} text positions!"),
            Self::AllocationFailure { stage, requested } =>
                write!(f, "Could not allocate {requested} elements during {stage}!"),
            Self::EngineFailure { stage, ref reason } =>
                write!(f, "Alignment engine failed during {stage}: {reason}"),
            Self::InvalidPenalties(ref reason) =>
                write!(f, "Invalid alignment penalties: {reason}"),
            Self::MalformedInput { record, ref reason } =>
                write!(f, "Malformed input at record {record}: {reason}"),
            Self::SerializationError { source: _ } =>
                write!(f, "Could not serialize alignment result!"),
            Self::IOError(ref err) =>
                err.fmt(f),
        }
    }
}
