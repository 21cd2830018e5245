pub mod errors;
pub mod sequence;
pub mod aligner;
pub mod engine;
pub mod io;
