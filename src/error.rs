use crate::evalue::{MAX_EVALUE, MAX_READLEN};

/// Errors returned while loading overlaps or building the graph.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not enough bits to store best edges: {0} bits required, 64 available")]
    BitWidthOverflow(u32),
    #[error("best edge packing self-test failed: {0}")]
    SelfTest(String),
    #[error("read id {read_id} outside the read population 1..={num_reads}")]
    ReadOutOfRange { read_id: u32, num_reads: u32 },
    #[error("hang {0} exceeds the maximum read length {max}", max = MAX_READLEN)]
    HangOutOfRange(i64),
    #[error("error value {0} exceeds {max}", max = MAX_EVALUE)]
    EvalueOutOfRange(u32),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}
