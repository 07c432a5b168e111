use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::evalue::encode_evalue;
use crate::overlap::Overlap;
use crate::GraphError;

/// Per-read access to precomputed overlaps.
///
/// Reads are numbered `1..=num_reads`. Every overlap returned for read `r`
/// has `a_id == r`; an overlap between two reads is expected once from each
/// side. Implementations must be `Send + Sync` so scoring can fan out across
/// threads.
pub trait OverlapSource: Send + Sync {
    fn num_reads(&self) -> u32;
    /// Length of a read in bases, zero for unknown reads.
    fn read_length(&self, read_id: u32) -> u32;
    fn overlaps(&self, read_id: u32) -> &[Overlap];
}

/// Overlaps held in memory, grouped by their `a` read.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOverlapSource {
    lengths: Vec<u32>,
    overlaps: Vec<Vec<Overlap>>,
}

impl InMemoryOverlapSource {
    /// `read_lengths[i]` is the length of read `i + 1`.
    pub fn new(read_lengths: &[u32]) -> Self {
        let mut lengths = Vec::with_capacity(read_lengths.len() + 1);
        lengths.push(0);
        lengths.extend_from_slice(read_lengths);
        InMemoryOverlapSource {
            overlaps: vec![Vec::new(); lengths.len()],
            lengths,
        }
    }

    /// Build from overlaps, optionally adding each one's view from `b` as well.
    pub fn with_overlaps<I>(read_lengths: &[u32], overlaps: I, mirror: bool) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Overlap>,
    {
        let mut source = Self::new(read_lengths);
        for overlap in overlaps {
            if mirror {
                source.add_mirrored(overlap)?;
            } else {
                source.add(overlap)?;
            }
        }
        Ok(source)
    }

    fn check_read(&self, read_id: u32) -> Result<(), GraphError> {
        if read_id == 0 || read_id > self.num_reads() {
            return Err(GraphError::ReadOutOfRange {
                read_id,
                num_reads: self.num_reads(),
            });
        }
        Ok(())
    }

    /// Store an overlap under its `a` read.
    pub fn add(&mut self, overlap: Overlap) -> Result<(), GraphError> {
        self.check_read(overlap.a_id)?;
        self.check_read(overlap.b_id)?;
        overlap.validate()?;
        self.overlaps[overlap.a_id as usize].push(overlap);
        Ok(())
    }

    /// Store an overlap under both of its reads.
    pub fn add_mirrored(&mut self, overlap: Overlap) -> Result<(), GraphError> {
        self.add(overlap)?;
        self.add(overlap.swapped())
    }

    pub fn num_overlaps(&self) -> usize {
        self.overlaps.iter().map(|v| v.len()).sum()
    }

    /// Parse a read-length table and an overlap table.
    pub fn from_readers<L: BufRead, O: BufRead>(
        lengths: L,
        overlaps: O,
        mirror: bool,
    ) -> Result<Self, GraphError> {
        let read_lengths = read_lengths_table(lengths)?;
        let mut source = Self::new(&read_lengths);
        for (idx, line) in overlaps.lines().enumerate() {
            let line = line?;
            let Some(overlap) = parse_overlap_line(&line, idx + 1)? else {
                continue;
            };
            let added = if mirror {
                source.add_mirrored(overlap)
            } else {
                source.add(overlap)
            };
            added.map_err(|err| GraphError::Parse {
                line: idx + 1,
                reason: err.to_string(),
            })?;
        }
        Ok(source)
    }

    /// Open (optionally gzipped) read-length and overlap tables.
    pub fn open<P: AsRef<Path>>(lengths: P, overlaps: P, mirror: bool) -> Result<Self, GraphError> {
        let lengths = open_reader(lengths.as_ref())?;
        let overlaps = open_reader(overlaps.as_ref())?;
        Self::from_readers(lengths, overlaps, mirror)
    }
}

impl OverlapSource for InMemoryOverlapSource {
    fn num_reads(&self) -> u32 {
        self.lengths.len().saturating_sub(1) as u32
    }

    fn read_length(&self, read_id: u32) -> u32 {
        self.lengths.get(read_id as usize).copied().unwrap_or(0)
    }

    fn overlaps(&self, read_id: u32) -> &[Overlap] {
        self.overlaps
            .get(read_id as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

/// Open a text table, decompressing `.gz`/`.bgz` files on the fly.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, GraphError> {
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn data_fields(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.split_whitespace().collect())
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str, line: usize) -> Result<T, GraphError> {
    field.parse().map_err(|_| GraphError::Parse {
        line,
        reason: format!("invalid {what} '{field}'"),
    })
}

/// Largest jump past the highest read id seen so far that a length table may make.
const MAX_READ_ID_GAP: usize = 1 << 20;

/// Parse `read_id length` lines. Ids may appear in any order; gaps get length 0.
pub fn read_lengths_table<R: BufRead>(reader: R) -> Result<Vec<u32>, GraphError> {
    let mut lengths: Vec<u32> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(fields) = data_fields(&line) else {
            continue;
        };
        if fields.len() < 2 {
            return Err(GraphError::Parse {
                line: idx + 1,
                reason: "expected 'read_id length'".to_string(),
            });
        }
        let read_id: u32 = parse_field(fields[0], "read id", idx + 1)?;
        let length: u32 = parse_field(fields[1], "read length", idx + 1)?;
        if read_id == 0 {
            return Err(GraphError::Parse {
                line: idx + 1,
                reason: "read ids start at 1".to_string(),
            });
        }
        let slot = read_id as usize - 1;
        if slot >= lengths.len() + MAX_READ_ID_GAP {
            return Err(GraphError::Parse {
                line: idx + 1,
                reason: format!(
                    "read id {} is more than {} past the last id seen ({})",
                    read_id,
                    MAX_READ_ID_GAP,
                    lengths.len()
                ),
            });
        }
        if slot >= lengths.len() {
            lengths.resize(slot + 1, 0);
        }
        lengths[slot] = length;
    }
    Ok(lengths)
}

/// Parse one `a b a_hang b_hang flip erate` line. Blank and `#` lines yield `None`.
///
/// `flip` accepts `0`/`1`, `N`/`I`, `f`/`t` or `false`/`true`; `erate` is a
/// fraction (0.02 for 2% error).
pub fn parse_overlap_line(line: &str, line_no: usize) -> Result<Option<Overlap>, GraphError> {
    let Some(fields) = data_fields(line) else {
        return Ok(None);
    };
    if fields.len() < 6 {
        return Err(GraphError::Parse {
            line: line_no,
            reason: format!("expected 6 fields, found {}", fields.len()),
        });
    }

    let flipped = match fields[4].to_ascii_lowercase().as_str() {
        "0" | "n" | "f" | "false" => false,
        "1" | "i" | "t" | "true" => true,
        other => {
            return Err(GraphError::Parse {
                line: line_no,
                reason: format!("invalid orientation '{other}'"),
            })
        }
    };
    let erate: f64 = parse_field(fields[5], "error rate", line_no)?;

    Ok(Some(Overlap::new(
        parse_field(fields[0], "read id", line_no)?,
        parse_field(fields[1], "read id", line_no)?,
        parse_field(fields[2], "a hang", line_no)?,
        parse_field(fields[3], "b hang", line_no)?,
        flipped,
        encode_evalue(erate),
    )))
}
