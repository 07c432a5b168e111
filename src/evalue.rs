//! Bit widths and the quantised error-value encoding shared by overlaps and best edges.

/// Bits needed to hold the longest supported read length.
pub const MAX_READLEN_BITS: u32 = 21;

/// Longest supported read; also the largest magnitude a hang may take.
pub const MAX_READLEN: u32 = (1 << MAX_READLEN_BITS) - 1;

/// Bits used for a quantised error value.
pub const MAX_EVALUE_BITS: u32 = 12;

/// Largest representable error value.
pub const MAX_EVALUE: u32 = (1 << MAX_EVALUE_BITS) - 1;

/// Error values per unit of error rate; one step is 0.01% error.
pub const EVALUE_SCALE: f64 = 10_000.0;

/// Highest error rate that survives encoding without saturating.
pub const MAX_ERATE: f64 = MAX_EVALUE as f64 / EVALUE_SCALE;

/// Quantise an error rate (fraction, not percent). Rates above [`MAX_ERATE`]
/// saturate and negative or NaN rates encode as zero.
pub fn encode_evalue(erate: f64) -> u32 {
    if !(erate > 0.0) {
        return 0;
    }
    let scaled = (erate * EVALUE_SCALE).round();
    if scaled >= MAX_EVALUE as f64 {
        MAX_EVALUE
    } else {
        scaled as u32
    }
}

/// Inverse of [`encode_evalue`].
pub fn decode_evalue(evalue: u32) -> f64 {
    evalue.min(MAX_EVALUE) as f64 / EVALUE_SCALE
}
