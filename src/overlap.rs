//! Overlap records as supplied by the overlap store, and the classification and
//! scoring rules used to pick best edges.

use crate::evalue::{decode_evalue, MAX_EVALUE, MAX_EVALUE_BITS, MAX_READLEN};
use crate::GraphError;

/// A candidate overlap from read `a` to read `b`.
///
/// `a_hang` is the offset of b's start past a's start and `b_hang` the offset of
/// b's end past a's end, both in a's coordinates. `flipped` is set when b is
/// reverse-complemented relative to a.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Overlap {
    pub a_id: u32,
    pub b_id: u32,
    pub a_hang: i32,
    pub b_hang: i32,
    pub flipped: bool,
    pub evalue: u32,
}

impl Overlap {
    pub fn new(a_id: u32, b_id: u32, a_hang: i32, b_hang: i32, flipped: bool, evalue: u32) -> Self {
        Self {
            a_id,
            b_id,
            a_hang,
            b_hang,
            flipped,
            evalue,
        }
    }

    /// Reject hangs or error values that cannot be packed into a best edge.
    pub fn validate(&self) -> Result<(), GraphError> {
        for hang in [self.a_hang, self.b_hang] {
            if hang.unsigned_abs() > MAX_READLEN {
                return Err(GraphError::HangOutOfRange(hang as i64));
            }
        }
        if self.evalue > MAX_EVALUE {
            return Err(GraphError::EvalueOutOfRange(self.evalue));
        }
        Ok(())
    }

    /// The same overlap seen from read `b`.
    ///
    /// Hangs are negated with saturation, so an overlap that never passed
    /// [`Overlap::validate`] still swaps into one that fails it.
    pub fn swapped(&self) -> Self {
        let (a_hang, b_hang) = if self.flipped {
            (self.b_hang, self.a_hang)
        } else {
            (self.a_hang.saturating_neg(), self.b_hang.saturating_neg())
        };
        Self {
            a_id: self.b_id,
            b_id: self.a_id,
            a_hang,
            b_hang,
            flipped: self.flipped,
            evalue: self.evalue,
        }
    }

    pub fn erate(&self) -> f64 {
        decode_evalue(self.evalue)
    }

    /// One read lies entirely within the other.
    pub fn is_containment(&self) -> bool {
        (self.a_hang <= 0 && self.b_hang >= 0) || (self.a_hang >= 0 && self.b_hang <= 0)
    }

    pub fn is_dovetail(&self) -> bool {
        !self.is_containment()
    }

    /// Read `a` lies inside read `b`. Identical extents resolve to the larger id
    /// being contained so exactly one of a pair of duplicates is marked.
    pub fn a_is_contained(&self) -> bool {
        if self.a_hang == 0 && self.b_hang == 0 {
            return self.a_id > self.b_id;
        }
        self.a_hang <= 0 && self.b_hang >= 0
    }

    /// Read `a` contains read `b`.
    pub fn a_is_container(&self) -> bool {
        if self.a_hang == 0 && self.b_hang == 0 {
            return self.a_id < self.b_id;
        }
        self.a_hang >= 0 && self.b_hang <= 0
    }

    pub fn a_end_is_3prime(&self) -> bool {
        self.a_hang > 0 && self.b_hang > 0
    }

    pub fn a_end_is_5prime(&self) -> bool {
        self.a_hang < 0 && self.b_hang < 0
    }

    /// Which end of `b` the dovetail joins. Meaningless for containments.
    pub fn b_end_is_3prime(&self) -> bool {
        (self.a_end_is_5prime() && !self.flipped) || (self.a_end_is_3prime() && self.flipped)
    }

    /// Mean of the spans covered on `a` and on `b`.
    pub fn overlap_length(&self, a_len: u32, b_len: u32) -> u32 {
        let (a_len, b_len) = (a_len as i64, b_len as i64);
        let (a_hang, b_hang) = (self.a_hang as i64, self.b_hang as i64);

        let (a_ovl, b_ovl) = match (a_hang < 0, b_hang < 0) {
            (true, true) => (a_len + b_hang, b_len + a_hang),
            (true, false) => (a_len, b_len + a_hang - b_hang),
            (false, true) => (a_len - a_hang + b_hang, b_len),
            (false, false) => (a_len - a_hang, b_len - b_hang),
        };

        ((a_ovl + b_ovl) / 2).clamp(0, u32::MAX as i64) as u32
    }

    /// Score used to arbitrate between candidates for the same read end.
    ///
    /// Dovetails rank by overlap length and then by error; containments all
    /// cover the whole contained read and rank by error alone. Larger is better.
    pub fn score(&self, a_len: u32, b_len: u32) -> u64 {
        let rate = (MAX_EVALUE - self.evalue.min(MAX_EVALUE)) as u64;
        if self.is_containment() {
            return rate;
        }
        ((self.overlap_length(a_len, b_len) as u64) << MAX_EVALUE_BITS) | rate
    }
}
