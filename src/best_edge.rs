//! Bit-packed record of the single best overlap known for one read end.

use std::fmt;

use crate::evalue::{decode_evalue, MAX_EVALUE, MAX_EVALUE_BITS, MAX_READLEN, MAX_READLEN_BITS};
use crate::overlap::Overlap;
use crate::read_end::ReadEnd;
use crate::GraphError;

const HANG_BITS: u32 = MAX_READLEN_BITS + 1;

const AHANG_SHIFT: u32 = 1;
const BHANG_SHIFT: u32 = AHANG_SHIFT + HANG_BITS;
const EVALUE_SHIFT: u32 = BHANG_SHIFT + HANG_BITS;

/// Bits used by the end flag, both hangs and the error value.
pub const PACKED_BITS: u32 = EVALUE_SHIFT + MAX_EVALUE_BITS;

const _: () = assert!(
    PACKED_BITS <= 64,
    "not enough bits to store best edges; decrease MAX_EVALUE_BITS or MAX_READLEN_BITS"
);

const HANG_MASK: u64 = (1 << HANG_BITS) - 1;
const EVALUE_MASK: u64 = (1 << MAX_EVALUE_BITS) - 1;

fn pack_hang(hang: i32) -> u64 {
    (hang as i64 as u64) & HANG_MASK
}

fn unpack_hang(bits: u64) -> i32 {
    let shift = 64 - HANG_BITS;
    (((bits & HANG_MASK) << shift) as i64 >> shift) as i32
}

/// Overlap from an implied source read end (the slot it is stored in) to a
/// partner read. Hangs are relative to the source read, exactly as in the
/// overlap it was built from. A partner id of zero means "no edge".
///
/// For dovetails the end flag names the partner end that is joined; for a
/// containment it records whether the partner is flipped.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BestEdge {
    read_id: u32,
    packed: u64,
}

impl BestEdge {
    pub fn new(
        read_id: u32,
        read3p: bool,
        a_hang: i32,
        b_hang: i32,
        evalue: u32,
    ) -> Result<Self, GraphError> {
        for hang in [a_hang, b_hang] {
            if hang.unsigned_abs() > MAX_READLEN {
                return Err(GraphError::HangOutOfRange(hang as i64));
            }
        }
        if evalue > MAX_EVALUE {
            return Err(GraphError::EvalueOutOfRange(evalue));
        }

        let packed = (read3p as u64)
            | (pack_hang(a_hang) << AHANG_SHIFT)
            | (pack_hang(b_hang) << BHANG_SHIFT)
            | ((evalue as u64 & EVALUE_MASK) << EVALUE_SHIFT);

        Ok(Self { read_id, packed })
    }

    /// Build the edge an overlap implies for its `a` read.
    pub fn from_overlap(overlap: &Overlap) -> Result<Self, GraphError> {
        let read3p = if overlap.is_containment() {
            overlap.flipped
        } else {
            overlap.b_end_is_3prime()
        };
        Self::new(
            overlap.b_id,
            read3p,
            overlap.a_hang,
            overlap.b_hang,
            overlap.evalue,
        )
    }

    /// Verify at startup that extreme values survive a pack/unpack cycle.
    pub fn self_test() -> Result<(), GraphError> {
        if PACKED_BITS > 64 {
            return Err(GraphError::BitWidthOverflow(PACKED_BITS));
        }

        let extreme = MAX_READLEN as i32;
        let samples = [
            (true, -extreme, extreme, MAX_EVALUE),
            (false, extreme, -extreme, 0),
            (true, -1, 1, 1),
            (false, 0, 0, MAX_EVALUE - 1),
        ];
        for (read3p, a_hang, b_hang, evalue) in samples {
            let edge = Self::new(u32::MAX, read3p, a_hang, b_hang, evalue)?;
            let unpacked = (
                edge.read_id(),
                edge.read3p(),
                edge.a_hang(),
                edge.b_hang(),
                edge.evalue(),
            );
            if unpacked != (u32::MAX, read3p, a_hang, b_hang, evalue) {
                return Err(GraphError::SelfTest(format!(
                    "packed ({read3p}, {a_hang}, {b_hang}, {evalue}) but read back {unpacked:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.read_id == 0
    }

    pub fn read_id(&self) -> u32 {
        self.read_id
    }

    pub fn read3p(&self) -> bool {
        self.packed & 1 == 1
    }

    pub fn read5p(&self) -> bool {
        !self.read3p()
    }

    pub fn a_hang(&self) -> i32 {
        unpack_hang(self.packed >> AHANG_SHIFT)
    }

    pub fn b_hang(&self) -> i32 {
        unpack_hang(self.packed >> BHANG_SHIFT)
    }

    pub fn evalue(&self) -> u32 {
        ((self.packed >> EVALUE_SHIFT) & EVALUE_MASK) as u32
    }

    pub fn erate(&self) -> f64 {
        decode_evalue(self.evalue())
    }

    /// The partner read end this edge arrives at.
    pub fn partner(&self) -> ReadEnd {
        ReadEnd::new(self.read_id, self.read3p())
    }

    /// Rebuild the overlap this edge was taken from, as seen from `source`.
    ///
    /// Only meaningful for dovetails, where the end flag and the hangs together
    /// determine orientation.
    pub fn to_overlap(&self, source: u32) -> Overlap {
        let a3p = self.a_hang() > 0;
        // a3' joins b5' unless flipped; a5' joins b3' unless flipped
        let flipped = a3p == self.read3p();
        Overlap::new(
            source,
            self.read_id,
            self.a_hang(),
            self.b_hang(),
            flipped,
            self.evalue(),
        )
    }
}

impl fmt::Debug for BestEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestEdge")
            .field("read_id", &self.read_id)
            .field("read3p", &self.read3p())
            .field("a_hang", &self.a_hang())
            .field("b_hang", &self.b_hang())
            .field("evalue", &self.evalue())
            .finish()
    }
}
