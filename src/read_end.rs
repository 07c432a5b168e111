use std::fmt;

/// One end of a read: a vertex of the best overlap graph and the cursor used
/// when walking it.
///
/// Ordering is by read id, then 5' before 3'. Read id 0 is the "no read"
/// sentinel that terminates a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadEnd {
    read_id: u32,
    end3p: bool,
}

impl ReadEnd {
    /// Sentinel returned when a walk runs off the end of a path.
    pub const NONE: ReadEnd = ReadEnd {
        read_id: 0,
        end3p: false,
    };

    pub fn new(read_id: u32, end3p: bool) -> Self {
        Self { read_id, end3p }
    }

    pub fn read_id(&self) -> u32 {
        self.read_id
    }

    pub fn read3p(&self) -> bool {
        self.end3p
    }

    pub fn read5p(&self) -> bool {
        !self.end3p
    }

    pub fn is_none(&self) -> bool {
        self.read_id == 0
    }

    /// The opposite end of the same read.
    pub fn other_end(&self) -> Self {
        Self {
            read_id: self.read_id,
            end3p: !self.end3p,
        }
    }
}

impl fmt::Display for ReadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.read_id, if self.end3p { "'3" } else { "'5" })
    }
}
