use core::fmt;

/// Fixed-capacity inline arena name.
///
/// Arenas exist before any heap does, so names live in a fixed buffer the
/// size of the classic kernel name field. A name that does not fit is cut
/// at a character boundary and marked with a trailing `"..."`.
///
/// ### Examples
/// ```rust
/// # use vmem_arena::ArenaName;
/// let n = ArenaName::new("kmem");
/// assert_eq!(n.as_str(), "kmem");
///
/// let long = ArenaName::new("a-name-well-beyond-the-inline-capacity");
/// assert!(long.as_str().ends_with("..."));
/// ```
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct ArenaName {
    buf: [u8; Self::CAPACITY],
    len: usize,
}

// Truncation needs the marker plus at least one name byte.
const _: () = assert!(ArenaName::CAPACITY >= 4, "name buffer too small to truncate into");

impl ArenaName {
    /// Size of the inline name field, terminator included.
    pub const CAPACITY: usize = 28;

    pub(crate) const EMPTY: Self = Self {
        buf: [0; Self::CAPACITY],
        len: 0,
    };

    #[must_use]
    pub fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut buf = [0_u8; Self::CAPACITY];

        // A stored name always leaves the terminator byte free.
        if bytes.len() < Self::CAPACITY {
            buf[..bytes.len()].copy_from_slice(bytes);
            return Self {
                buf,
                len: bytes.len(),
            };
        }

        // Cut at a character boundary, then mark the cut.
        let mut cut = Self::CAPACITY - 4;
        while cut > 0 && !name.is_char_boundary(cut) {
            cut -= 1;
        }
        buf[..cut].copy_from_slice(&bytes[..cut]);
        buf[cut..cut + 3].copy_from_slice(b"...");
        Self { buf, len: cut + 3 }
    }

    /// The stored (possibly truncated) name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        // The buffer holds either a whole `&str` copy or a
        // boundary-respecting prefix plus ASCII dots.
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for ArenaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ArenaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaName({:?})", self.as_str())
    }
}

impl PartialEq<&str> for ArenaName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
