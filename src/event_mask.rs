use std::{fmt, ops};

/// A set of readiness kinds: readable, writable and exceptional.
///
/// The same type is used for *interest*, what a caller asks to be notified
/// about when [adding] a descriptor, and for *readiness*, what the kernel
/// reported for it after a [`wait`]. A readiness mask returned by a
/// [`Multiplexer`] is always a subset of the descriptor's interest.
///
/// ```
/// use fdmux::EventMask;
///
/// let mask = EventMask::READABLE | EventMask::WRITABLE;
/// assert!(mask.is_readable());
/// assert!(!mask.is_exceptional());
/// assert_eq!(mask.bits(), 3);
/// ```
///
/// [adding]: crate::Multiplexer::add
/// [`wait`]: crate::Multiplexer::wait
/// [`Multiplexer`]: crate::Multiplexer
#[derive(Copy, PartialEq, Eq, Clone, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct EventMask(u8);

// These must be unique.
const READABLE: u8 = 0b001;
const WRITABLE: u8 = 0b010;
const EXCEPTIONAL: u8 = 0b100;
const ALL: u8 = READABLE | WRITABLE | EXCEPTIONAL;

impl EventMask {
    /// The empty set.
    pub const NONE: EventMask = EventMask(0);

    /// Reading will not block.
    pub const READABLE: EventMask = EventMask(READABLE);

    /// Writing will not block.
    pub const WRITABLE: EventMask = EventMask(WRITABLE);

    /// An exceptional condition: out-of-band data, error or hang-up.
    pub const EXCEPTIONAL: EventMask = EventMask(EXCEPTIONAL);

    /// Every kind at once.
    pub const ALL: EventMask = EventMask(ALL);

    /// Builds a mask from its integer form, `None` if `bits` is outside
    /// `0..=7`.
    ///
    /// ```
    /// use fdmux::EventMask;
    ///
    /// assert_eq!(EventMask::from_bits(5), Some(EventMask::READABLE | EventMask::EXCEPTIONAL));
    /// assert_eq!(EventMask::from_bits(8), None);
    /// ```
    pub const fn from_bits(bits: u8) -> Option<EventMask> {
        if bits & !ALL == 0 {
            Some(EventMask(bits))
        } else {
            None
        }
    }

    /// Returns the integer form of the mask, always in `0..=7`.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Add together two masks.
    ///
    /// This does the same thing as the `BitOr` implementation, but is a
    /// constant function.
    #[allow(clippy::should_implement_trait)]
    pub const fn add(self, other: EventMask) -> EventMask {
        EventMask(self.0 | other.0)
    }

    /// Removes `other` from `self`.
    pub const fn remove(self, other: EventMask) -> EventMask {
        EventMask(self.0 & !other.0)
    }

    /// Returns true if no kind is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every kind in `other` is also in `self`.
    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if `self` and `other` share at least one kind.
    pub const fn intersects(self, other: EventMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if the value includes readable readiness.
    pub const fn is_readable(self) -> bool {
        (self.0 & READABLE) != 0
    }

    /// Returns true if the value includes writable readiness.
    pub const fn is_writable(self) -> bool {
        (self.0 & WRITABLE) != 0
    }

    /// Returns true if the value includes exceptional readiness.
    pub const fn is_exceptional(self) -> bool {
        (self.0 & EXCEPTIONAL) != 0
    }
}

impl ops::BitOr for EventMask {
    type Output = Self;

    #[inline]
    fn bitor(self, other: Self) -> Self {
        EventMask(self.0 | other.0)
    }
}

impl ops::BitOrAssign for EventMask {
    #[inline]
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl ops::BitAnd for EventMask {
    type Output = Self;

    #[inline]
    fn bitand(self, other: Self) -> Self {
        EventMask(self.0 & other.0)
    }
}

impl ops::BitAndAssign for EventMask {
    #[inline]
    fn bitand_assign(&mut self, other: Self) {
        self.0 &= other.0;
    }
}

impl fmt::Debug for EventMask {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(fmt, "NONE");
        }
        let mut one = false;
        if self.is_readable() {
            write!(fmt, "READABLE")?;
            one = true
        }
        if self.is_writable() {
            if one {
                write!(fmt, " | ")?
            }
            write!(fmt, "WRITABLE")?;
            one = true
        }
        if self.is_exceptional() {
            if one {
                write!(fmt, " | ")?
            }
            write!(fmt, "EXCEPTIONAL")?;
        }
        Ok(())
    }
}
