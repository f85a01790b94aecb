use crate::{Block, BlockRange, Error};
use core::{fmt, str::FromStr};

/// Literal prefix carried by every membership ID.
pub const PREFIX: &str = "269";

/// Number of zero-padded decimal digits following [`PREFIX`].
pub const SUFFIX_DIGITS: usize = 5;

/// Total length of a rendered membership ID.
pub const ID_LEN: usize = PREFIX.len() + SUFFIX_DIGITS;

/// Largest suffix representable in [`SUFFIX_DIGITS`] digits.
pub const MAX_SUFFIX: u32 = 99_999;

/// Size of the suffix space (`00000`..=`99999`). This is the hard ceiling on
/// the number of membership IDs that can ever exist.
pub const CAPACITY: u32 = MAX_SUFFIX + 1;

/// Returns `true` if `id` is exactly [`PREFIX`] followed by [`SUFFIX_DIGITS`]
/// ASCII digits.
///
/// # Example
/// ```
/// use memberid::validate_format;
///
/// assert!(validate_format("26900001"));
/// assert!(!validate_format("12300001")); // wrong prefix
/// assert!(!validate_format("2690000")); // too short
/// assert!(!validate_format("269ABCDE")); // non-numeric
/// ```
pub fn validate_format(id: &str) -> bool {
    id.len() == ID_LEN
        && id.starts_with(PREFIX)
        && id.as_bytes()[PREFIX.len()..].iter().all(u8::is_ascii_digit)
}

/// A membership ID: the literal `269` followed by a zero-padded 5-digit
/// suffix, e.g. `26900042`.
///
/// Internally only the numeric suffix is stored, so the type is `Copy` and
/// cheap to hash. The rendered form is produced by [`fmt::Display`] and
/// parsed back with [`FromStr`].
///
/// # Example
/// ```
/// use memberid::MembershipId;
///
/// let id: MembershipId = "26900042".parse().unwrap();
/// assert_eq!(id.suffix(), 42);
/// assert_eq!(id.to_string(), "26900042");
/// assert_eq!(id.block().index(), 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MembershipId {
    suffix: u32,
}

impl MembershipId {
    /// Creates an ID from its numeric suffix, or `None` if the suffix does not
    /// fit in [`SUFFIX_DIGITS`] digits.
    pub const fn from_suffix(suffix: u32) -> Option<Self> {
        if suffix > MAX_SUFFIX {
            None
        } else {
            Some(Self { suffix })
        }
    }

    /// Callers must have already bounded `suffix` by [`MAX_SUFFIX`].
    pub(crate) const fn from_suffix_unchecked(suffix: u32) -> Self {
        debug_assert!(suffix <= MAX_SUFFIX);
        Self { suffix }
    }

    /// The numeric part after the prefix.
    pub const fn suffix(&self) -> u32 {
        self.suffix
    }

    /// The block whose range contains this ID's suffix.
    ///
    /// Suffix `00000` is never issued but maps to block 0.
    pub const fn block(&self) -> Block {
        Block::containing(self.suffix)
    }

    /// Returns `true` if the suffix falls within `range`.
    pub const fn is_in(&self, range: BlockRange) -> bool {
        range.contains(self.suffix as u64)
    }
}

impl fmt::Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{:0width$}", self.suffix, width = SUFFIX_DIGITS)
    }
}

impl FromStr for MembershipId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !validate_format(s) {
            return Err(Error::InvalidFormat(s.to_owned()));
        }
        // Five ASCII digits always fit in a u32 and never exceed MAX_SUFFIX.
        let suffix = s.as_bytes()[PREFIX.len()..]
            .iter()
            .fold(0_u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        Ok(Self { suffix })
    }
}

impl TryFrom<&str> for MembershipId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MembershipId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MembershipId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
