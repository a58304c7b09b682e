//! Open modes for split streams.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// How a split stream is opened.
///
/// Each variant fixes the capabilities of the session once, at open time.
///
/// | Mode | Mode string | Existing volumes | Readable | Writable |
/// |------|-------------|------------------|----------|----------|
/// | [`ReadOnly`][Self::ReadOnly] | `rb` | required, kept | yes | no |
/// | [`WriteCreate`][Self::WriteCreate] | `wb` | deleted | no | yes |
/// | [`ReadWriteExisting`][Self::ReadWriteExisting] | `r+b` | required, kept | yes | yes |
/// | [`WriteCreateUpdate`][Self::WriteCreateUpdate] | `w+b` | deleted | yes | yes |
///
/// # Example
///
/// ```rust
/// use volsplit::OpenMode;
///
/// let mode: OpenMode = "r+b".parse()?;
/// assert_eq!(mode, OpenMode::ReadWriteExisting);
/// assert!(mode.readable() && mode.writable());
/// # Ok::<(), volsplit::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read an existing stream.
    #[default]
    ReadOnly,
    /// Create a fresh stream for writing, deleting any previous volumes.
    WriteCreate,
    /// Read and modify an existing stream in place.
    ReadWriteExisting,
    /// Create a fresh stream for reading and writing.
    WriteCreateUpdate,
}

impl OpenMode {
    /// Returns true if the stream can be read.
    pub fn readable(self) -> bool {
        !matches!(self, Self::WriteCreate)
    }

    /// Returns true if the stream can be written or truncated.
    pub fn writable(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    /// Returns true if opening discards existing volumes.
    pub fn creates(self) -> bool {
        matches!(self, Self::WriteCreate | Self::WriteCreateUpdate)
    }

    /// Returns the canonical mode string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "rb",
            Self::WriteCreate => "wb",
            Self::ReadWriteExisting => "r+b",
            Self::WriteCreateUpdate => "w+b",
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" | "rb" => Ok(Self::ReadOnly),
            "w" | "wb" => Ok(Self::WriteCreate),
            "r+" | "r+b" | "rb+" => Ok(Self::ReadWriteExisting),
            "w+" | "w+b" | "wb+" => Ok(Self::WriteCreateUpdate),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_strings() {
        assert_eq!("rb".parse::<OpenMode>().unwrap(), OpenMode::ReadOnly);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::WriteCreate);
        assert_eq!(
            "rb+".parse::<OpenMode>().unwrap(),
            OpenMode::ReadWriteExisting
        );
        assert_eq!(
            "w+b".parse::<OpenMode>().unwrap(),
            OpenMode::WriteCreateUpdate
        );
        assert!(matches!(
            "a".parse::<OpenMode>(),
            Err(Error::InvalidMode(m)) if m == "a"
        ));
    }

    #[test]
    fn test_capabilities() {
        assert!(OpenMode::ReadOnly.readable());
        assert!(!OpenMode::ReadOnly.writable());
        assert!(!OpenMode::WriteCreate.readable());
        assert!(OpenMode::WriteCreate.creates());
        assert!(!OpenMode::ReadWriteExisting.creates());
        assert!(OpenMode::WriteCreateUpdate.readable());
        assert!(OpenMode::WriteCreateUpdate.writable());
    }

    #[test]
    fn test_display_round_trip() {
        for mode in [
            OpenMode::ReadOnly,
            OpenMode::WriteCreate,
            OpenMode::ReadWriteExisting,
            OpenMode::WriteCreateUpdate,
        ] {
            assert_eq!(mode.to_string().parse::<OpenMode>().unwrap(), mode);
        }
    }
}
