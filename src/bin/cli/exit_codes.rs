//! Exit codes for the CLI tool.

use std::io;

use volsplit::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Volume contents do not match what the stream expects
pub const BAD_DATA: i32 = 3;
/// Wrong passphrase
pub const WRONG_PASSPHRASE: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadData,
    WrongPassphrase,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadData => BAD_DATA,
            Self::WrongPassphrase => WRONG_PASSPHRASE,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a volsplit error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(e) => io_error_to_exit_code(e),
        Error::Volume { .. } | Error::VolumeMissing { .. } => ExitCode::IoError,
        Error::VolumeCorrupted { .. } | Error::InvalidFormat(_) => ExitCode::BadData,
        Error::CryptoError(_) => ExitCode::FatalError,
        e if e.is_usage_error() => ExitCode::BadArgs,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}

/// Converts an I/O error surfaced through the transform layers to an exit code.
///
/// Decryption and decompression failures arrive as `InvalidData`; with an
/// encrypted stream that almost always means the passphrase is wrong.
pub fn io_error_to_exit_code(error: &io::Error) -> ExitCode {
    match error.kind() {
        io::ErrorKind::InvalidData => ExitCode::BadData,
        _ => ExitCode::IoError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::FatalError.code(), 2);
        assert_eq!(ExitCode::IoError.code(), 5);
        assert_eq!(ExitCode::BadArgs.code(), 255);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(error_to_exit_code(&Error::Closed), ExitCode::BadArgs);
        assert_eq!(
            error_to_exit_code(&Error::InvalidMode("x".into())),
            ExitCode::BadArgs
        );
        assert_eq!(
            error_to_exit_code(&Error::VolumeCorrupted {
                volume: 2,
                details: "short".into()
            }),
            ExitCode::BadData
        );
        let invalid = io::Error::new(io::ErrorKind::InvalidData, "bad padding");
        assert_eq!(error_to_exit_code(&Error::Io(invalid)), ExitCode::BadData);
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(error_to_exit_code(&Error::Io(denied)), ExitCode::IoError);
    }
}
