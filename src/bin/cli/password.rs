//! Passphrase handling for CLI operations.

use rpassword::prompt_password;
use volsplit::transform::CipherKey;
use zeroize::Zeroizing;

use crate::exit_codes::ExitCode;

fn prompt(message: &str) -> Result<Zeroizing<String>, ExitCode> {
    prompt_password(message).map(Zeroizing::new).map_err(|e| {
        eprintln!("Error reading passphrase: {}", e);
        ExitCode::IoError
    })
}

/// Resolves the encryption key for a command.
///
/// A passphrase given on the command line wins. Otherwise the user is
/// prompted if `ask` is set, twice when `confirm` is set (for creating
/// encrypted streams). Returns `Ok(None)` when no encryption is wanted.
pub fn resolve_key(
    provided: Option<String>,
    ask: bool,
    confirm: bool,
) -> Result<Option<CipherKey>, ExitCode> {
    let passphrase = match provided {
        Some(p) => Zeroizing::new(p),
        None if ask => prompt("Enter passphrase: ")?,
        None => return Ok(None),
    };

    if passphrase.is_empty() {
        eprintln!("Passphrase cannot be empty");
        return Err(ExitCode::BadArgs);
    }

    if ask && confirm {
        let again = prompt("Confirm passphrase: ")?;
        if *again != *passphrase {
            eprintln!("Passphrases do not match");
            return Err(ExitCode::BadArgs);
        }
    }

    Ok(Some(CipherKey::from_passphrase(&passphrase)))
}
