//! The normalized error taxonomy and the STARCOS status-word table.

use crate::apdu::StatusWord;

/// Normalized error kinds surfaced to callers of the driver, independent
/// of the raw status word that produced them.
#[derive(thiserror::Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("invalid data")]
    InvalidData,
    #[error("internal error")]
    Internal,
    #[error("not supported")]
    NotSupported,
    #[error("not allowed")]
    NotAllowed,
    #[error("incorrect parameters")]
    IncorrectParameters,
    #[error("file already exists")]
    FileAlreadyExists,
    #[error("file not found")]
    FileNotFound,
    #[error("PIN code incorrect ({tries_left} tries left)")]
    PinCodeIncorrect { tries_left: u8 },
    #[error("card command failed")]
    CardCmdFailed,
    /// A status word this driver and its error table have no mapping
    /// for. A parent ISO 7816 driver would have a fallback table of its
    /// own to consult here; this crate has none, so it surfaces the raw
    /// status word instead of guessing.
    #[error("unrecognized status word {0}")]
    Unrecognized(StatusWord),
}

struct TableEntry {
    sw: u16,
    kind: Error,
    label: &'static str,
}

/// The 14-entry STARCOS error table (spec §4.9 / §7).
const STARCOS_ERRORS: &[TableEntry] = &[
    TableEntry { sw: 0x6600, kind: Error::IncorrectParameters, label: "Error setting the security env" },
    TableEntry { sw: 0x66F0, kind: Error::IncorrectParameters, label: "No space left for padding" },
    TableEntry { sw: 0x69F0, kind: Error::NotAllowed, label: "Command not allowed" },
    TableEntry { sw: 0x6A89, kind: Error::FileAlreadyExists, label: "Files exists" },
    TableEntry { sw: 0x6A8A, kind: Error::FileAlreadyExists, label: "Application exists" },
    TableEntry { sw: 0x6F01, kind: Error::CardCmdFailed, label: "public key not complete" },
    TableEntry { sw: 0x6F02, kind: Error::CardCmdFailed, label: "data overflow" },
    TableEntry { sw: 0x6F03, kind: Error::CardCmdFailed, label: "invalid command sequence" },
    TableEntry { sw: 0x6F05, kind: Error::CardCmdFailed, label: "security environment invalid" },
    TableEntry { sw: 0x6F07, kind: Error::FileNotFound, label: "key part not found" },
    TableEntry { sw: 0x6F08, kind: Error::CardCmdFailed, label: "signature failed" },
    TableEntry { sw: 0x6F0A, kind: Error::IncorrectParameters, label: "key format does not match key length" },
    TableEntry { sw: 0x6F0B, kind: Error::IncorrectParameters, label: "length of key component inconsistent with algorithm" },
    TableEntry { sw: 0x6F81, kind: Error::CardCmdFailed, label: "system error" },
];

/// Builds the normalized error for a status word already known to be a
/// failure (i.e. the caller already excluded `90 xx`/`61 xx`). Saves
/// call sites from threading the unreachable `Ok(())` case through.
pub fn sw_error(sw: StatusWord) -> Error {
    check_sw(sw).expect_err("sw_error called with a successful status word")
}

/// Translates a raw status word into the normalized taxonomy, following
/// spec §4.9: `90 00` is success, `63 Cx` is a PIN-retry count, then the
/// static table, then an `Unrecognized` catch-all.
pub fn check_sw(sw: StatusWord) -> Result<(), Error> {
    if sw.sw1 == 0x90 {
        return Ok(());
    }
    if sw.sw1 == 0x63 && (sw.sw2 & 0xF0) == 0xC0 {
        let tries_left = sw.sw2 & 0x0F;
        log::warn!("verification failed, {tries_left} tries remaining");
        return Err(Error::PinCodeIncorrect { tries_left });
    }
    for entry in STARCOS_ERRORS {
        if entry.sw == sw.as_u16() {
            log::debug!("{}", entry.label);
            return Err(entry.kind);
        }
    }
    Err(Error::Unrecognized(sw))
}
