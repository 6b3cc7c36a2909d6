//! A driver for STARCOS SPK 2.3 smart cards, built on an ISO 7816-4
//! SELECT/CREATE/security-environment command set (spec §1).
//!
//! This crate never talks to a reader directly — see [`transport`] for
//! the seam a PC/SC (or any other) backend plugs into.

pub mod acl;
pub mod apdu;
pub mod atr;
pub mod card;
pub mod create;
pub mod error;
pub mod fci;
pub mod key_gen;
pub mod key_import;
pub mod misc;
pub mod pkcs1;
pub mod security;
pub mod select;
pub mod transport;

pub use apdu::{Apdu, ApduResponse, StatusWord};
pub use card::{CardCaps, FileDescriptor, FileType, SecOp, SecurityEnv, StarcosCard};
pub use error::Error;
pub use select::SelectPath;
pub use transport::Transport;

use anyhow::Result;
use key_gen::GeneratedKey;
use key_import::WriteKeyRequest;

/// Driver entry points exposed to a framework hosting this crate (spec
/// §6). `delete_file` has no backing STARCOS command (there is no
/// single-command file deletion outside of `erase_card`'s whole-MF
/// reset), so the provided default always fails with
/// [`Error::NotSupported`] — the same role the `NULL` function pointer
/// plays in the C `sc_card_operations` table, made visible as a real
/// method rather than an absent one.
pub trait CardDriver: Sized {
    type Transport: Transport;

    fn match_card(atr: &[u8]) -> bool;
    fn init(transport: Self::Transport, atr: Vec<u8>) -> Result<Self>;
    fn finish(self) -> Result<()>;
    fn select_file(&mut self, path: &SelectPath, want_descriptor: bool) -> Result<Option<FileDescriptor>>;
    fn check_sw(sw: StatusWord) -> Result<(), Error>;
    fn create_file(&mut self, file: &FileDescriptor) -> Result<()>;
    fn delete_file(&mut self, _path: &SelectPath) -> Result<()> {
        Err(Error::NotSupported.into())
    }
    fn set_security_env(&mut self, env: &SecurityEnv) -> Result<()>;
    fn compute_signature(&mut self, data: &[u8], out_len: usize) -> Result<Vec<u8>>;
    fn card_ctl(&mut self, cmd: CardCtl) -> Result<CardCtlResult>;
    fn logout(&mut self) -> Result<()>;
}

/// Proprietary STARCOS commands routed through `card_ctl` (spec §4.4
/// -§4.6, §4.8). `CreateFile` is the raw `SC_CARDCTL_STARCOS_CREATE_FILE`
/// entry point onto `create_mf`/`create_df`/`create_ef` directly, distinct
/// from the generic `CardDriver::create_file` op (spec §9 "Tagged
/// operation payloads").
#[derive(Clone, Debug)]
pub enum CardCtl {
    CreateFile(FileDescriptor),
    CreateEnd(FileDescriptor),
    WriteKey(WriteKeyRequest),
    GenerateKey { key_id: u8, key_length_bits: u16 },
    EraseCard,
    GetSerialNr,
}

/// Result of a [`CardCtl`] dispatch; most variants carry nothing back.
#[derive(Clone, Debug)]
pub enum CardCtlResult {
    Done,
    GeneratedKey(GeneratedKey),
    SerialNr(Vec<u8>),
}

impl<T: Transport> CardDriver for StarcosCard<T> {
    type Transport = T;

    fn match_card(atr: &[u8]) -> bool {
        atr::match_card(atr)
    }

    /// Validates `atr` against the known STARCOS ATRs and builds the
    /// driver state (spec §4.1). The original's capability advertisement
    /// (RSA key sizes, algorithm flags, send/recv caps) lives in
    /// [`CardCaps::default`], installed by [`StarcosCard::new`].
    fn init(transport: Self::Transport, atr: Vec<u8>) -> Result<Self> {
        if !atr::match_card(&atr) {
            return Err(Error::InvalidArguments.into());
        }
        Ok(StarcosCard::new(transport, atr))
    }

    /// No extension state to release explicitly: `sec_ops`,
    /// `fix_digest_info`, the path cache and the serial-number cache
    /// are all owned by `self` and drop with it.
    fn finish(self) -> Result<()> {
        Ok(())
    }

    fn select_file(&mut self, path: &SelectPath, want_descriptor: bool) -> Result<Option<FileDescriptor>> {
        StarcosCard::select_file(self, path, want_descriptor)
    }

    fn check_sw(sw: StatusWord) -> Result<(), Error> {
        error::check_sw(sw)
    }

    fn create_file(&mut self, file: &FileDescriptor) -> Result<()> {
        match file.file_type {
            FileType::Mf => self.create_mf(file),
            FileType::Df => self.create_df(file),
            FileType::WorkingEf => self.create_ef(file),
        }
    }

    fn set_security_env(&mut self, env: &SecurityEnv) -> Result<()> {
        StarcosCard::set_security_env(self, env)
    }

    fn compute_signature(&mut self, data: &[u8], out_len: usize) -> Result<Vec<u8>> {
        StarcosCard::compute_signature(self, data, out_len)
    }

    fn card_ctl(&mut self, cmd: CardCtl) -> Result<CardCtlResult> {
        match cmd {
            CardCtl::CreateFile(file) => {
                self.create_file(&file)?;
                Ok(CardCtlResult::Done)
            }
            CardCtl::CreateEnd(file) => {
                self.create_end(&file)?;
                Ok(CardCtlResult::Done)
            }
            CardCtl::WriteKey(req) => {
                self.write_key(&req)?;
                Ok(CardCtlResult::Done)
            }
            CardCtl::GenerateKey { key_id, key_length_bits } => {
                let key = self.gen_key(key_id, key_length_bits)?;
                Ok(CardCtlResult::GeneratedKey(key))
            }
            CardCtl::EraseCard => {
                self.erase_card()?;
                Ok(CardCtlResult::Done)
            }
            CardCtl::GetSerialNr => {
                let serial = self.get_serial_nr()?;
                Ok(CardCtlResult::SerialNr(serial))
            }
        }
    }

    fn logout(&mut self) -> Result<()> {
        StarcosCard::logout(self)
    }
}
