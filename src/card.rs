//! The data model shared across the driver: the card handle, its path
//! cache, file descriptors, ACLs and the security-environment state
//! machine (spec §3).

use bitflags::bitflags;
use std::collections::HashMap;

bitflags! {
    /// RSA padding/hash algorithm flags and a couple of card capability
    /// bits, reusing one flag space the way the original STARCOS driver
    /// does (the same constants double as both capability advertisement
    /// and per-operation algorithm selection).
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct AlgorithmFlags: u32 {
        const RSA_PAD_PKCS1      = 0x0001;
        const RSA_PAD_ISO9796    = 0x0002;
        const RSA_HASH_NONE      = 0x0010;
        const RSA_HASH_SHA1      = 0x0020;
        const RSA_HASH_MD5       = 0x0040;
        const RSA_HASH_RIPEMD160 = 0x0080;
        const RSA_HASH_MD5_SHA1  = 0x0100;
        const ONBOARD_KEY_GEN    = 0x0200;
        const RNG                = 0x0400;
    }
}

impl AlgorithmFlags {
    /// The subset of bits that identify a hash algorithm (as opposed to
    /// padding scheme or capability bits).
    pub const RSA_HASHES: AlgorithmFlags = Self::RSA_HASH_NONE
        .union(Self::RSA_HASH_SHA1)
        .union(Self::RSA_HASH_MD5)
        .union(Self::RSA_HASH_RIPEMD160)
        .union(Self::RSA_HASH_MD5_SHA1);
}

/// Card-level capabilities advertised by `init` (spec §4.1).
#[derive(Clone, Debug)]
pub struct CardCaps {
    pub rsa_key_sizes: [u16; 3],
    pub rsa_exponent: u32,
    pub flags: AlgorithmFlags,
    pub max_send_size: usize,
    pub max_recv_size: usize,
}

impl Default for CardCaps {
    fn default() -> Self {
        Self {
            rsa_key_sizes: [512, 768, 1024],
            rsa_exponent: 0x10001,
            flags: AlgorithmFlags::RSA_PAD_PKCS1
                | AlgorithmFlags::ONBOARD_KEY_GEN
                | AlgorithmFlags::RNG
                | AlgorithmFlags::RSA_PAD_ISO9796
                | AlgorithmFlags::RSA_HASH_NONE
                | AlgorithmFlags::RSA_HASH_SHA1
                | AlgorithmFlags::RSA_HASH_MD5
                | AlgorithmFlags::RSA_HASH_RIPEMD160
                | AlgorithmFlags::RSA_HASH_MD5_SHA1,
            max_send_size: 128,
            max_recv_size: 128,
        }
    }
}

/// The current-path shadow of the device's selected DF (spec §3,
/// "Path cache"). When present, this is assumed equal to whatever is
/// actually selected on the card; the only writer of the card's
/// selection state is this driver, so the assumption holds as long as
/// nobody bypasses it (see spec §9 "Shadowed device state").
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathCache {
    /// A DF selected by AID (1-16 bytes).
    DfName(Vec<u8>),
    /// A path of FIDs, always starting with `3F 00`, even length, 2-8
    /// bytes.
    Path(Vec<u8>),
}

/// File type as reported by SELECT / used for CREATE (spec §3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileType {
    Mf,
    Df,
    WorkingEf,
}

/// EF structure, decoded from FCI tag `0x82` (spec §4.2).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EfStructure {
    Transparent,
    LinearFixed,
    Cyclic,
    Unknown,
}

/// Operations an ACL entry can be attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AclOp {
    Read,
    Write,
    Erase,
    Create,
    Lock,
    Unlock,
    Increase,
    Decrease,
}

/// An access-condition method (spec §3 "ACL entry").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AclMethod {
    Never,
    Chv,
    /// Secure messaging required ("protected").
    Pro,
    None,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AclEntry {
    pub method: AclMethod,
    pub key_ref: Option<u8>,
}

pub type AclTable = HashMap<AclOp, AclEntry>;

/// A file descriptor, produced by SELECT or consumed by CREATE (spec
/// §3). `valid` mirrors the original `magic` tag set on completion.
#[derive(Clone, Debug)]
pub struct FileDescriptor {
    pub fid: Option<u16>,
    pub aid: Option<Vec<u8>>,
    pub file_type: FileType,
    pub ef_structure: EfStructure,
    pub size: u32,
    pub record_length: u8,
    pub record_count: u8,
    pub acl: AclTable,
    pub valid: bool,
}

impl FileDescriptor {
    pub fn working_ef() -> Self {
        Self {
            fid: None,
            aid: None,
            file_type: FileType::WorkingEf,
            ef_structure: EfStructure::Unknown,
            size: 0,
            record_length: 0,
            record_count: 0,
            acl: AclTable::new(),
            valid: false,
        }
    }

    pub fn df(fid: Option<u16>, aid: Option<Vec<u8>>) -> Self {
        Self {
            fid,
            aid,
            file_type: FileType::Df,
            ef_structure: EfStructure::Unknown,
            size: 0,
            record_length: 0,
            record_count: 0,
            acl: AclTable::new(),
            valid: true,
        }
    }
}

/// Which security operation was last installed on the card (spec §3
/// "Extension state" `sec_ops`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SecOp {
    #[default]
    None,
    Sign,
    Authenticate,
}

/// Requested security operation, passed to `set_security_env` (spec §3
/// "Security environment").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SecOperation {
    Sign,
    Authenticate,
    Decipher,
}

/// Input to `set_security_env` (spec §3, §4.7).
#[derive(Clone, Debug)]
pub struct SecurityEnv {
    pub operation: SecOperation,
    pub algorithm_flags: AlgorithmFlags,
    pub key_ref: Vec<u8>,
    pub key_ref_asymmetric: bool,
    /// Explicit algorithm-reference byte, if the caller knows exactly
    /// which one the card should use.
    pub algorithm_ref: Option<u8>,
}

/// Per-session driver state: the card handle observable fields plus the
/// STARCOS extension state (spec §3 "Card handle", "Extension state").
pub struct StarcosCard<T> {
    pub transport: T,
    pub atr: Vec<u8>,
    pub caps: CardCaps,
    pub cache: Option<PathCache>,
    pub serial_nr: Option<Vec<u8>>,
    pub sec_ops: SecOp,
    pub fix_digest_info: AlgorithmFlags,
}

impl<T> StarcosCard<T> {
    pub fn new(transport: T, atr: Vec<u8>) -> Self {
        Self {
            transport,
            atr,
            caps: CardCaps::default(),
            cache: None,
            serial_nr: None,
            sec_ops: SecOp::None,
            fix_digest_info: AlgorithmFlags::empty(),
        }
    }
}
