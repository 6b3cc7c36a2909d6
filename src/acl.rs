//! ACL translation — converting the abstract ACL on a file into
//! STARCOS's byte-encoded access conditions and SM flags (spec §4.4).

use crate::card::{AclMethod, AclOp, AclTable, FileDescriptor, FileType};
use crate::error::Error;

pub const AC_ALWAYS: u8 = 0x9F;
pub const AC_NEVER: u8 = 0x5F;

/// Header bytes ready to ship to CREATE MF / REGISTER DF + CREATE DF /
/// CREATE EF (spec §4.4).
#[derive(Clone, Debug)]
pub enum CreateData {
    Mf { header: [u8; 19] },
    Df { header: [u8; 25], register_len: usize },
    Ef { header: [u8; 16] },
}

/// Translates one ACL entry into a STARCOS access-condition byte (spec
/// §4.4 `process_acl_entry`).
///
/// The original C maps a bitmask of `method` flags, so its `NEVER`
/// branch is only reachable once `CHV` has already been ruled out and
/// only defensively (see spec §9, "process_acl_entry's NEVER branch").
/// Here `AclMethod` is a plain enum, so `Chv` and `Never` are already
/// mutually exclusive by construction and this concern doesn't arise.
pub fn process_acl_entry(acl: &AclTable, op: AclOp, default: u8) -> u8 {
    match acl.get(&op) {
        None => default,
        Some(entry) => match entry.method {
            AclMethod::Chv => match entry.key_ref {
                None => default,
                Some(key_ref) => {
                    let msb = if key_ref & 0x80 != 0 { 0x10 } else { 0x00 };
                    if (key_ref & 0x0F) == 1 {
                        msb | 0x01 // SOPIN
                    } else {
                        msb | (0x0F - ((key_ref & 0x0F) >> 1))
                    }
                }
            },
            AclMethod::Never => AC_NEVER,
            AclMethod::Pro | AclMethod::None => default,
        },
    }
}

fn requires_pro(acl: &AclTable, op: AclOp) -> bool {
    matches!(acl.get(&op), Some(entry) if entry.method == AclMethod::Pro)
}

/// Builds the CREATE header bytes for `file` (spec §4.4).
pub fn process_acl(file: &FileDescriptor) -> Result<CreateData, Error> {
    match file.file_type {
        FileType::Mf => Ok(CreateData::Mf { header: build_mf_header(file) }),
        FileType::Df => build_df_header(file).map(|(header, register_len)| CreateData::Df { header, register_len }),
        FileType::WorkingEf => build_ef_header(file),
    }
}

fn build_mf_header(file: &FileDescriptor) -> [u8; 19] {
    let mut h = [0u8; 19];
    h[0..8].copy_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    h[8] = (file.size >> 8) as u8;
    h[9] = file.size as u8;
    // guessed ISF size: mf_size / 4
    h[10] = (file.size >> 10) as u8;
    h[11] = (file.size >> 2) as u8;

    let ac_create = process_acl_entry(&file.acl, AclOp::Create, AC_ALWAYS);
    h[12] = ac_create; // AC_CREATE_EF
    h[13] = ac_create; // AC_CREATE_KEY
    h[14] = ac_create; // AC_CREATE_DF
    h[15] = ac_create; // AC_REGISTER_DF (same as AC_CREATE_DF)

    let sm = if requires_pro(&file.acl, AclOp::Create) { 0x03 } else { 0x00 };
    h[16] = sm;
    h[17] = sm;
    h[18] = sm;
    h
}

fn build_df_header(file: &FileDescriptor) -> Result<([u8; 25], usize), Error> {
    let fid = file.fid.ok_or(Error::InvalidArguments)?;
    let mut h = [0u8; 25];
    h[0] = (fid >> 8) as u8;
    h[1] = fid as u8;

    let aid: Vec<u8> = match &file.aid {
        Some(aid) if !aid.is_empty() => aid.clone(),
        // misuse the FID as a 2-byte AID when the file has none
        _ => vec![(fid >> 8) as u8, fid as u8],
    };
    h[2] = aid.len() as u8;
    h[3..3 + aid.len()].copy_from_slice(&aid);

    h[19] = (file.size >> 10) as u8;
    h[20] = (file.size >> 2) as u8;

    let ac_create = process_acl_entry(&file.acl, AclOp::Create, AC_ALWAYS);
    h[21] = ac_create; // AC_CREATE_EF
    h[22] = ac_create; // AC_CREATE_KEY

    let sm = if requires_pro(&file.acl, AclOp::Create) { 0x03 } else { 0x00 };
    h[23] = sm; // SM CR
    h[24] = sm; // SM ISF

    let register_len = 3 + aid.len();
    Ok((h, register_len))
}

fn build_ef_header(file: &FileDescriptor) -> Result<CreateData, Error> {
    use crate::card::EfStructure;

    let fid = file.fid.ok_or(Error::InvalidArguments)?;
    let mut h = [0u8; 16];
    h[0] = (fid >> 8) as u8;
    h[1] = fid as u8;
    h[2] = process_acl_entry(&file.acl, AclOp::Read, AC_ALWAYS);
    h[3] = process_acl_entry(&file.acl, AclOp::Write, AC_ALWAYS);
    h[4] = process_acl_entry(&file.acl, AclOp::Erase, AC_ALWAYS);
    h[5] = AC_ALWAYS; // LOCK
    h[6] = AC_ALWAYS; // UNLOCK
    h[7] = AC_ALWAYS; // INCREASE
    h[8] = AC_ALWAYS; // DECREASE
    h[9] = 0x00; // rfu
    h[10] = 0x00; // rfu

    // spec §9 open question: the original's SM-byte loop (`tmp != 0`
    // guarding the loop body) can never execute, so the upstream byte
    // is always 0 regardless of ACL. The documented intent is "SM=0x03
    // if any of this file's operations requires PRO"; we implement that
    // intent rather than reproduce the dead loop (see DESIGN.md).
    let sm = [AclOp::Read, AclOp::Write, AclOp::Erase, AclOp::Create]
        .into_iter()
        .any(|op| requires_pro(&file.acl, op));
    h[11] = if sm { 0x03 } else { 0x00 };
    h[12] = 0x00; // SID (least significant 5 bits of the FID, per upstream comment — but
                  // the reference implementation leaves this literal zero; matched here)

    match file.ef_structure {
        EfStructure::Transparent => {
            h[13] = 0x81;
            h[14] = (file.size >> 8) as u8;
            h[15] = file.size as u8;
        }
        EfStructure::LinearFixed => {
            h[13] = 0x82;
            h[14] = file.record_count;
            h[15] = file.record_length;
        }
        EfStructure::Cyclic => {
            h[13] = 0x84;
            h[14] = file.record_count;
            h[15] = file.record_length;
        }
        EfStructure::Unknown => return Err(Error::InvalidArguments),
    }

    Ok(CreateData::Ef { header: h })
}
