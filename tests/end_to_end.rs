//! Integration-style tests exercising full operation sequences against
//! `SimTransport`, asserting on the exact APDU byte sequences from
//! spec.md §8's end-to-end scenarios.

use sc_starcos::card::{
    AclEntry, AclMethod, AclOp, AclTable, AlgorithmFlags, EfStructure, FileDescriptor, FileType, SecOperation, SecurityEnv,
};
use sc_starcos::select::SelectPath;
use sc_starcos::transport::sim::SimTransport;
use sc_starcos::{CardCtl, CardDriver, StarcosCard};

fn new_card() -> StarcosCard<SimTransport> {
    StarcosCard::new(SimTransport::new(), vec![])
}

/// Scenario 1: AID select, cache cold then warm (spec §8 #1).
#[test]
fn scenario_aid_select_then_cache_hit() {
    let mut card = new_card();
    let aid: Vec<u8> = vec![0xA0, 0x00, 0x00, 0x01, 0x67, 0x45, 0x53, 0x49, 0x47, 0x4E];

    let mut expect = vec![0x00, 0xA4, 0x04, 0x0C, aid.len() as u8];
    expect.extend_from_slice(&aid);
    card.transport.expect(expect, 0x90, 0x00, vec![]);

    card.select_file(&SelectPath::Aid(aid.clone()), false).unwrap();
    assert!(card.transport.is_exhausted());

    // second identical call emits zero APDUs
    card.select_file(&SelectPath::Aid(aid), false).unwrap();
    assert!(card.transport.is_exhausted());
}

/// Scenario 2: path to an EF under the MF, cold cache (spec §8 #2).
#[test]
fn scenario_path_to_ef_under_mf() {
    let mut card = new_card();
    card.transport
        .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x3F, 0x00, 0x00], 0x90, 0x00, vec![]);
    card.transport
        .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x5F, 0x00, 0x00], 0x90, 0x00, vec![]);
    card.transport.expect(
        vec![0x00, 0xA4, 0x00, 0x00, 0x02, 0xEF, 0x01, 0x00],
        0x90,
        0x00,
        vec![0x6F, 0x07, 0x80, 0x02, 0x00, 0x20, 0x82, 0x01, 0x01],
    );

    let file = card
        .select_file(&SelectPath::Path(vec![0x3F, 0x00, 0x5F, 0x00, 0xEF, 0x01]), true)
        .unwrap()
        .unwrap();
    assert_eq!(file.ef_structure, EfStructure::Transparent);
    assert_eq!(file.size, 32);
    assert!(card.transport.is_exhausted());
}

/// Scenario 3: sign with SHA-1/PKCS#1 via COMPUTE SIGNATURE (spec §8 #3).
#[test]
fn scenario_sign_sha1_pkcs1() {
    let mut card = new_card();
    let env = SecurityEnv {
        operation: SecOperation::Sign,
        algorithm_flags: AlgorithmFlags::RSA_PAD_PKCS1 | AlgorithmFlags::RSA_HASH_SHA1,
        key_ref: vec![0x02],
        key_ref_asymmetric: false,
        algorithm_ref: None,
    };
    card.transport
        .expect(vec![0x00, 0x22, 0x41, 0xB6, 6, 0x84, 0x01, 0x02, 0x80, 0x01, 0x12], 0x90, 0x00, vec![]);
    card.set_security_env(&env).unwrap();
    assert!(card.transport.is_exhausted());

    let digest = [0x11u8; 20];
    let mut hash_apdu = vec![0x00, 0x2A, 0x90, 0x81, 20];
    hash_apdu.extend_from_slice(&digest);
    card.transport.expect(hash_apdu, 0x90, 0x00, vec![]);
    card.transport.expect(vec![0x00, 0x2A, 0x9E, 0x9A, 0x00, 0x00], 0x90, 0x00, vec![0xAA; 64]);

    let sig = card.compute_signature(&digest, 64).unwrap();
    assert_eq!(sig.len(), 64);
    assert!(card.transport.is_exhausted());
}

/// Scenario 4: sign with hash=NONE falls back to INTERNAL AUTHENTICATE
/// (spec §8 #4).
#[test]
fn scenario_sign_hash_none_falls_back_to_authenticate() {
    let mut card = new_card();
    let env = SecurityEnv {
        operation: SecOperation::Sign,
        algorithm_flags: AlgorithmFlags::RSA_PAD_PKCS1 | AlgorithmFlags::RSA_HASH_NONE,
        key_ref: vec![],
        key_ref_asymmetric: false,
        algorithm_ref: None,
    };
    card.transport
        .expect(vec![0x00, 0x22, 0x41, 0xA4, 3, 0x80, 0x01, 0x01], 0x90, 0x00, vec![]);
    card.set_security_env(&env).unwrap();
    assert!(card.transport.is_exhausted());

    let data = [0x22u8; 16];
    let mut expect = vec![0x00, 0x88, 0x10, 0x00, 16];
    expect.extend_from_slice(&data);
    expect.push(0x00);
    card.transport.expect(expect, 0x90, 0x00, vec![0xBB; 8]);

    let sig = card.compute_signature(&data, 8).unwrap();
    assert_eq!(sig, vec![0xBB; 8]);
    assert!(card.transport.is_exhausted());
}

/// Scenario 5: MF create with a CHV(0x81) CREATE ACL (spec §8 #5).
#[test]
fn scenario_mf_create() {
    let mut card = new_card();
    let mut acl = AclTable::new();
    acl.insert(AclOp::Create, AclEntry { method: AclMethod::Chv, key_ref: Some(0x81) });
    let file = FileDescriptor {
        fid: Some(0x3F00),
        aid: None,
        file_type: FileType::Mf,
        ef_structure: EfStructure::Unknown,
        size: 0x2000,
        record_length: 0,
        record_count: 0,
        acl,
        valid: true,
    };

    let mut expect = vec![0x80, 0xE0, 0x00, 0x00, 19];
    expect.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    expect.extend_from_slice(&[0x20, 0x00, 0x08, 0x00, 0x11, 0x11, 0x11, 0x11, 0x00, 0x00, 0x00]);
    card.transport.expect(expect, 0x90, 0x00, vec![]);

    <StarcosCard<SimTransport> as CardDriver>::create_file(&mut card, &file).unwrap();
    assert!(card.transport.is_exhausted());
}

/// Scenario 6: erase on a card with no MF present (spec §8 #6).
#[test]
fn scenario_erase_without_mf() {
    let mut card = new_card();
    card.transport
        .expect(vec![0x80, 0xE4, 0x00, 0x00, 0x02, 0x3F, 0x00], 0x69, 0x85, vec![]);

    let result = <StarcosCard<SimTransport> as CardDriver>::card_ctl(&mut card, CardCtl::EraseCard);
    assert!(result.is_ok());
    assert!(card.cache.is_none());
}

/// A full create-and-activate DF session: REGISTER DF, CREATE DF,
/// CREATE END, then a subsequent SELECT by path reuses the cached DF
/// prefix instead of re-descending from the MF.
#[test]
fn full_df_lifecycle_then_path_reuses_cache() {
    let mut card = new_card();
    let file = FileDescriptor {
        fid: Some(0x4100),
        aid: Some(vec![0xA0, 0x00, 0x00, 0x01]),
        file_type: FileType::Df,
        ef_structure: EfStructure::Unknown,
        size: 0x0400,
        record_length: 0,
        record_count: 0,
        acl: AclTable::new(),
        valid: true,
    };

    card.transport.expect(
        vec![0x80, 0x52, 0x04, 0x00, 0x07, 0x41, 0x00, 0x04, 0xA0, 0x00, 0x00, 0x01],
        0x90,
        0x00,
        vec![],
    );
    let mut header = [0u8; 25];
    header[0] = 0x41;
    header[1] = 0x00;
    header[2] = 4;
    header[3..7].copy_from_slice(&[0xA0, 0x00, 0x00, 0x01]);
    header[19] = 0x01;
    header[21] = 0x9F;
    header[22] = 0x9F;
    let mut create_expect = vec![0x80u8, 0xE0, 0x01, 0x00, 25];
    create_expect.extend_from_slice(&header);
    card.transport.expect(create_expect, 0x90, 0x00, vec![]);

    <StarcosCard<SimTransport> as CardDriver>::create_file(&mut card, &file).unwrap();

    card.transport.expect(vec![0x80, 0xE0, 0x02, 0x00, 0x02, 0x41, 0x00], 0x90, 0x00, vec![]);
    <StarcosCard<SimTransport> as CardDriver>::card_ctl(&mut card, CardCtl::CreateEnd(file)).unwrap();
    assert!(card.transport.is_exhausted());

    // create_mf/create_df both invalidate the cache, so this is a cold
    // SELECT down to 4100.
    card.transport
        .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x3F, 0x00, 0x00], 0x90, 0x00, vec![]);
    card.transport
        .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x41, 0x00, 0x00], 0x90, 0x00, vec![]);
    card.select_file(&SelectPath::Path(vec![0x3F, 0x00, 0x41, 0x00]), false).unwrap();
    assert!(card.transport.is_exhausted());

    // The cold descent above doesn't run the DF/EF disambiguation probe
    // (it's only triggered by an unexpected status word), so the driver
    // doesn't yet know 4100 is a DF purely from that exchange; prime the
    // cache the way a confirmed DF selection would have left it, then
    // verify a further path under it reuses the prefix.
    card.cache = Some(sc_starcos::card::PathCache::Path(vec![0x3F, 0x00, 0x41, 0x00]));
    card.transport
        .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0xEF, 0x01, 0x00], 0x90, 0x00, vec![]);
    card.select_file(&SelectPath::Path(vec![0x3F, 0x00, 0x41, 0x00, 0xEF, 0x01]), false)
        .unwrap();
    assert!(card.transport.is_exhausted());
}
