//! PKCS#1 v1.5 `DigestInfo` encoding, used to fix up the payload before
//! INTERNAL AUTHENTICATE when COMPUTE SIGNATURE isn't usable (spec
//! §4.7).

use crate::card::AlgorithmFlags;
use crate::error::Error;
use der::{
    asn1::{Null, ObjectIdentifier, OctetStringRef},
    Encode, Sequence,
};

const SHA1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const MD5_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
const RIPEMD160_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.2.1");

#[derive(Sequence)]
struct AlgorithmIdentifier {
    algorithm: ObjectIdentifier,
    parameters: Option<Null>,
}

#[derive(Sequence)]
struct DigestInfo<'a> {
    algorithm: AlgorithmIdentifier,
    digest: OctetStringRef<'a>,
}

/// Wraps `digest` in a DER `DigestInfo` per the hash bits set in
/// `hash_flags` (the subset of [`AlgorithmFlags::RSA_HASHES`]).
///
/// Per spec §9 (open question): if no hash bit is set, this substitutes
/// `RSA_HASH_NONE` rather than reporting an error, matching the
/// upstream comment ("assume no hash is wanted"). `RSA_HASH_NONE` and
/// `RSA_HASH_MD5_SHA1` both mean "don't wrap, the caller already built
/// the exact byte string the card should see" (the latter is the
/// concatenated MD5+SHA1 digest used by the TLS-style signature
/// scheme, which has no ASN.1 `DigestInfo` form).
pub fn encode_digest_info(hash_flags: AlgorithmFlags, digest: &[u8]) -> Result<Vec<u8>, Error> {
    let mut flags = hash_flags & AlgorithmFlags::RSA_HASHES;
    if flags.is_empty() {
        flags = AlgorithmFlags::RSA_HASH_NONE;
    }

    if flags.contains(AlgorithmFlags::RSA_HASH_NONE) || flags.contains(AlgorithmFlags::RSA_HASH_MD5_SHA1) {
        return Ok(digest.to_vec());
    }

    let oid = if flags.contains(AlgorithmFlags::RSA_HASH_SHA1) {
        SHA1_OID
    } else if flags.contains(AlgorithmFlags::RSA_HASH_RIPEMD160) {
        RIPEMD160_OID
    } else if flags.contains(AlgorithmFlags::RSA_HASH_MD5) {
        MD5_OID
    } else {
        return Err(Error::InvalidArguments);
    };

    let info = DigestInfo {
        algorithm: AlgorithmIdentifier { algorithm: oid, parameters: Some(Null) },
        digest: OctetStringRef::new(digest).map_err(|_| Error::InvalidData)?,
    };
    info.to_der().map_err(|_| Error::InvalidData)
}
