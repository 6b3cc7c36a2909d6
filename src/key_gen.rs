//! GENERATE KEY / READ PUBLIC KEY — on-card RSA key-pair generation
//! (spec §4.6).

use crate::apdu::Apdu;
use crate::card::StarcosCard;
use crate::error::{sw_error, Error};
use crate::transport::Transport;
use anyhow::Result;

/// Offset of the modulus inside the READ PUBLIC KEY response body. The
/// upstream comment admits this is a fixed offset rather than a proper
/// tag search ("XXX use tags to find starting position of the
/// modulus"); kept as-is since no tag catalogue for this response is
/// otherwise documented.
const MODULUS_OFFSET: usize = 18;

#[derive(Clone, Debug)]
pub struct GeneratedKey {
    pub key_id: u8,
    pub key_length_bits: u16,
    /// Modulus, most-significant byte first.
    pub modulus: Vec<u8>,
}

impl<T: Transport> StarcosCard<T> {
    /// Generates an RSA key pair of `key_length_bits` under `key_id`,
    /// then reads back the public modulus (spec §4.6).
    pub fn gen_key(&mut self, key_id: u8, key_length_bits: u16) -> Result<GeneratedKey> {
        let gen = Apdu::new(0x00, 0x46, 0x00, key_id)
            .with_data(vec![(key_length_bits >> 8) as u8, key_length_bits as u8]);
        let resp = self.transport.transmit(&gen)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }

        let read = Apdu::new(0x80, 0xF0, 0x9C, 0x00).with_data(vec![key_id]).with_le(256);
        let resp = self.transport.transmit(&read)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }

        // spec: "fails with OUT_OF_MEMORY if the output buffer cannot be
        // allocated" — the response is the only source for that buffer,
        // so a body too short to slice `len` bytes out of is the
        // observable form that failure takes here.
        let len = (key_length_bits >> 3) as usize;
        if resp.data.len() < MODULUS_OFFSET + len {
            return Err(Error::OutOfMemory.into());
        }
        let mut modulus = resp.data[MODULUS_OFFSET..MODULUS_OFFSET + len].to_vec();
        modulus.reverse(); // card returns the modulus least-significant byte first
        Ok(GeneratedKey { key_id, key_length_bits, modulus })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::sim::SimTransport;

    fn card() -> StarcosCard<SimTransport> {
        StarcosCard::new(SimTransport::new(), vec![])
    }

    #[test]
    fn generates_and_reverses_modulus() {
        let mut card = card();
        card.transport.expect(vec![0x00, 0x46, 0x00, 0x05, 0x02, 0x02, 0x00], 0x90, 0x00, vec![]);

        let mut resp_data = vec![0u8; 18];
        resp_data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // modulus, LSB first on the wire
        card.transport
            .expect(vec![0x80, 0xF0, 0x9C, 0x00, 0x01, 0x05, 0x00], 0x90, 0x00, resp_data);

        let key = card.gen_key(0x05, 32).unwrap();
        assert_eq!(key.modulus, vec![0x04, 0x03, 0x02, 0x01]);
        assert!(card.transport.is_exhausted());
    }

    #[test]
    fn short_response_is_rejected_as_out_of_memory() {
        let mut card = card();
        card.transport.expect(vec![0x00, 0x46, 0x00, 0x01, 0x02, 0x04, 0x00], 0x90, 0x00, vec![]);
        card.transport
            .expect(vec![0x80, 0xF0, 0x9C, 0x00, 0x01, 0x01, 0x00], 0x90, 0x00, vec![0u8; 10]);
        let err = card.gen_key(0x01, 1024).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::OutOfMemory)));
    }
}
