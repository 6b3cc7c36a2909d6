//! WRITE KEY (`0xF4`) — installing a key header and streaming key
//! material into the Internal Secret File (spec §4.5).

use crate::apdu::Apdu;
use crate::card::StarcosCard;
use crate::error::sw_error;
use crate::transport::Transport;
use anyhow::Result;

/// STARCOS writes key material in chunks this large (spec §4.5).
pub const KEY_CHUNK_SIZE: usize = 124;

/// A key import request (spec §4.5).
///
/// `mode == 0` installs `key_header` into the ISF before streaming
/// `key`; any other `mode` value skips the header step (an in-progress
/// write being continued) and is reused verbatim as P1 on every WRITE
/// KEY APDU.
#[derive(Clone, Debug)]
pub struct WriteKeyRequest {
    pub mode: u8,
    pub key_id: u8,
    pub key_header: [u8; 12],
    pub key: Vec<u8>,
}

impl<T: Transport> StarcosCard<T> {
    /// Installs the key header (if `mode == 0`) and streams `key` to the
    /// card in [`KEY_CHUNK_SIZE`]-byte chunks (spec §4.5).
    pub fn write_key(&mut self, req: &WriteKeyRequest) -> Result<()> {
        if req.mode == 0 {
            let mut data = vec![0xC1, 0x0C];
            data.extend_from_slice(&req.key_header);
            let apdu = Apdu::new(0x80, 0xF4, req.mode, 0x00).with_data(data).sensitive();
            let resp = self.transport.transmit(&apdu)?;
            if !resp.sw.is_success() {
                return Err(sw_error(resp.sw).into());
            }
            if req.key.is_empty() {
                return Ok(());
            }
        }

        let mut offset: usize = 0;
        for chunk in req.key.chunks(KEY_CHUNK_SIZE) {
            let mut data = vec![0xC2, (3 + chunk.len()) as u8, req.key_id, (offset >> 8) as u8, offset as u8];
            data.extend_from_slice(chunk);
            let apdu = Apdu::new(0x80, 0xF4, req.mode, 0x00).with_data(data).sensitive();
            let resp = self.transport.transmit(&apdu)?;
            if !resp.sw.is_success() {
                return Err(sw_error(resp.sw).into());
            }
            offset += chunk.len();
        }

        Ok(())
    }
}
