//! GET CARD DATA, logout and erase — the small odds and ends that
//! don't belong to a bigger component (spec §4.8).

use crate::apdu::{Apdu, StatusWord};
use crate::card::StarcosCard;
use crate::error::{sw_error, Error};
use crate::transport::Transport;
use anyhow::Result;

impl<T: Transport> StarcosCard<T> {
    /// Returns the card's serial number, fetching and caching it via
    /// GET CARD DATA on the first call (spec §4.8).
    pub fn get_serial_nr(&mut self) -> Result<Vec<u8>> {
        if let Some(serial) = &self.serial_nr {
            return Ok(serial.clone());
        }

        let apdu = Apdu::new(0x80, 0xF6, 0x00, 0x00).with_le(256);
        let resp = self.transport.transmit(&apdu)?;
        if resp.sw != StatusWord::OK {
            return Err(Error::Internal.into());
        }

        self.serial_nr = Some(resp.data.clone());
        Ok(resp.data)
    }

    /// Logs out by re-selecting the MF. `69 85` (no MF present) is
    /// treated as success: there's nothing to log out of (spec §4.8).
    pub fn logout(&mut self) -> Result<()> {
        let apdu = Apdu::new(0x00, 0xA4, 0x00, 0x0C).with_data(vec![0x3F, 0x00]);
        // errors are expected here (no-MF is routine) and suppressed
        let resp = self.transport.transmit(&apdu)?;
        if resp.sw == StatusWord::new(0x69, 0x85) {
            return Ok(());
        }
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }
        Ok(())
    }

    /// Restores delivery state by deleting the MF. Invalidates the path
    /// cache unconditionally, even on failure; `69 85` (no MF to
    /// delete) is reported as success (spec §4.8).
    pub fn erase_card(&mut self) -> Result<()> {
        let apdu = Apdu::new(0x80, 0xE4, 0x00, 0x00).with_data(vec![0x3F, 0x00]);
        let resp = self.transport.transmit(&apdu)?;
        self.cache = None;
        if resp.sw == StatusWord::new(0x69, 0x85) {
            return Ok(());
        }
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }
        Ok(())
    }
}
