//! CREATE FILE — building and sending MF/DF/EF creation commands
//! (spec §4.4). All four APDUs here carry `CLA = 0x80`, STARCOS's
//! proprietary-class marker for this command family.

use crate::acl::{process_acl, CreateData};
use crate::apdu::Apdu;
use crate::card::{FileDescriptor, FileType, StarcosCard};
use crate::error::{sw_error, Error};
use crate::transport::Transport;
use anyhow::Result;

impl<T: Transport> StarcosCard<T> {
    /// Creates the MF. Must be the very first file created on a blank
    /// card; STARCOS returns `69 85` ("conditions not satisfied") for
    /// anything else attempted first.
    pub fn create_mf(&mut self, file: &FileDescriptor) -> Result<()> {
        let CreateData::Mf { header } = process_acl(file)? else {
            return Err(Error::InvalidArguments.into());
        };
        let apdu = Apdu::new(0x80, 0xE0, 0x00, 0x00).with_data(header.to_vec());
        let resp = self.transport.transmit(&apdu)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }
        self.cache = None;
        Ok(())
    }

    /// Creates a DF: REGISTER DF followed by CREATE DF (spec §4.4).
    /// [`Self::create_end`] must still be called to activate its ACs.
    pub fn create_df(&mut self, file: &FileDescriptor) -> Result<()> {
        let CreateData::Df { header, register_len } = process_acl(file)? else {
            return Err(Error::InvalidArguments.into());
        };

        let size_hi = (file.size >> 8) as u8;
        let size_lo = file.size as u8;
        let register = Apdu::new(0x80, 0x52, size_hi, size_lo).with_data(header[..register_len].to_vec());
        let resp = self.transport.transmit(&register)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }

        let create = Apdu::new(0x80, 0xE0, 0x01, 0x00).with_data(header.to_vec());
        let resp = self.transport.transmit(&create)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }

        self.cache = None;
        Ok(())
    }

    /// Activates the ACs of a just-created DF (`CardCtl::CreateEnd`,
    /// spec §4.4 / §6). Only valid for a DF; rejects anything else.
    pub fn create_end(&mut self, file: &FileDescriptor) -> Result<()> {
        if file.file_type != FileType::Df {
            return Err(Error::InvalidArguments.into());
        }
        let fid = file.fid.ok_or(Error::InvalidArguments)?;
        let apdu = Apdu::new(0x80, 0xE0, 0x02, 0x00).with_data(vec![(fid >> 8) as u8, fid as u8]);
        let resp = self.transport.transmit(&apdu)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }
        Ok(())
    }

    /// Creates a working EF under the currently selected DF (spec
    /// §4.4).
    pub fn create_ef(&mut self, file: &FileDescriptor) -> Result<()> {
        let CreateData::Ef { header } = process_acl(file)? else {
            return Err(Error::InvalidArguments.into());
        };
        let apdu = Apdu::new(0x80, 0xE0, 0x03, 0x00).with_data(header.to_vec());
        let resp = self.transport.transmit(&apdu)?;
        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }
        Ok(())
    }
}
