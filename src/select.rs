//! SELECT FILE — the path resolver (spec §4.3).
//!
//! STARCOS (S 2.1 and SPK 2.3) supports at most one level of
//! subdirectories below the MF, so a full path is at most 3 FIDs (6
//! bytes). Three request shapes are handled: a bare FID, an AID, or a
//! path (sequence of FIDs).

use crate::apdu::{Apdu, StatusWord};
use crate::card::{FileDescriptor, PathCache, StarcosCard};
use crate::error::{sw_error, Error};
use crate::fci;
use crate::transport::Transport;
use anyhow::Result;

/// The three ways a file can be addressed (spec §4.3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectPath {
    Fid(u8, u8),
    Aid(Vec<u8>),
    Path(Vec<u8>),
}

impl<T: Transport> StarcosCard<T> {
    pub fn select_file(&mut self, path: &SelectPath, want_descriptor: bool) -> Result<Option<FileDescriptor>> {
        match path {
            SelectPath::Fid(hi, lo) => self.select_fid(*hi, *lo, want_descriptor),
            SelectPath::Aid(aid) => {
                if aid.is_empty() || aid.len() > 16 {
                    return Err(Error::InvalidArguments.into());
                }
                self.select_aid(aid, want_descriptor)
            }
            SelectPath::Path(path) => self.select_path(path, want_descriptor),
        }
    }

    /// SELECT FILE by AID (spec §4.3 "By AID").
    fn select_aid(&mut self, aid: &[u8], want_descriptor: bool) -> Result<Option<FileDescriptor>> {
        if let Some(PathCache::DfName(cached)) = &self.cache {
            if cached == aid {
                log::trace!("select_aid: cache hit ({})", hex::encode_upper(aid));
                return Ok(want_descriptor.then(|| FileDescriptor::df(None, Some(aid.to_vec()))));
            }
        }

        let apdu = Apdu::new(0x00, 0xA4, 0x04, 0x0C).with_data(aid.to_vec());
        let resp = self.transport.transmit(&apdu)?;
        if !(resp.sw.sw1 == 0x90 || resp.sw.sw1 == 0x61) {
            return Err(sw_error(resp.sw).into());
        }

        self.cache = Some(PathCache::DfName(aid.to_vec()));
        Ok(want_descriptor.then(|| FileDescriptor::df(None, Some(aid.to_vec()))))
    }

    /// SELECT FILE by FID, also the DF/EF-distinguishing heuristic
    /// (spec §4.3 "FID selector").
    fn select_fid(&mut self, hi: u8, lo: u8, want_descriptor: bool) -> Result<Option<FileDescriptor>> {
        let p2 = if want_descriptor { 0x00 } else { 0x0C };
        let apdu = Apdu::new(0x00, 0xA4, 0x00, p2).with_data(vec![hi, lo]).with_le(256);
        let mut resp = self.transport.transmit(&apdu)?;
        let mut is_df = false;

        // The DF/EF disambiguation heuristic only applies when the
        // caller asked for no descriptor: with FCI explicitly requested
        // (`want_descriptor`), a successful response's FCI is decoded
        // straight away (spec §4.3 scenario 2 — no extra probe APDU).
        if !want_descriptor {
            if resp.sw == StatusWord::new(0x62, 0x84) {
                // No FCI came back => the target is a DF; re-select
                // without requesting one.
                is_df = true;
                let apdu = Apdu::new(0x00, 0xA4, 0x00, 0x0C).with_data(vec![hi, lo]);
                resp = self.transport.transmit(&apdu)?;
            } else if resp.sw.is_success() && (resp.sw.sw1 == 0x61 || !resp.data.is_empty()) {
                // Unexpected FCI came back despite not being requested;
                // probe with a one-byte READ BINARY to see whether an
                // EF is actually selected.
                let probe = Apdu::new(0x00, 0xB0, 0x00, 0x00).with_le(1);
                let probe_resp = self.transport.transmit(&probe)?;
                if probe_resp.sw == StatusWord::new(0x69, 0x86) {
                    is_df = true;
                }
            }
        }

        if !resp.sw.is_success() {
            return Err(sw_error(resp.sw).into());
        }

        if is_df {
            self.cache = Some(if hi == 0x3F && lo == 0x00 {
                PathCache::Path(vec![0x3F, 0x00])
            } else {
                PathCache::Path(vec![0x3F, 0x00, hi, lo])
            });
        }

        if !want_descriptor {
            return Ok(None);
        }

        let id = ((hi as u16) << 8) | lo as u16;
        if is_df {
            Ok(Some(FileDescriptor::df(Some(id), None)))
        } else {
            let mut file = fci::decode_fci(&resp.data)?;
            file.fid = Some(id);
            Ok(Some(file))
        }
    }

    /// SELECT FILE by path (spec §4.3 "By path").
    fn select_path(&mut self, path: &[u8], want_descriptor: bool) -> Result<Option<FileDescriptor>> {
        if path.is_empty() || path.len() % 2 != 0 || path.len() > 6 {
            return Err(Error::InvalidArguments.into());
        }
        if path.len() == 6 && (path[0] != 0x3F || path[1] != 0x00) {
            return Err(Error::InvalidArguments.into());
        }

        let normalized: Vec<u8> = if path[0] != 0x3F || path[1] != 0x00 {
            let mut p = vec![0x3F, 0x00];
            p.extend_from_slice(path);
            p
        } else {
            path.to_vec()
        };
        let pathlen = normalized.len();

        let b_match = match &self.cache {
            Some(PathCache::Path(cached)) if cached.len() >= 2 && cached.len() <= pathlen => {
                let mut n = 0;
                while n < cached.len() && cached[n] == normalized[n] && cached[n + 1] == normalized[n + 1] {
                    n += 2;
                }
                Some(n)
            }
            _ => None,
        };

        if let Some(b_match) = b_match {
            match pathlen - b_match {
                0 => {
                    log::trace!("select_path: cache hit");
                    let id = ((normalized[pathlen - 2] as u16) << 8) | normalized[pathlen - 1] as u16;
                    return Ok(want_descriptor.then(|| FileDescriptor::df(Some(id), None)));
                }
                2 => {
                    return self.select_fid(normalized[b_match], normalized[b_match + 1], want_descriptor);
                }
                _ => {
                    self.select_fid(normalized[b_match], normalized[b_match + 1], false)?;
                    let remainder = normalized[b_match + 2..].to_vec();
                    return self.select_path(&remainder, want_descriptor);
                }
            }
        }

        // No usable cache: descend one FID at a time, fetching a
        // descriptor only for the final step.
        let mut i = 0;
        while i < pathlen - 2 {
            self.select_fid(normalized[i], normalized[i + 1], false)?;
            i += 2;
        }
        self.select_fid(normalized[pathlen - 2], normalized[pathlen - 1], want_descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::EfStructure;
    use crate::transport::sim::SimTransport;

    fn card() -> StarcosCard<SimTransport> {
        StarcosCard::new(SimTransport::new(), vec![])
    }

    #[test]
    fn select_aid_cold_then_cached() {
        let mut card = card();
        // AID from spec §8 scenario 1.
        let aid: Vec<u8> = vec![0xA0, 0x00, 0x00, 0x01, 0x67, 0x45, 0x53, 0x49, 0x47, 0x4E];
        let mut expect = vec![0x00, 0xA4, 0x04, 0x0C, aid.len() as u8];
        expect.extend_from_slice(&aid);
        card.transport.expect(expect, 0x90, 0x00, vec![]);

        card.select_file(&SelectPath::Aid(aid.clone()), false).unwrap();
        assert!(card.transport.is_exhausted());
        assert_eq!(card.cache, Some(PathCache::DfName(aid.clone())));

        // second identical call must not touch the transport
        card.select_file(&SelectPath::Aid(aid), false).unwrap();
        assert!(card.transport.is_exhausted());
    }

    #[test]
    fn select_path_cold_to_ef_under_mf() {
        let mut card = card();
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

    #[test]
    fn select_path_rejects_malformed_lengths() {
        let mut card = card();
        assert!(card.select_file(&SelectPath::Path(vec![]), false).is_err());
        assert!(card.select_file(&SelectPath::Path(vec![0x3F]), false).is_err());
        assert!(card
            .select_file(&SelectPath::Path(vec![0; 8]), false)
            .is_err());
        assert!(card
            .select_file(&SelectPath::Path(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06]), false)
            .is_err());
    }

    #[test]
    fn select_path_reuses_cached_prefix() {
        let mut card = card();
        card.cache = Some(PathCache::Path(vec![0x3F, 0x00, 0x5F, 0x00]));
        // only the final FID is selected; no descent into 3F00/5F00 again.
        card.transport.expect(
            vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0xEF, 0x01, 0x00],
            0x90,
            0x00,
            vec![],
        );
        card.select_file(&SelectPath::Path(vec![0x3F, 0x00, 0x5F, 0x00, 0xEF, 0x01]), false)
            .unwrap();
        assert!(card.transport.is_exhausted());
    }

    #[test]
    fn select_fid_no_descriptor_6284_is_treated_as_df() {
        let mut card = card();
        card.transport
            .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x41, 0x00, 0x00], 0x62, 0x84, vec![]);
        card.transport
            .expect(vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x41, 0x00], 0x90, 0x00, vec![]);

        card.select_file(&SelectPath::Fid(0x41, 0x00), false).unwrap();
        assert_eq!(card.cache, Some(PathCache::Path(vec![0x3F, 0x00, 0x41, 0x00])));
        assert!(card.transport.is_exhausted());
    }

    #[test]
    fn select_fid_no_descriptor_unexpected_fci_probes_and_confirms_df() {
        let mut card = card();
        // Card anomalously returns FCI-shaped data despite P2=0x0C.
        card.transport.expect(
            vec![0x00, 0xA4, 0x00, 0x0C, 0x02, 0x41, 0x00, 0x00],
            0x90,
            0x00,
            vec![0x6F, 0x02, 0x80, 0x00],
        );
        card.transport
            .expect(vec![0x00, 0xB0, 0x00, 0x00, 0x01], 0x69, 0x86, vec![]);

        card.select_file(&SelectPath::Fid(0x41, 0x00), false).unwrap();
        assert_eq!(card.cache, Some(PathCache::Path(vec![0x3F, 0x00, 0x41, 0x00])));
        assert!(card.transport.is_exhausted());
    }
}
