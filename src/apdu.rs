//! APDU encoding and the status-word wrapper.
//!
//! This mirrors the shape of a generic ISO 7816-4 transport seam: a
//! plain request builder and a `(sw1, sw2, data)` response, with a
//! `StatusWord` newtype for the two trailer bytes every card reply
//! carries. The actual bytes-on-the-wire framing (case 2/3/4 short)
//! is the transport's job; this module only builds the logical APDU.

use std::fmt;

/// Application Protocol Data Unit, built up field by field before being
/// handed to a [`crate::transport::Transport`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Apdu {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    /// `Some(le)` requests a response of up to `le` bytes (0 meaning 256
    /// under the short form used throughout this driver).
    pub le: Option<u16>,
    /// Suppresses transport-level logging of `data`/the response body.
    /// Set for PIN/key-bearing exchanges.
    pub sensitive: bool,
}

impl Apdu {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
            sensitive: false,
        }
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_le(mut self, le: u16) -> Self {
        self.le = Some(le);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Encodes the case 2/3/4 short APDU as bytes, as would be put on
    /// the wire by the transport.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];
        if !self.data.is_empty() {
            out.push(self.data.len() as u8);
            out.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            out.push(le as u8);
        }
        out
    }
}

/// Response to an APDU: the two status-word bytes plus any response
/// body (already stripped of Lc/Le framing).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ApduResponse {
    pub sw: StatusWord,
    pub data: Vec<u8>,
}

/// The two-byte status word (SW1, SW2) every card response carries.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

impl StatusWord {
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    pub const OK: StatusWord = StatusWord::new(0x90, 0x00);

    /// `90 00`, or `61 xx` (more response data waiting to be fetched).
    pub fn is_success(self) -> bool {
        self.sw1 == 0x90 || self.sw1 == 0x61
    }

    /// For a `61 xx` response, the number of additional bytes available
    /// via GET RESPONSE.
    pub fn data_remaining(self) -> Option<u8> {
        (self.sw1 == 0x61).then_some(self.sw2)
    }

    pub fn as_u16(self) -> u16 {
        ((self.sw1 as u16) << 8) | self.sw2 as u16
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
    }
}
