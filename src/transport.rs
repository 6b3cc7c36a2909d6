//! The APDU transport seam.
//!
//! Out of scope per spec.md §1: this crate never talks to a reader. The
//! trait exists so driver logic can be exercised against a simulator in
//! tests, and so a real PC/SC-backed transport can be dropped in later
//! without touching anything under `select.rs`/`security.rs`/etc.

use crate::apdu::{Apdu, ApduResponse};
use anyhow::Result;

pub trait Transport {
    fn transmit(&mut self, apdu: &Apdu) -> Result<ApduResponse>;
}

/// An in-memory stand-in for a card, driven by an ordered list of
/// expected-request/canned-response pairs. Used by unit and integration
/// tests to assert on the exact APDU bytes a driver operation emits,
/// matching the end-to-end scenarios in spec.md §8. Kept unconditionally
/// public (not `#[cfg(test)]`) so the `tests/` integration suite, which
/// compiles against the library as an ordinary dependency, can use it
/// too.
pub mod sim {
    use super::*;

    pub struct Expectation {
        pub request: Vec<u8>,
        pub response: ApduResponse,
    }

    #[derive(Default)]
    pub struct SimTransport {
        expectations: std::collections::VecDeque<Expectation>,
    }

    impl SimTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues the next expected request bytes and the response to
        /// hand back for it.
        pub fn expect(&mut self, request: impl Into<Vec<u8>>, sw1: u8, sw2: u8, data: impl Into<Vec<u8>>) -> &mut Self {
            self.expectations.push_back(Expectation {
                request: request.into(),
                response: ApduResponse {
                    sw: crate::apdu::StatusWord::new(sw1, sw2),
                    data: data.into(),
                },
            });
            self
        }

        pub fn is_exhausted(&self) -> bool {
            self.expectations.is_empty()
        }
    }

    impl Transport for SimTransport {
        fn transmit(&mut self, apdu: &Apdu) -> Result<ApduResponse> {
            let exp = self
                .expectations
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("unexpected APDU: no more expectations queued"))?;
            let bytes = apdu.to_bytes();
            anyhow::ensure!(
                bytes == exp.request,
                "APDU mismatch: expected {}, got {}",
                hex::encode_upper(&exp.request),
                hex::encode_upper(&bytes),
            );
            Ok(exp.response)
        }
    }
}
