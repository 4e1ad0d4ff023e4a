//! Random certificate serial numbers.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};

/// Width of the serial space in bits.
pub const SERIAL_BITS: u32 = 130;

const SERIAL_BYTES: usize = (SERIAL_BITS as usize).div_ceil(8);
/// Mask for the most significant byte; keeps the top `SERIAL_BITS % 8` bits.
const TOP_BYTE_MASK: u8 = (1u8 << (SERIAL_BITS % 8)) - 1;

/// A certificate serial number in `[0, 2^130 - 1)`, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerialNumber([u8; SERIAL_BYTES]);

impl SerialNumber {
    /// Draws a serial uniformly from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the random source fails.
    pub fn random() -> Result<Self> {
        Self::random_from(&mut OsRng)
    }

    /// Draws a serial uniformly from `rng`.
    ///
    /// 130 random bits are sampled and the single value `2^130 - 1` is
    /// rejected, so every admissible value is equally likely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the random source fails.
    pub fn random_from<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        loop {
            let mut bytes = [0u8; SERIAL_BYTES];
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| Error::Crypto(format!("random source failed: {e}")))?;
            bytes[0] &= TOP_BYTE_MASK;

            let serial = Self(bytes);
            if !serial.is_excluded_maximum() {
                return Ok(serial);
            }
        }
    }

    /// Builds a serial from big-endian bytes.
    ///
    /// Returns `None` if the value is outside the serial space.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        let significant = strip_leading_zeros(bytes);
        if significant.len() > SERIAL_BYTES {
            return None;
        }
        let mut out = [0u8; SERIAL_BYTES];
        out[SERIAL_BYTES - significant.len()..].copy_from_slice(significant);
        if out[0] & !TOP_BYTE_MASK != 0 {
            return None;
        }
        let serial = Self(out);
        (!serial.is_excluded_maximum()).then_some(serial)
    }

    /// Minimal big-endian encoding (at least one byte).
    #[must_use]
    pub fn to_be_bytes(&self) -> Vec<u8> {
        strip_leading_zeros(&self.0).to_vec()
    }

    /// Colon-separated lowercase hex of the minimal encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format_serial_hex(&self.0)
    }

    /// Converts to the signer's serial representation.
    #[must_use]
    pub fn to_rcgen(&self) -> rcgen::SerialNumber {
        rcgen::SerialNumber::from_slice(&self.to_be_bytes())
    }

    fn is_excluded_maximum(&self) -> bool {
        self.0[0] == TOP_BYTE_MASK && self.0[1..].iter().all(|b| *b == 0xff)
    }
}

impl std::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Formats big-endian integer bytes as colon-separated hex, ignoring leading zeros.
pub(crate) fn format_serial_hex(bytes: &[u8]) -> String {
    strip_leading_zeros(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    &bytes[first..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Returns the same byte forever.
    struct ConstRng(u8);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_be_bytes([self.0; 4])
        }

        fn next_u64(&mut self) -> u64 {
            u64::from_be_bytes([self.0; 8])
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for ConstRng {}

    /// Yields all-ones once, then zeros.
    struct MaxThenZeroRng {
        calls: usize,
    }

    impl RngCore for MaxThenZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(if self.calls == 0 { 0xff } else { 0x00 });
            self.calls += 1;
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for MaxThenZeroRng {}

    /// Always fails.
    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("entropy exhausted")))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn serial_fits_in_130_bits() {
        for _ in 0..1_000 {
            let serial = SerialNumber::random().unwrap();
            let bytes = serial.to_be_bytes();
            assert!(bytes.len() <= 17);
            if bytes.len() == 17 {
                assert!(bytes[0] <= 0x03);
            }
        }
    }

    #[test]
    fn ten_thousand_serials_do_not_collide() {
        let serials: HashSet<SerialNumber> = (0..10_000)
            .map(|_| SerialNumber::random().unwrap())
            .collect();
        assert_eq!(serials.len(), 10_000);
    }

    #[test]
    fn top_bits_are_masked() {
        let serial = SerialNumber::random_from(&mut ConstRng(0x5a)).unwrap();
        let bytes = serial.to_be_bytes();
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 0x02);
        assert!(bytes[1..].iter().all(|b| *b == 0x5a));
    }

    #[test]
    fn excluded_maximum_is_resampled() {
        let mut rng = MaxThenZeroRng { calls: 0 };
        let serial = SerialNumber::random_from(&mut rng).unwrap();
        assert_eq!(rng.calls, 2);
        assert_eq!(serial.to_be_bytes(), vec![0]);
        assert_eq!(serial.to_hex(), "00");
    }

    #[test]
    fn random_source_failure_is_crypto_error() {
        let err = SerialNumber::random_from(&mut FailingRng).unwrap_err();
        assert!(matches!(err, Error::Crypto(_)));
    }

    #[test]
    fn hex_rendering() {
        let serial = SerialNumber::from_be_bytes(&[0x00, 0x01, 0xab, 0x0f]).unwrap();
        assert_eq!(serial.to_hex(), "01:ab:0f");
        assert_eq!(serial.to_string(), "01:ab:0f");
    }

    #[test]
    fn from_be_bytes_bounds() {
        let mut max = vec![0x03];
        max.extend([0xff; 16]);
        assert!(SerialNumber::from_be_bytes(&max).is_none());

        max[16] = 0xfe;
        assert!(SerialNumber::from_be_bytes(&max).is_some());

        let mut too_wide = vec![0x04];
        too_wide.extend([0x00; 16]);
        assert!(SerialNumber::from_be_bytes(&too_wide).is_none());

        assert!(SerialNumber::from_be_bytes(&[0x01; 18]).is_none());
    }
}
