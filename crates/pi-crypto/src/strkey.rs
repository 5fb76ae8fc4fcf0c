//! Stellar StrKey encoding: version byte + 32-byte payload + CRC16/XModem
//! checksum, base32-encoded without padding.
//!
//! `G...` encodes an Ed25519 public key (account address); `S...` encodes
//! the corresponding secret seed. This module only implements those two
//! version bytes — the ones this scheduler ever needs.

use thiserror::Error;

const VERSION_ACCOUNT_ID: u8 = 6 << 3; // 'G'
const VERSION_SEED: u8 = 18 << 3; // 'S'

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrKeyError {
    #[error("invalid base32 encoding")]
    InvalidBase32,
    #[error("unexpected length: got {0} bytes, expected 35")]
    BadLength(usize),
    #[error("wrong version byte: expected {expected:#04x}, got {got:#04x}")]
    WrongVersion { expected: u8, got: u8 },
    #[error("checksum mismatch")]
    BadChecksum,
}

/// Encode a raw 32-byte Ed25519 public key as a `G...` address.
pub fn encode_address(pubkey: &[u8; 32]) -> String {
    encode(VERSION_ACCOUNT_ID, pubkey)
}

/// Decode a `G...` address into its raw 32-byte public key.
pub fn decode_address(s: &str) -> Result<[u8; 32], StrKeyError> {
    decode(s, VERSION_ACCOUNT_ID)
}

/// Encode a raw 32-byte Ed25519 seed as an `S...` secret.
pub fn encode_seed(seed: &[u8; 32]) -> String {
    encode(VERSION_SEED, seed)
}

/// Decode an `S...` secret into its raw 32-byte seed.
pub fn decode_seed(s: &str) -> Result<[u8; 32], StrKeyError> {
    decode(s, VERSION_SEED)
}

fn encode(version: u8, payload: &[u8; 32]) -> String {
    let mut buf = Vec::with_capacity(35);
    buf.push(version);
    buf.extend_from_slice(payload);
    let crc = crc16_xmodem(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &buf)
}

fn decode(s: &str, expected_version: u8) -> Result<[u8; 32], StrKeyError> {
    let buf = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, s)
        .ok_or(StrKeyError::InvalidBase32)?;
    if buf.len() != 35 {
        return Err(StrKeyError::BadLength(buf.len()));
    }
    let version = buf[0];
    if version != expected_version {
        return Err(StrKeyError::WrongVersion {
            expected: expected_version,
            got: version,
        });
    }
    let payload = &buf[1..33];
    let want_crc = u16::from_le_bytes([buf[33], buf[34]]);
    let got_crc = crc16_xmodem(&buf[..33]);
    if want_crc != got_crc {
        return Err(StrKeyError::BadChecksum);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(payload);
    Ok(out)
}

/// CRC16/XModem: poly 0x1021, init 0x0000, no input/output reflection.
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0x0000;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips() {
        let payload = [7u8; 32];
        let encoded = encode_address(&payload);
        assert!(encoded.starts_with('G'));
        let decoded = decode_address(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn seed_round_trips() {
        let payload = [9u8; 32];
        let encoded = encode_seed(&payload);
        assert!(encoded.starts_with('S'));
        let decoded = decode_seed(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn rejects_wrong_version() {
        let seed_str = encode_seed(&[1u8; 32]);
        assert_eq!(
            decode_address(&seed_str).unwrap_err(),
            StrKeyError::WrongVersion {
                expected: VERSION_ACCOUNT_ID,
                got: VERSION_SEED
            }
        );
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut encoded = encode_address(&[3u8; 32]).into_bytes();
        let last = encoded.len() - 1;
        encoded[last] = if encoded[last] == b'A' { b'B' } else { b'A' };
        let s = String::from_utf8(encoded).unwrap();
        assert!(decode_address(&s).is_err());
    }
}
