//! Canonical transaction envelope (spec §4.3).
//!
//! This crate has no dependency on a Stellar XDR codec, so the wire blob is
//! a deterministic, versioned binary encoding carrying the same fields XDR
//! would: source account, sequence, fee, time bounds, and the two
//! operations. The signing payload is `SHA256(network_passphrase || body)`,
//! signed with Ed25519 and appended to the envelope.

use pi_core::error::ClaimError;
use pi_core::types::{Amount, BalanceId, StellarAddress, Timestamp};
use pi_crypto::strkey;
use pi_crypto::KeyPair;
use sha2::{Digest, Sha256};

const ENVELOPE_VERSION: u8 = 1;

/// A built, signed transaction ready for submission.
pub struct SignedEnvelope {
    pub blob: Vec<u8>,
    pub hash: [u8; 32],
}

/// Build and sign the two-operation claim+payment transaction.
///
/// Verifies `wallet_keypair` derives to `source`, raising `AuthMismatch`
/// otherwise (spec §4.3 step 1) — callers normally verify this once at
/// enrollment, but the builder re-checks since it is the last line of
/// defense before funds move.
pub fn build_and_sign(
    wallet_keypair: &KeyPair,
    source: &StellarAddress,
    destination: &StellarAddress,
    balance_id: &BalanceId,
    amount: Amount,
    sequence: i64,
    fee_stroops: u32,
    validity_secs: i64,
    network_passphrase: &str,
    now: Timestamp,
) -> Result<SignedEnvelope, ClaimError> {
    if wallet_keypair.address().as_str() != source.as_str() {
        return Err(ClaimError::AuthMismatch);
    }

    let body = encode_body(
        source,
        destination,
        balance_id,
        amount,
        sequence,
        fee_stroops,
        now,
        now + validity_secs,
    );

    let payload = signing_payload(network_passphrase, &body);
    let signature = wallet_keypair.sign(&payload);

    let mut blob = body;
    blob.extend_from_slice(&signature.to_bytes());

    let hash: [u8; 32] = Sha256::digest(&blob).into();
    Ok(SignedEnvelope { blob, hash })
}

/// `SHA256(passphrase || 0x00 || body)` — a passphrase-salted digest so the
/// same transaction can never replay across networks with different
/// passphrases, mirroring Stellar's network-id scheme without pulling in
/// its XDR machinery.
fn signing_payload(network_passphrase: &str, body: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(network_passphrase.as_bytes());
    hasher.update([0u8]);
    hasher.update(body);
    hasher.finalize().to_vec()
}

#[allow(clippy::too_many_arguments)]
fn encode_body(
    source: &StellarAddress,
    destination: &StellarAddress,
    balance_id: &BalanceId,
    amount: Amount,
    sequence: i64,
    fee_stroops: u32,
    time_bound_min: Timestamp,
    time_bound_max: Timestamp,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.push(ENVELOPE_VERSION);
    write_address(&mut buf, source);
    buf.extend_from_slice(&sequence.to_be_bytes());
    buf.extend_from_slice(&fee_stroops.to_be_bytes());
    buf.extend_from_slice(&time_bound_min.to_be_bytes());
    buf.extend_from_slice(&time_bound_max.to_be_bytes());

    // Operation count, fixed at 2 (claim + payment).
    buf.push(2);

    // Operation 1: claim_claimable_balance(balance_id).
    buf.push(OperationTag::ClaimClaimableBalance as u8);
    write_lp_string(&mut buf, &balance_id.0);

    // Operation 2: payment(destination, native, amount).
    buf.push(OperationTag::Payment as u8);
    write_address(&mut buf, destination);
    buf.extend_from_slice(&amount.to_be_bytes());

    buf
}

#[repr(u8)]
enum OperationTag {
    ClaimClaimableBalance = 1,
    Payment = 2,
}

fn write_address(buf: &mut Vec<u8>, address: &StellarAddress) {
    let raw = strkey::decode_address(address.as_str())
        .expect("StellarAddress is always a validated StrKey account id");
    buf.extend_from_slice(&raw);
}

fn write_lp_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(kp: &KeyPair) -> StellarAddress {
        kp.address().clone()
    }

    #[test]
    fn build_and_sign_is_deterministic() {
        let wallet = KeyPair::generate();
        let dest = KeyPair::generate();
        let source = addr(&wallet);
        let destination = addr(&dest);
        let balance_id = BalanceId("abc123".to_string());

        let env1 = build_and_sign(
            &wallet,
            &source,
            &destination,
            &balance_id,
            31_415_926,
            42,
            1_000_000,
            120,
            "Pi Network",
            1_000,
        )
        .unwrap();
        let env2 = build_and_sign(
            &wallet,
            &source,
            &destination,
            &balance_id,
            31_415_926,
            42,
            1_000_000,
            120,
            "Pi Network",
            1_000,
        )
        .unwrap();
        assert_eq!(env1.blob, env2.blob);
        assert_eq!(env1.hash, env2.hash);
    }

    #[test]
    fn rejects_mismatched_source() {
        let wallet = KeyPair::generate();
        let other = KeyPair::generate();
        let dest = KeyPair::generate();
        let balance_id = BalanceId("abc123".to_string());

        let err = build_and_sign(
            &wallet,
            &addr(&other),
            &addr(&dest),
            &balance_id,
            1,
            1,
            1_000_000,
            120,
            "Pi Network",
            0,
        )
        .unwrap_err();
        assert!(matches!(err, ClaimError::AuthMismatch));
    }
}
