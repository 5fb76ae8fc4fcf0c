use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use pi_core::error::ClaimError;
use pi_core::types::StellarAddress;
use zeroize::Zeroizing;

use crate::strkey;

/// An Ed25519 keypair bound to its StrKey-encoded address.
///
/// The seed is held in a `Zeroizing<[u8; 32]>` and wiped on drop; nothing
/// outside this module ever sees the raw bytes.
pub struct KeyPair {
    address: StellarAddress,
    seed: Zeroizing<[u8; 32]>,
}

impl KeyPair {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Self::from_signing_key(signing_key)
    }

    /// Restore a keypair from an `S...`-encoded secret seed, verifying that
    /// it derives to `expected_address`. Returns `ClaimError::AuthMismatch`
    /// on any mismatch — this is the wallet-enrollment gate from the spec.
    pub fn from_seed(
        seed_strkey: &str,
        expected_address: &StellarAddress,
    ) -> Result<Self, ClaimError> {
        let seed_bytes = strkey::decode_seed(seed_strkey).map_err(|_| ClaimError::AuthMismatch)?;
        let signing_key = SigningKey::from_bytes(&seed_bytes);
        let keypair = Self::from_signing_key(signing_key);
        if keypair.address.as_str() != expected_address.as_str() {
            return Err(ClaimError::AuthMismatch);
        }
        Ok(keypair)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key: VerifyingKey = signing_key.verifying_key();
        let address = StellarAddress::new_unchecked(strkey::encode_address(
            verifying_key.as_bytes(),
        ));
        Self {
            address,
            seed: Zeroizing::new(signing_key.to_bytes()),
        }
    }

    pub fn address(&self) -> &StellarAddress {
        &self.address
    }

    /// The `S...`-encoded secret seed for this keypair. Callers that only
    /// need to hand a freshly generated credential to a client (e.g. a
    /// `pi-node generate-wallet` CLI helper) should prefer this over
    /// reaching into the keypair's internals, which stay private.
    pub fn seed_strkey(&self) -> String {
        strkey::encode_seed(&self.seed)
    }

    /// Sign `message` (the SHA-256 transaction payload hash, per the ledger
    /// crate's envelope signing scheme).
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signing_key = SigningKey::from_bytes(&self.seed);
        signing_key.sign(message)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ address: {:?} }}", self.address)
    }
}
