pub mod keypair;
pub mod strkey;

pub use keypair::KeyPair;
pub use strkey::{decode_address, decode_seed, encode_address, encode_seed, StrKeyError};
