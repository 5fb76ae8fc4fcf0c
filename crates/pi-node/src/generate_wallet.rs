//! generate-wallet — prints a fresh keypair's address and secret seed for
//! use with `POST /monitor-wallet`. The seed is never persisted; copy it
//! somewhere safe immediately.

use pi_crypto::KeyPair;

fn main() {
    let keypair = KeyPair::generate();
    println!("address: {}", keypair.address());
    println!("secret:  {}", keypair.seed_strkey());
}
