mod secret;
pub use secret::PrivateKey;

mod public;
pub use public::PublicKey;

mod signature;
pub use signature::Signature;
