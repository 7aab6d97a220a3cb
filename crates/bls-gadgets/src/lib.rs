//! # BLS Gadgets
//!
//! The R1CS building blocks of the aggregate-signature circuit:
//!
//! - affine curve points as raw coordinate pairs with a complete ("unified")
//!   addition law, using `(0, 0)` as the identity encoding so that filler
//!   entries of a padded validator set are distinguishable in-circuit,
//! - a MiMC hash whose native and in-circuit evaluations agree limb for
//!   limb, used both for the validator set commitment and as the
//!   Fiat-Shamir transcript of the linearized pairing check,
//! - a Keccak-256 gadget over boolean lanes, used to bind the circuit's
//!   virtually-public witnesses to the single public input.
//!
//! All gadgets operate over BW6-761's scalar field, which is BLS12-377's
//! base field, so curve arithmetic on signature points is native.

mod curve;
pub use curve::{g1_coords, g2_coords, G1PointVar, G2PointVar};

mod keccak;
pub use keccak::Keccak256Gadget;

mod mimc;
pub use mimc::{mimc_hash, Mimc, MimcVar, MIMC_ROUNDS};

pub mod utils;
