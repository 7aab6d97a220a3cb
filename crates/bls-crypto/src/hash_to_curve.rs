//! A try-and-increment method for hashing a 32-byte message hash to G1.
//!
//! The message hash is interpreted directly as an x-coordinate candidate, so
//! the construction can be replayed cheaply by an on-chain verifier. It is
//! not constant time; the input is always a public message hash, never
//! secret data.

use crate::{BLSError, BlsResult};

use ark_bls12_377::{g1::Parameters as G1Parameters, Fq, G1Affine, G1Projective};
use ark_ec::{models::SWModelParameters, AffineCurve};
use ark_ff::{Field, One, PrimeField, SquareRootField, Zero};
use log::trace;

const NUM_TRIES: u16 = 255;

/// Maps a 32-byte message hash to a point in the prime order subgroup of G1.
///
/// The message is reduced into the base field as `x`; if `x³ + b` is a
/// square, the point `(x, y)` with the smaller of the two roots is taken,
/// otherwise `x` is incremented and the candidate retried. The found point
/// is scaled by the cofactor, and a fresh candidate is tried in the rare
/// case that lands on the identity.
pub fn hash_to_g1(message_hash: &[u8; 32]) -> BlsResult<G1Projective> {
    let mut x = Fq::from_be_bytes_mod_order(&message_hash[..]);
    for c in 0..NUM_TRIES {
        if let Some(point) = get_point_from_x(x) {
            let scaled = point.scale_by_cofactor();
            if !scaled.is_zero() {
                trace!("hashed message to the curve in {} tries", c + 1);
                return Ok(scaled);
            }
        }
        x += Fq::one();
    }
    Err(BLSError::HashToCurveFailed)
}

/// Computes `y = sqrt(x³ + b)` and returns the affine point with the
/// lexicographically smaller root, if the square root exists.
fn get_point_from_x(x: Fq) -> Option<G1Affine> {
    let x3b = (x.square() * x) + G1Parameters::COEFF_B;
    x3b.sqrt().map(|y| {
        let negy = -y;
        let y = if y.into_repr() < negy.into_repr() { y } else { negy };
        G1Affine::new(x, y, false)
    })
}
