//! Curve points as raw affine coordinate pairs.
//!
//! The circuit treats validator keys, the message point and the aggregate
//! signature as plain `(x, y)` coordinates with the convention that `(0, 0)`
//! encodes the identity ((0, 0) is not on the curve, so the encoding is
//! unambiguous). Coordinates hash directly into the MiMC transcripts and are
//! only lifted into the library's projective representation at the pairing
//! boundary.

use ark_bls12_377::{
    constraints::{Fq2Var, G1Var, G2Var},
    Fq, G1Affine, G2Affine,
};
use ark_ff::{PrimeField, Zero};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*, R1CSVar};
use ark_relations::r1cs::SynthesisError;

type ConstraintF = ark_bw6_761::Fr;

/// Affine coordinates of a G1 point, with the identity mapped to `(0, 0)`
pub fn g1_coords(point: &G1Affine) -> (Fq, Fq) {
    if point.is_zero() {
        (Fq::zero(), Fq::zero())
    } else {
        (point.x, point.y)
    }
}

/// Affine coordinates of a G2 point, with the identity mapped to zeros.
/// Returned in `(x.c0, x.c1, y.c0, y.c1)` order.
pub fn g2_coords(point: &G2Affine) -> (Fq, Fq, Fq, Fq) {
    if point.is_zero() {
        (Fq::zero(), Fq::zero(), Fq::zero(), Fq::zero())
    } else {
        (point.x.c0, point.x.c1, point.y.c0, point.y.c1)
    }
}

/// Allocates the inverse of `x` as a witness, or zero when `x` is zero.
///
/// The returned variable is constrained by `x * inv = 1 - is_zero(x)`, so a
/// non-zero `x` forces the true inverse while the unconstrained zero-case
/// value is only ever discarded behind a select.
fn inverse_or_zero<F: PrimeField>(x: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    if x.is_constant() {
        let value = x.value()?;
        return Ok(FpVar::constant(value.inverse().unwrap_or_else(F::zero)));
    }
    let is_zero = x.is_eq(&FpVar::zero())?;
    let inverse = FpVar::new_witness(x.cs(), || {
        let value = x.value()?;
        Ok(value.inverse().unwrap_or_else(F::zero))
    })?;
    let expected = is_zero.select(&FpVar::zero(), &FpVar::one())?;
    x.mul_equals(&inverse, &expected)?;
    Ok(inverse)
}

/// A G1 point as an affine coordinate pair
#[derive(Clone)]
pub struct G1PointVar<F: PrimeField> {
    pub x: FpVar<F>,
    pub y: FpVar<F>,
}

impl<F: PrimeField> G1PointVar<F> {
    /// The identity encoding
    pub fn zero() -> Self {
        G1PointVar {
            x: FpVar::zero(),
            y: FpVar::zero(),
        }
    }

    pub fn is_zero(&self) -> Result<Boolean<F>, SynthesisError> {
        let x_zero = self.x.is_eq(&FpVar::zero())?;
        let y_zero = self.y.is_eq(&FpVar::zero())?;
        x_zero.and(&y_zero)
    }

    /// Complete addition over the coordinate encoding.
    ///
    /// Handles `P + 0`, `0 + Q`, `P + (-P)` and `P + P` alongside the
    /// generic chord case. Each case's slope is computed behind a guarded
    /// inversion and the inapplicable results are discarded by selects.
    pub fn add_unified(&self, other: &Self) -> Result<Self, SynthesisError> {
        let p_zero = self.is_zero()?;
        let q_zero = other.is_zero()?;

        let same_x = self.x.is_eq(&other.x)?;
        let same_y = self.y.is_eq(&other.y)?;
        let opposite_y = (&self.y + &other.y).is_eq(&FpVar::zero())?;
        let is_double = same_x.and(&same_y)?;
        let is_opposite = same_x.and(&opposite_y)?;

        // chord slope (y2 - y1) / (x2 - x1)
        let dx = &other.x - &self.x;
        let dy = &other.y - &self.y;
        let chord = &dy * &inverse_or_zero(&dx)?;

        // tangent slope 3x^2 / 2y
        let x_sq = self.x.square()?;
        let three_x_sq = &x_sq + &x_sq + &x_sq;
        let two_y = &self.y + &self.y;
        let tangent = &three_x_sq * &inverse_or_zero(&two_y)?;

        let lambda = is_double.select(&tangent, &chord)?;
        let x3 = &lambda.square()? - &self.x - &other.x;
        let y3 = &lambda * &(&self.x - &x3) - &self.y;

        let sum = G1PointVar { x: x3, y: y3 };
        let sum = is_opposite.select(&Self::zero(), &sum)?;
        let sum = q_zero.select(self, &sum)?;
        p_zero.select(other, &sum)
    }
}

impl<F: PrimeField> CondSelectGadget<F> for G1PointVar<F> {
    fn conditionally_select(
        cond: &Boolean<F>,
        true_value: &Self,
        false_value: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(G1PointVar {
            x: cond.select(&true_value.x, &false_value.x)?,
            y: cond.select(&true_value.y, &false_value.y)?,
        })
    }
}

impl G1PointVar<ConstraintF> {
    /// Lifts the coordinate pair into the library's curve representation,
    /// mapping the `(0, 0)` encoding to the group identity
    pub fn to_curve_var(&self) -> Result<G1Var, SynthesisError> {
        let is_zero = self.is_zero()?;
        let affine = G1Var::new(self.x.clone(), self.y.clone(), FpVar::one());
        is_zero.select(&G1Var::zero(), &affine)
    }
}

/// A G2 point as raw Fq2 coordinate components
#[derive(Clone)]
pub struct G2PointVar<F: PrimeField> {
    pub x_c0: FpVar<F>,
    pub x_c1: FpVar<F>,
    pub y_c0: FpVar<F>,
    pub y_c1: FpVar<F>,
}

impl<F: PrimeField> G2PointVar<F> {
    pub fn is_zero(&self) -> Result<Boolean<F>, SynthesisError> {
        let x0 = self.x_c0.is_eq(&FpVar::zero())?;
        let x1 = self.x_c1.is_eq(&FpVar::zero())?;
        let y0 = self.y_c0.is_eq(&FpVar::zero())?;
        let y1 = self.y_c1.is_eq(&FpVar::zero())?;
        x0.and(&x1)?.and(&y0.and(&y1)?)
    }
}

impl G2PointVar<ConstraintF> {
    /// Lifts the coordinate components into the library's representation,
    /// mapping all-zero coordinates to the group identity
    pub fn to_curve_var(&self) -> Result<G2Var, SynthesisError> {
        let is_zero = self.is_zero()?;
        let x = Fq2Var::new(self.x_c0.clone(), self.x_c1.clone());
        let y = Fq2Var::new(self.y_c0.clone(), self.y_c1.clone());
        let affine = G2Var::new(x, y, Fq2Var::one());
        is_zero.select(&G2Var::zero(), &affine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::G1Projective;
    use ark_ec::{AffineCurve, ProjectiveCurve};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use rand::thread_rng;

    fn alloc_point(
        cs: ConstraintSystemRef<ConstraintF>,
        point: &G1Affine,
    ) -> G1PointVar<ConstraintF> {
        let (x, y) = g1_coords(point);
        G1PointVar {
            x: FpVar::new_witness(cs.clone(), || Ok(x)).unwrap(),
            y: FpVar::new_witness(cs, || Ok(y)).unwrap(),
        }
    }

    fn assert_adds_to(
        cs: ConstraintSystemRef<ConstraintF>,
        a: &G1Affine,
        b: &G1Affine,
        expected: &G1Affine,
    ) {
        let a_var = alloc_point(cs.clone(), a);
        let b_var = alloc_point(cs, b);
        let sum = a_var.add_unified(&b_var).unwrap();
        let (ex, ey) = g1_coords(expected);
        assert_eq!(sum.x.value().unwrap(), ex);
        assert_eq!(sum.y.value().unwrap(), ey);
    }

    #[test]
    fn test_add_unified_cases() {
        let rng = &mut thread_rng();
        let cs = ConstraintSystem::<ConstraintF>::new_ref();

        let p = G1Projective::rand(rng).into_affine();
        let q = G1Projective::rand(rng).into_affine();
        let zero = G1Affine::zero();

        // generic chord
        let sum = (p.into_projective() + q.into_projective()).into_affine();
        assert_adds_to(cs.clone(), &p, &q, &sum);
        // doubling
        assert_adds_to(cs.clone(), &p, &p, &p.into_projective().double().into_affine());
        // inverse
        assert_adds_to(cs.clone(), &p, &-p, &zero);
        // identity on either side
        assert_adds_to(cs.clone(), &p, &zero, &p);
        assert_adds_to(cs.clone(), &zero, &q, &q);
        assert_adds_to(cs.clone(), &zero, &zero, &zero);

        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_to_curve_var_round_trip() {
        let rng = &mut thread_rng();
        let cs = ConstraintSystem::<ConstraintF>::new_ref();

        let p = G1Projective::rand(rng).into_affine();
        let var = alloc_point(cs.clone(), &p).to_curve_var().unwrap();
        assert_eq!(var.value().unwrap().into_affine(), p);

        let zero_var = alloc_point(cs.clone(), &G1Affine::zero())
            .to_curve_var()
            .unwrap();
        assert!(zero_var.value().unwrap().is_zero());

        assert!(cs.is_satisfied().unwrap());
    }
}
