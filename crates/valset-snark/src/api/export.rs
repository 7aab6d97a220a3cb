//! Verifying-key export for on-chain verifier deployment.
//!
//! The verifier contract for the proof curve is deployed from the Groth16
//! verifying key; this module renders the key into the hex-encoded layout
//! that deployment tooling consumes and that setup persists next to the
//! binary artifacts. Points are the uncompressed arkworks canonical form.

use crate::ProofCurve;

use ark_bw6_761::{G1Affine, G2Affine};
use ark_groth16::VerifyingKey;
use ark_serialize::CanonicalSerialize;
use serde::Serialize;

/// The verifying key of one circuit capacity, hex-encoded field by field
#[derive(Clone, Debug, Serialize)]
pub struct VerifierExport {
    /// The validator capacity the key was set up for
    pub capacity: usize,
    /// The proof curve the verifier must implement
    pub curve: String,
    pub alpha_g1: String,
    pub beta_g2: String,
    pub gamma_g2: String,
    pub delta_g2: String,
    /// gamma_abc\[0\] is the constant term, gamma_abc\[1\] the coefficient
    /// of the single public input
    pub gamma_abc_g1: Vec<String>,
}

impl VerifierExport {
    pub fn new(capacity: usize, vk: &VerifyingKey<ProofCurve>) -> Self {
        VerifierExport {
            capacity,
            curve: "bw6-761".to_string(),
            alpha_g1: serialize_g1(&vk.alpha_g1),
            beta_g2: serialize_g2(&vk.beta_g2),
            gamma_g2: serialize_g2(&vk.gamma_g2),
            delta_g2: serialize_g2(&vk.delta_g2),
            gamma_abc_g1: vk.gamma_abc_g1.iter().map(serialize_g1).collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("string fields always render")
    }
}

fn serialize_g1(point: &G1Affine) -> String {
    let mut bytes = vec![];
    point
        .serialize_uncompressed(&mut bytes)
        .expect("writing to a vec cannot fail");
    hex::encode(&bytes)
}

fn serialize_g2(point: &G2Affine) -> String {
    let mut bytes = vec![];
    point
        .serialize_uncompressed(&mut bytes)
        .expect("writing to a vec cannot fail");
    hex::encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineCurve;

    fn sample_vk() -> VerifyingKey<ProofCurve> {
        let mut vk = VerifyingKey::default();
        vk.gamma_abc_g1 = vec![
            G1Affine::prime_subgroup_generator(),
            G1Affine::prime_subgroup_generator(),
        ];
        vk
    }

    #[test]
    fn test_export_layout() {
        let export = VerifierExport::new(10, &sample_vk());
        assert_eq!(export.capacity, 10);
        // uncompressed BW6-761 points are 192 bytes on both groups
        assert_eq!(export.alpha_g1.len(), 2 * 192);
        assert_eq!(export.beta_g2.len(), 2 * 192);
        // one public input: constant term plus one coefficient
        assert_eq!(export.gamma_abc_g1.len(), 2);
    }

    #[test]
    fn test_export_is_deterministic() {
        let vk = sample_vk();
        assert_eq!(
            VerifierExport::new(10, &vk).to_json(),
            VerifierExport::new(10, &vk).to_json()
        );
    }

    #[test]
    fn test_json_carries_every_field() {
        let json = VerifierExport::new(10, &sample_vk()).to_json();
        for field in &[
            "capacity",
            "curve",
            "alpha_g1",
            "beta_g2",
            "gamma_g2",
            "delta_g2",
            "gamma_abc_g1",
        ] {
            assert!(json.contains(field), "missing field {}", field);
        }
    }
}
