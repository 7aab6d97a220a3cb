//! An in-circuit Keccak-256 over boolean lanes.
//!
//! The state is kept as 25 lanes of 64 booleans (least significant bit
//! first), so the rho rotations are free reindexings and each round costs
//! only the theta/chi xor-and network. Legacy Keccak padding (`0x01`) is
//! applied, matching `keccak256` as used on chain.

use ark_ff::PrimeField;
use ark_r1cs_std::{prelude::*, uint8::UInt8};
use ark_relations::r1cs::SynthesisError;
use tracing::debug;

const RATE_BYTES: usize = 136;
const LANE_BITS: usize = 64;

const ROUND_CONSTANTS: [u64; 24] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808a,
    0x8000000080008000,
    0x000000000000808b,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008a,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000a,
    0x000000008000808b,
    0x800000000000008b,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800a,
    0x800000008000000a,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

// rho offsets indexed [x][y]
const ROTATION_OFFSETS: [[usize; 5]; 5] = [
    [0, 36, 3, 41, 18],
    [1, 44, 10, 45, 2],
    [62, 6, 43, 15, 61],
    [28, 55, 25, 21, 56],
    [27, 20, 39, 8, 14],
];

type Lane<F> = Vec<Boolean<F>>;

/// Keccak-256 as an R1CS gadget
pub struct Keccak256Gadget;

impl Keccak256Gadget {
    /// Digests the input bytes into 32 byte gadgets
    pub fn digest<F: PrimeField>(input: &[UInt8<F>]) -> Result<Vec<UInt8<F>>, SynthesisError> {
        debug!("keccak gadget over {} input bytes", input.len());

        // pad10*1 with the legacy 0x01 domain byte
        let mut padded = input.to_vec();
        padded.push(UInt8::constant(0x01));
        while padded.len() % RATE_BYTES != 0 {
            padded.push(UInt8::constant(0x00));
        }
        let last = padded.len() - 1;
        padded[last] = padded[last].xor(&UInt8::constant(0x80))?;

        let mut state: Vec<Lane<F>> = vec![vec![Boolean::constant(false); LANE_BITS]; 25];
        for block in padded.chunks(RATE_BYTES) {
            for (i, byte) in block.iter().enumerate() {
                let lane = i / 8;
                let offset = (i % 8) * 8;
                let bits = byte.to_bits_le()?;
                for (j, bit) in bits.iter().enumerate() {
                    state[lane][offset + j] = state[lane][offset + j].xor(bit)?;
                }
            }
            state = Self::permute(state)?;
        }

        let mut output = Vec::with_capacity(32);
        for i in 0..32 {
            let lane = i / 8;
            let offset = (i % 8) * 8;
            output.push(UInt8::from_bits_le(&state[lane][offset..offset + 8]));
        }
        Ok(output)
    }

    fn permute<F: PrimeField>(mut a: Vec<Lane<F>>) -> Result<Vec<Lane<F>>, SynthesisError> {
        for constant in ROUND_CONSTANTS.iter() {
            // theta
            let mut c: Vec<Lane<F>> = Vec::with_capacity(5);
            for x in 0..5 {
                let mut column = a[x].clone();
                for y in 1..5 {
                    column = xor_lanes(&column, &a[x + 5 * y])?;
                }
                c.push(column);
            }
            for x in 0..5 {
                let d = xor_lanes(&c[(x + 4) % 5], &rotate_left(&c[(x + 1) % 5], 1))?;
                for y in 0..5 {
                    a[x + 5 * y] = xor_lanes(&a[x + 5 * y], &d)?;
                }
            }

            // rho and pi
            let mut b: Vec<Lane<F>> = vec![vec![Boolean::constant(false); LANE_BITS]; 25];
            for x in 0..5 {
                for y in 0..5 {
                    let nx = y;
                    let ny = (2 * x + 3 * y) % 5;
                    b[nx + 5 * ny] = rotate_left(&a[x + 5 * y], ROTATION_OFFSETS[x][y]);
                }
            }

            // chi
            for x in 0..5 {
                for y in 0..5 {
                    let not_next = not_lane(&b[(x + 1) % 5 + 5 * y]);
                    let masked = and_lanes(&not_next, &b[(x + 2) % 5 + 5 * y])?;
                    a[x + 5 * y] = xor_lanes(&b[x + 5 * y], &masked)?;
                }
            }

            // iota
            a[0] = xor_lane_constant(&a[0], *constant)?;
        }
        Ok(a)
    }
}

fn xor_lanes<F: PrimeField>(a: &Lane<F>, b: &Lane<F>) -> Result<Lane<F>, SynthesisError> {
    a.iter().zip(b).map(|(l, r)| l.xor(r)).collect()
}

fn and_lanes<F: PrimeField>(a: &Lane<F>, b: &Lane<F>) -> Result<Lane<F>, SynthesisError> {
    a.iter().zip(b).map(|(l, r)| l.and(r)).collect()
}

fn not_lane<F: PrimeField>(a: &Lane<F>) -> Lane<F> {
    a.iter().map(|bit| bit.not()).collect()
}

fn xor_lane_constant<F: PrimeField>(a: &Lane<F>, constant: u64) -> Result<Lane<F>, SynthesisError> {
    a.iter()
        .enumerate()
        .map(|(i, bit)| bit.xor(&Boolean::constant((constant >> i) & 1 == 1)))
        .collect()
}

fn rotate_left<F: PrimeField>(lane: &Lane<F>, by: usize) -> Lane<F> {
    (0..LANE_BITS)
        .map(|i| lane[(i + LANE_BITS - by) % LANE_BITS].clone())
        .collect()
}
