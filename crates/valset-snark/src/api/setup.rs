//! Trusted setup and artifact persistence.
//!
//! Per supported capacity the proving and verifying keys are kept under
//! deterministic filenames in the configured circuits directory, together
//! with the hex verifier export the on-chain deployment consumes. Setup
//! runs once, writes through a temporary file and renames, so a crash never
//! leaves a partial artifact behind. The keys written here come from a
//! locally sampled setup; a production deployment replaces them with the
//! output of a multi-party ceremony.

use crate::api::VerifierExport;
use crate::{AggregateSignatureCircuit, ProofCurve, SnarkError};

use ark_groth16::{
    generate_random_parameters, prepare_verifying_key, PreparedVerifyingKey, ProvingKey,
    VerifyingKey,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, span, Level};

pub(crate) struct CircuitArtifacts {
    pub pk: ProvingKey<ProofCurve>,
    pub vk: VerifyingKey<ProofCurve>,
    pub pvk: PreparedVerifyingKey<ProofCurve>,
}

fn pk_path(circuits_dir: &Path, capacity: usize) -> PathBuf {
    circuits_dir.join(format!("circuit_{}.pk", capacity))
}

fn vk_path(circuits_dir: &Path, capacity: usize) -> PathBuf {
    circuits_dir.join(format!("circuit_{}.vk", capacity))
}

fn verifier_path(circuits_dir: &Path, capacity: usize) -> PathBuf {
    circuits_dir.join(format!("Verifier_{}.json", capacity))
}

pub(crate) fn load_or_setup(
    circuits_dir: &Path,
    capacity: usize,
) -> Result<CircuitArtifacts, SnarkError> {
    let pk_file = pk_path(circuits_dir, capacity);
    let vk_file = vk_path(circuits_dir, capacity);
    let verifier_file = verifier_path(circuits_dir, capacity);

    if pk_file.exists() && vk_file.exists() {
        let artifacts = load(&pk_file, &vk_file)?;
        // re-derive the verifier export if an older run did not keep it
        if !verifier_file.exists() {
            write_verifier_export(&verifier_file, capacity, &artifacts.vk)?;
        }
        return Ok(artifacts);
    }
    setup(circuits_dir, capacity, &pk_file, &vk_file, &verifier_file)
}

fn load(pk_file: &Path, vk_file: &Path) -> Result<CircuitArtifacts, SnarkError> {
    info!("loading circuit artifacts from {:?}", pk_file.parent());
    // the artifacts are produced locally, skip the point checks
    let pk = ProvingKey::deserialize_unchecked(BufReader::new(File::open(pk_file)?))?;
    let vk: VerifyingKey<ProofCurve> =
        VerifyingKey::deserialize_unchecked(BufReader::new(File::open(vk_file)?))?;
    let pvk = prepare_verifying_key(&vk);
    Ok(CircuitArtifacts { pk, vk, pvk })
}

fn setup(
    circuits_dir: &Path,
    capacity: usize,
    pk_file: &Path,
    vk_file: &Path,
    verifier_file: &Path,
) -> Result<CircuitArtifacts, SnarkError> {
    let setup_span = span!(Level::TRACE, "setup");
    let _enter = setup_span.enter();
    info!("running circuit setup for capacity {}", capacity);

    fs::create_dir_all(circuits_dir)?;

    let circuit = AggregateSignatureCircuit::empty(capacity);
    let rng = &mut rand::thread_rng();
    let params = generate_random_parameters::<ProofCurve, _, _>(circuit, rng)?;

    write_atomic(pk_file, |writer| params.serialize_unchecked(writer))?;
    write_atomic(vk_file, |writer| params.vk.serialize_unchecked(writer))?;
    write_verifier_export(verifier_file, capacity, &params.vk)?;
    info!("circuit setup for capacity {} persisted", capacity);

    let pvk = prepare_verifying_key(&params.vk);
    Ok(CircuitArtifacts {
        vk: params.vk.clone(),
        pk: params,
        pvk,
    })
}

fn write_verifier_export(
    path: &Path,
    capacity: usize,
    vk: &VerifyingKey<ProofCurve>,
) -> Result<(), SnarkError> {
    let export = VerifierExport::new(capacity, vk);
    write_atomic_bytes(path, export.to_json().as_bytes())
}

/// Writes through a sibling temporary file and renames into place
fn write_atomic<S>(path: &Path, serialize: S) -> Result<(), SnarkError>
where
    S: FnOnce(&mut BufWriter<File>) -> Result<(), ark_serialize::SerializationError>,
{
    let tmp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serialize(&mut writer)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn write_atomic_bytes(path: &Path, bytes: &[u8]) -> Result<(), SnarkError> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
