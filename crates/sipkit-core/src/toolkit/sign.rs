//! Detached manifest signing.
//!
//! The default signer derives a keyed digest (sha256 over the key bytes
//! followed by the manifest bytes) and writes it as a detached hex signature
//! next to the manifest. Deployments with certificate infrastructure can
//! provide their own [`Signer`].

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::errors::{SipError, SipResult};
use crate::toolkit::manifest::SIGNATURE_NAME;

const STAGE: &str = "signing";

pub trait Signer: Send + Sync {
    /// Sign `target` with the key at `key_path`, producing a detached
    /// signature file next to the target. Returns the signature path.
    fn sign(&self, target: &Path, key_path: &Path) -> SipResult<PathBuf>;
}

#[derive(Debug, Clone, Default)]
pub struct KeyFileSigner;

impl Signer for KeyFileSigner {
    fn sign(&self, target: &Path, key_path: &Path) -> SipResult<PathBuf> {
        let key = fs::read(key_path).map_err(|e| {
            SipError::stage(
                STAGE,
                format!("cannot read signing key {}: {e}", key_path.display()),
            )
        })?;
        let payload = fs::read(target).map_err(|e| {
            SipError::stage(STAGE, format!("cannot read {}: {e}", target.display()))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&key);
        hasher.update(&payload);
        let digest = hex::encode(hasher.finalize());

        let target_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let signature_path = target
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SIGNATURE_NAME);
        fs::write(&signature_path, format!("{target_name} sha256 {digest}\n"))?;
        Ok(signature_path)
    }
}
