//! Generic folder adaptor.
//!
//! Collects every file under the source tree as a digital object with a
//! generated UUID identifier and a computed digest. There is no feed, so no
//! events, agents, or linkings are recorded; the resulting package carries
//! technical and descriptive metadata only.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

use sipkit_core::adaptor::SourceAdaptor;
use sipkit_core::config::Config;
use sipkit_core::premis::{MetadataGraph, PremisObject};
use sipkit_core::{SipError, SipResult};

pub const ADAPTOR_NAME: &str = "folder";

#[derive(Debug, Clone, Default)]
pub struct FolderAdaptor;

impl FolderAdaptor {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdaptor for FolderAdaptor {
    fn name(&self) -> &str {
        ADAPTOR_NAME
    }

    fn populate(&self, source_path: &Path, config: &Config) -> SipResult<MetadataGraph> {
        let mut graph = MetadataGraph::new();
        graph.set_objid(
            source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sip".to_string()),
        );

        for entry in WalkDir::new(source_path).sort_by_file_name() {
            let entry =
                entry.map_err(|e| SipError::feed(format!("cannot walk source tree: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source_path)
                .map_err(|e| SipError::feed(e.to_string()))?
                .to_path_buf();
            // descriptive metadata is imported separately, not packaged as
            // an object
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&config.script.meta_ending) {
                continue;
            }

            graph.add_object(PremisObject {
                identifier: Uuid::new_v4().to_string(),
                identifier_type: "UUID".to_string(),
                original_name: name,
                filepath: Some(relative),
                digest_algorithm: "SHA-256".to_string(),
                digest: file_digest(entry.path())?,
                alt_identifier: None,
                bit_level: false,
            });
        }

        debug!(objects = graph.object_count(), "source tree collected");
        Ok(graph)
    }

    fn desc_root_remove(&self, config: &Config) -> bool {
        config.script.desc_root_remove
    }

    fn exclude_patterns(&self, config: &Config) -> Vec<String> {
        vec![format!("*{}", config.script.meta_ending)]
    }
}

fn file_digest(path: &Path) -> SipResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
