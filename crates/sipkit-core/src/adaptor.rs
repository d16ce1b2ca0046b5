//! Source adaptor contract.
//!
//! An adaptor translates one source-specific metadata feed into the internal
//! [`MetadataGraph`]. Source-specific behavior (feed discovery, column
//! mapping, path resolution, packaging exclusions, manifest post-processing)
//! lives entirely behind this trait; the pipeline only sees the graph.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::SipResult;
use crate::premis::MetadataGraph;
use crate::toolkit::Toolkit;

pub trait SourceAdaptor: Send + Sync + std::fmt::Debug {
    /// Stable adaptor name referenced by the `adaptor` configuration key.
    fn name(&self) -> &str;

    /// Read the source feed and the digital objects under `source_path` and
    /// build the metadata graph.
    fn populate(&self, source_path: &Path, config: &Config) -> SipResult<MetadataGraph>;

    /// Candidate descriptive-metadata files directly under `desc_path`.
    ///
    /// The default scans for files ending with the configured descriptive
    /// suffix, skipping hidden files. The result is sorted for stable
    /// processing order.
    fn descriptive_files(&self, desc_path: &Path, config: &Config) -> SipResult<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(desc_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&config.script.meta_ending) && !name.starts_with('.') {
                out.push(entry.path());
            }
        }
        out.sort();
        Ok(out)
    }

    /// Whether the root element of imported descriptive metadata is stripped.
    fn desc_root_remove(&self, config: &Config) -> bool {
        let _ = config;
        false
    }

    /// Glob patterns for files excluded from the packaged archive.
    fn exclude_patterns(&self, config: &Config) -> Vec<String> {
        let _ = config;
        Vec::new()
    }

    /// Arbitrary post-processing against the compiled manifest and source
    /// tree, run after manifest compilation and before signing.
    fn post_tasks(
        &self,
        graph: &MetadataGraph,
        temp_path: &Path,
        source_path: &Path,
        toolkit: &Toolkit,
    ) -> SipResult<()> {
        let _ = (graph, temp_path, source_path, toolkit);
        Ok(())
    }
}
