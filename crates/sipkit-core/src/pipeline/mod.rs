//! SIP compilation pipeline.
//!
//! One [`SipCompiler`] run drives a strictly ordered sequence of stages over
//! a populated metadata graph:
//!
//! 1. clean prior run
//! 2. technical metadata
//! 3. provenance metadata
//! 4. descriptive metadata
//! 5. manifest compilation (structural map, then full manifest)
//! 6. adaptor post-tasks
//! 7. sign and package
//! 8. append sidecars to the archive
//! 9. clean intermediates
//!
//! There is no branching back. A failing stage aborts the run; re-invoking
//! the pipeline over the same inputs is safe because every intermediate
//! artifact name is deterministic and stage 1 purges exactly that set.

pub mod cleanup;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::adaptor::SourceAdaptor;
use crate::config::Config;
use crate::errors::{SipError, SipResult};
use crate::premis::{FormatHint, MetadataGraph};
use crate::toolkit::manifest::{
    EventSection, FormatSection, LinkedObject, ManifestBuilder, ObjectSection, TypedKind,
};
use crate::toolkit::scrape::StreamType;
use crate::toolkit::{archive, Toolkit};

/// File-section marker for objects preserved bit-level only.
const BIT_LEVEL_USE: &str = "no-file-format-validation";

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Check well-formedness of digital objects while scraping.
    pub validation: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { validation: true }
    }
}

/// Drives one compilation run over a populated metadata graph.
///
/// The compiler borrows the graph for the duration of the run; entities are
/// only read, never changed.
pub struct SipCompiler<'a> {
    source_path: &'a Path,
    temp_path: &'a Path,
    config: &'a Config,
    adaptor: &'a dyn SourceAdaptor,
    graph: &'a MetadataGraph,
    toolkit: &'a Toolkit,
    tar_file: Option<PathBuf>,
    options: CompileOptions,
}

impl<'a> SipCompiler<'a> {
    pub fn new(
        source_path: &'a Path,
        temp_path: &'a Path,
        config: &'a Config,
        adaptor: &'a dyn SourceAdaptor,
        graph: &'a MetadataGraph,
        toolkit: &'a Toolkit,
    ) -> Self {
        Self {
            source_path,
            temp_path,
            config,
            adaptor,
            graph,
            toolkit,
            tar_file: None,
            options: CompileOptions::default(),
        }
    }

    /// Write the package archive to an explicit path instead of deriving one
    /// from the package identifier.
    pub fn with_tar_file(mut self, tar_file: impl Into<PathBuf>) -> Self {
        self.tar_file = Some(tar_file.into());
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the full pipeline. Returns the path of the packaged archive.
    pub fn create_sip(&self) -> SipResult<PathBuf> {
        info!(stage = "clean-prior-run", temp = %self.temp_path.display(), "starting");
        cleanup::clean_temp_files(self.temp_path, None, None, false)?;
        fs::create_dir_all(self.temp_path)?;

        self.technical_metadata()?;
        self.provenance_metadata()?;
        self.descriptive_metadata()?;
        let manifest_path = self.compile_manifest()?;

        info!(stage = "adaptor-post-tasks", "starting");
        self.adaptor
            .post_tasks(self.graph, self.temp_path, self.source_path, self.toolkit)?;

        let (tar_path, signature_path) = self.sign_and_package(&manifest_path)?;
        self.append_sidecars(&tar_path, &manifest_path, &signature_path)?;
        self.clean_intermediates()?;

        info!(archive = %tar_path.display(), "compilation finished");
        Ok(tar_path)
    }

    /// Package identifier for the manifest and the default archive name.
    pub fn package_identifier(&self) -> String {
        match self.graph.objid() {
            Some(objid) => objid.to_string(),
            None => self
                .source_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sip".to_string()),
        }
    }

    fn technical_metadata(&self) -> SipResult<()> {
        info!(stage = "technical-metadata", objects = self.graph.object_count(), "starting");
        if self.graph.object_count() == 0 {
            return Err(SipError::stage("technical metadata", "no digital objects"));
        }

        let builder = ManifestBuilder::new(self.temp_path);
        for object in self.graph.objects() {
            let relative = object
                .filepath
                .as_ref()
                .ok_or_else(|| SipError::MissingDigitalObject(object.original_name.clone()))?;
            let absolute = self.source_path.join(relative);
            let relative_name = relative.to_string_lossy().replace('\\', "/");

            // Bit-level objects are packaged without format validation.
            let check = self.options.validation && !object.bit_level;
            let report = self.toolkit.scraper.scrape(&absolute, check);

            let format = match object.format_hint() {
                Some(FormatHint { name, version }) => FormatSection { name, version },
                None => FormatSection {
                    name: report.mimetype.clone(),
                    version: report.version.clone(),
                },
            };

            let handle = ManifestBuilder::handle_for(&relative_name);
            let section = ObjectSection {
                identifier_type: object.identifier_type.clone(),
                identifier: object.identifier.clone(),
                alt_identifiers: Vec::new(),
                original_name: object.original_name.clone(),
                path: relative_name,
                digest_algorithm: object.digest_algorithm.clone(),
                digest: object.digest.clone(),
                format: format.clone(),
                usage: object.bit_level.then(|| BIT_LEVEL_USE.to_string()),
            };
            builder.import_object(&handle, &section)?;
            builder.write_stream_cache(&handle, &report.streams)?;

            for (stream_type, kind) in [
                (StreamType::Image, TypedKind::Mix),
                (StreamType::Audio, TypedKind::AudioMd),
                (StreamType::Video, TypedKind::VideoMd),
            ] {
                if let Some(stream) = report.streams.iter().find(|s| s.stream_type == stream_type)
                {
                    builder.create_typed_technical(
                        &handle,
                        kind,
                        &serde_json::to_value(stream)?,
                    )?;
                }
            }

            if format.name == "text/csv" {
                if let Some(first) = report.streams.first() {
                    builder.create_typed_technical(
                        &handle,
                        TypedKind::Tabular,
                        &json!({
                            "has_header": first.has_header,
                            "charset": first.charset,
                            "field_delimiter": first.delimiter,
                            "record_separator": first.record_separator,
                        }),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn provenance_metadata(&self) -> SipResult<()> {
        info!(stage = "provenance-metadata", events = self.graph.event_count(), "starting");
        let builder = ManifestBuilder::new(self.temp_path);

        for event in self.graph.events() {
            let handle = ManifestBuilder::handle_for(&event.identifier);
            let mut linked_objects = Vec::new();

            if let Some(linking) = self.graph.linking(&event.identifier) {
                for link in linking.agent_links() {
                    let agent = self.graph.agent(&link.identifier).ok_or_else(|| {
                        SipError::stage(
                            "provenance metadata",
                            format!(
                                "event {} links unknown agent {}",
                                event.identifier, link.identifier
                            ),
                        )
                    })?;
                    builder.create_agent(
                        &handle,
                        &json!({
                            "identifier_type": agent.identifier_type,
                            "identifier": agent.identifier,
                            "name": agent.name,
                            "type": agent.agent_type,
                            "role": link.role,
                        }),
                    )?;
                }
                for link in linking.object_links() {
                    // migration-style roles pass through; everything else is
                    // a plain target
                    let role = match link.role.as_str() {
                        "source" | "outcome" => link.role.clone(),
                        _ => "target".to_string(),
                    };
                    linked_objects.push(LinkedObject {
                        identifier: link.identifier.clone(),
                        role,
                    });
                }
            }

            let section = EventSection {
                identifier_type: event.identifier_type.clone(),
                identifier: event.identifier.clone(),
                event_type: event.event_type.clone(),
                datetime: event.datetime.clone(),
                outcome: event.outcome.clone(),
                detail: event.detail()?,
                outcome_detail: event.outcome_detail()?,
                linked_objects,
            };
            builder.premis_event(&handle, &section)?;
        }
        Ok(())
    }

    fn descriptive_metadata(&self) -> SipResult<()> {
        info!(stage = "descriptive-metadata", "starting");
        let files = self
            .adaptor
            .descriptive_files(self.source_path, self.config)?;
        if files.is_empty() {
            return Err(SipError::MissingDescriptiveMetadata {
                path: self.source_path.to_path_buf(),
                ending: self.config.script.meta_ending.clone(),
            });
        }

        let builder = ManifestBuilder::new(self.temp_path);
        let remove_root = self.adaptor.desc_root_remove(self.config);
        let software = format!("{} ({})", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        for file in &files {
            builder.import_description(file, remove_root, (software.as_str(), "software"))?;
        }
        Ok(())
    }

    fn compile_manifest(&self) -> SipResult<PathBuf> {
        info!(stage = "compile-manifest", "starting");
        let builder = ManifestBuilder::new(self.temp_path);
        builder.compile_structmap()?;
        builder.compile_manifest(
            &self.config.organization.name,
            &self.config.organization.contract,
            &self.package_identifier(),
            true,
        )
    }

    fn sign_and_package(&self, manifest_path: &Path) -> SipResult<(PathBuf, PathBuf)> {
        info!(stage = "sign-and-package", "starting");
        let signature_path = self
            .toolkit
            .signer
            .sign(manifest_path, &self.config.organization.sign_key)?;

        let tar_path = match &self.tar_file {
            Some(path) => path.clone(),
            None => PathBuf::from(format!(
                "{}.tar",
                default_archive_name(&self.package_identifier())
            )),
        };

        let excludes = archive::build_exclusions(&self.adaptor.exclude_patterns(self.config))?;
        let members = archive::create_archive(&tar_path, self.source_path, &excludes)?;
        info!(members, archive = %tar_path.display(), "source tree packaged");
        Ok((tar_path, signature_path))
    }

    fn append_sidecars(
        &self,
        tar_path: &Path,
        manifest_path: &Path,
        signature_path: &Path,
    ) -> SipResult<()> {
        // Only when metadata was generated outside the packaged tree do the
        // manifest and signature need to be appended afterwards.
        let temp = fs::canonicalize(self.temp_path).unwrap_or_else(|_| self.temp_path.to_path_buf());
        let source =
            fs::canonicalize(self.source_path).unwrap_or_else(|_| self.source_path.to_path_buf());
        if temp == source {
            return Ok(());
        }

        info!(stage = "append-sidecars", "starting");
        archive::append_files(
            tar_path,
            &[manifest_path.to_path_buf(), signature_path.to_path_buf()],
        )
    }

    fn clean_intermediates(&self) -> SipResult<()> {
        info!(stage = "clean-intermediates", "starting");
        // The compiled manifest and its signature stay inspectable after the
        // run; everything else generated along the way goes.
        cleanup::clean_temp_files(
            self.temp_path,
            Some(cleanup::DEFAULT_CLEAN_ENDINGS),
            Some(&["filesec.json", "structmap.json"]),
            false,
        )
    }
}

/// Default archive name: the package identifier with every run of
/// non-alphanumeric characters collapsed to a single underscore.
pub fn default_archive_name(objid: &str) -> String {
    let mut out = String::with_capacity(objid.len());
    let mut in_run = false;
    for ch in objid.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_archive_name_collapses_runs() {
        assert_eq!(
            default_archive_name("Package_2022-02-07_123"),
            "Package_2022_02_07_123"
        );
        assert_eq!(default_archive_name("plain"), "plain");
        assert_eq!(default_archive_name("a  b!!c"), "a_b_c");
    }
}
