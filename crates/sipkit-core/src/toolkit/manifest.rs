//! Metadata fragment writing and manifest compilation.
//!
//! Every pipeline step writes its output as a JSON fragment file in the
//! working directory, named as a deterministic function of the producing step
//! and target (never of time or run). Append-only cross-reference indexes
//! record emission order so that manifest compilation reproduces the graph's
//! insertion order exactly.
//!
//! Fragment names:
//! - `<handle>-premis-object-amd.json` — technical object section
//! - `<handle>-mix-amd.json` / `-audiomd-amd.json` / `-videomd-amd.json` /
//!   `-tabular-amd.json` — type-specific technical sections
//! - `<handle>-scraper.json` — cached stream descriptors
//! - `<handle>-premis-event-amd.json` — provenance event section
//! - `<handle>-agents.json` — per-event agent accumulation file
//! - `<handle>-dmdsec.json` — descriptive section
//! - `structmap.json` / `filesec.json` — structural map and file section
//! - `manifest.json` — the compiled manifest
//!
//! The compiled manifest is a canonical JSON document carrying the same
//! section structure a METS document would (header, technical, provenance,
//! descriptive, file section, structural map).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::errors::{SipError, SipResult};
use crate::premis::AltIdentifier;
use crate::toolkit::scrape::StreamDescriptor;

pub const MANIFEST_NAME: &str = "manifest.json";
pub const SIGNATURE_NAME: &str = "signature.sig";
pub const STRUCTMAP_NAME: &str = "structmap.json";
pub const FILESEC_NAME: &str = "filesec.json";

const TECHNICAL_INDEX: &str = "technical-md-references.jsonl";
const PROVENANCE_INDEX: &str = "provenance-md-references.jsonl";
const DESCRIPTIVE_INDEX: &str = "descriptive-md-references.jsonl";

const STAGE: &str = "manifest compilation";

/// Technical object section recorded for one digital object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSection {
    pub identifier_type: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_identifiers: Vec<AltIdentifier>,
    pub original_name: String,
    /// Path relative to the source root, forward slashes.
    pub path: String,
    pub digest_algorithm: String,
    pub digest: String,
    pub format: FormatSection,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Provenance event section recorded for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSection {
    pub identifier_type: String,
    pub identifier: String,
    pub event_type: String,
    pub datetime: String,
    pub outcome: String,
    pub detail: String,
    pub outcome_detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_objects: Vec<LinkedObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedObject {
    pub identifier: String,
    pub role: String,
}

/// Type-specific technical metadata kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedKind {
    Mix,
    AudioMd,
    VideoMd,
    Tabular,
}

impl TypedKind {
    fn suffix(self) -> &'static str {
        match self {
            TypedKind::Mix => "-mix-amd.json",
            TypedKind::AudioMd => "-audiomd-amd.json",
            TypedKind::VideoMd => "-videomd-amd.json",
            TypedKind::Tabular => "-tabular-amd.json",
        }
    }

    fn section(self) -> &'static str {
        match self {
            TypedKind::Mix => "image",
            TypedKind::AudioMd => "audio",
            TypedKind::VideoMd => "video",
            TypedKind::Tabular => "tabular",
        }
    }
}

const TYPED_KINDS: [TypedKind; 4] = [
    TypedKind::Mix,
    TypedKind::AudioMd,
    TypedKind::VideoMd,
    TypedKind::Tabular,
];

/// Writes metadata fragments into one working directory and compiles them
/// into the package manifest.
pub struct ManifestBuilder<'a> {
    temp_path: &'a Path,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(temp_path: &'a Path) -> Self {
        Self { temp_path }
    }

    /// Deterministic fragment handle for a target path or identifier.
    ///
    /// The handle combines a sanitized basename with a short content hash of
    /// the full target, so distinct targets with equal basenames cannot
    /// collide and reruns reuse the same names.
    pub fn handle_for(target: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(target.as_bytes());
        let digest = hex::encode(hasher.finalize());
        let basename = target.rsplit('/').next().unwrap_or(target);
        let sanitized: String = basename
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{sanitized}-{}", &digest[..8])
    }

    fn fragment_path(&self, handle: &str, suffix: &str) -> PathBuf {
        self.temp_path.join(format!("{handle}{suffix}"))
    }

    fn write_json(&self, path: &Path, value: &Value) -> SipResult<()> {
        fs::write(path, serde_json::to_vec_pretty(value)?)?;
        Ok(())
    }

    fn read_json(&self, path: &Path) -> SipResult<Value> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SipError::stage(STAGE, format!("cannot read fragment {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn append_reference(&self, index: &str, record: &Value) -> SipResult<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.temp_path.join(index))?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn read_references(&self, index: &str) -> SipResult<Vec<Value>> {
        let path = self.temp_path.join(index);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        let mut out = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            out.push(serde_json::from_str(line)?);
        }
        Ok(out)
    }

    /// Record the technical object section for one digital object.
    pub fn import_object(&self, handle: &str, section: &ObjectSection) -> SipResult<()> {
        let path = self.fragment_path(handle, "-premis-object-amd.json");
        self.write_json(&path, &serde_json::to_value(section)?)?;
        self.append_reference(
            TECHNICAL_INDEX,
            &json!({
                "handle": handle,
                "path": section.path,
                "use": section.usage,
            }),
        )
    }

    /// Cache the scraped stream descriptors next to the object section.
    pub fn write_stream_cache(&self, handle: &str, streams: &[StreamDescriptor]) -> SipResult<()> {
        let path = self.fragment_path(handle, "-scraper.json");
        self.write_json(&path, &serde_json::to_value(streams)?)
    }

    /// Record a type-specific technical section for one object.
    pub fn create_typed_technical(
        &self,
        handle: &str,
        kind: TypedKind,
        payload: &Value,
    ) -> SipResult<()> {
        let path = self.fragment_path(handle, kind.suffix());
        self.write_json(&path, payload)
    }

    /// Append one agent record to the per-event agent accumulation file.
    pub fn create_agent(&self, agent_handle: &str, record: &Value) -> SipResult<()> {
        let path = self.fragment_path(agent_handle, "-agents.json");
        let mut agents: Vec<Value> = if path.exists() {
            serde_json::from_value(self.read_json(&path)?)?
        } else {
            Vec::new()
        };
        agents.push(record.clone());
        self.write_json(&path, &Value::Array(agents))
    }

    /// Record the provenance event section, associating the agents
    /// accumulated under the same handle.
    pub fn premis_event(&self, handle: &str, section: &EventSection) -> SipResult<()> {
        let agents_path = self.fragment_path(handle, "-agents.json");
        let agents: Vec<Value> = if agents_path.exists() {
            serde_json::from_value(self.read_json(&agents_path)?)?
        } else {
            Vec::new()
        };

        let mut fragment = serde_json::to_value(section)?;
        fragment["agents"] = Value::Array(agents);

        let path = self.fragment_path(handle, "-premis-event-amd.json");
        self.write_json(&path, &fragment)?;
        self.append_reference(PROVENANCE_INDEX, &json!({ "handle": handle }))
    }

    /// Import one descriptive metadata file, attributed to the given agent.
    pub fn import_description(
        &self,
        source: &Path,
        remove_root: bool,
        agent: (&str, &str),
    ) -> SipResult<()> {
        let bytes = fs::read(source).map_err(|e| {
            SipError::stage(
                STAGE,
                format!("cannot read descriptive metadata {}: {e}", source.display()),
            )
        })?;
        let mut content = String::from_utf8_lossy(&bytes).into_owned();
        if remove_root {
            content = strip_root_element(&content);
        }

        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let handle = Self::handle_for(&filename);
        let fragment = json!({
            "source": filename,
            "agent": { "name": agent.0, "type": agent.1 },
            "content": content,
        });
        let path = self.fragment_path(&handle, "-dmdsec.json");
        self.write_json(&path, &fragment)?;
        self.append_reference(DESCRIPTIVE_INDEX, &json!({ "handle": handle }))
    }

    /// Compile the file section and structural map from the recorded
    /// technical references.
    pub fn compile_structmap(&self) -> SipResult<()> {
        let references = self.read_references(TECHNICAL_INDEX)?;
        if references.is_empty() {
            return Err(SipError::stage(STAGE, "no digital objects to map"));
        }

        let mut files = Vec::new();
        let mut paths = Vec::new();
        for reference in &references {
            let path = reference
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let mut entry = json!({
                "path": path,
                "admid": reference.get("handle").cloned().unwrap_or(Value::Null),
            });
            if let Some(usage) = reference.get("use").filter(|u| !u.is_null()) {
                entry["use"] = usage.clone();
            }
            files.push(entry);
            paths.push(path);
        }

        self.write_json(
            &self.temp_path.join(FILESEC_NAME),
            &json!({ "files": files }),
        )?;
        self.write_json(
            &self.temp_path.join(STRUCTMAP_NAME),
            &json!({ "type": "directory", "label": ".", "divs": structmap_divs(&paths) }),
        )
    }

    /// Compile the full manifest from all recorded fragments.
    ///
    /// With `clean` set, the consumed fragment files are removed once the
    /// manifest has been written; accumulation files, stream caches, and
    /// reference indexes stay behind for the cleanup stage.
    pub fn compile_manifest(
        &self,
        organization_name: &str,
        contract_id: &str,
        objid: &str,
        clean: bool,
    ) -> SipResult<PathBuf> {
        let mut consumed = Vec::new();

        let mut technical = Vec::new();
        let mut typed_sections: Vec<(TypedKind, Vec<Value>)> =
            TYPED_KINDS.iter().map(|k| (*k, Vec::new())).collect();
        for reference in self.read_references(TECHNICAL_INDEX)? {
            let handle = reference
                .get("handle")
                .and_then(Value::as_str)
                .ok_or_else(|| SipError::stage(STAGE, "technical reference without handle"))?
                .to_string();
            let object_path = self.fragment_path(&handle, "-premis-object-amd.json");
            technical.push(self.read_json(&object_path)?);
            consumed.push(object_path);

            for (kind, values) in typed_sections.iter_mut() {
                let typed_path = self.fragment_path(&handle, kind.suffix());
                if typed_path.exists() {
                    let mut payload = self.read_json(&typed_path)?;
                    payload["admid"] = json!(handle);
                    values.push(payload);
                    consumed.push(typed_path);
                }
            }
        }

        let mut provenance = Vec::new();
        for reference in self.read_references(PROVENANCE_INDEX)? {
            let handle = reference
                .get("handle")
                .and_then(Value::as_str)
                .ok_or_else(|| SipError::stage(STAGE, "provenance reference without handle"))?
                .to_string();
            let event_path = self.fragment_path(&handle, "-premis-event-amd.json");
            provenance.push(self.read_json(&event_path)?);
            consumed.push(event_path);
        }

        let mut descriptive = Vec::new();
        for reference in self.read_references(DESCRIPTIVE_INDEX)? {
            let handle = reference
                .get("handle")
                .and_then(Value::as_str)
                .ok_or_else(|| SipError::stage(STAGE, "descriptive reference without handle"))?
                .to_string();
            let dmd_path = self.fragment_path(&handle, "-dmdsec.json");
            descriptive.push(self.read_json(&dmd_path)?);
            consumed.push(dmd_path);
        }

        let filesec_path = self.temp_path.join(FILESEC_NAME);
        let structmap_path = self.temp_path.join(STRUCTMAP_NAME);
        let filesec = self.read_json(&filesec_path)?;
        let structmap = self.read_json(&structmap_path)?;
        consumed.push(filesec_path);
        consumed.push(structmap_path);

        let mut manifest = json!({
            "profile": "cultural-heritage",
            "objid": objid,
            "contract_id": contract_id,
            "creator": {
                "name": organization_name,
                "type": "ORGANIZATION",
                "role": "CREATOR",
            },
            "technical": technical,
            "provenance": provenance,
            "descriptive": descriptive,
            "filesec": filesec,
            "structmap": structmap,
        });
        for (kind, values) in typed_sections {
            if !values.is_empty() {
                manifest[kind.section()] = Value::Array(values);
            }
        }

        let manifest_path = self.temp_path.join(MANIFEST_NAME);
        self.write_json(&manifest_path, &manifest)?;

        if clean {
            for path in consumed {
                fs::remove_file(&path).map_err(|e| {
                    SipError::stage(
                        STAGE,
                        format!("cannot remove consumed fragment {}: {e}", path.display()),
                    )
                })?;
            }
        }

        Ok(manifest_path)
    }
}

/// Nested directory divisions for the structural map.
fn structmap_divs(paths: &[String]) -> Value {
    // group files by their leading directory component
    let mut files = Vec::new();
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for path in paths {
        match path.split_once('/') {
            None => files.push(json!({ "type": "file", "path": path })),
            Some((dir, rest)) => {
                if let Some((_, members)) = groups.iter_mut().find(|(name, _)| name == dir) {
                    members.push(rest.to_string());
                } else {
                    groups.push((dir.to_string(), vec![rest.to_string()]));
                }
            }
        }
    }

    let mut divs = files;
    for (dir, members) in groups {
        divs.push(json!({
            "type": "directory",
            "label": dir,
            "divs": structmap_divs(&members),
        }));
    }
    Value::Array(divs)
}

/// Drop the XML declaration and the outermost element's own tags.
fn strip_root_element(content: &str) -> String {
    let body = content.trim();
    let body = if body.starts_with("<?") {
        match body.find("?>") {
            Some(i) => body[i + 2..].trim_start(),
            None => body,
        }
    } else {
        body
    };
    let Some(open_end) = body.find('>') else {
        return body.to_string();
    };
    let Some(close_start) = body.rfind("</") else {
        return body.to_string();
    };
    if close_start <= open_end {
        return body.to_string();
    }
    body[open_end + 1..close_start].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_section(id: &str, path: &str) -> ObjectSection {
        ObjectSection {
            identifier_type: "UUID".into(),
            identifier: id.into(),
            alt_identifiers: Vec::new(),
            original_name: path.rsplit('/').next().unwrap_or(path).into(),
            path: path.into(),
            digest_algorithm: "MD5".into(),
            digest: "abc".into(),
            format: FormatSection {
                name: "text/plain".into(),
                version: None,
            },
            usage: None,
        }
    }

    #[test]
    fn handles_are_deterministic_and_distinct() {
        let a1 = ManifestBuilder::handle_for("audio/testfile1.wav");
        let a2 = ManifestBuilder::handle_for("audio/testfile1.wav");
        let b = ManifestBuilder::handle_for("other/testfile1.wav");
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1.starts_with("testfile1_wav-"));
    }

    #[test]
    fn manifest_collects_sections_in_reference_order() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ManifestBuilder::new(dir.path());

        for (id, path) in [("o1", "b.txt"), ("o2", "a.txt")] {
            let handle = ManifestBuilder::handle_for(path);
            builder.import_object(&handle, &object_section(id, path)).unwrap();
        }
        let audio_handle = ManifestBuilder::handle_for("audio/x.wav");
        builder
            .import_object(&audio_handle, &object_section("o3", "audio/x.wav"))
            .unwrap();
        builder
            .create_typed_technical(&audio_handle, TypedKind::AudioMd, &json!({"codec": "pcm"}))
            .unwrap();

        let event_handle = ManifestBuilder::handle_for("e1");
        builder
            .create_agent(&event_handle, &json!({"identifier": "agent-1", "role": "implementer"}))
            .unwrap();
        builder
            .premis_event(
                &event_handle,
                &EventSection {
                    identifier_type: "local".into(),
                    identifier: "e1".into(),
                    event_type: "modification".into(),
                    datetime: "2022-01-01T00:00:00".into(),
                    outcome: "success".into(),
                    detail: "Modification of digital object.".into(),
                    outcome_detail: "Object has been modified.".into(),
                    linked_objects: vec![LinkedObject {
                        identifier: "o1".into(),
                        role: "target".into(),
                    }],
                },
            )
            .unwrap();

        let desc = dir.path().join("desc.xml");
        fs::write(&desc, "<?xml version=\"1.0\"?><dc><title>T</title></dc>").unwrap();
        builder
            .import_description(&desc, true, ("sipkit-core (0.1.0)", "software"))
            .unwrap();

        builder.compile_structmap().unwrap();
        let manifest_path = builder
            .compile_manifest("Archive X", "urn:uuid:1", "Package_1", true)
            .unwrap();

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest["objid"], "Package_1");
        assert_eq!(manifest["creator"]["name"], "Archive X");
        assert_eq!(manifest["technical"].as_array().unwrap().len(), 3);
        // feed order, not lexicographic order
        assert_eq!(manifest["technical"][0]["path"], "b.txt");
        assert_eq!(manifest["technical"][1]["path"], "a.txt");
        assert_eq!(manifest["audio"].as_array().unwrap().len(), 1);
        assert_eq!(manifest["provenance"].as_array().unwrap().len(), 1);
        assert_eq!(manifest["provenance"][0]["agents"].as_array().unwrap().len(), 1);
        assert_eq!(manifest["descriptive"].as_array().unwrap().len(), 1);
        assert_eq!(manifest["descriptive"][0]["content"], "<title>T</title>");
        assert_eq!(manifest["filesec"]["files"].as_array().unwrap().len(), 3);

        // consumed fragments are gone, accumulation files remain
        assert!(!dir.path().join(format!("{audio_handle}-audiomd-amd.json")).exists());
        assert!(dir.path().join(format!("{event_handle}-agents.json")).exists());
        assert!(dir.path().join(TECHNICAL_INDEX).exists());
    }

    #[test]
    fn structmap_requires_objects() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ManifestBuilder::new(dir.path());
        assert!(builder.compile_structmap().is_err());
    }

    #[test]
    fn structmap_groups_by_directory() {
        let divs = structmap_divs(&[
            "readme.txt".to_string(),
            "audio/a.wav".to_string(),
            "audio/b.wav".to_string(),
        ]);
        let divs = divs.as_array().unwrap();
        assert_eq!(divs.len(), 2);
        assert_eq!(divs[0]["path"], "readme.txt");
        assert_eq!(divs[1]["label"], "audio");
        assert_eq!(divs[1]["divs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn root_element_stripping() {
        assert_eq!(
            strip_root_element("<?xml version=\"1.0\"?>\n<root a=\"1\"><x>1</x></root>"),
            "<x>1</x>"
        );
        assert_eq!(strip_root_element("no markup"), "no markup");
    }
}
