//! Tar packaging with glob-based exclusion.
//!
//! The archive is rooted at the source tree with `./`-prefixed member names.
//! Sidecar files (the compiled manifest and its signature) can be appended to
//! an existing archive; the append seeks back over the tar end-of-archive
//! trailer so the result stays a single valid archive.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tar::{Archive, Builder};
use walkdir::WalkDir;

use crate::errors::{SipError, SipResult};

const STAGE: &str = "packaging";

/// Compile adaptor exclusion patterns into one matcher.
pub fn build_exclusions(patterns: &[String]) -> SipResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            SipError::config(format!("invalid exclusion pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SipError::config(format!("cannot build exclusion set: {e}")))
}

/// Archive `source_dir` into `tar_path`, skipping excluded paths.
///
/// Returns the number of members written.
pub fn create_archive(
    tar_path: &Path,
    source_dir: &Path,
    excludes: &GlobSet,
) -> SipResult<usize> {
    let file = File::create(tar_path).map_err(|e| {
        SipError::stage(STAGE, format!("cannot create {}: {e}", tar_path.display()))
    })?;
    let mut builder = Builder::new(file);
    let mut members = 0;

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry =
            entry.map_err(|e| SipError::stage(STAGE, format!("cannot walk source tree: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source_dir).map_err(|e| {
            SipError::stage(STAGE, format!("path outside source tree: {e}"))
        })?;
        let relative_name = relative.to_string_lossy().replace('\\', "/");
        if excludes.is_match(&relative_name) {
            continue;
        }
        builder
            .append_path_with_name(entry.path(), Path::new(".").join(relative))
            .map_err(|e| {
                SipError::stage(
                    STAGE,
                    format!("cannot archive {}: {e}", entry.path().display()),
                )
            })?;
        members += 1;
    }

    builder
        .finish()
        .map_err(|e| SipError::stage(STAGE, format!("cannot finish archive: {e}")))?;
    Ok(members)
}

/// Append files to an existing archive as `./`-rooted members.
pub fn append_files(tar_path: &Path, files: &[PathBuf]) -> SipResult<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(tar_path)
        .map_err(|e| SipError::stage(STAGE, format!("cannot open {}: {e}", tar_path.display())))?;

    // A tar archive ends with two 512-byte zero blocks; keep writing from
    // just before them so appended members stay inside the archive.
    let len = file
        .metadata()
        .map_err(|e| SipError::stage(STAGE, e.to_string()))?
        .len();
    let offset = if len >= 1024 { len - 1024 } else { len };
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| SipError::stage(STAGE, e.to_string()))?;

    let mut builder = Builder::new(file);
    for path in files {
        let name = path.file_name().ok_or_else(|| {
            SipError::stage(STAGE, format!("sidecar {} has no file name", path.display()))
        })?;
        builder
            .append_path_with_name(path, Path::new(".").join(name))
            .map_err(|e| {
                SipError::stage(STAGE, format!("cannot append {}: {e}", path.display()))
            })?;
    }
    builder
        .finish()
        .map_err(|e| SipError::stage(STAGE, format!("cannot finish archive: {e}")))?;
    Ok(())
}

/// Count the members of an archive.
pub fn archive_member_count(tar_path: &Path) -> SipResult<usize> {
    let file = File::open(tar_path)
        .map_err(|e| SipError::stage(STAGE, format!("cannot open {}: {e}", tar_path.display())))?;
    let mut archive = Archive::new(file);
    let entries = archive
        .entries()
        .map_err(|e| SipError::stage(STAGE, e.to_string()))?;
    let mut count = 0;
    for entry in entries {
        entry.map_err(|e| SipError::stage(STAGE, e.to_string()))?;
        count += 1;
    }
    Ok(count)
}

/// List the member names of an archive.
pub fn archive_member_names(tar_path: &Path) -> SipResult<Vec<String>> {
    let file = File::open(tar_path)
        .map_err(|e| SipError::stage(STAGE, format!("cannot open {}: {e}", tar_path.display())))?;
    let mut archive = Archive::new(file);
    let mut names = Vec::new();
    for entry in archive
        .entries()
        .map_err(|e| SipError::stage(STAGE, e.to_string()))?
    {
        let entry = entry.map_err(|e| SipError::stage(STAGE, e.to_string()))?;
        let path = entry
            .path()
            .map_err(|e| SipError::stage(STAGE, e.to_string()))?;
        names.push(path.to_string_lossy().into_owned());
    }
    Ok(names)
}
