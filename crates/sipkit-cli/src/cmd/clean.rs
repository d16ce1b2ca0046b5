use std::path::Path;

use anyhow::Result;

use sipkit_core::pipeline::cleanup::clean_temp_files;

pub fn run(temp_path: &Path, delete_path: bool) -> Result<()> {
    clean_temp_files(temp_path, None, None, delete_path)?;
    println!("Cleaned temporary files from {}", temp_path.display());
    Ok(())
}
