use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// True when the file name carries an extension from the allowed set.
pub fn is_allowed_file(file_name: &str, allowed_extensions: &BTreeSet<String>) -> bool {
    match file_name.rsplit_once('.') {
        Some((_, extension)) => allowed_extensions.contains(&extension.to_lowercase()),
        None => false,
    }
}

/// Creates a uniquely named folder for one batch run under the results root
/// and returns its id and path.
pub fn create_batch_folder(results_folder: &Path) -> Result<(String, PathBuf)> {
    let batch_id = Uuid::new_v4().to_string();
    let batch_folder = results_folder.join(&batch_id);
    fs::create_dir_all(&batch_folder)
        .with_context(|| format!("Failed to create batch folder {}", batch_folder.display()))?;
    debug!("Created batch folder: {}", batch_folder.display());
    Ok((batch_id, batch_folder))
}

/// Packs everything under `batch_folder` into `zip_filename` inside that
/// same folder, with archive paths relative to the folder.
pub fn create_zip_file(batch_folder: &Path, zip_filename: &str) -> Result<PathBuf> {
    let zip_path = batch_folder.join(zip_filename);
    let file = File::create(&zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(batch_folder) {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path == zip_path {
            continue;
        }
        let name = path
            .strip_prefix(batch_folder)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut zip)?;
    }
    zip.finish()?;

    info!("Created zip archive: {}", zip_path.display());
    Ok(zip_path)
}

/// Removes the plain files inside `folder`, leaving subdirectories alone.
pub fn clear_folder(folder: &Path) -> Result<()> {
    for entry in
        fs::read_dir(folder).with_context(|| format!("Failed to read {}", folder.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}
