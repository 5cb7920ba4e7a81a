use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip `source_dir` into `zip_path`, preserving paths relative to the
/// directory root. Links are not followed; a mirror clone holds only regular
/// files and directories.
pub fn zip_directory(source_dir: &Path, zip_path: &Path) -> Result<()> {
    let file = File::create(zip_path)
        .with_context(|| format!("failed to create {}", zip_path.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry.context("failed to walk clone directory")?;
        let path = entry.path();

        let relative = match path.strip_prefix(source_dir) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };
        let name = relative.to_string_lossy();

        if entry.file_type().is_dir() {
            writer
                .add_directory(name.as_ref(), options)
                .with_context(|| format!("failed to archive directory {}", name))?;
        } else if entry.file_type().is_file() {
            writer
                .start_file(name.as_ref(), options)
                .with_context(|| format!("failed to archive {}", name))?;
            let mut reader = BufReader::new(
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
            );
            std::io::copy(&mut reader, &mut writer)
                .with_context(|| format!("failed to archive {}", name))?;
        }
    }

    writer.finish().context("failed to finalize archive")?;

    Ok(())
}
