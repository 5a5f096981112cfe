use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::Path;

/// Write content to a file atomically using a temporary file.
///
/// This function:
/// 1. Creates the parent directories if needed.
/// 2. Writes the content to a temporary file in the same directory.
/// 3. Persists (renames) the temporary file to the target path.
///
/// Concurrent readers observe either the old file or the new one, never a
/// partial write.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let write_error = |source: std::io::Error| InfrastructureError::StorageWrite {
        path: path.to_path_buf(),
        source,
    };

    // `Path::new("file.json").parent()` is `Some("")`
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    // Same directory as the target so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;

    temp_file.write_all(content.as_ref()).map_err(write_error)?;
    temp_file.as_file().sync_all().map_err(write_error)?;

    temp_file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
