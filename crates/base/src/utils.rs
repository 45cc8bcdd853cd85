use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

/// Writes `data` to `path` by way of a temporary file in the same directory
/// that is renamed over the destination once fully written.
///
/// Missing parent directories are created. On Unix the file is written with
/// `mode` permissions and newly created directories get `0o700`.
///
/// # Errors
///
/// Returns any I/O error from creating the directory, writing the temporary
/// file or renaming it. The destination is left untouched on error.
pub fn write_file_atomically(path: &Path, data: &[u8], mode: u32) -> std::io::Result<()> {
    let dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    create_private_dir_all(&dir)?;

    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    set_mode(file.path(), mode)?;
    let _file = file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Creates `dir` and its parents, restricting new directories to the owner.
///
/// # Errors
///
/// Returns the I/O error of the underlying directory builder.
pub fn create_private_dir_all(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    let _ = builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        let _ = builder.mode(0o700);
    }
    builder.create(dir)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> { Ok(()) }
