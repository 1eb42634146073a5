use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{OutputError, Result};

/// Temp file written next to `path` before the final rename.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A fully written temp file waiting to be renamed onto its target.
///
/// Dropping a file that was never committed removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    target_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Rename the temp file onto the target.
    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.temp_path, &self.target_path).map_err(|e| {
            OutputError::AtomicWriteFailed {
                temp_path: self.temp_path.clone(),
                target_path: self.target_path.clone(),
                source: e,
            }
        })?;
        self.committed = true;
        Ok(self.target_path.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Write `path`'s temp file without touching `path` itself.
///
/// `write` receives a buffered writer on the temp file. On any error the temp
/// file is removed.
pub fn stage_atomic<F>(path: &Path, write: F) -> Result<StagedFile>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io("create directory", parent, e))?;
    }

    let staged = StagedFile {
        temp_path: temp_path_for(path),
        target_path: path.to_path_buf(),
        committed: false,
    };
    write_temp(&staged.temp_path, write)?;
    Ok(staged)
}

/// Write a file atomically (temp file + rename).
///
/// On any error `path` is left untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    stage_atomic(path, write)?.commit()?;
    Ok(())
}

/// Commit staged files in order, all or nothing.
///
/// If a rename fails, targets already committed by this call are removed and
/// the remaining temp files are dropped.
pub fn commit_all(files: Vec<StagedFile>) -> Result<Vec<PathBuf>> {
    let mut committed: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        match file.commit() {
            Ok(path) => committed.push(path),
            Err(error) => {
                for path in &committed {
                    let _ = fs::remove_file(path);
                }
                return Err(error);
            }
        }
    }
    Ok(committed)
}

fn write_temp<F>(temp_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(temp_path).map_err(|e| OutputError::io("create", temp_path, e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .map_err(|e| OutputError::io("write", temp_path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| OutputError::io("sync", temp_path, e))?;
    Ok(())
}
