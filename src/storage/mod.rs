// src/storage/mod.rs
use crate::utils::error::StorageError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where the final pool text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_arg(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p != Path::new("-") => Self::File(p.to_path_buf()),
            _ => Self::Stdout,
        }
    }
}

pub struct StorageManager {
    target: OutputTarget,
    debug_dir: Option<PathBuf>,
}

fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    // Create the directories if they don't exist
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).map_err(StorageError::IoError)?;
    }
    Ok(())
}

impl StorageManager {
    /// Creates a new StorageManager; the debug directory is created up front.
    pub fn new(target: OutputTarget, debug_dir: Option<&Path>) -> Result<Self, StorageError> {
        if let Some(dir) = debug_dir {
            ensure_dir(dir)?;
        }
        Ok(Self {
            target,
            debug_dir: debug_dir.map(Path::to_path_buf),
        })
    }

    /// Writes the formatted pool, replacing any existing output file.
    pub fn save_pool(&self, text: &str) -> Result<(), StorageError> {
        match &self.target {
            OutputTarget::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(text.as_bytes())?;
                handle.flush()?;
            }
            OutputTarget::File(path) => {
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                let mut file = fs::File::create(path).map_err(StorageError::IoError)?;
                file.write_all(text.as_bytes()).map_err(StorageError::IoError)?;
                tracing::info!("Saved pool to {}", path.display());
            }
        }
        Ok(())
    }

    /// Saves the normalized lines of one input for inspecting segmentation.
    /// Does nothing unless a debug directory was configured.
    pub fn save_normalized(&self, source: &Path, lines: &[String]) -> Result<Option<PathBuf>, StorageError> {
        let Some(dir) = &self.debug_dir else {
            return Ok(None);
        };
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pool".to_string());
        let file_path = dir.join(format!("{}.normalized.txt", stem));

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&file_path, content).map_err(StorageError::IoError)?;

        tracing::debug!("Saved normalized lines to {}", file_path.display());
        Ok(Some(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_target_from_arg() {
        assert_eq!(OutputTarget::from_arg(None), OutputTarget::Stdout);
        assert_eq!(OutputTarget::from_arg(Some(Path::new("-"))), OutputTarget::Stdout);
        assert_eq!(
            OutputTarget::from_arg(Some(Path::new("out.txt"))),
            OutputTarget::File(PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn test_save_pool_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pool.txt");
        let storage = StorageManager::new(OutputTarget::File(path.clone()), None).unwrap();

        storage.save_pool("T1A01\nQ?\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "T1A01\nQ?\n");

        // Output is replaced, not appended
        storage.save_pool("").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_save_normalized_only_with_debug_dir() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec!["T1A01".to_string(), "Q?".to_string()];

        let quiet = StorageManager::new(OutputTarget::Stdout, None).unwrap();
        assert_eq!(quiet.save_normalized(Path::new("pool.pdf"), &lines).unwrap(), None);

        let debug_dir = dir.path().join("debug");
        let storage = StorageManager::new(OutputTarget::Stdout, Some(&debug_dir)).unwrap();
        let saved = storage.save_normalized(Path::new("in/Technician.pdf"), &lines).unwrap().unwrap();
        assert_eq!(saved, debug_dir.join("Technician.normalized.txt"));
        assert_eq!(fs::read_to_string(saved).unwrap(), "T1A01\nQ?\n");
    }
}
