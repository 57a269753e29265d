// file: src/pipeline/scanner.rs
// description: papers directory walking and file discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::IngestConfig;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const PAPER_EXTENSIONS: [&str; 2] = ["txt", "md"];

pub struct FileScanner {
    config: IngestConfig,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
    pub modified: u64,
}

impl ScannedFile {
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.relative_path.clone())
    }

    /// `<stem>.json` next to the paper.
    pub fn sidecar_path(&self) -> PathBuf {
        self.path.with_extension("json")
    }
}

impl FileScanner {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        info!("Scanning directory: {}", root.display());

        if !root.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Papers directory does not exist: {}",
                root.display()
            )));
        }

        let max_size = (self.config.max_file_size_mb as u64) * 1024 * 1024;
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();

            if self.should_skip(&relative_path) {
                debug!("Skipping file: {}", path.display());
                continue;
            }

            if let Some(extension) = path.extension().and_then(|e| e.to_str())
                && PAPER_EXTENSIONS.contains(&extension.to_lowercase().as_str())
                && let Ok(metadata) = entry.metadata()
            {
                let size = metadata.len();

                if size > max_size {
                    debug!(
                        "Skipping large file ({} MB): {}",
                        size / 1024 / 1024,
                        path.display()
                    );
                    continue;
                }

                let modified = metadata
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_secs())
                    .unwrap_or(0);

                files.push(ScannedFile {
                    path: path.to_path_buf(),
                    relative_path,
                    size,
                    modified,
                });
            }
        }

        info!("Found {} paper files", files.len());
        Ok(files)
    }

    fn should_skip(&self, relative_path: &str) -> bool {
        for pattern in &self.config.skip_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if relative_path.ends_with(suffix) {
                    return true;
                }
            } else if let Some(prefix) = pattern.strip_suffix("/*") {
                if relative_path.starts_with(&format!("{}/", prefix))
                    || relative_path.contains(&format!("/{}/", prefix))
                {
                    return true;
                }
            } else if relative_path.contains(pattern.as_str()) {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(skip_patterns: Vec<&str>) -> IngestConfig {
        IngestConfig {
            skip_patterns: skip_patterns.into_iter().map(str::to_string).collect(),
            max_file_size_mb: 1,
            ..IngestConfig::default()
        }
    }

    #[test]
    fn test_scan_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.md"), "# B").unwrap();
        fs::write(temp.path().join("a.txt"), "A").unwrap();
        fs::write(temp.path().join("a.json"), "{}").unwrap();
        fs::write(temp.path().join("image.png"), "png").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("c.TXT"), "C").unwrap();

        let scanner = FileScanner::new(config(vec![]));
        let files = scanner.scan_directory(temp.path()).unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"a.txt"));
        assert!(names.contains(&"b.md"));
        assert_eq!(files[0].stem(), "a");
        assert_eq!(files[0].sidecar_path(), temp.path().join("a.json"));
    }

    #[test]
    fn test_large_files_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("big.txt"), vec![b'a'; 2 * 1024 * 1024]).unwrap();
        fs::write(temp.path().join("small.txt"), "small").unwrap();

        let scanner = FileScanner::new(config(vec![]));
        let files = scanner.scan_directory(temp.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "small.txt");
    }

    #[test]
    fn test_missing_directory_rejected() {
        let scanner = FileScanner::new(config(vec![]));
        assert!(scanner.scan_directory(Path::new("/nonexistent/papers")).is_err());
    }

    #[test]
    fn test_skip_patterns() {
        let scanner = FileScanner::new(config(vec!["*.draft.md", ".git/*", "archive"]));

        assert!(scanner.should_skip("notes.draft.md"));
        assert!(scanner.should_skip(".git/description.md"));
        assert!(scanner.should_skip("sub/.git/HEAD.txt"));
        assert!(scanner.should_skip("old/archive/paper.txt"));
        assert!(!scanner.should_skip("paper.md"));
    }
}
