use std::path::{Path, PathBuf};

use crate::domain::site::{Site, MASTER_FILE_NAME};

/// Folder holding the files of the current run.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputDir { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn site_file(&self, site: Site) -> PathBuf {
        self.root.join(site.file_name())
    }

    pub fn master_file(&self) -> PathBuf {
        self.root.join(MASTER_FILE_NAME)
    }

    pub fn debug_page(&self, site: Site, term: &str) -> PathBuf {
        let term: String = term
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.root
            .join(format!("error_page_{}_{}.html", site.name().to_lowercase(), term))
    }

    /// Creates the folder if needed and removes the files left by a previous run.
    pub fn reset(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
