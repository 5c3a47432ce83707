use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use crate::error::Result;
use crate::error::WatchError;

/// One per-project build cache directory under the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTree {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl CacheTree {
    /// Lists the immediate child directories of `root`, newest first.
    ///
    /// Hidden entries and names in `excluded` are skipped. Equal modification
    /// times are ordered by path.
    pub fn scan(root: &Path, excluded: &[String]) -> Result<Vec<CacheTree>> {
        if !root.is_dir() {
            return Err(WatchError::PathNotFound(root.to_path_buf()));
        }

        let mut trees = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(root = %root.display(), "skipping unreadable entry: {err}");
                    continue;
                }
            };

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.')
                || excluded.iter().any(|skip| skip.as_str() == name.as_ref())
            {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_dir() => metadata,
                Ok(_) => continue,
                Err(err) => {
                    debug!(path = %entry.path().display(), "skipping entry without metadata: {err}");
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            trees.push(CacheTree {
                path: entry.path(),
                modified,
            });
        }

        trees.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(trees)
    }

    /// Most recently modified cache tree, if the root has any.
    pub fn newest(root: &Path, excluded: &[String]) -> Result<Option<CacheTree>> {
        Ok(Self::scan(root, excluded)?.into_iter().next())
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
