use std::path::Path;

use buildtime_build_index::BuildEntry;
use buildtime_build_index::BuildIndexReader;
use buildtime_watch::CacheTree;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::error::Result;

/// Latest recorded entry of one cache tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentBuild {
    pub tree: CacheTree,
    pub entry: BuildEntry,
}

/// Reads the newest entry of every cache tree under `root`, most recently
/// written manifest first. Trees without a readable manifest are skipped.
pub fn list_recent_entries(root: &Path, config: &MonitorConfig) -> Result<Vec<RecentBuild>> {
    let reader = BuildIndexReader::new(config.index.clone());
    let trees = CacheTree::scan(root, &config.watch.excluded_dirs)?;
    debug!(root = %root.display(), trees = trees.len(), "listing recent builds");

    let mut builds: Vec<RecentBuild> = trees
        .into_iter()
        .filter_map(|tree| {
            let entry = reader.read(&tree.path)?;
            Some(RecentBuild { tree, entry })
        })
        .collect();
    builds.sort_by(|a, b| {
        b.entry
            .modification_date
            .cmp(&a.entry.modification_date)
            .then_with(|| a.tree.path.cmp(&b.tree.path))
    });
    Ok(builds)
}
