//! File pattern matcher for the directories the stages scan.

use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to build glob set: {0}")]
    GlobSetBuild(#[from] globset::Error),
}

/// Lists the files directly inside one directory that match a set of glob patterns.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    dir: PathBuf,
    include_set: GlobSet,
}

impl FileMatcher {
    /// Creates a matcher for `dir`. Patterns are matched against file names.
    ///
    /// # Errors
    /// `MatcherError` when a pattern is not a valid glob.
    pub fn new(dir: impl Into<PathBuf>, patterns: &[&str]) -> Result<Self, MatcherError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidPattern {
                pattern: (*pattern).to_string(),
                source,
            })?;
            builder.add(glob);
        }
        Ok(Self { dir: dir.into(), include_set: builder.build()? })
    }

    /// Returns true if the file name of `path` matches one of the patterns.
    #[must_use]
    pub fn is_match(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.include_set.is_match(name))
    }

    /// Matching files, sorted by path. A missing directory has no files.
    #[must_use]
    pub fn find_files(&self) -> Vec<PathBuf> {
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "Directory does not exist");
            return Vec::new();
        }

        let mut found_files = Vec::new();
        // build outputs are usually git-ignored, so ignore files are not consulted
        for result in WalkBuilder::new(&self.dir)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .max_depth(Some(1))
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if self.is_match(entry.path()) {
                found_files.push(entry.into_path());
            }
        }

        found_files.sort();
        found_files
    }
}
