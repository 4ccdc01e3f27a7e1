use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::error::{CrawlError, CrawlResult};
use crate::registry::{CookieRegistry, IframeRegistry};
use crate::tree::PageNode;

pub const CRAWL_FILE: &str = "crawl.json";
pub const COOKIES_FILE: &str = "cookies.json";
pub const IFRAMES_FILE: &str = "iframes.json";
pub const SCREENSHOT_DIR: &str = "screenshots";

/// Writes the results of one run into its own directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    /// Set when the directory was named by the user rather than derived from the seed
    explicit: bool,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            explicit: false,
        }
    }

    /// Mark the directory as user-supplied; emptying it then logs a warning
    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.dir.join(SCREENSHOT_DIR)
    }

    /// Create the run directory if needed and remove everything a previous run left in it
    ///
    /// The working directory, the home directory and filesystem roots are
    /// refused with a ConfigurationError before anything is touched.
    pub fn prepare(&self) -> CrawlResult<()> {
        if is_protected(&self.dir) {
            return Err(CrawlError::Configuration(format!(
                "refusing to empty output directory {:?}",
                self.dir
            )));
        }

        fs::create_dir_all(&self.dir).map_err(|e| CrawlError::file_system(&self.dir, e))?;

        let entries: Vec<_> = fs::read_dir(&self.dir)
            .map_err(|e| CrawlError::file_system(&self.dir, e))?
            .collect();
        if self.explicit && !entries.is_empty() {
            ::log::warn!(
                "Output directory {} is not empty; removing its {} entries",
                self.dir.display(),
                entries.len()
            );
        }

        for entry in entries {
            let entry = entry.map_err(|e| CrawlError::file_system(&self.dir, e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| CrawlError::file_system(&path, e))?;
            let removed = if file_type.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|e| CrawlError::file_system(&path, e))?;
            ::log::debug!("Removed stale output {}", path.display());
        }

        ::log::info!("Writing results to {}", self.dir.display());
        Ok(())
    }

    /// Serialize the tree and both artifact registries
    ///
    /// Files are written in order; a failure leaves earlier files in place.
    pub fn write(
        &self,
        root: &PageNode,
        cookies: &CookieRegistry,
        iframes: &IframeRegistry,
    ) -> CrawlResult<()> {
        self.write_json(CRAWL_FILE, root)?;
        self.write_json(COOKIES_FILE, cookies)?;
        self.write_json(IFRAMES_FILE, iframes)?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> CrawlResult<()> {
        let path = self.dir.join(name);
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        fs::write(&path, json).map_err(|e| CrawlError::file_system(&path, e))?;
        ::log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

/// Whether `dir` is a directory a run must never empty
pub fn is_protected(dir: &Path) -> bool {
    // "", ".", "..", "./.." and the like
    if dir
        .components()
        .all(|c| matches!(c, Component::CurDir | Component::ParentDir))
    {
        return true;
    }
    // "/" or a bare drive prefix
    if dir.parent().is_none() {
        return true;
    }

    let Ok(target) = dir.canonicalize() else {
        // not there yet, so nothing in it can be lost
        return false;
    };
    if target.parent().is_none() {
        return true;
    }
    let same_as = |other: Option<PathBuf>| {
        other
            .and_then(|p| p.canonicalize().ok())
            .is_some_and(|p| p == target)
    };
    same_as(env::current_dir().ok()) || same_as(env::var_os("HOME").map(PathBuf::from))
}
