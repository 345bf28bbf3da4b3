//! Destinations for run artifacts (snapshots, CSS reports, final markup).
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ORIGINAL_HTML: &str = "output-original.html";
pub const FINAL_HTML: &str = "output-final.html";

pub fn step_html(step: usize) -> String {
    format!("steps/output-step-{step}.html")
}

pub fn step_optimized_css(step: usize) -> String {
    format!("steps/output-step-{step}-optimized-css.css")
}

pub fn step_unused_css(step: usize) -> String {
    format!("steps/output-step-{step}-unused-css.css")
}

/// Sink for artifacts addressed by a path relative to the run's output
/// directory.
pub trait ArtifactWriter {
    fn write(&mut self, rel_path: &str, content: &str) -> Result<()>;
}

/// Writes artifacts under a directory, creating parents as needed.
#[derive(Debug, Clone)]
pub struct FsArtifactWriter {
    root: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove output left by a previous run and recreate the directory.
    pub fn reset(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("remove {}", self.root.display()))?;
        }
        fs::create_dir_all(&self.root).with_context(|| format!("create {}", self.root.display()))
    }
}

impl ArtifactWriter for FsArtifactWriter {
    fn write(&mut self, rel_path: &str, content: &str) -> Result<()> {
        let path = self.root.join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "artifact written");
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by relative path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryArtifactWriter {
    pub files: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
impl MemoryArtifactWriter {
    pub fn get(&self, rel_path: &str) -> Option<&str> {
        self.files.get(rel_path).map(String::as_str)
    }
}

#[cfg(test)]
impl ArtifactWriter for MemoryArtifactWriter {
    fn write(&mut self, rel_path: &str, content: &str) -> Result<()> {
        self.files.insert(rel_path.to_string(), content.to_string());
        Ok(())
    }
}

/// Directory name for a source location: `/` becomes `_`.
pub fn output_name_for(location: &str) -> String {
    let name = location.replace('/', "_");
    if name.is_empty() {
        "output".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_writer_creates_nested_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = FsArtifactWriter::new(dir.path().join("site"));
        writer.reset().expect("reset");
        writer.write(&step_html(1), "<p>1</p>").expect("write");
        let written = fs::read_to_string(dir.path().join("site/steps/output-step-1.html"))
            .expect("read back");
        assert_eq!(written, "<p>1</p>");
    }

    #[test]
    fn reset_clears_previous_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = FsArtifactWriter::new(dir.path().join("site"));
        writer.write("stale.html", "old").expect("write");
        writer.reset().expect("reset");
        assert!(!writer.root().join("stale.html").exists());
        assert!(writer.root().is_dir());
    }

    #[test]
    fn output_names_are_flat() {
        assert_eq!(output_name_for("pages/home.html"), "pages_home.html");
        assert_eq!(
            output_name_for("https://example.com/blog"),
            "https:__example.com_blog"
        );
        assert_eq!(output_name_for(""), "output");
    }
}
