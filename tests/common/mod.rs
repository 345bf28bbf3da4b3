//! Shared test infrastructure for integration tests.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// A fixture page copied into a scratch directory so runs never touch the
/// checked-in files.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub page_dir: PathBuf,
}

/// Captured result of one binary invocation.
#[derive(Debug)]
pub struct RunOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

pub fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_amp-prototyper"));
    command.env_remove("RUST_LOG");
    command
}

impl TestFixture {
    /// Copy tests/fixtures/{name}/ into a fresh temp directory.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        let source_dir = manifest_dir().join("tests/fixtures").join(name);
        let temp_dir = TempDir::new()?;
        let page_dir = temp_dir.path().join(name);
        fs::create_dir_all(&page_dir)?;
        for entry in fs::read_dir(&source_dir)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", source_dir.display(), e))?
        {
            let entry = entry?;
            fs::copy(entry.path(), page_dir.join(entry.file_name()))?;
        }
        Ok(Self { temp_dir, page_dir })
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.page_dir.join(file)
    }

    pub fn output_root(&self) -> PathBuf {
        self.temp_dir.path().join("output")
    }

    /// Run `compile` on the fixture's index.html into `<output_root>/site`.
    pub fn compile(&self, extra: &[&str]) -> anyhow::Result<RunOutput> {
        let output = binary()
            .arg("compile")
            .arg(self.path("index.html"))
            .arg("--output")
            .arg("site")
            .arg("--output-root")
            .arg(self.output_root())
            .args(extra)
            .output()?;
        Ok(output.into())
    }

    pub fn site_dir(&self) -> PathBuf {
        self.output_root().join("site")
    }

    pub fn read_output(&self, rel: &str) -> String {
        let path = self.site_dir().join(rel);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
    }

    pub fn output_exists(&self, rel: &str) -> bool {
        self.site_dir().join(rel).exists()
    }
}
