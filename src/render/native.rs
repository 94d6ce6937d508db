use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tokio::time;

/// A converter that turns a workbook into PDF with full formatting.
#[async_trait]
pub trait NativeConverter: Send + Sync {
    async fn convert(&self, workbook_path: &Path, output_path: &Path) -> Result<()>;
    fn is_available(&self) -> bool;
    fn name(&self) -> &'static str;
}

/// Headless LibreOffice, run with a throwaway user profile.
pub struct SofficeConverter {
    soffice_path: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(soffice_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            soffice_path: soffice_path.into(),
            timeout,
        }
    }

    fn resolved_binary(&self) -> Option<PathBuf> {
        if self.soffice_path.components().count() > 1 {
            return self.soffice_path.exists().then(|| self.soffice_path.clone());
        }
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&self.soffice_path))
            .find(|candidate| candidate.is_file())
    }
}

#[async_trait]
impl NativeConverter for SofficeConverter {
    async fn convert(&self, workbook_path: &Path, output_path: &Path) -> Result<()> {
        let binary = self
            .resolved_binary()
            .ok_or_else(|| anyhow!("soffice not found at {:?}", self.soffice_path))?;

        let abs_path = workbook_path
            .canonicalize()
            .map_err(|e| anyhow!("failed to canonicalize path: {}", e))?;

        let profile_dir = tempfile::tempdir().context("failed to create profile dir")?;
        let out_dir = tempfile::tempdir().context("failed to create conversion dir")?;

        let output = time::timeout(
            self.timeout,
            Command::new(&binary)
                .arg("--headless")
                .arg("--norestore")
                .arg("--nolockcheck")
                .arg(format!(
                    "-env:UserInstallation=file://{}",
                    profile_dir.path().display()
                ))
                .arg("--convert-to")
                .arg("pdf")
                .arg("--outdir")
                .arg(out_dir.path())
                .arg(&abs_path)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("soffice timed out after {:?}", self.timeout))?
        .map_err(|e| anyhow!("failed to spawn soffice: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "soffice failed (exit {}): {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ));
        }

        let stem = abs_path
            .file_stem()
            .ok_or_else(|| anyhow!("workbook path has no file name"))?;
        let produced = out_dir
            .path()
            .join(format!("{}.pdf", stem.to_string_lossy()));
        fs::copy(&produced, output_path).await.with_context(|| {
            format!(
                "soffice reported success but {} was not produced",
                produced.display()
            )
        })?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.resolved_binary().is_some()
    }

    fn name(&self) -> &'static str {
        "libreoffice"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_unavailable() {
        let converter = SofficeConverter::new(
            "/definitely/not/here/soffice",
            Duration::from_millis(10),
        );
        assert!(!converter.is_available());
    }
}
