use std::io;
use std::path::{Path, PathBuf};

use devbox_init_config::substitutor::TemplateFs;
use tokio::fs;

#[derive(Clone, Default)]
pub struct TokioFs;

/// `.<name>.devbox-init.<pid>.tmp` next to the target, so the final rename
/// stays on one file system.
fn sibling_temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {path:?}"),
        )
    })?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".devbox-init.{}.tmp", std::process::id()));

    Ok(path.with_file_name(tmp_name))
}

impl TemplateFs for TokioFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path).await
    }

    /// Write a sibling file and rename it over the target. The target is
    /// never observed truncated, and it keeps its permissions.
    async fn write(&self, path: &Path, contents: String) -> io::Result<()> {
        let tmp = sibling_temp_path(path)?;

        let result = async {
            fs::write(&tmp, contents).await?;
            if let Ok(meta) = fs::metadata(path).await {
                fs::set_permissions(&tmp, meta.permissions()).await?;
            }
            fs::rename(&tmp, path).await
        }
        .await;

        if result.is_err() {
            if let Err(err) = fs::remove_file(&tmp).await {
                tracing::debug!("Could not remove {:?}: {}", tmp, err);
            }
        }

        result
    }
}
