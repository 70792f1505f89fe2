use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::moderation::{DenylistError, DenylistSource};

/// Plain-text denylist file, one pattern per line.
pub struct FileDenylistSource {
    path: PathBuf,
}

impl FileDenylistSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DenylistSource for FileDenylistSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn read(&self) -> Result<String, DenylistError> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|e| DenylistError::ReadError {
                location: self.location(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_file_contents() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "spam\nscam\n").unwrap();

        let source = FileDenylistSource::new(tmp.path());
        assert_eq!(source.read().await.unwrap(), "spam\nscam\n");
        assert_eq!(source.location(), tmp.path().display().to_string());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let source = FileDenylistSource::new(&path);
        assert!(matches!(
            source.read().await,
            Err(DenylistError::ReadError { .. })
        ));
    }
}
