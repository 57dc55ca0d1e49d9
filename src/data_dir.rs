use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The FAQMATCH_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/faqmatch/)
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("FAQMATCH_DATA_DIR") {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("faqmatch")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config("could not determine XDG data home directory".into())
                })?
        };

        std::fs::create_dir_all(&root).map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analytics_db(&self) -> PathBuf {
        self.root.join("analytics.redb")
    }
}

/// Resolve the knowledge base directory from --faq-dir or FAQMATCH_FAQ_DIR.
/// There is no default: serving without a knowledge base is meaningless.
pub fn resolve_faq_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = if let Some(path) = explicit {
        path.to_path_buf()
    } else if let Ok(val) = std::env::var("FAQMATCH_FAQ_DIR") {
        PathBuf::from(val)
    } else {
        return Err(Error::Config(
            "no knowledge base directory; pass --faq-dir or set FAQMATCH_FAQ_DIR".into(),
        ));
    };

    if !dir.is_dir() {
        return Err(Error::KnowledgeBaseDir(dir));
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.analytics_db(), tmp.path().join("analytics.redb"));
    }

    #[test]
    fn resolve_creates_missing_root() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let dir = DataDir::resolve(Some(&nested)).unwrap();

        assert!(dir.root().exists());
    }

    #[test]
    fn explicit_faq_dir_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nowhere");

        assert!(matches!(
            resolve_faq_dir(Some(&missing)),
            Err(Error::KnowledgeBaseDir(_))
        ));
        assert_eq!(resolve_faq_dir(Some(tmp.path())).unwrap(), tmp.path());
    }
}
