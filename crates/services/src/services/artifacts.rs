//! File-system artifact store. Artifacts land under
//! `<root>/<session>/<category>/<file>`; the store is write-only from the
//! pipelines' point of view.

use std::path::PathBuf;

use tokio::fs;
use tracing::debug;
use utils::text::sanitize_path_segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCategory {
    Entities,
    Pages,
    Integrations,
}

impl ArtifactCategory {
    pub fn dir(&self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Pages => "pages",
            Self::Integrations => "integrations",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write one artifact, creating the session/category directories as
    /// needed. Returns the path relative to the session directory
    /// ("entities/Customer.json"), which is what build results record.
    pub async fn write(
        &self,
        session_id: &str,
        category: ArtifactCategory,
        file_name: &str,
        contents: &str,
    ) -> Result<String, std::io::Error> {
        let dir = self
            .root
            .join(sanitize_path_segment(session_id))
            .join(category.dir());
        fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        fs::write(&path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");

        Ok(format!("{}/{}", category.dir(), file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_into_session_scoped_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().to_path_buf());

        let rel = store
            .write("s1", ArtifactCategory::Entities, "Customer.json", "{}")
            .await
            .unwrap();
        assert_eq!(rel, "entities/Customer.json");

        let on_disk = tmp.path().join("s1").join("entities").join("Customer.json");
        assert_eq!(std::fs::read_to_string(on_disk).unwrap(), "{}");
    }

    #[tokio::test]
    async fn session_ids_cannot_escape_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().to_path_buf());

        store
            .write("../escapeprobe", ArtifactCategory::Pages, "Page.jsx", "x")
            .await
            .unwrap();

        assert!(tmp.path().join("escapeprobe/pages/Page.jsx").exists());
        assert!(!tmp.path().parent().unwrap().join("escapeprobe").exists());
    }

    #[tokio::test]
    async fn repeated_writes_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().to_path_buf());

        store
            .write("s1", ArtifactCategory::Integrations, "Stripe.ts", "v1")
            .await
            .unwrap();
        store
            .write("s1", ArtifactCategory::Integrations, "Stripe.ts", "v2")
            .await
            .unwrap();

        let on_disk = tmp.path().join("s1/integrations/Stripe.ts");
        assert_eq!(std::fs::read_to_string(on_disk).unwrap(), "v2");
    }
}
