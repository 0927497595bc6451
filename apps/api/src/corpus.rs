//! Job corpus collaborator — a read-only accessor over the current postings.
//!
//! The corpus itself (storage, refresh cadence) is externally owned; this
//! module defines only the accessor trait plus the two implementations the
//! service actually runs with: a JSON-file snapshot loaded at startup and an
//! in-memory corpus used by tests.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A job posting as supplied by the job board. Read-only to this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub category: String,
}

/// Read-only accessor over the current job corpus.
///
/// Carried in the worker context as `Arc<dyn JobCorpus>`.
#[async_trait]
pub trait JobCorpus: Send + Sync {
    async fn postings(&self) -> Result<Vec<JobPosting>>;
}

/// Corpus snapshot loaded once from a JSON file at startup.
pub struct JsonFileCorpus {
    postings: Vec<JobPosting>,
}

impl JsonFileCorpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read jobs file {}", path.display()))?;
        let postings: Vec<JobPosting> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse jobs file {}", path.display()))?;
        tracing::info!("Loaded {} job postings from {}", postings.len(), path.display());
        Ok(Self { postings })
    }

}

#[async_trait]
impl JobCorpus for JsonFileCorpus {
    async fn postings(&self) -> Result<Vec<JobPosting>> {
        Ok(self.postings.clone())
    }
}

/// Fixed in-memory corpus backing tests.
#[cfg(test)]
pub struct InMemoryCorpus {
    postings: Vec<JobPosting>,
}

#[cfg(test)]
impl InMemoryCorpus {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self { postings }
    }
}

#[cfg(test)]
#[async_trait]
impl JobCorpus for InMemoryCorpus {
    async fn postings(&self) -> Result<Vec<JobPosting>> {
        Ok(self.postings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_json_file_corpus_loads_postings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "j1", "title": "Backend Engineer", "description": "Rust services",
                 "required_skills": ["rust"], "category": "engineering"}}]"#
        )
        .unwrap();

        let corpus = JsonFileCorpus::load(file.path()).unwrap();
        let postings = corpus.postings().await.unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].id, "j1");
        assert_eq!(postings[0].required_skills, vec!["rust"]);
    }

    #[tokio::test]
    async fn test_missing_optional_fields_default() {
        let posting: JobPosting =
            serde_json::from_str(r#"{"id": "j2", "title": "Analyst", "description": "Data"}"#)
                .unwrap();
        assert!(posting.required_skills.is_empty());
        assert!(posting.category.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(JsonFileCorpus::load(file.path()).is_err());
    }
}
