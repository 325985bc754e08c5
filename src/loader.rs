use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Company, Job, Manifest, ManifestEntry};
use crate::source::DataSource;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request for {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned HTTP status {status}")]
    Status { path: String, status: u16 },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid path {path}: {reason}")]
    BadPath { path: String, reason: String },

    #[error("manifest {path} lists no data sources")]
    EmptyManifest { path: String },
}

/// Pulls the record array out of `{items}`, a bare array, or `{fullContent: {items}}`.
///
/// Any other shape yields an empty list.
pub fn extract_items(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("items") {
                return items;
            }
            match map.remove("fullContent") {
                Some(Value::Object(mut inner)) => match inner.remove("items") {
                    Some(Value::Array(items)) => items,
                    _ => {
                        warn!("fullContent has no items array, treating as empty");
                        Vec::new()
                    }
                },
                _ => {
                    warn!("Document has no recognizable record list, treating as empty");
                    Vec::new()
                }
            }
        }
        other => {
            warn!("Unexpected top-level JSON {}, treating as empty", kind_of(&other));
            Vec::new()
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decodes each element independently; an element that does not fit is skipped.
fn decode_records<T: DeserializeOwned>(items: Vec<Value>, path: &str) -> Vec<T> {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping record {} in {}: {}", i, path, e);
                None
            }
        })
        .collect();
    if records.len() < total {
        debug!("Decoded {}/{} records from {}", records.len(), total, path);
    }
    records
}

async fn fetch_json(source: &dyn DataSource, path: &str) -> Result<Value, LoadError> {
    let bytes = source.fetch(path).await?;
    serde_json::from_slice(&bytes).map_err(|e| LoadError::Json {
        path: source.locate(path),
        source: e,
    })
}

/// Load-time acceptance: open seats and applications still accepted.
pub fn is_accepting(job: &Job) -> bool {
    job.quota() > 0 && job.accepting()
}

pub async fn load_manifest(source: &dyn DataSource, path: &str) -> Result<Manifest, LoadError> {
    let doc = fetch_json(source, path).await?;
    let entries: Vec<ManifestEntry> = serde_json::from_value(doc).map_err(|e| LoadError::Json {
        path: source.locate(path),
        source: e,
    })?;
    if entries.is_empty() {
        return Err(LoadError::EmptyManifest { path: source.locate(path) });
    }
    info!("Manifest lists {} data source(s)", entries.len());
    Ok(Manifest { entries })
}

pub async fn load_jobs(source: &dyn DataSource, path: &str) -> Result<Vec<Job>, LoadError> {
    info!("Loading jobs from {}", source.locate(path));
    let doc = fetch_json(source, path).await?;
    let jobs: Vec<Job> = decode_records(extract_items(doc), path);
    let total = jobs.len();
    let accepted: Vec<Job> = jobs.into_iter().filter(is_accepting).collect();
    info!(
        "Loaded {} job(s) from {}, {} closed or full",
        accepted.len(),
        path,
        total - accepted.len()
    );
    Ok(accepted)
}

pub async fn load_companies(
    source: &dyn DataSource,
    path: &str,
    missing_type: &str,
    default_province: &str,
) -> Result<Vec<Company>, LoadError> {
    info!("Loading companies from {}", source.locate(path));
    let doc = fetch_json(source, path).await?;
    let mut companies: Vec<Company> = decode_records(extract_items(doc), path);
    for company in &mut companies {
        company.decorate(missing_type, default_province);
    }
    info!("Loaded {} company record(s) from {}", companies.len(), path);
    Ok(companies)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::filter::{filter_jobs, JobQuery, Selection};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// In-memory source keyed by path.
    pub(crate) struct MemorySource {
        files: HashMap<String, String>,
    }

    impl MemorySource {
        pub(crate) fn new(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl DataSource for MemorySource {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoadError> {
            self.files
                .get(path)
                .map(|s| s.clone().into_bytes())
                .ok_or_else(|| LoadError::Status { path: path.to_string(), status: 404 })
        }

        fn locate(&self, path: &str) -> String {
            format!("mem://{}", path)
        }
    }

    const SCENARIO: &str = r#"{"items": [
        {"title": "Engineer A", "company": {"companyNameTh": "Acme"},
         "compensationAmount": 15000, "quota": 2, "isAcceptingApplication": true,
         "tags": [{"tagName": "Backend"}]},
        {"title": "Engineer B", "company": {"companyNameTh": "Beta"},
         "compensationAmount": 30000, "quota": 0, "isAcceptingApplication": true,
         "tags": []}
    ]}"#;

    #[test]
    fn test_extract_items_shapes() {
        assert_eq!(extract_items(json!({"items": [1, 2]})).len(), 2);
        assert_eq!(extract_items(json!([1, 2, 3])).len(), 3);
        assert_eq!(extract_items(json!({"fullContent": {"items": [1]}})).len(), 1);
    }

    #[test]
    fn test_extract_items_unknown_shapes_are_empty() {
        assert!(extract_items(json!({"data": [1]})).is_empty());
        assert!(extract_items(json!({"fullContent": {"rows": [1]}})).is_empty());
        assert!(extract_items(json!({"items": "nope"})).is_empty());
        assert!(extract_items(json!("text")).is_empty());
        assert!(extract_items(Value::Null).is_empty());
    }

    #[test]
    fn test_acceptance_predicate() {
        let open = Job { quota: Some(1), is_accepting_application: Some(true), ..Default::default() };
        let full = Job { quota: Some(0), is_accepting_application: Some(true), ..Default::default() };
        let closed = Job { quota: Some(3), is_accepting_application: Some(false), ..Default::default() };
        let unknown = Job { quota: Some(3), ..Default::default() };
        assert!(is_accepting(&open));
        assert!(!is_accepting(&full));
        assert!(!is_accepting(&closed));
        assert!(!is_accepting(&unknown));
    }

    #[tokio::test]
    async fn test_load_jobs_applies_acceptance_once() {
        let source = MemorySource::new(&[("data/jobs.json", SCENARIO)]);
        let jobs = load_jobs(&source, "data/jobs.json").await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title(), "Engineer A");

        // The full Engineer B never reaches the view, whatever the filters.
        let search = JobQuery { text: "beta".into(), ..Default::default() };
        assert!(filter_jobs(&jobs, &search).is_empty());
        let by_tag = JobQuery { tag: Selection::parse("Backend"), ..Default::default() };
        let titles: Vec<&str> = filter_jobs(&jobs, &by_tag).iter().map(|j| j.title()).collect();
        assert_eq!(titles, vec!["Engineer A"]);
    }

    #[tokio::test]
    async fn test_load_jobs_keeps_records_with_mistyped_fields() {
        let doc = r#"{"items": [
            {"title": "String pay", "compensationAmount": "15000", "quota": 1,
             "isAcceptingApplication": true},
            {"title": "Numeric tag", "tags": [{"tagName": 7}], "quota": 3,
             "isAcceptingApplication": true}
        ]}"#;
        let source = MemorySource::new(&[("jobs.json", doc)]);
        let jobs = load_jobs(&source, "jobs.json").await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].compensation(), 15000.0);
        assert!(jobs[1].has_tag("7"));
    }

    #[tokio::test]
    async fn test_load_jobs_skips_non_object_records() {
        let doc = r#"[
            {"title": "ok", "quota": 1, "isAcceptingApplication": true},
            5,
            "text",
            {"title": "no seats", "quota": "many", "isAcceptingApplication": true}
        ]"#;
        let source = MemorySource::new(&[("jobs.json", doc)]);
        let jobs = load_jobs(&source, "jobs.json").await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title(), "ok");
    }

    #[tokio::test]
    async fn test_load_jobs_unknown_shape_is_empty_not_error() {
        let source = MemorySource::new(&[("jobs.json", r#"{"unexpected": true}"#)]);
        let jobs = load_jobs(&source, "jobs.json").await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_load_jobs_invalid_json_is_error() {
        let source = MemorySource::new(&[("jobs.json", "{not json")]);
        let err = load_jobs(&source, "jobs.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[tokio::test]
    async fn test_load_jobs_missing_file_is_error() {
        let source = MemorySource::new(&[]);
        let err = load_jobs(&source, "jobs.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_load_companies_decorates() {
        let doc = r#"{"items": [
            {"companyNameTh": "ก", "companyType": {"type": "SME"}},
            {"companyNameTh": "ข", "province": "Phuket"}
        ]}"#;
        let source = MemorySource::new(&[("company/company.json", doc)]);
        let companies = load_companies(&source, "company/company.json", "N/A", "Bangkok")
            .await
            .unwrap();
        assert_eq!(companies[0].kind, "SME");
        assert_eq!(companies[0].province(), "Bangkok");
        assert_eq!(companies[1].kind, "N/A");
        assert_eq!(companies[1].province(), "Phuket");
    }

    #[tokio::test]
    async fn test_load_manifest() {
        let doc = r#"[{"filename": "a.json", "label": "Round 1"},
                      {"filename": "b.json", "label": "Round 2", "isDefault": true}]"#;
        let source = MemorySource::new(&[("config.json", doc)]);
        let manifest = load_manifest(&source, "config.json").await.unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.default_entry().unwrap().label(), "Round 2");
    }

    #[tokio::test]
    async fn test_load_manifest_empty_or_wrong_shape() {
        let source = MemorySource::new(&[("empty.json", "[]"), ("obj.json", "{}")]);
        assert!(matches!(
            load_manifest(&source, "empty.json").await,
            Err(LoadError::EmptyManifest { .. })
        ));
        assert!(matches!(
            load_manifest(&source, "obj.json").await,
            Err(LoadError::Json { .. })
        ));
    }
}
