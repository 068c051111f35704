//! File-backed catalog and feature store.
//!
//! The catalog snapshot and the per-modality feature tables live in plain
//! JSON files:
//!
//! - `catalog.json`: `{ "spots": [{id, name, location, ...}], "query_images": [id] }`
//! - `<features_dir>/text.json`, `<features_dir>/image.json`: `{ id: [f32, ...] }`
//!
//! Files are re-read on every call; this provider owns no cache, matching
//! the request-scoped lifecycle of everything downstream. Unknown fields on
//! spot entries ride along untouched.

use crate::error::{SearchError, SearchResult};
use crate::model::{FeatureTable, Modality, SpotEntry};
use crate::providers::SpotCatalog;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    spots: Vec<SpotEntry>,
    #[serde(default)]
    query_images: Vec<String>,
}

/// Catalog provider reading JSON files from disk.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    catalog_path: PathBuf,
    features_dir: PathBuf,
}

impl FsCatalog {
    pub fn new(catalog_path: impl Into<PathBuf>, features_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            features_dir: features_dir.into(),
        }
    }

    /// Path of the feature file backing one modality.
    pub fn feature_path(&self, modality: Modality) -> PathBuf {
        self.features_dir.join(format!("{}.json", modality.as_str()))
    }

    async fn load_catalog(&self) -> SearchResult<CatalogFile> {
        let bytes = read_file(&self.catalog_path).await?;
        let catalog: CatalogFile = parse_json(&self.catalog_path, &bytes)?;
        debug!(
            path = %self.catalog_path.display(),
            spots = catalog.spots.len(),
            query_images = catalog.query_images.len(),
            "catalog_loaded"
        );
        Ok(catalog)
    }
}

#[async_trait]
impl SpotCatalog for FsCatalog {
    async fn spots(&self) -> SearchResult<Vec<SpotEntry>> {
        Ok(self.load_catalog().await?.spots)
    }

    async fn feature_table(&self, modality: Modality) -> SearchResult<FeatureTable> {
        let path = self.feature_path(modality);
        let bytes = read_file(&path).await?;
        let vectors: HashMap<String, Vec<f32>> = parse_json(&path, &bytes)?;
        let table = FeatureTable::from_vectors(modality, vectors)?;
        debug!(
            path = %path.display(),
            modality = %modality,
            vectors = table.len(),
            dimension = table.dimension(),
            "feature_table_loaded"
        );
        Ok(table)
    }

    async fn query_image_ids(&self) -> SearchResult<Vec<String>> {
        Ok(self.load_catalog().await?.query_images)
    }
}

async fn read_file(path: &Path) -> SearchResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SearchError::CatalogUnavailable {
            detail: format!("reading {}", path.display()),
            source: Some(Box::new(e)),
        })
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> SearchResult<T> {
    serde_json::from_slice(bytes).map_err(|e| SearchError::CatalogUnavailable {
        detail: format!("parsing {}", path.display()),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, catalog: &str, text_features: Option<&str>) -> FsCatalog {
        let catalog_path = dir.path().join("catalog.json");
        fs::write(&catalog_path, catalog).unwrap();
        let features_dir = dir.path().join("features");
        fs::create_dir_all(&features_dir).unwrap();
        if let Some(features) = text_features {
            fs::write(features_dir.join("text.json"), features).unwrap();
        }
        FsCatalog::new(catalog_path, features_dir)
    }

    #[tokio::test]
    async fn test_loads_spots_and_query_images() {
        let dir = TempDir::new().unwrap();
        let catalog = write_fixture(
            &dir,
            r#"{
                "spots": [
                    {"id": "s1", "name": "Kinkakuji", "location": "Kyoto", "photo_url": "x"},
                    {"id": "s2", "name": "Osaka Castle", "location": "Osaka"}
                ],
                "query_images": ["img_001", "img_002"]
            }"#,
            None,
        );

        let spots = catalog.spots().await.unwrap();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].id, "s1");
        assert_eq!(spots[0].extra.get("photo_url").unwrap(), "x");

        let images = catalog.query_image_ids().await.unwrap();
        assert_eq!(images, vec!["img_001", "img_002"]);
    }

    #[tokio::test]
    async fn test_loads_feature_table_with_dimension_check() {
        let dir = TempDir::new().unwrap();
        let catalog = write_fixture(
            &dir,
            r#"{"spots": [], "query_images": []}"#,
            Some(r#"{"s1": [1.0, 0.0], "s2": [0.0, 1.0]}"#),
        );

        let table = catalog.feature_table(Modality::Text).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.dimension(), 2);
        assert_eq!(table.get("s1"), Some([1.0, 0.0].as_slice()));
    }

    #[tokio::test]
    async fn test_ragged_feature_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let catalog = write_fixture(
            &dir,
            r#"{"spots": []}"#,
            Some(r#"{"s1": [1.0, 0.0], "s2": [1.0]}"#),
        );

        let err = catalog.feature_table(Modality::Text).await.unwrap_err();
        assert!(matches!(err, SearchError::FeatureDataInvalid { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_catalog_unavailable() {
        let dir = TempDir::new().unwrap();
        let catalog = FsCatalog::new(dir.path().join("nope.json"), dir.path().join("features"));

        let err = catalog.spots().await.unwrap_err();
        assert!(matches!(err, SearchError::CatalogUnavailable { .. }));
        assert!(err.is_dependency_failure());

        let err = catalog.feature_table(Modality::Image).await.unwrap_err();
        assert!(matches!(err, SearchError::CatalogUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_catalog_unavailable() {
        let dir = TempDir::new().unwrap();
        let catalog = write_fixture(&dir, "{not json", None);

        let err = catalog.spots().await.unwrap_err();
        assert!(matches!(err, SearchError::CatalogUnavailable { .. }));
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn test_feature_path_uses_modality_name() {
        let catalog = FsCatalog::new("/data/catalog.json", "/data/features");
        assert!(
            catalog
                .feature_path(Modality::Image)
                .ends_with("image.json")
        );
    }
}
