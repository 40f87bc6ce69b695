//! Repository store: repositories keyed by app name, persisted as pretty
//! JSON files.

use crate::model::{IntegrityError, QueryResult, Repository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Repository '{app_name}' failed integrity check: {source}")]
    Integrity {
        app_name: String,
        #[source]
        source: IntegrityError,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn check_integrity(repository: &Repository) -> Result<(), StoreError> {
    repository
        .validate()
        .map_err(|source| StoreError::Integrity {
            app_name: repository.app_name.clone(),
            source,
        })
}

/// Reads one repository file and checks referential integrity
pub fn load_repository(path: &Path) -> Result<Repository, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path).map_err(io_error(path))?;
    let repository: Repository = serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    check_integrity(&repository)?;
    debug!(
        path = %path.display(),
        flows = repository.flows.len(),
        "Loaded repository"
    );
    Ok(repository)
}

/// Writes a repository as pretty JSON, creating parent directories
pub fn save_repository(repository: &Repository, path: &Path) -> Result<(), StoreError> {
    write_json(repository, path)?;
    info!(path = %path.display(), app = %repository.app_name, "Saved repository");
    Ok(())
}

pub fn load_query_result(path: &Path) -> Result<QueryResult, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let contents = fs::read_to_string(path).map_err(io_error(path))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_query_result(result: &QueryResult, path: &Path) -> Result<(), StoreError> {
    write_json(result, path)
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    let contents = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, contents).map_err(io_error(path))
}

/// Envelope written around an exported query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExport {
    pub pipeline_type: String,
    pub timestamp: String,
    pub app_name: String,
    pub result: QueryResult,
}

impl QueryExport {
    pub fn new(app_name: impl Into<String>, result: QueryResult, at: DateTime<Utc>) -> Self {
        Self {
            pipeline_type: "query".to_string(),
            timestamp: at.to_rfc3339(),
            app_name: app_name.into(),
            result,
        }
    }
}

/// Writes `<dir>/query_<timestamp>.json` and returns its path
pub fn export_query_result(
    app_name: &str,
    result: &QueryResult,
    dir: &Path,
) -> Result<PathBuf, StoreError> {
    let now = Utc::now();
    let path = dir.join(format!("query_{}.json", now.format("%Y%m%dT%H%M%S%.3fZ")));
    let export = QueryExport::new(app_name, result.clone(), now);

    write_json(&export, &path)?;
    info!(path = %path.display(), "Exported query result");
    Ok(path)
}

/// In-memory repositories keyed by app name.
#[derive(Debug, Default, Clone)]
pub struct RepositoryStore {
    repositories: BTreeMap<String, Repository>,
}

impl RepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the repository for its app name
    pub fn insert(&mut self, repository: Repository) -> Option<Repository> {
        self.repositories
            .insert(repository.app_name.clone(), repository)
    }

    pub fn get(&self, app_name: &str) -> Option<&Repository> {
        self.repositories.get(app_name)
    }

    /// The named repository, or the only one when no name is given
    pub fn resolve(&self, app_name: Option<&str>) -> Result<&Repository, StoreError> {
        match app_name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| StoreError::NotFound(format!("repository for app '{}'", name))),
            None => {
                let mut iter = self.repositories.values();
                match (iter.next(), iter.next()) {
                    (Some(only), None) => Ok(only),
                    (None, _) => Err(StoreError::NotFound("no repositories loaded".to_string())),
                    (Some(_), Some(_)) => Err(StoreError::NotFound(format!(
                        "several apps loaded ({}); pick one by name",
                        self.app_names().join(", ")
                    ))),
                }
            }
        }
    }

    pub fn app_names(&self) -> Vec<String> {
        self.repositories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Loads one file into the store, merging with an existing entry of the
    /// same app name
    pub fn load_file(&mut self, path: &Path) -> Result<&Repository, StoreError> {
        let repository = load_repository(path)?;
        let app_name = repository.app_name.clone();

        match self.repositories.get_mut(&app_name) {
            Some(existing) => {
                existing.merge(repository);
                check_integrity(existing)?;
            }
            None => {
                self.repositories.insert(app_name.clone(), repository);
            }
        }

        self.get(&app_name)
            .ok_or_else(|| StoreError::NotFound(app_name))
    }

    /// Loads every `*.json` file in `dir`, in file-name order. Files sharing
    /// an app name merge into one repository.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::NotFound(dir.display().to_string()));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error(dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no repository JSON files in {}",
                dir.display()
            )));
        }

        for path in &paths {
            self.load_file(path)?;
        }

        info!(
            dir = %dir.display(),
            files = paths.len(),
            apps = self.len(),
            "Loaded repository directory"
        );
        Ok(paths.len())
    }

    /// Loads a file or a directory, whichever `path` is
    pub fn load_path(&mut self, path: &Path) -> Result<(), StoreError> {
        if path.is_dir() {
            self.load_dir(path).map(|_| ())
        } else {
            self.load_file(path).map(|_| ())
        }
    }

    /// Saves the named repository to `path`
    pub fn save(&self, app_name: &str, path: &Path) -> Result<(), StoreError> {
        let repository = self
            .get(app_name)
            .ok_or_else(|| StoreError::NotFound(format!("repository for app '{}'", app_name)))?;
        save_repository(repository, path)
    }
}
