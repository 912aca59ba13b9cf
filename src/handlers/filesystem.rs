use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::home_dir;
use crate::error::{AppError, AppResult};
use crate::services::scanner::SERVICES_DIR;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub has_services: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDirectoryResponse {
    pub base_path: String,
    pub subdirs: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPathResponse {
    pub exists: bool,
    pub is_directory: bool,
    pub resolved_path: String,
}

// ============ Handlers ============

/// List the visible subdirectories of a path (the home directory by default),
/// flagging the ones that look like a repository root
pub async fn scan_directory(payload: PathRequest) -> AppResult<ScanDirectoryResponse> {
    let raw = if payload.path.is_empty() {
        "~"
    } else {
        payload.path.as_str()
    };
    let base = resolve_user_path(raw)?;

    let metadata = tokio::fs::metadata(&base)
        .await
        .map_err(|_| AppError::NotFound(format!("Path {}", base.display())))?;
    if !metadata.is_dir() {
        return Err(AppError::Validation("path is not a directory".to_string()));
    }

    let mut subdirs = Vec::new();
    let mut entries = tokio::fs::read_dir(&base).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.file_type().await?.is_dir() {
            continue;
        }

        let path = entry.path();
        let has_services = tokio::fs::metadata(path.join(SERVICES_DIR))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        subdirs.push(DirectoryEntry {
            name,
            path: path.to_string_lossy().into_owned(),
            has_services,
        });
    }
    subdirs.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ScanDirectoryResponse {
        base_path: base.to_string_lossy().into_owned(),
        subdirs,
    })
}

/// Report whether a user-supplied path exists and is a directory
pub async fn check_path(payload: PathRequest) -> AppResult<CheckPathResponse> {
    let resolved = resolve_user_path(&payload.path)?;
    let metadata = tokio::fs::metadata(&resolved).await.ok();

    Ok(CheckPathResponse {
        exists: metadata.is_some(),
        is_directory: metadata.map(|m| m.is_dir()).unwrap_or(false),
        resolved_path: resolved.to_string_lossy().into_owned(),
    })
}

// ============ Path helpers ============

/// Expand `~`, make absolute and drop `.` segments.
///
/// Any `..` is rejected before the filesystem is touched.
pub fn resolve_user_path(raw: &str) -> AppResult<PathBuf> {
    if raw.contains("..") {
        return Err(AppError::Validation(
            "invalid path: path traversal not allowed".to_string(),
        ));
    }

    let expanded = if raw == "~" || raw.starts_with("~/") || raw.starts_with("~\\") {
        let home = home_dir()
            .ok_or_else(|| AppError::Internal("failed to get home directory".to_string()))?;
        home.join(raw[1..].trim_start_matches(['/', '\\']))
    } else {
        PathBuf::from(raw)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };

    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traversal_is_rejected() {
        let err = resolve_user_path("/tmp/../etc").unwrap_err();
        assert_eq!(err.to_string(), "invalid path: path traversal not allowed");
        assert!(resolve_user_path("~/..").is_err());
    }

    #[test]
    fn test_absolute_path_is_cleaned() {
        let resolved = resolve_user_path("/tmp/./repos/").unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/repos"));
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let resolved = resolve_user_path("repos").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("repos"));
    }

    #[tokio::test]
    async fn test_scan_directory_flags_repositories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("backend").join(SERVICES_DIR)).unwrap();
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        let response = scan_directory(PathRequest {
            path: dir.path().to_string_lossy().into_owned(),
        })
        .await
        .unwrap();

        let names: Vec<_> = response.subdirs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["backend", "notes"]);
        assert!(response.subdirs[0].has_services);
        assert!(!response.subdirs[1].has_services);
    }

    #[tokio::test]
    async fn test_check_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        let response = check_path(PathRequest {
            path: file.to_string_lossy().into_owned(),
        })
        .await
        .unwrap();
        assert!(response.exists);
        assert!(!response.is_directory);

        let response = check_path(PathRequest {
            path: dir.path().join("missing").to_string_lossy().into_owned(),
        })
        .await
        .unwrap();
        assert!(!response.exists);
    }
}
