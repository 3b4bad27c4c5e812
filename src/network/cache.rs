// Copyright (c) 2025 - Cowboy AI, Inc.
//! Append-only resource id cache
//!
//! One `kind<TAB>name<TAB>id` record per line. The file is only ever opened
//! in append mode; when a name appears twice the later record wins. Cache
//! trouble is never fatal: the bootstrapper falls back to listing the tenant,
//! and it only trusts a cached id the tenant still lists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::api::CloudResource;
use super::naming::{name_parts, ResourceKind, ResourceName};

type CacheKey = (ResourceKind, Vec<String>);

/// Ids of tenant resources seen by earlier runs
#[derive(Debug, Default)]
pub struct ResourceCache {
    path: Option<PathBuf>,
    entries: HashMap<CacheKey, CloudResource>,
}

impl ResourceCache {
    /// Cache that neither reads nor writes a file
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load the cache at `path`; a missing or unreadable file yields an empty cache
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut cache = Self {
            path: Some(path.clone()),
            entries: HashMap::new(),
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => cache.ingest(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Ignoring unreadable resource cache {}: {}", path.display(), e),
        }
        cache
    }

    fn ingest(&mut self, path: &Path, contents: &str) {
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let parsed = match fields.as_slice() {
                [kind, name, id] if !name.is_empty() && !id.is_empty() => {
                    let resource = CloudResource::new(*id, *name);
                    ResourceKind::from_label(kind).map(|kind| (kind, resource))
                }
                _ => None,
            };
            match parsed {
                Some((kind, resource)) => {
                    self.entries.insert((kind, name_parts(&resource.name)), resource);
                }
                None => warn!(
                    "Skipping malformed resource cache line {}:{}",
                    path.display(),
                    number + 1
                ),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached resource for `name`
    pub fn lookup(&self, name: &ResourceName) -> Option<&CloudResource> {
        self.entries.get(&(name.kind(), name.parts()))
    }

    /// Remember `resource`, appending a record unless it is already known
    pub async fn record(&mut self, kind: ResourceKind, resource: &CloudResource) {
        let key = (kind, name_parts(&resource.name));
        if self.entries.get(&key) == Some(resource) {
            return;
        }
        self.entries.insert(key, resource.clone());

        let Some(path) = &self.path else {
            return;
        };
        let line = format!("{}\t{}\t{}\n", kind.label(), resource.name, resource.id);
        if let Err(e) = append_line(path, &line).await {
            warn!("Could not append to resource cache {}: {}", path.display(), e);
        } else {
            debug!("Cached {} {}", kind, resource);
        }
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::naming::Purpose;

    fn subnet(purpose: Purpose) -> ResourceName {
        ResourceName::new("alice", purpose, ResourceKind::Subnet)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResourceCache::load(dir.path().join(".infra-resources")).await;
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".infra-resources");

        let mut cache = ResourceCache::load(&path).await;
        cache
            .record(ResourceKind::Subnet, &CloudResource::new("sub-1", "alice-subnet"))
            .await;
        cache
            .record(ResourceKind::Subnet, &CloudResource::new("sub-1", "alice-subnet"))
            .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "subnet\talice-subnet\tsub-1\n");

        let reloaded = ResourceCache::load(&path).await;
        assert_eq!(
            reloaded.lookup(&subnet(Purpose::Primary)).map(|r| r.id.as_str()),
            Some("sub-1")
        );
        assert!(reloaded.lookup(&subnet(Purpose::Mgmt)).is_none());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped_and_later_records_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".infra-resources");
        std::fs::write(
            &path,
            "subnet\talice-subnet\told\n\
             garbage line\n\
             volume\talice-volume\tv-1\n\
             subnet\talice-subnet\tnew\n",
        )
        .unwrap();

        let cache = ResourceCache::load(&path).await;
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.lookup(&subnet(Purpose::Primary)).map(|r| r.id.as_str()),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_disabled_cache_writes_nothing() {
        let mut cache = ResourceCache::disabled();
        cache
            .record(ResourceKind::Router, &CloudResource::new("r-1", "alice-router"))
            .await;
        let router = ResourceName::new("alice", Purpose::Primary, ResourceKind::Router);
        assert!(cache.lookup(&router).is_some());
    }
}
