// Copyright (c) 2025 - Cowboy AI, Inc.
//! Config Emitter
//!
//! Owns every write to the provisioning document. Writes are whole-file
//! read-modify-write with no locking; two processes emitting into the same
//! document at once can lose a block.

use std::path::Path;
use tracing::{debug, info};

use super::model::{BlockDefaults, ProviderInfo, VmBlock};
use super::parse::{DefinedBlock, ProvisioningDocument};
use super::render::{empty_document, render_block};
use crate::context::Settings;
use crate::domain::{HostDescriptor, Hostname};
use crate::errors::{ProvisionError, ProvisionResult};

/// Writes the header once and appends validated VM blocks
#[derive(Debug, Clone)]
pub struct ConfigEmitter {
    defaults: BlockDefaults,
}

impl ConfigEmitter {
    pub fn new(defaults: BlockDefaults) -> Self {
        Self { defaults }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(BlockDefaults::from_settings(settings))
    }

    /// Write an empty document at `path`
    ///
    /// An existing document is left alone unless `force` is set, in which
    /// case it is replaced and every block in it is lost. Returns whether
    /// the file was written.
    pub async fn init_document(&self, path: &Path, force: bool) -> ProvisionResult<bool> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        if exists && !force {
            debug!("Provisioning document {} already present", path.display());
            return Ok(false);
        }

        tokio::fs::write(path, empty_document())
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        info!("Initialized provisioning document {}", path.display());
        Ok(true)
    }

    async fn read(&self, path: &Path) -> ProvisionResult<ProvisioningDocument> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        ProvisioningDocument::parse(&text).map_err(|e| ProvisionError::config_write(path, e))
    }

    /// Hostnames with a block in the document; none when it does not exist
    pub async fn defined_hosts(&self, path: &Path) -> ProvisionResult<Vec<Hostname>> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        if !exists {
            return Ok(Vec::new());
        }
        Ok(self.read(path).await?.hostnames())
    }

    /// Existing block for `hostname`; none when the document does not exist
    pub async fn defined_block(
        &self,
        path: &Path,
        hostname: &Hostname,
    ) -> ProvisionResult<Option<DefinedBlock>> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        if !exists {
            return Ok(None);
        }
        Ok(self.read(path).await?.block(hostname).cloned())
    }

    /// Append one block for `descriptor` before the trailer
    ///
    /// # Errors
    /// - `DuplicateBlock` when the hostname already has a block; the file is
    ///   not modified
    /// - `InvalidBlock` when the assembled block fails validation
    /// - `ConfigWrite` when the document is missing, malformed or unwritable
    pub async fn append_vm_block(
        &self,
        path: &Path,
        descriptor: &HostDescriptor,
        provider: ProviderInfo<'_>,
    ) -> ProvisionResult<VmBlock> {
        let document = self.read(path).await?;
        if document.defines(&descriptor.hostname) {
            return Err(ProvisionError::DuplicateBlock(descriptor.hostname.to_string()));
        }

        let block = VmBlock::build(descriptor, provider, &self.defaults);
        block.validate()?;

        let text = document.with_block(&render_block(&block));
        // never write something we could not read back
        ProvisioningDocument::parse(&text).map_err(|e| ProvisionError::config_write(path, e))?;

        tokio::fs::write(path, text)
            .await
            .map_err(|e| ProvisionError::config_write(path, e))?;
        info!(
            "Appended {} block for {} to {}",
            block.location(),
            block.hostname,
            path.display()
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeployArgs, MacAddress};

    fn host(name: &str) -> HostDescriptor {
        HostDescriptor {
            hostname: Hostname::new(name).unwrap(),
            role: "infra".to_string(),
            domain: "example.com".to_string(),
            ip: "10.0.20.11".parse().unwrap(),
            mac: MacAddress::new("52:54:00:1a:2b:3c").unwrap(),
            memory: 2048,
            box_name: Some("centos/7".to_string()),
            deploy_args: DeployArgs::default(),
            groups: vec![],
            profile: None,
            security_groups: vec![],
        }
    }

    fn emitter() -> ConfigEmitter {
        ConfigEmitter::from_settings(&Settings::default())
    }

    #[tokio::test]
    async fn test_init_is_idempotent_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vagrantfile");
        let emitter = emitter();

        assert!(emitter.init_document(&path, false).await.unwrap());
        emitter
            .append_vm_block(&path, &host("infra-001"), ProviderInfo::Local)
            .await
            .unwrap();

        assert!(!emitter.init_document(&path, false).await.unwrap());
        assert_eq!(emitter.defined_hosts(&path).await.unwrap().len(), 1);

        assert!(emitter.init_document(&path, true).await.unwrap());
        assert!(emitter.defined_hosts(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_append_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vagrantfile");
        let emitter = emitter();
        emitter.init_document(&path, false).await.unwrap();
        emitter
            .append_vm_block(&path, &host("infra-001"), ProviderInfo::Local)
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = emitter
            .append_vm_block(&path, &host("infra-001"), ProviderInfo::Local)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::DuplicateBlock(ref name) if name == "infra-001"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_append_without_document_is_config_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vagrantfile");

        let err = emitter()
            .append_vm_block(&path, &host("infra-001"), ProviderInfo::Local)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigWrite { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_block_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vagrantfile");
        let emitter = emitter();
        emitter.init_document(&path, false).await.unwrap();

        let mut boxless = host("infra-001");
        boxless.box_name = None;
        let err = emitter
            .append_vm_block(&path, &boxless, ProviderInfo::Local)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::InvalidBlock { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), empty_document());
    }

    #[tokio::test]
    async fn test_missing_document_defines_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = emitter()
            .defined_hosts(&dir.path().join("Vagrantfile"))
            .await
            .unwrap();
        assert!(hosts.is_empty());
    }
}
