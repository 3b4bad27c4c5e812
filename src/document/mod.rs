// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning document (Vagrantfile)
//!
//! ```text
//! HostDescriptor + ProviderInfo → VmBlock → validate → render_block → append
//! ```
//!
//! The document is one header, any number of `config.vm.define` blocks and a
//! single closing `end`. Blocks are never edited after they are appended;
//! only [`ConfigEmitter::init_document`] with `force` replaces the file.

pub mod emitter;
pub mod model;
pub mod parse;
pub mod render;

pub use emitter::ConfigEmitter;
pub use model::{
    BlockBody, BlockDefaults, LocalBlock, NetworkRef, ProviderInfo, RemoteBlock, VmBlock,
};
pub use parse::{DefinedBlock, DocumentError, ProvisioningDocument};
pub use render::{empty_document, render_block, HEADER, TRAILER};
