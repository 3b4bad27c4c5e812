// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning document structure
//!
//! Splits an existing Vagrantfile into header, VM blocks and trailer so the
//! emitter can check its invariants before touching the file.

use thiserror::Error;

use super::render::{BLOCK_CLOSE, BLOCK_OPEN, HEADER, OPENSTACK_PROVIDER, TRAILER};
use crate::domain::{Hostname, Location};

/// Why a document is not well-formed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document does not start with the provisioning header")]
    MissingHeader,

    #[error("document does not end with the closing trailer")]
    MissingTrailer,

    #[error("document has {0} closing trailers")]
    ExtraTrailer(usize),

    #[error("block for {0} is never closed")]
    UnterminatedBlock(String),

    #[error("block opener on line {0} has no valid hostname")]
    InvalidBlockName(usize),

    #[error("host {0} is defined more than once")]
    DuplicateHost(String),
}

/// One `config.vm.define` block as found in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedBlock {
    pub hostname: Hostname,
    /// Block text from the opener through the closing `end`
    pub text: String,
}

impl DefinedBlock {
    /// Location the block boots at: remote when it configures the OpenStack provider
    pub fn location(&self) -> Location {
        if self.text.lines().any(|line| line == OPENSTACK_PROVIDER) {
            Location::Remote
        } else {
            Location::Local
        }
    }
}

/// A parsed, well-formed provisioning document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningDocument {
    blocks: Vec<DefinedBlock>,
    /// Everything before the trailer, ready for appending
    body: String,
}

impl ProvisioningDocument {
    /// Parse `text`, checking header, trailer and block shape
    ///
    /// # Errors
    /// A [`DocumentError`] for the first structural problem found.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let rest = text.strip_prefix(HEADER).ok_or(DocumentError::MissingHeader)?;
        let trailer_line = TRAILER.trim_end();

        let trailers = rest.lines().filter(|line| *line == trailer_line).count();
        match trailers {
            0 => return Err(DocumentError::MissingTrailer),
            1 => {}
            n => return Err(DocumentError::ExtraTrailer(n)),
        }
        let trimmed = text.trim_end();
        let body = trimmed
            .strip_suffix(trailer_line)
            .filter(|body| body.ends_with('\n'))
            .ok_or(DocumentError::MissingTrailer)?;

        let mut blocks: Vec<DefinedBlock> = Vec::new();
        let mut open: Option<(Hostname, String)> = None;
        let header_lines = HEADER.lines().count();

        for (index, line) in rest.lines().enumerate() {
            match open.take() {
                Some((hostname, mut text)) => {
                    text.push_str(line);
                    text.push('\n');
                    if line == BLOCK_CLOSE {
                        if blocks.iter().any(|b| b.hostname == hostname) {
                            return Err(DocumentError::DuplicateHost(hostname.to_string()));
                        }
                        blocks.push(DefinedBlock { hostname, text });
                    } else if line == trailer_line {
                        return Err(DocumentError::UnterminatedBlock(hostname.to_string()));
                    } else {
                        open = Some((hostname, text));
                    }
                }
                None => {
                    if let Some(tail) = line.strip_prefix(BLOCK_OPEN) {
                        let hostname = tail
                            .split('"')
                            .next()
                            .and_then(|name| Hostname::new(name).ok())
                            .ok_or(DocumentError::InvalidBlockName(header_lines + index + 1))?;
                        open = Some((hostname, format!("{}\n", line)));
                    }
                }
            }
        }
        if let Some((hostname, _)) = open {
            return Err(DocumentError::UnterminatedBlock(hostname.to_string()));
        }

        Ok(Self {
            blocks,
            body: body.to_string(),
        })
    }

    pub fn blocks(&self) -> &[DefinedBlock] {
        &self.blocks
    }

    /// Hostnames in block order
    pub fn hostnames(&self) -> Vec<Hostname> {
        self.blocks.iter().map(|b| b.hostname.clone()).collect()
    }

    pub fn defines(&self, hostname: &Hostname) -> bool {
        self.block(hostname).is_some()
    }

    pub fn block(&self, hostname: &Hostname) -> Option<&DefinedBlock> {
        self.blocks.iter().find(|b| &b.hostname == hostname)
    }

    /// Document text with `rendered` appended before the trailer
    pub fn with_block(&self, rendered: &str) -> String {
        format!("{}{}{}", self.body, rendered, TRAILER)
    }
}
