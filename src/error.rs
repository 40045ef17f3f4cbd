//! Run-level error taxonomy.
//!
//! Leaf operations return `anyhow::Result`; each pipeline stage wraps its
//! failure into one of these variants so the binary can log it and exit.

use crate::config::ConfigErrors;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Authenticate,
    Fetch,
    Connect,
    Load,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Authenticate => "authenticate",
            Self::Fetch => "fetch",
            Self::Connect => "connect",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

/// Every variant is terminal for the run.
#[derive(Debug)]
pub enum ExportError {
    Configuration(ConfigErrors),
    Authentication(anyhow::Error),
    Fetch(anyhow::Error),
    Connection(anyhow::Error),
    Write {
        index: String,
        /// 1-based position of the row whose document failed.
        position: usize,
        /// Documents already persisted before the failure. They are not rolled back.
        written: usize,
        source: anyhow::Error,
    },
}

impl ExportError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration(_) => Stage::Validate,
            Self::Authentication(_) => Stage::Authenticate,
            Self::Fetch(_) => Stage::Fetch,
            Self::Connection(_) => Stage::Connect,
            Self::Write { .. } => Stage::Load,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(errs) => write!(f, "invalid configuration: {}", errs),
            Self::Authentication(e) => {
                write!(f, "failed to authenticate to Google Analytics: {:#}", e)
            }
            Self::Fetch(e) => write!(f, "failed to fetch GA report: {:#}", e),
            Self::Connection(e) => write!(f, "failed to connect to Elasticsearch: {:#}", e),
            Self::Write {
                index,
                position,
                written,
                source,
            } => write!(
                f,
                "failed to send row {} to Elasticsearch index {} ({} documents already written): {:#}",
                position, index, written, source
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(errs) => Some(errs),
            Self::Authentication(e) | Self::Fetch(e) | Self::Connection(e) => Some(e.as_ref()),
            Self::Write { source, .. } => Some(source.as_ref()),
        }
    }
}
