use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),
    #[error("unrecognized replacement policy: {0:?} (expected F, L or R)")]
    InvalidPolicy(String),
    #[error("invalid output flag: {0:?} (expected 0 or 1)")]
    InvalidOutputFlag(String),
    #[error("invalid cache geometry: {0}")]
    InvalidGeometry(String),
    #[error("cannot allocate {0} cache lines")]
    ResourceExhaustion(usize),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SimError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        SimError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
