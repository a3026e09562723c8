//! Crate-wide error type.

use std::io;

use thiserror::Error;

use crate::key::KeyId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input stream could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A signature record appeared before any key record was introduced.
    /// Ingestion cannot attribute the signature and must not continue.
    #[error("malformed dump: signature record on line {line} precedes any key record")]
    SignatureBeforeKey { line: usize },

    /// The dependency accumulation produced a non-finite value. A path count
    /// of zero reached through a recorded shortest-path predecessor means the
    /// graph itself is corrupt, so this is never recoverable.
    #[error(
        "dependency accumulation diverged at {vertex} via {predecessor}: \
         sigma {sigma_pred}/{sigma}, delta {delta}"
    )]
    NumericInvariant {
        vertex: KeyId,
        predecessor: KeyId,
        sigma_pred: f64,
        sigma: f64,
        delta: f64,
    },
}
