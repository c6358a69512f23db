//! Library side of the `dq` binary: configuration, logging and the run pipeline.

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
