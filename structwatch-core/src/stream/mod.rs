//! Pull-Based Sample Sources
//!
//! ## Overview
//!
//! The detection core never acquires data itself. Whatever produces readings
//! (a strain gauge driver, a CSV replay, a seeded simulator) implements
//! [`SampleSource`] and is polled by the caller's loop.
//!
//! The trait uses `nb::Result` so a source can say "nothing yet" without
//! blocking and without pulling in an async runtime:
//!
//! - `Ok(sample)` - next sample available
//! - `Err(nb::Error::WouldBlock)` - no sample ready, poll again later
//! - `Err(nb::Error::Other(e))` - the source failed or is exhausted
//!
//! How long to wait between polls is the caller's business.

use thiserror::Error;

pub mod memory;

pub use memory::MemorySource;

use crate::sample::Sample;

/// Errors that can occur while pulling samples
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Underlying transport failed
    #[error("Transport error: {0}")]
    Transport(&'static str),
    /// End of stream reached
    #[error("End of stream")]
    EndOfStream,
}

/// Source of samples for streaming classification
///
/// ## Contract
///
/// - `poll_next` must not block indefinitely
/// - Repeated `WouldBlock` returns are normal
/// - `EndOfStream` is sticky: once returned, it is returned forever
pub trait SampleSource {
    /// Attempt to pull the next sample
    fn poll_next(&mut self) -> nb::Result<Sample, SourceError>;

    /// Bounds on the number of remaining samples, like `Iterator::size_hint`
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
