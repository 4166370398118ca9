use super::{SampleSource, SourceError};
use crate::sample::Sample;

/// Memory-backed source for tests and historical replay
///
/// ```rust
/// use structwatch_core::stream::{MemorySource, SampleSource};
/// use structwatch_core::Sample;
///
/// let samples = vec![
///     Sample::new(0).with("strain", 1.01),
///     Sample::new(500).with("strain", 0.97),
/// ];
///
/// let mut source = MemorySource::new(&samples);
/// while let Ok(sample) = source.poll_next() {
///     // classify sample
///     let _ = sample;
/// }
/// ```
pub struct MemorySource<'a> {
    samples: &'a [Sample],
    position: usize,
}

impl<'a> MemorySource<'a> {
    /// Create a source replaying `samples` in order
    pub fn new(samples: &'a [Sample]) -> Self {
        Self {
            samples,
            position: 0,
        }
    }

    /// Rewind to the first sample
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Index of the next sample to be returned
    pub fn position(&self) -> usize {
        self.position
    }

    /// True once every sample has been returned
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl<'a> SampleSource for MemorySource<'a> {
    fn poll_next(&mut self) -> nb::Result<Sample, SourceError> {
        let sample = self
            .samples
            .get(self.position)
            .ok_or(nb::Error::Other(SourceError::EndOfStream))?;
        self.position += 1;
        Ok(sample.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}
