use crate::error::{Error, Result};

/// Users per external message lookup.
pub const DEFAULT_BATCH_SIZE: usize = 2;

/// Concurrent spam checks allowed in flight.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 5;

/// Slots per stream between two stages.
pub const DEFAULT_BUFFER: usize = 128;

/// Tunables for one classification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    batch_size: usize,
    max_in_flight: usize,
    buffer: usize,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            buffer: DEFAULT_BUFFER,
        }
    }

    /// Batch size `B` used by the message lookup stage.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Concurrency cap `C` used by the spam check stage.
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn batch_size_value(&self) -> usize {
        self.batch_size
    }

    pub fn max_in_flight_value(&self) -> usize {
        self.max_in_flight
    }

    pub fn buffer_value(&self) -> usize {
        self.buffer
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size", "must be at least 1"));
        }
        if self.max_in_flight == 0 {
            return Err(Error::config("max_in_flight", "must be at least 1"));
        }
        if self.buffer == 0 {
            return Err(Error::config("buffer", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
