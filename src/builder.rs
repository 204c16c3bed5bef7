use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::generator::{
    IdGenerator, Internals, Layout, SharedGenerator, DEFAULT_BIT_LEN_DATA_CENTER_ID,
    DEFAULT_BIT_LEN_SEQUENCE, DEFAULT_BIT_LEN_WORKER_ID, DEFAULT_EPOCH_MS, LAST_TIMESTAMP_UNSET,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// A builder for building the [`IdGenerator`].
///
/// [`IdGenerator`]: struct.IdGenerator.html
pub struct Builder {
    epoch_ms: Option<i64>,
    data_center_id: u32,
    worker_id: u32,
    bit_len_data_center_id: u8,
    bit_len_worker_id: u8,
    bit_len_sequence: u8,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    /// Construct a new builder for the build of [`IdGenerator`].
    ///
    /// [`IdGenerator`]: struct.IdGenerator.html
    pub fn new() -> Self {
        Self {
            epoch_ms: None,
            data_center_id: 0,
            worker_id: 0,
            bit_len_data_center_id: DEFAULT_BIT_LEN_DATA_CENTER_ID,
            bit_len_worker_id: DEFAULT_BIT_LEN_WORKER_ID,
            bit_len_sequence: DEFAULT_BIT_LEN_SEQUENCE,
            clock: None,
        }
    }

    /// Set the epoch. If the epoch is set later than the current time,
    /// `finalize` will fail.
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch_ms = Some(epoch.timestamp_millis());
        self
    }

    /// Set the epoch in milliseconds since the Unix epoch.
    pub fn epoch_millis(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = Some(epoch_ms);
        self
    }

    /// Set the data center id. If the id exceeds the maximum for its
    /// configured bit length, `finalize` will fail.
    pub fn data_center_id(mut self, data_center_id: u32) -> Self {
        self.data_center_id = data_center_id;
        self
    }

    /// Set the worker id. If the id exceeds the maximum for its configured
    /// bit length, `finalize` will fail.
    pub fn worker_id(mut self, worker_id: u32) -> Self {
        self.worker_id = worker_id;
        self
    }

    /// Set the bit length of the data center id section.
    pub fn bit_len_data_center_id(mut self, bit_len_data_center_id: u8) -> Self {
        self.bit_len_data_center_id = bit_len_data_center_id;
        self
    }

    /// Set the bit length of the worker id section.
    pub fn bit_len_worker_id(mut self, bit_len_worker_id: u8) -> Self {
        self.bit_len_worker_id = bit_len_worker_id;
        self
    }

    /// Set the bit length of the sequence section.
    pub fn bit_len_sequence(mut self, bit_len_sequence: u8) -> Self {
        self.bit_len_sequence = bit_len_sequence;
        self
    }

    /// Set the clock the generator reads time from. Defaults to
    /// [`SystemClock`]. Intended for tests and simulations.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Finish building and create an IdGenerator instance.
    /// This method will return an error if validation fails.
    pub fn finalize(self) -> Result<IdGenerator, Error> {
        let layout = Layout::new(
            self.bit_len_data_center_id,
            self.bit_len_worker_id,
            self.bit_len_sequence,
        )?;

        if self.data_center_id > layout.max_data_center_id() {
            return Err(Error::DataCenterIdOutOfRange {
                value: self.data_center_id,
                max: layout.max_data_center_id(),
            });
        }
        if self.worker_id > layout.max_worker_id() {
            return Err(Error::WorkerIdOutOfRange {
                value: self.worker_id,
                max: layout.max_worker_id(),
            });
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let epoch_ms = self.epoch_ms.unwrap_or(DEFAULT_EPOCH_MS);
        if epoch_ms > clock.now_ms() {
            return Err(Error::EpochAheadOfCurrentTime(epoch_ms));
        }

        let shared = Arc::new(SharedGenerator {
            epoch_ms,
            data_center_id: self.data_center_id,
            worker_id: self.worker_id,
            layout,
            clock,
            internals: Mutex::new(Internals {
                last_timestamp: LAST_TIMESTAMP_UNSET,
                sequence: 0,
            }),
        });
        Ok(IdGenerator::new_inner(shared))
    }
}
