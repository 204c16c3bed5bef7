use crate::builder::Builder;
use crate::clock::Clock;
use crate::error::Error;
use std::{
    sync::{Arc, Mutex},
    thread,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Bit length of the timestamp section. Fixed by design: 41 bits of
/// milliseconds cover roughly 69 years past the epoch.
pub const BIT_LEN_TIME: u8 = 41;
/// Default bit length of the data center id section.
pub const DEFAULT_BIT_LEN_DATA_CENTER_ID: u8 = 5;
/// Default bit length of the worker id section.
pub const DEFAULT_BIT_LEN_WORKER_ID: u8 = 5;
/// Default bit length of the sequence section.
pub const DEFAULT_BIT_LEN_SEQUENCE: u8 = 12;
/// Default epoch: 2025-07-04T09:12:00Z, in milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH_MS: i64 = 1_751_620_320_000;

/// Sentinel for "no id issued yet".
pub(crate) const LAST_TIMESTAMP_UNSET: i64 = -1;

/// The bit layout of an id below the fixed 41-bit timestamp section,
/// most-significant-first: data center id, worker id, sequence.
///
/// The three widths plus the timestamp and the reserved sign bit must fit in
/// 64 bits, so `data_center + worker + sequence` may not exceed 22. Widths
/// summing to less than 22 are accepted; the id simply uses fewer bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    bit_len_data_center_id: u8,
    bit_len_worker_id: u8,
    bit_len_sequence: u8,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            bit_len_data_center_id: DEFAULT_BIT_LEN_DATA_CENTER_ID,
            bit_len_worker_id: DEFAULT_BIT_LEN_WORKER_ID,
            bit_len_sequence: DEFAULT_BIT_LEN_SEQUENCE,
        }
    }
}

impl Layout {
    /// Create a layout from explicit bit widths.
    pub fn new(
        bit_len_data_center_id: u8,
        bit_len_worker_id: u8,
        bit_len_sequence: u8,
    ) -> Result<Self, Error> {
        let total = u32::from(bit_len_data_center_id)
            + u32::from(bit_len_worker_id)
            + u32::from(bit_len_sequence)
            + u32::from(BIT_LEN_TIME);
        if total > 63 {
            return Err(Error::InvalidBitLength(
                bit_len_data_center_id,
                bit_len_worker_id,
                bit_len_sequence,
            ));
        }
        Ok(Self {
            bit_len_data_center_id,
            bit_len_worker_id,
            bit_len_sequence,
        })
    }

    /// The largest data center id this layout can encode.
    pub fn max_data_center_id(&self) -> u32 {
        (1 << self.bit_len_data_center_id) - 1
    }

    /// The largest worker id this layout can encode.
    pub fn max_worker_id(&self) -> u32 {
        (1 << self.bit_len_worker_id) - 1
    }

    pub(crate) fn sequence_mask(&self) -> u32 {
        (1 << self.bit_len_sequence) - 1
    }

    pub(crate) fn worker_id_shift(&self) -> u32 {
        u32::from(self.bit_len_sequence)
    }

    pub(crate) fn data_center_id_shift(&self) -> u32 {
        u32::from(self.bit_len_sequence) + u32::from(self.bit_len_worker_id)
    }

    pub(crate) fn timestamp_shift(&self) -> u32 {
        self.data_center_id_shift() + u32::from(self.bit_len_data_center_id)
    }

    /// Break an id produced under this layout up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        let sequence_mask = (1u64 << self.bit_len_sequence) - 1;
        let worker_id_mask = ((1u64 << self.bit_len_worker_id) - 1) << self.worker_id_shift();
        let data_center_id_mask =
            ((1u64 << self.bit_len_data_center_id) - 1) << self.data_center_id_shift();
        DecomposedId {
            id,
            msb: id >> 63,
            timestamp: id >> self.timestamp_shift(),
            data_center_id: (id & data_center_id_mask) >> self.data_center_id_shift(),
            worker_id: (id & worker_id_mask) >> self.worker_id_shift(),
            sequence: id & sequence_mask,
        }
    }
}

/// Internals of IdGenerator.
/// This struct is not exposed to the public.
#[derive(Debug)]
pub(crate) struct Internals {
    pub(crate) last_timestamp: i64,
    pub(crate) sequence: u32,
}

/// SharedGenerator is shared between IdGenerator clones.
/// This struct is not exposed to the public.
pub(crate) struct SharedGenerator {
    pub(crate) epoch_ms: i64,
    pub(crate) data_center_id: u32,
    pub(crate) worker_id: u32,
    pub(crate) layout: Layout,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) internals: Mutex<Internals>,
}

/// IdGenerator is a distributed unique ID generator.
/// It is thread-safe and can be cloned to be used in multiple threads.
pub struct IdGenerator(pub(crate) Arc<SharedGenerator>);

impl IdGenerator {
    /// Create a new IdGenerator with the given shard identity and the
    /// default epoch and layout. For custom configuration see [`builder`].
    ///
    /// The shard identity must be provisioned out of band: two instances
    /// sharing a `(data_center_id, worker_id)` pair can emit colliding ids.
    ///
    /// [`builder`]: struct.IdGenerator.html#method.builder
    pub fn new(data_center_id: u32, worker_id: u32) -> Result<Self, Error> {
        Builder::new()
            .data_center_id(data_center_id)
            .worker_id(worker_id)
            .finalize()
    }

    /// Create a new [`Builder`] to construct an IdGenerator.
    ///
    /// [`Builder`]: struct.Builder.html
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Create a new IdGenerator with the given SharedGenerator.
    pub(crate) fn new_inner(shared: Arc<SharedGenerator>) -> Self {
        Self(shared)
    }

    /// Generate the next unique id.
    ///
    /// Successive non-failing calls return strictly increasing values. When
    /// the per-millisecond sequence budget is exhausted the call waits,
    /// yielding between clock reads, until the clock advances to the next
    /// millisecond; the wait is expected to stay sub-millisecond and there
    /// is no maximum-wait policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] if the wall clock reads
    /// earlier than the timestamp of the last issued id (e.g. after an NTP
    /// step), with the regression magnitude in milliseconds. No id is
    /// issued and nothing is retried; whether to fail or back off and call
    /// again is caller policy. Returns [`Error::OverTimeLimit`] once the
    /// elapsed time since the epoch no longer fits the 41-bit timestamp
    /// field.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64, Error> {
        let mut internals = self.0.internals.lock().map_err(|_| Error::MutexPoisoned)?;

        let mut timestamp = self.0.clock.now_ms();
        if timestamp < internals.last_timestamp {
            return Err(Error::ClockMovedBackwards(
                internals.last_timestamp - timestamp,
            ));
        }

        if timestamp == internals.last_timestamp {
            internals.sequence = (internals.sequence + 1) & self.0.layout.sequence_mask();
            if internals.sequence == 0 {
                // Sequence exhausted for this millisecond; wait for the next one.
                timestamp = self.next_millis(internals.last_timestamp);
            }
        } else {
            internals.sequence = 0;
        }
        internals.last_timestamp = timestamp;

        let elapsed = timestamp - self.0.epoch_ms;
        if elapsed < 0 {
            // The epoch was validated against the clock at construction, so
            // a reading before it means the clock regressed since then.
            return Err(Error::ClockMovedBackwards(-elapsed));
        }
        if elapsed >= 1 << BIT_LEN_TIME {
            return Err(Error::OverTimeLimit(elapsed));
        }

        let layout = &self.0.layout;
        Ok((elapsed as u64) << layout.timestamp_shift()
            | u64::from(self.0.data_center_id) << layout.data_center_id_shift()
            | u64::from(self.0.worker_id) << layout.worker_id_shift()
            | u64::from(internals.sequence))
    }

    /// Break an id produced by this generator up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        self.0.layout.decompose(id)
    }

    /// The data center id encoded into every id from this generator.
    pub fn data_center_id(&self) -> u32 {
        self.0.data_center_id
    }

    /// The worker id encoded into every id from this generator.
    pub fn worker_id(&self) -> u32 {
        self.0.worker_id
    }

    /// The epoch in milliseconds since the Unix epoch.
    pub fn epoch_ms(&self) -> i64 {
        self.0.epoch_ms
    }

    /// The bit layout of ids from this generator.
    pub fn layout(&self) -> Layout {
        self.0.layout
    }

    /// Spin until the clock reads strictly later than `last`.
    fn next_millis(&self, last: i64) -> i64 {
        let mut now = self.0.clock.now_ms();
        while now <= last {
            thread::yield_now();
            now = self.0.clock.now_ms();
        }
        now
    }
}

/// Returns a new `IdGenerator` referencing the same state as `self`.
/// This is used for concurrent use.
impl Clone for IdGenerator {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// DecomposedId is the parts of an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposedId {
    pub id: u64,
    pub msb: u64,
    /// Milliseconds since the generator's epoch.
    pub timestamp: u64,
    pub data_center_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl DecomposedId {
    /// The timestamp in milliseconds since the Unix epoch, given the epoch
    /// the id was generated under.
    pub fn unix_millis(&self, epoch_ms: i64) -> i64 {
        self.timestamp as i64 + epoch_ms
    }
}

/// Break an id produced under the default layout up into its parts.
pub fn decompose(id: u64) -> DecomposedId {
    Layout::default().decompose(id)
}
