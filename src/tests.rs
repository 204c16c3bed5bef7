use crate::{
    decompose, Clock, DecomposedId, Error, IdGenerator, DEFAULT_EPOCH_MS,
};
use chrono::prelude::*;
use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
    thread,
};

/// A clock frozen at a fixed reading.
struct FixedClock(AtomicI64);

impl FixedClock {
    fn new(now_ms: i64) -> Self {
        Self(AtomicI64::new(now_ms))
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A clock that replays a scripted list of readings, repeating the last one
/// forever. Note that `Builder::finalize` consumes one reading for its
/// epoch check.
struct ScriptedClock(Mutex<VecDeque<i64>>);

impl ScriptedClock {
    fn new(readings: &[i64]) -> Self {
        Self(Mutex::new(readings.iter().copied().collect()))
    }
}

impl Clock for ScriptedClock {
    fn now_ms(&self) -> i64 {
        let mut readings = self.0.lock().unwrap();
        if readings.len() > 1 {
            readings.pop_front().unwrap()
        } else {
            readings[0]
        }
    }
}

#[test]
fn test_next_id() -> Result<(), Error> {
    let sf = IdGenerator::new(1, 1)?;
    assert!(sf.next_id().is_ok());
    Ok(())
}

#[test]
fn test_once() -> Result<(), Error> {
    let expected_data_center_id = 5;
    let expected_worker_id = 10;

    let sf = IdGenerator::builder()
        .epoch_millis(Utc::now().timestamp_millis())
        .data_center_id(expected_data_center_id)
        .worker_id(expected_worker_id)
        .finalize()?;

    let id = sf.next_id()?;
    let parts = sf.decompose(id);

    assert_eq!(parts.msb, 0);
    assert_eq!(parts.sequence, 0);
    // allow a little scheduling jitter
    assert!(parts.timestamp < 50, "unexpected time {}", parts.timestamp);
    assert_eq!(
        parts.data_center_id,
        u64::from(expected_data_center_id),
        "unexpected data center id"
    );
    assert_eq!(
        parts.worker_id,
        u64::from(expected_worker_id),
        "unexpected worker id"
    );

    Ok(())
}

#[test]
fn test_monotonic_run() -> Result<(), Error> {
    let sf = IdGenerator::new(1, 15)?;

    let mut last_id = 0;
    for _ in 0..10_000 {
        let id = sf.next_id()?;
        assert!(
            id > last_id,
            "id not strictly increasing (id: {}, last_id: {})",
            id,
            last_id
        );
        last_id = id;
    }

    Ok(())
}

#[test]
fn test_threads_uniqueness() -> Result<(), Error> {
    let sf = IdGenerator::new(1, 2)?;
    let ids = Arc::new(Mutex::new(HashSet::new()));
    let mut children = Vec::new();
    let num_threads = 10;
    let ids_per_thread = 10_000;

    for _ in 0..num_threads {
        let thread_sf = sf.clone();
        let thread_ids = Arc::clone(&ids);
        children.push(thread::spawn(move || {
            let mut local_ids = Vec::with_capacity(ids_per_thread);
            for _ in 0..ids_per_thread {
                local_ids.push(thread_sf.next_id().unwrap());
            }
            let mut ids_lock = thread_ids.lock().unwrap();
            for id in local_ids {
                assert!(ids_lock.insert(id), "duplicate id detected: {}", id);
            }
        }));
    }

    for child in children {
        child.join().expect("child thread panicked");
    }

    let final_count = ids.lock().unwrap().len();
    assert_eq!(final_count, num_threads * ids_per_thread);

    Ok(())
}

#[test]
fn test_round_trip_decompose() -> Result<(), Error> {
    let sf = IdGenerator::builder()
        .bit_len_data_center_id(4)
        .bit_len_worker_id(6)
        .bit_len_sequence(10)
        .data_center_id(9)
        .worker_id(45)
        .finalize()?;

    let before = Utc::now().timestamp_millis();
    let id = sf.next_id()?;
    let after = Utc::now().timestamp_millis();

    let parts = sf.decompose(id);
    assert_eq!(parts.data_center_id, 9);
    assert_eq!(parts.worker_id, 45);
    let unix_millis = parts.unix_millis(sf.epoch_ms());
    assert!(
        before <= unix_millis && unix_millis <= after,
        "timestamp {} outside the call window [{}, {}]",
        unix_millis,
        before,
        after
    );

    Ok(())
}

#[test]
fn test_frozen_clock_sequence() -> Result<(), Error> {
    // First id at a frozen clock carries sequence 0, the second sequence 1,
    // both with the same timestamp.
    let sf = IdGenerator::builder()
        .epoch_millis(DEFAULT_EPOCH_MS)
        .clock(FixedClock::new(DEFAULT_EPOCH_MS + 1000))
        .finalize()?;

    let first: DecomposedId = decompose(sf.next_id()?);
    assert_eq!(first.timestamp, 1000);
    assert_eq!(first.sequence, 0);

    let second = decompose(sf.next_id()?);
    assert_eq!(second.timestamp, 1000);
    assert_eq!(second.sequence, 1);

    Ok(())
}

#[test]
fn test_shard_isolation() -> Result<(), Error> {
    // Two shards driven by identical frozen clock readings must not collide.
    let now_ms = DEFAULT_EPOCH_MS + 500;
    let a = IdGenerator::builder()
        .data_center_id(1)
        .worker_id(2)
        .clock(FixedClock::new(now_ms))
        .finalize()?;
    let b = IdGenerator::builder()
        .data_center_id(2)
        .worker_id(1)
        .clock(FixedClock::new(now_ms))
        .finalize()?;

    let mut ids = HashSet::new();
    for _ in 0..100 {
        assert!(ids.insert(a.next_id()?));
        assert!(ids.insert(b.next_id()?));
    }
    assert_eq!(ids.len(), 200);

    Ok(())
}

#[test]
fn test_sequence_rollover() -> Result<(), Error> {
    // One sequence bit: the third id in the same millisecond wraps the
    // sequence and must wait for the next millisecond, landing on sequence 0.
    let t = DEFAULT_EPOCH_MS + 100;
    let sf = IdGenerator::builder()
        .bit_len_sequence(1)
        .epoch_millis(DEFAULT_EPOCH_MS)
        .clock(ScriptedClock::new(&[t, t, t, t, t, t + 1]))
        .finalize()?;

    let first = sf.decompose(sf.next_id()?);
    assert_eq!(first.timestamp, 100);
    assert_eq!(first.sequence, 0);

    let second = sf.decompose(sf.next_id()?);
    assert_eq!(second.timestamp, 100);
    assert_eq!(second.sequence, 1);

    let third = sf.decompose(sf.next_id()?);
    assert_eq!(third.timestamp, 101);
    assert_eq!(third.sequence, 0);

    assert!(first.id < second.id && second.id < third.id);

    Ok(())
}

#[test]
fn test_clock_regression() -> Result<(), Error> {
    let t = DEFAULT_EPOCH_MS + 1000;
    let sf = IdGenerator::builder()
        .clock(ScriptedClock::new(&[t, t, t - 5]))
        .finalize()?;

    assert!(sf.next_id().is_ok());
    match sf.next_id() {
        Err(Error::ClockMovedBackwards(ms)) => assert_eq!(ms, 5),
        other => panic!("expected clock regression, got {:?}", other),
    }

    Ok(())
}

#[test]
fn test_over_time_limit() -> Result<(), Error> {
    // 41 bits of milliseconds last ~69 years; a clock reading past that
    // range must be refused rather than wrapped into the shard-id bits.
    let sf = IdGenerator::builder()
        .epoch_millis(DEFAULT_EPOCH_MS)
        .clock(FixedClock::new(DEFAULT_EPOCH_MS + (1i64 << 41)))
        .finalize()?;

    assert!(matches!(sf.next_id(), Err(Error::OverTimeLimit(_))));
    Ok(())
}

#[test]
fn test_boundary_configuration() {
    // 2^bits - 1 is the largest valid id for a 5-bit field.
    assert!(IdGenerator::new(31, 0).is_ok());
    assert!(IdGenerator::new(0, 31).is_ok());

    assert!(matches!(
        IdGenerator::new(32, 0),
        Err(Error::DataCenterIdOutOfRange { value: 32, max: 31 })
    ));
    assert!(matches!(
        IdGenerator::new(0, 32),
        Err(Error::WorkerIdOutOfRange { value: 32, max: 31 })
    ));
}

#[test]
fn test_builder_errors() {
    // Bit widths summing past the 63-bit budget are rejected; narrower
    // layouts are accepted.
    assert!(matches!(
        IdGenerator::builder().bit_len_sequence(13).finalize(),
        Err(Error::InvalidBitLength(5, 5, 13))
    ));
    assert!(IdGenerator::builder().bit_len_sequence(11).finalize().is_ok());

    let epoch = Utc::now() + chrono::Duration::seconds(10);
    assert!(matches!(
        IdGenerator::builder().epoch(epoch).finalize(),
        Err(Error::EpochAheadOfCurrentTime(_))
    ));
}

#[test]
fn test_default_instance() -> Result<(), Error> {
    let first = crate::next_id()?;
    let second = crate::next_id()?;
    assert!(second > first);
    Ok(())
}

#[test]
fn test_error_send_sync() {
    // This test ensures the Error type is Send + Sync
    let err = Error::MutexPoisoned;
    thread::spawn(move || {
        let _ = err;
    })
    .join()
    .unwrap();
}
