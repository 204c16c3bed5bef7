// Copyright 2025 the flakegen authors
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

/// The error type for this crate.
///
/// The first four variants are configuration errors surfaced by
/// [`Builder::finalize`]; the rest are runtime errors surfaced by
/// [`IdGenerator::next_id`].
///
/// [`Builder::finalize`]: crate::Builder::finalize
/// [`IdGenerator::next_id`]: crate::IdGenerator::next_id
#[derive(Error, Debug)]
pub enum Error {
    #[error("data_center_id {value} is greater than the max allowed value {max}")]
    DataCenterIdOutOfRange { value: u32, max: u32 },
    #[error("worker_id {value} is greater than the max allowed value {max}")]
    WorkerIdOutOfRange { value: u32, max: u32 },
    #[error(
        "invalid bit length configuration: data_center({0}) + worker({1}) + sequence({2}) + 41 timestamp bits must fit in 63"
    )]
    InvalidBitLength(u8, u8, u8),
    #[error("epoch {0}ms is ahead of the current time")]
    EpochAheadOfCurrentTime(i64),
    #[error("clock moved backwards; refusing to generate an id for {0}ms")]
    ClockMovedBackwards(i64),
    #[error("elapsed time {0}ms no longer fits the timestamp field")]
    OverTimeLimit(i64),
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
}
