//! A distributed unique ID generator following [Twitter's Snowflake] design.
//!
//! Each id is a 64-bit non-negative integer packing a 41-bit millisecond
//! timestamp, a shard identity (`data_center_id` + `worker_id`, 5 bits each
//! by default), and a 12-bit per-millisecond sequence counter. Instances
//! with distinct shard identities never collide, with no coordination
//! between them.
//!
//! ## Quickstart
//!
//! Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! flakegen = "0.1"
//! ```
//!
//! Use the library like this:
//!
//! ```
//! use flakegen::IdGenerator;
//!
//! let sf = IdGenerator::new(0, 0).unwrap();
//! let next_id = sf.next_id().unwrap();
//! println!("{}", next_id);
//! ```
//!
//! ## Concurrent use
//!
//! IdGenerator is thread-safe. `clone` it before moving to another thread:
//! ```
//! use flakegen::IdGenerator;
//! use std::thread;
//!
//! let sf = IdGenerator::new(0, 0).unwrap();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_sf = sf.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_sf.next_id().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```
//!
//! Shard identities are not assigned by this crate: provision a distinct
//! `(data_center_id, worker_id)` pair per instance out of band, e.g. from
//! deployment configuration.
//!
//! [Twitter's Snowflake]: https://blog.twitter.com/2010/announcing-snowflake

mod builder;
mod clock;
mod error;
mod generator;
#[cfg(test)]
mod tests;

pub use crate::generator::*;
pub use builder::*;
pub use clock::*;
pub use error::*;

use std::sync::LazyLock;

/// The process-wide default generator: shard identity `(0, 0)`, default
/// epoch and layout, created on first use.
static DEFAULT_GENERATOR: LazyLock<IdGenerator> = LazyLock::new(|| {
    // Construction from these constants only fails if the system clock is
    // behind the 2025 default epoch.
    IdGenerator::new(0, 0).expect("default generator configuration is valid")
});

/// Generate the next unique id from the process-wide default generator.
///
/// The default generator is created lazily on first use and never
/// reconfigured. It is a convenience for single-shard processes; callers
/// running multiple shards must construct their own [`IdGenerator`]
/// instances with distinct shard identities.
pub fn next_id() -> Result<u64, Error> {
    DEFAULT_GENERATOR.next_id()
}
