use chrono::Utc;

/// A source of wall-clock readings in milliseconds since the Unix epoch.
///
/// The generator reads time exclusively through this trait, so tests can
/// drive it with a frozen or scripted clock instead of the real one.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The system wall clock. This is the clock every generator uses unless one
/// is supplied through [`Builder::clock`].
///
/// [`Builder::clock`]: crate::Builder::clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
