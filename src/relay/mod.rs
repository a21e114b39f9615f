//! Bidirectional relay loops (component E): plain passthrough, phase-aware
//! switching, and full Stratum MITM rewriting. All three share the same
//! idle timeout. The plain and switching loops additionally tolerate a
//! short run of empty reads before treating a side as closed; the MITM
//! loop does not and closes on the first zero-length read (see
//! [`mitm::copy_loop_mitm`]).

pub mod mitm;
pub mod plain;
pub mod switching;

pub use mitm::copy_loop_mitm;
pub use plain::copy_loop;
pub use switching::copy_loop_switching;

use std::time::Duration;

/// Relay buffers are sized per the source's fixed per-direction buffer.
pub(crate) const BUF_SIZE: usize = 1024;
/// Idle connections are torn down after this much silence from both sides.
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
/// Consecutive empty reads tolerated before treating a side as closed.
pub(crate) const MAX_EMPTY_READS: u32 = 6;

/// Why a copy loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Either side closed normally (EOF) or the idle timeout fired.
    Closed,
    /// The scheduler flipped phase; the driver should tear down this
    /// connection and re-dial upstream under the dial guard.
    Redial,
}
