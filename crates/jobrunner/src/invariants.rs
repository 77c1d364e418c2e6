//! Debug assertion macros for the invariants documented in `SPEC_FULL.md`.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds. Mirrors the `INV-xxx` convention used
//! throughout this workspace's other crates.

// =============================================================================
// INV-RB-01: Monotonic total
// =============================================================================

/// Assert that `RingBuffer::total` only ever increases.
///
/// Used in: `RingBuffer::write` after updating `total`.
macro_rules! debug_assert_rb_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-RB-01 violated: total decreased from {} to {}",
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-RB-02: Physical capacity never shrinks
// =============================================================================

/// Assert that the physical backing array never shrinks.
///
/// Used in: `RingBuffer::grow_to`.
macro_rules! debug_assert_rb_no_shrink {
    ($old_len:expr, $new_len:expr) => {
        debug_assert!(
            $new_len >= $old_len,
            "INV-RB-02 violated: physical buffer shrank from {} to {}",
            $old_len,
            $new_len
        )
    };
}

// =============================================================================
// INV-JOB-01: stopped_at set iff running transitioned true -> false
// =============================================================================

/// Assert that `stopped_at` is being set exactly at the true->false
/// transition of `running`, never before or twice.
///
/// Used in: `JobShared::mark_stopped`.
macro_rules! debug_assert_stopped_once {
    ($was_running:expr, $stopped_at_was_none:expr) => {
        debug_assert!(
            $was_running && $stopped_at_was_none,
            "INV-JOB-01 violated: mark_stopped called with running={} stopped_at already set={}",
            $was_running,
            !$stopped_at_was_none
        )
    };
}

// =============================================================================
// INV-JOB-02: started_at <= stopped_at whenever both are defined
// =============================================================================

/// Assert ordering between a job's start and stop timestamps.
///
/// Used in: `JobShared::mark_stopped`.
macro_rules! debug_assert_started_before_stopped {
    ($started_at:expr, $stopped_at:expr) => {
        debug_assert!(
            $stopped_at >= $started_at,
            "INV-JOB-02 violated: stopped_at precedes started_at"
        )
    };
}

// =============================================================================
// INV-JOB-03: no append after running=false
// =============================================================================

/// Assert no bytes are appended to a job's buffer once it has stopped.
///
/// Used in: `JobShared::append`.
macro_rules! debug_assert_no_append_after_stop {
    ($running:expr) => {
        debug_assert!(
            $running,
            "INV-JOB-03 violated: append called after running was set false"
        )
    };
}

pub(crate) use debug_assert_no_append_after_stop;
pub(crate) use debug_assert_rb_monotonic;
pub(crate) use debug_assert_rb_no_shrink;
pub(crate) use debug_assert_started_before_stopped;
pub(crate) use debug_assert_stopped_once;
