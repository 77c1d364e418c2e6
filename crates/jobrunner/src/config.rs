use std::time::Duration;

/// Configuration for a [`crate::Runner`].
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    /// Maximum number of job records held in the index at once. Exceeding
    /// this on `run` evicts the least-recently-used record (spec.md §4.4).
    pub max_jobs: usize,
    /// Capacity, in bytes, of each job's output ring buffer.
    pub ring_capacity: usize,
    /// Size of the scratch buffer the collector task reads into per read
    /// call (spec.md §4.4.1 suggests 2048).
    pub collector_read_size: usize,
    /// Interval at which a live `ByteStream` re-samples the ring buffer
    /// even without a broadcaster wakeup, as a safety net against the
    /// inherent check-then-register race (see SPEC_FULL.md §4.4).
    pub fanout_poll_interval: Duration,
}

impl RunnerConfig {
    /// Creates a configuration with explicit values.
    ///
    /// # Panics
    ///
    /// Panics if `max_jobs` or `ring_capacity` is zero, if
    /// `collector_read_size` is zero, or if `fanout_poll_interval` is zero.
    #[must_use]
    pub const fn new(
        max_jobs: usize,
        ring_capacity: usize,
        collector_read_size: usize,
        fanout_poll_interval: Duration,
    ) -> Self {
        assert!(max_jobs > 0, "max_jobs must be >= 1");
        assert!(ring_capacity > 0, "ring_capacity must be >= 1");
        assert!(collector_read_size > 0, "collector_read_size must be >= 1");
        assert!(
            fanout_poll_interval.as_nanos() > 0,
            "fanout_poll_interval must be > 0"
        );
        Self {
            max_jobs,
            ring_capacity,
            collector_read_size,
            fanout_poll_interval,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_jobs: 1024,
            ring_capacity: 1 << 20, // 1 MiB of retained output per job
            collector_read_size: 2048,
            fanout_poll_interval: Duration::from_millis(250),
        }
    }
}
