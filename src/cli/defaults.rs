/// Hard cap on the concurrent worker budget regardless of detected host capacity
pub const MAX_WORKER_CEILING: usize = 16;

/// Minimum QUAL score for a joint call to pass filtration
pub const MIN_QUAL: f64 = 30.0;

/// Minimum total read depth for a joint call to pass filtration
pub const MIN_DEPTH: u32 = 10;
