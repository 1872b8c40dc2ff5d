/// Every job that has not failed, keyed by its `id` field
pub const JOBS_COLLECTION: &str = "jobs";

/// Failed jobs are moved out of the primary collection on failure
pub const FAILED_JOBS_COLLECTION: &str = "failed_jobs";
