use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Instruments recorded by the execution pipeline. Built once from a `Meter` and handed to
/// the components that record them.
pub struct ExecutorMetrics {
    pub jobs_enqueued: Counter<u64>,
    pub jobs_completed: Counter<u64>,
    pub jobs_failed: Counter<u64>,
    pub certificate_poll_attempts: Counter<u64>,
    pub job_duration: Histogram<f64>,
}

impl ExecutorMetrics {
    pub fn register(meter: &Meter) -> Self {
        let jobs_enqueued = meter
            .u64_counter("jobs_enqueued")
            .with_description("Count of execution jobs enqueued over time")
            .with_unit("jobs")
            .init();

        let jobs_completed = meter
            .u64_counter("jobs_completed")
            .with_description("Count of execution jobs completed over time")
            .with_unit("jobs")
            .init();

        let jobs_failed = meter
            .u64_counter("jobs_failed")
            .with_description("Count of execution jobs failed over time")
            .with_unit("jobs")
            .init();

        let certificate_poll_attempts = meter
            .u64_counter("certificate_poll_attempts")
            .with_description("Count of certificate lookups on receiving subnets")
            .with_unit("requests")
            .init();

        let job_duration = meter
            .f64_histogram("job_duration")
            .with_description("Time taken by a worker to settle a job")
            .with_unit("s")
            .init();

        Self { jobs_enqueued, jobs_completed, jobs_failed, certificate_poll_attempts, job_duration }
    }
}
