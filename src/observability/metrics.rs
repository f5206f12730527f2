use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub offers_presented_total: IntCounter,
    pub offer_resolutions_total: IntCounterVec,
    pub offers_discarded_total: IntCounter,
    pub phase_advances_total: IntCounterVec,
    pub jobs_completed_total: IntCounter,
    pub workers_online: IntGauge,
    pub driver_earnings_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let offers_presented_total =
            IntCounter::new("offers_presented_total", "Offers presented to workers")
                .expect("valid offers_presented_total metric");

        let offer_resolutions_total = IntCounterVec::new(
            Opts::new("offer_resolutions_total", "Offer resolutions by outcome"),
            &["outcome"],
        )
        .expect("valid offer_resolutions_total metric");

        let offers_discarded_total = IntCounter::new(
            "offers_discarded_total",
            "Offers pulled from the source after the worker stopped being eligible",
        )
        .expect("valid offers_discarded_total metric");

        let phase_advances_total = IntCounterVec::new(
            Opts::new("phase_advances_total", "Job phase transitions by entered phase"),
            &["phase"],
        )
        .expect("valid phase_advances_total metric");

        let jobs_completed_total = IntCounter::new("jobs_completed_total", "Completed jobs")
            .expect("valid jobs_completed_total metric");

        let workers_online = IntGauge::new("workers_online", "Workers currently online")
            .expect("valid workers_online metric");

        let driver_earnings_total = IntCounter::new(
            "driver_earnings_total",
            "Net driver earnings of completed jobs in minor currency units",
        )
        .expect("valid driver_earnings_total metric");

        registry
            .register(Box::new(offers_presented_total.clone()))
            .expect("register offers_presented_total");
        registry
            .register(Box::new(offer_resolutions_total.clone()))
            .expect("register offer_resolutions_total");
        registry
            .register(Box::new(offers_discarded_total.clone()))
            .expect("register offers_discarded_total");
        registry
            .register(Box::new(phase_advances_total.clone()))
            .expect("register phase_advances_total");
        registry
            .register(Box::new(jobs_completed_total.clone()))
            .expect("register jobs_completed_total");
        registry
            .register(Box::new(workers_online.clone()))
            .expect("register workers_online");
        registry
            .register(Box::new(driver_earnings_total.clone()))
            .expect("register driver_earnings_total");

        Self {
            registry,
            offers_presented_total,
            offer_resolutions_total,
            offers_discarded_total,
            phase_advances_total,
            jobs_completed_total,
            workers_online,
            driver_earnings_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
