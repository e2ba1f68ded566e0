//! Prometheus adapter for the process state.

use std::sync::Arc;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Gauge, GaugeVec, Opts};

use super::StateProvider;
use crate::Result;

const NAMESPACE: &str = "proxy_core";

/// Collector exporting process state fields.
///
/// Every collection pass takes a fresh [`StateProvider::get`] snapshot; the
/// collector does no locking of its own.
pub struct StateCollector {
    provider: Arc<StateProvider>,
    include_uuid: bool,
    up_opts: Opts,
    start_opts: Opts,
    up: GaugeVec,
    start_time: Gauge,
}

impl StateCollector {
    pub(crate) fn new(provider: Arc<StateProvider>, include_uuid: bool) -> Result<Self> {
        let up_opts = Opts::new("up", "Process state, always 1.").namespace(NAMESPACE);
        let start_opts = Opts::new("start_time_seconds", "Process start time as a Unix timestamp.")
            .namespace(NAMESPACE);

        let up = GaugeVec::new(up_opts.clone(), label_names(include_uuid))?;
        let start_time = Gauge::with_opts(start_opts.clone())?;

        Ok(Self {
            provider,
            include_uuid,
            up_opts,
            start_opts,
            up,
            start_time,
        })
    }
}

fn label_names(include_uuid: bool) -> &'static [&'static str] {
    if include_uuid {
        &["version", "telemetry", "update_available", "uuid"]
    } else {
        &["version", "telemetry", "update_available"]
    }
}

impl Collector for StateCollector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.up.desc();
        descs.extend(self.start_time.desc());
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let state = self.provider.get();
        let mut families = Vec::with_capacity(2);

        // Fresh metrics per pass so concurrent scrapes never see each
        // other's label sets.
        if let Ok(up) = GaugeVec::new(self.up_opts.clone(), label_names(self.include_uuid)) {
            let update_available = state.update_available.to_string();
            let mut values = vec![
                env!("CARGO_PKG_VERSION"),
                state.telemetry_string(),
                update_available.as_str(),
            ];
            if self.include_uuid {
                values.push(state.uuid.as_str());
            }

            up.with_label_values(&values).set(1.0);
            families.extend(up.collect());
        }

        if let (Some(start), Ok(gauge)) = (state.start, Gauge::with_opts(self.start_opts.clone())) {
            gauge.set(start.timestamp() as f64);
            families.extend(gauge.collect());
        }

        families
    }
}
