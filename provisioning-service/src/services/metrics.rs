use metrics::{counter, histogram};
use std::time::Duration;

use crate::models::{Stage, VpnType};

pub fn record_run(vpn_type: VpnType, outcome: &'static str) {
    let labels = [("vpn_type", vpn_type.as_str()), ("outcome", outcome)];
    counter!("provisioning_runs_total", &labels).increment(1);
}

pub fn record_stage(stage: Stage, elapsed: Duration) {
    let labels = [("stage", stage.as_str())];
    histogram!("provisioning_stage_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

pub fn record_cleanup_failure() {
    counter!("provisioning_cleanup_failures_total").increment(1);
}
