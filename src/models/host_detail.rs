use serde::{Deserialize, Serialize};

use super::serde_helpers::{lenient_f64, lenient_opt_f64, lenient_string, lenient_timestamp, lenient_u64};

/// One stored performance row: the full CPU breakdown, load, memory, disk
/// and network readings of a node at `timestamp`, with rates of change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usr_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub system_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub nice_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub idle_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub io_wait_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub irq_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub soft_irq_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_1: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_3: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_15: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_used_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_free: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_avail: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub disk_util_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub send_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rcv_rate: f64,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_used_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub disk_util_percent_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_1_rate: f64,
}

/// Memory breakdown of a node at `timestamp`, in the units the agent reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub free: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avail: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub buffers: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cached: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub active: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub inactive: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dirty: f64,
}

/// Per-CPU soft interrupt counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SoftIrqRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cpu_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub hi: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub timer: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub net_tx: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub net_rx: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub block: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub sched: u64,
}
