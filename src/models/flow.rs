use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::serde_helpers::{lenient_f64, lenient_string, lenient_timestamp};

/// Which device family a flow query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    Network,
    Disk,
}

impl FlowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowMode::Network => "network",
            FlowMode::Disk => "disk",
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" | "net" => Ok(FlowMode::Network),
            "disk" => Ok(FlowMode::Disk),
            other => Err(format!("Unknown flow mode '{other}'")),
        }
    }
}

/// One device-level rate sample, as returned by the network or disk detail queries.
///
/// Both detail kinds share this record; only the pair matching the query's
/// mode is populated by the upstream.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(
        default,
        alias = "net_name",
        alias = "disk_name",
        deserialize_with = "lenient_string"
    )]
    pub device_name: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rcv_bytes_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub snd_bytes_rate: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub read_bytes_per_sec: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub write_bytes_per_sec: f64,
}

impl FlowRecord {
    /// `(in, out)` in bytes/sec: receive/send for network, read/write for disk.
    pub fn directional_rates(&self, mode: FlowMode) -> (f64, f64) {
        let (input, output) = match mode {
            FlowMode::Network => (self.rcv_bytes_rate, self.snd_bytes_rate),
            FlowMode::Disk => (self.read_bytes_per_sec, self.write_bytes_per_sec),
        };
        (input.max(0.0), output.max(0.0))
    }
}

/// One timestamp bucket of a flow series, in MB/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedFlowPoint {
    pub timestamp: i64,
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

/// Latest receive/send rate of one node, in kB/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetRateSample {
    pub timestamp: i64,
    pub rcv_rate: f64,
    pub send_rate: f64,
}

/// Per-cycle enrichment results keyed by node. `None` marks a node whose
/// lookup failed, timed out or found no data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetRateMap(HashMap<String, Option<NetRateSample>>);

impl NetRateMap {
    /// Outer `None`: node was never looked up. Inner `None`: lookup came back absent.
    pub fn get(&self, server_name: &str) -> Option<Option<&NetRateSample>> {
        self.0.get(server_name).map(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nodes whose lookup came back absent, in name order.
    pub fn absent_nodes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .0
            .iter()
            .filter(|(_, rate)| rate.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Option<NetRateSample>)> for NetRateMap {
    fn from_iter<I: IntoIterator<Item = (String, Option<NetRateSample>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
