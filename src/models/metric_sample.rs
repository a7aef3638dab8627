use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::flow::NetRateSample;
use super::serde_helpers::{lenient_f64, lenient_opt_f64, lenient_string};

/// Online/offline marker exactly as the upstream sent it.
///
/// The query service has used the numeric enum value, its string form and
/// the enum name at different times, so the raw encoding is kept and
/// interpreted by [`NodeStatus::is_online`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeStatus {
    Code(i64),
    Label(String),
}

impl Default for NodeStatus {
    /// The upstream enum's zero value, which is `ONLINE`.
    fn default() -> Self {
        NodeStatus::Code(0)
    }
}

impl NodeStatus {
    pub fn is_online(&self) -> bool {
        match self {
            NodeStatus::Code(code) => *code == 0,
            NodeStatus::Label(label) => {
                let label = label.trim();
                label == "0" || label.eq_ignore_ascii_case("ONLINE")
            }
        }
    }
}

impl<'de> Deserialize<'de> for NodeStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => NodeStatus::default(),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(code) => NodeStatus::Code(code),
                None => NodeStatus::Label(n.to_string()),
            },
            Some(Value::String(s)) => NodeStatus::Label(s),
            Some(other) => NodeStatus::Label(other.to_string()),
        })
    }
}

/// One node's instantaneous readings. Network rates are in kB/s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(default, alias = "node_id", deserialize_with = "lenient_string")]
    pub server_name: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_used_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub disk_util_percent: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load_avg_1: f64,
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
}

impl MetricSample {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Default::default()
        }
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    pub fn with_score(self, score: f64) -> Self {
        Self {
            score: Some(score),
            ..self
        }
    }

    /// Replaces the rate fields with an enrichment result; an absent result zeroes them.
    pub fn with_net_rate(self, rate: Option<&NetRateSample>) -> Self {
        let (send_rate, rcv_rate) = rate.map_or((0.0, 0.0), |r| (r.send_rate, r.rcv_rate));
        Self {
            send_rate,
            rcv_rate,
            ..self
        }
    }
}
