use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 1 Gbit/s expressed in bytes/sec.
const GIGABIT_BYTES_PER_SEC: f64 = 125_000_000.0;

/// Business priority used to weight the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    #[default]
    Balanced,
    HighConcurrency,
    IoIntensive,
    MemorySensitive,
}

/// Weight vector and normalization constants of a profile.
///
/// Weights need not sum to 1; the score is clamped after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileWeights {
    pub cpu: f64,
    pub mem: f64,
    pub load: f64,
    pub disk: f64,
    pub net: f64,
    /// Multiplier on the reference core count when normalizing load average.
    pub load_coef: f64,
    /// Bytes/sec at which a network direction scores zero.
    pub max_bandwidth: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown scoring profile '{0}'")]
pub struct UnknownProfile(pub String);

impl ScoringProfile {
    pub const ALL: [ScoringProfile; 4] = [
        ScoringProfile::Balanced,
        ScoringProfile::HighConcurrency,
        ScoringProfile::IoIntensive,
        ScoringProfile::MemorySensitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringProfile::Balanced => "balanced",
            ScoringProfile::HighConcurrency => "high_concurrency",
            ScoringProfile::IoIntensive => "io_intensive",
            ScoringProfile::MemorySensitive => "memory_sensitive",
        }
    }

    /// Upstream wire code of the profile.
    pub fn code(&self) -> u8 {
        match self {
            ScoringProfile::Balanced => 0,
            ScoringProfile::HighConcurrency => 1,
            ScoringProfile::IoIntensive => 2,
            ScoringProfile::MemorySensitive => 3,
        }
    }

    pub fn weights(&self) -> ProfileWeights {
        let (cpu, mem, load, disk, net, load_coef) = match self {
            ScoringProfile::Balanced => (0.35, 0.30, 0.15, 0.15, 0.05, 1.5),
            ScoringProfile::HighConcurrency => (0.45, 0.25, 0.15, 0.10, 0.05, 1.2),
            ScoringProfile::IoIntensive => (0.20, 0.15, 0.20, 0.35, 0.10, 2.0),
            ScoringProfile::MemorySensitive => (0.20, 0.45, 0.15, 0.10, 0.10, 1.5),
        };
        ProfileWeights {
            cpu,
            mem,
            load,
            disk,
            net,
            load_coef,
            max_bandwidth: GIGABIT_BYTES_PER_SEC,
        }
    }
}

impl fmt::Display for ScoringProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringProfile {
    type Err = UnknownProfile;

    /// Accepts `high_concurrency`, `high-concurrency`, `HIGH_CONCURRENCY` or the wire code `1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let profile = match normalized.as_str() {
            "balanced" | "0" => ScoringProfile::Balanced,
            "high_concurrency" | "1" => ScoringProfile::HighConcurrency,
            "io_intensive" | "2" => ScoringProfile::IoIntensive,
            "memory_sensitive" | "3" => ScoringProfile::MemorySensitive,
            _ => return Err(UnknownProfile(s.to_string())),
        };
        Ok(profile)
    }
}
