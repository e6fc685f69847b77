use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::colors::Rgba;
use crate::stats::{RegionStats, StatsMap};

/// Which statistic colors the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Volume,
    Growth,
}

impl Metric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Growth => "growth",
        }
    }

    /// Label shown on the metric toggle.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Volume => "Total Volume",
            Self::Growth => "Growth Index",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volume" => Ok(Self::Volume),
            "growth" => Ok(Self::Growth),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Discrete fill bucket for a region, relative to the busiest region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityTier {
    None,
    Low,
    Mid,
    High,
}

/// Tiers shown in the map legend, strongest first.
pub const LEGEND: [IntensityTier; 3] = [IntensityTier::High, IntensityTier::Mid, IntensityTier::Low];

/// Fill for regions that have no stats entry at all.
pub const NEUTRAL_FILL: Rgba = Rgba::new(243, 244, 246, 1.0);

impl IntensityTier {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.8 {
            Self::High
        } else if ratio > 0.5 {
            Self::Mid
        } else if ratio > 0.2 {
            Self::Low
        } else {
            Self::None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Mid => "Mid",
            Self::High => "High",
        }
    }

    pub const fn fill(self) -> Rgba {
        match self {
            Self::High => Rgba::new(37, 99, 235, 0.8),
            Self::Mid => Rgba::new(96, 165, 250, 0.8),
            Self::Low => Rgba::new(191, 219, 254, 0.8),
            Self::None => Rgba::new(219, 234, 254, 0.8),
        }
    }
}

/// Per-metric maxima captured once per stats map, floored at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityScale {
    max_volume: u64,
    max_growth: u64,
}

impl IntensityScale {
    pub fn from_stats(stats: &StatsMap) -> Self {
        let max_of = |metric: Metric| {
            stats
                .values()
                .map(|s| s.value(metric))
                .max()
                .unwrap_or(0)
                .max(1)
        };
        Self {
            max_volume: max_of(Metric::Volume),
            max_growth: max_of(Metric::Growth),
        }
    }

    pub fn max(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Volume => self.max_volume,
            Metric::Growth => self.max_growth,
        }
    }

    pub fn ratio(&self, stats: &RegionStats, metric: Metric) -> f64 {
        stats.value(metric) as f64 / self.max(metric) as f64
    }

    pub fn tier(&self, stats: &RegionStats, metric: Metric) -> IntensityTier {
        IntensityTier::from_ratio(self.ratio(stats, metric))
    }
}

/// Tier for one region. Regions missing from `stats` fall in the lowest tier.
pub fn intensity(stats: &StatsMap, region_id: &str, metric: Metric) -> IntensityTier {
    match stats.get(region_id) {
        Some(entry) => IntensityScale::from_stats(stats).tier(entry, metric),
        None => IntensityTier::None,
    }
}
