use serde::Serialize;

use crate::intensity::{IntensityScale, IntensityTier, Metric};
use crate::region::Region;
use crate::stats::{RegionStats, StatsMap};

/// Share of the busiest region's volume a region must exceed to be highlighted.
const HIGHLIGHT_SHARE: f64 = 0.7;

/// Hover card content for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub region_id: String,
    pub name: String,
    pub volume: String,
    pub recent: String,
}

impl Tooltip {
    pub fn for_region(region: &Region, stats: &StatsMap) -> Self {
        let entry = stats.get(region.id).copied().unwrap_or_default();
        Self {
            region_id: region.id.to_string(),
            name: region.name.to_string(),
            volume: format_count(entry.volume),
            recent: format!("+{}", format_count(entry.recent_count)),
        }
    }
}

/// Group digits in thousands: `1234567` → `"1,234,567"`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One row of the market intelligence panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceRow {
    pub region_id: String,
    pub name: String,
    pub stats: RegionStats,
    pub tier: IntensityTier,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketIntelligence {
    pub metric: Metric,
    pub rows: Vec<IntelligenceRow>,
    /// Region with the most recent activity; `None` when nothing is recent.
    pub active_region: Option<String>,
}

impl MarketIntelligence {
    /// Rows follow registry order. Ties for the active region go to the earlier region.
    pub fn build(regions: &[Region], stats: &StatsMap, metric: Metric) -> Self {
        let scale = IntensityScale::from_stats(stats);
        let max_volume = scale.max(Metric::Volume) as f64;

        let rows: Vec<IntelligenceRow> = regions
            .iter()
            .map(|region| {
                let entry = stats.get(region.id).copied().unwrap_or_default();
                IntelligenceRow {
                    region_id: region.id.to_string(),
                    name: region.name.to_string(),
                    stats: entry,
                    tier: scale.tier(&entry, metric),
                    highlighted: entry.volume as f64 > max_volume * HIGHLIGHT_SHARE,
                }
            })
            .collect();

        let mut active_region: Option<(&IntelligenceRow, u64)> = None;
        for row in &rows {
            let recent = row.stats.recent_count;
            if recent > 0 && active_region.is_none_or(|(_, best)| recent > best) {
                active_region = Some((row, recent));
            }
        }
        let active_region = active_region.map(|(row, _)| row.region_id.clone());

        Self {
            metric,
            rows,
            active_region,
        }
    }
}
