use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::intensity::Metric;
use crate::record::Record;
use crate::region::Region;

/// Per-region summary derived from one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    pub volume: u64,
    pub recent_count: u64,
    pub total_score: f64,
    /// `round(total_score / volume)`, or 0 when `volume` is 0.
    pub average_score: i64,
}

impl RegionStats {
    /// The statistic that feeds intensity under `metric`.
    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Volume => self.volume,
            Metric::Growth => self.recent_count,
        }
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Running totals for one region during an aggregation pass.
#[derive(Debug, Default)]
struct Tally {
    volume: u64,
    recent_count: u64,
    scores: Vec<f64>,
}

impl Tally {
    fn add(&mut self, record: &Record) {
        self.volume += 1;
        self.scores.push(record.score());
        if record.is_recent() {
            self.recent_count += 1;
        }
    }

    fn finish(mut self) -> RegionStats {
        // Summed in sorted order so the total does not depend on record order.
        self.scores.sort_by(f64::total_cmp);
        let total_score: f64 = self.scores.iter().sum();
        let average_score = if self.volume > 0 {
            round_half_up(total_score / self.volume as f64)
        } else {
            0
        };
        RegionStats {
            volume: self.volume,
            recent_count: self.recent_count,
            total_score,
            average_score,
        }
    }
}

pub type StatsMap = HashMap<String, RegionStats>;

/// Stats plus bookkeeping about records that matched no region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateReport {
    pub stats: StatsMap,
    pub matched: usize,
    pub ignored: usize,
}

/// Reduce `records` to one [`RegionStats`] per region.
///
/// Every region gets an entry, even with no matching records. Records whose
/// postal code names no region are skipped.
pub fn aggregate(records: &[Record], regions: &[Region]) -> StatsMap {
    aggregate_with_report(records, regions).stats
}

pub fn aggregate_with_report(records: &[Record], regions: &[Region]) -> AggregateReport {
    let mut tallies: HashMap<&str, Tally> = regions
        .iter()
        .map(|region| (region.id, Tally::default()))
        .collect();
    let mut matched = 0;
    let mut ignored = 0;

    for record in records {
        let tally = record
            .region_id()
            .and_then(|id| tallies.get_mut(id.as_ref()));
        match tally {
            Some(tally) => {
                tally.add(record);
                matched += 1;
            }
            None => ignored += 1,
        }
    }

    let stats: StatsMap = tallies
        .into_iter()
        .map(|(id, tally)| (id.to_string(), tally.finish()))
        .collect();

    AggregateReport {
        stats,
        matched,
        ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{RegionDef, RegionRegistry, registry};
    use serde_json::{Value, json};

    const ABC: &[RegionDef] = &[
        RegionDef {
            id: "A",
            name: "Alpha",
            path: "M 0 0 L 10 0 L 10 10 L 0 10 Z",
            label_anchor: (5.0, 5.0),
        },
        RegionDef {
            id: "B",
            name: "Bravo",
            path: "M 20 0 L 30 0 L 30 10 L 20 10 Z",
            label_anchor: (25.0, 5.0),
        },
        RegionDef {
            id: "C",
            name: "Charlie",
            path: "M 40 0 L 50 0 L 50 10 L 40 10 Z",
            label_anchor: (45.0, 5.0),
        },
    ];

    fn abc() -> RegionRegistry {
        RegionRegistry::from_defs(ABC, "A").expect("test regions should build")
    }

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("test record should be an object"))
            .collect()
    }

    fn nine_records() -> Vec<Record> {
        records(vec![
            json!({"_zip": "A", "_score": 10}),
            json!({"_zip": "A", "_score": 20, "Date Filed": "2024-03-01"}),
            json!({"_zip": "A", "_score": 30}),
            json!({"Zip": "B", "_score": 5}),
            json!({"Zip": "B", "_type": "Last 90 Days"}),
            json!({"Zip": "B"}),
            json!({"ZIP": "C", "score": 1}),
            json!({"ZIP": "C", "score": 2}),
            json!({"ZIP": "C", "Record Date": "2024-02-11"}),
        ])
    }

    #[test]
    fn three_records_per_region() {
        let registry = abc();
        let stats = aggregate(&nine_records(), registry.regions());

        let a = stats["A"];
        assert_eq!(a.volume, 3);
        assert_eq!(a.total_score, 60.0);
        assert_eq!(a.average_score, 20);
        assert_eq!(a.recent_count, 1);

        let b = stats["B"];
        assert_eq!(b.volume, 3);
        assert_eq!(b.average_score, 2);
        assert_eq!(b.recent_count, 1);

        let c = stats["C"];
        assert_eq!(c.volume, 3);
        assert_eq!(c.total_score, 3.0);
        assert_eq!(c.average_score, 1);
    }

    #[test]
    fn every_region_is_present_even_without_records() {
        let stats = aggregate(&[], registry().regions());
        assert_eq!(stats.len(), registry().len());
        for region in registry().regions() {
            assert_eq!(stats[region.id], RegionStats::default());
        }
    }

    #[test]
    fn average_score_invariant_holds() {
        let registry = abc();
        let input = records(vec![
            json!({"_zip": "A", "_score": 1}),
            json!({"_zip": "A", "_score": 2}),
            json!({"_zip": "B", "_score": 7}),
            json!({"_zip": "B", "_score": 8}),
            json!({"_zip": "B", "_score": "x"}),
        ]);
        let stats = aggregate(&input, registry.regions());
        for entry in stats.values() {
            if entry.volume == 0 {
                assert_eq!(entry.average_score, 0);
            } else {
                assert_eq!(
                    entry.average_score,
                    round_half_up(entry.total_score / entry.volume as f64)
                );
            }
        }
        // 1.5 rounds up, 5.0 stays.
        assert_eq!(stats["A"].average_score, 2);
        assert_eq!(stats["B"].average_score, 5);
        assert_eq!(stats["C"].average_score, 0);
    }

    #[test]
    fn reordering_records_does_not_change_result() {
        let registry = abc();
        let forward = nine_records();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(4);

        let expected = aggregate(&forward, registry.regions());
        assert_eq!(aggregate(&reversed, registry.regions()), expected);
        assert_eq!(aggregate(&rotated, registry.regions()), expected);
    }

    #[test]
    fn fractional_scores_total_the_same_in_any_order() {
        let registry = abc();
        let scores = [0.1, 0.2, 0.3, 0.7, 1.15];
        let build = |order: &[usize]| {
            records(
                order
                    .iter()
                    .map(|&i| json!({"_zip": "A", "_score": scores[i]}))
                    .collect(),
            )
        };

        let expected = aggregate(&build(&[0, 1, 2, 3, 4]), registry.regions());
        for order in [
            [4, 3, 2, 1, 0],
            [2, 0, 4, 1, 3],
            [1, 4, 0, 3, 2],
            [3, 2, 1, 4, 0],
        ] {
            let stats = aggregate(&build(&order), registry.regions());
            assert_eq!(
                stats["A"].total_score.to_bits(),
                expected["A"].total_score.to_bits(),
                "order {order:?}"
            );
            assert_eq!(stats, expected);
        }
        assert!((expected["A"].total_score - 2.45).abs() < 1e-9);
        assert_eq!(expected["A"].average_score, 0);

        let small = aggregate(&build(&[0, 1, 2]), registry.regions());
        let small_rev = aggregate(&build(&[2, 1, 0]), registry.regions());
        assert_eq!(
            small["A"].total_score.to_bits(),
            small_rev["A"].total_score.to_bits()
        );
    }

    #[test]
    fn unknown_regions_affect_nothing() {
        let registry = abc();
        let baseline = aggregate(&nine_records(), registry.regions());

        let mut noisy = nine_records();
        noisy.extend(records(vec![
            json!({"_zip": "Z", "_score": 1000, "_type": "Last 90 Days"}),
            json!({"zip": "A", "_score": 1000}),
            json!({"_score": 1000}),
        ]));
        let report = aggregate_with_report(&noisy, registry.regions());
        assert_eq!(report.stats, baseline);
        assert_eq!(report.matched, 9);
        assert_eq!(report.ignored, 3);
    }

    #[test]
    fn metric_selects_stat_field() {
        let stats = RegionStats {
            volume: 9,
            recent_count: 4,
            total_score: 0.0,
            average_score: 0,
        };
        assert_eq!(stats.value(Metric::Volume), 9);
        assert_eq!(stats.value(Metric::Growth), 4);
    }

    #[test]
    fn stats_serialize_in_camel_case() {
        let value = serde_json::to_value(RegionStats {
            volume: 1,
            recent_count: 1,
            total_score: 12.0,
            average_score: 12,
        })
        .expect("stats should serialize");
        assert_eq!(
            value,
            json!({"volume": 1, "recentCount": 1, "totalScore": 12.0, "averageScore": 12})
        );
    }
}
