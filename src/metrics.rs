use crate::graph::HoverState;
use crate::record::Record;
use serde::Serialize;

/// Formats a population count for a metric card
///
/// `>= 1e9` renders as `"X.XXB"`, `>= 1e6` as `"X.XM"`, `>= 1e3` as `"X.XK"`,
/// anything smaller as a whole number.
///
/// # Examples
/// ```
/// use dashboard::metrics::format_population;
///
/// assert_eq!(format_population(1_417_492_000.0), "1.42B");
/// assert_eq!(format_population(950.0), "950");
/// ```
pub fn format_population(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

/// India's share of the world population in percent, 0 when the world value is 0
pub fn population_share(india: f64, world: f64) -> f64 {
    if world == 0.0 {
        0.0
    } else {
        india / world * 100.0
    }
}

/// Summary cards shown next to the chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricCards {
    /// Name of the record the cards describe
    pub label: String,
    /// Whether the cards follow the hovered record rather than the latest one
    pub from_hover: bool,
    pub india: f64,
    pub world: f64,
    pub share: f64,
    pub india_display: String,
    pub world_display: String,
    pub share_display: String,
}

impl MetricCards {
    pub fn for_record(record: &Record, from_hover: bool) -> Self {
        let india = record.value_or_zero("india");
        let world = record.value_or_zero("world");
        let share = population_share(india, world);
        MetricCards {
            label: record.name.clone(),
            from_hover,
            india,
            world,
            share,
            india_display: format_population(india),
            world_display: format_population(world),
            share_display: format!("{:.2}%", share),
        }
    }
}

/// Cards for the hovered record, or the last record when nothing is hovered
///
/// Returns `None` for an empty sequence.
pub fn metric_cards(records: &[Record], hover: &HoverState) -> Option<MetricCards> {
    match hover.record(records) {
        Some(record) => Some(MetricCards::for_record(record, true)),
        None => records.last().map(|r| MetricCards::for_record(r, false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_thresholds() {
        assert_eq!(format_population(1e9), "1.00B");
        assert_eq!(format_population(8_045_311_447.0), "8.05B");
        assert_eq!(format_population(999_999_999.0), "1000.0M");
        assert_eq!(format_population(1e6), "1.0M");
        assert_eq!(format_population(12_345.0), "12.3K");
        assert_eq!(format_population(1e3), "1.0K");
        assert_eq!(format_population(999.0), "999");
        assert_eq!(format_population(0.0), "0");
    }

    #[test]
    fn share_guards_against_zero_world() {
        assert_eq!(population_share(5.0, 0.0), 0.0);
        assert_eq!(population_share(1.0, 4.0), 25.0);
    }

    #[test]
    fn cards_follow_hover_then_fall_back_to_last() {
        let records = vec![
            Record::new("1990").with("india", 870e6).with("world", 5.3e9),
            Record::new("2020").with("india", 1.38e9).with("world", 7.8e9),
        ];

        let latest = metric_cards(&records, &HoverState::default()).unwrap();
        assert_eq!(latest.label, "2020");
        assert!(!latest.from_hover);
        assert_eq!(latest.india_display, "1.38B");
        assert_eq!(latest.world_display, "7.80B");
        assert_eq!(latest.share_display, "17.69%");

        let hovered = metric_cards(&records, &HoverState::new(Some(0))).unwrap();
        assert_eq!(hovered.label, "1990");
        assert!(hovered.from_hover);
        assert_eq!(hovered.india_display, "870.0M");

        let stale = metric_cards(&records, &HoverState::new(Some(9))).unwrap();
        assert_eq!(stale.label, "2020");
    }

    #[test]
    fn missing_series_read_as_zero() {
        let records = vec![Record::new("x").with("value", 3.0)];
        let cards = metric_cards(&records, &HoverState::default()).unwrap();
        assert_eq!(cards.share, 0.0);
        assert_eq!(cards.india_display, "0");
        assert!(metric_cards(&[], &HoverState::default()).is_none());
    }
}
