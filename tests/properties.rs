//! Property tests for filtering, aggregation and export over generated datasets.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;

use defect_dashboard::data::aggregate::{risk_ranking, summarize, DashboardViews, ViewOptions};
use defect_dashboard::data::export::write_csv;
use defect_dashboard::data::filter::{apply, FilterSpec};
use defect_dashboard::data::loader::{load_bytes, SourceFormat};
use defect_dashboard::data::model::{Dimension, RawRow, Record};

static MODULES: [&str; 4] = ["Authentication", "Payment Gateway", "Reporting", "Database"];
static SEVERITIES: [&str; 5] = ["Critical", "Major", "Minor", "Low", "Trivial"];
static STATUSES: [&str; 6] = ["Open", "In Progress", "Resolved", "Closed", "Reopened", "Deferred"];

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date") + Duration::days(offset)
}

/// A date cell, with a time of day (millisecond precision) when `ms` is set.
fn stamp(offset: i64, ms: Option<i64>) -> String {
    match ms {
        None => day(offset).to_string(),
        Some(ms) => (day(offset).and_time(NaiveTime::MIN) + Duration::milliseconds(ms))
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
    }
}

fn vocabulary(dim: Dimension) -> &'static [&'static str] {
    match dim {
        Dimension::Severity => &SEVERITIES,
        Dimension::Status => &STATUSES,
        Dimension::Module => &MODULES,
    }
}

fn raw_row(id: usize, module: &str, severity: &str, status: &str, reported: &str, resolved: &str) -> RawRow {
    [
        ("defect_id", format!("DEF-{id:04}")),
        ("module", module.to_string()),
        ("severity", severity.to_string()),
        ("status", status.to_string()),
        ("reported_date", reported.to_string()),
        ("resolved_date", resolved.to_string()),
        ("priority", "Medium".to_string()),
        ("assigned_to", "Chris Lee".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

prop_compose! {
    fn arb_record()(
        id in 1usize..10_000,
        module in prop::sample::select(&MODULES[..]),
        severity in prop::sample::select(&SEVERITIES[..]),
        status in prop::sample::select(&STATUSES[..]),
        reported in prop::option::weighted(0.9, 0i64..365),
        reported_ms in prop::option::of(0i64..86_400_000),
        resolved_after in prop::option::of(-5i64..90),
        resolved_ms in prop::option::of(0i64..86_400_000),
    ) -> Record {
        let reported_text = reported.map(|d| stamp(d, reported_ms)).unwrap_or_default();
        let resolved_text = match (reported, resolved_after) {
            (Some(d), Some(after)) => stamp(d + after, resolved_ms),
            _ => String::new(),
        };
        let row = raw_row(id, module, severity, status, &reported_text, &resolved_text);
        Record::from_row(id, &row).expect("generated rows carry every column").0
    }
}

fn arb_subset(values: &'static [&'static str]) -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(values, 0..=values.len())
        .prop_map(|v| v.into_iter().map(str::to_string).collect())
}

prop_compose! {
    fn arb_spec()(
        severity in arb_subset(&SEVERITIES),
        status in arb_subset(&STATUSES),
        module in arb_subset(&MODULES),
        range in prop::option::of((0i64..365, 0i64..120)),
    ) -> FilterSpec {
        let spec = FilterSpec { severity, status, module, date_range: None };
        match range {
            Some((start, len)) => spec.with_date_range(day(start), day(start + len)),
            None => spec,
        }
    }
}

fn ids(records: &[&Record]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

proptest! {
    #[test]
    fn filtering_twice_changes_nothing(
        records in prop::collection::vec(arb_record(), 0..60),
        spec in arb_spec(),
    ) {
        let once = apply(&records, &spec);
        let twice = apply(once.iter().copied(), &spec);
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn adding_a_value_never_removes_records(
        records in prop::collection::vec(arb_record(), 0..60),
        spec in arb_spec(),
        dim in prop::sample::select(Dimension::ALL.to_vec()),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!spec.selected(dim).is_empty());
        let mut wider = spec.clone();
        wider.selected_mut(dim).insert(pick.get(vocabulary(dim)).to_string());

        let narrow: BTreeSet<String> = ids(&apply(&records, &spec)).into_iter().collect();
        let wide: BTreeSet<String> = ids(&apply(&records, &wider)).into_iter().collect();
        prop_assert!(narrow.is_subset(&wide));
    }

    #[test]
    fn widening_the_date_range_never_removes_records(
        records in prop::collection::vec(arb_record(), 0..60),
        spec in arb_spec(),
        earlier in 0i64..60,
        later in 0i64..60,
    ) {
        let Some(range) = spec.date_range else {
            return Ok(());
        };
        let wider = spec
            .clone()
            .with_date_range(range.start - Duration::days(earlier), range.end + Duration::days(later));
        let mut unbounded = spec.clone();
        unbounded.date_range = None;

        let narrow: BTreeSet<String> = ids(&apply(&records, &spec)).into_iter().collect();
        let wide: BTreeSet<String> = ids(&apply(&records, &wider)).into_iter().collect();
        let all_dates: BTreeSet<String> = ids(&apply(&records, &unbounded)).into_iter().collect();
        prop_assert!(narrow.is_subset(&wide));
        prop_assert!(wide.is_subset(&all_dates));
    }

    #[test]
    fn empty_spec_keeps_everything_in_order(records in prop::collection::vec(arb_record(), 0..60)) {
        let kept = apply(&records, &FilterSpec::default());
        prop_assert_eq!(kept.len(), records.len());
        let expected: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        prop_assert_eq!(ids(&kept), expected);
    }

    #[test]
    fn filtered_records_satisfy_every_dimension(
        records in prop::collection::vec(arb_record(), 0..60),
        spec in arb_spec(),
    ) {
        for rec in apply(&records, &spec) {
            for dim in Dimension::ALL {
                let selected = spec.selected(dim);
                prop_assert!(selected.is_empty() || selected.contains(dim.value(rec)));
            }
            if let Some(range) = spec.date_range {
                let reported = rec.reported_at().map(|d| d.date());
                prop_assert!(reported.is_some_and(|d| range.contains(d)));
            }
        }
    }

    #[test]
    fn summary_buckets_are_consistent(records in prop::collection::vec(arb_record(), 0..60)) {
        let summary = summarize(&records);
        prop_assert_eq!(summary.total, records.len());
        prop_assert!(summary.open + summary.closed <= summary.total);
        prop_assert!(summary.critical + summary.major + summary.minor <= summary.total);

        let has_resolution = records.iter().any(|r| r.resolution_days().is_some());
        prop_assert_eq!(summary.mean_resolution_days.is_some(), has_resolution);
    }

    #[test]
    fn view_counts_add_up(records in prop::collection::vec(arb_record(), 0..60)) {
        let views = DashboardViews::compute(&records, &ViewOptions::default());
        let severity_total: usize = views.severity.iter().map(|c| c.count).sum();
        let status_total: usize = views.status.iter().map(|c| c.count).sum();
        let timeline_total: usize = views.timeline.iter().map(|m| m.count).sum();
        let dated = records.iter().filter(|r| r.reported_month().is_some()).count();

        prop_assert_eq!(severity_total, records.len());
        prop_assert_eq!(status_total, records.len());
        prop_assert_eq!(timeline_total, dated);
        prop_assert!(views.modules.len() <= 8);
        prop_assert!(views.timeline.windows(2).all(|w| w[0].month < w[1].month));
    }

    #[test]
    fn risk_ranking_is_ordered(records in prop::collection::vec(arb_record(), 0..60)) {
        let ranking = risk_ranking(&records, 10);
        prop_assert!(ranking.len() <= 10);
        for pair in ranking.windows(2) {
            let key = |r: &defect_dashboard::data::aggregate::ModuleRisk| (r.critical_count, r.total_high_severity);
            prop_assert!(key(&pair[0]) >= key(&pair[1]));
            if key(&pair[0]) == key(&pair[1]) {
                prop_assert!(pair[0].module < pair[1].module);
            }
        }
        for risk in &ranking {
            prop_assert!(risk.critical_count <= risk.total_high_severity);
            prop_assert!(risk.total_high_severity > 0);
        }
    }

    #[test]
    fn export_reloads_to_the_same_records(records in prop::collection::vec(arb_record(), 1..40)) {
        let mut buf = Vec::new();
        let written = write_csv(&mut buf, &records, &[]).expect("write to memory");
        prop_assert_eq!(written, records.len());

        let reloaded = load_bytes(&buf, SourceFormat::Csv).expect("exported CSV reloads");
        prop_assert_eq!(reloaded.records(), &records[..]);
    }
}
