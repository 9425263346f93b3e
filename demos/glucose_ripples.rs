//! Glucose ripples: segment a CGM trace, compare excursion shapes, and relate
//! insulin doses to the peaks and troughs around them.
//!
//! The trace is two days of 5-minute readings built from a ~6 hour oscillation
//! with a slower daily drift. Fast-acting doses are given shortly before each
//! rise; a slow-acting dose is given once per day.
//!
//! Run with: cargo run --release --example glucose_ripples

use chrono::{NaiveDate, TimeDelta};
use ripple_rs::{AnalysisConfig, GlucoseAnalyzer, InsulinEvent, InsulinKind, Sample};

const CONFIG: &str = r#"
threshold = 1
min_run_length = 30
tolerance = 0.05
containment = "span"
"#;

fn main() {
    let t0 = NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let n = 2 * 288;
    let samples: Vec<Sample> = (0..n)
        .map(|i| {
            let t = i as f64;
            let v = 135.0
                + 50.0 * (t * std::f64::consts::TAU / 74.0).sin()
                + 20.0 * (t * std::f64::consts::TAU / 288.0).cos()
                + 3.0 * (t * 0.9).sin();
            Sample::new(t0 + TimeDelta::minutes(5 * i as i64), v.round())
        })
        .collect();

    let mut insulin: Vec<InsulinEvent> = (0..8)
        .map(|k| {
            InsulinEvent::new(
                t0 + TimeDelta::minutes(5 * (74 * k as i64 + 60)),
                InsulinKind::FastActing,
                4.0 + k as f64 * 0.5,
            )
        })
        .collect();
    insulin.push(InsulinEvent::new(t0 + TimeDelta::hours(21), InsulinKind::SlowActing, 18.0));
    insulin.push(InsulinEvent::new(t0 + TimeDelta::hours(45), InsulinKind::SlowActing, 18.0));
    insulin.sort_by_key(|e| e.timestamp);

    let config = AnalysisConfig::from_toml_str(CONFIG).unwrap();
    println!("Glucose Ripples");
    println!("===============");
    println!("Samples: {} (5-minute CGM)", samples.len());
    println!("Insulin events: {}", insulin.len());
    println!(
        "threshold={}, min_run_length={}, tolerance={}\n",
        config.threshold, config.min_run_length, config.tolerance
    );

    let report = GlucoseAnalyzer::new(config)
        .analyze(&samples, &insulin)
        .unwrap();

    println!("Found {} excursions\n", report.len());
    for (i, ex) in report.excursions().iter().enumerate() {
        println!("Excursion {i} ({} samples)", ex.len());
        println!("{ex}");
    }

    println!("Similarity");
    println!("----------");
    for line in report.graph().summary_lines() {
        match line {
            Some(line) => println!("  {line}"),
            None => println!("  no comparable excursion"),
        }
    }

    println!("\nDuration buckets (hours): {:?}", report.duration_buckets());

    println!("\nInsulin");
    println!("-------");
    println!(
        "{:>4}  {:>9}  {:>22}  {:>22}",
        "Exc", "Direction", "Fast (from max / to min)", "Slow (from max / to min)"
    );
    println!("{:-<64}", "");
    for stats in report.stats() {
        let render = |o: Option<ripple_rs::InsulinOffsets>| match o {
            Some(o) => format!("{} / {}", o.from_max, o.to_min),
            None => "-".to_string(),
        };
        println!(
            "{:>4}  {:>9}  {:>22}  {:>22}",
            stats.index,
            if stats.is_ascending { "up" } else { "down" },
            render(stats.fast_offsets),
            render(stats.slow_offsets),
        );
    }

    println!("\nJSON export of the first excursion:");
    if let Some(stats) = report.stats().first() {
        println!("{}", serde_json::to_string_pretty(stats).unwrap());
    }
}
