use crate::config::FilterConfig;
use crate::record::EventRecord;

pub fn pass_dimension(cfg: &FilterConfig, dimension: &str) -> bool { dimension == cfg.dimension }

/// A missing coordinate is outside every range.
pub fn pass_region(cfg: &FilterConfig, e: &EventRecord) -> bool {
    e.x.is_some_and(|v| cfg.x_range.contains(v))
        && e.y.is_some_and(|v| cfg.y_range.contains(v))
        && e.z.is_some_and(|v| cfg.z_range.contains(v))
}

/// Rows without a parsed timestamp never fall inside the window.
pub fn pass_time(cfg: &FilterConfig, e: &EventRecord) -> bool {
    e.time.is_some_and(|t| cfg.time_range.contains(t))
}

/// Order-preserving subset of `events` that satisfies every constraint.
pub fn filter_events(events: &[EventRecord], cfg: &FilterConfig) -> Vec<EventRecord> {
    let out: Vec<EventRecord> = events
        .iter()
        .filter(|e| pass_dimension(cfg, &e.dimension) && pass_region(cfg, e) && pass_time(cfg, e))
        .cloned()
        .collect();
    log::info!("{} of {} rows pass the filter", out.len(), events.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Range;
    use crate::record::parse_time;

    fn cfg() -> FilterConfig {
        FilterConfig {
            dimension: "主世界".to_string(),
            x_range: Range { min: -10.0, max: 10.0 },
            y_range: Range { min: 0.0, max: 100.0 },
            z_range: Range { min: -5.0, max: 5.0 },
            time_range: Range { min: parse_time("2025-11-15 10:00:00").unwrap(), max: parse_time("2025-11-15 12:00:00").unwrap() },
            ..Default::default()
        }
    }

    fn ev(time: &str, dim: &str, x: f64, y: f64, z: f64, player: &str) -> EventRecord {
        EventRecord { time: parse_time(time), dimension: dim.to_string(), x: Some(x), y: Some(y), z: Some(z), player: player.to_string(), item: String::new() }
    }

    #[test]
    fn boundaries_are_inclusive() {
        let c = cfg();
        let rows = vec![
            ev("2025-11-15 10:00:00", "主世界", -10.0, 0.0, -5.0, "lo"),
            ev("2025-11-15 12:00:00", "主世界", 10.0, 100.0, 5.0, "hi"),
        ];
        let out = filter_events(&rows, &c);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn just_outside_each_bound_is_excluded() {
        let c = cfg();
        let rows = vec![
            ev("2025-11-15 09:59:59", "主世界", 0.0, 50.0, 0.0, "early"),
            ev("2025-11-15 12:00:01", "主世界", 0.0, 50.0, 0.0, "late"),
            ev("2025-11-15 11:00:00", "主世界", 10.01, 50.0, 0.0, "x"),
            ev("2025-11-15 11:00:00", "主世界", 0.0, -0.01, 0.0, "y"),
            ev("2025-11-15 11:00:00", "主世界", 0.0, 50.0, 5.5, "z"),
            ev("2025-11-15 11:00:00", "下界", 0.0, 50.0, 0.0, "dim"),
        ];
        assert!(filter_events(&rows, &c).is_empty());
    }

    #[test]
    fn null_timestamp_always_excluded() {
        let c = cfg();
        let rows = vec![ev("garbage", "主世界", 0.0, 50.0, 0.0, "n")];
        assert!(filter_events(&rows, &c).is_empty());
    }

    #[test]
    fn missing_coordinate_excluded() {
        let c = cfg();
        let mut row = ev("2025-11-15 11:00:00", "主世界", 0.0, 50.0, 0.0, "blank");
        assert_eq!(filter_events(std::slice::from_ref(&row), &c).len(), 1);
        row.x = None;
        assert!(filter_events(std::slice::from_ref(&row), &c).is_empty());
        row.x = Some(0.0);
        row.z = None;
        assert!(!pass_region(&c, &row));
    }

    #[test]
    fn output_is_ordered_verbatim_subset() {
        let c = cfg();
        let rows = vec![
            ev("2025-11-15 11:00:00", "主世界", 1.0, 1.0, 1.0, "a"),
            ev("2025-11-15 11:00:00", "下界", 1.0, 1.0, 1.0, "b"),
            ev("2025-11-15 10:30:00", "主世界", 2.0, 2.0, 2.0, "c"),
            ev("bad", "主世界", 3.0, 3.0, 3.0, "d"),
            ev("2025-11-15 11:30:00", "主世界", 4.0, 4.0, 4.0, "e"),
        ];
        let out = filter_events(&rows, &c);
        let names: Vec<&str> = out.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "e"]);
        let mut last = 0;
        for o in &out {
            let pos = rows.iter().position(|r| r == o).unwrap();
            assert!(pos >= last);
            last = pos;
        }
    }

    #[test]
    fn dimension_match_is_exact() {
        let c = cfg();
        assert!(pass_dimension(&c, "主世界"));
        assert!(!pass_dimension(&c, "主世界 "));
        assert!(!pass_dimension(&c, ""));
    }
}
