use crate::config::MatchMode;
use crate::record::{ClassifiedRecord, EventRecord};

/// Literal, case-insensitive substring test. `targets` must already be lowercase.
/// An empty target list never matches.
pub fn has_target_item(item: &str, targets: &[String], mode: MatchMode) -> bool {
    if targets.is_empty() { return false; }
    let item = item.to_lowercase();
    match mode {
        MatchMode::Any => targets.iter().any(|t| item.contains(t.as_str())),
        MatchMode::All => targets.iter().all(|t| item.contains(t.as_str())),
    }
}

pub fn classify(events: Vec<EventRecord>, targets: &[String], mode: MatchMode) -> Vec<ClassifiedRecord> {
    let out: Vec<ClassifiedRecord> = events
        .into_iter()
        .map(|record| {
            let has_target_item = has_target_item(&record.item, targets, mode);
            ClassifiedRecord { record, has_target_item }
        })
        .collect();
    log::debug!("{} of {} rows contain a target item ({:?})", out.iter().filter(|c| c.has_target_item).count(), out.len(), mode);
    out
}
