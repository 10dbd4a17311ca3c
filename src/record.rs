use chrono::NaiveDateTime;
use serde::Serialize;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical name of the first column after header canonicalization.
pub const TIME_COLUMN: &str = "time";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    #[serde(serialize_with = "serialize_time")]
    pub time: Option<NaiveDateTime>,
    pub dimension: String,
    /// `None` when the cell was empty.
    #[serde(rename = "X")]
    pub x: Option<f64>,
    #[serde(rename = "Y")]
    pub y: Option<f64>,
    #[serde(rename = "Z")]
    pub z: Option<f64>,
    pub player: String,
    pub item: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: EventRecord,
    pub has_target_item: bool,
}

pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT).ok()
}

pub fn format_time(t: Option<NaiveDateTime>) -> String {
    match t { Some(t) => t.format(TIME_FORMAT).to_string(), None => String::new() }
}

pub fn format_coord(v: Option<f64>) -> String {
    match v { Some(v) => format!("{:.2}", v), None => "None".to_string() }
}

/// An empty player cell is shown as `None`, like other absent values.
pub fn format_player(p: &str) -> &str {
    if p.is_empty() { "None" } else { p }
}

fn serialize_time<S: serde::Serializer>(t: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(_) => s.serialize_str(&format_time(*t)),
        None => s.serialize_none(),
    }
}
