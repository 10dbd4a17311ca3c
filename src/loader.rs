use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::StringRecord;

use crate::record::{EventRecord, TIME_COLUMN, parse_time};

const DIMENSION_NAMES: &[&str] = &["dimension", "维度"];
const PLAYER_NAMES: &[&str] = &["player", "玩家"];
const ITEM_NAMES: &[&str] = &["item", "物品"];

/// Renames the first header cell to `time` whatever its bytes are (a BOM,
/// a mis-decoded BOM, or a localized name). Matching is by position only.
pub fn canonicalize_headers(headers: &StringRecord) -> StringRecord {
    match headers.get(0) {
        Some(first) if first != TIME_COLUMN => {
            let mut out = StringRecord::new();
            out.push_field(TIME_COLUMN);
            for h in headers.iter().skip(1) { out.push_field(h); }
            out
        }
        _ => headers.clone(),
    }
}

#[derive(Clone, Copy, Debug)]
struct Columns {
    time: usize,
    dimension: usize,
    x: usize,
    y: usize,
    z: usize,
    player: usize,
    item: Option<usize>,
}

fn find_named(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.iter().any(|n| h == *n || h.eq_ignore_ascii_case(n)))
}

fn require(headers: &StringRecord, names: &[&str]) -> Result<usize> {
    find_named(headers, names).with_context(|| format!("missing required column '{}'", names[0]))
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        if headers.is_empty() { bail!("input has no header row"); }
        Ok(Self {
            time: require(headers, &[TIME_COLUMN])?,
            dimension: require(headers, DIMENSION_NAMES)?,
            x: require(headers, &["X"])?,
            y: require(headers, &["Y"])?,
            z: require(headers, &["Z"])?,
            player: require(headers, PLAYER_NAMES)?,
            item: find_named(headers, ITEM_NAMES),
        })
    }
}

/// Empty cells load as `None`; any other non-numeric text is an error.
fn parse_coord(rec: &StringRecord, idx: usize, name: &str) -> Result<Option<f64>> {
    let raw = rec.get(idx).unwrap_or("");
    if raw.is_empty() { return Ok(None); }
    raw.parse::<f64>().map(Some).with_context(|| format!("column {} is not a number: '{}'", name, raw))
}

fn to_event(rec: &StringRecord, cols: &Columns) -> Result<EventRecord> {
    Ok(EventRecord {
        time: rec.get(cols.time).and_then(parse_time),
        dimension: rec.get(cols.dimension).unwrap_or("").to_string(),
        x: parse_coord(rec, cols.x, "X")?,
        y: parse_coord(rec, cols.y, "Y")?,
        z: parse_coord(rec, cols.z, "Z")?,
        player: rec.get(cols.player).unwrap_or("").to_string(),
        item: cols.item.and_then(|i| rec.get(i)).unwrap_or("").to_lowercase(),
    })
}

/// Reads the whole CSV into memory. Any malformed row aborts the load.
pub fn load_events(path: &Path, progress: bool) -> Result<Vec<EventRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening input {}", path.display()))?;
    let headers = canonicalize_headers(rdr.headers().with_context(|| format!("reading header of {}", path.display()))?);
    let cols = Columns::resolve(&headers).with_context(|| format!("bad header in {}", path.display()))?;
    log::debug!("Columns resolved: {:?}", cols);
    let pb = if progress { Some(indicatif::ProgressBar::new_spinner()) } else { None };
    if let Some(ref pb) = pb { pb.set_message(format!("Loading {}", path.display())); }
    let mut events = Vec::new();
    let mut bad_times = 0usize;
    for (i, rec) in rdr.records().enumerate() {
        let row = i + 1;
        let rec = rec.with_context(|| format!("{}: malformed data row {}", path.display(), row))?;
        let ev = to_event(&rec, &cols).with_context(|| format!("{}: malformed data row {}", path.display(), row))?;
        if ev.time.is_none() { bad_times += 1; }
        events.push(ev);
        if let Some(ref pb) = pb && row % 500 == 0 { pb.tick(); pb.set_message(format!("Loaded {} rows", row)); }
    }
    if let Some(pb) = pb { pb.finish_and_clear(); }
    if bad_times > 0 { log::debug!("{} rows have an unparseable timestamp", bad_times); }
    log::info!("Loaded {} rows from {}", events.len(), path.display());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn canonicalize_renames_bom_header() {
        let h = StringRecord::from(vec!["\u{feff}time", "dimension", "X"]);
        let c = canonicalize_headers(&h);
        assert_eq!(c.get(0), Some("time"));
        assert_eq!(c.get(1), Some("dimension"));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn canonicalize_renames_mojibake_header() {
        let h = StringRecord::from(vec!["ï»¿时间", "维度"]);
        assert_eq!(canonicalize_headers(&h).get(0), Some("time"));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let h = StringRecord::from(vec!["time", "dimension", "X", "Y", "Z", "player", "item"]);
        let once = canonicalize_headers(&h);
        assert_eq!(once, h);
        assert_eq!(canonicalize_headers(&once), once);
    }

    #[test]
    fn loads_english_headers() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "a.csv", "\u{feff}time,dimension,X,Y,Z,player,item\n2025-11-15 10:00:00,主世界,100.0,64,-50.5,Alice,Shulker_Box×4\n");
        let ev = load_events(&p, false).unwrap();
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].time.unwrap().to_string(), "2025-11-15 10:00:00");
        assert_eq!(ev[0].dimension, "主世界");
        assert_eq!(ev[0].z, Some(-50.5));
        assert_eq!(ev[0].player, "Alice");
        assert_eq!(ev[0].item, "shulker_box×4");
    }

    #[test]
    fn loads_chinese_headers_and_spaced_cells() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "b.csv", "时间,维度,X,Y,Z,玩家,物品\n2025-11-15 10:00:00, 下界, 1.5, 2, 3, Bob, DIAMOND\n");
        let ev = load_events(&p, false).unwrap();
        assert_eq!(ev[0].dimension, "下界");
        assert_eq!(ev[0].x, Some(1.5));
        assert_eq!(ev[0].item, "diamond");
    }

    #[test]
    fn bad_timestamp_becomes_none_and_empty_item_is_blank() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "c.csv", "time,dimension,X,Y,Z,player,item\nnot-a-time,主世界,0,0,0,Carol,\n");
        let ev = load_events(&p, false).unwrap();
        assert!(ev[0].time.is_none());
        assert_eq!(ev[0].item, "");
    }

    #[test]
    fn missing_item_column_defaults_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "d.csv", "time,dimension,X,Y,Z,player\n2025-11-15 10:00:00,主世界,0,0,0,Dan\n");
        let ev = load_events(&p, false).unwrap();
        assert_eq!(ev[0].item, "");
    }

    #[test]
    fn wrong_arity_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "e.csv", "time,dimension,X,Y,Z,player,item\n2025-11-15 10:00:00,主世界,0,0\n");
        let err = load_events(&p, false).unwrap_err();
        assert!(format!("{:#}", err).contains("data row 1"));
    }

    #[test]
    fn non_numeric_coordinate_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "f.csv", "time,dimension,X,Y,Z,player,item\n2025-11-15 10:00:00,主世界,0,0,0,A,x\n2025-11-15 10:00:00,主世界,abc,0,0,B,y\n");
        let msg = format!("{:#}", load_events(&p, false).unwrap_err());
        assert!(msg.contains("data row 2"));
        assert!(msg.contains("column X"));
        assert_eq!(msg.matches("data row").count(), 1);
    }

    #[test]
    fn empty_coordinate_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "h.csv", "time,dimension,X,Y,Z,player,item
2025-11-15 10:00:00,主世界,1,2,3,A,x
2025-11-15 10:00:00,下界,,2,3,B,dirt
");
        let ev = load_events(&p, false).unwrap();
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[1].x, None);
        assert_eq!(ev[1].y, Some(2.0));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_csv(&dir, "g.csv", "time,X,Y,Z,player,item\n");
        let msg = format!("{:#}", load_events(&p, false).unwrap_err());
        assert!(msg.contains("dimension"));
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nope.csv");
        let msg = format!("{:#}", load_events(&p, false).unwrap_err());
        assert!(msg.contains("nope.csv"));
    }
}
