use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{ContentArrangement, Table};

use crate::config::Palette;
use crate::record::{ClassifiedRecord, format_coord, format_player, format_time};

const HEADER: [&str; 8] = ["time", "dimension", "X", "Y", "Z", "player", "item", "has_target_item"];

pub fn write_csv(path: &Path, rows: &[ClassifiedRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(HEADER)?;
    for c in rows {
        let e = &c.record;
        wtr.write_record([
            format_time(e.time),
            e.dimension.clone(),
            e.x.map(|v| v.to_string()).unwrap_or_default(),
            e.y.map(|v| v.to_string()).unwrap_or_default(),
            e.z.map(|v| v.to_string()).unwrap_or_default(),
            e.player.clone(),
            e.item.clone(),
            c.has_target_item.to_string(),
        ])?;
    }
    wtr.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn write_ndjson(path: &Path, rows: &[ClassifiedRecord]) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?);
    for c in rows {
        let line = serde_json::to_string(c)?;
        writeln!(file, "{}", line).with_context(|| format!("writing {}", path.display()))?;
    }
    file.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn build_preview(rows: &[ClassifiedRecord], limit: usize, palette: &Palette) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Time", "Player", "X", "Y", "Z", "Item"].map(|h| crate::paint(h, "1")));
    for c in rows.iter().take(limit) {
        let e = &c.record;
        let code = if c.has_target_item { palette.matched.code() } else { palette.unmatched.code() };
        table.add_row(vec![
            format_time(e.time),
            format_player(&e.player).to_string(),
            format_coord(e.x),
            format_coord(e.y),
            format_coord(e.z),
            crate::paint(&e.item, code),
        ]);
    }
    table
}

pub fn print_preview(rows: &[ClassifiedRecord], limit: usize, palette: &Palette) {
    println!("{}", build_preview(rows, limit, palette));
    if rows.len() > limit { println!("{}", crate::paint(&format!("... {} more rows", rows.len() - limit), "2")); }
}
