use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{AnsiColor, Palette};
use crate::record::{ClassifiedRecord, format_coord, format_player, format_time};

pub const RESET: &str = "\x1b[0m";

pub fn render_line(c: &ClassifiedRecord) -> String {
    let e = &c.record;
    format!(
        "{} | player:{} | coordinates:({}, {}, {}) | item:{}",
        format_time(e.time), format_player(&e.player), format_coord(e.x), format_coord(e.y), format_coord(e.z), e.item
    )
}

pub fn escape(color: AnsiColor) -> String { format!("\x1b[{}m", color.code()) }

/// Wraps one line in its color and resets at the end so nothing bleeds over.
pub fn colorize(line: &str, matched: bool, palette: &Palette) -> String {
    let color = if matched { palette.matched } else { palette.unmatched };
    format!("{}{}{}", escape(color), line, RESET)
}

pub fn render_all(rows: &[ClassifiedRecord], palette: &Palette) -> String {
    rows.iter()
        .map(|c| colorize(&render_line(c), c.has_target_item, palette))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes to a sibling temp file and renames it over `path`, so an
/// interrupted run leaves the previous file untouched.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).with_context(|| format!("creating temp file for {}", path.display()))?;
    tmp.write_all(text.as_bytes()).with_context(|| format!("writing {}", path.display()))?;
    tmp.flush().with_context(|| format!("writing {}", path.display()))?;
    tmp.persist(path).map_err(|e| e.error).with_context(|| format!("replacing {}", path.display()))?;
    log::debug!("Wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}
