use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum, ColorChoice, ArgAction, CommandFactory};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use is_terminal::IsTerminal;
mod config;
mod record;
mod loader;
mod filter;
mod classify;
mod render;
mod export;

use config::{AnsiColor, FileConfig, FilterConfig, LogFormat, MatchMode, Palette, Range};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Parser, Debug)]
#[command(
    name = "ItemTrace",
    about = "Filter player item events by region, time window and dimension",
    long_about = "Filter a CSV log of player item events by dimension, X/Y/Z region and time window, then write each surviving row as an ANSI-colored line, highlighting rows that carry a target item.",
    after_long_help = "Examples:\n  ItemTrace -i data.csv -o output.txt\n  ItemTrace --dimension 下界 --x-min -500 --x-max 500 --since \"2025-11-14 19:12:30\" --until \"2025-11-15 21:14:00\"\n  ItemTrace --targets shulker_box,elytra --match-mode any --preview\n  ItemTrace --config ItemTrace.toml --csv-path rows.csv --ndjson-path rows.ndjson",
    color = ColorChoice::Auto
)]
struct Args {
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
    #[arg(long, short = 'd')]
    dimension: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    x_min: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    x_max: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    y_min: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    y_max: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    z_min: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    z_max: Option<f64>,
    /// Start of the time window, inclusive (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    since: Option<String>,
    /// End of the time window, inclusive (YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    until: Option<String>,
    /// Target item substrings, case-insensitive
    #[arg(long, short = 't', num_args = 0.., value_delimiter = ',')]
    targets: Vec<String>,
    #[arg(long, value_enum)]
    match_mode: Option<MatchMode>,
    #[arg(long, value_enum)]
    matched_color: Option<AnsiColor>,
    #[arg(long, value_enum)]
    unmatched_color: Option<AnsiColor>,
    #[arg(long)]
    csv_path: Option<PathBuf>,
    #[arg(long)]
    ndjson_path: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Print matching rows as a table")]
    preview: bool,
    #[arg(long, default_value_t = 20)]
    preview_limit: usize,
    #[arg(long, default_value_t = false)]
    progress: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            dimension: None,
            x_min: None,
            x_max: None,
            y_min: None,
            y_max: None,
            z_min: None,
            z_max: None,
            since: None,
            until: None,
            targets: vec![],
            match_mode: None,
            matched_color: None,
            unmatched_color: None,
            csv_path: None,
            ndjson_path: None,
            preview: false,
            preview_limit: 20,
            progress: false,
            config: None,
            completions: None,
            completions_out: None,
            verbose: 0,
            quiet: false,
            log_level: None,
            log_format: None,
            log_path: None,
            no_color: false,
            force_color: false,
        }
    }
}

fn main() {
    let args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "ItemTrace", &mut f); } else { clap_complete::generate(sh, &mut cmd, "ItemTrace", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "ItemTrace", &mut std::io::stdout());
        }
        return;
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);
    let (file_cfg, cfg_warning) = match config::load_file_config(args.config.as_deref()) {
        Ok(v) => v,
        Err(e) => { eprintln!("{}", paint(&format!("error: {:#}", e), "31")); std::process::exit(1); }
    };
    init_logger(&args, &file_cfg);
    if let Some(w) = cfg_warning { log::warn!("{}", w); }
    if let Err(e) = run(&args, &file_cfg) {
        log::debug!("{:?}", e);
        eprintln!("{}", paint(&format!("error: {:#}", e), "31"));
        std::process::exit(1);
    }
}

fn init_logger(args: &Args, file_cfg: &FileConfig) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if args.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if let Some(lvl) = args.log_level {
        let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
        builder.filter_level(f);
    } else if args.verbose > 0 {
        let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
        builder.filter_level(f);
    }
    if let Some(fmt) = args.log_format.or(file_cfg.log_format) {
        match fmt {
            LogFormat::Json => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().to_rfc3339();
                    let obj = serde_json::json!({
                        "ts": ts,
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    });
                    writeln!(buf, "{}", obj)
                });
            }
            LogFormat::Text => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().format("%H:%M:%S");
                    writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                });
            }
        }
    }
    if let Some(path) = args.log_path.as_ref().or(file_cfg.log_path.as_ref()) {
        match std::fs::File::create(path) {
            Ok(f) => {
                builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path, e);
            }
        }
    }
    builder.init();
}

/// Layers CLI flags over the TOML file over the built-in defaults.
fn build_config(args: &Args, file: &FileConfig) -> Result<FilterConfig> {
    let d = FilterConfig::default();
    let range = |name: &str, min: Option<f64>, fmin: Option<f64>, max: Option<f64>, fmax: Option<f64>, def: Range<f64>| {
        Range::new(name, min.or(fmin).unwrap_or(def.min), max.or(fmax).unwrap_or(def.max))
    };
    let x_range = range("X", args.x_min, file.x_min, args.x_max, file.x_max, d.x_range)?;
    let y_range = range("Y", args.y_min, file.y_min, args.y_max, file.y_max, d.y_range)?;
    let z_range = range("Z", args.z_min, file.z_min, args.z_max, file.z_max, d.z_range)?;
    let since = match args.since.as_deref().or(file.since.as_deref()) { Some(s) => config::parse_bound_field("since", s)?, None => d.time_range.min };
    let until = match args.until.as_deref().or(file.until.as_deref()) { Some(s) => config::parse_bound_field("until", s)?, None => d.time_range.max };
    let time_range = Range::new("time", since, until)?;
    let target_items = if !args.targets.is_empty() {
        config::normalize_targets(args.targets.iter().cloned())
    } else if let Some(t) = file.targets.as_ref() {
        config::normalize_targets(t.iter().cloned())
    } else {
        d.target_items
    };
    Ok(FilterConfig {
        input_path: args.input.clone().or_else(|| file.input.clone()).unwrap_or(d.input_path),
        output_path: args.output.clone().or_else(|| file.output.clone()).unwrap_or(d.output_path),
        dimension: args.dimension.clone().or_else(|| file.dimension.clone()).unwrap_or(d.dimension),
        x_range,
        y_range,
        z_range,
        time_range,
        target_items,
        match_mode: args.match_mode.or(file.match_mode).unwrap_or(d.match_mode),
        palette: Palette {
            matched: args.matched_color.or(file.matched_color).unwrap_or(d.palette.matched),
            unmatched: args.unmatched_color.or(file.unmatched_color).unwrap_or(d.palette.unmatched),
        },
    })
}

/// Load, filter, classify, render, write. Returns the number of rows written.
fn run(args: &Args, file_cfg: &FileConfig) -> Result<usize> {
    let cfg = build_config(args, file_cfg).context("invalid configuration")?;
    log::debug!("Effective configuration: {:?}", cfg);
    if cfg.target_items.is_empty() { log::warn!("No target items configured; every row will use the unmatched color"); }
    let events = loader::load_events(&cfg.input_path, args.progress)?;
    let filtered = filter::filter_events(&events, &cfg);
    let rows = classify::classify(filtered, &cfg.target_items, cfg.match_mode);
    let text = render::render_all(&rows, &cfg.palette);
    render::write_output(&cfg.output_path, &text)?;
    if let Some(p) = args.csv_path.as_ref().or(file_cfg.csv_path.as_ref()) {
        export::write_csv(p, &rows)?;
        log::info!("CSV written: {}", p.display());
    }
    if let Some(p) = args.ndjson_path.as_ref().or(file_cfg.ndjson_path.as_ref()) {
        export::write_ndjson(p, &rows)?;
        log::info!("NDJSON written: {}", p.display());
    }
    if args.preview && !args.quiet { export::print_preview(&rows, args.preview_limit, &cfg.palette); }
    if !args.quiet { println!("{}", paint(&summary_line(rows.len(), &cfg.output_path), "1;36")); }
    Ok(rows.len())
}

fn summary_line(rows: usize, output: &Path) -> String {
    format!("Saved {} rows to {}", rows, output.display())
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&true) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}
