#![deny(warnings)]

//! Headless CLI: load a parameter set, apply slider changes and print the
//! resulting metrics, breakeven sweeps and scenarios as text, CSV or JSON.

mod embedded;

use adsim_core::ParameterField;
use adsim_econ::SafetyLevel;
use adsim_export::{build_bundle, export_file_name, fixed, to_whole_units, whole};
use adsim_runtime::{Command, SimConfigFile, SimSnapshot, Simulator};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Table => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => bail!("unknown format: {other} (expected table, csv or json)"),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    sets: Vec<(ParameterField, f64)>,
    save: bool,
    format: OutputFormat,
    out: Option<String>,
    version: bool,
}

fn parse_assignment(s: &str) -> Result<(ParameterField, f64)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected field=value, got {s}"))?;
    let field: ParameterField = name.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid number for {field}: {value}"))?;
    Ok((field, value))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut parsed = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let c = it.next().ok_or_else(|| anyhow!("--config needs a name or path"))?;
                parsed.config = Some(c);
            }
            "--set" => {
                let a = it.next().ok_or_else(|| anyhow!("--set needs field=value"))?;
                parsed.sets.push(parse_assignment(&a)?);
            }
            "--save" => parsed.save = true,
            "--format" => {
                let f = it.next().ok_or_else(|| anyhow!("--format needs a value"))?;
                parsed.format = f.parse()?;
            }
            "--out" => {
                let o = it.next().ok_or_else(|| anyhow!("--out needs a path"))?;
                parsed.out = Some(o);
            }
            "--version" => parsed.version = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(parsed)
}

/// `--config` takes an embedded name (`baseline`, `high_ctr`) or a YAML path.
fn load_config(config: Option<&str>) -> Result<SimConfigFile> {
    let name = config.unwrap_or("baseline");
    let text = match embedded::get_yaml(name) {
        Some(text) => text.to_string(),
        None => std::fs::read_to_string(name).with_context(|| format!("reading config {name}"))?,
    };
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {name}"))
}

fn build_simulator(args: &Args) -> Result<Simulator> {
    let cfg = load_config(args.config.as_deref())?;
    let mut sim = Simulator::from_config(&cfg)?;
    for &(field, value) in &args.sets {
        sim.apply(Command::SetParameter { field, value })?;
    }
    if args.save {
        sim.apply(Command::SaveScenario)?;
    }
    Ok(sim)
}

fn render_text(snap: &SimSnapshot) -> String {
    let p = &snap.params;
    let m = &snap.metrics;
    let mut out = String::new();
    let _ = writeln!(out, "Parameters");
    for field in ParameterField::ALL {
        let _ = writeln!(out, "  {:<14} {}", field.label(), field.get(p));
    }
    let _ = writeln!(out, "\nMetrics");
    let rows = [
        ("Clicks", whole(m.clicks)),
        ("Impressions", whole(m.impressions)),
        ("Conversions", whole(m.conversions)),
        ("Revenue", whole(m.revenue)),
        ("ROAS", format!("{}x", fixed(m.roas, 2))),
        ("CPA", whole(m.cpa)),
        ("CPM", whole(m.cpm)),
        ("COGS", whole(m.cogs)),
        ("Gross Profit", whole(m.gross_profit)),
        ("Gross Margin", format!("{}%", fixed(m.gross_margin, 1))),
        ("Net Profit", whole(m.net_profit)),
        ("Net Margin", format!("{}%", fixed(m.net_margin, 1))),
        ("ROI", format!("{}%", whole(m.roi))),
        ("Breakeven ROAS", format!("{}x", fixed(m.breakeven_roas, 2))),
        ("Safety Margin", format!("{}% ({})", whole(m.safety_margin), snap.safety)),
        ("CTR-CPC Eff.", format!("{}%", whole(snap.ctr_cpc_efficiency))),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "  {:<14} {}", label, value);
    }
    match (&snap.loss_alert, snap.safety) {
        (Some(alert), _) => {
            let _ = writeln!(
                out,
                "\nLOSS: raise CVR or lower CPC (actual ROAS {}x, required {}x)",
                fixed(alert.actual_roas, 2),
                fixed(alert.required_roas, 2)
            );
        }
        (None, SafetyLevel::Safe) => {
            let _ = writeln!(out, "\nSAFE: profit structure has headroom");
        }
        (None, _) => {
            let _ = writeln!(out, "\nLOW SAFETY MARGIN: exposed to market swings");
        }
    }

    let _ = writeln!(out, "\nCVR Breakeven");
    for (i, r) in snap.cvr_sweep.iter().enumerate() {
        let mark = if snap.cvr_nearest.contains(&i) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:>5}% {:>14} {:>14} {:>6}x {}",
            mark,
            fixed(r.tested, 1),
            whole(r.revenue),
            whole(r.net_profit),
            fixed(r.roas, 2),
            r.status
        );
    }
    let _ = writeln!(out, "\nCPC Breakeven");
    for (i, r) in snap.cpc_sweep.iter().enumerate() {
        let mark = if snap.cpc_nearest.contains(&i) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:>6} {:>8} {:>6} {:>14} {}",
            mark,
            whole(r.tested),
            whole(r.clicks),
            whole(r.conversions),
            whole(r.net_profit),
            r.status
        );
    }
    if !snap.scenarios.is_empty() {
        let _ = writeln!(out, "\nSaved Scenarios");
        for s in &snap.scenarios {
            let _ = writeln!(
                out,
                "  #{} {} cvr={} ctr={} cpc={} net={} roas={}x",
                s.id,
                adsim_export::format_timestamp(&s.saved_at),
                fixed(s.params.cvr, 1),
                fixed(s.params.ctr, 1),
                whole(s.params.cpc),
                whole(s.metrics.net_profit),
                fixed(s.metrics.roas, 2)
            );
        }
    }
    out
}

fn render(snap: &SimSnapshot, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => render_text(snap),
        OutputFormat::Csv => build_bundle(snap).to_csv(),
        OutputFormat::Json => build_bundle(snap).to_json()?,
    })
}

/// A directory target gets a time-stamped file name.
fn output_path(out: &str, format: OutputFormat) -> PathBuf {
    let path = Path::new(out);
    if path.is_dir() {
        path.join(export_file_name(&Utc::now(), format.extension()))
    } else {
        path.to_path_buf()
    }
}

fn main() -> Result<()> {
    // Logging setup; stderr keeps CSV/JSON on stdout clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "adsim {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(config = ?args.config, sets = args.sets.len(), format = ?args.format, "starting CLI");

    let sim = build_simulator(&args)?;
    let snap = sim.snapshot();
    let m = &snap.metrics;
    eprintln!(
        "KPI | revenue: {} | net profit: {} | ROAS: {}x | ROI: {}% | status: {} | scenarios: {}",
        to_whole_units(m.revenue).unwrap_or(0),
        to_whole_units(m.net_profit).unwrap_or(0),
        fixed(m.roas, 2),
        whole(m.roi),
        m.status(),
        snap.scenarios.len()
    );

    let body = render(&snap, args.format)?;
    match &args.out {
        Some(out) => {
            let path = output_path(out, args.format);
            std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "export written");
        }
        None => print!("{body}"),
    }
    Ok(())
}
