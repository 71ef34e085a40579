use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sanadsaz::config::{init_default_config, load_config, resolve_config_file, AppConfig};
use sanadsaz::export::Exporter;
use sanadsaz::fonts::FontOverrides;

#[derive(Parser, Debug)]
#[command(name = "sanadsaz")]
#[command(about = "Survey-export JSON to styled Word documents (template tags + bilingual fonts)", long_about = None)]
struct Args {
    /// Generate a default config file, then exit
    #[arg(long)]
    init_config: bool,

    /// Directory to write the config file (default: current directory)
    #[arg(long, value_name = "DIR")]
    init_config_dir: Option<PathBuf>,

    /// Overwrite an existing config file when used with --init-config
    #[arg(long)]
    force: bool,

    /// Input survey-export .json (drag-and-drop supported)
    #[arg(value_name = "JSON")]
    input: Option<PathBuf>,

    /// Output .docx (default: <input_stem>.docx next to the input)
    #[arg(short, long, value_name = "DOCX")]
    output: Option<PathBuf>,

    /// Template .docx carrying the {placeholder} tags
    #[arg(long, value_name = "DOCX")]
    template: Option<PathBuf>,

    /// Placeholder mapping JSON
    #[arg(long, value_name = "JSON")]
    mapping: Option<PathBuf>,

    /// Output directory; the file is named after the document title
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Treat the input as a JSON array and export every document into a ZIP
    #[arg(long)]
    batch: bool,

    /// Batch ZIP filename (default: batch_export_<date>.zip)
    #[arg(long, value_name = "NAME")]
    zip_name: Option<String>,

    /// Where to write the transformed-data JSON (default: next to the output)
    #[arg(long, value_name = "JSON")]
    transformed_json: Option<PathBuf>,

    /// Write the transformed-data JSON and exit without rendering
    #[arg(long)]
    transform_only: bool,

    /// Config file path (default: search for sanadsaz.toml upwards)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Font for Persian runs (default: B Nazanin)
    #[arg(long, value_name = "FONT")]
    font_persian: Option<String>,

    /// Font for English runs (default: Times New Roman)
    #[arg(long, value_name = "FONT")]
    font_english: Option<String>,

    /// Fallback font for unclassified runs
    #[arg(long, value_name = "FONT")]
    font_default: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.init_config {
        let dir = args
            .init_config_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let cfg_path = init_default_config(&dir, args.force).context("init default config")?;
        eprintln!("Wrote config: {}", cfg_path.display());
        return Ok(());
    }

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            eprintln!(
                "\n\nUSAGE:\n  sanadsaz <input.json>\n\nTIPS:\n  - You can drag a survey-export .json file onto sanadsaz to generate its document.\n  - Default config search: sanadsaz.toml (upwards), or set SANADSAZ_CONFIG.\n"
            );
            return Ok(());
        }
    };

    let workdir = input
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let workdir = workdir.canonicalize().unwrap_or(workdir);

    let cfg_file = resolve_config_file(args.config.clone(), &workdir);
    let mut file_cfg = AppConfig::default();
    if let Some(p) = cfg_file.as_ref() {
        if p.exists() {
            file_cfg = load_config(p)?;
            debug!("config loaded from {}", p.display());
        }
    }
    let config_dir = cfg_file.as_deref().and_then(Path::parent);

    let mapping_path = args
        .mapping
        .clone()
        .or_else(|| {
            file_cfg
                .export
                .mapping
                .clone()
                .map(|p| from_config_dir(p, config_dir))
        })
        .context("no mapping file: pass --mapping or set [export] mapping in sanadsaz.toml")?;
    let template_path = args
        .template
        .clone()
        .or_else(|| {
            file_cfg
                .export
                .template
                .clone()
                .map(|p| from_config_dir(p, config_dir))
        })
        .context("no template file: pass --template or set [export] template in sanadsaz.toml")?;

    let mut exporter = Exporter::new(&mapping_path, &template_path)?;
    exporter.set_fonts(&file_cfg.fonts);
    exporter.set_fonts(&FontOverrides {
        persian: args.font_persian.clone(),
        english: args.font_english.clone(),
        default: args.font_default.clone(),
        system_title_first: None,
    });

    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("read input: {}", input.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("parse input json: {}", input.display()))?;

    if args.batch {
        let Value::Array(items) = raw else {
            bail!("--batch expects the input to be a JSON array of documents");
        };
        if args.transform_only {
            bail!("--transform-only works on a single document, not with --batch");
        }
        let out_dir = args
            .out_dir
            .clone()
            .or_else(|| {
                file_cfg
                    .export
                    .out_dir
                    .clone()
                    .map(|p| from_config_dir(p, config_dir))
            })
            .unwrap_or_else(|| workdir.clone());
        let zip_path = exporter.export_batch(&items, &out_dir, args.zip_name.as_deref())?;
        eprintln!("Wrote batch: {}", zip_path.display());
        return Ok(());
    }

    let data = exporter.transform(&raw);

    if args.transform_only {
        let side_path = args
            .transformed_json
            .clone()
            .unwrap_or_else(|| derived_output(&input).with_extension("data.json"));
        exporter.transformer().write_side_file(&data, &side_path);
        eprintln!("Wrote transformed data: {}", side_path.display());
        return Ok(());
    }

    let written = match (&args.output, &args.out_dir) {
        (Some(path), _) => {
            exporter.generate_from(&data, path)?;
            path.clone()
        }
        (None, Some(dir)) => exporter.export_transformed(&data, dir)?,
        (None, None) => {
            let output = derived_output(&input);
            exporter.generate_from(&data, &output)?;
            output
        }
    };
    let side_path = args
        .transformed_json
        .clone()
        .unwrap_or_else(|| written.with_extension("data.json"));
    exporter.transformer().write_side_file(&data, &side_path);
    eprintln!("Wrote document: {}", written.display());
    Ok(())
}

fn derived_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();
    input.with_file_name(format!("{stem}.docx"))
}

/// Relative paths from the config file resolve against the config's own
/// directory, not the process cwd.
fn from_config_dir(path: PathBuf, config_dir: Option<&Path>) -> PathBuf {
    if path.is_relative() {
        if let Some(dir) = config_dir {
            return dir.join(path);
        }
    }
    path
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sanadsaz={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
