use crate::config::{Config, load_config};
use crate::generate::extract_candidate_text;
use crate::ir::ConceptMap;
use crate::layout::{Graph, RunStats, compute_layout_with_frames};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_concept_map;
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::text_metrics::measurer_for;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cmapr",
    version,
    about = "Lay out and draw a concept map from a concept service response"
)]
pub struct Args {
    /// Response file (model text or the full service envelope) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Write the settled node and link state as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Write intermediate frames as SVG into this directory
    #[arg(long = "frames")]
    pub frames: Option<PathBuf>,

    /// Iterations between captured frames
    #[arg(long = "frame-every", default_value_t = 25)]
    pub frame_every: usize,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    execute(&args)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn execute(args: &Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let input = read_input(args.input.as_deref())?;
    let map = decode_input(&input)?;
    let (graph, stats) = layout_with_frames(&map, &config, args.frames.as_deref(), args.frame_every)?;

    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &graph, &stats)
            .with_context(|| format!("writing layout dump to {}", path.display()))?;
    }

    let svg = render_svg(&graph, &config);
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

/// Accepts either the raw service envelope or the model text inside it.
fn decode_input(input: &str) -> Result<ConceptMap> {
    let envelope = serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .filter(|value| value.get("candidates").is_some());
    let map = match envelope {
        Some(_) => parse_concept_map(&extract_candidate_text(input)?)?,
        None => parse_concept_map(input)?,
    };
    Ok(map)
}

fn layout_with_frames(
    map: &ConceptMap,
    config: &Config,
    frames: Option<&Path>,
    every: usize,
) -> Result<(Graph, RunStats)> {
    let measurer = measurer_for(config.layout.fast_text_metrics);
    let Some(dir) = frames else {
        return Ok(compute_layout_with_frames(map, config, measurer, |_, _| {})?);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating frame directory {}", dir.display()))?;
    let every = every.max(1);
    let mut frame_error = None;
    let mut written = 0usize;
    let (graph, stats) = compute_layout_with_frames(map, config, measurer, |graph, step| {
        if frame_error.is_some() || (step.iteration % every != 0 && !step.finished) {
            return;
        }
        let path = dir.join(format!("frame-{:04}.svg", step.iteration));
        match write_output_svg(&render_svg(graph, config), Some(&path)) {
            Ok(()) => written += 1,
            Err(err) => frame_error = Some(err),
        }
    })?;
    if let Some(err) = frame_error {
        return Err(err.context("writing frame"));
    }
    tracing::info!(frames = written, dir = %dir.display(), "captured simulation frames");
    Ok((graph, stats))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path.filter(|path| *path != Path::new("-")) {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
