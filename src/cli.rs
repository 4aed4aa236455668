use crate::backend::{Document, write_output_text};
use crate::config::{Config, load_config};
use crate::ir::Grammar;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_grammar;
use crate::{render_html, render_svg, render_tikz};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rrdr", version, about = "Railroad diagram renderer for EBNF grammars")]
pub struct Args {
    /// Input grammar (.ebnf), Markdown with ```ebnf blocks, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file or directory. Text formats default to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted
    #[arg(short = 'e', long = "outputFormat", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// One diagram per production instead of a single diagram
    #[arg(long = "split")]
    pub split: bool,

    /// PNG scale factor
    #[arg(short = 's', long = "scale")]
    pub scale: Option<f32>,

    /// Write the computed box table as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Html,
    Tex,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Html => "html",
            OutputFormat::Tex => "tex",
            OutputFormat::Png => "png",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if args.split {
        config.render.split_productions = true;
    }
    if let Some(scale) = args.scale {
        anyhow::ensure!(scale > 0.0 && scale.is_finite(), "Scale must be positive");
        config.render.scale = scale;
    }
    let format = resolve_format(args.output_format, args.output.as_deref());

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let sources = if is_markdown {
        extract_ebnf_blocks(&input)
    } else {
        vec![input]
    };
    if sources.is_empty() {
        return Err(anyhow::anyhow!("No EBNF grammars found in input"));
    }

    let mut grammars = Vec::with_capacity(sources.len());
    for (idx, source) in sources.iter().enumerate() {
        let grammar = parse_grammar(source)
            .with_context(|| format!("Failed to parse grammar {}", idx + 1))?;
        grammars.push(grammar);
    }

    if let Some(path) = args.dump_layout.as_deref() {
        dump_layouts(path, &grammars, &config)?;
    }

    let documents = render_documents(&grammars, &config, format)?;
    write_documents(documents, args.output.as_deref(), format, &config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_format(explicit: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    if let Some(format) = explicit {
        return format;
    }
    let ext = output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => OutputFormat::Html,
        Some("tex") => OutputFormat::Tex,
        Some("png") => OutputFormat::Png,
        _ => OutputFormat::Svg,
    }
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn extract_ebnf_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut fence: Option<&str> = None;
    let mut current = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        match fence {
            None => {
                fence = detect_ebnf_fence(trimmed);
            }
            Some(open) if is_fence_end(trimmed, open) => {
                fence = None;
                blocks.push(current.join("\n"));
                current.clear();
            }
            Some(_) => current.push(line),
        }
    }

    blocks
}

fn detect_ebnf_fence(line: &str) -> Option<&'static str> {
    for fence in ["```", "~~~"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let info = rest.trim_start_matches(&fence[..1]).trim();
            if info == "ebnf" || info.starts_with("ebnf ") {
                return Some(fence);
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    match line.strip_prefix(fence) {
        Some(rest) => rest.trim_start_matches(&fence[..1]).trim().is_empty(),
        None => false,
    }
}

fn render_documents(
    grammars: &[Grammar],
    config: &Config,
    format: OutputFormat,
) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for grammar in grammars {
        match format {
            OutputFormat::Svg | OutputFormat::Png => documents.extend(render_svg(grammar, config)?),
            OutputFormat::Html => documents.push(render_html(grammar, config)?),
            OutputFormat::Tex => documents.extend(render_tikz(grammar, config)?),
        }
    }
    Ok(documents)
}

fn write_documents(
    mut documents: Vec<Document>,
    output: Option<&Path>,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    if format == OutputFormat::Tex {
        let tex: String = documents.iter().map(|d| d.content.as_str()).collect();
        return write_output_text(&tex, output);
    }

    if documents.len() == 1 {
        let doc = documents.remove(0);
        return match format {
            OutputFormat::Png => write_png(&doc.content, &ensure_output(output, "png")?, config),
            _ => write_output_text(&doc.content, output),
        };
    }

    let names: Vec<String> = documents.iter().map(|d| d.name.clone()).collect();
    let outputs = resolve_multi_outputs(output, format, &names)?;
    for (doc, path) in documents.iter().zip(&outputs) {
        match format {
            OutputFormat::Png => write_png(&doc.content, path, config)?,
            _ => write_output_text(&doc.content, Some(path))?,
        }
        tracing::info!(path = %path.display(), "wrote diagram");
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, path: &Path, config: &Config) -> Result<()> {
    crate::backend::write_output_png(svg, path, config.render.scale)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _path: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn dump_layouts(path: &Path, grammars: &[Grammar], config: &Config) -> Result<()> {
    if let [grammar] = grammars {
        let layout = compute_layout(grammar, &config.layout)?;
        return write_layout_dump(path, &layout, grammar);
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("layout");
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    for (idx, grammar) in grammars.iter().enumerate() {
        let layout = compute_layout(grammar, &config.layout)?;
        write_layout_dump(&parent.join(format!("{}-{}.json", stem, idx + 1)), &layout, grammar)?;
    }
    Ok(())
}

/// Keeps file names distinct when several grammars produce diagrams with
/// the same name.
fn unique_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashMap::new();
    names
        .iter()
        .map(|name| {
            let base: String = name
                .chars()
                .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect();
            let count = seen.entry(base.clone()).or_insert(0usize);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}-{}", base, count)
            }
        })
        .collect()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    names: &[String],
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for multiple diagrams"))?;
    let names = unique_names(names);
    if base.is_dir() {
        return Ok(names
            .iter()
            .map(|name| base.join(format!("{}.{}", name, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok(names
        .iter()
        .map(|name| parent.join(format!("{}-{}.{}", stem, name, ext)))
        .collect())
}
