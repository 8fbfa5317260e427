use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use packer_core::stacking::suggest_positions;
use packer_core::{
    EngineConfig, LayoutFile, LayoutOptimizer, LayoutValidator, PackRequest, PackResult, Packer,
    Room,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packer")]
#[command(about = "Warehouse room packer - place boxed items in a room", long_about = None)]
struct Cli {
    /// Engine configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack the items of a request into its room
    Pack {
        /// Request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Estimate capacity before packing
    Check {
        /// Request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Stock levels per product id (YAML or JSON map)
        #[arg(short, long)]
        stock: Option<PathBuf>,
    },

    /// Re-check a stored layout
    Validate {
        /// Layout file with room and placements
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run the optimizer passes over a stored layout
    Optimize {
        /// Layout file with room and placements
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the optimized layout (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest existing stacks that can take more units of a product
    Suggest {
        /// Layout file with room and placements
        #[arg(short, long)]
        input: PathBuf,

        /// Product id to stack
        #[arg(short, long)]
        product: String,

        /// Height of one unit
        #[arg(long)]
        height: f64,

        /// Number of units to place
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },

    /// Render a top-down SVG floor plan of a layout
    Render {
        /// Layout file with room and placements
        #[arg(short, long)]
        input: PathBuf,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Packing result written together with its room, so it can be read back as a layout.
#[derive(Serialize)]
struct PackOutput<'a> {
    room: &'a Room,
    #[serde(flatten)]
    result: &'a PackResult,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => load::<EngineConfig>(path)?,
        None => EngineConfig::default(),
    };
    debug!("Engine configuration: {:?}", config);

    match cli.command {
        Commands::Pack { input, output } => pack_command(input, output, config)?,
        Commands::Check { input, stock } => check_command(input, stock, config)?,
        Commands::Validate { input } => validate_command(input, config)?,
        Commands::Optimize { input, output } => optimize_command(input, output)?,
        Commands::Suggest {
            input,
            product,
            height,
            count,
        } => suggest_command(input, &product, height, count)?,
        Commands::Render { input, output } => render_command(input, output)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads YAML or JSON depending on the file extension.
fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|s| s.to_str());
    let value = if ext == Some("yaml") || ext == Some("yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
    };
    Ok(value)
}

fn write_or_print<T: Serialize>(value: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "💾 Saved result to {}",
                path.display().to_string().bright_white()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn print_messages(errors: &[String], warnings: &[String]) {
    for error in errors {
        println!("  {} {}", "✗".bright_red(), error);
    }
    for warning in warnings {
        println!("  {} {}", "!".bright_yellow(), warning);
    }
}

fn pack_command(input: PathBuf, output: Option<PathBuf>, config: EngineConfig) -> Result<()> {
    println!("{}", "🔍 Loading request...".bright_blue());
    let request: PackRequest = load(&input)?;
    let room = request.room;

    println!(
        "  Room {}x{}x{}",
        room.width, room.depth, room.height
    );
    println!(
        "  {} products, {} units",
        request.items.len().to_string().bright_white().bold(),
        request
            .items
            .iter()
            .map(|i| i.quantity as usize)
            .sum::<usize>()
            .to_string()
            .bright_white()
            .bold()
    );
    println!();

    println!("{}", "🚀 Packing...".bright_blue());
    let packer = Packer::with_config(request, config)?;
    let result = packer.pack();

    println!();
    println!("{}", "✅ Packing complete!".bright_green().bold());
    println!();
    println!("{}", "📊 Results:".bright_yellow().bold());
    if let Some(kind) = result.strategy_used {
        println!("  Strategy: {}", kind.to_string().bright_white());
    }
    if let Some(grid) = result.grid {
        println!("  Grid: {}x{}", grid.columns, grid.rows);
    }
    println!(
        "  Placed: {}",
        result.placements.len().to_string().bright_white().bold()
    );
    println!("  Utilization: {:.2}%", result.utilization);

    if !result.unplaced_items.is_empty() {
        println!();
        println!(
            "  {} units could not be placed:",
            result.unplaced_items.len().to_string().bright_red()
        );
        for item in &result.unplaced_items {
            println!("    • {}: {}", item.product_id.bright_white(), item.reason);
        }
    }
    println!();

    write_or_print(
        &PackOutput {
            room: &room,
            result: &result,
        },
        output,
    )
}

fn check_command(input: PathBuf, stock: Option<PathBuf>, config: EngineConfig) -> Result<()> {
    let request: PackRequest = load(&input)?;
    let validator = LayoutValidator::with_config(config);
    let report = validator.check_feasibility(&request.room, &request.items);

    println!("{}", "📋 Feasibility:".bright_yellow().bold());
    for item in &report.items {
        let status = if item.fits {
            "fits".bright_green()
        } else {
            "does not fit".bright_red()
        };
        println!(
            "  • {}: {} (requested {}, capacity ~{})",
            item.product_id.bright_white(),
            status,
            item.requested,
            item.max_quantity
        );
    }
    println!(
        "  Estimated utilization: {:.1}%",
        report.estimated_utilization
    );
    print_messages(&report.errors, &report.warnings);

    if let Some(path) = stock {
        let levels: HashMap<String, u32> = load(&path)?;
        let warnings = validator.check_stock(&request.items, &levels);
        if warnings.is_empty() {
            println!("  {} Stock covers every request", "✓".bright_green());
        }
        print_messages(&[], &warnings);
    }

    if !report.valid {
        bail!("Request is not feasible");
    }
    Ok(())
}

fn validate_command(input: PathBuf, config: EngineConfig) -> Result<()> {
    let layout: LayoutFile = load(&input)?;
    let report =
        LayoutValidator::with_config(config).validate_layout(&layout.placements, &layout.room);

    if report.valid {
        println!("{}", "✅ Layout is valid".bright_green().bold());
    } else {
        println!(
            "{}",
            format!("❌ Layout has {} errors", report.errors.len())
                .bright_red()
                .bold()
        );
    }
    println!("  Volume utilization: {:.2}%", report.volume_utilization);
    println!("  Floor utilization: {:.2}%", report.floor_utilization);
    print_messages(&report.errors, &report.warnings);

    if !report.valid {
        bail!("Layout failed validation");
    }
    Ok(())
}

fn optimize_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let layout: LayoutFile = load(&input)?;
    let report = LayoutOptimizer::new(layout.room).optimize(&layout.placements);

    println!("{}", "🛠  Optimization:".bright_yellow().bold());
    if report.improvements.is_empty() {
        println!("  No improvements found");
    }
    for note in &report.improvements {
        println!("  • {}", note);
    }
    println!(
        "  Utilization: {:.2}% -> {:.2}%",
        report.utilization_before, report.utilization_after
    );
    println!();

    write_or_print(
        &LayoutFile {
            room: layout.room,
            placements: report.placements,
        },
        output,
    )
}

fn suggest_command(input: PathBuf, product: &str, height: f64, count: u32) -> Result<()> {
    if height <= 0.0 {
        bail!("Unit height must be positive");
    }
    let layout: LayoutFile = load(&input)?;
    let suggestions = suggest_positions(&layout.room, &layout.placements, product, height, count);

    println!("{}", "📦 Stacking suggestions:".bright_yellow().bold());
    let mut covered = 0;
    for s in &suggestions {
        covered += s.units;
        println!(
            "  • {} units at ({}, {}) from z={} [{}]",
            s.units.to_string().bright_white().bold(),
            s.x,
            s.y,
            s.z,
            s.stack_id
        );
    }
    if covered < count {
        println!(
            "  {} {} units need a new floor position",
            "!".bright_yellow(),
            count - covered
        );
    }
    Ok(())
}

fn render_command(input: PathBuf, output: PathBuf) -> Result<()> {
    println!("{}", "🔍 Loading layout...".bright_blue());
    let layout: LayoutFile = load(&input)?;

    println!("{}", "🎨 Generating SVG...".bright_blue());
    let svg = generate_floor_plan_svg(&layout)?;
    std::fs::write(&output, svg)?;

    println!();
    println!(
        "{} Saved SVG to {}",
        "✅".bright_green(),
        output.display().to_string().bright_white()
    );
    Ok(())
}

const PALETTE: [&str; 6] = ["#4CAF50", "#2196F3", "#FF9800", "#9C27B0", "#009688", "#F44336"];

/// Top-down floor plan. Stacks are drawn once, labelled with their unit count.
fn generate_floor_plan_svg(layout: &LayoutFile) -> Result<String> {
    use std::fmt::Write;

    let margin = 20.0;
    let scale = (800.0 / layout.room.width.max(layout.room.depth)).min(1.0);
    let plan_width = layout.room.width * scale;
    let plan_depth = layout.room.depth * scale;
    let svg_width = plan_width + 2.0 * margin;
    let svg_height = plan_depth + 2.0 * margin;

    let mut svg = String::new();
    writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        &mut svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        svg_width, svg_height, svg_width, svg_height
    )?;
    writeln!(
        &mut svg,
        r##"  <rect width="100%" height="100%" fill="#f5f5f5"/>"##
    )?;
    writeln!(
        &mut svg,
        r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#fff" stroke="#333" stroke-width="2"/>"##,
        margin, margin, plan_width, plan_depth
    )?;

    let mut products: Vec<&str> = Vec::new();
    let mut stacks: Vec<(&str, u32)> = Vec::new();
    for p in &layout.placements {
        match stacks.iter_mut().find(|(id, _)| *id == p.stack_id) {
            Some((_, count)) => {
                *count += 1;
                continue;
            }
            None => stacks.push((p.stack_id.as_str(), 1)),
        }
        if !products.contains(&p.product_id.as_str()) {
            products.push(p.product_id.as_str());
        }
    }

    for p in layout.placements.iter().filter(|p| p.is_floor_level()) {
        let color_idx = products
            .iter()
            .position(|id| *id == p.product_id)
            .unwrap_or(0);
        let units = stacks
            .iter()
            .find(|(id, _)| *id == p.stack_id)
            .map_or(1, |(_, count)| *count);

        let px = margin + p.x * scale;
        // SVG Y grows downwards; the room origin is the bottom-left corner.
        let py = margin + (layout.room.depth - p.top()) * scale;
        let pw = p.width * scale;
        let pd = p.depth * scale;

        writeln!(
            &mut svg,
            r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#333" stroke-width="1" opacity="0.7"/>"##,
            px,
            py,
            pw,
            pd,
            PALETTE[color_idx % PALETTE.len()]
        )?;

        let label = if units > 1 {
            format!("{} x{}", p.product_id, units)
        } else {
            p.product_id.clone()
        };
        writeln!(
            &mut svg,
            r##"  <text x="{}" y="{}" font-family="Arial" font-size="10" fill="#fff" text-anchor="middle">{}</text>"##,
            px + pw / 2.0,
            py + pd / 2.0 + 3.0,
            escape_xml(&label)
        )?;
    }

    writeln!(&mut svg, "</svg>")?;
    Ok(svg)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
