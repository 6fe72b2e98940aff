use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;

use padplace::config::EngineConfig;
use padplace::geometry::{Orientation, Point, compute_placement};
use padplace::grid::{GridSpec, NumberingScheme, generate_grid};
use padplace::model::{Footprint, PadShape, ShapeKind, Side};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate pad grids and place footprints, printing JSON", long_about = None)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an anchor-defined pad grid
    Grid {
        /// Anchor A as X,Y in mm (receives pin 1)
        #[arg(long = "a", value_name = "X,Y", allow_hyphen_values = true)]
        anchor_a: Point,
        /// Anchor B as X,Y in mm
        #[arg(long = "b", value_name = "X,Y", allow_hyphen_values = true)]
        anchor_b: Point,
        #[arg(long)]
        cols: usize,
        #[arg(long)]
        rows: usize,
        #[arg(long, value_enum, default_value_t = SchemeArg::Circular)]
        scheme: SchemeArg,
        /// Give every pad a row/column prefix such as `B3`
        #[arg(long)]
        prefix: bool,
        /// Pad width in mm
        #[arg(long)]
        width: Option<f64>,
        /// Pad height in mm (defaults to the width)
        #[arg(long)]
        height: Option<f64>,
        /// Hole diameter in mm
        #[arg(long)]
        hole: Option<f64>,
        #[arg(long, value_enum)]
        shape: Option<ShapeArg>,
    },
    /// Place a footprint JSON file at a target point
    Place {
        #[arg(value_name = "FOOTPRINT_JSON")]
        footprint: Utf8PathBuf,
        /// Target as X,Y in mm
        #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
        at: Point,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotation: f64,
        #[arg(long)]
        flip: bool,
        #[arg(long, default_value = "top")]
        side: Side,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SchemeArg {
    Circular,
    Rows,
    Columns,
}

impl From<SchemeArg> for NumberingScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Circular => NumberingScheme::Circular,
            SchemeArg::Rows => NumberingScheme::ByRows,
            SchemeArg::Columns => NumberingScheme::ByColumns,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ShapeArg {
    Round,
    Rect,
    Ellipse,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let json = match cli.command {
        Command::Grid {
            anchor_a,
            anchor_b,
            cols,
            rows,
            scheme,
            prefix,
            width,
            height,
            hole,
            shape,
        } => {
            let mut pad = config.default_pad;
            pad.shape = pad_shape(pad.shape, width, height, hole, shape)?;
            let spec = GridSpec::new(anchor_a, anchor_b, cols, rows)
                .with_scheme(scheme.into())
                .with_pad(pad)
                .with_prefix(prefix);
            let footprint = generate_grid(&spec, &config.quick_prefix_table)?;
            info!("Generated {} pads", footprint.len());
            serde_json::to_string_pretty(&footprint)?
        }
        Command::Place {
            footprint,
            at,
            rotation,
            flip,
            side,
        } => {
            let text = std::fs::read_to_string(&footprint)
                .with_context(|| format!("Failed to read {footprint}"))?;
            let fp: Footprint = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse footprint {footprint}"))?;
            if fp.is_empty() {
                bail!("Footprint {footprint} has no pads");
            }
            let records = compute_placement(&fp, at, &Orientation::new(rotation, flip, side));
            serde_json::to_string_pretty(&records)?
        }
    };
    println!("{}", json);
    Ok(())
}

/// Start from `base` and override what was given on the command line.
fn pad_shape(
    base: PadShape,
    width: Option<f64>,
    height: Option<f64>,
    hole: Option<f64>,
    shape: Option<ShapeArg>,
) -> Result<PadShape> {
    let width_mm = width.unwrap_or(base.width_mm);
    let height_mm = height.or(width).unwrap_or(base.height_mm);
    let hole_mm = hole.unwrap_or(base.hole_mm);
    if width_mm <= 0.0 || height_mm <= 0.0 || hole_mm < 0.0 {
        bail!("Pad dimensions must be positive (got {width_mm} x {height_mm}, hole {hole_mm})");
    }
    let with_hole = hole_mm > 0.0;
    let kind = match (shape, with_hole) {
        (None, false) => base.kind,
        (None | Some(ShapeArg::Round), true) => ShapeKind::RoundWithHole,
        (Some(ShapeArg::Round), false) => ShapeKind::Round,
        (Some(ShapeArg::Rect), true) => ShapeKind::RectangleWithHole,
        (Some(ShapeArg::Rect), false) => ShapeKind::Rectangle,
        (Some(ShapeArg::Ellipse), _) => ShapeKind::Ellipse,
    };
    Ok(PadShape::new(kind, width_mm, height_mm, hole_mm))
}
