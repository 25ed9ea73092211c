//! `bonsai` command-line entry point.
//!
//! `view` (the default) opens the interactive eframe/egui window and
//! delegates everything to [`Viewer`]. `export` and `inspect` run the same
//! layout headlessly and write SVG or JSON.

mod viewer;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use bonsai_core::{
    config::Config,
    layout::layout_seeded,
    mastery::MasteryTree,
    reveal::RevealStage,
    svg::{SvgOptions, render_svg},
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viewer::Viewer;

#[derive(Parser)]
#[command(name = "bonsai")]
#[command(about = "Mastery tree layout: interactive viewer and SVG export")]
struct Cli {
    /// Mastery tree JSON; the built-in sample is used when omitted
    #[arg(short, long, global = true)]
    tree: Option<PathBuf>,

    /// Layout config JSON; missing fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for leaf jitter
    #[arg(short, long, global = true, default_value_t = 0)]
    seed: u64,

    /// Lay out trees that fail validation instead of refusing them
    #[arg(long, global = true)]
    permissive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive viewer
    View,
    /// Write the tree as an SVG document
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Reveal stage to render
        #[arg(long, value_enum, default_value_t = StageArg::All)]
        stage: StageArg,

        /// Add SMIL entrance animations
        #[arg(long)]
        animate: bool,

        /// Leave out the subject legend
        #[arg(long)]
        no_legend: bool,
    },
    /// Print the computed layout as JSON
    Inspect,
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Pending,
    Branches,
    All,
}

impl From<StageArg> for RevealStage {
    fn from(s: StageArg) -> Self {
        match s {
            StageArg::Pending => RevealStage::Pending,
            StageArg::Branches => RevealStage::BranchesVisible,
            StageArg::All => RevealStage::AllVisible,
        }
    }
}

/// Logs go to stderr so `export` and `inspect` can write to stdout.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "bonsai=info,bonsai_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Reads the snapshot and config named on the command line.
fn load_inputs(cli: &Cli) -> anyhow::Result<(MasteryTree, Config)> {
    let tree = match &cli.tree {
        Some(path) => load_tree(path, cli.permissive)?,
        None => MasteryTree::sample(),
    };

    let cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    Ok((tree, cfg))
}

pub(crate) fn load_tree(path: &Path, permissive: bool) -> anyhow::Result<MasteryTree> {
    let tree = MasteryTree::load(path)
        .with_context(|| format!("loading mastery tree {}", path.display()))?;

    if let Err(e) = tree.validate() {
        if !permissive {
            return Err(e).with_context(|| format!("validating {}", path.display()));
        }
        tracing::warn!(error = %e, "laying out invalid tree as-is");
    }
    Ok(tree)
}

fn write_output(out: Option<&Path>, body: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = body.len(), "wrote output");
        }
        None => std::io::stdout().write_all(body.as_bytes())?,
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (tree, cfg) = load_inputs(&cli)?;

    match cli.command.unwrap_or(Commands::View) {
        Commands::View => {
            tracing::info!(branches = tree.branches.len(), seed = cli.seed, "opening viewer");
            let viewer = Viewer::new(tree, cfg, cli.seed, cli.tree.clone(), cli.permissive);
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
                ..Default::default()
            };

            eframe::run_native(
                "Bonsai Mastery Tree",
                options,
                Box::new(|_cc| Ok(Box::new(viewer))),
            )
            .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;
        }

        Commands::Export {
            out,
            stage,
            animate,
            no_legend,
        } => {
            let layout = layout_seeded(&tree, &cfg, cli.seed);
            let svg = render_svg(
                &tree,
                &layout,
                stage.into(),
                SvgOptions {
                    animate,
                    legend: !no_legend,
                },
            );
            write_output(out.as_deref(), &svg)?;
        }

        Commands::Inspect => {
            let layout = layout_seeded(&tree, &cfg, cli.seed);
            let json = serde_json::to_string_pretty(&layout)?;
            write_output(None, &(json + "\n"))?;
        }
    }

    Ok(())
}
