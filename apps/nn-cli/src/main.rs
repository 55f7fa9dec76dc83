mod error;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use error::{CliError, CliResult};
use nn_codegen::{EmitConfig, EmitContext, MarkerTable, TemplateEmitter};
use nn_graph::RateCollection;
use nn_project::{Project, build_collection, condition, load_yaml, nuclide_table};
use nn_screening::{ScreeningOptions, ScreeningPlan, WeakScreening};
use nn_symbolic::{NetworkEvaluator, ThermoState};
use tracing::info;

#[derive(Parser)]
#[command(name = "nn-cli")]
#[command(about = "Nuclear reaction network builder and code generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a network project file and build its rate graph
    Validate {
        /// Path to the project YAML file
        project_path: PathBuf,
    },
    /// Print the rates consuming and producing each nuclide
    Overview {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Show forward/reverse rate pairs instead
        #[arg(long)]
        pairs: bool,
    },
    /// Evaluate rates and dY/dt at the project's conditions
    Evaluate {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Only this condition (0-based)
        #[arg(short, long)]
        condition: Option<usize>,
        /// Screening applied to the rates
        #[arg(long, value_enum, default_value_t = Screening::Weak)]
        screening: Screening,
        /// Also list rates slower than this fraction of the fastest rate
        #[arg(long)]
        cutoff: Option<f64>,
    },
    /// Expand templates into network source files
    Generate {
        /// Path to the project YAML file
        project_path: PathBuf,
        /// Template files (defaults to the project's list)
        templates: Vec<PathBuf>,
        /// Output directory (defaults to the project's, then the working directory)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Screening {
    None,
    Weak,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Overview {
            project_path,
            pairs,
        } => cmd_overview(&project_path, pairs),
        Commands::Evaluate {
            project_path,
            condition,
            screening,
            cutoff,
        } => cmd_evaluate(&project_path, condition, screening, cutoff),
        Commands::Generate {
            project_path,
            templates,
            out_dir,
        } => cmd_generate(&project_path, templates, out_dir),
    }
}

fn project_dir(project_path: &Path) -> PathBuf {
    project_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn load(project_path: &Path) -> CliResult<(Project, RateCollection)> {
    let project = load_yaml(project_path)?;
    let collection = build_collection(&project, &project_dir(project_path))?;
    Ok((project, collection))
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    println!("Validating project: {}", project_path.display());
    let (_, collection) = load(project_path)?;
    let graph = collection.graph();
    println!(
        "✓ Network is valid ({} nuclides, {} rates, {} pairs)",
        graph.nuclides().len(),
        graph.rates().len(),
        graph.rate_pairs().len()
    );
    Ok(())
}

fn cmd_overview(project_path: &Path, pairs: bool) -> CliResult<()> {
    let (_, collection) = load(project_path)?;
    let graph = collection.graph();
    if pairs {
        print!("{}", graph.rate_pair_overview());
    } else {
        print!("{}", graph.network_overview());
    }
    Ok(())
}

fn cmd_evaluate(
    project_path: &Path,
    only: Option<usize>,
    screening: Screening,
    cutoff: Option<f64>,
) -> CliResult<()> {
    let (project, collection) = load(project_path)?;
    let graph = collection.graph();
    if project.conditions.is_empty() {
        return Err(CliError::Usage("project lists no conditions".to_string()));
    }

    let table = nuclide_table(&project)?;
    let mut states = Vec::with_capacity(project.conditions.len());
    for def in &project.conditions {
        let c = condition(&table, def, graph.nuclides())?;
        states.push(ThermoState::new(c.rho, c.temp, c.composition));
    }
    let selected: Vec<(usize, &ThermoState)> = match only {
        Some(i) => {
            let state = states.get(i).ok_or_else(|| {
                CliError::Usage(format!("condition {i} out of range (have {})", states.len()))
            })?;
            vec![(i, state)]
        }
        None => states.iter().enumerate().collect(),
    };

    let provider = WeakScreening;
    let mut evaluator = NetworkEvaluator::new(graph);
    if let Screening::Weak = screening {
        let options = ScreeningOptions {
            enabled: project.screening.enabled,
            symmetric: project.screening.symmetric,
        };
        evaluator = evaluator.with_screening(ScreeningPlan::build(graph, options), &provider);
    }

    for (i, state) in selected {
        println!("Condition {i}: rho = {:e} g/cm^3, T = {:e} K", state.rho, state.temp);
        println!("  rates:");
        for value in evaluator.evaluate_rates(state)? {
            println!("    {:<40} {:>14.6e}", graph.entry(value.id).name(), value.value);
        }
        println!("  dY/dt:");
        let ydots = evaluator.evaluate_ydots(state)?;
        for (nuc, ydot) in graph.nuclides().iter().zip(ydots.iter()) {
            println!("    {:<8} {:>14.6e}", nuc.name(), ydot);
        }
    }

    if let Some(cutoff) = cutoff {
        let slow = evaluator.find_unimportant_rates(&states, cutoff)?;
        if slow.is_empty() {
            println!("No rates below {cutoff:e} of the fastest rate");
        } else {
            println!("Rates below {cutoff:e} of the fastest rate:");
            for (id, share) in slow {
                println!("  {:<40} {:>12.3e}", graph.entry(id).name(), share);
            }
        }
    }
    Ok(())
}

fn cmd_generate(project_path: &Path, templates: Vec<PathBuf>, out_dir: Option<PathBuf>) -> CliResult<()> {
    let start = Instant::now();
    let (project, collection) = load(project_path)?;
    let graph = collection.graph();
    let base = project_dir(project_path);

    let templates: Vec<PathBuf> = if templates.is_empty() {
        project.output.templates.iter().map(|t| base.join(t)).collect()
    } else {
        templates
    };
    if templates.is_empty() {
        return Err(CliError::Usage("no templates given".to_string()));
    }
    let out_dir = out_dir.or_else(|| project.output.out_dir.as_ref().map(|d| base.join(d)));

    let mut config = EmitConfig::for_graph(graph);
    config.screening.enabled = project.screening.enabled;
    if let Some(dtype) = &project.output.dtype {
        config.dtype = dtype.clone();
    }
    if let Some(specifier) = &project.output.function_specifier {
        config.function_specifier = specifier.clone();
    }

    let ctx = EmitContext::new(graph, config);
    let markers = MarkerTable::cxx();
    let report = TemplateEmitter::new(&markers, &ctx).emit(&templates, out_dir.as_deref())?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "generation finished");

    for path in &report.written {
        println!("✓ Wrote {}", path.display());
    }
    for path in &report.staged_tables {
        println!("✓ Copied {}", path.display());
    }
    for warning in &report.warnings {
        println!("! {warning}");
    }
    Ok(())
}
