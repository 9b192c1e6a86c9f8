//! # Terra CLI
//!
//! Command-line front end for grid_core. Designs and projects are read from
//! JSON files; results go to stdout (text or JSON), logs go to stderr.
//!
//! ```bash
//! grid_cli example > design.json
//! grid_cli calc design.json
//! grid_cli field design.json --resolution 80 --kind step > step.json
//! RUST_LOG=grid_core=debug grid_cli calc design.json --json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grid_core::calculations::calculate;
use grid_core::design::GroundingDesign;
use grid_core::equations::generate_equations_markdown;
use grid_core::errors::{CalcError, CalcResult};
use grid_core::file_io::{load_design, load_project, load_project_with_lock_check, save_project, FileLock};
use grid_core::potential_field::{
    compute_potential_field, step_visualization, touch_visualization, FieldConfig, PotentialFieldGrid,
};
use grid_core::project::Project;
use grid_core::GroundingReport;

/// Substation grounding grid design calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an example design as JSON
    Example,
    /// Calculate a design file
    Calc {
        #[arg(value_name = "DESIGN_FILE")]
        design: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute the surface potential field of a design
    Field {
        /// Design JSON, or a project file with --project
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Read FILE as a project and use its field settings
        #[arg(long)]
        project: bool,
        /// Design label inside the project (first by label if omitted)
        #[arg(long, requires = "project")]
        label: Option<String>,
        /// Cells per axis (overrides the project setting)
        #[arg(short, long)]
        resolution: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = FieldKind::Potential)]
        kind: FieldKind,
    },
    /// Print the equations reference as markdown
    Equations,
    /// Create a project file holding the example design
    Init {
        #[arg(value_name = "PROJECT_FILE")]
        project: PathBuf,
        #[arg(long, default_value = "")]
        engineer: String,
        #[arg(long, default_value = "")]
        job_id: String,
        #[arg(long, default_value = "")]
        client: String,
    },
    /// Calculate every design in a project file
    Project {
        #[arg(value_name = "PROJECT_FILE")]
        project: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FieldKind {
    Potential,
    Touch,
    Step,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> CalcResult<()> {
    match command {
        Commands::Example => print_json(&GroundingDesign::example()),
        Commands::Calc { design, json } => {
            let design = load_design(&design)?;
            let report = calculate(&design)?;
            if json {
                print_json(&report)
            } else {
                print_report(&report);
                Ok(())
            }
        }
        Commands::Field {
            file,
            project,
            label,
            resolution,
            kind,
        } => {
            let mut field = if project {
                project_field(&file, label.as_deref(), resolution)?
            } else {
                let design = load_design(&file)?;
                design.validate()?;
                let mut config = FieldConfig::default();
                if let Some(resolution) = resolution {
                    config.resolution = resolution;
                }
                compute_potential_field(&design.grid, &design.rods, &config)
            };
            field.values = match kind {
                FieldKind::Potential => field.values,
                FieldKind::Touch => touch_visualization(&field.values),
                FieldKind::Step => step_visualization(&field.values),
            };
            print_json(&field)
        }
        Commands::Equations => {
            print!("{}", generate_equations_markdown());
            Ok(())
        }
        Commands::Init {
            project,
            engineer,
            job_id,
            client,
        } => init_project(&project, engineer, job_id, client),
        Commands::Project { project, json } => evaluate_project(&project, json),
    }
}

fn print_json<T: Serialize>(value: &T) -> CalcResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn project_field(path: &Path, label: Option<&str>, resolution: Option<usize>) -> CalcResult<PotentialFieldGrid> {
    let mut project = load_project(path)?;
    if let Some(resolution) = resolution {
        project.settings.field.resolution = resolution;
    }
    let id = match label {
        Some(label) => project.find_design(label).map(|(id, _)| id).ok_or_else(|| {
            CalcError::invalid_input("label", label, "No design with this label in the project")
        })?,
        None => project
            .designs
            .iter()
            .min_by(|a, b| a.1.label.cmp(&b.1.label))
            .map(|(id, _)| *id)
            .ok_or_else(|| CalcError::missing_field("designs"))?,
    };
    project.potential_field(&id)
}

fn init_project(path: &Path, engineer: String, job_id: String, client: String) -> CalcResult<()> {
    if path.exists() {
        return Err(CalcError::file_error(
            "create project",
            path.display().to_string(),
            "file already exists",
        ));
    }
    let mut project = Project::new(engineer.clone(), job_id, client);
    project.add_design(GroundingDesign::example());

    let user = if engineer.is_empty() { "grid_cli".to_string() } else { engineer };
    let lock = FileLock::acquire(path, user)?;
    save_project(&project, path)?;
    drop(lock);

    info!(path = %path.display(), "project created");
    Ok(())
}

fn evaluate_project(path: &Path, json: bool) -> CalcResult<()> {
    let (project, lock_info) = load_project_with_lock_check(path)?;
    if let Some(lock) = lock_info {
        warn!(
            user = %lock.user_id,
            machine = %lock.machine,
            since = %lock.locked_at,
            "project is locked by another user; results may be stale"
        );
    }
    let mut designs: Vec<_> = project.designs.iter().collect();
    designs.sort_by(|a, b| a.1.label.cmp(&b.1.label));

    if json {
        let reports = designs
            .iter()
            .map(|(id, design)| -> CalcResult<serde_json::Value> {
                let result = match project.evaluate(id) {
                    Ok(report) => serde_json::to_value(report)?,
                    Err(e) => serde_json::json!({ "error": e }),
                };
                Ok(serde_json::json!({
                    "id": id.to_string(),
                    "label": design.label,
                    "result": result,
                }))
            })
            .collect::<CalcResult<Vec<_>>>()?;
        return print_json(&reports);
    }

    println!("Project {} ({} designs)", project.meta.job_id, project.design_count());
    for (id, design) in designs {
        println!();
        match project.evaluate(id) {
            Ok(report) => print_report(&report),
            Err(e) => println!("{}: error [{}] {}", design.label, e.error_code(), e),
        }
    }
    Ok(())
}

fn print_report(report: &GroundingReport) {
    let limits = &report.limits.permissible;
    let conductor = &report.conductor;

    println!("═══════════════════════════════════════");
    println!("  GROUNDING GRID: {}", report.label);
    println!("═══════════════════════════════════════");
    println!();
    println!("Soil:");
    println!("  ρa = {:.1} Ω·m (r = {:.2} m)", report.soil.apparent_resistivity, report.soil.equivalent_radius_m);
    println!();
    println!("Resistance ({} - method {}):", report.resistance.method.display_name(), report.resistance.method.letter());
    println!("  Rg  = {:.4} Ω", report.resistance.resistance_ohm);
    if let Some(s) = &report.resistance.schwarz {
        println!("  R1 = {:.4} Ω, R2 = {:.4} Ω, R12 = {:.4} Ω (k1 = {:.3}, k2 = {:.3})", s.r1, s.r2, s.r12, s.k1, s.k2);
    }
    println!("  Ig  = {:.0} A", report.grid_current_a);
    println!("  GPR = {:.0} V", report.gpr_v);
    println!();
    println!("Factors:");
    println!(
        "  n = {:.3}, Ki = {:.3}, Km = {:.3}, Ks = {:.3}",
        report.geometry.n, report.geometry.ki, report.geometry.km, report.geometry.ks
    );
    println!();
    println!("Checks (Cs = {:.3}):", report.limits.cs);
    println!(
        "  Touch:     {:.2} ({:.0}/{:.0} V) {}",
        report.touch_unity(),
        report.mesh_touch_v,
        limits.touch_v,
        status_icon(report.touch_ok)
    );
    println!(
        "  Step:      {:.2} ({:.0}/{:.0} V) {}",
        report.step_unity(),
        report.mesh_step_v,
        limits.step_v,
        status_icon(report.step_ok)
    );
    println!(
        "  Conductor: {:.2} ({:.1}/{:.0} mm², Tm = {:.0} °C) {}",
        conductor.unity(),
        conductor.minimum_section_mm2,
        conductor.selected_section_mm2,
        conductor.max_temp_c,
        status_icon(report.conductor_ok)
    );
    if let Some(v) = report.limits.presumed_touch_v {
        println!("  Presumed touch voltage: {:.0} V", v);
    }
    if report.gpr_below_touch_limit {
        println!("  GPR below the touch limit");
    }
    println!();
    println!("═══════════════════════════════════════");
    println!(
        "  RESULT: {} (governs: {})",
        if report.passes() { "PASS" } else { "FAIL" },
        report.governing_condition()
    );
    println!("═══════════════════════════════════════");
}

fn status_icon(pass: bool) -> &'static str {
    if pass {
        "[OK]"
    } else {
        "[FAIL]"
    }
}
