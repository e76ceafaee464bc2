// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;
use tracing::info;
use vessel::db::load_or_repair_database;
use vessel::filesystem::search_installed_files;
use vessel::install::{deinstall_packages, install_package, DeinstallOutcome};
use vessel::packages::{InstallState, PackageSpec, StatusParagraph, Triplet};
use vessel::resolver::{load_binary_paragraph, missing_dependencies};
use vessel::verify::verify;
use vessel::InstallationPaths;

#[derive(Parser)]
#[command(name = "vessel")]
#[command(author, version, about = "Triplet-aware package manager with a crash-safe status journal", long_about = None)]
struct Cli {
    /// Installation root
    #[arg(short, long, global = true, env = "VESSEL_ROOT", default_value = ".")]
    root: PathBuf,

    /// Triplet used when a package spec has no `:triplet` suffix
    #[arg(short, long, global = true, env = "VESSEL_DEFAULT_TRIPLET", default_value = "x64-linux")]
    triplet: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install staged packages (name or name:triplet), in the order given
    Install {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Remove installed packages
    Remove {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// List packages in the status database
    List {
        /// Include half-installed and removed records
        #[arg(short, long)]
        all: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Find installed files whose path contains a substring
    Search {
        pattern: String,
    },
    /// Report interrupted operations and stray listfiles
    Verify,
    /// Generate shell completion scripts
    Completions {
        shell: Shell,
    },
}

#[derive(serde::Serialize)]
struct ListEntry<'a> {
    package: &'a PackageSpec,
    version: Option<&'a str>,
    want: vessel::packages::Want,
    state: InstallState,
    depends: &'a [String],
}

impl<'a> From<&'a StatusParagraph> for ListEntry<'a> {
    fn from(record: &'a StatusParagraph) -> Self {
        Self {
            package: &record.package.spec,
            version: record.package.version.as_deref(),
            want: record.want,
            state: record.state,
            depends: &record.package.depends,
        }
    }
}

fn parse_specs(specs: &[String], default_triplet: &Triplet) -> Result<Vec<PackageSpec>> {
    specs
        .iter()
        .map(|s| PackageSpec::parse(s, default_triplet).map_err(Into::into))
        .collect()
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = InstallationPaths::new(&cli.root);
    let default_triplet = Triplet::new(&cli.triplet);

    match cli.command {
        Some(Commands::Install { specs }) => {
            let specs = parse_specs(&specs, &default_triplet)?;
            let (mut db, mut journal) = load_or_repair_database(&paths)?;

            for spec in &specs {
                if db.find_installed(spec.name(), spec.triplet()).is_some() {
                    println!("Package {} is already installed", spec);
                    continue;
                }

                let missing = missing_dependencies(&paths, spec, &db)?;
                if !missing.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Cannot install {}: missing dependencies: {}",
                        spec,
                        missing.join(", ")
                    ));
                }

                let binary = load_binary_paragraph(&paths, spec)?.ok_or_else(|| {
                    anyhow::anyhow!(
                        "Package {} has not been built (no CONTROL in {})",
                        spec,
                        paths.package_dir(spec).display()
                    )
                })?;

                info!("Installing package: {}", spec);
                let report = install_package(&paths, &mut journal, &binary, &mut db)?;
                for error in &report.errors {
                    eprintln!("{}", error);
                }
                println!("Package {} is installed", spec);
                println!("  Files: {}", report.entries);
                if report.adopted > 0 {
                    println!("  Reclaimed from an interrupted install: {}", report.adopted);
                }
                if !report.errors.is_empty() {
                    println!("  Errors: {}", report.errors.len());
                }
            }

            Ok(())
        }
        Some(Commands::Remove { specs }) => {
            let specs = parse_specs(&specs, &default_triplet)?;
            let (mut db, mut journal) = load_or_repair_database(&paths)?;

            info!("Removing {} package(s)", specs.len());
            let outcomes = match deinstall_packages(&paths, &mut journal, &specs, &mut db) {
                Ok(outcomes) => outcomes,
                Err(vessel::Error::DependentsBlockUninstall { package, dependents }) => {
                    eprintln!("Error: Cannot remove package {}:", package);
                    for dependent in &dependents {
                        eprintln!("  {} depends on {}", dependent, package);
                    }
                    return Err(anyhow::anyhow!(
                        "{} is required by {} installed package(s); nothing was removed",
                        package,
                        dependents.len()
                    ));
                }
                Err(e) => return Err(e.into()),
            };

            for (spec, outcome) in outcomes {
                match outcome {
                    DeinstallOutcome::NotInstalled => {
                        println!("Package {} is not installed", spec);
                    }
                    DeinstallOutcome::Removed(report) => {
                        for error in &report.errors {
                            eprintln!("{}", error);
                        }
                        println!("Package {} was successfully removed", spec);
                        println!("  Files removed: {}", report.files_removed);
                    }
                }
            }

            Ok(())
        }
        Some(Commands::List { all, json }) => {
            let (db, _) = load_or_repair_database(&paths)?;
            let records: Vec<&StatusParagraph> =
                db.iter().filter(|r| all || r.is_installed()).collect();

            if json {
                let entries: Vec<ListEntry> = records.iter().copied().map(ListEntry::from).collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if records.is_empty() {
                println!("No packages found.");
            } else {
                println!("Installed packages:");
                for record in &records {
                    print!("  {}", record.package.spec);
                    if let Some(version) = &record.package.version {
                        print!(" {}", version);
                    }
                    if all {
                        print!(" [{}]", record.status_line());
                    }
                    println!();
                }
                println!("\nTotal: {} package(s)", records.len());
            }

            Ok(())
        }
        Some(Commands::Search { pattern }) => {
            let (db, _) = load_or_repair_database(&paths)?;
            for (spec, line) in search_installed_files(&paths, &db, &pattern)? {
                println!("{}: {}", spec, line);
            }
            Ok(())
        }
        Some(Commands::Verify) => {
            let (db, _) = load_or_repair_database(&paths)?;
            let findings = verify(&paths, &db)?;
            if findings.is_empty() {
                println!("No problems found.");
                return Ok(());
            }

            for finding in &findings {
                println!("  {}", finding);
            }
            Err(anyhow::anyhow!("{} problem(s) found", findings.len()))
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vessel", &mut io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Vessel Package Manager v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'vessel --help' for usage information");
            Ok(())
        }
    }
}
