//! Batch driver that turns topic notes into Beamer decks.

mod compile;
mod files;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use compile::Compiler;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use topicdeck_core::navigation::{
    navigation_front_matter, replace_front_matter, strip_legacy_navigation,
};
use topicdeck_core::{audit, Assembler, BeamerRenderer, DeckAudit, Manifest, RenumberPlan, Unit};

/// Build Beamer slide decks from Markdown topic notes.
#[derive(Parser, Debug)]
#[command(name = "topicdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate (and optionally compile) one deck per unit
    Build(BuildArgs),

    /// Check generated .tex decks for missing frames
    Audit {
        /// Generated deck(s) to check
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every unit's source and resource exist
    Verify {
        /// Batch manifest
        #[arg(short, long, default_value = "topics.json")]
        manifest: PathBuf,

        /// Also require a built PDF for every unit in this directory
        #[arg(long)]
        pdfs: Option<PathBuf>,
    },

    /// Rewrite each unit's navigation front matter
    Frontmatter {
        /// Batch manifest
        #[arg(short, long, default_value = "topics.json")]
        manifest: PathBuf,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Move unit folders to their new numbers and rewrite path references
    Renumber {
        /// Batch manifest (units carry `previous_number`)
        #[arg(short, long, default_value = "topics.json")]
        manifest: PathBuf,

        /// Extensions of files whose references are rewritten
        #[arg(long, value_delimiter = ',', default_value = "tex,md,py,html")]
        extensions: Vec<String>,

        /// Show the planned moves without touching anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Batch manifest
    #[arg(short, long, default_value = "topics.json")]
    manifest: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "topic_pdfs")]
    output: PathBuf,

    /// First unit number to build
    #[arg(long)]
    first: Option<u32>,

    /// Last unit number to build
    #[arg(long)]
    last: Option<u32>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// Compile each deck after writing it
    #[arg(short, long)]
    compile: bool,

    /// LaTeX compiler program
    #[arg(long, default_value = "pdflatex")]
    compiler: String,

    /// Compiler passes per deck
    #[arg(long, default_value = "2")]
    passes: u32,

    /// Seconds allowed per compiler pass
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Target characters per Key Concept frame
    #[arg(long, default_value = "500")]
    chunk_budget: usize,

    /// Maximum practice problem frames per deck
    #[arg(long, default_value = "2")]
    max_problems: usize,

    /// End each frame with an explanatory bottom note
    #[arg(long)]
    bottom_notes: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let passed = match &cli.command {
        Command::Build(args) => run_build(args)?,
        Command::Audit { input, json } => run_audit(input, *json)?,
        Command::Verify { manifest, pdfs } => run_verify(manifest, pdfs.as_deref())?,
        Command::Frontmatter { manifest, dry_run } => run_frontmatter(manifest, *dry_run)?,
        Command::Renumber {
            manifest,
            extensions,
            dry_run,
        } => run_renumber(manifest, extensions, *dry_run)?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

/// Load a manifest and resolve the directory its relative paths start from.
fn load_manifest(path: &Path) -> Result<(Manifest, PathBuf)> {
    let manifest = Manifest::load(path)
        .with_context(|| format!("Failed to load manifest {}", path.display()))?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((manifest, root))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum UnitStatus {
    Generated,
    Compiled,
    Failed,
}

/// Outcome of one unit in a build.
#[derive(Debug, Serialize)]
struct UnitReport {
    number: u32,
    name: String,
    status: UnitStatus,
    frames: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Final tally of a build.
#[derive(Debug, Default, Serialize)]
struct BuildReport {
    succeeded: usize,
    failed: usize,
    total_frames: usize,
    units: Vec<UnitReport>,
}

impl BuildReport {
    fn push(&mut self, unit: UnitReport) {
        if unit.status == UnitStatus::Failed {
            self.failed += 1;
        } else {
            self.succeeded += 1;
            self.total_frames += unit.frames;
        }
        self.units.push(unit);
    }
}

/// Everything a build needs besides the unit itself.
struct Pipeline {
    assembler: Assembler,
    renderer: BeamerRenderer,
    compiler: Option<Compiler>,
    subtitle: String,
    root: PathBuf,
    output_dir: PathBuf,
}

fn run_build(args: &BuildArgs) -> Result<bool> {
    let (manifest, root) = load_manifest(&args.manifest)?;

    if !args.print {
        fs::create_dir_all(&args.output).with_context(|| {
            format!("Failed to create output directory: {}", args.output.display())
        })?;
    }

    let compiler = if args.compile && !args.print {
        Some(
            Compiler::new(&args.compiler)
                .with_passes(args.passes)
                .with_timeout(Duration::from_secs(args.timeout))
                .with_working_dir(&root),
        )
    } else {
        None
    };

    // The compiler runs from the manifest root, so the output path must not
    // depend on the caller's working directory.
    let output_dir = if compiler.is_some() {
        fs::canonicalize(&args.output)
            .with_context(|| format!("Failed to resolve {}", args.output.display()))?
    } else {
        args.output.clone()
    };

    let pipeline = Pipeline {
        assembler: Assembler::new()
            .with_chunk_budget(args.chunk_budget)
            .with_max_problems(args.max_problems),
        renderer: BeamerRenderer::new().with_bottom_notes(args.bottom_notes),
        compiler,
        subtitle: manifest.subtitle.clone(),
        root,
        output_dir,
    };

    let first = args.first.unwrap_or(1);
    let last = args.last.unwrap_or(u32::MAX);
    let mut report = BuildReport::default();

    for unit in manifest.units_in_range(first, last) {
        log::info!("Processing {}", unit.display_title());

        let unit_report = match process_unit(unit, &pipeline, args.print) {
            Ok(unit_report) => unit_report,
            Err(e) => {
                eprintln!("Error processing {}: {:#}", unit.display_title(), e);
                UnitReport {
                    number: unit.number,
                    name: unit.name.clone(),
                    status: UnitStatus::Failed,
                    frames: 0,
                    output: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        };
        report.push(unit_report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !args.print {
        print_build_report(&report);
    }

    Ok(report.failed == 0)
}

/// Generate, write, and optionally compile one unit's deck.
fn process_unit(unit: &Unit, pipeline: &Pipeline, print: bool) -> Result<UnitReport> {
    let source = pipeline.root.join(&unit.source);
    let markdown = fs::read_to_string(&source)
        .with_context(|| format!("Failed to read {}", source.display()))?;

    let extracted = topicdeck_core::extract(&markdown);
    let document = pipeline.assembler.assemble_extracted(
        &extracted,
        &unit.fallback_title(),
        &pipeline.subtitle,
        unit.resource.as_deref(),
    );
    let tex = pipeline.renderer.render(&document);
    let frames = document.len();

    log::debug!("  {} frames", frames);

    if print {
        print!("{}", tex);
        return Ok(UnitReport {
            number: unit.number,
            name: unit.name.clone(),
            status: UnitStatus::Generated,
            frames,
            output: None,
            error: None,
        });
    }

    let tex_path = pipeline
        .output_dir
        .join(format!("{}.tex", unit.output_stem()));
    files::write_output(&tex_path, &tex)?;
    log::info!("Written to: {}", tex_path.display());

    let Some(compiler) = &pipeline.compiler else {
        return Ok(UnitReport {
            number: unit.number,
            name: unit.name.clone(),
            status: UnitStatus::Generated,
            frames,
            output: Some(tex_path),
            error: None,
        });
    };

    let compiled = compiler.compile(&tex_path, &pipeline.output_dir);
    if let Err(e) = files::clean_auxiliary(&pipeline.output_dir) {
        log::warn!("Auxiliary cleanup failed: {:#}", e);
    }
    let pdf = compiled?;

    Ok(UnitReport {
        number: unit.number,
        name: unit.name.clone(),
        status: UnitStatus::Compiled,
        frames,
        output: Some(pdf),
        error: None,
    })
}

fn print_build_report(report: &BuildReport) {
    for unit in &report.units {
        match unit.status {
            UnitStatus::Failed => println!(
                "[FAIL] {:02}. {}: {}",
                unit.number,
                unit.name,
                unit.error.as_deref().unwrap_or("unknown error")
            ),
            _ => println!("[OK]   {:02}. {} ({} frames)", unit.number, unit.name, unit.frames),
        }
    }
    println!();
    println!(
        "Built {}/{} decks, {} frames total",
        report.succeeded,
        report.succeeded + report.failed,
        report.total_frames
    );
}

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    file: &'a Path,
    #[serde(flatten)]
    audit: DeckAudit,
}

fn run_audit(inputs: &[PathBuf], json: bool) -> Result<bool> {
    let mut entries = Vec::new();
    let mut unreadable = 0;

    for path in inputs {
        match fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        {
            Ok(tex) => entries.push(AuditEntry {
                file: path,
                audit: audit(&tex),
            }),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                unreadable += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            print_audit(entry);
        }
    }

    let failed = entries.iter().filter(|e| !e.audit.passed()).count() + unreadable;
    if !json {
        println!(
            "{} of {} decks passed",
            inputs.len() - failed,
            inputs.len()
        );
    }
    Ok(failed == 0)
}

fn print_audit(entry: &AuditEntry<'_>) {
    let report = &entry.audit;
    let status = if report.passed() { "PASS" } else { "FAIL" };
    println!("[{}] {}", status, entry.file.display());
    if let Some(title) = &report.title {
        println!("  Title: {}", title);
    }
    println!(
        "  Frames: {} (concept {}, problems {}, solutions {}, takeaways {})",
        report.total_frames,
        report.concept_frames,
        report.problem_frames,
        report.solution_blocks,
        report.takeaway_items
    );
    for issue in report.issues() {
        println!("  issue: {}", issue);
    }
    for warning in report.warnings() {
        println!("  warning: {}", warning);
    }
}

fn run_verify(manifest_path: &Path, pdfs: Option<&Path>) -> Result<bool> {
    let (manifest, root) = load_manifest(manifest_path)?;
    let mut found = 0;
    let mut missing = 0;

    let mut check = |label: &str, path: PathBuf| {
        if path.exists() {
            found += 1;
            log::debug!("found {} {}", label, path.display());
        } else {
            missing += 1;
            println!("[MISSING] {} {}", label, path.display());
        }
    };

    for unit in &manifest.units {
        check("source", root.join(&unit.source));
        if let Some(resource) = &unit.resource {
            check("resource", root.join(resource));
        }
        if let Some(dir) = pdfs {
            check("pdf", dir.join(format!("{}.pdf", unit.output_stem())));
        }
    }

    println!(
        "{} units: {} found, {} missing",
        manifest.units.len(),
        found,
        missing
    );
    Ok(missing == 0)
}

fn run_frontmatter(manifest_path: &Path, dry_run: bool) -> Result<bool> {
    let (manifest, root) = load_manifest(manifest_path)?;
    let mut updated = 0;
    let mut failed = 0;

    for (index, unit) in manifest.units.iter().enumerate() {
        let path = root.join(&unit.source);
        match update_front_matter(&manifest.units, index, &path, dry_run) {
            Ok(true) => updated += 1,
            Ok(false) => log::debug!("{} already up to date", path.display()),
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    let verb = if dry_run { "Would update" } else { "Updated" };
    println!("{} {} of {} pages", verb, updated, manifest.units.len());
    Ok(failed == 0)
}

/// Rewrite one page's front matter. Returns whether the content changed.
fn update_front_matter(units: &[Unit], index: usize, path: &Path, dry_run: bool) -> Result<bool> {
    let block = navigation_front_matter(units, index).context("Unit index out of range")?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let rewritten = replace_front_matter(&strip_legacy_navigation(&content), &block);
    if rewritten == content {
        return Ok(false);
    }

    if dry_run {
        println!("would update {}", path.display());
    } else {
        files::write_output(path, &rewritten)?;
        log::info!("Updated {}", path.display());
    }
    Ok(true)
}

fn run_renumber(manifest_path: &Path, extensions: &[String], dry_run: bool) -> Result<bool> {
    let (manifest, root) = load_manifest(manifest_path)?;
    let plan = RenumberPlan::from_units(&manifest.units)?;

    if plan.is_empty() {
        println!("Nothing to renumber");
        return Ok(true);
    }

    let moves = plan.folder_moves();
    if dry_run {
        for mv in &moves {
            println!("{} -> {}", mv.from, mv.to);
        }
        return Ok(true);
    }

    let moved = files::apply_moves(&root, &moves)?;

    let mut rewritten = 0;
    let mut failed = 0;
    for path in files::find_files(&root, extensions)? {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let updated = plan.rewrite_references(&content);
        if updated == content {
            continue;
        }
        match files::write_output(&path, &updated) {
            Ok(()) => {
                log::info!("Rewrote references in {}", path.display());
                rewritten += 1;
            }
            Err(e) => {
                eprintln!("Error: {:#}", e);
                failed += 1;
            }
        }
    }

    println!(
        "Applied {} folder moves, rewrote references in {} files",
        moved, rewritten
    );
    Ok(failed == 0)
}
