//! skillpack - discover, validate, and progressively load agent skills.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use skillpack_core::bootstrap::AppBuilder;
use skillpack_skills::lint::lint_skill_dir;
use skillpack_skills::matcher::TaskContext;
use skillpack_skills::prompt::{format_loaded, format_metadata_tier};
use skillpack_skills::resource::ResourceKind;
use skillpack_skills::watcher::SkillEvent;

mod init;

/// Skill registry and progressive loader
#[derive(Parser)]
#[command(name = "skillpack", version)]
#[command(about = "Discover, validate, and progressively load agent skills", long_about = None)]
struct Cli {
    /// Path to the TOML config file (overrides `SKILLPACK_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List indexed skills with their descriptions
    List,

    /// Scan every skill root and report packages that were left out
    Check,

    /// Lint a single skill directory
    Validate {
        /// Skill directory containing the entry document
        dir: PathBuf,
    },

    /// Print a skill's metadata, resources, and instructions body
    Show { name: String },

    /// Print one bundled resource of a skill
    Resource {
        name: String,
        /// Path relative to the skill directory, e.g. `references/api.md`
        path: String,
    },

    /// Run trigger matching for a task and report tier transitions
    ///
    /// Skills named with `/skill-name` in the task are always loaded.
    Activate {
        /// Task description
        #[arg(required = true)]
        task: Vec<String>,

        /// Print the rendered prompt context instead of transitions
        #[arg(long)]
        prompt: bool,
    },

    /// Scaffold a new skill directory
    Init {
        name: String,

        /// Parent directory for the new skill
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Skill description; prompted for when omitted
        #[arg(long)]
        description: Option<String>,
    },

    /// Rebuild the index whenever an entry document changes
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Scaffolding does not depend on a valid config.
    if let Commands::Init {
        name,
        path,
        description,
    } = cli.command
    {
        init_subscriber("info");
        let dir = init::run(&name, &path, description)?;
        println!("created {}", dir.display());
        return Ok(());
    }

    let builder = AppBuilder::from_cli(cli.config.as_deref())?;
    init_subscriber(&builder.config().logging.filter);
    tracing::debug!("using config {}", builder.config_path().display());

    match cli.command {
        Commands::List => list(&builder),
        Commands::Check => check(&builder),
        Commands::Validate { dir } => validate(&builder, &dir),
        Commands::Show { name } => show(&builder, &name),
        Commands::Resource { name, path } => resource(&builder, &name, &path),
        Commands::Activate { task, prompt } => activate(&builder, &task.join(" "), prompt),
        Commands::Watch => watch(&builder).await,
        Commands::Init { .. } => Ok(()),
    }
}

fn init_subscriber(configured: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(configured))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn list(builder: &AppBuilder) -> anyhow::Result<()> {
    let (registry, _) = builder.build_registry()?;
    let index = registry.snapshot();
    if index.is_empty() {
        println!("no skills found");
        return Ok(());
    }
    let width = index.list().map(|m| m.name.len()).max().unwrap_or(0);
    for meta in index.list() {
        println!("{:width$}  {}", meta.name, meta.description);
    }
    Ok(())
}

fn check(builder: &AppBuilder) -> anyhow::Result<()> {
    let (registry, errors) = builder.build_registry()?;
    let indexed = registry.snapshot().len();
    for e in &errors {
        println!("error: {e}");
    }
    if errors.is_empty() {
        println!("{indexed} skill(s) ok");
        Ok(())
    } else {
        bail!("{} skill(s) excluded, {indexed} indexed", errors.len());
    }
}

fn validate(builder: &AppBuilder, dir: &Path) -> anyhow::Result<()> {
    let skills = &builder.config().skills;
    let warnings = lint_skill_dir(dir, &skills.entry_document, skills.max_body_bytes)
        .with_context(|| format!("{} is not a valid skill", dir.display()))?;
    for warning in &warnings {
        println!("warning: {warning}");
    }
    println!(
        "{} is valid ({} warning(s))",
        dir.display(),
        warnings.len()
    );
    Ok(())
}

fn show(builder: &AppBuilder, name: &str) -> anyhow::Result<()> {
    let (registry, _) = builder.build_registry()?;
    let mut loader = builder.build_loader(&registry);
    loader.load_body(name)?;

    let package = loader.index().lookup(name)?;
    println!("name:        {}", package.name());
    println!("description: {}", package.description());
    println!("root:        {}", package.root().display());
    println!("hash:        {}", package.content_hash());
    for kind in [
        ResourceKind::Reference,
        ResourceKind::Script,
        ResourceKind::Asset,
        ResourceKind::Other,
    ] {
        for path in package.resources_of_kind(kind) {
            println!("resource:    {path} ({kind:?})");
        }
    }
    println!();
    if let Some(body) = loader.body(name) {
        println!("{body}");
    }
    Ok(())
}

fn resource(builder: &AppBuilder, name: &str, path: &str) -> anyhow::Result<()> {
    let (registry, _) = builder.build_registry()?;
    let mut loader = builder.build_loader(&registry);
    loader.load_resource(name, path)?;

    if let Some(bytes) = loader.resources(name).map(|(_, bytes)| bytes).next() {
        std::io::stdout()
            .write_all(bytes)
            .context("failed to write resource")?;
    }
    Ok(())
}

fn activate(builder: &AppBuilder, task: &str, prompt: bool) -> anyhow::Result<()> {
    let (registry, _) = builder.build_registry()?;
    let mut loader = builder.build_loader(&registry);
    let transitions = loader.activate(&TaskContext::new(task));

    if prompt {
        let metadata = format_metadata_tier(loader.resident_metadata());
        if !metadata.is_empty() {
            println!("{metadata}");
        }
        print!("{}", format_loaded(&loader, std::env::consts::OS));
        return Ok(());
    }

    for transition in &transitions {
        println!("{transition}");
    }
    let loaded = loader.loaded_bodies().count();
    println!("{loaded} skill body(ies) loaded");
    Ok(())
}

async fn watch(builder: &AppBuilder) -> anyhow::Result<()> {
    let (registry, _) = builder.build_registry()?;
    let mut bundle = builder.build_watchers();
    if bundle.skill_watcher.is_none() {
        bail!("skill watcher unavailable, check skills.paths and skills.hot_reload");
    }
    println!(
        "watching {} skill(s), press Ctrl-C to stop",
        registry.snapshot().len()
    );

    loop {
        tokio::select! {
            event = bundle.skill_reload_rx.recv() => {
                let Some(SkillEvent::Changed) = event else {
                    break;
                };
                match registry.rescan() {
                    Ok(outcome) => {
                        for e in &outcome.errors {
                            tracing::warn!("skipped skill {e}");
                        }
                        if outcome.changed {
                            println!("reloaded: {} skill(s)", registry.snapshot().len());
                        }
                    }
                    Err(e) => tracing::error!("reload failed: {e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
