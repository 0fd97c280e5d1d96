mod file_provider;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::warn;

use canopy_core::context::Stack;
use canopy_core::effect::Effect;
use canopy_core::interpreter::{ApplyResult, EffectOutcome, Interpreter, InterpreterConfig};
use canopy_core::plan::Plan;
use canopy_core::resource::Value;
use canopy_oci::compute::ComputeBuilder;
use canopy_oci::config::{Config, DEFAULT_CONFIG_PATH};
use canopy_oci::network::NetworkBuilder;
use canopy_oci::{deploy, oci_stack};

use crate::file_provider::{FileProvider, json_to_value, value_to_json};

/// Directory holding the local provider's state and the saved outputs
const DEFAULT_STATE_DIR: &str = ".canopy";
const OUTPUTS_FILE: &str = "outputs.json";

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "OCI network and compute topology as code", long_about = None)]
struct Cli {
    /// Path to the YAML stack description
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stack name
    #[arg(long, global = true, default_value = "dev")]
    stack: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate,
    /// Show the resources that would be created
    Plan,
    /// Create the resources with the local provider
    Apply {
        /// Skip all side effects
        #[arg(long)]
        dry_run: bool,

        /// Keep applying after a resource fails
        #[arg(long)]
        continue_on_error: bool,

        /// Directory for the local state file and outputs
        #[arg(long, default_value = DEFAULT_STATE_DIR)]
        state_dir: PathBuf,
    },
    /// Print the outputs saved by the last apply
    Outputs {
        /// Directory for the local state file and outputs
        #[arg(long, default_value = DEFAULT_STATE_DIR)]
        state_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate => run_validate(&cli.config),
        Commands::Plan => run_plan(&cli.config, &cli.stack),
        Commands::Apply {
            dry_run,
            continue_on_error,
            state_dir,
        } => {
            let config = InterpreterConfig {
                dry_run,
                continue_on_error,
            };
            run_apply(&cli.config, &cli.stack, config, &state_dir).await
        }
        Commands::Outputs { state_dir } => run_outputs(&state_dir),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn build_stack(path: &Path, name: &str) -> Result<Stack> {
    let config = load_config(path)?;
    let mut stack = oci_stack(name);
    deploy(&config, &mut stack).with_context(|| format!("Failed to build stack '{}'", name))?;
    Ok(stack)
}

fn run_validate(path: &Path) -> Result<()> {
    println!("{}", "Validating...".cyan());

    let config = load_config(path)?;
    NetworkBuilder::new(&config.network).validate()?;
    ComputeBuilder::new(&config.compute).validate()?;
    if let Some(storage) = &config.storage {
        storage.validate()?;
    }

    println!("{}", "✓ Configuration is valid.".green().bold());
    println!("  • VCN {} ({})", config.network.display_name, config.network.cidr_block);
    println!("  • {} subnet(s)", config.network.subnets.len());
    println!("  • {} security list(s)", config.network.security_lists.len());
    println!("  • {} instance(s)", config.compute.instances.len());
    if let Some(storage) = &config.storage {
        println!("  • bucket {} in {}", storage.bucket_name, storage.compartment_name);
    }
    Ok(())
}

fn run_plan(path: &Path, name: &str) -> Result<()> {
    let stack = build_stack(path, name)?;
    print_plan(stack.plan());
    println!();
    print_outputs("Outputs (known after apply):", stack.outputs());
    Ok(())
}

async fn run_apply(
    path: &Path,
    name: &str,
    config: InterpreterConfig,
    state_dir: &Path,
) -> Result<()> {
    let stack = build_stack(path, name)?;
    print_plan(stack.plan());
    println!();

    if config.dry_run {
        println!("{}", "Dry run: no changes will be made.".yellow());
    }
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let dry_run = config.dry_run;
    let interpreter = Interpreter::new(FileProvider::new(state_dir)).with_config(config);
    let result = interpreter.apply(stack.plan()).await;
    print_outcomes(stack.plan(), &result);

    let outputs = result.resolve_outputs(stack.outputs());
    println!();
    print_outputs("Outputs:", &outputs);

    if !result.is_success() {
        bail!(
            "Apply failed. {} succeeded, {} failed.",
            result.success_count,
            result.failure_count
        );
    }

    if !dry_run {
        save_outputs(state_dir, &outputs)?;
    }
    println!();
    println!(
        "{}",
        format!("Apply complete! {} effects applied.", result.success_count)
            .green()
            .bold()
    );
    Ok(())
}

fn run_outputs(state_dir: &Path) -> Result<()> {
    let path = state_dir.join(OUTPUTS_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("No outputs found at {}; run apply first", path.display()))?;
    let json: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

    let outputs: Vec<_> = json
        .iter()
        .map(|(k, v)| (k.clone(), json_to_value(v)))
        .collect();
    print_outputs("Outputs:", &outputs);
    Ok(())
}

fn save_outputs(state_dir: &Path, outputs: &[(String, Value)]) -> Result<()> {
    let mut json = serde_json::Map::new();
    for (key, value) in outputs {
        if value.is_unresolved() {
            warn!("Output {} was not resolved and is not saved", key);
            continue;
        }
        json.insert(key.clone(), value_to_json(value));
    }

    fs::create_dir_all(state_dir)
        .with_context(|| format!("Failed to create {}", state_dir.display()))?;
    let path = state_dir.join(OUTPUTS_FILE);
    fs::write(&path, serde_json::to_string_pretty(&json)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "Nothing to create.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();
    for effect in plan.effects() {
        println!("{}", format_effect(effect));
        let resource = effect.resource();
        let mut keys: Vec<_> = resource.attributes.keys().collect();
        keys.sort();
        for key in keys {
            println!("      {}: {}", key, resource.attributes[key]);
        }
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}

fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Create(r) => format!("  {} {}", "+".green().bold(), r.id),
        Effect::Read(r) => format!("  {} {}", "<=".cyan().bold(), r.id),
    }
}

fn print_outcomes(plan: &Plan, result: &ApplyResult) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(EffectOutcome::Created { state }) => {
                let id = state.identifier.as_deref().unwrap_or("-");
                println!("  {} {} ({})", "✓".green(), effect, id.dimmed());
            }
            Ok(EffectOutcome::Read { .. }) => println!("  {} {}", "✓".green(), effect),
            Ok(EffectOutcome::Skipped { reason }) => {
                println!("  {} {} ({})", "-".yellow(), effect, reason)
            }
            Err(e) => println!("  {} {} - {}", "✗".red(), effect, e),
        }
    }
}

fn print_outputs(title: &str, outputs: &[(String, Value)]) {
    if outputs.is_empty() {
        return;
    }
    println!("{}", title.cyan().bold());
    for (key, value) in outputs {
        println!("  {} = {}", key, value);
    }
}
