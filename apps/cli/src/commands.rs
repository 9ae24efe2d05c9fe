//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use structprompt_core::{PromptDefinition, StageSet};
use structprompt_shared::{AppConfig, BulletStyle, IndentationPreferences, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// structprompt — build stage-ordered prompts from declarative files.
#[derive(Parser)]
#[command(
    name = "structprompt",
    version,
    about = "Render structured, stage-ordered prompt documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Render a prompt definition against a stage file.
    Render {
        /// Stage hierarchy file (TOML).
        #[arg(long)]
        stages: PathBuf,

        /// Prompt definition file (TOML).
        #[arg(long)]
        prompt: PathBuf,

        /// Indent width per depth (overrides config).
        #[arg(long)]
        spaces: Option<usize>,

        /// Bullet styles by depth, comma-separated (overrides config).
        #[arg(long, value_delimiter = ',')]
        progression: Option<Vec<BulletStyle>>,

        /// Blank line between top-level sections (overrides config).
        #[arg(long)]
        blank_lines: Option<bool>,

        /// Write the rendered prompt to a file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the stage hierarchy with dotted keys and fixed indices.
    Stages {
        /// Stage hierarchy file (TOML).
        #[arg(long)]
        stages: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so rendered
/// prompts on stdout stay clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "structprompt=info",
        1 => "structprompt=debug",
        _ => "structprompt=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render {
            stages,
            prompt,
            spaces,
            progression,
            blank_lines,
            out,
        } => {
            let overrides = RenderOverrides {
                spaces,
                progression,
                blank_lines,
            };
            cmd_render(&stages, &prompt, overrides, out.as_deref())
        }
        Command::Stages { stages } => cmd_stages(&stages),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Render flags that take precedence over the config file.
#[derive(Debug, Default)]
struct RenderOverrides {
    spaces: Option<usize>,
    progression: Option<Vec<BulletStyle>>,
    blank_lines: Option<bool>,
}

impl RenderOverrides {
    fn apply(self, config: &AppConfig) -> IndentationPreferences {
        let mut prefs = IndentationPreferences::from(config);
        if let Some(spaces) = self.spaces {
            prefs.spaces_per_level = spaces;
        }
        if let Some(progression) = self.progression {
            prefs.progression = progression;
        }
        if let Some(blank_lines) = self.blank_lines {
            prefs.blank_line_between_top = blank_lines;
        }
        prefs
    }
}

fn cmd_render(
    stages_path: &Path,
    prompt_path: &Path,
    overrides: RenderOverrides,
    out: Option<&Path>,
) -> Result<()> {
    let config = load_config()?;
    let prefs = overrides.apply(&config);

    let stages = StageSet::load_from(stages_path)
        .wrap_err_with(|| format!("failed to load stages from {}", stages_path.display()))?;
    let definition = PromptDefinition::load_from(prompt_path)
        .wrap_err_with(|| format!("failed to load prompt from {}", prompt_path.display()))?;

    let doc = definition.build(Arc::new(stages), prefs)?;
    let rendered = doc.render();

    match out {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "prompt written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_stages(stages_path: &Path) -> Result<()> {
    let stages = StageSet::load_from(stages_path)
        .wrap_err_with(|| format!("failed to load stages from {}", stages_path.display()))?;

    for (depth, id) in stages.walk() {
        let Some(stage) = stages.get(id) else {
            continue;
        };
        let fixed = stages
            .fixed_order(id)
            .map(|index| format!("  [fixed {index}]"))
            .unwrap_or_default();
        println!(
            "{}{} ({}){fixed}",
            "  ".repeat(depth),
            stage.display_name,
            stages.dotted_key(id),
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
