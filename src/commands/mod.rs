pub mod examples;
pub mod run;

use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, utils};

/// pruner — cascading entry removal for multi-sheet metadata manifests
#[derive(Parser)]
#[command(name = "pruner", version, about)]
pub struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove entries (and discovered children) from a manifest
    Run(run::RunArgs),
    /// Emit a small example manifest, template, and entry list
    GenerateExamples(examples::ExamplesArgs),
    /// Show the effective configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        utils::init_logging(&self.common);
        let config = utils::load_config(self.common.config.as_ref())?;

        match self.command {
            Commands::Run(args) => run::execute(args, &config),
            Commands::GenerateExamples(args) => examples::execute(args),
            Commands::Config { json } => utils::display_config(&config, json),
        }
    }
}
