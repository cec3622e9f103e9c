use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use const_format::concatcp;
use eyre::{Result as EyreResult, WrapErr};
use tracing::info;

use crate::artifact::load_abi;
use crate::config::{AbiConfig, DEFAULT_ABI_DIR};
use crate::extract::{extract, Mode};
use crate::inspect::summarize;

pub const EXAMPLES: &str = r"
  # Extract EntryPoint.abi and DexManager.abi after `npx hardhat compile`
  $ aadex-abi

  # Fail if the committed ABI files no longer match the build artifacts
  $ aadex-abi extract --check

  # Summarize the entries of a single build artifact
  $ aadex-abi inspect artifacts/contracts/aadex/AADexManager.sol/AADexManager.json
";

#[derive(Debug, Parser)]
#[command(name = "aadex-abi", author, version)]
#[command(about = "Extract contract ABIs from Hardhat build artifacts")]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  AADEX_ABI_DIR    Directory receiving the ABI files\n",
    "  RUST_LOG         Log filter (default: aadex_abi=info)\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: Option<SubCommands>,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    /// Write the ABI of every configured build artifact
    Extract(ExtractCommand),
    /// Summarize the ABI of a build artifact
    Inspect(InspectCommand),
}

#[derive(Debug, Args)]
pub struct RootArgs {
    /// Directory receiving the ABI files
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_ABI_DIR)]
    #[arg(env = "AADEX_ABI_DIR", hide_env_values = true)]
    pub abi_dir: Utf8PathBuf,

    /// Configuration file (defaults to abi.toml in the ABI directory, if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Args)]
pub struct ExtractCommand {
    /// Check that the ABI files are up to date instead of writing them
    #[arg(long)]
    pub check: bool,

    /// Print the outcome of every target as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Build artifact JSON file
    #[arg(value_name = "ARTIFACT")]
    pub artifact: Utf8PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RootCommand {
    pub fn run(self) -> EyreResult<()> {
        match self.action {
            None => ExtractCommand::default().run(&self.args),
            Some(SubCommands::Extract(extract)) => extract.run(&self.args),
            Some(SubCommands::Inspect(inspect)) => inspect.run(),
        }
    }
}

impl ExtractCommand {
    pub fn run(self, args: &RootArgs) -> EyreResult<()> {
        let config = AbiConfig::load(&args.abi_dir, args.config.as_deref())
            .wrap_err("failed to load configuration")?;

        let mode = if self.check { Mode::Check } else { Mode::Write };

        let outcomes = extract(&config, mode)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        } else {
            for outcome in &outcomes {
                println!("{}\t{}\t{}", outcome.status, outcome.name, outcome.output);
            }
        }

        info!(count = outcomes.len(), ?mode, "done");

        Ok(())
    }
}

impl InspectCommand {
    pub fn run(self) -> EyreResult<()> {
        let abi = load_abi(&self.artifact)?;
        let summary = summarize(&abi);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Build artifact: {}", self.artifact);
            summary.print();
        }

        Ok(())
    }
}
