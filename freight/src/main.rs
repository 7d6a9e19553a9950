use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod format;
mod logging;

#[cfg(test)]
mod test_support;

/// Freight - artifact version discovery
///
/// Picks the container image or Helm chart version a GitOps pipeline should
/// promote next.
#[derive(Parser, Debug)]
#[command(name = "freight")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a YAML configuration file
    #[arg(long, global = true, env = "FREIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Display version information
    Version,
    /// Select an image from a container repository
    Image {
        /// Repository, e.g. ghcr.io/org/app
        repository: String,
        /// Selection strategy: SemVer, NewestBuild, Lexical, Digest
        #[arg(short, long, default_value = "SemVer")]
        strategy: String,
        /// Version constraint, or the pinned tag for the Digest strategy
        #[arg(short, long)]
        constraint: Option<String>,
        /// Only consider tags matching this regular expression
        #[arg(long)]
        allow_regex: Option<String>,
        /// Tag to skip (can be repeated)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
        /// Required platform, e.g. linux/amd64
        #[arg(long)]
        platform: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: format::OutputFormat,
        #[command(flatten)]
        access: AccessArgs,
    },
    /// Resolve the latest version of a Helm chart
    Chart {
        /// Repository URL (https://... or oci://...)
        repo_url: String,
        /// Chart name; optional when an oci:// URL already names the chart
        chart: Option<String>,
        /// Version constraint, e.g. ^1.2.0
        #[arg(short, long, default_value = "")]
        constraint: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: format::OutputFormat,
        #[command(flatten)]
        access: AccessArgs,
    },
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flags shared by every command that talks to a repository.
#[derive(Args, Debug)]
struct AccessArgs {
    /// Username for the repository
    #[arg(short, long)]
    username: Option<String>,
    /// Password for the repository
    #[arg(short, long)]
    password: Option<String>,
    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,
    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl From<AccessArgs> for context::Flags {
    fn from(args: AccessArgs) -> Self {
        Self {
            username: args.username,
            password: args.password,
            insecure: args.insecure,
            timeout: args.timeout,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Image {
            repository,
            strategy,
            constraint,
            allow_regex,
            ignore,
            platform,
            format,
            access,
        } => {
            let ctx = build_context(cli.config, access.into());
            let request = commands::image::ImageRequest {
                repository,
                strategy,
                constraint,
                allow_regex,
                ignore,
                platform,
            };
            commands::image::handle_image(&ctx, &request, format).await;
        }
        Commands::Chart {
            repo_url,
            chart,
            constraint,
            format,
            access,
        } => {
            let ctx = build_context(cli.config, access.into());
            let request = commands::chart::ChartRequest {
                repo_url,
                chart: chart.unwrap_or_default(),
                constraint,
            };
            commands::chart::handle_chart(&ctx, &request, format).await;
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}

fn build_context(config: Option<PathBuf>, flags: context::Flags) -> context::AppContext {
    match context::AppContext::build(config.as_deref(), flags) {
        Ok(ctx) => ctx,
        Err(e) => {
            format::error(&format::chain(&e));
            std::process::exit(1);
        }
    }
}
