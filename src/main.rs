mod commands;
mod output;

use clap::{Parser, Subcommand};

use sonar_batch::client::SonarQubeConfig;
use sonar_batch::config::{self, StoredConfig};
use sonar_batch::loader::{AnalysisMode, LoadContext};

const DEFAULT_URL: &str = "http://localhost:9000";

#[derive(Parser)]
#[command(
    name = "sonar-batch",
    version,
    about = "Load SonarQube project repositories for a batch analysis",
    long_about = "Load SonarQube project repositories for a batch analysis.\n\n\
        Fetches the quality profiles, active rules and per-file data the server\n\
        holds for a project, the same way an analysis does before it starts.\n\n\
        Load a project:          sonar-batch --project KEY project\n\
        Issues-only analysis:    sonar-batch --project KEY project --issues\n\
        Force a quality profile: sonar-batch --project KEY project --profile \"Sonar way\"\n\n\
        Defaults for --url, --token and --profile can be stored in\n\
        <config dir>/sonar-batch/config.toml."
)]
struct Cli {
    /// SonarQube server URL [default: http://localhost:9000]
    #[arg(long, env = "SONAR_HOST_URL", global = true)]
    url: Option<String>,

    /// Authentication token
    #[arg(long, env = "SONAR_TOKEN", global = true)]
    token: Option<String>,

    /// Project key
    #[arg(long, env = "SONAR_PROJECT_KEY", global = true)]
    project: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load quality profiles, active rules and file data (requires --project)
    #[command(long_about = "Load quality profiles, active rules and file data (requires --project).\n\n\
        Calls /batch/project and fails when the server has no quality profile\n\
        for the project, which usually means no language plugin matches it.\n\n\
        Examples:\n  \
          sonar-batch --project my-proj project\n  \
          sonar-batch --project my-proj project --issues --json\n  \
          sonar-batch --project my-proj project --profile \"Sonar way\"")]
    Project {
        /// Quality profile to use instead of the project's default (sonar.profile)
        #[arg(long, env = "SONAR_PROFILE")]
        profile: Option<String>,

        /// Issues-only analysis (sends preview=true)
        #[arg(long)]
        issues: bool,

        /// Extra analysis property (key=value, repeatable)
        #[arg(short = 'D', long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },
}

impl Cli {
    fn build_config(&self, stored: &StoredConfig) -> SonarQubeConfig {
        let url = self
            .url
            .clone()
            .or_else(|| stored.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let mut config =
            SonarQubeConfig::new(url).with_timeout(std::time::Duration::from_secs(self.timeout));

        if let Some(token) = self.token.as_ref().or(stored.token.as_ref()) {
            config = config.with_token(token);
        }
        config
    }

    fn require_project(&self) -> Result<&str, i32> {
        self.project
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                eprintln!("Project key is required. Use --project or set SONAR_PROJECT_KEY.");
                1
            })
    }
}

/// Turn `-D key=value` arguments into analysis properties
fn parse_properties(props: &[String]) -> Result<Vec<(String, String)>, String> {
    props
        .iter()
        .map(|prop| match prop.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(format!("Invalid property format: {prop} (expected key=value)")),
        })
        .collect()
}

/// Initialise the tracing subscriber.
///
/// When `verbose` is true, the default log level is `debug`; otherwise `warn`.
/// Both cases respect the `RUST_LOG` environment variable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "sonar_batch=debug" } else { "sonar_batch=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let stored = config::load();
    let config = cli.build_config(&stored);

    let exit_code = match cli.command {
        Command::Project {
            ref profile,
            issues,
            ref properties,
        } => {
            let project = match cli.require_project() {
                Ok(p) => p,
                Err(code) => std::process::exit(code),
            };
            let properties = match parse_properties(properties) {
                Ok(p) => p,
                Err(msg) => {
                    eprintln!("{msg}");
                    std::process::exit(1);
                }
            };

            let mode = if issues { AnalysisMode::Issues } else { AnalysisMode::Publish };
            let mut context = LoadContext::new(project).with_mode(mode);
            for (key, value) in properties {
                context = context.with_property(key, value);
            }
            // --profile wins over -Dsonar.profile, which wins over the stored default
            if let Some(profile) = profile {
                context = context.with_profile(profile);
            } else if context.profile().is_none() {
                if let Some(ref stored_profile) = stored.profile {
                    context = context.with_profile(stored_profile);
                }
            }

            commands::project::run(config, &context, cli.json).await
        }
    };

    std::process::exit(exit_code);
}
