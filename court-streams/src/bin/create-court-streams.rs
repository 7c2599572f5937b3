use clap::Parser;
use court_streams::artifacts::{ArtifactWriter, RelaySources, WriteReport};
use court_streams::credentials::{CredentialManager, TokenStore};
use court_streams::orchestrator::{self, RunSettings};
use court_streams::{Config, Locale, summary};
use eyre::Context;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Creates today's YouTube live broadcasts for every court and rewrites the front-end manifest
/// and go2rtc relay configuration.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// YAML config file; built-in defaults are used without it.
    #[arg(long, env = "COURT_STREAMS_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// OAuth client secrets, needed only for interactive authorization.
    #[arg(long, value_name = "FILE")]
    client_secrets: Option<PathBuf>,

    /// Stored access and refresh token.
    #[arg(long, value_name = "FILE")]
    token_file: Option<PathBuf>,

    /// Front-end manifest to write.
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// go2rtc configuration to write.
    #[arg(long, value_name = "FILE")]
    relay_config: Option<PathBuf>,

    /// Stream details dump to write.
    #[arg(long, value_name = "FILE")]
    details: Option<PathBuf>,

    /// Fail instead of opening a browser when the stored token cannot be used.
    #[arg(long)]
    non_interactive: bool,

    /// Locale of the broadcast titles.
    #[arg(long, value_enum)]
    locale: Option<Locale>,
}

impl Args {
    fn config(&self) -> eyre::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        let paths = &mut config.paths;
        for (flag, target) in [
            (&self.client_secrets, &mut paths.client_secrets),
            (&self.token_file, &mut paths.token),
            (&self.manifest, &mut paths.manifest),
            (&self.relay_config, &mut paths.relay_config),
            (&self.details, &mut paths.details),
        ] {
            if let Some(path) = flag {
                *target = path.clone();
            }
        }
        if let Some(locale) = self.locale {
            config.locale = locale;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // camera URLs for the relay config usually live in .env next to the cron job
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("cannot load .env: {e}"),
    }

    let args = Args::parse();
    let config = args.config().context("load configuration")?;

    let started = jiff::Zoned::now();
    println!("{}", summary::banner(started.datetime()));

    println!("\nAuthenticating with YouTube API...");
    let credentials = CredentialManager::new(
        TokenStore::new(&config.paths.token),
        &config.paths.client_secrets,
        !args.non_interactive,
    );
    let client = credentials
        .obtain_client(&config.api_base, reqwest::Client::new())
        .await
        .context("authenticate with YouTube")?;
    println!("✓ Authentication successful");

    let settings = RunSettings::new(&config, started.date());
    let outcome = orchestrator::run(&client, &config.venues, &settings).await;

    let sources = RelaySources::from_env(&config.relay, &config.venues);
    let written = ArtifactWriter::new(config.paths.clone(), config.relay.clone())
        .write(&outcome.results, &sources)
        .await;

    let nothing_written = WriteReport::default();
    let report = written.as_ref().unwrap_or(&nothing_written);
    println!("\n{}", summary::render(&outcome, report));

    written.context("write artifacts")?;
    Ok(())
}
