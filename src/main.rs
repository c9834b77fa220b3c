mod cli;

use anyhow::{Context, Result};
use cli::RunArgs;
use dns_conformance::{Config, Runner, SharedConfig, ShellExecutor};
use is_terminal::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_init();

    match run(RunArgs::from_env()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every selected case passed.
async fn run(args: RunArgs) -> Result<bool> {
    let config = config_init(&args)?;
    let cases = dns_conformance::generate(&config)?;

    let executor = Arc::new(ShellExecutor::from_config(&config));
    let runner = Runner::new(config.clone(), executor)
        .with_filter(args.filter.clone())
        .fail_fast(args.fail_fast);

    if args.list {
        for case in runner.selected(&cases) {
            println!("{}\t{}", case.name, case.command);
        }
        return Ok(true);
    }

    let report = runner.run(&cases).await;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text(std::io::stdout().is_terminal()));
    }
    tracing::info!(
        "{} passed, {} failed, {} errors",
        report.passed(),
        report.failed(),
        report.errors()
    );
    Ok(report.is_success())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dns_conformance=info".into()),
        )
        .init();
}

fn config_init(args: &RunArgs) -> Result<SharedConfig> {
    let mut config = match &args.config {
        None => Config::default(),
        Some(path) => {
            let config = Config::try_from_file(path)
                .with_context(|| format!("loading suite {}", path.display()))?;
            tracing::debug!("loaded suite from {}", path.display());
            config
        }
    };
    if let Some(binary) = &args.binary {
        config.binary = binary.clone();
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.validate()?;
    Ok(Arc::new(config))
}
