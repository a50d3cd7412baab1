use clap::Parser;
use gizicare_cli::cli::Cli;
use gizicare_cli::context::Context;
use gizicare_client::config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Configure logging from env var `GIZICARE_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = if cli.verbose {
        "debug".to_string()
    } else {
        std::env::var("GIZICARE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string())
    };
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("{log_env},hyper=warn,reqwest=warn"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("gizicare: log filter: {}", log_env);

    // Opt-in request metrics, printed to stderr on exit.
    let metrics = match std::env::var("GIZICARE_METRICS") {
        Ok(v) if !v.is_empty() && v != "0" => Some(PrometheusBuilder::new().install_recorder()?),
        _ => None,
    };

    let config = Config::from_env()?;
    let mut ctx = Context::load(config).await?;
    let outcome = gizicare_cli::run(cli, &mut ctx).await;

    if let Some(handle) = metrics {
        eprintln!("{}", handle.render());
    }

    match outcome {
        Ok(text) => {
            if !text.is_empty() {
                println!("{}", text.trim_end());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}
