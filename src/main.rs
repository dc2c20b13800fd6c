//! mock-conductor - serve the conductor interfaces until interrupted

use clap::Parser;
use mockconductor::cli::{Cli, Commands};
use mockconductor::{Conductor, FaultToggle};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mockconductor=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            init_tracing(cli.args.log_json);
            let config = cli.args.resolve()?;

            let fault = FaultToggle::new();
            if cli.args.fail_first_log_request {
                fault.arm();
            }
            let conductor = Conductor::start_with_fault(&config, fault).await?;
            info!("mock-conductor v{} ready", env!("CARGO_PKG_VERSION"));

            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Interrupted, shutting down");
                    conductor.stop().await;
                }
                (kind, fault) = conductor.fatal() => {
                    error!("{} interface stopped: {}", kind, fault);
                    conductor.stop().await;
                    anyhow::bail!("{} interface stopped: {}", kind, fault);
                }
            }
        }

        Commands::Config => {
            print!("{}", cli.args.resolve()?.to_toml_string()?);
        }

        Commands::Version => {
            println!("mock-conductor v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
