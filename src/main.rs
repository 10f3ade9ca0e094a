mod app;
mod cli;
mod config;
mod error;
mod models;
mod store;

use app::App;
use cli::{parse_args, AppAction};
use config::Config;
use error::{AppError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let action = match parse_args(&args) {
        Ok(action) => action,
        Err(e @ (AppError::Usage(_) | AppError::InvalidGroupId(_))) => {
            eprintln!("Error: {}\n\n{}", e, cli::USAGE);
            std::process::exit(2);
        }
        Err(e) => return Err(e),
    };

    if action == AppAction::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    tracing::debug!("Using {:?} backend", config.backend);

    let app = App::new(&config).await?;
    let output = app.handle_action(action).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
