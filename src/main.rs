use clap::Parser;
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging; progress is reported at info level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Starting crawler for: {}", config.seed_url);
    ::log::debug!(
        "Web crawling requires a WebDriver server; using {}",
        config.webdriver_url
    );

    match page_tree::run(&config).await {
        Ok(summary) => {
            ::log::info!("Results written to {}", summary.output_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
