use std::process::ExitCode;

use fittrack::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let config = match Config::from_env() {
    Ok(config) => config,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      return ExitCode::FAILURE;
    }
  };

  fittrack::init_tracing(config.log_json);

  if let Err(e) = fittrack::run(config).await {
    tracing::error!(error = %e, "Server failed");
    return ExitCode::FAILURE;
  }
  ExitCode::SUCCESS
}
