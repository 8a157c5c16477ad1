use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(default_log_settings: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_settings.into())
}

/// Sets the logging (tracing) level using RUST_LOG, falling back to the supplied default log settings.
pub fn setup_logging(default_log_settings: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_log_settings))
        .with(fmt::layer().with_target(true))
        .init()
}

/// Like `setup_logging`, but logs go to stderr so stdout carries only the command's output.
pub fn setup_cli_logging(default_log_settings: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_log_settings))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init()
}
