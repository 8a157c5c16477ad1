pub mod app_config;
pub mod bind_address;
pub mod env;
pub mod github_config;
pub mod health;
pub mod logging;

pub use app_config::AppConfig;
pub use bind_address::{BindAddressError, bind_address};
pub use env::{env_or, is_env_set};
pub use github_config::{GitHubConfig, get_github_config};
pub use health::{health_check, health_router};
pub use logging::{setup_cli_logging, setup_logging};
