pub mod common;
pub mod errors;
pub mod extract;
pub mod fields;
pub mod llms;
pub mod logo;
pub mod parse;
pub mod pipeline;
pub mod shopify;
pub mod splice;
pub mod storage;

pub use common::{
    AppConfig, BindAddressError, GitHubConfig, bind_address, get_github_config, health_check, health_router,
    is_env_set, setup_cli_logging, setup_logging,
};
pub use errors::Error;
pub use extract::{TextKind, TextNode, extract_text_nodes};
pub use fields::{ClientFields, extract_fields, fill_placeholders};
pub use logo::{LogoSource, classify_logo, find_image_url, inject_logo};
pub use parse::{PersonalizedNode, parse_response};
pub use pipeline::{Outcome, PersonalizeRequest, Personalization, personalize};
pub use splice::{splice, splice_counting};
