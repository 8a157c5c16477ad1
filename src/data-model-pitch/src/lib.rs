pub mod models;
pub mod store;
pub mod tokens;

pub use store::{ClientStore, StoreError};
pub use tokens::TokenStore;
