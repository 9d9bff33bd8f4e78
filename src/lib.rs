pub mod activity;
pub mod capability;
pub mod cli;
pub mod config;
pub mod models;
pub mod repos;
pub mod store;
pub mod utils;
pub mod views;

pub use config::Config;
pub use store::Store;
pub use utils::Profile;
