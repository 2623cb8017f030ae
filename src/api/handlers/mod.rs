pub mod files;
pub mod health;
pub mod types;
pub mod upload;
