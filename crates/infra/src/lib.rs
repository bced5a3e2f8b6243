//! Infrastructure layer: storage, configuration, and the application services.

pub mod config;
pub mod error;
pub mod services;
pub mod store;


pub use config::AppConfig;
pub use error::{ServiceError, ServiceResult};
pub use services::Services;
pub use store::{Collection, StoreError, Stores};
