use std::sync::Arc;

use printworks_infra::services::TracingNotifier;
use printworks_infra::{AppConfig, Services, StoreError, Stores};
use printworks_orders::InMemoryUserDirectory;

/// Everything a handler can reach.
pub type AppServices = Services;

/// Wire services over the stores and catalog selected by `config`.
///
/// The user directory starts empty, so order notifications go out without contact details.
pub fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let stores = Stores::from_config(config)?;
    let catalog = config.load_catalog()?;
    Ok(Services::new(
        stores,
        Arc::new(catalog),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(TracingNotifier),
    ))
}
