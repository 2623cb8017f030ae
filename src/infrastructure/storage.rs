use crate::config::ServerConfig;
use crate::services::storage::StorageService;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Builds the disk storage and makes sure its directory exists
pub async fn setup_storage(config: &ServerConfig) -> Result<Arc<StorageService>> {
    let storage = StorageService::new(&config.upload_dir);

    if storage.is_available().await {
        info!("✅ Upload directory '{}' is ready", config.upload_dir.display());
    } else {
        info!(
            "📁 Upload directory '{}' not found, creating...",
            config.upload_dir.display()
        );
        storage.ensure_root().await?;
        info!(
            "✅ Upload directory '{}' created successfully",
            config.upload_dir.display()
        );
    }

    Ok(Arc::new(storage))
}
