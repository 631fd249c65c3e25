//! CLI command implementations.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};

use roster_core::{DisabledUploader, ImageUploader};
use roster_server::{CloudinaryUploader, Server};

use crate::config::Config;

/// Picks the image uploader for the configured credentials.
fn uploader(config: &Config) -> Arc<dyn ImageUploader> {
    if let Some(cloudinary) = config.cloudinary() {
        tracing::info!(cloud = %cloudinary.cloud_name, folder = %cloudinary.folder, "Cloudinary uploads enabled");
        return Arc::new(CloudinaryUploader::new(cloudinary));
    }

    if config.cloudinary_incomplete() {
        tracing::warn!(
            "Cloudinary credentials are incomplete; set CLOUDINARY_CLOUD_NAME, \
             CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET"
        );
    }
    tracing::warn!("Profile picture uploads are disabled; new accounts get the placeholder picture");
    Arc::new(DisabledUploader)
}

/// Start the server.
pub async fn serve(config: Config) -> Result<()> {
    let server_config = config
        .server_config()
        .wrap_err_with(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let server = Server::new(server_config).with_uploader(uploader(&config));
    server.run().await?;

    Ok(())
}

/// Print version information.
pub fn version() {
    println!("roster {}", env!("CARGO_PKG_VERSION"));
}
