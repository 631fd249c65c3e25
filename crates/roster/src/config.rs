//! Configuration management for the Roster server.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (`PORT`, `HOST`, `CLOUDINARY_*`, ...), including
//!    those read from a `.env` file at startup
//! 3. Config file (`roster.toml`, or the path given with `--config`)
//! 4. Default values

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use roster_core::DEFAULT_PROFILE_PIC;
use roster_server::{CloudinaryConfig, ServerConfig};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

/// Environment variables parsed into typed settings.
const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "PUBLIC_DIR",
    "PLACEHOLDER_URL",
    "MAX_UPLOAD_BYTES",
    "CORS",
];

/// Credential variables and their config keys. These are read verbatim so
/// that keys like `0123456789` keep their leading zeros.
const CREDENTIAL_VARS: &[(&str, &str)] = &[
    ("CLOUDINARY_CLOUD_NAME", "cloudinary_cloud_name"),
    ("CLOUDINARY_API_KEY", "cloudinary_api_key"),
    ("CLOUDINARY_API_SECRET", "cloudinary_api_secret"),
];

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Picture for accounts created without an upload.
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Request body limit in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Enable permissive CORS.
    #[serde(default = "default_cors")]
    pub cors: bool,

    /// Cloudinary cloud name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_api_secret: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_placeholder_url() -> String {
    DEFAULT_PROFILE_PIC.to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_cors() -> bool {
    true
}

/// Loads a `.env` file from the working directory or one of its parents.
///
/// Variables already present in the environment are left untouched. Returns
/// the file that was read, or `None` if there is no `.env` file.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn env_credentials() -> BTreeMap<&'static str, String> {
    CREDENTIAL_VARS
        .iter()
        .filter_map(|(var, key)| std::env::var(var).ok().map(|value| (*key, value)))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            placeholder_url: default_placeholder_url(),
            max_upload_bytes: default_max_upload_bytes(),
            cors: default_cors(),
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
        }
    }
}

impl Config {
    /// Builds the figment for the given config file.
    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::raw().only(ENV_KEYS))
            .merge(Serialized::defaults(env_credentials()))
    }

    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a source holds a value of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let path = Self::config_path(path);
        Self::figment(&path).extract()
    }

    /// Returns the config file path in effect.
    pub fn config_path(path: Option<&Path>) -> PathBuf {
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf)
    }

    /// Returns the listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Returns the HTTP server settings.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not form a socket address.
    pub fn server_config(&self) -> Result<ServerConfig, std::net::AddrParseError> {
        Ok(ServerConfig::builder()
            .addr(self.addr()?)
            .cors(self.cors)
            .public_dir(self.public_dir.clone())
            .placeholder_url(self.placeholder_url.clone())
            .max_upload_bytes(self.max_upload_bytes)
            .build())
    }

    /// Returns Cloudinary settings if all three credentials are present.
    pub fn cloudinary(&self) -> Option<CloudinaryConfig> {
        match (
            &self.cloudinary_cloud_name,
            &self.cloudinary_api_key,
            &self.cloudinary_api_secret,
        ) {
            (Some(name), Some(key), Some(secret)) => Some(CloudinaryConfig::new(name, key, secret)),
            _ => None,
        }
    }

    /// Returns `true` if some, but not all, Cloudinary credentials are set.
    pub fn cloudinary_incomplete(&self) -> bool {
        let set = [
            &self.cloudinary_cloud_name,
            &self.cloudinary_api_key,
            &self.cloudinary_api_secret,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count();
        set > 0 && set < 3
    }
}

fn mask(value: Option<&str>) -> &str {
    match value {
        Some(_) => "********",
        None => "(not set)",
    }
}

/// Prints the resolved configuration, masking credentials.
pub fn show_config(config: &Config, path: &Path) {
    println!("Roster Configuration");
    println!("====================\n");

    println!("Config file: {}", path.display());
    if path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    println!("  host: {}", config.host);
    println!("  port: {}", config.port);
    println!("  public_dir: {}", config.public_dir.display());
    println!("  placeholder_url: {}", config.placeholder_url);
    println!("  max_upload_bytes: {}", config.max_upload_bytes);
    println!("  cors: {}", config.cors);
    println!(
        "  cloudinary_cloud_name: {}",
        config.cloudinary_cloud_name.as_deref().unwrap_or("(not set)")
    );
    println!("  cloudinary_api_key: {}", mask(config.cloudinary_api_key.as_deref()));
    println!("  cloudinary_api_secret: {}", mask(config.cloudinary_api_secret.as_deref()));

    println!("\nEnvironment variables:");
    for key in ENV_KEYS {
        println!("  {key}");
    }
    for (var, _) in CREDENTIAL_VARS {
        println!("  {var}");
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None)?;
            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 3000);
            assert_eq!(config.public_dir, PathBuf::from("public"));
            assert_eq!(config.placeholder_url, DEFAULT_PROFILE_PIC);
            assert!(config.cors);
            assert!(config.cloudinary().is_none());
            assert!(!config.cloudinary_incomplete());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                port = 4000
                host = "127.0.0.1"
                cloudinary_cloud_name = "demo"
                "#,
            )?;
            jail.set_env("PORT", "5000");
            jail.set_env("CLOUDINARY_API_KEY", "123456789012345");
            jail.set_env("CLOUDINARY_API_SECRET", "s3cr3t");

            let config = Config::load(None)?;
            assert_eq!(config.port, 5000);
            assert_eq!(config.host, "127.0.0.1");

            let cloudinary = config.cloudinary().expect("credentials are complete");
            assert_eq!(cloudinary.cloud_name, "demo");
            assert_eq!(cloudinary.api_key, "123456789012345");
            assert_eq!(cloudinary.api_secret, "s3cr3t");
            assert_eq!(cloudinary.folder, "accounts");
            assert_eq!(cloudinary.format, "png");
            Ok(())
        });
    }

    #[test]
    fn test_credentials_keep_leading_zeros() {
        Jail::expect_with(|jail| {
            jail.set_env("CLOUDINARY_CLOUD_NAME", "demo");
            jail.set_env("CLOUDINARY_API_KEY", "0123456789");
            jail.set_env("CLOUDINARY_API_SECRET", "007");

            let config = Config::load(None)?;
            assert_eq!(config.cloudinary_api_key.as_deref(), Some("0123456789"));
            assert_eq!(config.cloudinary_api_secret.as_deref(), Some("007"));
            Ok(())
        });
    }

    #[test]
    fn test_dotenv_values_reach_config() {
        Jail::expect_with(|jail| {
            jail.create_file(".env", "PORT=4321\nCLOUDINARY_API_KEY=0042\n")?;

            let loaded = load_dotenv().expect(".env parses");
            let config = Config::load(None);

            std::env::remove_var("PORT");
            std::env::remove_var("CLOUDINARY_API_KEY");

            assert!(loaded.is_some_and(|path| path.ends_with(".env")));
            let config = config?;
            assert_eq!(config.port, 4321);
            assert_eq!(config.cloudinary_api_key.as_deref(), Some("0042"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        Jail::expect_with(|_jail| {
            assert!(load_dotenv().is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_path() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "public_dir = \"assets\"\ncors = false")?;

            let config = Config::load(Some(Path::new("custom.toml")))?;
            assert_eq!(config.public_dir, PathBuf::from("assets"));
            assert!(!config.cors);
            Ok(())
        });
    }

    #[test]
    fn test_incomplete_credentials() {
        Jail::expect_with(|jail| {
            jail.set_env("CLOUDINARY_CLOUD_NAME", "demo");
            let config = Config::load(None)?;
            assert!(config.cloudinary().is_none());
            assert!(config.cloudinary_incomplete());
            Ok(())
        });
    }

    #[test]
    fn test_bad_port_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "not-a-port");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_server_config() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8081,
            ..Config::default()
        };
        let server = config.server_config().unwrap();
        assert_eq!(server.addr, "127.0.0.1:8081".parse().unwrap());
        assert_eq!(server.public_dir, PathBuf::from("public"));
        assert!(server.cors);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(Some("secret")), "********");
        assert_eq!(mask(None), "(not set)");
    }
}
