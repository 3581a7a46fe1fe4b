use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::access::default_allow_list;
use crate::domain::{default_catalog, RegionInfo};
use crate::optimizer::{Algorithm, SolverConfig};

pub const ENV_PREFIX: &str = "GRIDOPT__";
pub const ENVIRONMENT_VAR: &str = "GRIDOPT_ENV";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub grid: GridConfig,
    pub regions: RegionsConfig,
    pub db: DbConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Region the CLI falls back to when none is given.
    pub default_region: String,
    pub max_iterations: u32,
    pub tolerance: f64,
    pub algorithm: Algorithm,
    pub learning_rate: f64,
    /// Longest free-text command accepted by the chat front-end.
    pub max_command_len: usize,
    pub history_limit: usize,
}

impl GridConfig {
    pub fn solver(&self) -> SolverConfig {
        SolverConfig {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            algorithm: self.algorithm,
            learning_rate: self.learning_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsConfig {
    /// Admission allow-list.
    pub allow_list: Vec<String>,
    /// Curated display catalog, independent of `allow_list`.
    pub catalog: Vec<RegionInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        let solver = SolverConfig::default();
        Self {
            environment: "development".to_string(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                request_timeout_secs: 30,
                enable_cors: false,
            },
            grid: GridConfig {
                default_region: "us-west".to_string(),
                max_iterations: solver.max_iterations,
                tolerance: solver.tolerance,
                algorithm: solver.algorithm,
                learning_rate: solver.learning_rate,
                max_command_len: 1000,
                history_limit: 10,
            },
            regions: RegionsConfig {
                allow_list: default_allow_list(),
                catalog: default_catalog(),
            },
            db: DbConfig::default(),
            log: LogConfig {
                level: "info,tower_http=info,sqlx=warn".to_string(),
                json: true,
            },
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: "postgres://localhost/gridopt".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Built-in defaults, then `config/default.toml`, then
    /// `config/{GRIDOPT_ENV}.toml`, then `GRIDOPT__*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(dir.join("default.toml")))
            .merge(Toml::file(dir.join(format!("{environment}.toml"))))
            .merge(Serialized::default("environment", &environment))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if !(self.grid.tolerance > 0.0) {
            anyhow::bail!("grid.tolerance must be positive, got {}", self.grid.tolerance);
        }
        if self.grid.max_iterations == 0 {
            anyhow::bail!("grid.max_iterations must be at least 1");
        }
        if self.regions.allow_list.is_empty() {
            anyhow::bail!("regions.allow_list must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<Config> {
        Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = with_toml("").unwrap();
        assert_eq!(cfg.grid.default_region, "us-west");
        assert_eq!(cfg.grid.tolerance, 1e-6);
        assert_eq!(cfg.db.backend, StorageBackend::Memory);
        assert_eq!(cfg.regions.catalog.len(), 4);
        assert!(cfg.regions.allow_list.contains(&"pgae".to_string()));
    }

    #[test]
    fn test_toml_overrides() {
        let cfg = with_toml(
            r#"
            [grid]
            algorithm = "gradient-descent"
            tolerance = 1e-8

            [regions]
            allow_list = ["north", "south"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.grid.algorithm, Algorithm::GradientDescent);
        assert_eq!(cfg.grid.solver().tolerance, 1e-8);
        assert_eq!(cfg.regions.allow_list, vec!["north", "south"]);
        // catalog is untouched by allow-list overrides
        assert_eq!(cfg.regions.catalog.len(), 4);
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        assert!(with_toml("[grid]\ntolerance = 0.0").is_err());
        assert!(with_toml("[grid]\nmax_iterations = 0").is_err());
    }

    #[test]
    fn test_shipped_default_toml_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let cfg = Config::from_figment(
            Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path)),
        )
        .unwrap();
        let defaults = Config::default();
        assert_eq!(cfg.regions.allow_list, defaults.regions.allow_list);
        assert_eq!(cfg.regions.catalog, defaults.regions.catalog);
        assert_eq!(cfg.grid.algorithm, defaults.grid.algorithm);
        assert_eq!(cfg.grid.tolerance, defaults.grid.tolerance);
        assert_eq!(cfg.server.port, defaults.server.port);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::default();
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8000);
    }
}
