//! Configuration for lsm-bench runs
//!
//! Values are layered: serde defaults (the historical CLI defaults), then an
//! optional TOML file, then `LSM_BENCH__<SECTION>__<KEY>` environment
//! variables. The binaries apply their command-line flags last.

use crate::engine::EngineOverrides;
use crate::merge_bench::MergeBenchConfig;
use crate::space_amp::SpaceAmpConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File looked up in the working directory when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lsm-bench";

const ENV_PREFIX: &str = "LSM_BENCH";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Space-amplification experiment settings
    #[serde(default)]
    pub space_amp: SpaceAmpConfig,

    /// Merge vs read-modify-write benchmark settings
    #[serde(default)]
    pub merge_bench: MergeBenchConfig,

    /// Host-specific engine knobs applied on top of the experiment profiles
    #[serde(default)]
    pub engine: EngineOverrides,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            space_amp: SpaceAmpConfig::default(),
            merge_bench: MergeBenchConfig::default(),
            engine: EngineOverrides::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `lsm-bench.toml` if present.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.space_amp.block_sizes,
            vec![4096, 8192, 16384, 32768, 65536]
        );
        assert_eq!(config.space_amp.read_ops, 200_000);
        assert!(!config.space_amp.keep_dbs);
        assert_eq!(config.merge_bench.key_space, 10_000);
        assert_eq!(config.merge_bench.threads, 8);
        assert_eq!(config.merge_bench.phase_duration, Duration::from_secs(15));
        assert!(config.merge_bench.mix.is_empty());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[space_amp]
block_sizes = [4096, 65536]
keep_dbs = true

[merge_bench]
threads = 2
phase_duration = "250ms"
mix = "50/50"

[engine]
use_direct_io = false
write_buffer_size = 4194304
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.space_amp.block_sizes, vec![4096, 65536]);
        assert!(config.space_amp.keep_dbs);
        // Untouched keys keep their defaults
        assert_eq!(config.space_amp.read_ops, 200_000);
        assert_eq!(config.merge_bench.threads, 2);
        assert_eq!(config.merge_bench.key_space, 10_000);
        assert_eq!(
            config.merge_bench.phase_duration,
            Duration::from_millis(250)
        );
        assert_eq!(config.merge_bench.mix, "50/50");
        assert_eq!(config.engine.use_direct_io, Some(false));
        assert_eq!(config.engine.write_buffer_size, Some(4 * 1024 * 1024));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Configuration);
    }
}
