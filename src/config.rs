use std::env;
use tracing::warn;

const DEFAULT_MAX_PARAMETER_SIZE: usize = 512 * 1024 * 1024;
const DEFAULT_MAX_RECORD_SIZE: usize = 1024 * 1024 * 1024;

/// Limits protecting readers from records declaring absurd sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Largest declared parameter length accepted, in bytes. Same default Redis uses for
    /// `proto-max-bulk-len`.
    pub max_parameter_size: usize,
    /// Most bytes `AofCodec` buffers while waiting for a record to complete.
    pub max_record_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_parameter_size: DEFAULT_MAX_PARAMETER_SIZE,
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
        }
    }
}

impl Config {
    /// Reads `AOF_MAX_PARAMETER_SIZE` and `AOF_MAX_RECORD_SIZE`, falling back to the defaults for
    /// unset or invalid values.
    pub fn from_env() -> Config {
        Config {
            max_parameter_size: size_from_env("AOF_MAX_PARAMETER_SIZE", DEFAULT_MAX_PARAMETER_SIZE),
            max_record_size: size_from_env("AOF_MAX_RECORD_SIZE", DEFAULT_MAX_RECORD_SIZE),
        }
    }
}

fn size_from_env(name: &str, default: usize) -> usize {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("{} must be a number, got {:?}; using {}", name, value, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn from_env_defaults() {
        env::remove_var("AOF_MAX_PARAMETER_SIZE");
        env::remove_var("AOF_MAX_RECORD_SIZE");

        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    #[serial]
    fn from_env_overrides() {
        env::set_var("AOF_MAX_PARAMETER_SIZE", "1024");
        env::set_var("AOF_MAX_RECORD_SIZE", "4096");

        let config = Config::from_env();

        env::remove_var("AOF_MAX_PARAMETER_SIZE");
        env::remove_var("AOF_MAX_RECORD_SIZE");

        assert_eq!(config.max_parameter_size, 1024);
        assert_eq!(config.max_record_size, 4096);
    }

    #[test]
    #[serial]
    fn from_env_invalid_value_falls_back() {
        env::set_var("AOF_MAX_PARAMETER_SIZE", "lots");

        let config = Config::from_env();

        env::remove_var("AOF_MAX_PARAMETER_SIZE");

        assert_eq!(config.max_parameter_size, DEFAULT_MAX_PARAMETER_SIZE);
    }
}
