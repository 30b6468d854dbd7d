//! Bootstrap configuration.
//!
//! # Variables
//!
//! ## Required
//! - `MONGO_INITDB_DATABASE` - Database to create and seed
//! - `DB_ADMIN_USERNAME` - Database owner to provision
//! - `DB_ADMIN_PASSWORD` - Password for the database owner
//!
//! ## Optional
//! - `MONGO_URI` - Connection string (default: `mongodb://localhost:27017`)
//!
//! # Accessors
//!
//! Values come from one [`ConfigSource`]. The process environment is tried
//! first; if any required value is missing there, the whole set is read
//! from a dotenv file instead. There is no third attempt.
//!
//! # Env file quoting
//!
//! Values are used verbatim. Dotenv parsing would expand `$NAME` and
//! `${NAME}` from the process environment, so any value containing `$` must
//! be single-quoted (`DB_ADMIN_PASSWORD='pa$word'`); an unquoted or
//! double-quoted `$` is rejected with [`ConfigError::Substitution`].

use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use mongo_initdb_core::DatabaseUser;
use secrecy::SecretString;
use thiserror::Error;

pub const DATABASE_VAR: &str = "MONGO_INITDB_DATABASE";
pub const ADMIN_USERNAME_VAR: &str = "DB_ADMIN_USERNAME";
pub const ADMIN_PASSWORD_VAR: &str = "DB_ADMIN_PASSWORD";
pub const MONGO_URI_VAR: &str = "MONGO_URI";

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing variable {key} in {accessor}")]
    MissingVar {
        key: &'static str,
        accessor: &'static str,
    },
    #[error("Invalid variable {key} in {accessor}: value is not valid unicode")]
    InvalidVar {
        key: &'static str,
        accessor: &'static str,
    },
    #[error("Cannot read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    #[error(
        "Variable {key} in env file {} contains `$`; single-quote the value to use it verbatim",
        path.display()
    )]
    Substitution { key: &'static str, path: PathBuf },
}

/// A mechanism for reading string settings.
pub trait ConfigSource {
    /// Human readable name used in logs and the diagnostic line.
    fn name(&self) -> &'static str;

    /// Look up `key`. `Ok(None)` means the key is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the accessor itself is unusable.
    fn var(&self, key: &'static str) -> Result<Option<String>, ConfigError>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn name(&self) -> &'static str {
        "process environment"
    }

    fn var(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidVar {
                key,
                accessor: self.name(),
            }),
        }
    }
}

/// A dotenv-formatted file, read without touching the process environment.
///
/// The file is read and parsed once, on the first lookup; every later
/// lookup answers from that snapshot.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    entries: OnceCell<EnvEntries>,
}

/// Parsed contents of an env file.
#[derive(Debug, Clone, Default)]
struct EnvEntries {
    values: HashMap<String, String>,
    /// Keys whose last assignment would be expanded by `$` substitution.
    expanding: HashSet<String>,
}

impl EnvFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: OnceCell::new(),
        }
    }

    fn read_error(&self, source: dotenvy::Error) -> ConfigError {
        ConfigError::EnvFile {
            path: self.path.clone(),
            source,
        }
    }

    fn entries(&self) -> Result<&EnvEntries, ConfigError> {
        if let Some(entries) = self.entries.get() {
            return Ok(entries);
        }
        let parsed = self.parse()?;
        Ok(self.entries.get_or_init(|| parsed))
    }

    fn parse(&self) -> Result<EnvEntries, ConfigError> {
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| self.read_error(dotenvy::Error::Io(e)))?;

        // Later assignments win, as they would when sourcing the file.
        let mut entries = EnvEntries::default();
        for entry in dotenvy::from_read_iter(contents.as_bytes()) {
            let (name, value) = entry.map_err(|e| self.read_error(e))?;
            entries.values.insert(name, value);
        }
        for (name, raw_value) in contents.lines().filter_map(raw_assignment) {
            if expands(raw_value) {
                entries.expanding.insert(name.to_owned());
            } else {
                entries.expanding.remove(name);
            }
        }
        Ok(entries)
    }
}

impl ConfigSource for EnvFile {
    fn name(&self) -> &'static str {
        "env file"
    }

    fn var(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
        let entries = self.entries()?;
        if entries.expanding.contains(key) {
            return Err(ConfigError::Substitution {
                key,
                path: self.path.clone(),
            });
        }
        Ok(entries.values.get(key).cloned())
    }
}

/// Split a raw `[export ]KEY=value` line, skipping blanks and comments.
fn raw_assignment(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (name, value) = line.split_once('=')?;
    Some((name.trim(), value.trim()))
}

/// Whether dotenv parsing would rewrite `raw_value`: a `$` outside single quotes.
fn expands(raw_value: &str) -> bool {
    !raw_value.starts_with('\'') && raw_value.contains('$')
}

/// Values needed to provision and seed one database.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Connection string (may embed root credentials)
    pub mongo_uri: SecretString,
    /// Target database name, also the scope of the owner role
    pub database: String,
    /// Database owner username
    pub admin_username: String,
    /// Database owner password
    pub admin_password: SecretString,
}

/// A configuration together with the accessor that supplied it.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: BootstrapConfig,
    pub accessor: &'static str,
    pub used_fallback: bool,
}

impl ResolvedConfig {
    /// One-line summary of which accessor succeeded.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        if self.used_fallback {
            format!("configuration read from {} (fallback)", self.accessor)
        } else {
            format!("configuration read from {}", self.accessor)
        }
    }
}

impl BootstrapConfig {
    /// Read the complete value set from one accessor.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required value is missing or the accessor
    /// cannot be read.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let database = get_required(source, DATABASE_VAR)?;
        let admin_username = get_required(source, ADMIN_USERNAME_VAR)?;
        let admin_password = SecretString::from(get_required(source, ADMIN_PASSWORD_VAR)?);
        let mongo_uri = SecretString::from(
            get_optional(source, MONGO_URI_VAR)?.unwrap_or_else(|| DEFAULT_MONGO_URI.to_owned()),
        );

        Ok(Self {
            mongo_uri,
            database,
            admin_username,
            admin_password,
        })
    }

    /// Try `primary`, then `fallback` exactly once.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error if both accessors fail.
    pub fn resolve(
        primary: &dyn ConfigSource,
        fallback: &dyn ConfigSource,
    ) -> Result<ResolvedConfig, ConfigError> {
        match Self::from_source(primary) {
            Ok(config) => Ok(ResolvedConfig {
                config,
                accessor: primary.name(),
                used_fallback: false,
            }),
            Err(e) => {
                tracing::warn!(
                    accessor = primary.name(),
                    error = %e,
                    "Primary configuration unavailable, trying {}",
                    fallback.name()
                );
                let config = Self::from_source(fallback)?;
                Ok(ResolvedConfig {
                    config,
                    accessor: fallback.name(),
                    used_fallback: true,
                })
            }
        }
    }

    /// Resolve from the process environment with `env_file` as fallback.
    ///
    /// # Errors
    ///
    /// See [`BootstrapConfig::resolve`].
    pub fn load(env_file: &Path) -> Result<ResolvedConfig, ConfigError> {
        let fallback = EnvFile::new(env_file);
        Self::resolve(&ProcessEnv, &fallback)
    }

    /// The database owner described by this configuration.
    #[must_use]
    pub fn admin_user(&self) -> DatabaseUser {
        DatabaseUser::owner(
            self.admin_username.clone(),
            self.admin_password.clone(),
            &self.database,
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating an empty value as unset.
fn get_optional(
    source: &dyn ConfigSource,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    Ok(source.var(key)?.filter(|value| !value.is_empty()))
}

/// Get a required variable.
fn get_required(source: &dyn ConfigSource, key: &'static str) -> Result<String, ConfigError> {
    get_optional(source, key)?.ok_or(ConfigError::MissingVar {
        key,
        accessor: source.name(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    struct MapSource {
        name: &'static str,
        vars: HashMap<&'static str, &'static str>,
    }

    impl MapSource {
        fn new(name: &'static str, vars: &[(&'static str, &'static str)]) -> Self {
            Self {
                name,
                vars: vars.iter().copied().collect(),
            }
        }
    }

    impl ConfigSource for MapSource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn var(&self, key: &'static str) -> Result<Option<String>, ConfigError> {
            Ok(self.vars.get(key).map(|v| (*v).to_owned()))
        }
    }

    fn complete(name: &'static str) -> MapSource {
        MapSource::new(
            name,
            &[
                (DATABASE_VAR, "appdb"),
                (ADMIN_USERNAME_VAR, "admin"),
                (ADMIN_PASSWORD_VAR, "secret"),
            ],
        )
    }

    #[test]
    fn test_from_source_complete() {
        let config = BootstrapConfig::from_source(&complete("map")).unwrap();
        assert_eq!(config.database, "appdb");
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.admin_password.expose_secret(), "secret");
        assert_eq!(config.mongo_uri.expose_secret(), DEFAULT_MONGO_URI);
    }

    #[test]
    fn test_from_source_custom_uri() {
        let source = MapSource::new(
            "map",
            &[
                (DATABASE_VAR, "appdb"),
                (ADMIN_USERNAME_VAR, "admin"),
                (ADMIN_PASSWORD_VAR, "secret"),
                (MONGO_URI_VAR, "mongodb://root:pw@mongo:27017"),
            ],
        );
        let config = BootstrapConfig::from_source(&source).unwrap();
        assert_eq!(
            config.mongo_uri.expose_secret(),
            "mongodb://root:pw@mongo:27017"
        );
    }

    #[test]
    fn test_from_source_missing_password() {
        let source = MapSource::new(
            "map",
            &[(DATABASE_VAR, "appdb"), (ADMIN_USERNAME_VAR, "admin")],
        );
        let err = BootstrapConfig::from_source(&source).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                key: ADMIN_PASSWORD_VAR,
                accessor: "map"
            }
        ));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let source = MapSource::new(
            "map",
            &[
                (DATABASE_VAR, ""),
                (ADMIN_USERNAME_VAR, "admin"),
                (ADMIN_PASSWORD_VAR, "secret"),
            ],
        );
        assert!(BootstrapConfig::from_source(&source).is_err());
    }

    #[test]
    fn test_resolve_prefers_primary() {
        let resolved = BootstrapConfig::resolve(&complete("primary"), &complete("fallback")).unwrap();
        assert_eq!(resolved.accessor, "primary");
        assert!(!resolved.used_fallback);
        assert_eq!(resolved.diagnostic(), "configuration read from primary");
    }

    #[test]
    fn test_resolve_falls_back_once() {
        let primary = MapSource::new("primary", &[]);
        let resolved = BootstrapConfig::resolve(&primary, &complete("fallback")).unwrap();
        assert_eq!(resolved.accessor, "fallback");
        assert!(resolved.used_fallback);
        assert_eq!(resolved.config.database, "appdb");
    }

    #[test]
    fn test_resolve_does_not_mix_sources() {
        // A partial primary is discarded entirely, not merged with the fallback.
        let primary = MapSource::new("primary", &[(DATABASE_VAR, "otherdb")]);
        let resolved = BootstrapConfig::resolve(&primary, &complete("fallback")).unwrap();
        assert_eq!(resolved.config.database, "appdb");
    }

    #[test]
    fn test_resolve_fallback_error_is_returned() {
        let primary = MapSource::new("primary", &[]);
        let fallback = MapSource::new("fallback", &[(DATABASE_VAR, "appdb")]);
        let err = BootstrapConfig::resolve(&primary, &fallback).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                accessor: "fallback",
                ..
            }
        ));
    }

    #[test]
    fn test_admin_user_is_owner_of_database() {
        let config = BootstrapConfig::from_source(&complete("map")).unwrap();
        let user = config.admin_user();
        assert_eq!(user.username, "admin");
        assert_eq!(user.roles, vec![mongo_initdb_core::RoleGrant::owner_of("appdb")]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = BootstrapConfig::from_source(&complete("map")).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("localhost"));
    }

    #[test]
    fn test_env_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# bootstrap settings").unwrap();
        writeln!(file, "{DATABASE_VAR}=filedb").unwrap();
        writeln!(file, "{ADMIN_USERNAME_VAR}=owner").unwrap();
        writeln!(file, "{ADMIN_PASSWORD_VAR}=\"p@ss word\"").unwrap();
        file.flush().unwrap();

        let source = EnvFile::new(file.path());
        let config = BootstrapConfig::from_source(&source).unwrap();
        assert_eq!(config.database, "filedb");
        assert_eq!(config.admin_username, "owner");
        assert_eq!(config.admin_password.expose_secret(), "p@ss word");
    }

    #[test]
    fn test_env_file_last_assignment_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DATABASE_VAR}=first").unwrap();
        writeln!(file, "{DATABASE_VAR}=second").unwrap();
        file.flush().unwrap();

        let source = EnvFile::new(file.path());
        assert_eq!(source.var(DATABASE_VAR).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_env_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let source = EnvFile::new(dir.path().join("absent.env"));
        let err = source.var(DATABASE_VAR).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }

    #[test]
    fn test_env_file_rejects_unquoted_dollar() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DATABASE_VAR}=appdb").unwrap();
        writeln!(file, "{ADMIN_USERNAME_VAR}=admin").unwrap();
        writeln!(file, "{ADMIN_PASSWORD_VAR}=pa$word1").unwrap();
        file.flush().unwrap();

        let err = BootstrapConfig::from_source(&EnvFile::new(file.path())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Substitution {
                key: ADMIN_PASSWORD_VAR,
                ..
            }
        ));
    }

    #[test]
    fn test_env_file_rejects_double_quoted_dollar() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{ADMIN_PASSWORD_VAR}=\"pa${{HOME}}word\"").unwrap();
        file.flush().unwrap();

        let err = EnvFile::new(file.path()).var(ADMIN_PASSWORD_VAR).unwrap_err();
        assert!(matches!(err, ConfigError::Substitution { .. }));
    }

    #[test]
    fn test_env_file_single_quoted_dollar_is_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DATABASE_VAR}=appdb").unwrap();
        writeln!(file, "{ADMIN_USERNAME_VAR}=admin").unwrap();
        writeln!(file, "{ADMIN_PASSWORD_VAR}='pa$word1'").unwrap();
        file.flush().unwrap();

        let config = BootstrapConfig::from_source(&EnvFile::new(file.path())).unwrap();
        assert_eq!(config.admin_password.expose_secret(), "pa$word1");
    }

    #[test]
    fn test_env_file_dollar_in_other_keys_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "UNRELATED=$HOME").unwrap();
        writeln!(file, "{DATABASE_VAR}=appdb").unwrap();
        file.flush().unwrap();

        let source = EnvFile::new(file.path());
        assert_eq!(source.var(DATABASE_VAR).unwrap().as_deref(), Some("appdb"));
    }

    #[test]
    fn test_env_file_is_read_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DATABASE_VAR}=before").unwrap();
        writeln!(file, "{ADMIN_USERNAME_VAR}=admin").unwrap();
        file.flush().unwrap();

        let source = EnvFile::new(file.path());
        assert_eq!(source.var(DATABASE_VAR).unwrap().as_deref(), Some("before"));

        std::fs::write(
            file.path(),
            format!("{DATABASE_VAR}=after\n{ADMIN_USERNAME_VAR}=other\n"),
        )
        .unwrap();
        assert_eq!(source.var(DATABASE_VAR).unwrap().as_deref(), Some("before"));
        assert_eq!(source.var(ADMIN_USERNAME_VAR).unwrap().as_deref(), Some("admin"));
    }

    // =========================================================================
    // Process environment
    // =========================================================================

    /// Serializes tests that mutate the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn set_env(key: &str, value: impl AsRef<std::ffi::OsStr>) {
        // SAFETY: callers hold ENV_LOCK, so no other test reads or writes the
        // environment concurrently.
        unsafe { std::env::set_var(key, value) };
    }

    #[allow(unsafe_code)]
    fn remove_env(key: &str) {
        // SAFETY: see `set_env`.
        unsafe { std::env::remove_var(key) };
    }

    fn clear_bootstrap_env() {
        for key in [DATABASE_VAR, ADMIN_USERNAME_VAR, ADMIN_PASSWORD_VAR, MONGO_URI_VAR] {
            remove_env(key);
        }
    }

    fn fallback_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{DATABASE_VAR}=filedb").unwrap();
        writeln!(file, "{ADMIN_USERNAME_VAR}=fileowner").unwrap();
        writeln!(file, "{ADMIN_PASSWORD_VAR}=filesecret").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_reads_process_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_bootstrap_env();
        set_env(DATABASE_VAR, "appdb");
        set_env(ADMIN_USERNAME_VAR, "admin");
        set_env(ADMIN_PASSWORD_VAR, "secret");

        let dir = tempfile::tempdir().unwrap();
        let resolved = BootstrapConfig::load(&dir.path().join("missing.env"));
        clear_bootstrap_env();

        let resolved = resolved.unwrap();
        assert!(!resolved.used_fallback);
        assert_eq!(resolved.accessor, ProcessEnv.name());
        assert_eq!(resolved.config.database, "appdb");
        assert_eq!(resolved.config.admin_username, "admin");
        assert_eq!(resolved.config.admin_password.expose_secret(), "secret");
        assert_eq!(resolved.config.mongo_uri.expose_secret(), DEFAULT_MONGO_URI);
    }

    #[test]
    fn test_load_falls_back_to_env_file_when_variable_missing() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_bootstrap_env();
        set_env(DATABASE_VAR, "appdb");
        set_env(ADMIN_USERNAME_VAR, "admin");

        let file = fallback_file();
        let resolved = BootstrapConfig::load(file.path());
        clear_bootstrap_env();

        let resolved = resolved.unwrap();
        assert!(resolved.used_fallback);
        assert_eq!(resolved.accessor, "env file");
        assert_eq!(resolved.config.database, "filedb");
        assert_eq!(resolved.config.admin_username, "fileowner");
        assert_eq!(resolved.config.admin_password.expose_secret(), "filesecret");
    }

    #[cfg(unix)]
    #[test]
    fn test_load_falls_back_when_variable_is_not_unicode() {
        use std::os::unix::ffi::OsStrExt;

        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_bootstrap_env();
        set_env(DATABASE_VAR, std::ffi::OsStr::from_bytes(b"app\xffdb"));
        set_env(ADMIN_USERNAME_VAR, "admin");
        set_env(ADMIN_PASSWORD_VAR, "secret");

        let direct = ProcessEnv.var(DATABASE_VAR);
        let file = fallback_file();
        let resolved = BootstrapConfig::load(file.path());
        clear_bootstrap_env();

        assert!(matches!(
            direct,
            Err(ConfigError::InvalidVar {
                key: DATABASE_VAR,
                ..
            })
        ));
        let resolved = resolved.unwrap();
        assert!(resolved.used_fallback);
        assert_eq!(resolved.config.database, "filedb");
    }
}
