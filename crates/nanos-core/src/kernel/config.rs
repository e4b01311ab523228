use std::env;
use std::path::PathBuf;

use crate::catalog::AuthPolicy;
use crate::kernel::constants;

/// Settings the boot sequencer runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootConfig {
    /// Root for every file the kernel reads. Empty means the working directory.
    pub data_dir: PathBuf,
    /// Name of the startup routine.
    pub main_routine: String,
    /// Properties file holding the credential store password.
    pub properties_file: PathBuf,
    pub key_store_file: PathBuf,
    /// Journal name of the service catalog.
    pub services_journal: String,
    /// Policy of the exported service catalog.
    pub catalog_policy: AuthPolicy,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            main_routine: constants::DEFAULT_MAIN_ROUTINE.to_string(),
            properties_file: PathBuf::from(constants::PROPERTIES_FILE),
            key_store_file: PathBuf::from(constants::KEYSTORE_FILE),
            services_journal: constants::SERVICES_JOURNAL.to_string(),
            catalog_policy: AuthPolicy::default(),
        }
    }
}

impl BootConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Like [`BootConfig::new`], with the startup routine taken from
    /// `NANOS_MAIN` when set.
    pub fn from_env(data_dir: impl Into<PathBuf>) -> Self {
        let config = Self::new(data_dir);
        match env::var(constants::MAIN_ROUTINE_ENV) {
            Ok(routine) => config.with_main_routine(routine),
            Err(_) => config,
        }
    }

    pub fn with_main_routine(mut self, routine: impl Into<String>) -> Self {
        self.main_routine = routine.into();
        self
    }

    pub fn with_properties_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.properties_file = path.into();
        self
    }

    pub fn with_key_store_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_store_file = path.into();
        self
    }

    pub fn with_catalog_policy(mut self, policy: AuthPolicy) -> Self {
        self.catalog_policy = policy;
        self
    }
}
