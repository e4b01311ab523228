/// Application name
pub const APP_NAME: &str = "Nanos";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Journal holding the service descriptors, relative to the data directory
pub const SERVICES_JOURNAL: &str = "services";

/// Startup routine run when no override is given
pub const DEFAULT_MAIN_ROUTINE: &str = "main";

/// Environment variable overriding the startup routine name
pub const MAIN_ROUTINE_ENV: &str = "NANOS_MAIN";

/// Properties file holding the credential store password
pub const PROPERTIES_FILE: &str = "config.properties";

/// Credential store file
pub const KEYSTORE_FILE: &str = "keystore.jks";

/// Property naming the credential store password
pub const KEYSTORE_PASSWORD_PROPERTY: &str = "keystore.password";

/// Binding of the system user
pub const USER_KEY: &str = "user";

/// Binding of the exported (decorated) service catalog
pub const SERVICE_CATALOG_KEY: &str = "serviceCatalog";

/// Binding of the catalog the startup routine is looked up in
pub const ROUTINE_CATALOG_KEY: &str = "routineCatalog";

/// Capability guarding the exported service catalog
pub const SERVICE_CAPABILITY: &str = "service";
