//! # Constants
//!
//! Shared constants used throughout the provider.
//!
//! Connection defaults can be overridden through the provider block or the
//! `WALLIX_BASTION_*` environment variables.

/// Bastion REST API v3.3
pub const VERSION_WALLIX_API_33: &str = "v3.3";

/// Bastion REST API v3.6
pub const VERSION_WALLIX_API_36: &str = "v3.6";

/// Bastion REST API v3.8
pub const VERSION_WALLIX_API_38: &str = "v3.8";

/// Bastion REST API v3.12
pub const VERSION_WALLIX_API_312: &str = "v3.12";

/// Every API version the adapters know how to talk to
pub const KNOWN_API_VERSIONS: [&str; 4] = [
    VERSION_WALLIX_API_33,
    VERSION_WALLIX_API_36,
    VERSION_WALLIX_API_38,
    VERSION_WALLIX_API_312,
];

/// Prefix shared by every resource and data source name
pub const RESOURCE_PREFIX: &str = "wallix-bastion_";

/// User agent sent with every request
pub const USER_AGENT: &str = "terraform-provider-wallix-bastion";

/// Content type sent with every request
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Default HTTPS port of the appliance
pub const DEFAULT_PORT: u16 = 443;

/// Default API user
pub const DEFAULT_USER: &str = "admin";

/// Default API version
pub const DEFAULT_API_VERSION: &str = VERSION_WALLIX_API_33;

/// Environment variable holding the appliance address
pub const ENV_HOST: &str = "WALLIX_BASTION_HOST";

/// Environment variable holding the appliance HTTPS port
pub const ENV_PORT: &str = "WALLIX_BASTION_PORT";

/// Environment variable holding the API key
pub const ENV_TOKEN: &str = "WALLIX_BASTION_TOKEN";

/// Environment variable holding the API user
pub const ENV_USER: &str = "WALLIX_BASTION_USER";

/// Environment variable holding the password used for HTTP Basic auth
pub const ENV_PASSWORD: &str = "WALLIX_BASTION_PASSWORD";

/// Environment variable holding the API version
pub const ENV_API_VERSION: &str = "WALLIX_BASTION_API_VERSION";

/// Languages accepted by the appliance for users and authentication domains
pub const LANGUAGES: [&str; 5] = ["de", "en", "es", "fr", "ru"];

/// Protocols accepted for services and connection policies
pub const PROTOCOLS: [&str; 6] = ["SSH", "RAWTCPIP", "RDP", "RLOGIN", "TELNET", "VNC"];

/// Default state file written by `bastionctl`
pub const DEFAULT_STATE_FILE: &str = "bastion.tfstate.json";
