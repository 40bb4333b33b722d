use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub approvals: ApprovalConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let approvers = match env::var("APP_APPROVERS") {
            Ok(raw) => {
                let parsed = ApprovalConfig::parse_approvers(&raw);
                if parsed.is_empty() {
                    return Err(ConfigError::EmptyApproverList);
                }
                parsed
            }
            Err(_) => ApprovalConfig::default_approvers(),
        };

        let from_address =
            env::var("APP_MAIL_FROM").unwrap_or_else(|_| "noreply@housing.example.gov".to_string());
        let approver_inbox = env::var("APP_APPROVER_INBOX")
            .unwrap_or_else(|_| "mcr-review@housing.example.gov".to_string());
        let delivery_timeout_ms = env::var("APP_MAIL_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidMailTimeout)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            approvals: ApprovalConfig { approvers },
            mail: MailConfig {
                from_address,
                approver_inbox,
                delivery_timeout_ms,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Principals permitted to approve or reject submitted forms.
///
/// Injected into the allow-list policy at construction; the literal defaults
/// only apply when `APP_APPROVERS` is unset.
#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    pub approvers: Vec<String>,
}

impl ApprovalConfig {
    fn parse_approvers(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn default_approvers() -> Vec<String> {
        [
            "justin.grier",
            "alicia.jones",
            "chari.francisco",
            "shenessa.williams",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect()
    }
}

/// Outbound notification settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub approver_inbox: String,
    pub delivery_timeout_ms: u64,
}

impl MailConfig {
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMailTimeout,
    EmptyApproverList,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMailTimeout => {
                write!(f, "APP_MAIL_TIMEOUT_MS must be a valid u64 millisecond count")
            }
            ConfigError::EmptyApproverList => {
                write!(f, "APP_APPROVERS must name at least one principal")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
