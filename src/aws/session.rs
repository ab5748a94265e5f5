//! AWS session resolution
//!
//! A [`Session`] is the region plus credential capability shared by every
//! service client. It is resolved once from a [`SessionConfig`]:
//! - Static credentials (access_key_id, secret_access_key) when both are given
//! - Otherwise the default provider chain of `aws-config` (environment
//!   variables, profiles, SSO, web identity, ECS/EC2 roles), optionally
//!   restricted to a named profile
//!
//! Credentials are loaded eagerly so that a session which exists is a session
//! that can sign requests.

use std::fmt;
use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;

use crate::error::{Error, Result};

/// Provider name attached to explicitly supplied keys
const STATIC_PROVIDER_NAME: &str = "aws-imaging-static";

/// Inputs for resolving a [`Session`]
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// AWS region, e.g. `us-west-2`
    pub region: String,
    /// Explicit access key id (must be paired with `secret_access_key`)
    pub access_key_id: Option<String>,
    /// Explicit secret key (must be paired with `access_key_id`)
    pub secret_access_key: Option<String>,
    /// Named profile for the ambient chain, ignored with explicit keys
    pub profile: Option<String>,
    /// Custom endpoint (S3-compatible stores such as MinIO)
    pub endpoint_url: Option<String>,
    /// Per-operation deadline handed to the SDK
    pub operation_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Static credentials, if both halves of the key pair are present
    fn static_credentials(&self) -> Result<Option<Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                if id.is_empty() || secret.is_empty() {
                    return Err(Error::configuration(
                        "access key id and secret access key must not be empty",
                    ));
                }
                Ok(Some(Credentials::new(
                    id,
                    secret,
                    None,
                    None,
                    STATIC_PROVIDER_NAME,
                )))
            }
            (None, None) => Ok(None),
            _ => Err(Error::configuration(
                "access key id and secret access key must be supplied together",
            )),
        }
    }
}

// Hand-written so the secret never reaches logs through `{:?}`
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "** redacted **"),
            )
            .field("profile", &self.profile)
            .field("endpoint_url", &self.endpoint_url)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// Resolved region and credentials, shared by all service clients
#[derive(Debug, Clone)]
pub struct Session {
    sdk_config: SdkConfig,
    region: String,
    force_path_style: bool,
}

impl Session {
    /// Resolve a session from explicit keys or the ambient credential chain
    pub async fn resolve(config: &SessionConfig) -> Result<Self> {
        validate_region(&config.region)?;
        let static_credentials = config.static_credentials()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        if let Some(timeout) = config.operation_timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder().operation_timeout(timeout).build(),
            );
        }

        let source = match static_credentials {
            Some(credentials) => {
                loader = loader.credentials_provider(credentials);
                "static keys".to_string()
            }
            None => match &config.profile {
                Some(profile) => {
                    loader = loader.profile_name(profile);
                    format!("profile '{}'", profile)
                }
                None => "default provider chain".to_string(),
            },
        };

        let sdk_config = loader.load().await;
        let mut session = Self::from_sdk_config(sdk_config).await?;
        session.force_path_style = config.endpoint_url.is_some();

        tracing::info!(
            "Resolved AWS session: region={}, credentials={}",
            session.region,
            source
        );

        Ok(session)
    }

    /// Validate an already-loaded SDK config and wrap it as a session
    pub async fn from_sdk_config(sdk_config: SdkConfig) -> Result<Self> {
        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| Error::configuration("no region configured"))?;
        validate_region(&region)?;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::configuration("no credential source configured"))?;

        provider.provide_credentials().await.map_err(|e| {
            Error::configuration(format!(
                "failed to resolve AWS credentials: {}",
                DisplayErrorContext(&e)
            ))
        })?;

        Ok(Self {
            sdk_config,
            region,
            force_path_style: false,
        })
    }

    /// Derive a session for another region, sharing the same credentials.
    ///
    /// `self` is left untouched, so sessions can be rebound concurrently.
    pub fn with_region(&self, region: &str) -> Result<Self> {
        validate_region(region)?;

        let sdk_config = self
            .sdk_config
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();

        Ok(Self {
            sdk_config,
            region: region.to_string(),
            force_path_style: self.force_path_style,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    /// Whether S3 must use path-style addressing (custom endpoints)
    pub fn force_path_style(&self) -> bool {
        self.force_path_style
    }
}

/// Check that a region looks like an AWS region identifier
fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() {
        return Err(Error::configuration("region must not be empty"));
    }

    let well_formed = region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !region.starts_with('-')
        && !region.ends_with('-');

    if !well_formed {
        return Err(Error::configuration(format!("invalid region '{}'", region)));
    }

    Ok(())
}
