//! Persisted defaults for the command-line tool
//!
//! Stored as JSON in the platform-specific config folder:
//! - Linux: ~/.config/aws-imaging/settings.json
//! - Windows: %APPDATA%/aws-imaging/settings.json
//! - macOS: ~/Library/Application Support/aws-imaging/settings.json

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aws::{LabelPolicy, SessionConfig, UploadAcl, UploadOptions};

/// User defaults, each overridable from the command line
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Default AWS region
    #[serde(default)]
    pub region: Option<String>,

    /// AWS profile used when no explicit keys are given
    #[serde(default)]
    pub profile: Option<String>,

    /// Confidence threshold for label detection (percent)
    #[serde(default)]
    pub min_confidence: Option<f32>,

    /// Maximum number of labels returned
    #[serde(default)]
    pub max_labels: Option<i32>,

    /// ACL applied to uploads
    #[serde(default)]
    pub upload_acl: Option<UploadAcl>,
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path()?)
    }

    /// Load settings from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        tracing::info!(
            "Loaded settings: region={:?}, profile={:?}, min_confidence={:?}, max_labels={:?}, upload_acl={:?}",
            settings.region,
            settings.profile,
            settings.min_confidence,
            settings.max_labels,
            settings.upload_acl
        );

        Ok(settings)
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize settings")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        tracing::debug!("Saved settings to {:?}", path);

        Ok(())
    }

    /// Get the path to the settings file
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "aws-imaging", "aws-imaging")
            .context("Failed to determine settings directory")?;

        Ok(proj_dirs.config_dir().join("settings.json"))
    }

    /// Session inputs for `region`, falling back to the stored region
    pub fn session_config(&self, region: Option<&str>) -> Result<SessionConfig> {
        let region = region
            .or(self.region.as_deref())
            .context("No AWS region given and none stored in settings")?;

        let mut config = SessionConfig::new(region);
        if let Some(profile) = &self.profile {
            config = config.with_profile(profile.clone());
        }
        Ok(config)
    }

    /// Label policy from explicit values, falling back to stored ones
    pub fn label_policy(&self, min_confidence: Option<f32>, max_labels: Option<i32>) -> Result<LabelPolicy> {
        let min_confidence = min_confidence
            .or(self.min_confidence)
            .context("No minimum confidence given and none stored in settings")?;

        let mut policy = LabelPolicy::new(min_confidence)?;
        if let Some(max_labels) = max_labels.or(self.max_labels) {
            policy = policy.with_max_labels(max_labels)?;
        }
        Ok(policy)
    }

    /// Upload options from an explicit ACL, falling back to the stored one
    pub fn upload_options(&self, acl: Option<UploadAcl>) -> UploadOptions {
        UploadOptions::default().with_acl(acl.or(self.upload_acl).unwrap_or_default())
    }
}
