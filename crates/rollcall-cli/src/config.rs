// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rollcall_app::{DEFAULT_THUMBNAIL_WIDTH, ImageColumnPolicy, ProjectionOptions};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "rollcall";
const CONFIG_VERSION: i64 = 1;
const MAX_THUMBNAIL_WIDTH: i64 = 4096;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub table: Table,
    #[serde(default)]
    pub images: Images,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            table: Table::default(),
            images: Images::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Table {
    pub image_columns: Option<String>,
    pub row_key_fields: Option<Vec<String>>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            image_columns: Some(ImageColumnPolicy::First.as_str().to_owned()),
            row_key_fields: Some(ProjectionOptions::default().row_key_fields),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Images {
    pub thumbnail_width: Option<i64>,
    pub offline: Option<bool>,
    pub blocked_hosts: Option<Vec<String>>,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            thumbnail_width: Some(i64::from(DEFAULT_THUMBNAIL_WIDTH)),
            offline: Some(false),
            blocked_hosts: Some(Vec::new()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ROLLCALL_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set ROLLCALL_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [table] and [images]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(policy) = &self.table.image_columns
            && ImageColumnPolicy::parse(policy).is_none()
        {
            bail!(
                "table.image_columns in {} must be \"first\" or \"all\", got {:?}",
                path.display(),
                policy
            );
        }

        if let Some(fields) = &self.table.row_key_fields
            && fields.iter().any(|field| field.trim().is_empty())
        {
            bail!(
                "table.row_key_fields in {} must not contain blank field names",
                path.display()
            );
        }

        if let Some(width) = self.images.thumbnail_width
            && !(1..=MAX_THUMBNAIL_WIDTH).contains(&width)
        {
            bail!(
                "images.thumbnail_width in {} must be between 1 and {}, got {}",
                path.display(),
                MAX_THUMBNAIL_WIDTH,
                width
            );
        }

        if let Some(hosts) = &self.images.blocked_hosts
            && let Some(bad) = hosts
                .iter()
                .find(|host| host.trim().is_empty() || host.contains('/'))
        {
            bail!(
                "images.blocked_hosts in {} must list bare host names, got {:?}",
                path.display(),
                bad
            );
        }

        Ok(())
    }

    pub fn image_column_policy(&self) -> ImageColumnPolicy {
        self.table
            .image_columns
            .as_deref()
            .and_then(ImageColumnPolicy::parse)
            .unwrap_or_default()
    }

    pub fn row_key_fields(&self) -> Vec<String> {
        self.table
            .row_key_fields
            .clone()
            .unwrap_or_else(|| ProjectionOptions::default().row_key_fields)
    }

    pub fn thumbnail_width(&self) -> u32 {
        self.images
            .thumbnail_width
            .and_then(|width| u32::try_from(width).ok())
            .unwrap_or(DEFAULT_THUMBNAIL_WIDTH)
    }

    pub fn offline(&self) -> bool {
        self.images.offline.unwrap_or(false)
    }

    pub fn blocked_hosts(&self) -> Vec<String> {
        self.images
            .blocked_hosts
            .iter()
            .flatten()
            .map(|host| host.trim().to_ascii_lowercase())
            .collect()
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            image_columns: self.image_column_policy(),
            thumbnail_width: self.thumbnail_width(),
            row_key_fields: self.row_key_fields(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# rollcall config\n# Place this file at: {}\n\nversion = 1\n\n[table]\n# \"first\" resolves only the first image column; \"all\" resolves every one\nimage_columns = \"first\"\n# Row fields tried in order for a stable row key; falls back to the row index\nrow_key_fields = [\"_id\", \"id\"]\n\n[images]\n# Requested thumbnail width in pixels (1-{})\nthumbnail_width = {}\n# Treat every image attempt as failed\noffline = false\n# Hosts whose images always fail to load\nblocked_hosts = []\n",
            path.display(),
            MAX_THUMBNAIL_WIDTH,
            DEFAULT_THUMBNAIL_WIDTH,
        )
    }
}
