// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::*;

/// Placeholder rendered for missing or unrenderable values.
pub const EM_DASH: &str = "—";

/// Rendition width requested from the thumbnail endpoints.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Plain,
    Image,
    Date,
    Progress,
}

impl ColumnKind {
    pub const ALL: [Self; 4] = [Self::Plain, Self::Image, Self::Date, Self::Progress];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Image => "image",
            Self::Date => "date",
            Self::Progress => "progress",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(Self::Plain),
            "image" => Some(Self::Image),
            "date" => Some(Self::Date),
            "progress" => Some(Self::Progress),
            _ => None,
        }
    }

    /// Builds a kind from boolean header flags. Image wins over progress,
    /// which wins over date.
    pub const fn from_flags(is_image: bool, is_date: bool, is_progress: bool) -> Self {
        if is_image {
            Self::Image
        } else if is_progress {
            Self::Progress
        } else if is_date {
            Self::Date
        } else {
            Self::Plain
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub label: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<ColumnId>, label: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty text, zero and NaN count as "no value".
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(value) => !value.is_empty(),
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => format_number(*value),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    fields: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    pub fn field(&self, column: &ColumnId) -> Option<&RawValue> {
        self.get(column.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Render-ready progress value. The sign is carried separately from the
/// magnitude shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressBar {
    pub value: f64,
    pub is_negative: bool,
}

impl ProgressBar {
    pub fn from_value(value: f64) -> Self {
        Self {
            value,
            is_negative: value < 0.0,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.value.abs()
    }

    pub fn bar_width(&self) -> f64 {
        self.magnitude().min(100.0)
    }

    pub fn label(&self) -> String {
        format!("{}%", format_number(self.magnitude()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Url(String),
    Placeholder { initials: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCell {
    pub display_name: String,
    pub source: ImageSource,
}

impl ImageCell {
    pub fn current_url(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Url(url) => Some(url),
            ImageSource::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, ImageSource::Placeholder { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DisplayValue {
    Text(String),
    FormattedDate(String),
    Progress(Option<ProgressBar>),
    Image(ImageCell),
}

impl DisplayValue {
    /// Single-line text form for hosts without richer widgets.
    pub fn text(&self) -> String {
        match self {
            Self::Text(value) | Self::FormattedDate(value) => value.clone(),
            Self::Progress(None) => EM_DASH.to_owned(),
            Self::Progress(Some(bar)) if bar.is_negative => format!("{} (negative)", bar.label()),
            Self::Progress(Some(bar)) => bar.label(),
            Self::Image(cell) => match &cell.source {
                ImageSource::Url(url) => format!("{} <{url}>", cell.display_name),
                ImageSource::Placeholder { initials } => {
                    format!("{} [{initials}]", cell.display_name)
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCell {
    pub column: ColumnId,
    pub value: DisplayValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedRow {
    pub key: RowKey,
    pub cells: Vec<ProjectedCell>,
}

impl ProjectedRow {
    pub fn get(&self, column: &str) -> Option<&DisplayValue> {
        self.cells
            .iter()
            .find(|cell| cell.column.as_str() == column)
            .map(|cell| &cell.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageColumnPolicy {
    /// Resolve only the first image column; later ones render as plain text.
    #[default]
    First,
    All,
}

impl ImageColumnPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first" => Some(Self::First),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    pub image_columns: ImageColumnPolicy,
    pub thumbnail_width: u32,
    pub row_key_fields: Vec<String>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            image_columns: ImageColumnPolicy::First,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            row_key_fields: vec!["_id".to_owned(), "id".to_owned()],
        }
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    value.to_string()
}
