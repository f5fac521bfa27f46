// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rollcall_app::{
    CellEvent, ColumnDescriptor, ColumnKind, ImageProbe, LoadOutcome, ProjectedRow,
    ProjectionOptions, RawRow, RawValue, TableProjector,
};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct TableInput {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    columns: Vec<ColumnEntry>,
    #[serde(default)]
    rows: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnEntry {
    id: String,
    label: Option<String>,
    kind: Option<String>,
    #[serde(rename = "isImage", default)]
    is_image: bool,
    #[serde(rename = "isDate", default)]
    is_date: bool,
    #[serde(rename = "isProgress", default)]
    is_progress: bool,
}

impl ColumnEntry {
    fn into_descriptor(self) -> Result<ColumnDescriptor> {
        let kind = match &self.kind {
            Some(kind) => ColumnKind::parse(kind).ok_or_else(|| {
                anyhow!(
                    "column {:?} has unknown kind {kind:?}; expected one of: plain, image, date, progress",
                    self.id
                )
            })?,
            None => ColumnKind::from_flags(self.is_image, self.is_date, self.is_progress),
        };
        let label = self.label.unwrap_or_else(|| self.id.clone());
        Ok(ColumnDescriptor::new(self.id, label, kind))
    }
}

pub fn load_table(path: &Path) -> Result<TableInput> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read table file {}", path.display()))?;
    parse_table(&raw).with_context(|| format!("load table file {}", path.display()))
}

pub fn parse_table(raw: &str) -> Result<TableInput> {
    let file: TableFile = serde_json::from_str(raw).context("parse table JSON")?;
    if file.columns.is_empty() {
        bail!("table has no columns; add at least one entry under \"columns\"");
    }

    let columns = file
        .columns
        .into_iter()
        .map(ColumnEntry::into_descriptor)
        .collect::<Result<Vec<_>>>()?;
    let rows = file
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| raw_row(index, row))
        .collect::<Result<Vec<_>>>()?;

    debug!(columns = columns.len(), rows = rows.len(), "loaded table");
    Ok(TableInput { columns, rows })
}

fn raw_row(index: usize, value: &Value) -> Result<RawRow> {
    let Value::Object(fields) = value else {
        bail!("row {index} is not a JSON object");
    };
    Ok(fields
        .iter()
        .filter_map(|(key, value)| raw_value(value).map(|value| (key.clone(), value)))
        .collect())
}

fn raw_value(value: &Value) -> Option<RawValue> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(RawValue::text(text.as_str())),
        Value::Number(number) => number.as_f64().map(RawValue::Number),
        Value::Bool(flag) => Some(RawValue::text(flag.to_string())),
        Value::Array(_) | Value::Object(_) => Some(RawValue::text(value.to_string())),
    }
}

pub fn demo_table(seed: u64, rows: usize) -> TableInput {
    TableInput {
        columns: rollcall_testkit::employee_columns(),
        rows: rollcall_testkit::RowFaker::new(seed).rows(rows),
    }
}

/// Decides image loads without touching the network.
#[derive(Debug, Clone, Default)]
pub struct PolicyProbe {
    offline: bool,
    blocked_hosts: Vec<String>,
}

impl PolicyProbe {
    pub fn new(offline: bool, blocked_hosts: Vec<String>) -> Self {
        Self {
            offline,
            blocked_hosts,
        }
    }

    fn is_blocked(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.blocked_hosts.iter().any(|blocked| {
            host == *blocked
                || host
                    .strip_suffix(blocked.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl ImageProbe for PolicyProbe {
    fn attempt(&mut self, url: &str) -> LoadOutcome {
        if self.offline {
            return LoadOutcome::Failed;
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                debug!(url, %error, "image url does not parse");
                return LoadOutcome::Failed;
            }
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return LoadOutcome::Failed;
        }
        match parsed.host_str() {
            Some(host) if !self.is_blocked(host) => LoadOutcome::Loaded,
            _ => LoadOutcome::Failed,
        }
    }
}

pub struct TableRuntime<P> {
    projector: TableProjector,
    probe: P,
}

impl<P: ImageProbe> TableRuntime<P> {
    pub fn new(columns: Vec<ColumnDescriptor>, options: ProjectionOptions, probe: P) -> Self {
        Self {
            projector: TableProjector::with_options(columns, options),
            probe,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.projector.columns()
    }

    /// Projects the rows, drives every image cell to a final source, then
    /// projects again so the output reflects where resolution settled.
    pub fn run(&mut self, rows: &[RawRow]) -> Vec<ProjectedRow> {
        self.projector.project(rows);
        let events = self.projector.settle(&mut self.probe);

        let exhausted = events
            .iter()
            .filter(|event| matches!(event, CellEvent::Exhausted { .. }))
            .count();
        if exhausted > 0 {
            warn!(exhausted, "some image cells fell back to initials");
        }
        info!(
            rows = rows.len(),
            events = events.len(),
            exhausted,
            "resolved table images"
        );

        self.projector.project(rows)
    }
}

pub fn render_text(columns: &[ColumnDescriptor], rows: &[ProjectedRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut header = vec!["key".to_owned()];
    header.extend(columns.iter().map(|column| column.label.clone()));
    lines.push(header);
    for row in rows {
        let mut line = vec![row.key.to_string()];
        line.extend(row.cells.iter().map(|cell| cell.value.text()));
        lines.push(line);
    }

    let mut widths = vec![0_usize; columns.len() + 1];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in &lines {
        let padded = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_json(rows: &[ProjectedRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("encode projected rows as JSON")
}
