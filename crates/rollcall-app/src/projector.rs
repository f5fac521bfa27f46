// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::{
    CellCommand, CellEvent, CellKey, ColumnDescriptor, ColumnId, ColumnKind, DisplayValue,
    ImageCell, ImageColumnPolicy, ImageFieldValue, ImageProbe, ImageResolution, ImageSource,
    LoadOutcome, ProjectedCell, ProjectedRow, ProjectionOptions, RawRow, RawValue, RowKey,
    coerce_value, derive_candidates_sized, parse_image_field,
};

pub const UNKNOWN_INITIALS: &str = "?";

#[derive(Debug, Clone)]
struct ImageCellState {
    source_url: String,
    display_name: String,
    resolution: ImageResolution,
    confirmed: bool,
}

impl ImageCellState {
    fn new(field: ImageFieldValue, thumbnail_width: u32) -> Self {
        let resolution = ImageResolution::new(derive_candidates_sized(&field.url, thumbnail_width));
        Self {
            source_url: field.url,
            display_name: field.display_name,
            resolution,
            confirmed: false,
        }
    }

    fn render(&self) -> DisplayValue {
        let source = match self.resolution.current_url() {
            Some(url) => ImageSource::Url(url.to_owned()),
            None => ImageSource::Placeholder {
                initials: placeholder_initials(&self.display_name),
            },
        };
        DisplayValue::Image(ImageCell {
            display_name: self.display_name.clone(),
            source,
        })
    }
}

/// Turns raw rows into render-ready rows and keeps per-cell image
/// resolution state between projections.
///
/// Image cells are keyed by row identity and column id. A cell keeps its
/// progress through its candidate urls as long as the source url stays the
/// same, and starts over when it changes. Cells whose row disappears from a
/// projection are forgotten.
#[derive(Debug, Clone)]
pub struct TableProjector {
    columns: Vec<ColumnDescriptor>,
    options: ProjectionOptions,
    cells: HashMap<CellKey, ImageCellState>,
}

impl TableProjector {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self::with_options(columns, ProjectionOptions::default())
    }

    pub fn with_options(columns: Vec<ColumnDescriptor>, options: ProjectionOptions) -> Self {
        Self {
            columns,
            options,
            cells: HashMap::new(),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.columns = columns;
        let resolved = self.resolved_columns();
        self.cells.retain(|key, _| resolved.contains(&key.column));
    }

    /// Image columns that get candidate resolution under the configured
    /// policy.
    pub fn resolved_columns(&self) -> HashSet<ColumnId> {
        let images = self
            .columns
            .iter()
            .filter(|column| column.kind == ColumnKind::Image)
            .map(|column| column.id.clone());
        match self.options.image_columns {
            ImageColumnPolicy::First => images.take(1).collect(),
            ImageColumnPolicy::All => images.collect(),
        }
    }

    /// Key of a single row taken on its own: the first truthy key field,
    /// else its position. [`TableProjector::project`] additionally keys a
    /// repeated field value by position so every row owns its cells.
    pub fn row_key(&self, row: &RawRow, index: usize) -> RowKey {
        self.options
            .row_key_fields
            .iter()
            .filter_map(|field| row.get(field))
            .find(|value| value.is_truthy())
            .map_or(RowKey::Index(index), |value| RowKey::Field(value.display()))
    }

    pub fn project(&mut self, rows: &[RawRow]) -> Vec<ProjectedRow> {
        let resolved = self.resolved_columns();
        let mut seen = HashSet::new();
        let mut row_keys = HashSet::with_capacity(rows.len());
        let mut projected = Vec::with_capacity(rows.len());

        for (index, row) in rows.iter().enumerate() {
            let mut key = self.row_key(row, index);
            if !row_keys.insert(key.clone()) {
                debug!(row = index, key = %key, "duplicate row key; keying row by position");
                key = RowKey::Index(index);
                row_keys.insert(key.clone());
            }
            let mut cells = Vec::with_capacity(self.columns.len());

            for column in &self.columns {
                let raw = row.field(&column.id);
                let value = if resolved.contains(&column.id) {
                    let cell = CellKey::new(key.clone(), column.id.clone());
                    let value = project_image(
                        &mut self.cells,
                        self.options.thumbnail_width,
                        &cell,
                        raw,
                    );
                    seen.insert(cell);
                    value
                } else {
                    coerce_value(column.kind, raw)
                };
                cells.push(ProjectedCell {
                    column: column.id.clone(),
                    value,
                });
            }

            projected.push(ProjectedRow { key, cells });
        }

        let before = self.cells.len();
        self.cells.retain(|cell, _| seen.contains(cell));
        debug!(
            rows = rows.len(),
            image_cells = self.cells.len(),
            dropped = before - self.cells.len(),
            "projected table"
        );
        projected
    }

    pub fn cell(&self, key: &CellKey) -> Option<DisplayValue> {
        self.cells.get(key).map(ImageCellState::render)
    }

    pub fn resolution(&self, key: &CellKey) -> Option<&ImageResolution> {
        self.cells.get(key).map(|state| &state.resolution)
    }

    pub fn tracked_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn on_load_success(&mut self, key: &CellKey) -> Option<DisplayValue> {
        self.confirm(key);
        self.cell(key)
    }

    pub fn on_load_failure(&mut self, key: &CellKey) -> Option<DisplayValue> {
        self.advance(key);
        self.cell(key)
    }

    pub fn dispatch(&mut self, command: CellCommand) -> Vec<CellEvent> {
        let event = match command {
            CellCommand::LoadSucceeded(key) => self.confirm(&key),
            CellCommand::LoadFailed(key) => self.advance(&key),
        };
        event.into_iter().collect()
    }

    /// Image cells whose current candidate has not been reported on yet,
    /// ordered by cell key.
    pub fn pending_attempts(&self) -> Vec<(CellKey, String)> {
        let mut attempts = self
            .cells
            .iter()
            .filter(|(_, state)| !state.confirmed)
            .filter_map(|(key, state)| {
                state
                    .resolution
                    .current_url()
                    .map(|url| (key.clone(), url.to_owned()))
            })
            .collect::<Vec<_>>();
        attempts.sort();
        attempts
    }

    /// Runs every outstanding attempt through `probe` until each image cell
    /// has either loaded a candidate or run out of them.
    pub fn settle<P: ImageProbe + ?Sized>(&mut self, probe: &mut P) -> Vec<CellEvent> {
        let mut events = Vec::new();
        loop {
            let attempts = self.pending_attempts();
            if attempts.is_empty() {
                break;
            }
            for (key, url) in attempts {
                let command = match probe.attempt(&url) {
                    LoadOutcome::Loaded => CellCommand::LoadSucceeded(key),
                    LoadOutcome::Failed => CellCommand::LoadFailed(key),
                };
                events.extend(self.dispatch(command));
            }
        }
        events
    }

    fn confirm(&mut self, key: &CellKey) -> Option<CellEvent> {
        let state = self.cells.get_mut(key)?;
        state.resolution.on_load_success();
        let url = state.resolution.current_url()?.to_owned();
        state.confirmed = true;
        Some(CellEvent::Loaded {
            cell: key.clone(),
            url,
        })
    }

    fn advance(&mut self, key: &CellKey) -> Option<CellEvent> {
        let state = self.cells.get_mut(key)?;
        if state.resolution.is_failed() {
            return None;
        }
        state.confirmed = false;

        match state.resolution.on_load_failure().map(str::to_owned) {
            Some(next_url) => {
                debug!(cell = %key, next_url = %next_url, "image candidate failed; trying next");
                Some(CellEvent::Advanced {
                    cell: key.clone(),
                    next_url,
                })
            }
            None => {
                let initials = placeholder_initials(&state.display_name);
                info!(
                    cell = %key,
                    candidates = state.resolution.candidates().len(),
                    "image candidates exhausted; showing placeholder"
                );
                Some(CellEvent::Exhausted {
                    cell: key.clone(),
                    initials,
                })
            }
        }
    }
}

/// Up to two initials from the first two words of `name`, uppercased.
pub fn placeholder_initials(name: &str) -> String {
    let initials = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect::<String>();
    if initials.is_empty() {
        UNKNOWN_INITIALS.to_owned()
    } else {
        initials
    }
}

fn project_image(
    cells: &mut HashMap<CellKey, ImageCellState>,
    thumbnail_width: u32,
    key: &CellKey,
    raw: Option<&RawValue>,
) -> DisplayValue {
    let field = parse_image_field(raw);
    match cells.entry(key.clone()) {
        Entry::Occupied(mut entry) => {
            let state = entry.get_mut();
            if state.source_url != field.url {
                debug!(cell = %key, "image source changed; restarting candidates");
                state
                    .resolution
                    .on_source_changed(derive_candidates_sized(&field.url, thumbnail_width));
                state.source_url = field.url;
                state.confirmed = false;
            }
            state.display_name = field.display_name;
            state.render()
        }
        Entry::Vacant(entry) => entry.insert(ImageCellState::new(field, thumbnail_width)).render(),
    }
}
