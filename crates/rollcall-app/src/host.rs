// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::CellKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// The host's way of trying to load an image url.
pub trait ImageProbe {
    fn attempt(&mut self, url: &str) -> LoadOutcome;
}

impl<F> ImageProbe for F
where
    F: FnMut(&str) -> LoadOutcome,
{
    fn attempt(&mut self, url: &str) -> LoadOutcome {
        self(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellCommand {
    LoadSucceeded(CellKey),
    LoadFailed(CellKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellEvent {
    Loaded { cell: CellKey, url: String },
    Advanced { cell: CellKey, next_url: String },
    Exhausted { cell: CellKey, initials: String },
}

impl CellEvent {
    pub fn cell(&self) -> &CellKey {
        match self {
            Self::Loaded { cell, .. } | Self::Advanced { cell, .. } | Self::Exhausted { cell, .. } => {
                cell
            }
        }
    }
}
