// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::CandidateList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionState {
    Pending(usize),
    Failed,
}

/// Walks a cell's candidate urls one at a time.
///
/// The host attempts [`ImageResolution::current_url`] and reports back with
/// [`ImageResolution::on_load_success`] or [`ImageResolution::on_load_failure`].
/// Only running out of candidates marks the cell failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolution {
    candidates: CandidateList,
    state: ResolutionState,
}

impl ImageResolution {
    pub fn new(candidates: CandidateList) -> Self {
        let state = initial_state(&candidates);
        Self { candidates, state }
    }

    pub fn state(&self) -> ResolutionState {
        self.state
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn current_url(&self) -> Option<&str> {
        match self.state {
            ResolutionState::Pending(index) => self.candidates.get(index),
            ResolutionState::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == ResolutionState::Failed
    }

    /// The current candidate loaded; nothing moves.
    pub fn on_load_success(&mut self) {}

    /// Moves to the next candidate and returns it, or fails the cell when
    /// none is left.
    pub fn on_load_failure(&mut self) -> Option<&str> {
        let ResolutionState::Pending(index) = self.state else {
            return None;
        };

        let next = index + 1;
        if next < self.candidates.len() {
            self.state = ResolutionState::Pending(next);
            self.candidates.get(next)
        } else {
            self.state = ResolutionState::Failed;
            None
        }
    }

    pub fn on_source_changed(&mut self, candidates: CandidateList) {
        self.state = initial_state(&candidates);
        self.candidates = candidates;
    }
}

fn initial_state(candidates: &CandidateList) -> ResolutionState {
    if candidates.is_empty() {
        ResolutionState::Failed
    } else {
        ResolutionState::Pending(0)
    }
}
