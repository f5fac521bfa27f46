// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod coerce;
pub mod host;
pub mod ids;
pub mod image_ref;
pub mod model;
pub mod projector;
pub mod resolution;

pub use coerce::*;
pub use host::*;
pub use ids::*;
pub use image_ref::*;
pub use model::*;
pub use projector::*;
pub use resolution::*;
