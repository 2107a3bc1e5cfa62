// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for opening and reading IFC models

use crate::{EntityResolver, ModelMetadata, ProjectUnits, Result};
use std::sync::Arc;

/// Main parsing interface - entry point for opening an IFC buffer
///
/// # Example
///
/// ```ignore
/// use ifc_index_model::IfcParser;
///
/// let model = parser.open(&bytes)?;
/// println!("Schema: {}", model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    /// Open a raw model buffer
    ///
    /// Fails only when the buffer is not a readable STEP file. Individual
    /// malformed lines never fail the open.
    fn open(&self, buffer: &[u8]) -> Result<Arc<dyn IfcModel>>;
}

/// Core model interface - read-only access to an opened model
///
/// The model is thread-safe (`Send + Sync`) so it can be handed to a
/// blocking worker and dropped there.
pub trait IfcModel: Send + Sync {
    /// Get entity resolver for entity lookups and reference resolution
    fn resolver(&self) -> &dyn EntityResolver;

    /// Default unit labels declared by the project
    fn units(&self) -> &ProjectUnits;

    /// Get file metadata (schema version, originating system, etc.)
    fn metadata(&self) -> &ModelMetadata;
}
