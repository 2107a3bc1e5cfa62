// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ParsedModel - Main IFC model implementation

use crate::resolver::ResolverImpl;
use crate::scanner::parse_header;
use crate::units::extract_project_units;

use ifc_index_model::{EntityResolver, IfcModel, ModelMetadata, ParseError, ProjectUnits, Result};

/// Parsed IFC model implementing the `IfcModel` trait
///
/// This is the main entry point for accessing IFC data. Entities are decoded
/// lazily on first access.
pub struct ParsedModel {
    /// Entity resolver for lookups
    resolver: ResolverImpl,
    /// Default units declared by the project
    units: ProjectUnits,
    /// File metadata
    metadata: ModelMetadata,
}

impl ParsedModel {
    /// Open a raw STEP buffer
    ///
    /// Fails when the buffer has no ISO-10303-21 header or no DATA section.
    pub fn open(buffer: &[u8]) -> Result<Self> {
        let content = match String::from_utf8_lossy(buffer) {
            std::borrow::Cow::Borrowed(s) => s.to_string(),
            std::borrow::Cow::Owned(s) => {
                log::warn!("IFC buffer is not valid UTF-8, invalid bytes replaced");
                s
            }
        };

        Self::parse(content)
    }

    /// Parse IFC content and create a model
    pub fn parse(content: String) -> Result<Self> {
        validate(&content)?;

        let header = parse_header(&content);
        let metadata = ModelMetadata {
            schema_version: header.schema_version,
            file_name: header.file_name,
            timestamp: header.timestamp,
            originating_system: header.originating_system,
        };

        let resolver = ResolverImpl::new(content);
        let units = extract_project_units(&resolver);

        let schema = match metadata.schema_version.as_str() {
            "" => "unknown schema",
            schema => schema,
        };
        log::debug!(
            "Opened {} model with {} entities (originating system: {})",
            schema,
            resolver.entity_count(),
            metadata.originating_system.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            resolver,
            units,
            metadata,
        })
    }
}

/// Check the STEP physical file envelope
fn validate(content: &str) -> Result<()> {
    if !content.trim_start().starts_with("ISO-10303-21") {
        return Err(ParseError::format("missing ISO-10303-21 header"));
    }
    if !content.contains("DATA;") {
        return Err(ParseError::format("missing DATA section"));
    }
    Ok(())
}

impl IfcModel for ParsedModel {
    fn resolver(&self) -> &dyn EntityResolver {
        &self.resolver
    }

    fn units(&self) -> &ProjectUnits {
        &self.units
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
