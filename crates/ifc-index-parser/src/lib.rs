// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Index Parser - STEP reader and index extraction
//!
//! This crate opens IFC (STEP) buffers and turns them into the element,
//! property and quantity rows of a model index. It implements the traits
//! defined in `ifc-index-model`.
//!
//! # Features
//!
//! - **Fast tokenization** using `nom` combinators
//! - **SIMD-accelerated scanning** using `memchr`
//! - **Lazy entity decoding** - only parse entities when needed
//! - **Spatial containment** with an explicit tie-break policy
//! - **Dual-source quantities** from element quantities and take-off property sets
//!
//! # Example
//!
//! ```ignore
//! use ifc_index_parser::{extract_index, ExtractOptions, StepParser};
//! use ifc_index_model::IfcParser;
//!
//! let model = StepParser::new().open(&bytes)?;
//! let index = extract_index(model.as_ref(), &ExtractOptions::default());
//! println!("{} elements", index.elements.len());
//! ```

mod extract;
mod model;
mod properties;
mod resolver;
mod scanner;
mod spatial;
mod tokenizer;
mod units;

pub use extract::{extract_index, ExtractOptions, DEFAULT_TAKEOFF_PSET};
pub use model::ParsedModel;
pub use properties::{
    extract_takeoff_quantity_if_applicable, format_value, QuantityFields, METHOD_ELEMENT_QUANTITY,
    METHOD_PSET_NUMERIC,
};
pub use resolver::ResolverImpl;
pub use scanner::EntityScanner;
pub use spatial::{ContainmentPolicy, SpatialIndex};
pub use tokenizer::{decode_step_string, parse_entity, Token};

use ifc_index_model::{IfcModel, IfcParser, ParseError, Result};
use std::path::Path;
use std::sync::Arc;

/// Main STEP/IFC parser implementing `IfcParser` trait
#[derive(Clone, Copy, Debug, Default)]
pub struct StepParser;

impl StepParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Read and open a file from disk
    pub fn open_path(&self, path: impl AsRef<Path>) -> Result<Arc<dyn IfcModel>> {
        let path = path.as_ref();
        let buffer = std::fs::read(path).map_err(ParseError::Io)?;
        log::debug!("Read {} bytes from {}", buffer.len(), path.display());
        self.open(&buffer)
    }
}

impl IfcParser for StepParser {
    fn open(&self, buffer: &[u8]) -> Result<Arc<dyn IfcModel>> {
        ParsedModel::open(buffer).map(|m| Arc::new(m) as Arc<dyn IfcModel>)
    }
}

/// Quick open function for simple use cases
pub fn open(buffer: &[u8]) -> Result<Arc<dyn IfcModel>> {
    StepParser::new().open(buffer)
}
