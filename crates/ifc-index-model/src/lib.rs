// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Index Model - Trait definitions and shared types for IFC quantity indexing
//!
//! This crate provides the abstractions shared by the parser, the index store
//! and the service facade. It defines the traits a model backend implements
//! and the record types an indexing run produces.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Opens a raw model buffer
//! - [`IfcModel`] - Read-only access to an opened model
//! - [`EntityResolver`] - Entity lookup by numeric handle and reference resolution
//! - [`PropertyDefinition`] - Closed classification of property definitions
//! - [`ElementRecord`], [`PropertyRecord`], [`QuantityRecord`] - Index rows
//!
//! # Example
//!
//! ```ignore
//! use ifc_index_model::{IfcParser, IfcType};
//!
//! let model = parser.open(&buffer)?;
//! for storey in model.resolver().entities_by_type(&IfcType::IfcBuildingStorey) {
//!     println!("{} {:?}", storey.id, storey.get_string(2));
//! }
//! ```

pub mod error;
pub mod properties;
pub mod records;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use properties::*;
pub use records::*;
pub use resolver::*;
pub use traits::*;
pub use types::*;
