// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional reconciliation of multi-source quantity summaries

use crate::query::QuantitySummaryRow;
use ifc_index_model::{QuantitySource, QuantityType};
use rustc_hash::FxHashSet;

/// Drop take-off rows shadowed by a declared quantity
///
/// A `pset_qto` row is removed when an `ifc_qto` row exists for the same
/// group, quantity type and name. Order is preserved. Summaries never apply
/// this on their own.
pub fn prefer_declared(rows: Vec<QuantitySummaryRow>) -> Vec<QuantitySummaryRow> {
    let declared: FxHashSet<(String, QuantityType, String)> = rows
        .iter()
        .filter(|row| row.source == QuantitySource::IfcQto)
        .map(|row| (row.group.clone(), row.quantity_type, row.name.clone()))
        .collect();

    rows.into_iter()
        .filter(|row| {
            row.source != QuantitySource::PsetQto
                || !declared.contains(&(row.group.clone(), row.quantity_type, row.name.clone()))
        })
        .collect()
}
