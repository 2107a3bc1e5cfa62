// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index tables, created lazily and idempotently

use crate::Result;
use sqlx::SqlitePool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS ifc_elements (
        model_id    TEXT NOT NULL,
        project_id  TEXT NOT NULL,
        global_id   TEXT NOT NULL,
        express_id  INTEGER NOT NULL,
        ifc_type    TEXT NOT NULL,
        name        TEXT,
        storey      TEXT,
        space       TEXT,
        PRIMARY KEY (model_id, global_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ifc_properties (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        model_id    TEXT NOT NULL,
        project_id  TEXT NOT NULL,
        global_id   TEXT NOT NULL,
        pset_name   TEXT NOT NULL,
        prop_name   TEXT NOT NULL,
        value       TEXT,
        unit        TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ifc_quantities (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        model_id      TEXT NOT NULL,
        project_id    TEXT NOT NULL,
        global_id     TEXT NOT NULL,
        qto_set       TEXT,
        name          TEXT NOT NULL,
        value         REAL NOT NULL,
        unit          TEXT,
        source        TEXT NOT NULL CHECK (source IN ('ifc_qto', 'pset_qto', 'calculated')),
        method        TEXT,
        quantity_type TEXT NOT NULL
            CHECK (quantity_type IN ('AREA', 'LENGTH', 'VOLUME', 'COUNT', 'WEIGHT', 'OTHER'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS ifc_elements_scope ON ifc_elements (model_id, project_id)",
    "CREATE INDEX IF NOT EXISTS ifc_properties_scope ON ifc_properties (model_id, project_id, global_id)",
    "CREATE INDEX IF NOT EXISTS ifc_quantities_scope ON ifc_quantities (model_id, project_id, global_id)",
    "CREATE INDEX IF NOT EXISTS ifc_quantities_type ON ifc_quantities (model_id, project_id, quantity_type)",
];

/// Create the index tables if absent
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
