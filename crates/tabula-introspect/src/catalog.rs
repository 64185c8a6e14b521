//! Snapshot loading from `pg_catalog`.
//!
//! Tables, views, materialized and foreign tables become [`TableDef`]s;
//! functions and procedures become [`RoutineDef`]s; composite types and
//! domains become [`UserDefinedTypeDef`]s. Overloaded routines keep their
//! first signature by OID.

use crate::client::{IntrospectClient, RowExt};
use crate::error::{IntrospectError, IntrospectResult};
use std::collections::BTreeMap;
use tabula::metadata::IndexColumnDef;
use tabula::{
    ColumnDef, ForeignKeyDef, IndexDef, ParameterDef, ParameterDirection, RoutineDef, RoutineKind,
    SchemaSnapshot, TableDef, UserDefinedTypeDef,
};

type RelationKey = (String, String);

/// Postgres `relkind` values the snapshot cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    Table,
    View,
    CompositeType,
}

impl RelationKind {
    fn from_relkind(relkind: i8) -> Option<Self> {
        // `relkind` is a "char"; tokio-postgres exposes it as i8.
        match relkind as u8 as char {
            'r' | 'p' | 'f' => Some(Self::Table),
            'v' | 'm' => Some(Self::View),
            'c' => Some(Self::CompositeType),
            _ => None,
        }
    }
}

/// A hash of everything the snapshot is built from.
///
/// Changes to columns, keys, indexes or routine signatures change it.
pub async fn schema_fingerprint<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<String> {
    let row = client
        .query_one(
            r#"
SELECT md5(
  COALESCE((
    SELECT string_agg(
      concat_ws('|',
        n.nspname, c.relname, c.relkind::text, a.attnum::text, a.attname,
        pg_catalog.format_type(a.atttypid, a.atttypmod),
        a.attnotnull::text,
        COALESCE(a.attidentity::text, ''),
        COALESCE(a.attgenerated::text, ''),
        COALESCE(pg_get_expr(ad.adbin, ad.adrelid), '')),
      E'\n' ORDER BY n.nspname, c.relname, a.attnum)
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
    LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
    WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f', 'c')
      AND a.attnum > 0
      AND NOT a.attisdropped
      AND n.nspname = ANY($1::text[])
  ), '')
  || COALESCE((
    SELECT string_agg(
      concat_ws('|', n.nspname, i.relname, pg_get_indexdef(ix.indexrelid)),
      E'\n' ORDER BY n.nspname, i.relname)
    FROM pg_catalog.pg_index ix
    JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = i.relnamespace
    WHERE n.nspname = ANY($1::text[])
  ), '')
  || COALESCE((
    SELECT string_agg(
      concat_ws('|', n.nspname, con.conname, pg_get_constraintdef(con.oid)),
      E'\n' ORDER BY n.nspname, con.conname)
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_namespace n ON n.oid = con.connamespace
    WHERE con.contype IN ('p', 'u', 'f')
      AND n.nspname = ANY($1::text[])
  ), '')
  || COALESCE((
    SELECT string_agg(
      concat_ws('|', n.nspname, p.proname, p.prokind::text, p.proretset::text,
        pg_get_function_arguments(p.oid), pg_get_function_result(p.oid)),
      E'\n' ORDER BY n.nspname, p.proname, p.oid)
    FROM pg_catalog.pg_proc p
    JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
    WHERE p.prokind IN ('f', 'p')
      AND n.nspname = ANY($1::text[])
  ), '')
) AS fingerprint
"#,
            &[&schemas],
        )
        .await?;

    row.try_get_column::<String>("fingerprint")
}

/// Read the catalog of `schemas` into a snapshot.
///
/// The first schema becomes the snapshot's default schema. Returns the
/// snapshot with the fingerprint it was read at.
pub async fn load_snapshot<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<(SchemaSnapshot, String)> {
    let fingerprint = schema_fingerprint(client, schemas).await?;

    let mut relations = load_relations(client, schemas).await?;
    let indexes = load_indexes(client, schemas).await?;
    let foreign_keys = load_foreign_keys(client, schemas).await?;
    let base_tables = load_view_base_tables(client, schemas).await?;

    let mut tables = Vec::new();
    let mut types = Vec::new();
    for (key, (kind, columns)) in std::mem::take(&mut relations) {
        let (schema, name) = key.clone();
        match kind {
            RelationKind::CompositeType => types.push(UserDefinedTypeDef {
                schema: Some(schema),
                name,
                is_table_type: false,
                base_type: None,
                columns,
            }),
            RelationKind::Table | RelationKind::View => {
                let mut table = TableDef {
                    schema: Some(schema),
                    name,
                    is_view: kind == RelationKind::View,
                    base_table: base_tables.get(&key).cloned(),
                    columns,
                    indexes: indexes.get(&key).cloned().unwrap_or_default(),
                    foreign_keys: foreign_keys.get(&key).cloned().unwrap_or_default(),
                };
                mark_primary_key(&mut table);
                tables.push(table);
            }
        }
    }

    if tables.is_empty() {
        return Err(IntrospectError::Validation(
            "No tables found in the selected schemas".to_string(),
        ));
    }

    let routines = load_routines(client, schemas, &tables, &types).await?;
    types.extend(load_domains(client, schemas).await?);

    tracing::info!(
        target: "tabula.introspect",
        schemas = ?schemas,
        tables = tables.len(),
        routines = routines.len(),
        types = types.len(),
        "loaded schema snapshot"
    );

    let snapshot = SchemaSnapshot {
        default_schema: schemas.first().cloned(),
        tables,
        routines,
        types,
    };
    Ok((snapshot, fingerprint))
}

fn mark_primary_key(table: &mut TableDef) {
    let Some(pk) = table.indexes.iter().find(|i| i.is_primary_key) else {
        return;
    };
    let keys: Vec<&str> = pk
        .columns
        .iter()
        .filter(|c| !c.is_included)
        .map(|c| c.name.as_str())
        .collect();
    for column in &mut table.columns {
        if keys.contains(&column.name.as_str()) {
            column.is_primary_key = true;
        }
    }
}

async fn load_relations<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<BTreeMap<RelationKey, (RelationKind, Vec<ColumnDef>)>> {
    let rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  c.relkind AS relkind,
  a.attname::text AS column_name,
  t.typname::text AS type_name,
  a.attnotnull AS not_null,
  (a.attidentity <> '' OR COALESCE(pg_get_expr(ad.adbin, ad.adrelid), '') LIKE 'nextval(%') AS is_identity,
  (a.attgenerated <> '') AS is_generated,
  CASE WHEN t.typname IN ('varchar', 'bpchar') AND a.atttypmod > 4
       THEN a.atttypmod - 4 END AS max_length,
  CASE WHEN t.typname = 'numeric' AND a.atttypmod > 4
       THEN ((a.atttypmod - 4) >> 16) & 65535 END AS numeric_precision,
  CASE WHEN t.typname = 'numeric' AND a.atttypmod > 4
       THEN (a.atttypmod - 4) & 65535 END AS numeric_scale
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
JOIN pg_catalog.pg_type t ON t.oid = a.atttypid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = c.oid AND ad.adnum = a.attnum
WHERE c.relkind IN ('r', 'p', 'v', 'm', 'f', 'c')
  AND a.attnum > 0
  AND NOT a.attisdropped
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, a.attnum
"#,
            &[&schemas],
        )
        .await?;

    let mut relations: BTreeMap<RelationKey, (RelationKind, Vec<ColumnDef>)> = BTreeMap::new();
    for row in rows {
        let relkind: i8 = row.try_get_column("relkind")?;
        let Some(kind) = RelationKind::from_relkind(relkind) else {
            continue;
        };
        let schema_name: String = row.try_get_column("schema_name")?;
        let table_name: String = row.try_get_column("table_name")?;

        let mut column = ColumnDef::new(
            row.try_get_column::<String>("column_name")?,
            row.try_get_column::<String>("type_name")?,
        );
        column.is_nullable = !row.try_get_column::<bool>("not_null")?;
        column.is_identity = row.try_get_column("is_identity")?;
        column.is_computed = row.try_get_column("is_generated")?;
        column.max_length = row.try_get_column("max_length")?;
        column.precision = row.try_get_column("numeric_precision")?;
        column.scale = row.try_get_column("numeric_scale")?;

        relations
            .entry((schema_name, table_name))
            .or_insert_with(|| (kind, Vec::new()))
            .1
            .push(column);
    }
    Ok(relations)
}

async fn load_indexes<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<BTreeMap<RelationKey, Vec<IndexDef>>> {
    let rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  c.relname AS table_name,
  i.relname AS index_name,
  ix.indisprimary AS is_primary,
  ix.indisunique AS is_unique,
  EXISTS (
    SELECT 1 FROM pg_catalog.pg_constraint con
    WHERE con.conindid = ix.indexrelid AND con.contype = 'u'
  ) AS is_unique_constraint,
  ARRAY(
    SELECT a.attname::text
    FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS column_names,
  ARRAY(
    SELECT (ix.indoption[(k.ord - 1)::int4] & 1) = 1
    FROM unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS descending,
  ix.indnkeyatts::int4 AS key_count,
  (pg_catalog.pg_relation_size(i.oid) / 1024)::int8 AS size_kb,
  c.reltuples::int8 AS row_count
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class c ON c.oid = ix.indrelid
JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = ANY($1::text[])
ORDER BY n.nspname, c.relname, i.relname
"#,
            &[&schemas],
        )
        .await?;

    let mut indexes: BTreeMap<RelationKey, Vec<IndexDef>> = BTreeMap::new();
    for row in rows {
        let schema_name: String = row.try_get_column("schema_name")?;
        let table_name: String = row.try_get_column("table_name")?;
        let names: Vec<String> = row.try_get_column("column_names")?;
        let descending: Vec<bool> = row.try_get_column("descending")?;
        let key_count: i32 = row.try_get_column("key_count")?;

        // Expression index members have no attribute and are left out.
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| IndexColumnDef {
                name,
                is_descending: descending.get(i).copied().unwrap_or(false),
                is_included: i >= usize::try_from(key_count).unwrap_or(usize::MAX),
            })
            .collect();

        indexes.entry((schema_name, table_name)).or_default().push(IndexDef {
            name: row.try_get_column("index_name")?,
            is_primary_key: row.try_get_column("is_primary")?,
            is_unique: row.try_get_column("is_unique")?,
            is_unique_constraint: row.try_get_column("is_unique_constraint")?,
            columns,
            size_kb: row.try_get_column("size_kb")?,
            row_count: row
                .try_get_column::<Option<i64>>("row_count")?
                .filter(|n| *n >= 0),
        });
    }
    Ok(indexes)
}

async fn load_foreign_keys<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<BTreeMap<RelationKey, Vec<ForeignKeyDef>>> {
    let rows = client
        .query(
            r#"
SELECT
  cn.nspname AS schema_name,
  c.relname AS table_name,
  con.conname::text AS constraint_name,
  pn.nspname || '.' || p.relname AS parent_table,
  ARRAY(
    SELECT a.attname::text
    FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS child_columns,
  ARRAY(
    SELECT a.attname::text
    FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_catalog.pg_attribute a ON a.attrelid = con.confrelid AND a.attnum = k.attnum
    ORDER BY k.ord
  ) AS parent_columns
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
JOIN pg_catalog.pg_namespace cn ON cn.oid = c.relnamespace
JOIN pg_catalog.pg_class p ON p.oid = con.confrelid
JOIN pg_catalog.pg_namespace pn ON pn.oid = p.relnamespace
WHERE con.contype = 'f'
  AND cn.nspname = ANY($1::text[])
ORDER BY cn.nspname, c.relname, con.conname
"#,
            &[&schemas],
        )
        .await?;

    let mut foreign_keys: BTreeMap<RelationKey, Vec<ForeignKeyDef>> = BTreeMap::new();
    for row in rows {
        let schema_name: String = row.try_get_column("schema_name")?;
        let table_name: String = row.try_get_column("table_name")?;
        foreign_keys
            .entry((schema_name, table_name))
            .or_default()
            .push(ForeignKeyDef {
                name: row.try_get_column("constraint_name")?,
                parent_table: row.try_get_column("parent_table")?,
                parent_columns: row.try_get_column("parent_columns")?,
                child_columns: row.try_get_column("child_columns")?,
            });
    }
    Ok(foreign_keys)
}

/// Views that read from exactly one table, mapped to that table.
async fn load_view_base_tables<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<BTreeMap<RelationKey, String>> {
    let rows = client
        .query(
            r#"
SELECT
  vn.nspname AS schema_name,
  v.relname AS view_name,
  min(tn.nspname || '.' || t.relname) AS base_table,
  count(DISTINCT t.oid) AS table_count
FROM pg_catalog.pg_class v
JOIN pg_catalog.pg_namespace vn ON vn.oid = v.relnamespace
JOIN pg_catalog.pg_rewrite r ON r.ev_class = v.oid
JOIN pg_catalog.pg_depend d ON d.objid = r.oid AND d.classid = 'pg_catalog.pg_rewrite'::regclass
JOIN pg_catalog.pg_class t ON t.oid = d.refobjid AND t.oid <> v.oid
JOIN pg_catalog.pg_namespace tn ON tn.oid = t.relnamespace
WHERE v.relkind IN ('v', 'm')
  AND t.relkind IN ('r', 'p', 'f')
  AND vn.nspname = ANY($1::text[])
GROUP BY vn.nspname, v.relname
"#,
            &[&schemas],
        )
        .await?;

    let mut base_tables = BTreeMap::new();
    for row in rows {
        let count: i64 = row.try_get_column("table_count")?;
        if count != 1 {
            continue;
        }
        base_tables.insert(
            (
                row.try_get_column::<String>("schema_name")?,
                row.try_get_column::<String>("view_name")?,
            ),
            row.try_get_column::<String>("base_table")?,
        );
    }
    Ok(base_tables)
}

struct RoutineHeader {
    oid: u32,
    kind: RoutineKind,
    def: RoutineDef,
    /// Relation a `SETOF relation` function returns.
    returns_relation: Option<RelationKey>,
}

async fn load_routines<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
    tables: &[TableDef],
    types: &[UserDefinedTypeDef],
) -> IntrospectResult<Vec<RoutineDef>> {
    let rows = client
        .query(
            r#"
SELECT
  p.oid AS oid,
  n.nspname AS schema_name,
  p.proname::text AS routine_name,
  p.prokind AS prokind,
  p.proretset AS returns_set,
  rt.typname::text AS return_type,
  rn.nspname AS return_relation_schema,
  rc.relname AS return_relation_name
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
LEFT JOIN pg_catalog.pg_type rt ON rt.oid = p.prorettype
LEFT JOIN pg_catalog.pg_class rc ON rc.oid = rt.typrelid AND rt.typrelid <> 0
LEFT JOIN pg_catalog.pg_namespace rn ON rn.oid = rc.relnamespace
WHERE p.prokind IN ('f', 'p')
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, p.proname, p.oid
"#,
            &[&schemas],
        )
        .await?;

    let mut headers: Vec<RoutineHeader> = Vec::new();
    for row in rows {
        let prokind: i8 = row.try_get_column("prokind")?;
        let returns_set: bool = row.try_get_column("returns_set")?;
        let kind = match (prokind as u8 as char, returns_set) {
            ('p', _) => RoutineKind::StoredProcedure,
            (_, true) => RoutineKind::TableFunction,
            (_, false) => RoutineKind::ScalarFunction,
        };
        let schema: String = row.try_get_column("schema_name")?;
        let name: String = row.try_get_column("routine_name")?;
        if headers
            .iter()
            .any(|h| h.kind == kind && h.def.schema.as_deref() == Some(&schema) && h.def.name == name)
        {
            tracing::debug!(
                target: "tabula.introspect",
                routine = %format!("{schema}.{name}"),
                "skipping overload"
            );
            continue;
        }

        let return_type: Option<String> = row.try_get_column("return_type")?;
        let returns_relation = match (
            row.try_get_column::<Option<String>>("return_relation_schema")?,
            row.try_get_column::<Option<String>>("return_relation_name")?,
        ) {
            (Some(s), Some(n)) => Some((s, n)),
            _ => None,
        };
        headers.push(RoutineHeader {
            oid: row.try_get_column("oid")?,
            kind,
            def: RoutineDef {
                schema: Some(schema),
                name,
                kind,
                parameters: Vec::new(),
                columns: Vec::new(),
                return_type: (kind == RoutineKind::ScalarFunction)
                    .then_some(return_type)
                    .flatten()
                    .filter(|t| t != "void"),
            },
            returns_relation,
        });
    }

    let oids: Vec<u32> = headers.iter().map(|h| h.oid).collect();
    let rows = client
        .query(
            r#"
SELECT
  p.oid AS oid,
  COALESCE(p.proargnames[a.ord::int4], '') AS parameter_name,
  COALESCE(p.proargmodes[a.ord::int4]::text, 'i') AS parameter_mode,
  t.typname::text AS type_name
FROM pg_catalog.pg_proc p
CROSS JOIN LATERAL unnest(COALESCE(p.proallargtypes, p.proargtypes::oid[]))
  WITH ORDINALITY AS a(type_oid, ord)
JOIN pg_catalog.pg_type t ON t.oid = a.type_oid
WHERE p.oid = ANY($1::oid[])
ORDER BY p.oid, a.ord
"#,
            &[&oids],
        )
        .await?;

    for row in rows {
        let oid: u32 = row.try_get_column("oid")?;
        let Some(header) = headers.iter_mut().find(|h| h.oid == oid) else {
            continue;
        };
        let name: String = row.try_get_column("parameter_name")?;
        let mode: String = row.try_get_column("parameter_mode")?;
        let type_name: String = row.try_get_column("type_name")?;

        let direction = match mode.as_str() {
            "o" => ParameterDirection::Out,
            "b" => ParameterDirection::InOut,
            // RETURNS TABLE columns
            "t" => {
                header.def.columns.push(ColumnDef::new(name, type_name).nullable());
                continue;
            }
            _ => ParameterDirection::In,
        };
        if header.kind == RoutineKind::TableFunction && direction == ParameterDirection::Out {
            header.def.columns.push(ColumnDef::new(name, type_name).nullable());
            continue;
        }
        if header.kind == RoutineKind::ScalarFunction && direction == ParameterDirection::Out {
            continue;
        }
        header
            .def
            .parameters
            .push(ParameterDef::new(name, type_name).direction(direction));
    }

    Ok(headers
        .into_iter()
        .map(|mut h| {
            if h.kind == RoutineKind::TableFunction && h.def.columns.is_empty() {
                if let Some((schema, name)) = &h.returns_relation {
                    h.def.columns = relation_columns(tables, types, schema, name);
                }
            }
            h.def
        })
        .collect())
}

fn relation_columns(
    tables: &[TableDef],
    types: &[UserDefinedTypeDef],
    schema: &str,
    name: &str,
) -> Vec<ColumnDef> {
    let owned = |s: &Option<String>, n: &str| s.as_deref() == Some(schema) && n == name;
    tables
        .iter()
        .find(|t| owned(&t.schema, &t.name))
        .map(|t| t.columns.clone())
        .or_else(|| {
            types
                .iter()
                .find(|t| owned(&t.schema, &t.name))
                .map(|t| t.columns.clone())
        })
        .unwrap_or_default()
}

async fn load_domains<C: IntrospectClient>(
    client: &C,
    schemas: &[String],
) -> IntrospectResult<Vec<UserDefinedTypeDef>> {
    let rows = client
        .query(
            r#"
SELECT
  n.nspname AS schema_name,
  t.typname::text AS type_name,
  bt.typname::text AS base_type
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
JOIN pg_catalog.pg_type bt ON bt.oid = t.typbasetype
WHERE t.typtype = 'd'
  AND n.nspname = ANY($1::text[])
ORDER BY n.nspname, t.typname
"#,
            &[&schemas],
        )
        .await?;

    rows.into_iter()
        .map(|row| {
            Ok(UserDefinedTypeDef {
                schema: Some(row.try_get_column("schema_name")?),
                name: row.try_get_column("type_name")?,
                is_table_type: false,
                base_type: Some(row.try_get_column("base_type")?),
                columns: Vec::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relkinds() {
        assert_eq!(RelationKind::from_relkind(b'r' as i8), Some(RelationKind::Table));
        assert_eq!(RelationKind::from_relkind(b'p' as i8), Some(RelationKind::Table));
        assert_eq!(RelationKind::from_relkind(b'm' as i8), Some(RelationKind::View));
        assert_eq!(RelationKind::from_relkind(b'c' as i8), Some(RelationKind::CompositeType));
        assert_eq!(RelationKind::from_relkind(b'S' as i8), None);
    }

    #[test]
    fn primary_key_index_marks_columns() {
        let mut pk = IndexDef::new("order_lines_pkey", &["order_id", "line_no", "note"]).primary_key();
        pk.columns[2] = IndexColumnDef {
            name: "note".into(),
            is_descending: false,
            is_included: true,
        };
        let mut table = TableDef::table("public.order_lines")
            .column(ColumnDef::new("order_id", "int8"))
            .column(ColumnDef::new("line_no", "int4"))
            .column(ColumnDef::new("note", "text").nullable())
            .index(pk);

        mark_primary_key(&mut table);
        let keys: Vec<_> = table
            .columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(keys, ["order_id", "line_no"]);
    }

    #[test]
    fn setof_relation_functions_reuse_table_columns() {
        let tables = vec![TableDef::table("public.users").column(ColumnDef::new("id", "int8"))];
        let columns = relation_columns(&tables, &[], "public", "users");
        assert_eq!(columns.len(), 1);
        assert!(relation_columns(&tables, &[], "other", "users").is_empty());
    }
}
