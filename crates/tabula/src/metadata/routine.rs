use super::column::{ColumnMetadata, variable_name};
use super::snapshot::ParameterDef;
use crate::builder::SqlBuilder;
use crate::ident::{ObjectName, normalize_name};
use crate::value::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of callable database object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    StoredProcedure,
    ScalarFunction,
    TableFunction,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoutineKind::StoredProcedure => "stored procedure",
            RoutineKind::ScalarFunction => "scalar function",
            RoutineKind::TableFunction => "table function",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterDirection {
    #[default]
    In,
    Out,
    InOut,
}

impl ParameterDirection {
    pub fn is_input(self) -> bool {
        matches!(self, ParameterDirection::In | ParameterDirection::InOut)
    }

    pub fn is_output(self) -> bool {
        matches!(self, ParameterDirection::Out | ParameterDirection::InOut)
    }
}

/// A declared routine parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    /// Name as declared, e.g. `@CustomerKey`.
    pub sql_name: String,
    /// Declared name without prefix sigils, used as the bind name.
    pub variable_name: String,
    pub normalized_name: String,
    pub native_type: String,
    pub kind: Option<ValueKind>,
    pub is_nullable: bool,
    pub max_length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub direction: ParameterDirection,
}

impl ParameterMetadata {
    pub(crate) fn from_def(def: &ParameterDef, kind: Option<ValueKind>) -> Self {
        Self {
            sql_name: def.name.clone(),
            variable_name: variable_name(&def.name),
            normalized_name: normalize_name(&def.name),
            native_type: def.native_type.clone(),
            kind,
            is_nullable: def.is_nullable,
            max_length: def.max_length,
            precision: def.precision,
            scale: def.scale,
            direction: def.direction,
        }
    }

    /// Whether `name` refers to this parameter.
    ///
    /// Besides the declared and normalized forms, a `p_` prefix on the
    /// declared name is optional, so `customer_key` matches `p_customer_key`.
    pub fn matches(&self, name: &str) -> bool {
        let normalized = normalize_name(name);
        self.variable_name.eq_ignore_ascii_case(name)
            || self.normalized_name == normalized
            || self
                .variable_name
                .strip_prefix("p_")
                .is_some_and(|rest| normalize_name(rest) == normalized)
    }
}

/// A stored procedure, scalar function or table function.
#[derive(Debug, Clone)]
pub struct RoutineMetadata {
    name: ObjectName,
    kind: RoutineKind,
    parameters: Vec<Arc<ParameterMetadata>>,
    columns: Vec<Arc<ColumnMetadata>>,
    return_type: Option<String>,
    builder: SqlBuilder,
}

impl RoutineMetadata {
    pub(crate) fn new(
        name: ObjectName,
        kind: RoutineKind,
        parameters: Vec<Arc<ParameterMetadata>>,
        columns: Vec<Arc<ColumnMetadata>>,
        return_type: Option<String>,
        builder: SqlBuilder,
    ) -> Self {
        Self {
            name,
            kind,
            parameters,
            columns,
            return_type,
            builder,
        }
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }

    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    pub fn parameters(&self) -> &[Arc<ParameterMetadata>] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Arc<ParameterMetadata>> {
        self.parameters.iter().find(|p| p.matches(name))
    }

    /// Result columns of a table function; empty otherwise.
    pub fn columns(&self) -> &[Arc<ColumnMetadata>] {
        &self.columns
    }

    /// Return type of a scalar function.
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// A fresh SQL builder cloned from this routine's template.
    pub fn sql_builder(&self) -> SqlBuilder {
        self.builder.clone()
    }
}
