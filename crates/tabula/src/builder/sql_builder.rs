use super::options::{ApplyOptions, DesiredColumns, FilterOptions, OperationKind};
use crate::command::SortExpression;
use crate::dialect::Dialect;
use crate::dialect::statement::CallArgument;
use crate::error::{MappingError, TabulaResult, ValidationError};
use crate::mapping::{Argument, Record, RecordField};
use crate::metadata::{ColumnMetadata, ParameterDirection, ParameterMetadata};
use crate::sql::{Parameter, Sql};
use crate::value::{Value, ValueKind};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ColumnEntry {
    column: Arc<ColumnMetadata>,
    value: Option<Value>,
    is_key: bool,
    use_for_insert: bool,
    use_for_update: bool,
    use_for_read: bool,
}

#[derive(Debug, Clone)]
struct ParameterEntry {
    parameter: Arc<ParameterMetadata>,
    value: Option<Value>,
}

/// Per-statement clause builder.
///
/// Every table and routine owns a template; commands clone it and drive the
/// clone through a fixed order:
///
/// 1. [`apply_argument_value`](Self::apply_argument_value)
/// 2. [`override_keys`](Self::override_keys) (optional)
/// 3. [`apply_desired_columns`](Self::apply_desired_columns)
/// 4. [`apply_filter_value`](Self::apply_filter_value) (optional)
/// 5. the `build_*` clause methods
/// 6. [`get_parameters`](Self::get_parameters)
///
/// Clause methods read what earlier steps recorded, so building a
/// projection before desired columns are applied yields an empty one.
#[derive(Clone)]
pub struct SqlBuilder {
    dialect: Arc<dyn Dialect>,
    object: String,
    columns: Vec<ColumnEntry>,
    parameters: Vec<ParameterEntry>,
    bound: Vec<Parameter>,
}

impl fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("dialect", &self.dialect.name())
            .field("object", &self.object)
            .field("columns", &self.columns.len())
            .field("parameters", &self.parameters.len())
            .field("bound", &self.bound.len())
            .finish()
    }
}

impl SqlBuilder {
    pub(crate) fn new(
        dialect: Arc<dyn Dialect>,
        object: impl Into<String>,
        columns: &[Arc<ColumnMetadata>],
        parameters: &[Arc<ParameterMetadata>],
    ) -> Self {
        Self {
            dialect,
            object: object.into(),
            columns: columns
                .iter()
                .map(|c| ColumnEntry {
                    column: Arc::clone(c),
                    value: None,
                    is_key: c.is_primary_key,
                    use_for_insert: false,
                    use_for_update: false,
                    use_for_read: false,
                })
                .collect(),
            parameters: parameters
                .iter()
                .map(|p| ParameterEntry {
                    parameter: Arc::clone(p),
                    value: None,
                })
                .collect(),
            bound: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Name of the table or routine, for error messages.
    pub fn object_name(&self) -> &str {
        &self.object
    }

    /// Match an argument onto columns (or, for [`OperationKind::Call`],
    /// declared parameters).
    pub fn apply_argument_value(
        &mut self,
        argument: &Argument,
        operation: OperationKind,
        options: &ApplyOptions,
    ) -> TabulaResult<()> {
        let routine = operation == OperationKind::Call;
        match argument {
            Argument::Scalar(value) if routine => self.apply_scalar_parameter(value),
            Argument::Scalar(value) => self.apply_scalar_key(value),
            Argument::Record(record) if routine => self.apply_record_parameters(record),
            Argument::Record(record) => self.apply_record_columns(record, operation, options),
        }
    }

    fn apply_scalar_key(&mut self, value: &Value) -> TabulaResult<()> {
        let keys: Vec<usize> = (0..self.columns.len())
            .filter(|i| self.columns[*i].is_key)
            .collect();
        let [idx] = keys[..] else {
            return Err(MappingError::AmbiguousOrNoKey {
                table: self.object.clone(),
                key_count: keys.len(),
            }
            .into());
        };
        let column = Arc::clone(&self.columns[idx].column);
        self.columns[idx].value = Some(coerce(value, column.kind, &column.name)?);
        Ok(())
    }

    fn apply_scalar_parameter(&mut self, value: &Value) -> TabulaResult<()> {
        let inputs: Vec<usize> = (0..self.parameters.len())
            .filter(|i| self.parameters[*i].parameter.direction.is_input())
            .collect();
        let [idx] = inputs[..] else {
            return Err(MappingError::NoMatchingColumns {
                table: self.object.clone(),
            }
            .into());
        };
        let parameter = Arc::clone(&self.parameters[idx].parameter);
        self.parameters[idx].value = Some(coerce(value, parameter.kind, &parameter.sql_name)?);
        Ok(())
    }

    fn apply_record_parameters(&mut self, record: &Record) -> TabulaResult<()> {
        for field in record.fields() {
            let Some(idx) = self
                .parameters
                .iter()
                .position(|p| p.parameter.matches(field.column_name()) || p.parameter.matches(&field.name))
            else {
                continue;
            };
            let parameter = Arc::clone(&self.parameters[idx].parameter);
            self.parameters[idx].value = Some(coerce(&field.value, parameter.kind, &parameter.sql_name)?);
        }
        Ok(())
    }

    fn apply_record_columns(
        &mut self,
        record: &Record,
        operation: OperationKind,
        options: &ApplyOptions,
    ) -> TabulaResult<()> {
        if options.use_key_attribute {
            let keyed: Vec<usize> = record
                .fields()
                .iter()
                .filter(|f| f.is_key)
                .filter_map(|f| self.find_column(f))
                .collect();
            if !keyed.is_empty() {
                for (i, entry) in self.columns.iter_mut().enumerate() {
                    entry.is_key = keyed.contains(&i);
                }
            }
        }

        let mut matched = 0;
        for field in record.fields() {
            let Some(idx) = self.find_column(field) else {
                continue;
            };
            matched += 1;

            let column = Arc::clone(&self.columns[idx].column);
            let value = coerce(&field.value, column.kind, &column.name)?;
            let entry = &mut self.columns[idx];
            entry.value = Some(value);
            entry.use_for_insert = !field.ignore_on_insert
                && !column.is_computed
                && (!column.is_identity || options.identity_insert);
            entry.use_for_update = !field.ignore_on_update && !column.is_computed && !column.is_identity;
        }

        let writes = matches!(
            operation,
            OperationKind::Insert | OperationKind::Update | OperationKind::Upsert
        );
        if matched == 0 && writes {
            return Err(MappingError::NoMatchingColumns {
                table: self.object.clone(),
            }
            .into());
        }

        if options.all_columns_required && operation != OperationKind::Update {
            if let Some(missing) = self
                .columns
                .iter()
                .find(|e| e.column.is_required() && e.value.is_none())
            {
                return Err(MappingError::ColumnNotMapped {
                    table: self.object.clone(),
                    column: missing.column.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn find_column(&self, field: &RecordField) -> Option<usize> {
        let exact = |name: &str| {
            self.columns
                .iter()
                .position(|e| e.column.name.eq_ignore_ascii_case(name))
        };
        let loose = |name: &str| self.columns.iter().position(|e| e.column.matches(name));

        if let Some(column) = &field.column {
            if let Some(idx) = exact(column).or_else(|| loose(column)) {
                return Some(idx);
            }
        }
        exact(&field.name).or_else(|| loose(&field.name))
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|e| e.column.name.eq_ignore_ascii_case(name))
            .or_else(|| self.columns.iter().position(|e| e.column.matches(name)))
    }

    /// Replace the key column set.
    pub fn override_keys<S: AsRef<str>>(&mut self, columns: &[S]) -> TabulaResult<()> {
        let mut keys = Vec::with_capacity(columns.len());
        for name in columns {
            let idx = self
                .column_index(name.as_ref())
                .ok_or_else(|| MappingError::ColumnNotMapped {
                    table: self.object.clone(),
                    column: name.as_ref().to_string(),
                })?;
            keys.push(idx);
        }
        for (i, entry) in self.columns.iter_mut().enumerate() {
            entry.is_key = keys.contains(&i);
        }
        Ok(())
    }

    /// Current key columns in table order.
    pub fn key_columns(&self) -> Vec<Arc<ColumnMetadata>> {
        self.columns
            .iter()
            .filter(|e| e.is_key)
            .map(|e| Arc::clone(&e.column))
            .collect()
    }

    /// Value assigned to a column by the argument, if any.
    pub fn column_value(&self, name: &str) -> Option<&Value> {
        self.column_index(name)
            .and_then(|i| self.columns[i].value.as_ref())
    }

    pub fn apply_desired_columns(&mut self, desired: &DesiredColumns) -> TabulaResult<()> {
        for entry in &mut self.columns {
            entry.use_for_read = false;
        }
        match desired {
            DesiredColumns::NoColumns => {}
            DesiredColumns::AllColumns => {
                for entry in &mut self.columns {
                    entry.use_for_read = true;
                }
            }
            DesiredColumns::Auto => {
                let has_key = self.columns.iter().any(|e| e.is_key);
                for entry in &mut self.columns {
                    entry.use_for_read = entry.is_key || !has_key;
                }
            }
            DesiredColumns::Explicit(names) => {
                let mut any = false;
                for name in names {
                    if let Some(idx) = self.column_index(name) {
                        self.columns[idx].use_for_read = true;
                        any = true;
                    }
                }
                if !any {
                    return Err(MappingError::NoDesiredColumns {
                        table: self.object.clone(),
                        columns: names.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Build an AND-joined equality predicate from a filter record.
    ///
    /// Fields that match no column are ignored. Null fields are skipped
    /// unless `include_nulls` is set. A filter that yields no predicate is a
    /// [`MappingError::NoMatchingColumns`].
    pub fn apply_filter_value(&mut self, filter: &Record, options: FilterOptions) -> TabulaResult<Sql> {
        let mut predicates = Vec::new();
        for field in filter.fields() {
            let Some(idx) = self.find_column(field) else {
                continue;
            };
            let column = Arc::clone(&self.columns[idx].column);

            if field.value.is_null() {
                if options.include_nulls {
                    predicates.push(Sql::new(format!("{} IS NULL", column.quoted_name)));
                }
                continue;
            }

            let value = coerce(&field.value, column.kind, &column.name)?;
            let textual = matches!(value, Value::String(_));
            let param = self.bind(column_parameter(&column, value, None));
            let predicate = if options.ignore_case && textual {
                let mut p = Sql::new(format!("LOWER({}) = LOWER(", column.quoted_name));
                p.push_sql(param).push(")");
                p
            } else {
                let mut p = Sql::new(format!("{} = ", column.quoted_name));
                p.push_sql(param);
                p
            };
            predicates.push(predicate);
        }

        if predicates.is_empty() {
            return Err(MappingError::NoMatchingColumns {
                table: self.object.clone(),
            }
            .into());
        }
        Ok(Sql::join(predicates, " AND "))
    }

    /// Quoted names of the columns written by an insert, in table order.
    pub fn build_insert_columns(&self) -> Vec<String> {
        self.insert_entries()
            .map(|e| e.column.quoted_name.clone())
            .collect()
    }

    fn insert_entries(&self) -> impl Iterator<Item = &ColumnEntry> {
        self.columns
            .iter()
            .filter(|e| e.use_for_insert && e.value.is_some())
    }

    /// Comma-separated values matching [`build_insert_columns`](Self::build_insert_columns).
    ///
    /// `row` suffixes parameter names so several rows can share a statement.
    pub fn build_values_clause(&mut self, row: Option<usize>) -> Sql {
        let params: Vec<Parameter> = self
            .insert_entries()
            .map(|e| column_parameter(&e.column, e.value.clone().unwrap_or(Value::Null), row))
            .collect();
        Sql::join(params.into_iter().map(|p| self.bind(p)), ", ")
    }

    /// `col = value` assignments for the non-key columns the argument supplied.
    pub fn build_set_clause(&mut self) -> TabulaResult<Sql> {
        let params: Vec<(String, Parameter)> = self
            .columns
            .iter()
            .filter(|e| e.use_for_update && !e.is_key)
            .filter_map(|e| {
                e.value.clone().map(|v| {
                    (e.column.quoted_name.clone(), column_parameter(&e.column, v, None))
                })
            })
            .collect();

        if params.is_empty() {
            return Err(ValidationError::EmptyRow {
                operation: OperationKind::Update.to_string(),
                table: self.object.clone(),
            }
            .into());
        }

        let assignments: Vec<Sql> = params
            .into_iter()
            .map(|(name, p)| {
                let mut s = Sql::new(format!("{name} = "));
                s.push_sql(self.bind(p));
                s
            })
            .collect();
        Ok(Sql::join(assignments, ", "))
    }

    /// Quoted names of the non-key columns an upsert overwrites.
    pub fn build_update_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|e| e.use_for_update && !e.is_key && e.value.is_some())
            .map(|e| e.column.quoted_name.clone())
            .collect()
    }

    /// A single assignment `col = value`, e.g. for soft-delete markers.
    ///
    /// The value is bound as `{variable_name}_{suffix}` so it never collides
    /// with a filter over the same column.
    pub fn build_assignment(
        &mut self,
        column: &str,
        value: &Value,
        suffix: &str,
    ) -> TabulaResult<(Arc<ColumnMetadata>, Sql)> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| MappingError::ColumnNotMapped {
                table: self.object.clone(),
                column: column.to_string(),
            })?;
        let column = Arc::clone(&self.columns[idx].column);
        let value = coerce(value, column.kind, &column.name)?;
        let mut parameter = column_parameter(&column, value, None);
        parameter.name = format!("{}_{suffix}", column.variable_name);
        let param = self.bind(parameter);
        Ok((column, param))
    }

    /// `key = value AND ...` over the current key columns.
    pub fn build_key_where(&mut self) -> TabulaResult<Sql> {
        let mut predicates = Vec::new();
        let keys: Vec<ColumnEntry> = self.columns.iter().filter(|e| e.is_key).cloned().collect();
        for entry in keys {
            let value = entry
                .value
                .filter(|v| !v.is_null())
                .ok_or_else(|| MappingError::MissingKeyValue {
                    table: self.object.clone(),
                    column: entry.column.name.clone(),
                })?;
            let mut p = Sql::new(format!("{} = ", entry.column.quoted_name));
            p.push_sql(self.bind(column_parameter(&entry.column, value, None)));
            predicates.push(p);
        }
        Ok(Sql::join(predicates, " AND "))
    }

    /// `col = value` for one key, or `col IN (...)` for several.
    pub fn build_key_filter(&mut self, column: &ColumnMetadata, keys: &[Value]) -> TabulaResult<Sql> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(coerce(key, column.kind, &column.name)?);
        }

        if let [value] = &values[..] {
            let mut p = Sql::new(format!("{} = ", column.quoted_name));
            p.push_sql(self.bind(column_parameter(column, value.clone(), None)));
            return Ok(p);
        }

        let params: Vec<Sql> = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| self.bind(column_parameter(column, v, Some(i))))
            .collect();
        let mut p = Sql::new(format!("{} IN (", column.quoted_name));
        p.push_sql(Sql::join(params, ", ")).push(")");
        Ok(p)
    }

    /// Quoted names of the desired columns, for SELECT lists and
    /// RETURNING/OUTPUT projections.
    pub fn build_select_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|e| e.use_for_read)
            .map(|e| e.column.quoted_name.clone())
            .collect()
    }

    /// Rendered sort terms. Unknown columns are a [`MappingError::ColumnNotMapped`].
    pub fn build_order_by(&self, sort: &[SortExpression]) -> TabulaResult<Vec<String>> {
        sort.iter()
            .map(|s| {
                let idx = self
                    .column_index(&s.column)
                    .ok_or_else(|| MappingError::ColumnNotMapped {
                        table: self.object.clone(),
                        column: s.column.clone(),
                    })?;
                let dir = if s.descending { "DESC" } else { "ASC" };
                Ok(format!("{} {dir}", self.columns[idx].column.quoted_name))
            })
            .collect()
    }

    /// Arguments for a routine call, in declaration order.
    ///
    /// Output-only parameters are bound as NULL placeholders. Input
    /// parameters without a value are left to the dialect, or rejected when
    /// `strict` is set.
    pub fn build_call_arguments(&mut self, strict: bool) -> TabulaResult<Vec<CallArgument>> {
        let entries = self.parameters.clone();
        let mut args = Vec::with_capacity(entries.len());
        for entry in entries {
            let p = &entry.parameter;
            let value = match entry.value {
                Some(v) => Some(v),
                None if p.direction == ParameterDirection::Out => Some(Value::Null),
                None if strict => {
                    return Err(MappingError::ColumnNotMapped {
                        table: self.object.clone(),
                        column: p.sql_name.clone(),
                    }
                    .into());
                }
                None => None,
            };
            let value = value.map(|v| {
                let mut param = Parameter::new(p.variable_name.clone(), v)
                    .with_native_type(p.native_type.clone())
                    .with_direction(p.direction);
                param.kind = p.kind;
                self.bind(param)
            });
            args.push(CallArgument {
                name: p.sql_name.clone(),
                variable_name: p.variable_name.clone(),
                value,
                direction: p.direction,
            });
        }
        Ok(args)
    }

    /// Parameters bound by `build_*` and `apply_filter_value` calls so far,
    /// in the order they were built.
    pub fn get_parameters(&self) -> &[Parameter] {
        &self.bound
    }

    fn bind(&mut self, parameter: Parameter) -> Sql {
        self.bound.push(parameter.clone());
        Sql::param(parameter)
    }
}

fn column_parameter(column: &ColumnMetadata, value: Value, row: Option<usize>) -> Parameter {
    let name = match row {
        Some(i) => format!("{}_{i}", column.variable_name),
        None => column.variable_name.clone(),
    };
    let mut p = Parameter::new(name, value).with_native_type(column.native_type.clone());
    p.kind = column.kind;
    p
}

fn coerce(value: &Value, kind: Option<ValueKind>, target: &str) -> TabulaResult<Value> {
    let Some(kind) = kind else {
        return Ok(value.clone());
    };
    value.coerce_to(kind).map_err(|message| {
        MappingError::TypeCoercion {
            column: target.to_string(),
            expected: kind.to_string(),
            found: value.type_name().to_string(),
            message,
        }
        .into()
    })
}
