use super::{CommandBuilder, MutationCommand, PreparedStatement};
use crate::builder::{ApplyOptions, DesiredColumns, OperationKind};
use crate::data_source::DataSource;
use crate::dialect::statement::{CallArgument, RoutineCall};
use crate::error::TabulaResult;
use crate::mapping::Argument;
use crate::metadata::{RoutineKind, RoutineMetadata};
use crate::sql::{Parameter, Sql};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum RoutineArguments {
    None,
    Matched(Argument),
    Raw(Vec<Parameter>),
}

/// A stored procedure call or scalar function select.
///
/// Table functions are queried through
/// [`DataSource::table_function`](crate::DataSource::table_function), which
/// wraps this command as the `FROM` source.
#[derive(Debug, Clone)]
pub struct RoutineCommand<'a> {
    source: &'a DataSource,
    routine: Arc<RoutineMetadata>,
    arguments: RoutineArguments,
    strict: bool,
}

impl<'a> RoutineCommand<'a> {
    pub(crate) fn new(source: &'a DataSource, routine: Arc<RoutineMetadata>) -> Self {
        Self {
            source,
            routine,
            arguments: RoutineArguments::None,
            strict: source.config().strict_mode,
        }
    }

    pub fn routine(&self) -> &Arc<RoutineMetadata> {
        &self.routine
    }

    /// Match a record's fields (or a single value) against the declared
    /// parameters.
    pub fn with_argument(mut self, argument: impl Into<Argument>) -> Self {
        self.arguments = RoutineArguments::Matched(argument.into());
        self
    }

    /// Pass parameters as given, in order, without matching.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.arguments = RoutineArguments::Raw(parameters);
        self
    }

    /// Every declared input parameter must be supplied.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn arguments(&self) -> TabulaResult<(Vec<CallArgument>, bool)> {
        match &self.arguments {
            RoutineArguments::Raw(params) => {
                let args = params
                    .iter()
                    .map(|p| CallArgument {
                        name: p.name.clone(),
                        variable_name: p.name.clone(),
                        value: Some(Sql::param(p.clone())),
                        direction: p.direction,
                    })
                    .collect();
                Ok((args, true))
            }
            RoutineArguments::None => {
                let mut builder = self.routine.sql_builder();
                Ok((builder.build_call_arguments(self.strict)?, false))
            }
            RoutineArguments::Matched(argument) => {
                let mut builder = self.routine.sql_builder();
                builder.apply_argument_value(argument, OperationKind::Call, &ApplyOptions::default())?;
                Ok((builder.build_call_arguments(self.strict)?, false))
            }
        }
    }

    /// The invocation text: `CALL`/`EXEC`/`SELECT f(...)`, or the bare
    /// function call for table functions.
    pub(crate) fn render_call(&self) -> TabulaResult<Sql> {
        let dialect = self.source.dialect();
        let kind = self.routine.kind();
        if !dialect.supports_routine(kind) {
            return Err(dialect.unsupported(&format!("{kind}s")).into());
        }
        let (arguments, raw) = self.arguments()?;
        dialect.render_call(RoutineCall {
            name: dialect.quote_object_name(self.routine.name()),
            kind,
            arguments,
            raw,
        })
    }
}

impl CommandBuilder for RoutineCommand<'_> {
    fn prepare(&self, _desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let sql = match self.routine.kind() {
            RoutineKind::TableFunction => {
                let mut sql = Sql::new("SELECT * FROM ");
                sql.push_sql(self.render_call()?);
                sql
            }
            _ => self.render_call()?,
        };
        PreparedStatement::render(
            &sql,
            self.source.dialect(),
            self.source.config(),
            OperationKind::Call,
            &self.routine.name().to_string(),
            None,
        )
    }
}

impl MutationCommand for RoutineCommand<'_> {
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>> {
        Ok(vec![self.prepare(&DesiredColumns::NoColumns)?])
    }
}
