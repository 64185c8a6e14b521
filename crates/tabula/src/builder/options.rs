/// The logical operation an argument is applied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
    Upsert,
    Select,
    /// Routine invocation: arguments bind to declared parameters.
    Call,
}

impl OperationKind {
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Upsert => "upsert",
            OperationKind::Select => "select",
            OperationKind::Call => "call",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for [`SqlBuilder::apply_argument_value`](super::SqlBuilder::apply_argument_value).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Every required column (non-nullable, not generated) must be supplied.
    pub all_columns_required: bool,
    /// Fields flagged as keys by the mapping replace the declared key.
    pub use_key_attribute: bool,
    /// Identity columns take explicit values.
    pub identity_insert: bool,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_columns_required(mut self) -> Self {
        self.all_columns_required = true;
        self
    }

    pub fn use_key_attribute(mut self) -> Self {
        self.use_key_attribute = true;
        self
    }

    pub fn identity_insert(mut self) -> Self {
        self.identity_insert = true;
        self
    }
}

/// How a filter record turns into predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Null fields become `col IS NULL` instead of being skipped.
    pub include_nulls: bool,
    /// String comparisons use `LOWER(col) = LOWER(value)`.
    pub ignore_case: bool,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_nulls(mut self) -> Self {
        self.include_nulls = true;
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }
}

/// Which columns the caller's materializer wants back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DesiredColumns {
    /// Nothing is read back; projections are omitted.
    NoColumns,
    AllColumns,
    /// The key columns, or every column when there is no key.
    #[default]
    Auto,
    /// Named columns; names that do not exist are ignored.
    Explicit(Vec<String>),
}

impl DesiredColumns {
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DesiredColumns::Explicit(names.into_iter().map(Into::into).collect())
    }
}
