use crate::metadata::ParameterDirection;
use crate::value::{Value, ValueKind};

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Bind name without dialect prefix (`Name`, not `@Name`).
    pub name: String,
    pub value: Value,
    /// Native type of the target column or routine parameter, when known.
    pub native_type: Option<String>,
    pub kind: Option<ValueKind>,
    pub direction: ParameterDirection,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into().trim_start_matches(['@', ':', '$']).to_string(),
            value: value.into(),
            native_type: None,
            kind: None,
            direction: ParameterDirection::In,
        }
    }

    pub fn with_native_type(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}
