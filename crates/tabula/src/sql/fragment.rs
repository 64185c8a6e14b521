use super::parameter::Parameter;
use crate::error::{MappingError, TabulaResult};
use crate::mapping::Record;
use std::collections::HashMap;

/// How a dialect writes parameter placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...`; a repeated name reuses its number.
    Numbered,
    /// `@name`; a repeated name is bound once.
    Named(char),
    /// `?`; every occurrence is bound separately.
    Positional,
}

#[derive(Debug, Clone, PartialEq)]
enum SqlPart {
    Raw(String),
    Param(usize),
}

/// A SQL fragment with interleaved parameters.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Parameter>,
}

impl Sql {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let initial_sql = initial_sql.into();
        let parts = if initial_sql.is_empty() {
            Vec::new()
        } else {
            vec![SqlPart::Raw(initial_sql)]
        };
        Self {
            parts,
            params: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A fragment holding a single parameter placeholder.
    pub fn param(parameter: Parameter) -> Self {
        let mut sql = Self::empty();
        sql.push_param(parameter);
        sql
    }

    /// Append raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder bound to `parameter`.
    pub fn push_param(&mut self, parameter: Parameter) -> &mut Self {
        self.parts.push(SqlPart::Param(self.params.len()));
        self.params.push(parameter);
        self
    }

    /// Append another fragment, consuming it.
    pub fn push_sql(&mut self, other: Sql) -> &mut Self {
        let offset = self.params.len();
        for part in other.parts {
            match part {
                SqlPart::Raw(s) => {
                    self.push(&s);
                }
                SqlPart::Param(i) => self.parts.push(SqlPart::Param(i + offset)),
            }
        }
        self.params.extend(other.params);
        self
    }

    /// Append caller-written SQL, turning each `@name` token into a parameter
    /// taken from `args`.
    ///
    /// `@@name` and text inside single-quoted literals are copied unchanged.
    /// A token with no matching field is a [`MappingError::MissingParameter`].
    pub fn push_template(&mut self, text: &str, args: Option<&Record>) -> TabulaResult<&mut Self> {
        let mut raw = String::new();
        let mut chars = text.chars().peekable();
        let mut in_literal = false;

        while let Some(c) = chars.next() {
            if c == '\'' {
                in_literal = !in_literal;
                raw.push(c);
                continue;
            }
            if c != '@' || in_literal {
                raw.push(c);
                continue;
            }
            if chars.peek() == Some(&'@') {
                chars.next();
                raw.push_str("@@");
                while let Some(&n) = chars.peek() {
                    if !(n.is_alphanumeric() || n == '_') {
                        break;
                    }
                    raw.push(n);
                    chars.next();
                }
                continue;
            }

            let mut name = String::new();
            while let Some(&n) = chars.peek() {
                if !(n.is_alphanumeric() || n == '_') {
                    break;
                }
                name.push(n);
                chars.next();
            }
            if name.is_empty() {
                raw.push('@');
                continue;
            }

            let field = args
                .and_then(|a| a.get(&name))
                .ok_or_else(|| MappingError::MissingParameter { name: name.clone() })?;
            self.push(&raw);
            raw.clear();
            self.push_param(Parameter::new(name, field.value.clone()));
        }

        self.push(&raw);
        Ok(self)
    }

    /// Join fragments with a separator.
    pub fn join(fragments: impl IntoIterator<Item = Sql>, separator: &str) -> Sql {
        let mut out = Sql::empty();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.push_sql(fragment);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Parameters in placeholder order, one entry per placeholder.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parts.iter().filter_map(|p| match p {
            SqlPart::Param(i) => self.params.get(*i),
            SqlPart::Raw(_) => None,
        })
    }

    pub fn placeholder_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, SqlPart::Param(_)))
            .count()
    }

    /// Render the text and the parameter list for a placeholder style.
    ///
    /// Parameters sharing a name (ignoring case) must carry equal values;
    /// otherwise [`MappingError::DuplicateParameter`] is returned.
    pub fn render(&self, style: PlaceholderStyle) -> TabulaResult<(String, Vec<Parameter>)> {
        let mut out = String::new();
        let mut bound: Vec<Parameter> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for part in &self.parts {
            let param = match part {
                SqlPart::Raw(s) => {
                    out.push_str(s);
                    continue;
                }
                SqlPart::Param(i) => &self.params[*i],
            };

            let key = param.name.to_lowercase();
            let existing = by_name.get(&key).copied();
            if let Some(idx) = existing {
                if bound[idx].value != param.value {
                    return Err(MappingError::DuplicateParameter {
                        name: param.name.clone(),
                    }
                    .into());
                }
            }

            match style {
                PlaceholderStyle::Numbered => {
                    let idx = existing.unwrap_or_else(|| {
                        bound.push(param.clone());
                        by_name.insert(key, bound.len() - 1);
                        bound.len() - 1
                    });
                    out.push('$');
                    out.push_str(&(idx + 1).to_string());
                }
                PlaceholderStyle::Named(prefix) => {
                    if existing.is_none() {
                        bound.push(param.clone());
                        by_name.insert(key, bound.len() - 1);
                    }
                    out.push(prefix);
                    out.push_str(&param.name);
                }
                PlaceholderStyle::Positional => {
                    bound.push(param.clone());
                    by_name.entry(key).or_insert(bound.len() - 1);
                    out.push('?');
                }
            }
        }

        Ok((out, bound))
    }
}
