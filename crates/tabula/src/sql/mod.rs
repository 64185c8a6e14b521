//! Parameterized SQL fragments.
//!
//! Command builders compose statements out of [`Sql`] fragments. A fragment
//! keeps text and [`Parameter`]s interleaved, so placeholders are generated
//! only when the statement is rendered for a dialect and always line up with
//! the parameter list:
//!
//! ```ignore
//! use tabula::sql::{PlaceholderStyle, Sql};
//!
//! let mut q = Sql::new("SELECT * FROM \"Customer\" WHERE \"Id\" = ");
//! q.push_param(Parameter::new("Id", 5));
//!
//! let (text, params) = q.render(PlaceholderStyle::Numbered)?;
//! assert_eq!(text, "SELECT * FROM \"Customer\" WHERE \"Id\" = $1");
//! ```

mod fragment;
mod parameter;


pub use fragment::{PlaceholderStyle, Sql};
pub use parameter::Parameter;
