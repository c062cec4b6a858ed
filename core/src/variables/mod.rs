//! Variable definitions, builtin variables, value substitution and block
//! scoping.

mod builtin;
mod definition;
mod replace;
mod scope;
pub mod search;

pub use builtin::{builtin_variables, curdir_variable, number_value};
pub use definition::{value_to_string, VariableDefinition, VariableType};
pub use replace::{replace_scalar, replace_string, replace_string_lossy, VariableError, VariableLookup};
pub use scope::{
    argument_definitions, embedded_argument_definitions, set_variable_keyword, set_variable_name,
    split_argument_definition, var_scope, BlockScope, VAR_SCOPES,
};
