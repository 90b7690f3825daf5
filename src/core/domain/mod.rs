//! Domain types.

mod environment;
mod naming;
mod parameter;
mod secret;
mod vars;

pub use environment::Environment;
pub use naming::{BucketPattern, BucketRole, Prefix};
pub use parameter::ParameterKey;
pub use secret::{Credentials, Password};
pub use vars::VariableSet;
