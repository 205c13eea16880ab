//! Typed parameter storage and coercion.

mod error;
mod store;
mod value;

pub use error::ParamError;
pub use store::ParameterStore;
pub use value::Value;
