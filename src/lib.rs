pub mod container;
mod error;
pub mod params;
pub mod registry;
pub mod source;

pub use container::{Container, ContainerBuilder};
pub use error::Error;
pub use params::{ParamError, ParameterStore, Value};
pub use registry::{BoxError, Connection, RegistryError, ResourceRegistry};
pub use source::Resolver;
