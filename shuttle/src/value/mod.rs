//! Value Resolver: turns templated input mappings into concrete argument bundles.

mod data_source;
mod resolver;
mod template;

pub use data_source::DataSource;
pub use resolver::{resolve_input_mapping, resolve_value, ResolverError};
pub use template::Selector;
