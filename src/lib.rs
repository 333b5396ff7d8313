// furi: URI templates, patterns and the service registry built on them

pub mod config;
pub mod error;
pub mod pattern;
pub mod registry;
pub mod resolver;
pub mod template;

pub use error::{RegistryError, TemplateError};
pub use pattern::{Score, UriPattern};
pub use registry::{
    DuplicatePolicy, GeneratorRegistry, MatchingService, Method, RegistrySettings, RegistryView,
    ServiceRegistry,
};
pub use resolver::{
    find_best_match, Bindings, BoundValue, MatchRule, ResolveResult, ResolveStatus, UriResolver,
    VariableBinder, VariableResolver,
};
pub use template::{Parameters, Token, UriTemplate, Value};
