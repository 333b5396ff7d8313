// Route file configuration

mod routes;
mod yml_settings;

pub use routes::{from_yaml_str, load_routes, DEFAULT_ROUTES_FILE};
pub use yml_settings::{RouteSettings, RoutesConfig, Settings};
