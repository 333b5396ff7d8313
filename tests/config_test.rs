// Integration tests for route file loading

use std::io::Write;

use furi::config::{load_routes, RoutesConfig};
use furi::{DuplicatePolicy, MatchRule, Method, RegistrySettings};

mod common;

#[test]
fn test_routes_yml_fixture() {
    let config = common::routes_config();
    assert_eq!(config.routes.len(), 4);
    assert_eq!(config.routes[3].methods, Some(vec![Method::Get]));

    let settings = RegistrySettings::from(&config.settings);
    assert_eq!(settings.match_rule, MatchRule::BestMatch);
    assert_eq!(settings.duplicates, DuplicatePolicy::Replace);
    assert_eq!(settings.methods, Method::DEFAULTS.to_vec());
}

#[test]
fn test_load_routes_from_file() {
    let path = std::env::temp_dir().join(format!("furi-routes-{}.yml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(common::ROUTES_YML.as_bytes()).unwrap();
    drop(file);

    let config = load_routes(Some(path.as_path())).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config, common::routes_config());
}

#[test]
fn test_config_round_trip() {
    let config = common::routes_config();
    let yml = serde_yaml::to_string(&config).unwrap();
    let reparsed: RoutesConfig = serde_yaml::from_str(&yml).unwrap();
    assert_eq!(config, reparsed);
}
