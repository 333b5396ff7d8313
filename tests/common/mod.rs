// Common test utilities shared across test files

use furi::config::{from_yaml_str, RoutesConfig};
use furi::{GeneratorRegistry, UriPattern};

/// Parse a list of pattern strings, panicking on syntax errors.
#[allow(dead_code)]
pub fn patterns(sources: &[&str]) -> Vec<UriPattern> {
    sources
        .iter()
        .map(|s| UriPattern::parse(s).expect("Invalid test pattern"))
        .collect()
}

/// Generators returning their own id as the service.
#[allow(dead_code)]
pub fn id_generators(ids: &[&str]) -> GeneratorRegistry<String> {
    let mut generators = GeneratorRegistry::new();
    for id in ids {
        let service = id.to_string();
        generators.register(*id, move || service.clone());
    }
    generators
}

#[allow(dead_code)]
pub const ROUTES_YML: &str = "
settings:
  match_rule: best
  duplicates: replace
routes:
  - pattern: /group/{int:groupid}/home
    service: groups
  - pattern: /document/{+doc}
    service: documents
  - pattern: /document/history/{+doc}
    service: history
  - pattern: /about
    service: about
    methods: [GET]
";

#[allow(dead_code)]
pub fn routes_config() -> RoutesConfig {
    from_yaml_str(ROUTES_YML).expect("Invalid test route file")
}
