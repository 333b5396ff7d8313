use serde::{Deserialize, Serialize};

use crate::registry::{DuplicatePolicy, Method};
use crate::resolver::MatchRule;

/// A route file: registry settings plus the routes to register.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RoutesConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub routes: Vec<RouteSettings>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub match_rule: MatchRule,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<Method>>,
}

/// One route: a pattern and the id of the generator creating its service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteSettings {
    pub pattern: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<Method>>,
}
