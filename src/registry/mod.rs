// Registry module: services looked up by request path and method
//
// Readers load the current snapshot without locking. Writers are serialized,
// build the next snapshot off to the side and publish it with a single store.

mod generator;
mod method;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RouteSettings, RoutesConfig, Settings};
use crate::error::RegistryError;
use crate::pattern::UriPattern;
use crate::resolver::{find_best_match, Bindings, MatchRule, ResolveResult, UriResolver, VariableBinder};

pub use generator::GeneratorRegistry;
pub use method::Method;

/// What to do when a pattern string is registered twice for one method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the new service in the old position and log a warning.
    #[default]
    Replace,
    /// Fail the registration.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    pub methods: Vec<Method>,
    pub match_rule: MatchRule,
    pub duplicates: DuplicatePolicy,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            methods: Method::DEFAULTS.to_vec(),
            match_rule: MatchRule::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl From<&Settings> for RegistrySettings {
    fn from(settings: &Settings) -> Self {
        Self {
            methods: settings
                .methods
                .clone()
                .unwrap_or_else(|| Method::DEFAULTS.to_vec()),
            match_rule: settings.match_rule,
            duplicates: settings.duplicates,
        }
    }
}

/// A registered pattern together with its service.
struct Entry<S> {
    pattern: Arc<UriPattern>,
    service: Arc<S>,
}

impl<S> Clone for Entry<S> {
    fn clone(&self) -> Self {
        Self {
            pattern: Arc::clone(&self.pattern),
            service: Arc::clone(&self.service),
        }
    }
}

impl<S> AsRef<UriPattern> for Entry<S> {
    fn as_ref(&self) -> &UriPattern {
        &self.pattern
    }
}

struct MethodTable<S> {
    exact: HashMap<String, Entry<S>>,
    patterns: Vec<Entry<S>>,
}

impl<S> MethodTable<S> {
    fn new() -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
        }
    }
}

impl<S> Clone for MethodTable<S> {
    fn clone(&self) -> Self {
        Self {
            exact: self.exact.clone(),
            patterns: self.patterns.clone(),
        }
    }
}

struct Snapshot<S> {
    tables: HashMap<Method, MethodTable<S>>,
}

impl<S> Snapshot<S> {
    fn empty(methods: &[Method]) -> Self {
        Self {
            tables: methods.iter().map(|m| (*m, MethodTable::new())).collect(),
        }
    }

    fn insert(&mut self, method: Method, entry: Entry<S>, policy: DuplicatePolicy) -> Result<(), RegistryError> {
        let table = self
            .tables
            .get_mut(&method)
            .ok_or(RegistryError::UnsupportedMethod(method))?;
        let key = entry.pattern.as_str().to_string();

        if table.exact.contains_key(&key) {
            if policy == DuplicatePolicy::Reject {
                return Err(RegistryError::DuplicatePattern { pattern: key, method });
            }
            warn!(pattern = %key, %method, "pattern registered twice, replacing service");
            if let Some(slot) = table.patterns.iter_mut().find(|e| e.pattern.as_str() == key) {
                *slot = entry.clone();
            }
        } else {
            table.patterns.push(entry.clone());
        }
        table.exact.insert(key, entry);
        Ok(())
    }

    fn route_count(&self) -> usize {
        self.tables.values().map(|t| t.patterns.len()).sum()
    }

    fn pattern_strings(&self, method: Method) -> Vec<String> {
        self.tables
            .get(&method)
            .map(|t| t.patterns.iter().map(|e| e.pattern.as_str().to_string()).collect())
            .unwrap_or_default()
    }

    fn lookup(
        &self,
        path: &str,
        method: Method,
        rule: MatchRule,
        binder: &VariableBinder,
    ) -> Option<MatchingService<S>> {
        let table = self.tables.get(&method)?;

        if let Some(entry) = table.exact.get(path) {
            return Some(MatchingService {
                service: Arc::clone(&entry.service),
                pattern: Arc::clone(&entry.pattern),
                result: ResolveResult::resolved(Bindings::new()),
            });
        }

        let index = find_best_match(&table.patterns, path, rule)?;
        let entry = &table.patterns[index];
        let result = UriResolver::new(path).resolve_with(&entry.pattern, binder);
        Some(MatchingService {
            service: Arc::clone(&entry.service),
            pattern: Arc::clone(&entry.pattern),
            result,
        })
    }
}

impl<S> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
        }
    }
}

/// The service chosen for a request and the variables bound from its path.
#[derive(Debug)]
pub struct MatchingService<S> {
    pub service: Arc<S>,
    pub pattern: Arc<UriPattern>,
    pub result: ResolveResult,
}

impl<S> MatchingService<S> {
    pub fn bindings(&self) -> &Bindings {
        &self.result.bindings
    }
}

/// Dispatch table from (method, path) to services.
pub struct ServiceRegistry<S> {
    snapshot: ArcSwap<Snapshot<S>>,
    writer: Mutex<()>,
    settings: RegistrySettings,
    binder: Arc<VariableBinder>,
}

impl<S> ServiceRegistry<S> {
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::empty(&settings.methods)),
            writer: Mutex::new(()),
            settings,
            binder: Arc::new(VariableBinder::new()),
        }
    }

    /// Use `binder` to convert typed variables.
    pub fn with_binder(mut self, binder: Arc<VariableBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Registry configured and populated from a route file.
    pub fn from_config(config: &RoutesConfig, generators: &GeneratorRegistry<S>) -> Result<Self, RegistryError> {
        let registry = Self::with_settings(RegistrySettings::from(&config.settings));
        registry.load(config, generators)?;
        Ok(registry)
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Register `service` for `method`, or for every supported method when
    /// `method` is `None`. Nothing is registered if any step fails.
    pub fn register(&self, service: S, pattern: &str, method: Option<Method>) -> Result<(), RegistryError> {
        let entry = Entry {
            pattern: Arc::new(parse_pattern(pattern)?),
            service: Arc::new(service),
        };
        let methods = self.target_methods(method.map(|m| vec![m]))?;

        let _guard = self.lock_writer();
        let mut next = Snapshot::clone(&self.snapshot.load());
        for method in methods {
            next.insert(method, entry.clone(), self.settings.duplicates)?;
        }
        self.snapshot.store(Arc::new(next));
        debug!(pattern, "registered pattern");
        Ok(())
    }

    /// Service for `path`: an exact pattern string first, then the pattern
    /// chosen by the configured match rule.
    pub fn get(&self, path: &str, method: Method) -> Option<MatchingService<S>> {
        self.snapshot
            .load()
            .lookup(path, method, self.settings.match_rule, &self.binder)
    }

    /// Pin the current registrations. Every read through the view sees the
    /// same snapshot, whatever writers publish in the meantime.
    pub fn view(&self) -> RegistryView<'_, S> {
        RegistryView {
            registry: self,
            snapshot: self.snapshot.load_full(),
        }
    }

    /// Remove every registration in one step.
    pub fn clear(&self) {
        let _guard = self.lock_writer();
        self.snapshot
            .store(Arc::new(Snapshot::empty(&self.settings.methods)));
        info!("registry cleared");
    }

    /// Replace every registration with `routes`, published in one step.
    /// On error the current registrations stay untouched.
    pub fn reload<I, P>(&self, routes: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (S, P, Option<Method>)>,
        P: AsRef<str>,
    {
        let mut next = Snapshot::empty(&self.settings.methods);
        for (service, pattern, method) in routes {
            let methods = self.target_methods(method.map(|m| vec![m]))?;
            self.stage(&mut next, Arc::new(service), pattern.as_ref(), methods)?;
        }
        self.publish(next);
        Ok(())
    }

    /// Replace every registration with the routes of `config`, creating each
    /// service through `generators`.
    pub fn load(&self, config: &RoutesConfig, generators: &GeneratorRegistry<S>) -> Result<(), RegistryError> {
        let mut next = Snapshot::empty(&self.settings.methods);
        for route in &config.routes {
            let RouteSettings { pattern, service, methods } = route;
            let methods = self.target_methods(methods.clone())?;
            let service = Arc::new(generators.create(service)?);
            self.stage(&mut next, service, pattern, methods)?;
        }
        self.publish(next);
        Ok(())
    }

    /// Registered pattern strings for `method`, in registration order.
    pub fn patterns(&self, method: Method) -> Vec<String> {
        self.snapshot.load().pattern_strings(method)
    }

    /// Number of (method, pattern) registrations.
    pub fn len(&self) -> usize {
        self.snapshot.load().route_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stage(
        &self,
        next: &mut Snapshot<S>,
        service: Arc<S>,
        pattern: &str,
        methods: Vec<Method>,
    ) -> Result<(), RegistryError> {
        let entry = Entry {
            pattern: Arc::new(parse_pattern(pattern)?),
            service,
        };
        for method in methods {
            next.insert(method, entry.clone(), self.settings.duplicates)?;
        }
        Ok(())
    }

    fn publish(&self, next: Snapshot<S>) {
        let routes = next.route_count();
        let _guard = self.lock_writer();
        self.snapshot.store(Arc::new(next));
        info!(routes, "registry reloaded");
    }

    fn target_methods(&self, methods: Option<Vec<Method>>) -> Result<Vec<Method>, RegistryError> {
        let Some(methods) = methods else {
            return Ok(self.settings.methods.clone());
        };
        match methods.iter().find(|m| !self.settings.methods.contains(*m)) {
            Some(unsupported) => Err(RegistryError::UnsupportedMethod(*unsupported)),
            None => Ok(methods),
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reads pinned to one snapshot of a [`ServiceRegistry`].
pub struct RegistryView<'r, S> {
    registry: &'r ServiceRegistry<S>,
    snapshot: Arc<Snapshot<S>>,
}

impl<S> RegistryView<'_, S> {
    pub fn get(&self, path: &str, method: Method) -> Option<MatchingService<S>> {
        let settings = &self.registry.settings;
        self.snapshot
            .lookup(path, method, settings.match_rule, &self.registry.binder)
    }

    pub fn patterns(&self, method: Method) -> Vec<String> {
        self.snapshot.pattern_strings(method)
    }

    pub fn len(&self) -> usize {
        self.snapshot.route_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for ServiceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_pattern(pattern: &str) -> Result<UriPattern, RegistryError> {
    UriPattern::parse(pattern).map_err(|source| RegistryError::Syntax {
        pattern: pattern.to_string(),
        source,
    })
}
