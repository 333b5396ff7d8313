// Integration tests for the service registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use furi::{BoundValue, MatchRule, Method, RegistryError, RegistrySettings, ServiceRegistry};

mod common;

#[test]
fn test_exact_match_precedence() {
    let registry = ServiceRegistry::new();
    registry.register("pattern", "/document/{+doc}", None).unwrap();
    registry.register("exact", "/document/readme", None).unwrap();

    assert_eq!(*registry.get("/document/readme", Method::Get).unwrap().service, "exact");
    assert_eq!(*registry.get("/document/other", Method::Get).unwrap().service, "pattern");
}

#[test]
fn test_best_match_over_registration_order() {
    let registry = ServiceRegistry::new();
    registry.register("documents", "/document/{+doc}", None).unwrap();
    registry.register("history", "/document/history/{+doc}", None).unwrap();

    let found = registry.get("/document/history/a.xml", Method::Get).unwrap();
    assert_eq!(*found.service, "history");
    assert_eq!(found.pattern.as_str(), "/document/history/{+doc}");
    assert_eq!(found.result.get("doc"), Some(&BoundValue::from("a.xml")));
}

#[test]
fn test_first_match_rule() {
    let registry = ServiceRegistry::with_settings(RegistrySettings {
        match_rule: MatchRule::FirstMatch,
        ..RegistrySettings::default()
    });
    registry.register("documents", "/document/{+doc}", None).unwrap();
    registry.register("history", "/document/history/{+doc}", None).unwrap();

    let found = registry.get("/document/history/a.xml", Method::Get).unwrap();
    assert_eq!(*found.service, "documents");
}

#[test]
fn test_methods_are_separate_tables() {
    let registry = ServiceRegistry::new();
    registry.register("read", "/items/{id}", Some(Method::Get)).unwrap();
    registry.register("write", "/items/{id}", Some(Method::Put)).unwrap();

    assert_eq!(*registry.get("/items/3", Method::Get).unwrap().service, "read");
    assert_eq!(*registry.get("/items/3", Method::Put).unwrap().service, "write");
    assert!(registry.get("/items/3", Method::Delete).is_none());
    assert_eq!(registry.patterns(Method::Get), vec!["/items/{id}"]);
}

#[test]
fn test_configured_methods() {
    let registry = ServiceRegistry::with_settings(RegistrySettings {
        methods: vec![Method::Get, Method::Patch],
        ..RegistrySettings::default()
    });
    registry.register("patch", "/a", Some(Method::Patch)).unwrap();
    assert!(registry.get("/a", Method::Patch).is_some());
    assert!(matches!(
        registry.register("post", "/a", Some(Method::Post)),
        Err(RegistryError::UnsupportedMethod(Method::Post))
    ));
}

#[test]
fn test_syntax_error_names_pattern() {
    let registry: ServiceRegistry<&str> = ServiceRegistry::new();
    let err = registry.register("bad", "/a/{b", None).unwrap_err();
    assert!(err.to_string().contains("/a/{b"));
    assert!(registry.is_empty());
}

#[test]
fn test_clear_and_reload_are_atomic_for_readers() {
    let registry = Arc::new(ServiceRegistry::new());
    let routes = |tag: &str| {
        vec![
            (format!("{tag}-stable"), "/stable/{id}".to_string(), None),
            (format!("{tag}-a"), "/a/{id}".to_string(), None),
            (format!("{tag}-b"), "/b/{id}".to_string(), None),
        ]
    };
    registry.reload(routes("one")).unwrap();
    let full = registry.len();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let tag_of = |service: &str| service.split('-').next().map(str::to_string);
                while !done.load(Ordering::Relaxed) {
                    let view = registry.view();
                    let len = view.len();
                    assert!(len == 0 || len == full, "saw a partial snapshot of {len} routes");

                    let found: Vec<_> = ["/stable/7", "/a/7", "/b/7"]
                        .iter()
                        .filter_map(|path| view.get(path, Method::Get))
                        .collect();
                    assert!(found.is_empty() || found.len() == 3, "saw {} of 3 routes", found.len());
                    for service in &found {
                        assert!(service.result.is_resolved());
                    }
                    if let [stable, a, b] = found.as_slice() {
                        assert!(stable.service.ends_with("-stable"));
                        assert!(a.service.ends_with("-a"));
                        assert!(b.service.ends_with("-b"));
                        let tag = tag_of(stable.service.as_str());
                        assert_eq!(tag_of(a.service.as_str()), tag, "mixed reloads in one snapshot");
                        assert_eq!(tag_of(b.service.as_str()), tag, "mixed reloads in one snapshot");
                    }
                }
            })
        })
        .collect();

    for round in 0..200 {
        if round % 10 == 0 {
            registry.clear();
        }
        let tag = if round % 2 == 0 { "two" } else { "one" };
        registry.reload(routes(tag)).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.len(), full);
}

#[test]
fn test_load_from_config() {
    let config = common::routes_config();
    let generators = common::id_generators(&["groups", "documents", "history", "about"]);
    let registry = ServiceRegistry::from_config(&config, &generators).unwrap();

    let found = registry.get("/group/1892/home", Method::Get).unwrap();
    assert_eq!(found.service.as_str(), "groups");
    assert_eq!(found.result.get("groupid"), Some(&BoundValue::Integer(1892)));

    assert_eq!(registry.get("/about", Method::Get).unwrap().service.as_str(), "about");
    assert!(registry.get("/about", Method::Post).is_none());
}

#[test]
fn test_load_unknown_generator_keeps_current() {
    let config = common::routes_config();
    let generators = common::id_generators(&["groups", "documents", "history", "about"]);
    let registry = ServiceRegistry::from_config(&config, &generators).unwrap();
    let before = registry.len();

    let partial = common::id_generators(&["groups"]);
    let err = registry.load(&config, &partial).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownGenerator(id) if id == "documents"));
    assert_eq!(registry.len(), before);
}
