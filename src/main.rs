use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use furi::config::load_routes;
use furi::{GeneratorRegistry, Method, Parameters, ServiceRegistry, UriPattern, UriResolver, UriTemplate, Value};

fn cli() -> Command {
    Command::new("furi")
        .about("Expand URI templates and match URIs against patterns")
        .subcommand_required(true)
        .subcommand(
            Command::new("expand")
                .about("Expand a template with name=value parameters")
                .arg(Arg::new("template").required(true))
                .arg(
                    Arg::new("params")
                        .num_args(0..)
                        .value_name("NAME=VALUE")
                        .help("Repeat a name to pass a list"),
                ),
        )
        .subcommand(
            Command::new("match")
                .about("Resolve a URI against a pattern and print the bindings as JSON")
                .arg(Arg::new("pattern").required(true))
                .arg(Arg::new("uri").required(true)),
        )
        .subcommand(
            Command::new("route")
                .about("Find the service a route file assigns to a URI")
                .arg(
                    Arg::new("routes")
                        .short('r')
                        .long("routes")
                        .value_name("ROUTES")
                        .help("Path to a YAML route file (default: routes.yml)"),
                )
                .arg(
                    Arg::new("method")
                        .short('m')
                        .long("method")
                        .value_name("METHOD")
                        .default_value("GET"),
                )
                .arg(Arg::new("uri").required(true)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log match decisions to stderr"),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "furi=debug" } else { "furi=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Path and query of an absolute URL, or the input itself.
fn request_target(uri: &str) -> String {
    match url::Url::parse(uri) {
        Ok(url) if url.has_host() => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        _ => uri.to_string(),
    }
}

fn parse_params<'a>(pairs: impl Iterator<Item = &'a String>) -> Result<Parameters> {
    let mut params = Parameters::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected NAME=VALUE, got '{pair}'"))?;
        let value = match params.remove(name) {
            None => Value::from(value),
            Some(Value::Single(first)) => Value::List(vec![first, value.to_string()]),
            Some(Value::List(mut items)) => {
                items.push(value.to_string());
                Value::List(items)
            }
        };
        params.set(name, value);
    }
    Ok(params)
}

fn expand(matches: &ArgMatches) -> Result<()> {
    let source = matches.get_one::<String>("template").map(String::as_str).unwrap_or_default();
    let template = UriTemplate::parse(source).with_context(|| format!("Invalid template '{source}'"))?;
    let params = parse_params(matches.get_many::<String>("params").into_iter().flatten())?;
    println!("{}", template.expand(&params));
    Ok(())
}

fn match_uri(matches: &ArgMatches) -> Result<()> {
    let source = matches.get_one::<String>("pattern").map(String::as_str).unwrap_or_default();
    let uri = matches.get_one::<String>("uri").map(String::as_str).unwrap_or_default();
    let pattern = UriPattern::parse(source).with_context(|| format!("Invalid pattern '{source}'"))?;

    let target = request_target(uri);
    let result = UriResolver::new(&target).resolve(&pattern);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn route(matches: &ArgMatches) -> Result<()> {
    let routes_path = matches.get_one::<String>("routes").map(Path::new);
    let method: Method = matches
        .get_one::<String>("method")
        .map(String::as_str)
        .unwrap_or("GET")
        .parse()?;
    let uri = matches.get_one::<String>("uri").map(String::as_str).unwrap_or_default();

    let config = load_routes(routes_path)?;
    let mut generators = GeneratorRegistry::new();
    for route in &config.routes {
        let id = route.service.clone();
        generators.register(route.service.clone(), move || id.clone());
    }
    let registry = ServiceRegistry::from_config(&config, &generators).context("Invalid route file")?;

    let target = request_target(uri);
    let Some(found) = registry.get(&target, method) else {
        bail!("no match for {method} {target}");
    };
    let output = json!({
        "service": found.service.as_str(),
        "pattern": found.pattern.as_str(),
        "status": found.result.status,
        "bindings": found.result.bindings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("expand", sub)) => expand(sub),
        Some(("match", sub)) => match_uri(sub),
        Some(("route", sub)) => route(sub),
        _ => bail!("missing subcommand"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_request_target() {
        assert_eq!(request_target("https://example.com/a/b?x=1"), "/a/b?x=1");
        assert_eq!(request_target("/a/b"), "/a/b");
    }

    #[test]
    fn test_parse_params_repeats_make_lists() {
        let pairs = vec!["a=1".to_string(), "b=x".to_string(), "a=2".to_string()];
        let params = parse_params(pairs.iter()).unwrap();
        assert_eq!(params.get("a"), Some(&Value::List(vec!["1".to_string(), "2".to_string()])));
        assert_eq!(params.get("b"), Some(&Value::Single("x".to_string())));
    }

    #[test]
    fn test_parse_params_requires_equals() {
        let pairs = vec!["a".to_string()];
        assert!(parse_params(pairs.iter()).is_err());
    }
}
