// Integration tests for template parsing and expansion

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use furi::template::{Operator, OperatorKind, Variable};
use furi::{Parameters, TemplateError, Token, UriResolver, UriTemplate, UriPattern, BoundValue};
use pretty_assertions::assert_eq;

fn expand(template: &str, params: &Parameters) -> String {
    UriTemplate::parse(template).unwrap().expand(params)
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_path_parameter_expansion() {
    let params = Parameters::new().with("x", "1024").with("y", "768");
    assert_eq!(expand("{;x,y}", &params), ";x=1024;y=768");
}

#[test]
fn test_query_list_expansion() {
    let params = Parameters::new().with("list", vec!["val1", "val2", "val3"]);
    assert_eq!(expand("{?list}", &params), "?list=val1,val2,val3");
}

#[test]
fn test_reserved_expansion() {
    let params = Parameters::new().with("path", "/foo/bar");
    assert_eq!(expand("{+path}/here", &params), "/foo/bar/here");
    assert_eq!(expand("{path}/here", &params), "%2Ffoo%2Fbar/here");
}

#[test]
fn test_default_values() {
    let params = Parameters::new();
    assert_eq!(expand("/list{?page=1}", &params), "/list?page=1");
    assert_eq!(expand("/u/{name=guest}", &params), "/u/guest");
}

#[test]
fn test_digest_shape() {
    let template = UriTemplate::parse("/xml/*/{int:id}{?q}").unwrap();
    assert_eq!(
        template.tokens(),
        &[
            Token::Literal("/xml/".to_string()),
            Token::Wildcard,
            Token::Literal("/".to_string()),
            Token::Variable(Variable::new("id").with_kind("int")),
            Token::Operator(Operator::new(
                OperatorKind::QueryParameter,
                "",
                vec![Variable::new("q")]
            )),
        ]
    );
}

#[test]
fn test_empty_template() {
    let template = UriTemplate::parse("").unwrap();
    assert!(template.tokens().is_empty());
    assert_eq!(template.expand(&Parameters::new()), "");
}

#[test]
fn test_syntax_errors() {
    assert_eq!(
        UriTemplate::parse("/a/{b").unwrap_err(),
        TemplateError::UnclosedExpression { position: 3 }
    );
    assert!(matches!(
        UriTemplate::parse("{;a,a}").unwrap_err(),
        TemplateError::DuplicateVariable { name } if name == "a"
    ));
    assert!(matches!(
        UriTemplate::parse("{-join|&}").unwrap_err(),
        TemplateError::MalformedOperator { .. }
    ));
    assert!(matches!(
        UriTemplate::parse("{#frag}").unwrap_err(),
        TemplateError::UnknownOperator { .. }
    ));
}

#[test]
fn test_round_trip_literal_and_variables() {
    let cases: &[(&str, &[(&str, &str)], &str)] = &[
        (
            "/users/{user}/repos/{repo}",
            &[("user", "jo smith"), ("repo", "furi-core")],
            "/users/jo%20smith/repos/furi-core",
        ),
        (
            "/file/{name}.{ext}",
            &[("name", "archive.tar"), ("ext", "gz")],
            "/file/archive.tar.gz",
        ),
        ("/{a}-{b}/x", &[("a", "x-y"), ("b", "z")], "/x-y-z/x"),
        (
            "/v1.0/{user}/~{page}",
            &[("user", "café au lait"), ("page", "intro_1")],
            "/v1.0/caf%C3%A9%20au%20lait/~intro_1",
        ),
        (
            "/u_{id}/{slug}.html",
            &[("id", "42"), ("slug", "my page.v2")],
            "/u_42/my%20page.v2.html",
        ),
        (
            "/search/{term}{?lang,page}",
            &[("term", "über~alles"), ("lang", "de"), ("page", "3")],
            "/search/%C3%BCber~alles?lang=de&page=3",
        ),
        (
            "/doc/{+path}{?rev}",
            &[("path", "notes/q 1.txt"), ("rev", "2")],
            "/doc/notes/q%201.txt?rev=2",
        ),
    ];

    for (template, values, expected) in cases {
        let params = values
            .iter()
            .fold(Parameters::new(), |params, (name, value)| params.with(*name, *value));
        let uri = expand(template, &params);
        assert_eq!(uri, *expected, "expanding {template}");

        let pattern = UriPattern::parse(template).unwrap();
        assert!(pattern.matches(&uri), "{template} should match {uri}");
        let result = UriResolver::new(&uri).resolve(&pattern);
        assert_eq!(result.bindings.len(), values.len(), "bindings of {uri}");
        for (name, value) in *values {
            assert_eq!(
                result.get(name),
                Some(&BoundValue::from(*value)),
                "{name} in {uri}"
            );
        }
    }
}

#[test]
fn test_parse_is_deterministic() {
    let source = "/a/{b}{?c,d}{-join|&|e,f}";
    let first = UriTemplate::parse(source).unwrap();
    let second = UriTemplate::parse(source).unwrap();
    assert_eq!(first.tokens(), second.tokens());
    assert_eq!(first, second);
    assert_eq!(hash_of(&first), hash_of(&second));

    let params = Parameters::new().with("b", "x").with("e", "y");
    assert_eq!(first.expand(&params), second.expand(&params));
}

#[test]
fn test_pattern_equality_matches_hash() {
    let a = UriPattern::parse("/doc/{+path}").unwrap();
    let b: UriPattern = "/doc/{+path}".parse().unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}
