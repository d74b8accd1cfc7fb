#[cfg(test)]
use super::*;
#[cfg(test)]
use crate::ast::{ArrayKey, FuncCall, Scalar};

fn parse_return(input: &str) -> Mapping {
    let mut parser = Parser::new(input).expect("Failed to create parser");
    parser
        .parse_return_array()
        .expect("Failed to parse document")
        .expect("Expected a returned array")
}

fn single_value(literal: &str) -> ValueNode {
    let source = format!("<?php return ['value' => {}];", literal);
    let mapping = parse_return(&source);
    assert_eq!(mapping.len(), 1);
    mapping.get("value").cloned().expect("Missing 'value' key")
}

#[test]
fn test_scalar_literals() {
    assert_eq!(single_value("'text'"), ValueNode::string("text"));
    assert_eq!(single_value("\"text\""), ValueNode::string("text"));
    assert_eq!(single_value("42"), ValueNode::Scalar(Scalar::Int(42)));
    assert_eq!(single_value("0x1F"), ValueNode::Scalar(Scalar::Int(31)));
    assert_eq!(single_value("2.5"), ValueNode::Scalar(Scalar::Float(2.5)));
    assert_eq!(single_value("true"), ValueNode::Scalar(Scalar::Bool(true)));
    assert_eq!(single_value("FALSE"), ValueNode::Scalar(Scalar::Bool(false)));
    assert_eq!(single_value("Null"), ValueNode::Scalar(Scalar::Null));
}

#[test]
fn test_bare_constant_is_string() {
    assert_eq!(single_value("PHP_EOL"), ValueNode::string("PHP_EOL"));
    assert_eq!(single_value("\\PHP_EOL"), ValueNode::string("PHP_EOL"));
}

#[test]
fn test_auto_indexing() {
    let mapping = parse_return("<?php return ['alpha', 'beta'];");
    let keys: Vec<_> = mapping.keys().cloned().collect();
    assert_eq!(keys, vec![ArrayKey::Int(0), ArrayKey::Int(1)]);
    assert_eq!(mapping.get_key(&ArrayKey::Int(0)), Some(&ValueNode::string("alpha")));
    assert_eq!(mapping.get_key(&ArrayKey::Int(1)), Some(&ValueNode::string("beta")));

    let mapping = parse_return("<?php return [5 => 'x', 'y'];");
    assert_eq!(mapping.get_key(&ArrayKey::Int(5)), Some(&ValueNode::string("x")));
    assert_eq!(mapping.get_key(&ArrayKey::Int(6)), Some(&ValueNode::string("y")));
}

#[test]
fn test_auto_indexing_after_max_key() {
    let mapping = parse_return("<?php return [9223372036854775807 => 'a', 'b'];");
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get_key(&ArrayKey::Int(i64::MAX)), Some(&ValueNode::string("a")));

    let mapping = parse_return("<?php return [9223372036854775807 => 'a', 'b', 'k' => 'c', 'd'];");
    let keys: Vec<_> = mapping.keys().cloned().collect();
    assert_eq!(keys, vec![ArrayKey::Int(i64::MAX), ArrayKey::from("k")]);
    assert_eq!(mapping.get_key(&ArrayKey::Int(i64::MAX)), Some(&ValueNode::string("a")));
}

#[test]
fn test_mixed_keys_and_duplicates() {
    let mapping = parse_return("<?php return ['a' => 1, 'b', 'a' => 3, 'c'];");
    let keys: Vec<_> = mapping.keys().cloned().collect();
    assert_eq!(
        keys,
        vec![ArrayKey::from("a"), ArrayKey::Int(0), ArrayKey::Int(1)]
    );
    assert_eq!(mapping.get("a"), Some(&ValueNode::Scalar(Scalar::Int(3))));
}

#[test]
fn test_non_literal_key_is_auto_indexed() {
    let mapping = parse_return("<?php return [3 => 'a', $key => 'b', SOME_CONST . 'x' => 'c'];");
    assert_eq!(mapping.get_key(&ArrayKey::Int(4)), Some(&ValueNode::string("b")));
    assert_eq!(mapping.get_key(&ArrayKey::Int(5)), Some(&ValueNode::string("c")));
}

#[test]
fn test_function_call_capture() {
    let value = single_value("env('APP_NAME', 'default')");
    assert_eq!(
        value,
        ValueNode::FuncCall(FuncCall::new(
            "env",
            vec![ValueNode::string("APP_NAME"), ValueNode::string("default")]
        ))
    );
    assert!(value.is_call("env", Some("APP_NAME")));
    assert!(!value.is_call("env", Some("OTHER")));
    assert!(!value.is_call("config", None));

    let call = value.as_func_call().expect("Expected a function call");
    assert_eq!(call.first_arg(), Some(&ValueNode::string("APP_NAME")));
    assert_eq!(call.second_arg(), Some(&ValueNode::string("default")));
}

#[test]
fn test_nested_call_arguments() {
    let value = single_value("storage_path(env('DIR', ['a' => base_path()]))");
    let outer = value.as_func_call().expect("Expected outer call");
    assert_eq!(outer.name, "storage_path");

    let inner = outer.first_arg().and_then(ValueNode::as_func_call).expect("Expected inner call");
    assert_eq!(inner.name, "env");
    let nested = inner.second_arg().and_then(ValueNode::as_mapping).expect("Expected nested array");
    assert!(nested.get("a").is_some_and(|v| v.is_call("base_path", None)));
}

#[test]
fn test_named_and_spread_arguments() {
    let value = single_value("env(key: 'APP_NAME', default: 'x')");
    assert!(value.is_call("env", Some("APP_NAME")));

    let value = single_value("merge(...$items)");
    let call = value.as_func_call().expect("Expected a function call");
    assert_eq!(call.first_arg(), Some(&ValueNode::unparsed("spread")));
}

#[test]
fn test_class_constant_and_static_property() {
    assert_eq!(
        single_value("PDO::ATTR_SSL_CA"),
        ValueNode::ClassConst { class: "PDO".into(), constant: "ATTR_SSL_CA".into() }
    );
    assert_eq!(
        single_value("\\App\\Models\\User::class"),
        ValueNode::ClassConst { class: "App\\Models\\User".into(), constant: "class".into() }
    );
    assert_eq!(
        single_value("Config::$defaults"),
        ValueNode::StaticProp { class: "Config".into(), property: "defaults".into() }
    );
}

#[test]
fn test_unparsed_kinds() {
    let cases = [
        ("'a' . 'b'", "binary_op"),
        ("$debug ? 'a' : 'b'", "ternary"),
        ("$x ?? 'fallback'", "coalesce"),
        ("$config", "variable"),
        ("$app->make('x')", "method_call"),
        ("$app->name", "property_fetch"),
        ("$items[0]", "array_dim_fetch"),
        ("new Foo('bar')", "new"),
        ("function () { return 1; }", "closure"),
        ("fn ($x) => $x * 2", "arrow_function"),
        ("match (true) { default => 1 }", "match"),
        ("(int) '5'", "cast"),
        ("-1", "unary_op"),
        ("Str::slug('My App')", "static_call"),
        ("\"Hello {$name}\"", "interpolated_string"),
        ("env('A') ?: 'b'", "ternary"),
        ("env('PORT') + 1", "binary_op"),
        ("$config['key'] ?? null", "coalesce"),
        ("$app->name() . 'x'", "binary_op"),
        ("$app->config()['x']", "array_dim_fetch"),
        ("$app['config']->get('x')", "method_call"),
        ("$x ?? $y ? 1 : 2", "ternary"),
        ("$debug ? $a ?? 1 : 2", "ternary"),
        ("$a = $b ?? 1", "assign"),
        ("$a or $b = 1", "binary_op"),
        ("$a + $b * 2", "binary_op"),
        ("-$items[0]", "unary_op"),
        ("(int) $port + 1", "binary_op"),
        ("$count++", "unary_op"),
        ("$user instanceof Model", "instanceof"),
        ("Foo::make()->build()", "method_call"),
        ("$handler ?? fn () => $a . 'x'", "coalesce"),
    ];

    for (literal, kind) in cases {
        assert_eq!(single_value(literal), ValueNode::unparsed(kind), "literal: {}", literal);
    }
}

#[test]
fn test_parenthesized_expression() {
    assert_eq!(single_value("('inner')"), ValueNode::string("inner"));
}

#[test]
fn test_long_array_syntax_and_trailing_commas() {
    let mapping = parse_return(
        r#"<?php
return array(
    'disks' => array('local', 's3',),
    'nested' => ['deep' => [1, 2,],],
);
"#,
    );
    let disks = mapping.get("disks").and_then(ValueNode::as_mapping).expect("Expected disks");
    assert_eq!(disks.len(), 2);
    let deep = mapping
        .get("nested")
        .and_then(ValueNode::as_mapping)
        .and_then(|m| m.get("deep"))
        .and_then(ValueNode::as_mapping)
        .expect("Expected nested.deep");
    assert_eq!(deep.len(), 2);
}

#[test]
fn test_leading_statements_are_skipped() {
    let mapping = parse_return(
        r#"<?php

declare(strict_types=1);

use Illuminate\Support\Str;

$prefix = Str::slug(env('APP_NAME', 'app'));

function helper() { return ['ignored' => true]; }

if ($prefix) {
    $other = 1;
}

return ['prefix' => 'x'];
"#,
    );
    assert_eq!(mapping.get("prefix"), Some(&ValueNode::string("x")));
    assert!(!mapping.contains_key("ignored"));
}

#[test]
fn test_non_array_return_yields_none() {
    let mut parser = Parser::new("<?php return env('X');").expect("Failed to create parser");
    assert_eq!(parser.parse_return_array().expect("Failed to parse"), None);

    let mut parser = Parser::new("<?php $a = [1];").expect("Failed to create parser");
    assert_eq!(parser.parse_return_array().expect("Failed to parse"), None);
}

#[test]
fn test_unclosed_array_is_an_error() {
    let mut parser = Parser::new("<?php return ['a' => 1;").expect("Failed to create parser");
    assert!(parser.parse_return_array().is_err());

    let mut parser = Parser::new("<?php return ['a' => 1]; }").expect("Failed to create parser");
    assert!(parser.parse_return_array().is_err());
}

#[test]
fn test_property_default_in_class() {
    let input = r#"<?php

namespace App\Http;

use Illuminate\Foundation\Http\Kernel as HttpKernel;
use App\Http\Middleware\{Authenticate, TrimStrings as Trim};

class Kernel extends HttpKernel
{
    use SomeTrait;

    protected const VERSION = 2;

    protected $middleware = [\App\Http\Middleware\TrustProxies::class];

    #[Deprecated]
    protected array $middlewareGroups = [
        'web' => [Authenticate::class, Trim::class, 'throttle:api'],
        'api' => [Middleware\Cors::class],
    ];

    public function handle($request): mixed
    {
        return ['middlewareGroups' => []];
    }
}
"#;
    let names = NameContext::from_source(input);
    let mut parser = Parser::new(input).expect("Failed to create parser").with_names(names);
    let value = parser
        .parse_property_default("middlewareGroups")
        .expect("Failed to parse class")
        .expect("Expected a default value");

    let groups = value.as_mapping().expect("Expected an array");
    let web = groups.get("web").and_then(ValueNode::as_mapping).expect("Expected web group");
    let entries: Vec<_> = web.values().filter_map(ValueNode::as_str).collect();
    assert_eq!(
        entries,
        vec![
            "App\\Http\\Middleware\\Authenticate",
            "App\\Http\\Middleware\\TrimStrings",
            "throttle:api",
        ]
    );

    let api = groups.get("api").and_then(ValueNode::as_mapping).expect("Expected api group");
    assert_eq!(
        api.values().next().and_then(ValueNode::as_str),
        Some("App\\Http\\Middleware\\Cors")
    );
}

#[test]
fn test_property_without_default() {
    let input = "<?php class Kernel { protected $middlewareGroups; }";
    let mut parser = Parser::new(input).expect("Failed to create parser");
    assert_eq!(parser.parse_property_default("middlewareGroups").expect("Failed to parse"), None);

    let input = "<?php class Kernel { protected $other = []; }";
    let mut parser = Parser::new(input).expect("Failed to create parser");
    assert_eq!(parser.parse_property_default("middlewareGroups").expect("Failed to parse"), None);
}

#[test]
fn test_name_context_resolution() {
    let names = NameContext::from_source(
        r#"<?php
namespace App\Http;

use Foo\Bar;
use Foo\Baz as Qux, Other\Thing;
use function Foo\helper;
use Grouped\{One, Two as Deux};
"#,
    );

    assert_eq!(names.namespace(), Some("App\\Http"));
    assert_eq!(names.resolve_class("Bar"), "Foo\\Bar");
    assert_eq!(names.resolve_class("Qux"), "Foo\\Baz");
    assert_eq!(names.resolve_class("Thing"), "Other\\Thing");
    assert_eq!(names.resolve_class("Deux"), "Grouped\\Two");
    assert_eq!(names.resolve_class("One\\Inner"), "Grouped\\One\\Inner");
    assert_eq!(names.resolve_class("Local"), "App\\Http\\Local");
    assert_eq!(names.resolve_class("\\Global\\Name"), "Global\\Name");
    assert_eq!(names.resolve_class("namespace\\Sub"), "App\\Http\\Sub");
    assert_eq!(names.resolve_class("static"), "static");
    assert_eq!(names.import("helper"), None);
}

#[test]
fn test_name_context_ignores_commented_imports() {
    let names = NameContext::from_source(
        r#"<?php
namespace App\Http;

/*
use Vendor\Legacy\Guard;
*/
// use Vendor\Legacy\Other;
# use Vendor\Legacy\Third;
use Foo\Bar;
"#,
    );

    assert_eq!(names.resolve_class("Guard"), "App\\Http\\Guard");
    assert_eq!(names.resolve_class("Other"), "App\\Http\\Other");
    assert_eq!(names.resolve_class("Third"), "App\\Http\\Third");
    assert_eq!(names.resolve_class("Bar"), "Foo\\Bar");
}

#[test]
fn test_name_context_bracketed_namespace() {
    let names = NameContext::from_source(
        r#"<?php
namespace App\Http {
    use Foo\Bar;
    use Foo\Baz as Qux;

    class Kernel
    {
        use Concerns\HandlesRequests;

        public function boot()
        {
            $fn = function () use ($x) {
                return $x;
            };
        }
    }
}

namespace Other {
    use Elsewhere\Thing;
}
"#,
    );

    assert_eq!(names.namespace(), Some("App\\Http"));
    assert_eq!(names.resolve_class("Bar"), "Foo\\Bar");
    assert_eq!(names.resolve_class("Qux"), "Foo\\Baz");
    assert_eq!(names.import("HandlesRequests"), None);
    assert_eq!(names.import("Thing"), None);
    assert_eq!(names.resolve_class("Thing"), "App\\Http\\Thing");
}

#[test]
fn test_name_context_grouped_imports_with_kinds() {
    let names = NameContext::from_source(
        "<?php use Lib\\{Widget, function helper, const LIMIT, Gadget as G,};",
    );

    assert_eq!(names.namespace(), None);
    assert_eq!(names.resolve_class("Widget"), "Lib\\Widget");
    assert_eq!(names.resolve_class("G"), "Lib\\Gadget");
    assert_eq!(names.import("helper"), None);
    assert_eq!(names.import("LIMIT"), None);
}

#[test]
fn test_name_context_from_unlexable_source() {
    let names = NameContext::from_source("<?php namespace App; use Foo\\Bar; $s = 'unterminated");
    assert_eq!(names, NameContext::default());
}
