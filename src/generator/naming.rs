//! Identifier derivation for generated code.

use heck::{ToSnakeCase, ToUpperCamelCase};
use std::collections::BTreeSet;
use tracing::warn;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "gen", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW: &[&str] = &["crate", "self", "Self", "super"];

/// Package name reserved for the definitions module.
pub const MODEL_PACKAGE: &str = "model";

/// Sentinel service DocuSign uses for operations without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Package the uncategorized service is emitted as.
pub const FUTURE_PACKAGE: &str = "future";

fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Replace characters that cannot appear in an identifier and make sure the
/// result does not start with a digit.
fn sanitize(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    s
}

fn escape_keyword(name: String) -> String {
    if NON_RAW.contains(&name.as_str()) {
        format!("{name}_")
    } else if is_keyword(&name) {
        format!("r#{name}")
    } else {
        name
    }
}

/// snake_case identifier for a field, argument or function.
///
/// ```
/// use esign_gen::generator::naming::snake_ident;
/// assert_eq!(snake_ident("envelopeId"), "envelope_id");
/// assert_eq!(snake_ident("type"), "r#type");
/// ```
pub fn snake_ident(name: &str) -> String {
    let snake = sanitize(&name.to_snake_case());
    if snake.is_empty() || snake == "_" {
        return "value".to_string();
    }
    escape_keyword(snake)
}

/// UpperCamelCase type name.
pub fn type_ident(name: &str) -> String {
    let camel = sanitize(&name.to_upper_camel_case());
    match camel.as_str() {
        "" | "_" => "Unnamed".to_string(),
        "Self" => "SelfType".to_string(),
        _ => camel,
    }
}

/// True for the catch-all service, in any letter case.
pub fn is_uncategorized(service: &str) -> bool {
    service.eq_ignore_ascii_case(UNCATEGORIZED)
}

/// Package (module directory) name of a service.
pub fn package_name(service: &str) -> String {
    if is_uncategorized(service) {
        return FUTURE_PACKAGE.to_string();
    }
    sanitize(&service.to_snake_case())
}

/// Strip the first prefix that leaves a non-empty remainder starting with an
/// upper-case letter. Matching ignores case.
pub fn strip_service_prefix<'a>(name: &'a str, prefixes: &[&str]) -> &'a str {
    for prefix in prefixes {
        let Some(head) = name.get(..prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            continue;
        }
        let rest = name[prefix.len()..].trim_start_matches('_');
        if rest.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return rest;
        }
    }
    name
}

/// Return `name`, or `name_<n>` for the first free `n`, and record it.
pub fn unique_name(seen: &mut BTreeSet<String>, name: &str) -> String {
    if seen.insert(name.to_string()) {
        return name.to_string();
    }
    let base = name.trim_start_matches("r#");
    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if seen.insert(candidate.clone()) {
            warn!(name, %candidate, "Duplicate generated name");
            return candidate;
        }
        counter += 1;
    }
}
