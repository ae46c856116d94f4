//! `Fn::Sub` placeholder handling
//!
//! A placeholder is `${Name}` or `${Name.Attr}`. `${!Literal}` is an escape
//! and names declared in the variable map are local to the substitution.

use super::IntrinsicScanner;
use crate::graph::{Properties, PropertyValue, Reference, ReferenceScanner};

enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Split a substitution template into literal text and placeholders
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let content = &after[..end];
        if content.starts_with('!') {
            out.push(Segment::Text(&rest[..start + 2 + end + 1]));
        } else {
            if start > 0 {
                out.push(Segment::Text(&rest[..start]));
            }
            out.push(Segment::Placeholder(content));
        }
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    out
}

fn placeholder_reference(content: &str) -> Reference {
    match content.split_once('.') {
        Some((name, attribute)) => Reference::attribute(name, attribute),
        None => Reference::node(content),
    }
}

/// Template string and variable map of a substitution argument
fn split_arg(arg: &PropertyValue) -> Option<(&str, Option<&Properties>)> {
    match arg {
        PropertyValue::String(template) => Some((template, None)),
        PropertyValue::Array(items) => match items.as_slice() {
            [PropertyValue::String(template), PropertyValue::Object(vars)] => {
                Some((template, Some(vars)))
            }
            _ => None,
        },
        _ => None,
    }
}

pub(super) fn collect(scanner: &IntrinsicScanner, arg: &PropertyValue, out: &mut Vec<Reference>) {
    let Some((template, vars)) = split_arg(arg) else {
        scanner.collect(arg, out);
        return;
    };
    for segment in segments(template) {
        if let Segment::Placeholder(content) = segment {
            if !vars.is_some_and(|vars| vars.contains_key(content)) {
                out.push(placeholder_reference(content));
            }
        }
    }
    if let Some(vars) = vars {
        for value in vars.values() {
            scanner.collect(value, out);
        }
    }
}

pub(super) fn rewrite(
    scanner: &IntrinsicScanner,
    arg: &mut PropertyValue,
    f: &mut dyn FnMut(&Reference) -> Option<Reference>,
) -> usize {
    let Some((template, vars)) = split_arg(arg) else {
        return scanner.rewrite_value(arg, f);
    };
    let template = template.to_string();
    let mut vars = vars.cloned().unwrap_or_default();

    let mut count: usize = vars
        .values_mut()
        .map(|value| scanner.rewrite_value(value, f))
        .sum();

    let declared: Vec<String> = vars.keys().cloned().collect();
    let mut out = String::with_capacity(template.len());
    for segment in segments(&template) {
        let content = match segment {
            Segment::Text(text) => {
                out.push_str(text);
                continue;
            }
            Segment::Placeholder(content) => content,
        };
        let original = placeholder_reference(content);
        let replacement = if declared.iter().any(|name| name == content) {
            None
        } else {
            f(&original).filter(|replacement| *replacement != original)
        };
        match replacement {
            None => push_placeholder(&mut out, content),
            Some(Reference::Node { name }) => {
                push_placeholder(&mut out, &name);
                count += 1;
            }
            Some(Reference::Attribute { name, attribute }) => {
                push_placeholder(&mut out, &format!("{}.{}", name, attribute));
                count += 1;
            }
            Some(import @ Reference::Import { .. }) => {
                // Imports cannot be inlined; bind them to a variable
                let variable = variable_name(content, &vars);
                vars.insert(variable.clone(), scanner.render(&import));
                push_placeholder(&mut out, &variable);
                count += 1;
            }
        }
    }

    if count > 0 {
        *arg = if vars.is_empty() {
            PropertyValue::String(out)
        } else {
            PropertyValue::Array(vec![PropertyValue::String(out), PropertyValue::Object(vars)])
        };
    }
    count
}

fn push_placeholder(out: &mut String, content: &str) {
    out.push_str("${");
    out.push_str(content);
    out.push('}');
}

/// Alphanumeric variable name derived from a placeholder, unique in `vars`
fn variable_name(content: &str, vars: &Properties) -> String {
    let mut base: String = content.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if base.is_empty() {
        base.push_str("Import");
    }
    if !vars.contains_key(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if !vars.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
