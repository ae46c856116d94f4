//! Reference scanning for CloudFormation-style intrinsic functions
//!
//! Recognized constructs:
//! - `{"Ref": "Name"}`
//! - `{"Fn::GetAtt": ["Name", "Attr"]}` and `{"Fn::GetAtt": "Name.Attr"}`
//! - `{"Fn::ImportValue": "export-name"}`
//! - `{"Fn::Sub": "...${Name}...${Name.Attr}..."}`, with or without a
//!   variable map
//!
//! Everything else is walked recursively.

mod sub;

use crate::graph::{PropertyValue, Reference, ReferenceScanner};

pub const REF: &str = "Ref";
pub const GET_ATT: &str = "Fn::GetAtt";
pub const IMPORT_VALUE: &str = "Fn::ImportValue";
pub const SUB: &str = "Fn::Sub";

/// Scanner for `Ref`, `Fn::GetAtt`, `Fn::ImportValue`, and `Fn::Sub`
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicScanner;

impl IntrinsicScanner {
    fn collect(&self, value: &PropertyValue, out: &mut Vec<Reference>) {
        if let Some(reference) = parse_construct(value) {
            out.push(reference);
            return;
        }
        match value {
            PropertyValue::Object(map) => {
                if let Some(arg) = single_arg(map, SUB) {
                    sub::collect(self, arg, out);
                    return;
                }
                for child in map.values() {
                    self.collect(child, out);
                }
            }
            PropertyValue::Array(items) => {
                for item in items {
                    self.collect(item, out);
                }
            }
            _ => {}
        }
    }

    fn rewrite_value(
        &self,
        value: &mut PropertyValue,
        f: &mut dyn FnMut(&Reference) -> Option<Reference>,
    ) -> usize {
        if let Some(reference) = parse_construct(value) {
            return match f(&reference) {
                Some(replacement) if replacement != reference => {
                    *value = self.render(&replacement);
                    1
                }
                _ => 0,
            };
        }
        match value {
            PropertyValue::Object(map) => {
                if map.len() == 1 {
                    if let Some(arg) = map.get_mut(SUB) {
                        return sub::rewrite(self, arg, f);
                    }
                }
                map.values_mut()
                    .map(|child| self.rewrite_value(child, f))
                    .sum()
            }
            PropertyValue::Array(items) => items
                .iter_mut()
                .map(|item| self.rewrite_value(item, f))
                .sum(),
            _ => 0,
        }
    }
}

impl ReferenceScanner for IntrinsicScanner {
    fn scan(&self, value: &PropertyValue) -> Vec<Reference> {
        let mut out = Vec::new();
        self.collect(value, &mut out);
        out
    }

    fn construct(&self, value: &PropertyValue) -> Option<Reference> {
        parse_construct(value)
    }

    fn render(&self, reference: &Reference) -> PropertyValue {
        match reference {
            Reference::Node { name } => PropertyValue::single(REF, name.as_str().into()),
            Reference::Attribute { name, attribute } => PropertyValue::single(
                GET_ATT,
                PropertyValue::Array(vec![name.as_str().into(), attribute.as_str().into()]),
            ),
            Reference::Import { export } => {
                PropertyValue::single(IMPORT_VALUE, export.as_str().into())
            }
        }
    }

    fn rewrite(
        &self,
        value: &mut PropertyValue,
        f: &mut dyn FnMut(&Reference) -> Option<Reference>,
    ) -> usize {
        self.rewrite_value(value, f)
    }
}

/// The argument of a single-key map whose key is `function`
fn single_arg<'a>(
    map: &'a crate::graph::Properties,
    function: &str,
) -> Option<&'a PropertyValue> {
    if map.len() == 1 {
        map.get(function)
    } else {
        None
    }
}

/// Recognize a complete `Ref`, `Fn::GetAtt`, or `Fn::ImportValue` construct
fn parse_construct(value: &PropertyValue) -> Option<Reference> {
    let PropertyValue::Object(map) = value else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    let (function, arg) = map.first()?;
    match (function.as_str(), arg) {
        (REF, PropertyValue::String(name)) => Some(Reference::node(name.clone())),
        (GET_ATT, PropertyValue::Array(items)) => match items.as_slice() {
            [PropertyValue::String(name), PropertyValue::String(attribute)] => {
                Some(Reference::attribute(name.clone(), attribute.clone()))
            }
            _ => None,
        },
        (GET_ATT, PropertyValue::String(path)) => path
            .split_once('.')
            .map(|(name, attribute)| Reference::attribute(name, attribute)),
        (IMPORT_VALUE, PropertyValue::String(export)) => Some(Reference::import(export.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(json: serde_json::Value) -> PropertyValue {
        PropertyValue::from(json)
    }

    #[test]
    fn scans_nested_constructs_in_document_order() {
        let tree = value(json!({
            "TopicArn": {"Ref": "Topic"},
            "Endpoint": {"Fn::GetAtt": ["Queue", "Arn"]},
            "Tags": [
                {"Key": "vpc", "Value": {"Fn::ImportValue": "net-Vpc"}},
                {"Key": "dns", "Value": {"Fn::GetAtt": "Db.Endpoint.Address"}}
            ]
        }));
        let refs = IntrinsicScanner.scan(&tree);
        assert_eq!(
            refs,
            vec![
                Reference::node("Topic"),
                Reference::attribute("Queue", "Arn"),
                Reference::import("net-Vpc"),
                Reference::attribute("Db", "Endpoint.Address"),
            ]
        );
    }

    #[test]
    fn maps_with_extra_keys_are_not_constructs() {
        let tree = value(json!({"Ref": "Topic", "Other": 1}));
        assert!(IntrinsicScanner.scan(&tree).is_empty());
    }

    #[test]
    fn import_of_computed_name_scans_its_argument() {
        let tree = value(json!({"Fn::ImportValue": {"Fn::Sub": "${Env}-vpc"}}));
        assert_eq!(IntrinsicScanner.scan(&tree), vec![Reference::node("Env")]);
    }

    #[test]
    fn render_produces_long_form() {
        assert_eq!(
            serde_json::to_value(IntrinsicScanner.render(&Reference::attribute("Db", "Port")))
                .unwrap(),
            json!({"Fn::GetAtt": ["Db", "Port"]})
        );
        assert_eq!(
            serde_json::to_value(IntrinsicScanner.render(&Reference::import("x"))).unwrap(),
            json!({"Fn::ImportValue": "x"})
        );
    }

    #[test]
    fn rename_rewrites_ref_and_get_att() {
        let mut tree = value(json!({
            "A": {"Ref": "Old"},
            "B": {"Fn::GetAtt": "Old.Arn"},
            "C": {"Ref": "Other"}
        }));
        let count = IntrinsicScanner.rename(&mut tree, "Old", "New");
        assert_eq!(count, 2);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "A": {"Ref": "New"},
                "B": {"Fn::GetAtt": ["New", "Arn"]},
                "C": {"Ref": "Other"}
            })
        );
    }

    #[test]
    fn construct_only_matches_whole_values() {
        assert_eq!(
            IntrinsicScanner.construct(&value(json!({"Fn::GetAtt": "Bucket.Arn"}))),
            Some(Reference::attribute("Bucket", "Arn"))
        );
        assert_eq!(
            IntrinsicScanner.construct(&value(json!({"Fn::Sub": "${Bucket.Arn}/*"}))),
            None
        );
        assert_eq!(
            IntrinsicScanner.construct(&value(json!({"Fn::Join": ["", [{"Ref": "Bucket"}]]}))),
            None
        );
    }

    #[test]
    fn substitute_replaces_imports_with_any_value() {
        let mut tree = value(json!({
            "A": {"Fn::ImportValue": "a-objects"},
            "B": {"Fn::Sub": ["${X}", {"X": {"Fn::ImportValue": "a-objects"}}]},
            "C": {"Fn::ImportValue": "other"}
        }));
        let computed = value(json!({"Fn::Sub": "${Bucket.Arn}/*"}));
        let count =
            IntrinsicScanner.substitute(&mut tree, &Reference::import("a-objects"), &computed);
        assert_eq!(count, 2);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "A": {"Fn::Sub": "${Bucket.Arn}/*"},
                "B": {"Fn::Sub": ["${X}", {"X": {"Fn::Sub": "${Bucket.Arn}/*"}}]},
                "C": {"Fn::ImportValue": "other"}
            })
        );
    }

    #[test]
    fn rewrite_can_turn_reference_into_import() {
        let mut tree = value(json!({"TopicArn": {"Ref": "Topic"}}));
        let count = IntrinsicScanner.rewrite(&mut tree, &mut |reference| match reference {
            Reference::Node { name } if name == "Topic" => Some(Reference::import("infra-Topic")),
            _ => None,
        });
        assert_eq!(count, 1);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({"TopicArn": {"Fn::ImportValue": "infra-Topic"}})
        );
    }
}
