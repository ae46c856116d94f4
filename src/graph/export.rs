//! Export registrations: named values published across group boundaries

use super::node::{NodeId, PropertyValue};
use super::reference::{Reference, ReferenceScanner};
use serde::{Deserialize, Serialize};

/// A published export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRegistration {
    /// Globally unique export name
    pub name: String,
    /// Node whose value is exported
    pub source: NodeId,
    /// Output entry that publishes the export in the source group's document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_id: Option<String>,
    /// Captured value expression; absent means the whole node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
}

impl ExportRegistration {
    pub fn new(name: impl Into<String>, source: NodeId) -> Self {
        Self {
            name: name.into(),
            source,
            output_id: None,
            value: None,
        }
    }

    pub fn with_output_id(mut self, output_id: impl Into<String>) -> Self {
        self.output_id = Some(output_id.into());
        self
    }

    pub fn with_value(mut self, value: PropertyValue) -> Self {
        self.value = Some(value);
        self
    }

    /// What the export publishes: `Some(None)` for the whole source node,
    /// `Some(Some(attr))` for one attribute of it, `None` for a computed
    /// value that is not a single reference to the source
    pub fn exposed(&self, scanner: &dyn ReferenceScanner) -> Option<Option<String>> {
        let Some(value) = self.value.as_ref() else {
            return Some(None);
        };
        match scanner.construct(value)? {
            Reference::Node { name } if name == self.source.name => Some(None),
            Reference::Attribute { name, attribute } if name == self.source.name => {
                Some(Some(attribute))
            }
            _ => None,
        }
    }

    /// Attribute exposed by the captured value, `None` for the whole node
    /// or a computed value
    pub fn exposed_attribute(&self, scanner: &dyn ReferenceScanner) -> Option<String> {
        self.exposed(scanner).flatten()
    }

    /// Whether this export publishes exactly `attribute` of `node`
    pub fn exposes(
        &self,
        node: &NodeId,
        attribute: Option<&str>,
        scanner: &dyn ReferenceScanner,
    ) -> bool {
        &self.source == node
            && self.exposed(scanner).as_ref().map(|a| a.as_deref()) == Some(attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intrinsic::IntrinsicScanner;
    use serde_json::json;

    fn export(value: Option<serde_json::Value>) -> ExportRegistration {
        let registration = ExportRegistration::new("a-bucket", NodeId::new("a", "Bucket"));
        match value {
            Some(value) => registration.with_value(PropertyValue::from(value)),
            None => registration,
        }
    }

    #[test]
    fn plain_constructs_expose_their_pair() {
        let bucket = NodeId::new("a", "Bucket");
        let whole = export(Some(json!({"Ref": "Bucket"})));
        assert!(whole.exposes(&bucket, None, &IntrinsicScanner));
        assert!(!whole.exposes(&bucket, Some("Arn"), &IntrinsicScanner));

        let arn = export(Some(json!({"Fn::GetAtt": "Bucket.Arn"})));
        assert!(arn.exposes(&bucket, Some("Arn"), &IntrinsicScanner));
        assert_eq!(arn.exposed_attribute(&IntrinsicScanner).as_deref(), Some("Arn"));

        assert!(export(None).exposes(&bucket, None, &IntrinsicScanner));
    }

    #[test]
    fn computed_values_expose_nothing() {
        let bucket = NodeId::new("a", "Bucket");
        let objects = export(Some(json!({"Fn::Sub": "${Bucket.Arn}/*"})));
        assert_eq!(objects.exposed(&IntrinsicScanner), None);
        assert!(!objects.exposes(&bucket, Some("Arn"), &IntrinsicScanner));
        assert!(!objects.exposes(&bucket, None, &IntrinsicScanner));

        let other = export(Some(json!({"Ref": "Other"})));
        assert!(!other.exposes(&bucket, None, &IntrinsicScanner));
    }
}
