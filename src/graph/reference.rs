//! Reference constructs as seen by the graph core
//!
//! The store never parses document syntax itself. It consumes a
//! [`ReferenceScanner`] that locates reference constructs in a property
//! tree and reports them as a closed [`Reference`] variant.

use super::node::PropertyValue;

/// A reference construct found in a property tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Whole-node reference by local name
    Node { name: String },
    /// Reference to one attribute of a node
    Attribute { name: String, attribute: String },
    /// Consumption of a published export
    Import { export: String },
}

impl Reference {
    pub fn node(name: impl Into<String>) -> Self {
        Self::Node { name: name.into() }
    }

    pub fn attribute(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            attribute: attribute.into(),
        }
    }

    pub fn import(export: impl Into<String>) -> Self {
        Self::Import {
            export: export.into(),
        }
    }

    /// Local reference to `name`, with or without an attribute
    pub fn local(name: impl Into<String>, attribute: Option<&str>) -> Self {
        match attribute {
            Some(attribute) => Self::attribute(name, attribute),
            None => Self::node(name),
        }
    }

    /// Local name targeted, if this is not an import
    pub fn target_name(&self) -> Option<&str> {
        match self {
            Self::Node { name } | Self::Attribute { name, .. } => Some(name),
            Self::Import { .. } => None,
        }
    }

    pub fn attribute_name(&self) -> Option<&str> {
        match self {
            Self::Attribute { attribute, .. } => Some(attribute),
            _ => None,
        }
    }
}

/// Recognizes and rewrites reference constructs in property trees
pub trait ReferenceScanner: Send + Sync + std::fmt::Debug {
    /// Every reference construct in `value`, in document order
    fn scan(&self, value: &PropertyValue) -> Vec<Reference>;

    /// The reference `value` is, when the whole value is one construct.
    /// Computed values that merely contain references yield `None`.
    fn construct(&self, value: &PropertyValue) -> Option<Reference>;

    /// The canonical construct for a reference
    fn render(&self, reference: &Reference) -> PropertyValue;

    /// Replace constructs for which `f` returns a new reference.
    /// Returns how many constructs were rewritten.
    fn rewrite(
        &self,
        value: &mut PropertyValue,
        f: &mut dyn FnMut(&Reference) -> Option<Reference>,
    ) -> usize;

    /// Replace every whole construct equal to `target` with `replacement`
    fn substitute(
        &self,
        value: &mut PropertyValue,
        target: &Reference,
        replacement: &PropertyValue,
    ) -> usize {
        if self.construct(value).as_ref() == Some(target) {
            *value = replacement.clone();
            return 1;
        }
        match value {
            PropertyValue::Object(map) => map
                .values_mut()
                .map(|child| self.substitute(child, target, replacement))
                .sum(),
            PropertyValue::Array(items) => items
                .iter_mut()
                .map(|item| self.substitute(item, target, replacement))
                .sum(),
            _ => 0,
        }
    }

    /// Rewrite every local reference naming `old` to name `new`
    fn rename(&self, value: &mut PropertyValue, old: &str, new: &str) -> usize {
        self.rewrite(value, &mut |reference| match reference {
            Reference::Node { name } if name == old => Some(Reference::node(new)),
            Reference::Attribute { name, attribute } if name == old => {
                Some(Reference::attribute(new, attribute.clone()))
            }
            _ => None,
        })
    }
}
