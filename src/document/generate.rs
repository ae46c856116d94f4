//! Template generation from the graph

use super::template::{DependsOn, Output, OutputExport, Resource, Template, FORMAT_VERSION};
use crate::graph::{Edge, EdgeKind, GraphStore, GroupId, Node, NodeId, PropertyValue, Reference};
use indexmap::IndexMap;

/// Build the template for `group` from the current graph
///
/// Resources come from the group's nodes in insertion order. A local
/// construct naming a node of this group is kept as is. One naming no node
/// here is resolved through the referrer's out-edges into an import of the
/// matching export, and an import whose export plainly publishes a node of
/// this group becomes a local reference. Outputs come from the exports
/// sourced in this group.
pub fn generate(store: &GraphStore, group: &GroupId) -> Template {
    let mut resources = IndexMap::new();
    for node in store.get_nodes_by_group(group) {
        resources.insert(node.id.name.clone(), resource_for(store, group, node));
    }

    let mut outputs = IndexMap::new();
    for export in store.exports_in_group(group) {
        let base = export
            .output_id
            .clone()
            .unwrap_or_else(|| store.config().output_id(&export.name, None));
        let mut output_id = base.clone();
        let mut n = 2;
        while outputs.contains_key(&output_id) {
            output_id = format!("{}{}", base, n);
            n += 1;
        }
        let value = export.value.clone().unwrap_or_else(|| {
            store
                .scanner()
                .render(&Reference::node(export.source.name.clone()))
        });
        outputs.insert(
            output_id,
            Output {
                value,
                description: None,
                export: Some(OutputExport {
                    name: PropertyValue::String(export.name.clone()),
                }),
            },
        );
    }

    Template {
        format_version: Some(FORMAT_VERSION.to_string()),
        description: None,
        resources,
        outputs,
    }
}

fn resource_for(store: &GraphStore, group: &GroupId, node: &Node) -> Resource {
    let dependencies = store.get_dependencies(&node.id);

    let mut predecessors: Vec<String> = Vec::new();
    for edge in &dependencies {
        if edge.kind == EdgeKind::StructuralDependency
            && &edge.target.group == group
            && !predecessors.contains(&edge.target.name)
        {
            predecessors.push(edge.target.name.clone());
        }
    }

    let references: Vec<&Edge> = dependencies
        .into_iter()
        .filter(|edge| edge.kind.is_reference())
        .collect();
    let mut properties = node.properties.clone();
    store.scanner().rewrite(&mut properties, &mut |reference| {
        resolve_reference(store, group, &references, reference)
    });

    Resource {
        kind: node.kind.clone(),
        properties: (!properties.is_empty()).then_some(properties),
        depends_on: DependsOn::from_names(predecessors),
        attributes: node.metadata.clone().unwrap_or_default(),
    }
}

/// The construct a reference should take in `group`'s document, if it changes
fn resolve_reference(
    store: &GraphStore,
    group: &GroupId,
    references: &[&Edge],
    reference: &Reference,
) -> Option<Reference> {
    if let Reference::Import { export } = reference {
        let registration = store.get_export(export)?;
        if &registration.source.group != group {
            return None;
        }
        let attribute = registration.exposed(store.scanner())?;
        return Some(Reference::local(
            registration.source.name.clone(),
            attribute.as_deref(),
        ));
    }

    let name = reference.target_name()?;
    if store.contains_node(&NodeId::new(group.clone(), name)) {
        return None;
    }
    let attribute = reference.attribute_name();
    let edge = references.iter().find(|edge| {
        edge.target.name == name
            && &edge.target.group != group
            && edge.attribute.as_deref() == attribute
    })?;
    let export = store.find_export(&edge.target, attribute)?;
    Some(Reference::import(export.name.clone()))
}
