//! Template ingestion

use super::template::Template;
use super::DocumentResult;
use crate::graph::{
    Edge, EdgeKind, GraphStore, GroupId, Node, NodeId, PropertyValue, Reference,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Ingest a single template as `group`
pub fn ingest_document(
    store: &mut GraphStore,
    group: GroupId,
    template: &Template,
) -> DocumentResult<()> {
    ingest(store, &[(group, template.clone())])
}

/// Ingest a set of templates, one per group
///
/// Runs in three passes so that imports may name exports declared in any
/// of the documents: nodes first, then exports, then edges. Nothing is
/// committed to `store` unless every document ingests cleanly.
pub fn ingest(store: &mut GraphStore, documents: &[(GroupId, Template)]) -> DocumentResult<()> {
    let mut staged = store.clone();

    for (group, template) in documents {
        add_resources(&mut staged, group, template)?;
    }
    for (group, template) in documents {
        register_outputs(&mut staged, group, template)?;
    }
    for (group, template) in documents {
        add_edges(&mut staged, group, template)?;
    }

    debug!(
        documents = documents.len(),
        nodes = staged.node_count(),
        edges = staged.edge_count(),
        "ingested documents"
    );
    *store = staged;
    Ok(())
}

fn add_resources(store: &mut GraphStore, group: &GroupId, template: &Template) -> DocumentResult<()> {
    for (name, resource) in &template.resources {
        let mut node = Node::new(NodeId::new(group.clone(), name.clone()), resource.kind.clone())
            .with_properties(
                resource
                    .properties
                    .clone()
                    .unwrap_or_else(PropertyValue::empty_object),
            );
        if !resource.attributes.is_empty() {
            node.metadata = Some(resource.attributes.clone());
        }
        store.add_node(node)?;
    }
    Ok(())
}

fn register_outputs(store: &mut GraphStore, group: &GroupId, template: &Template) -> DocumentResult<()> {
    for (output_id, output) in &template.outputs {
        let Some(export) = &output.export else {
            debug!(output = %output_id, "output has no export, not tracked");
            continue;
        };
        let Some(name) = export.name.as_str() else {
            warn!(output = %output_id, group = %group, "export name is not a plain string, skipping");
            continue;
        };
        let source = store
            .scanner()
            .scan(&output.value)
            .iter()
            .filter_map(Reference::target_name)
            .map(|target| NodeId::new(group.clone(), target))
            .find(|id| store.contains_node(id));
        let Some(source) = source else {
            warn!(output = %output_id, export = name, "export value names no resource, skipping");
            continue;
        };
        store.register_export(
            name,
            source,
            Some(output_id.clone()),
            Some(output.value.clone()),
        )?;
    }
    Ok(())
}

fn add_edges(store: &mut GraphStore, group: &GroupId, template: &Template) -> DocumentResult<()> {
    for (name, resource) in &template.resources {
        let source = NodeId::new(group.clone(), name.clone());

        if let Some(depends_on) = &resource.depends_on {
            for predecessor in depends_on.names() {
                let target = NodeId::new(group.clone(), predecessor);
                store.add_edge(Edge::new(
                    source.clone(),
                    target,
                    EdgeKind::StructuralDependency,
                ))?;
            }
        }

        let Some(properties) = &resource.properties else {
            continue;
        };
        let mut seen: HashSet<(NodeId, EdgeKind, Option<String>)> = HashSet::new();
        let references = store.scanner().scan(properties);
        for reference in references {
            let Some(edge) = reference_edge(store, &source, &reference) else {
                continue;
            };
            if seen.insert((edge.target.clone(), edge.kind, edge.attribute.clone())) {
                store.add_edge(edge)?;
            }
        }
    }
    Ok(())
}

/// The edge a reference construct implies, if its target is known
fn reference_edge(store: &GraphStore, source: &NodeId, reference: &Reference) -> Option<Edge> {
    match reference {
        Reference::Import { export } => {
            let Some(registration) = store.get_export(export) else {
                warn!(node = %source, export = %export, "import of unknown export, skipping");
                return None;
            };
            let mut edge = Edge::new(
                source.clone(),
                registration.source.clone(),
                EdgeKind::ImportedValue,
            );
            edge.attribute = registration.exposed_attribute(store.scanner());
            Some(edge)
        }
        Reference::Node { name } | Reference::Attribute { name, .. } => {
            let target = NodeId::new(source.group.clone(), name.clone());
            if &target == source || !store.contains_node(&target) {
                debug!(node = %source, target = %name, "reference to non-resource, skipping");
                return None;
            }
            let attribute = reference.attribute_name();
            let mut edge = Edge::new(
                source.clone(),
                target,
                EdgeKind::local_reference(attribute),
            );
            edge.attribute = attribute.map(str::to_string);
            Some(edge)
        }
    }
}
