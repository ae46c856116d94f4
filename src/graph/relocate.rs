//! Node relocation: moving a node between groups or renaming it in place
//!
//! A relocation re-keys the node, then walks every edge touching it and
//! re-derives its kind from the post-move placement of both endpoints:
//!
//! | Edge kind before            | Endpoints after | Result                              |
//! |-----------------------------|-----------------|-------------------------------------|
//! | structural dependency       | cross-group     | dropped                             |
//! | value / attribute reference | cross-group     | imported value, export materialized |
//! | imported value              | same group      | local reference + structural edge   |
//! | anything else               | either          | kept, cross-group flag refreshed    |
//!
//! Property trees follow the edges: a converted reference becomes an import
//! construct in its referrer, and a restored import is replaced by the
//! export's value expression. A pure rename rewrites the old local name in
//! every node of the group.
//!
//! All work happens on a staged copy of the store which replaces the live
//! one only once every step has run.

use super::edge::{Edge, EdgeKind};
use super::export::ExportRegistration;
use super::node::NodeId;
use super::reference::Reference;
use super::store::{GraphError, GraphResult, GraphStore};
use std::sync::Arc;
use tracing::{debug, info};

/// What a relocation changed
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub from: NodeId,
    pub to: NodeId,
    /// The owning group changed (as opposed to a pure rename)
    pub crossed_groups: bool,
    /// Structural dependencies that no longer have a meaning
    pub dropped: Vec<Edge>,
    /// References turned into imports, as they now stand
    pub converted: Vec<Edge>,
    /// Imports turned back into local references, as they now stand
    pub restored: Vec<Edge>,
    pub exports_created: Vec<String>,
    pub exports_pruned: Vec<String>,
    /// Reference constructs rewritten in property trees
    pub references_rewritten: usize,
}

impl Relocation {
    fn unchanged(id: &NodeId) -> Self {
        Self {
            from: id.clone(),
            to: id.clone(),
            crossed_groups: false,
            dropped: Vec::new(),
            converted: Vec::new(),
            restored: Vec::new(),
            exports_created: Vec::new(),
            exports_pruned: Vec::new(),
            references_rewritten: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// A local reference that became an import during edge rewriting
struct Converted {
    source: NodeId,
    target: NodeId,
    attribute: Option<String>,
    /// Local name the referrer's property tree uses for the target
    written_name: String,
}

/// An import that became local again during edge rewriting
struct Restored {
    source: NodeId,
    target: NodeId,
    attribute: Option<String>,
}

impl GraphStore {
    /// Move the node at `from` to the address `to`
    ///
    /// Fails with `NotFound` when nothing lives at `from` and with
    /// `AlreadyExists` when another node lives at `to`; in both cases the
    /// store is left untouched. Moving a node onto its own address is a no-op.
    pub fn relocate(&mut self, from: &NodeId, to: &NodeId) -> GraphResult<Relocation> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::NotFound(from.clone()));
        }
        if from == to {
            return Ok(Relocation::unchanged(from));
        }
        if self.nodes.contains_key(to) {
            return Err(GraphError::AlreadyExists(to.clone()));
        }

        let mut staged = self.clone();
        let report = staged.apply_relocation(from, to);
        *self = staged;

        info!(
            from = %report.from,
            to = %report.to,
            dropped = report.dropped.len(),
            converted = report.converted.len(),
            restored = report.restored.len(),
            exports_created = report.exports_created.len(),
            exports_pruned = report.exports_pruned.len(),
            "relocated node"
        );
        Ok(report)
    }

    /// Every step after the preconditions. Infallible by construction.
    fn apply_relocation(&mut self, from: &NodeId, to: &NodeId) -> Relocation {
        let mut report = Relocation {
            from: from.clone(),
            to: to.clone(),
            crossed_groups: from.group != to.group,
            ..Relocation::unchanged(from)
        };

        self.rekey_node(from, to);
        self.rekey_exports(from, to);

        // Edge rewriting
        let mut converted: Vec<Converted> = Vec::new();
        let mut restored: Vec<Restored> = Vec::new();
        let mut kept: Vec<Edge> = Vec::with_capacity(self.edges.len());

        for mut edge in std::mem::take(&mut self.edges) {
            if !edge.touches(from) {
                kept.push(edge);
                continue;
            }
            if &edge.source == from {
                edge.source = to.clone();
            }
            if &edge.target == from {
                edge.target = to.clone();
            }
            let crosses = edge.source.group != edge.target.group;

            match edge.kind {
                EdgeKind::StructuralDependency if crosses => {
                    debug!(edge = %edge, "dropping cross-group ordering hint");
                    report.dropped.push(edge);
                }
                EdgeKind::ValueReference | EdgeKind::AttributeReference if crosses => {
                    edge.kind = EdgeKind::ImportedValue;
                    edge.cross_group = true;
                    debug!(edge = %edge, "reference now crosses groups, importing");
                    let written_name = if &edge.target == to {
                        from.name.clone()
                    } else {
                        edge.target.name.clone()
                    };
                    converted.push(Converted {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        attribute: edge.attribute.clone(),
                        written_name,
                    });
                    report.converted.push(edge.clone());
                    kept.push(edge);
                }
                EdgeKind::ImportedValue if !crosses => {
                    edge.kind = EdgeKind::local_reference(edge.attribute.as_deref());
                    edge.cross_group = false;
                    debug!(edge = %edge, "import now in-group, restoring reference");
                    restored.push(Restored {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        attribute: edge.attribute.clone(),
                    });
                    report.restored.push(edge.clone());
                    kept.push(edge);
                }
                _ => {
                    edge.refresh_cross_group();
                    kept.push(edge);
                }
            }
        }
        self.edges = kept;

        // Converted references: the referrer imports the materialized export
        for item in converted {
            let (name, created) = self.materialize_export(&item.target, item.attribute.as_deref());
            if created {
                report.exports_created.push(name.clone());
            }
            let written = Reference::local(item.written_name, item.attribute.as_deref());
            let import = Reference::import(name);
            report.references_rewritten += self.rewrite_node(&item.source, &mut |reference| {
                (*reference == written).then(|| import.clone())
            });
        }

        // Restored imports: ordering becomes explicit again and each consumed
        // export's construct is replaced by the value it published
        let mut prune_candidates: Vec<String> = Vec::new();
        let mut handled: Vec<(NodeId, NodeId)> = Vec::new();
        for item in restored {
            let has_ordering = self.edges.iter().any(|e| {
                e.kind == EdgeKind::StructuralDependency
                    && e.source == item.source
                    && e.target == item.target
            });
            if !has_ordering {
                self.edges.push(Edge::new(
                    item.source.clone(),
                    item.target.clone(),
                    EdgeKind::StructuralDependency,
                ));
            }

            let pair = (item.source.clone(), item.target.clone());
            if handled.contains(&pair) {
                continue;
            }
            handled.push(pair);

            for export in self.consumed_exports(&item.source, &item.target, item.attribute.as_deref()) {
                report.references_rewritten += self.inline_export(&item.source, &export);
                if !prune_candidates.contains(&export) {
                    prune_candidates.push(export);
                }
            }
        }

        for name in prune_candidates {
            if self.prune_export(&name) {
                report.exports_pruned.push(name);
            }
        }

        if from.group == to.group && from.name != to.name {
            report.references_rewritten += self.rename_in_group(from, to);
        }

        report
    }

    /// Re-key the node under its new id, keeping its position in the store
    fn rekey_node(&mut self, from: &NodeId, to: &NodeId) {
        self.nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|(id, mut node)| {
                if &id == from {
                    Arc::make_mut(&mut node).id = to.clone();
                    (to.clone(), node)
                } else {
                    (id, node)
                }
            })
            .collect();
    }

    /// Point exports sourced from the moved node at its new id
    ///
    /// Output ids only need to be unique within a group, so exports that
    /// follow the node into another group get a fresh id on collision.
    fn rekey_exports(&mut self, from: &NodeId, to: &NodeId) {
        let scanner = Arc::clone(&self.scanner);
        let mut taken: Vec<String> = if from.group == to.group {
            Vec::new()
        } else {
            self.exports_in_group(&to.group)
                .into_iter()
                .filter_map(|export| export.output_id.clone())
                .collect()
        };

        for export in self.exports.values_mut() {
            if &export.source != from {
                continue;
            }
            export.source = to.clone();
            if let Some(value) = export.value.as_mut() {
                scanner.rename(value, &from.name, &to.name);
            }
            if from.group == to.group {
                continue;
            }
            if let Some(output_id) = export.output_id.as_mut() {
                let fresh = unique(output_id, "", |candidate| taken.iter().any(|t| t == candidate));
                if fresh != *output_id {
                    debug!(export = %export.name, output = %fresh, "output id taken in destination group");
                    *output_id = fresh;
                }
                taken.push(output_id.clone());
            }
        }
    }

    /// Find or create the export publishing `attribute` of `target`
    ///
    /// Returns the export name and whether it was newly created.
    pub(crate) fn materialize_export(
        &mut self,
        target: &NodeId,
        attribute: Option<&str>,
    ) -> (String, bool) {
        if let Some(existing) = self.find_export(target, attribute) {
            debug!(export = %existing.name, "reusing export");
            return (existing.name.clone(), false);
        }

        let base = self.config.export_name(target, attribute);
        let name = unique(&base, &self.config.export_separator, |candidate| {
            self.exports.contains_key(candidate)
        });

        let base_output = self.config.output_id(&target.name, attribute);
        let taken: Vec<&str> = self
            .exports_in_group(&target.group)
            .into_iter()
            .filter_map(|export| export.output_id.as_deref())
            .collect();
        let output_id = unique(&base_output, "", |candidate| taken.contains(&candidate));

        let value = self
            .scanner
            .render(&Reference::local(target.name.clone(), attribute));
        let registration = ExportRegistration::new(name.clone(), target.clone())
            .with_output_id(output_id)
            .with_value(value);

        debug!(export = %name, source = %target, "materialized export");
        self.exports.insert(name.clone(), registration);
        (name, true)
    }

    /// Drop the export `name` unless some import still consumes it
    ///
    /// An import edge consumes the export when the export publishes exactly
    /// the edge's (target, attribute) pair; a property tree consumes it by
    /// naming it in an import construct.
    fn prune_export(&mut self, name: &str) -> bool {
        let Some(export) = self.exports.get(name) else {
            return false;
        };
        let scanner = self.scanner.as_ref();
        let by_edge = self.edges.iter().any(|e| {
            e.kind == EdgeKind::ImportedValue
                && export.exposes(&e.target, e.attribute.as_deref(), scanner)
        });
        let import = Reference::import(name);
        let by_tree = self
            .nodes
            .values()
            .any(|node| scanner.scan(&node.properties).contains(&import));
        if by_edge || by_tree {
            return false;
        }
        debug!(export = %name, "pruning unused export");
        self.exports.shift_remove(name);
        true
    }

    /// Exports sourced from `target` that `source` imports
    ///
    /// Read from the referrer's property tree; a node whose tree holds no
    /// such import falls back to the export exposing the edge's pair.
    fn consumed_exports(
        &self,
        source: &NodeId,
        target: &NodeId,
        attribute: Option<&str>,
    ) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if let Some(node) = self.get_node(source) {
            for reference in self.scanner.scan(&node.properties) {
                let Reference::Import { export } = reference else {
                    continue;
                };
                if self.resolve_export(&export) == Some(target) && !names.contains(&export) {
                    names.push(export);
                }
            }
        }
        if names.is_empty() {
            if let Some(export) = self.find_export(target, attribute) {
                names.push(export.name.clone());
            }
        }
        names
    }

    /// Replace `source`'s import constructs for `export` with the export's
    /// value expression
    fn inline_export(&mut self, source: &NodeId, export: &str) -> usize {
        let Some(registration) = self.exports.get(export) else {
            return 0;
        };
        let value = registration.value.clone().unwrap_or_else(|| {
            self.scanner
                .render(&Reference::node(registration.source.name.clone()))
        });
        let scanner = Arc::clone(&self.scanner);
        let Some(node) = self.nodes.get_mut(source) else {
            return 0;
        };
        let count = scanner.substitute(
            &mut Arc::make_mut(node).properties,
            &Reference::import(export),
            &value,
        );
        if count > 0 {
            debug!(node = %source, export, "inlined restored import");
        }
        count
    }

    /// Rewrite references naming the old local name after a pure rename
    ///
    /// Local names are unique within a group, so every construct in the
    /// group naming the old name meant the renamed node.
    fn rename_in_group(&mut self, from: &NodeId, to: &NodeId) -> usize {
        let members: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| id.group == to.group && *id != to)
            .cloned()
            .collect();

        let scanner = Arc::clone(&self.scanner);
        let mut count = 0;
        for id in members {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let mentions = scanner
                .scan(&node.properties)
                .iter()
                .any(|reference| reference.target_name() == Some(from.name.as_str()));
            if !mentions {
                continue;
            }
            let renamed = scanner.rename(&mut Arc::make_mut(node).properties, &from.name, &to.name);
            debug!(node = %id, renamed, "renamed references");
            count += renamed;
        }
        count
    }

    /// Apply a reference rewrite to one node's property tree
    fn rewrite_node(
        &mut self,
        id: &NodeId,
        f: &mut dyn FnMut(&Reference) -> Option<Reference>,
    ) -> usize {
        let scanner = Arc::clone(&self.scanner);
        match self.nodes.get_mut(id) {
            Some(node) => scanner.rewrite(&mut Arc::make_mut(node).properties, f),
            None => 0,
        }
    }
}

/// First of `base`, `base{sep}2`, `base{sep}3`, ... not rejected by `taken`
fn unique(base: &str, separator: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}{}", base, separator, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
