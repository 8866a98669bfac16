//! Static description of which kinds make up each composition root and how
//! their rows reference one another.
//!
//! The table is validated once at construction. A descriptor that exists is
//! acyclic, every local foreign key targets a sibling kind of the same root,
//! and each root carries a clone order in which referenced kinds come first.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::{EntityKind, TemplateType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("Kind {kind} is declared more than once")]
    DuplicateKind { kind: EntityKind },

    #[error("Child kind {kind} belongs to {root}, which is not a declared root")]
    UnknownRoot { kind: EntityKind, root: EntityKind },

    #[error("Column {column} of {kind} references {references}, which is not a child of the same root")]
    UnknownReference {
        kind: EntityKind,
        column: String,
        references: EntityKind,
    },

    #[error("Column {column} of {kind} references its own kind")]
    SelfReference { kind: EntityKind, column: String },

    #[error("Local references form a cycle among {kinds:?}")]
    Cycle { kinds: Vec<EntityKind> },
}

/// A foreign key from a child row to another child kind of the same root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFk {
    pub column: String,
    pub references: EntityKind,
}

/// Adjustment applied to a root's merged attributes when cloning
#[derive(Debug, Clone, PartialEq)]
pub enum CloneRule {
    /// Always overwrite the attribute, whatever the caller sent
    Force { attribute: String, value: Value },
    /// When the caller left it unset, derive it from the source by bumping its integer suffix
    IncrementSuffix { attribute: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootDescriptor {
    pub kind: EntityKind,
    /// Attribute naming the container the root lives in (library, account)
    pub container_column: String,
    pub container_kind: EntityKind,
    /// Attributes copied from the source when the caller leaves them unset
    pub inheritable: Vec<String>,
    pub rules: Vec<CloneRule>,
}

impl RootDescriptor {
    pub fn new(kind: EntityKind, container_kind: EntityKind) -> Self {
        Self {
            kind,
            container_column: container_kind.fk_column(),
            container_kind,
            inheritable: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn inherit(mut self, attributes: &[&str]) -> Self {
        self.inheritable
            .extend(attributes.iter().map(|a| a.to_string()));
        self
    }

    pub fn rule(mut self, rule: CloneRule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildDescriptor {
    pub kind: EntityKind,
    pub root: EntityKind,
    /// Column that always points at the owning root instance
    pub root_fk: String,
    pub local_fks: Vec<LocalFk>,
    /// Plain attributes the typed record declares; clones carry every stored attribute
    pub attributes: Vec<String>,
}

impl ChildDescriptor {
    pub fn new(kind: EntityKind, root: EntityKind) -> Self {
        Self {
            kind,
            root,
            root_fk: root.fk_column(),
            local_fks: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Declare a local foreign key named after the referenced kind (`program_voice_id`)
    pub fn references(self, kind: EntityKind) -> Self {
        let column = kind.fk_column();
        self.local(&column, kind)
    }

    pub fn local(mut self, column: &str, references: EntityKind) -> Self {
        self.local_fks.push(LocalFk {
            column: column.to_string(),
            references,
        });
        self
    }

    pub fn attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes
            .extend(attributes.iter().map(|a| a.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    roots: HashMap<EntityKind, RootDescriptor>,
    children: HashMap<EntityKind, ChildDescriptor>,
    /// Child kinds per root, local-FK targets first
    orders: HashMap<EntityKind, Vec<EntityKind>>,
}

impl SchemaDescriptor {
    /// Validate the table and compute clone orders
    pub fn new(
        roots: Vec<RootDescriptor>,
        children: Vec<ChildDescriptor>,
    ) -> Result<Self, DescriptorError> {
        let mut root_map = HashMap::new();
        for root in roots {
            if root_map.contains_key(&root.kind) {
                return Err(DescriptorError::DuplicateKind { kind: root.kind });
            }
            root_map.insert(root.kind, root);
        }

        // declaration order per root, used to break ties deterministically
        let mut declared: HashMap<EntityKind, Vec<EntityKind>> = HashMap::new();
        let mut child_map = HashMap::new();
        for child in children {
            if root_map.contains_key(&child.kind) || child_map.contains_key(&child.kind) {
                return Err(DescriptorError::DuplicateKind { kind: child.kind });
            }
            if !root_map.contains_key(&child.root) {
                return Err(DescriptorError::UnknownRoot {
                    kind: child.kind,
                    root: child.root,
                });
            }
            declared.entry(child.root).or_default().push(child.kind);
            child_map.insert(child.kind, child);
        }

        for child in child_map.values() {
            for fk in &child.local_fks {
                if fk.references == child.kind {
                    return Err(DescriptorError::SelfReference {
                        kind: child.kind,
                        column: fk.column.clone(),
                    });
                }
                let same_root = child_map
                    .get(&fk.references)
                    .map(|target: &ChildDescriptor| target.root == child.root)
                    .unwrap_or(false);
                if !same_root {
                    return Err(DescriptorError::UnknownReference {
                        kind: child.kind,
                        column: fk.column.clone(),
                        references: fk.references,
                    });
                }
            }
        }

        let mut orders = HashMap::new();
        for root in root_map.keys() {
            let kinds = declared.remove(root).unwrap_or_default();
            let order = topological_order(&kinds, &child_map)?;
            orders.insert(*root, order);
        }

        Ok(Self {
            roots: root_map,
            children: child_map,
            orders,
        })
    }

    /// The hub's content schema: programs, instruments and templates
    pub fn standard() -> Result<Self, DescriptorError> {
        use EntityKind::*;

        let roots = vec![
            RootDescriptor::new(Program, Library).inherit(&[
                "library_id",
                "type",
                "state",
                "name",
                "key",
                "tempo",
                "density",
                "config",
            ]),
            RootDescriptor::new(Instrument, Library).inherit(&[
                "library_id",
                "type",
                "mode",
                "state",
                "name",
                "density",
                "volume",
                "config",
            ]),
            // cloned templates are always previews and get a fresh ship key
            RootDescriptor::new(Template, Account)
                .inherit(&["account_id", "name", "config"])
                .rule(CloneRule::Force {
                    attribute: "type".to_string(),
                    value: serde_json::json!(TemplateType::Preview),
                })
                .rule(CloneRule::IncrementSuffix {
                    attribute: "ship_key".to_string(),
                }),
        ];

        let children = vec![
            ChildDescriptor::new(ProgramMeme, Program).attributes(&["name"]),
            ChildDescriptor::new(ProgramVoice, Program).attributes(&["type", "name", "order"]),
            ChildDescriptor::new(ProgramVoiceTrack, Program)
                .references(ProgramVoice)
                .attributes(&["name", "order"]),
            ChildDescriptor::new(ProgramSequence, Program)
                .attributes(&["name", "key", "density", "total"]),
            ChildDescriptor::new(ProgramSequenceChord, Program)
                .references(ProgramSequence)
                .attributes(&["name", "position"]),
            ChildDescriptor::new(ProgramSequenceChordVoicing, Program)
                .references(ProgramSequenceChord)
                .references(ProgramVoice)
                .attributes(&["notes"]),
            ChildDescriptor::new(ProgramSequenceBinding, Program)
                .references(ProgramSequence)
                .attributes(&["offset"]),
            ChildDescriptor::new(ProgramSequenceBindingMeme, Program)
                .references(ProgramSequenceBinding)
                .attributes(&["name"]),
            ChildDescriptor::new(ProgramSequencePattern, Program)
                .references(ProgramSequence)
                .references(ProgramVoice)
                .attributes(&["type", "name", "total"]),
            ChildDescriptor::new(ProgramSequencePatternEvent, Program)
                .references(ProgramSequencePattern)
                .references(ProgramVoiceTrack)
                .attributes(&["position", "duration", "tones", "velocity"]),
            ChildDescriptor::new(InstrumentMeme, Instrument).attributes(&["name"]),
            ChildDescriptor::new(InstrumentAudio, Instrument).attributes(&[
                "name",
                "waveform_key",
                "transient_seconds",
                "loop_beats",
                "tempo",
                "intensity",
                "event",
                "tones",
                "volume",
            ]),
            // target_id points outside the template graph and is copied as-is
            ChildDescriptor::new(TemplateBinding, Template).attributes(&["type", "target_id"]),
        ];

        Self::new(roots, children)
    }

    pub fn root(&self, kind: EntityKind) -> Option<&RootDescriptor> {
        self.roots.get(&kind)
    }

    pub fn child(&self, kind: EntityKind) -> Option<&ChildDescriptor> {
        self.children.get(&kind)
    }

    pub fn is_root(&self, kind: EntityKind) -> bool {
        self.roots.contains_key(&kind)
    }

    /// Root kinds, sorted
    pub fn roots(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.roots.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Child kinds of `root` in dependency order; empty for non-roots
    pub fn clone_order(&self, root: EntityKind) -> &[EntityKind] {
        self.orders.get(&root).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Child descriptors of `root`, in the order they must be cloned
    pub fn children_in_order(&self, root: EntityKind) -> impl Iterator<Item = &ChildDescriptor> + '_ {
        self.clone_order(root)
            .iter()
            .filter_map(|kind| self.children.get(kind))
    }

    /// Position of a child kind in its root's clone order
    pub fn rank(&self, kind: EntityKind) -> Option<usize> {
        let child = self.children.get(&kind)?;
        self.clone_order(child.root).iter().position(|k| *k == kind)
    }
}

/// Kahn's algorithm over local-FK edges, always taking the earliest-declared ready kind
fn topological_order(
    kinds: &[EntityKind],
    children: &HashMap<EntityKind, ChildDescriptor>,
) -> Result<Vec<EntityKind>, DescriptorError> {
    let mut pending: HashMap<EntityKind, HashSet<EntityKind>> = kinds
        .iter()
        .map(|kind| {
            let deps = children[kind]
                .local_fks
                .iter()
                .map(|fk| fk.references)
                .collect();
            (*kind, deps)
        })
        .collect();

    let mut order = Vec::with_capacity(kinds.len());
    while order.len() < kinds.len() {
        let ready = kinds
            .iter()
            .find(|kind| pending.get(*kind).map(HashSet::is_empty).unwrap_or(false))
            .copied();

        let Some(next) = ready else {
            let mut stuck: Vec<EntityKind> = pending.keys().copied().collect();
            stuck.sort();
            return Err(DescriptorError::Cycle { kinds: stuck });
        };

        pending.remove(&next);
        for deps in pending.values_mut() {
            deps.remove(&next);
        }
        order.push(next);
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use EntityKind::*;

    #[test]
    fn test_standard_descriptor_orders_references_first() {
        let descriptor = SchemaDescriptor::standard().unwrap();

        for root in descriptor.roots() {
            let order = descriptor.clone_order(root);
            for (position, kind) in order.iter().enumerate() {
                let child = descriptor.child(*kind).unwrap();
                assert_eq!(child.root, root);
                for fk in &child.local_fks {
                    let target = order.iter().position(|k| *k == fk.references).unwrap();
                    assert!(target < position, "{} must precede {}", fk.references, kind);
                }
            }
        }
    }

    #[test]
    fn test_standard_program_order_follows_declaration() {
        let descriptor = SchemaDescriptor::standard().unwrap();
        assert_eq!(
            descriptor.clone_order(Program),
            &[
                ProgramMeme,
                ProgramVoice,
                ProgramVoiceTrack,
                ProgramSequence,
                ProgramSequenceChord,
                ProgramSequenceChordVoicing,
                ProgramSequenceBinding,
                ProgramSequenceBindingMeme,
                ProgramSequencePattern,
                ProgramSequencePatternEvent,
            ]
        );
        assert_eq!(descriptor.clone_order(Instrument), &[InstrumentMeme, InstrumentAudio]);
        assert_eq!(descriptor.clone_order(Template), &[TemplateBinding]);
        assert!(descriptor.clone_order(ProgramVoice).is_empty());
        assert_eq!(descriptor.rank(ProgramSequencePatternEvent), Some(9));
        assert_eq!(descriptor.rank(Program), None);
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        // dependents declared before what they reference still sort correctly
        let descriptor = SchemaDescriptor::new(
            vec![RootDescriptor::new(Program, Library)],
            vec![
                ChildDescriptor::new(ProgramSequencePatternEvent, Program)
                    .references(ProgramSequencePattern)
                    .references(ProgramVoiceTrack),
                ChildDescriptor::new(ProgramSequencePattern, Program)
                    .references(ProgramVoice),
                ChildDescriptor::new(ProgramVoiceTrack, Program).references(ProgramVoice),
                ChildDescriptor::new(ProgramVoice, Program),
            ],
        )
        .unwrap();

        assert_eq!(
            descriptor.clone_order(Program),
            &[
                ProgramVoice,
                ProgramSequencePattern,
                ProgramVoiceTrack,
                ProgramSequencePatternEvent,
            ]
        );
    }

    #[test]
    fn test_cycle_is_a_construction_error() {
        let err = SchemaDescriptor::new(
            vec![RootDescriptor::new(Program, Library)],
            vec![
                ChildDescriptor::new(ProgramMeme, Program),
                ChildDescriptor::new(ProgramVoice, Program).references(ProgramVoiceTrack),
                ChildDescriptor::new(ProgramVoiceTrack, Program).references(ProgramVoice),
            ],
        )
        .unwrap_err();

        assert_eq!(
            err,
            DescriptorError::Cycle {
                kinds: vec![ProgramVoice, ProgramVoiceTrack]
            }
        );
    }

    #[test]
    fn test_reference_across_roots_is_rejected() {
        let err = SchemaDescriptor::new(
            vec![
                RootDescriptor::new(Program, Library),
                RootDescriptor::new(Instrument, Library),
            ],
            vec![
                ChildDescriptor::new(InstrumentAudio, Instrument),
                ChildDescriptor::new(ProgramVoice, Program).references(InstrumentAudio),
            ],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DescriptorError::UnknownReference {
                kind: ProgramVoice,
                references: InstrumentAudio,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_tables_are_rejected() {
        let self_ref = SchemaDescriptor::new(
            vec![RootDescriptor::new(Program, Library)],
            vec![ChildDescriptor::new(ProgramVoice, Program).references(ProgramVoice)],
        );
        assert!(matches!(self_ref, Err(DescriptorError::SelfReference { .. })));

        let orphan = SchemaDescriptor::new(
            vec![],
            vec![ChildDescriptor::new(ProgramVoice, Program)],
        );
        assert!(matches!(orphan, Err(DescriptorError::UnknownRoot { .. })));

        let twice = SchemaDescriptor::new(
            vec![RootDescriptor::new(Program, Library)],
            vec![
                ChildDescriptor::new(ProgramVoice, Program),
                ChildDescriptor::new(ProgramVoice, Program),
            ],
        );
        assert_eq!(
            twice.unwrap_err(),
            DescriptorError::DuplicateKind { kind: ProgramVoice }
        );
    }
}
