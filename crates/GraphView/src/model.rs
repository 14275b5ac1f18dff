//! # Graphic Graph
//!
//! The graph the renderer draws: nodes, edges and sprites stored in flat
//! `SlotMap` arenas, each tagged with a string id and a style group.
//!
//! This is the renderer's view of the graph, not a general graph library. It
//! keeps exactly what drawing needs (positions, labels, dynamic attributes,
//! active events, style groups) and a `changed` flag that drives repaints.

use std::collections::HashMap;

use bitflags::bitflags;
use glam::{DVec2, DVec3, Vec4};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

use crate::error::CanvasError;
use crate::metrics::Units;
use crate::style::{FillMode, IconMode, SizeMode, Style, StyleGroup};

new_key_type! {
    /// Unique identifier for a Node.
    pub struct NodeKey;
    /// Unique identifier for an Edge.
    pub struct EdgeKey;
    /// Unique identifier for a Sprite.
    pub struct SpriteKey;
    /// Unique identifier for a Style Group.
    pub struct StyleGroupKey;
}

bitflags! {
    /// Boolean states of an element.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// The element is not rendered.
        const HIDDEN = 1 << 0;
        /// The node has been given a position.
        const POSITIONED = 1 << 1;
    }
}

impl Serialize for ElementFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ElementFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// Any drawable element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Node(NodeKey),
    Edge(EdgeKey),
    Sprite(SpriteKey),
}

/// Value of an element's `color` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColorAttr {
    /// Position along the group's fill colours, `0.0..=1.0`.
    Value(f64),
    /// An explicit colour.
    Color(Vec4),
}

/// Per-element attributes read by dynamic styles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub size: Option<f64>,
    pub color: Option<ColorAttr>,
    pub icon: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GraphicNode {
    pub id: String,
    /// Graph-space position.
    pub position: DVec3,
    pub label: Option<String>,
    pub flags: ElementFlags,
    pub attributes: Attributes,
    /// Active interaction events (e.g. `clicked`).
    pub events: Vec<String>,
    pub group: StyleGroupKey,
}

#[derive(Clone, Debug)]
pub struct GraphicEdge {
    pub id: String,
    pub from: NodeKey,
    pub to: NodeKey,
    pub directed: bool,
    /// Cubic Bezier control points in graph space, for curved edges.
    pub control_points: Option<[DVec2; 2]>,
    pub label: Option<String>,
    pub flags: ElementFlags,
    pub attributes: Attributes,
    pub events: Vec<String>,
    pub group: StyleGroupKey,
}

/// What a sprite's position is relative to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteAttachment {
    /// `position` is absolute, in the sprite's units.
    Free,
    /// `position.x` is a radius and `position.z` an angle in degrees around the node.
    Node(NodeKey),
    /// `position.x` is the fraction along the edge, `position.y` a side offset.
    Edge(EdgeKey),
}

#[derive(Clone, Debug)]
pub struct GraphicSprite {
    pub id: String,
    pub position: DVec3,
    pub units: Units,
    pub attachment: SpriteAttachment,
    pub label: Option<String>,
    pub flags: ElementFlags,
    pub attributes: Attributes,
    pub events: Vec<String>,
    pub group: StyleGroupKey,
}

/// Borrowed view of the fields every element kind shares.
#[derive(Clone, Copy, Debug)]
pub struct ElementRef<'a> {
    pub key: ElementKey,
    pub id: &'a str,
    pub label: Option<&'a str>,
    pub flags: ElementFlags,
    pub attributes: &'a Attributes,
    pub events: &'a [String],
    pub group: StyleGroupKey,
}

impl ElementRef<'_> {
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ElementFlags::HIDDEN)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Elements of one style group, split by how they are styled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupElements {
    /// Elements drawn with the group style alone.
    pub bulk: Vec<ElementKey>,
    /// Elements carrying an attribute the group styles dynamically.
    pub dynamic: Vec<ElementKey>,
    /// Elements with active events.
    pub event: Vec<ElementKey>,
}

/// The entire state of the graph.
#[derive(Clone, Debug)]
pub struct GraphicGraph {
    nodes: SlotMap<NodeKey, GraphicNode>,
    edges: SlotMap<EdgeKey, GraphicEdge>,
    sprites: SlotMap<SpriteKey, GraphicSprite>,
    groups: SlotMap<StyleGroupKey, StyleGroup>,
    /// Style of the graph itself (background, border, padding).
    style: Style,
    /// Insertion order of all elements.
    order: Vec<ElementKey>,
    /// Index for O(1) id lookup.
    id_index: HashMap<String, ElementKey>,
    /// Edges by unordered endpoint pair, in insertion order.
    pair_index: HashMap<(NodeKey, NodeKey), Vec<EdgeKey>>,
    changed: bool,
}

impl Default for GraphicGraph {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            sprites: SlotMap::with_key(),
            groups: SlotMap::with_key(),
            style: Style::graph_default(),
            order: Vec::new(),
            id_index: HashMap::new(),
            pair_index: HashMap::new(),
            changed: true,
        }
    }
}

impl GraphicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
        self.changed = true;
    }

    pub fn add_style_group(&mut self, group: StyleGroup) -> StyleGroupKey {
        self.changed = true;
        self.groups.insert(group)
    }

    pub fn style_group(&self, key: StyleGroupKey) -> Option<&StyleGroup> {
        self.groups.get(key)
    }

    pub fn style_group_mut(&mut self, key: StyleGroupKey) -> Option<&mut StyleGroup> {
        self.changed = true;
        self.groups.get_mut(key)
    }

    /// Style groups in drawing order: by z-index, then by insertion.
    pub fn style_groups_by_z(&self) -> Vec<StyleGroupKey> {
        let mut keys: Vec<StyleGroupKey> = self.groups.keys().collect();
        // Groups are never removed, so slot order is insertion order.
        keys.sort_by_key(|k| self.groups[*k].z_index);
        keys
    }

    fn check_new_element(&self, id: &str, group: StyleGroupKey) -> Result<(), CanvasError> {
        if id.is_empty() {
            return Err(CanvasError::EmptyElementId);
        }
        if self.id_index.contains_key(id) {
            return Err(CanvasError::DuplicateElement(id.to_string()));
        }
        if !self.groups.contains_key(group) {
            return Err(CanvasError::UnknownStyleGroup);
        }
        Ok(())
    }

    fn register(&mut self, id: String, key: ElementKey) {
        self.id_index.insert(id, key);
        self.order.push(key);
        self.changed = true;
    }

    /// Adds a positioned node.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        group: StyleGroupKey,
        position: DVec3,
    ) -> Result<NodeKey, CanvasError> {
        let id = id.into();
        self.check_new_element(&id, group)?;
        let key = self.nodes.insert(GraphicNode {
            id: id.clone(),
            position,
            label: None,
            flags: ElementFlags::POSITIONED,
            attributes: Attributes::default(),
            events: Vec::new(),
            group,
        });
        self.register(id, ElementKey::Node(key));
        Ok(key)
    }

    pub fn add_edge(
        &mut self,
        id: impl Into<String>,
        from: NodeKey,
        to: NodeKey,
        directed: bool,
        group: StyleGroupKey,
    ) -> Result<EdgeKey, CanvasError> {
        let id = id.into();
        self.check_new_element(&id, group)?;
        for node in [from, to] {
            if !self.nodes.contains_key(node) {
                return Err(CanvasError::UnknownElement(format!("{node:?}")));
            }
        }
        let key = self.edges.insert(GraphicEdge {
            id: id.clone(),
            from,
            to,
            directed,
            control_points: None,
            label: None,
            flags: ElementFlags::empty(),
            attributes: Attributes::default(),
            events: Vec::new(),
            group,
        });
        self.pair_index.entry(endpoint_pair(from, to)).or_default().push(key);
        self.register(id, ElementKey::Edge(key));
        Ok(key)
    }

    /// Adds a free sprite at `position`, expressed in `units`.
    pub fn add_sprite(
        &mut self,
        id: impl Into<String>,
        group: StyleGroupKey,
        position: DVec3,
        units: Units,
    ) -> Result<SpriteKey, CanvasError> {
        let id = id.into();
        self.check_new_element(&id, group)?;
        let key = self.sprites.insert(GraphicSprite {
            id: id.clone(),
            position,
            units,
            attachment: SpriteAttachment::Free,
            label: None,
            flags: ElementFlags::empty(),
            attributes: Attributes::default(),
            events: Vec::new(),
            group,
        });
        self.register(id, ElementKey::Sprite(key));
        Ok(key)
    }

    pub fn attach_sprite_to_node(&mut self, sprite: SpriteKey, node: NodeKey) -> Result<(), CanvasError> {
        if !self.nodes.contains_key(node) {
            return Err(CanvasError::UnknownElement(format!("{node:?}")));
        }
        self.set_attachment(sprite, SpriteAttachment::Node(node))
    }

    pub fn attach_sprite_to_edge(&mut self, sprite: SpriteKey, edge: EdgeKey) -> Result<(), CanvasError> {
        if !self.edges.contains_key(edge) {
            return Err(CanvasError::UnknownElement(format!("{edge:?}")));
        }
        self.set_attachment(sprite, SpriteAttachment::Edge(edge))
    }

    pub fn detach_sprite(&mut self, sprite: SpriteKey) -> Result<(), CanvasError> {
        self.set_attachment(sprite, SpriteAttachment::Free)
    }

    fn set_attachment(&mut self, sprite: SpriteKey, attachment: SpriteAttachment) -> Result<(), CanvasError> {
        let s = self
            .sprites
            .get_mut(sprite)
            .ok_or_else(|| CanvasError::UnknownElement(format!("{sprite:?}")))?;
        s.attachment = attachment;
        self.changed = true;
        Ok(())
    }

    pub fn set_control_points(&mut self, edge: EdgeKey, points: Option<[DVec2; 2]>) -> Result<(), CanvasError> {
        let e = self
            .edges
            .get_mut(edge)
            .ok_or_else(|| CanvasError::UnknownElement(format!("{edge:?}")))?;
        e.control_points = points;
        self.changed = true;
        Ok(())
    }

    /// Moves a node or a sprite. Nodes become positioned; edges ignore moves.
    pub fn move_element(&mut self, key: ElementKey, position: DVec3) -> Result<(), CanvasError> {
        match key {
            ElementKey::Node(k) => {
                let node = self
                    .nodes
                    .get_mut(k)
                    .ok_or_else(|| CanvasError::UnknownElement(format!("{k:?}")))?;
                node.position = position;
                node.flags.insert(ElementFlags::POSITIONED);
            }
            ElementKey::Sprite(k) => {
                let sprite = self
                    .sprites
                    .get_mut(k)
                    .ok_or_else(|| CanvasError::UnknownElement(format!("{k:?}")))?;
                sprite.position = position;
            }
            ElementKey::Edge(_) => return Ok(()),
        }
        self.changed = true;
        Ok(())
    }

    pub fn set_label(&mut self, key: ElementKey, label: impl Into<String>) -> Result<(), CanvasError> {
        let label = label.into();
        self.with_common(key, |c| *c.label = Some(label))
    }

    pub fn set_hidden(&mut self, key: ElementKey, hidden: bool) -> Result<(), CanvasError> {
        self.with_common(key, |c| c.flags.set(ElementFlags::HIDDEN, hidden))
    }

    /// Replaces the dynamic attributes of an element.
    pub fn set_attributes(&mut self, key: ElementKey, attributes: Attributes) -> Result<(), CanvasError> {
        self.with_common(key, |c| *c.attributes = attributes)
    }

    /// Activates an interaction event on an element.
    pub fn push_event(&mut self, key: ElementKey, event: impl Into<String>) -> Result<(), CanvasError> {
        let event = event.into();
        self.with_common(key, |c| {
            if !c.events.contains(&event) {
                c.events.push(event);
            }
        })
    }

    pub fn pop_event(&mut self, key: ElementKey, event: &str) -> Result<(), CanvasError> {
        self.with_common(key, |c| c.events.retain(|e| e != event))
    }

    fn with_common(&mut self, key: ElementKey, f: impl FnOnce(CommonMut<'_>)) -> Result<(), CanvasError> {
        let missing = || CanvasError::UnknownElement(format!("{key:?}"));
        let common = match key {
            ElementKey::Node(k) => {
                let n = self.nodes.get_mut(k).ok_or_else(missing)?;
                CommonMut {
                    label: &mut n.label,
                    flags: &mut n.flags,
                    attributes: &mut n.attributes,
                    events: &mut n.events,
                }
            }
            ElementKey::Edge(k) => {
                let e = self.edges.get_mut(k).ok_or_else(missing)?;
                CommonMut {
                    label: &mut e.label,
                    flags: &mut e.flags,
                    attributes: &mut e.attributes,
                    events: &mut e.events,
                }
            }
            ElementKey::Sprite(k) => {
                let s = self.sprites.get_mut(k).ok_or_else(missing)?;
                CommonMut {
                    label: &mut s.label,
                    flags: &mut s.flags,
                    attributes: &mut s.attributes,
                    events: &mut s.events,
                }
            }
        };
        f(common);
        self.changed = true;
        Ok(())
    }

    fn unregister(&mut self, id: &str, key: ElementKey) {
        self.id_index.remove(id);
        self.order.retain(|k| *k != key);
        self.changed = true;
    }

    /// Removes a node, its edges, and detaches sprites attached to it.
    pub fn remove_node(&mut self, key: NodeKey) -> Option<GraphicNode> {
        let node = self.nodes.remove(key)?;
        let edges: Vec<EdgeKey> = self
            .edges
            .iter()
            .filter(|(_, e)| e.from == key || e.to == key)
            .map(|(k, _)| k)
            .collect();
        for edge in edges {
            self.remove_edge(edge);
        }
        for sprite in self.sprites.values_mut() {
            if sprite.attachment == SpriteAttachment::Node(key) {
                sprite.attachment = SpriteAttachment::Free;
            }
        }
        self.unregister(&node.id, ElementKey::Node(key));
        Some(node)
    }

    /// Removes an edge and detaches sprites attached to it.
    pub fn remove_edge(&mut self, key: EdgeKey) -> Option<GraphicEdge> {
        let edge = self.edges.remove(key)?;
        let pair = endpoint_pair(edge.from, edge.to);
        if let Some(members) = self.pair_index.get_mut(&pair) {
            members.retain(|e| *e != key);
            if members.is_empty() {
                self.pair_index.remove(&pair);
            }
        }
        for sprite in self.sprites.values_mut() {
            if sprite.attachment == SpriteAttachment::Edge(key) {
                sprite.attachment = SpriteAttachment::Free;
            }
        }
        self.unregister(&edge.id, ElementKey::Edge(key));
        Some(edge)
    }

    pub fn remove_sprite(&mut self, key: SpriteKey) -> Option<GraphicSprite> {
        let sprite = self.sprites.remove(key)?;
        self.unregister(&sprite.id, ElementKey::Sprite(key));
        Some(sprite)
    }

    pub fn node(&self, key: NodeKey) -> Option<&GraphicNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut GraphicNode> {
        self.changed = true;
        self.nodes.get_mut(key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<&GraphicEdge> {
        self.edges.get(key)
    }

    pub fn sprite(&self, key: SpriteKey) -> Option<&GraphicSprite> {
        self.sprites.get(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &GraphicNode)> + '_ {
        self.order.iter().filter_map(|k| match k {
            ElementKey::Node(n) => self.nodes.get(*n).map(|node| (*n, node)),
            _ => None,
        })
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &GraphicEdge)> + '_ {
        self.order.iter().filter_map(|k| match k {
            ElementKey::Edge(e) => self.edges.get(*e).map(|edge| (*e, edge)),
            _ => None,
        })
    }

    /// Sprites in insertion order.
    pub fn sprites(&self) -> impl Iterator<Item = (SpriteKey, &GraphicSprite)> + '_ {
        self.order.iter().filter_map(|k| match k {
            ElementKey::Sprite(s) => self.sprites.get(*s).map(|sprite| (*s, sprite)),
            _ => None,
        })
    }

    pub fn find(&self, id: &str) -> Option<ElementKey> {
        self.id_index.get(id).copied()
    }

    pub fn element_id(&self, key: ElementKey) -> Option<&str> {
        self.element(key).map(|e| e.id)
    }

    pub fn element(&self, key: ElementKey) -> Option<ElementRef<'_>> {
        let r = match key {
            ElementKey::Node(k) => {
                let n = self.nodes.get(k)?;
                ElementRef {
                    key,
                    id: &n.id,
                    label: n.label.as_deref(),
                    flags: n.flags,
                    attributes: &n.attributes,
                    events: &n.events,
                    group: n.group,
                }
            }
            ElementKey::Edge(k) => {
                let e = self.edges.get(k)?;
                ElementRef {
                    key,
                    id: &e.id,
                    label: e.label.as_deref(),
                    flags: e.flags,
                    attributes: &e.attributes,
                    events: &e.events,
                    group: e.group,
                }
            }
            ElementKey::Sprite(k) => {
                let s = self.sprites.get(k)?;
                ElementRef {
                    key,
                    id: &s.id,
                    label: s.label.as_deref(),
                    flags: s.flags,
                    attributes: &s.attributes,
                    events: &s.events,
                    group: s.group,
                }
            }
        };
        Some(r)
    }

    /// Style group of an element.
    pub fn group_of(&self, key: ElementKey) -> Option<&StyleGroup> {
        self.element(key).and_then(|e| self.groups.get(e.group))
    }

    /// Bounding box of positioned nodes and free sprites given in graph units.
    pub fn bounds(&self) -> Option<(DVec3, DVec3)> {
        let nodes = self
            .nodes
            .values()
            .filter(|n| n.flags.contains(ElementFlags::POSITIONED))
            .map(|n| n.position);
        let sprites = self
            .sprites
            .values()
            .filter(|s| s.attachment == SpriteAttachment::Free && s.units == Units::Gu)
            .map(|s| s.position);
        nodes
            .chain(sprites)
            .fold(None, |acc: Option<(DVec3, DVec3)>, p| match acc {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }

    fn is_dynamic(&self, element: &ElementRef<'_>, style: &Style) -> bool {
        let attrs = element.attributes;
        (style.size_mode == SizeMode::DynSize && attrs.size.is_some())
            || (style.fill_mode == FillMode::DynPlain && attrs.color.is_some())
            || (style.icon == IconMode::Dynamic && attrs.icon.is_some())
    }

    /// Splits the elements of a group into bulk, dynamic and event subsets, in
    /// insertion order. An element with events is never bulk; it can be both
    /// dynamic and event.
    pub fn group_elements(&self, group: StyleGroupKey) -> GroupElements {
        self.partition_groups().remove(&group).unwrap_or_default()
    }

    /// [`group_elements`](Self::group_elements) for every style group, in one
    /// pass over the elements.
    pub fn partition_groups(&self) -> HashMap<StyleGroupKey, GroupElements> {
        let mut out: HashMap<StyleGroupKey, GroupElements> = HashMap::new();
        for key in &self.order {
            let Some(element) = self.element(*key) else {
                continue;
            };
            let Some(style_group) = self.groups.get(element.group) else {
                continue;
            };
            let dynamic = self.is_dynamic(&element, &style_group.style);
            let split = out.entry(element.group).or_default();
            if dynamic {
                split.dynamic.push(*key);
            }
            if element.has_events() {
                split.event.push(*key);
            }
            if !dynamic && !element.has_events() {
                split.bulk.push(*key);
            }
        }
        out
    }

    /// Parallel edges sharing this edge's endpoints (in either direction),
    /// including the edge itself. `None` unless there are at least two.
    pub fn edge_group(&self, edge: EdgeKey) -> Option<Vec<EdgeKey>> {
        let e = self.edges.get(edge)?;
        let members = self.pair_index.get(&endpoint_pair(e.from, e.to))?;
        (members.len() > 1).then(|| members.clone())
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns the changed flag and clears it.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }
}

struct CommonMut<'a> {
    label: &'a mut Option<String>,
    flags: &'a mut ElementFlags,
    attributes: &'a mut Attributes,
    events: &'a mut Vec<String>,
}

fn endpoint_pair(a: NodeKey, b: NodeKey) -> (NodeKey, NodeKey) {
    if a <= b { (a, b) } else { (b, a) }
}
