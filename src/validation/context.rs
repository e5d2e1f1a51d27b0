//! Validation Context
//!
//! One forward pass over the records rebuilds the entity hierarchy the flat
//! file describes. Everything downstream only reads the result.

use std::collections::{HashMap, HashSet};

use crate::layout::{PhaseLayout, RecordRole};
use crate::parser::LineRecord;

/// Unique keys in first-insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, returning false if it was already present
    pub fn insert(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string());
        self.items.push(key.to_string());
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// How many records of one type an entity carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTally {
    pub count: usize,
    pub first_line: usize,
}

/// Which class-linkage set a link record feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Person,
    Staff,
}

/// A linkage record pointing at a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLink {
    pub kind: LinkKind,
    pub record_type: String,
    pub class_code: String,
    pub line: usize,
}

/// Everything known about one entity after the builder pass
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAggregate<'a> {
    pub code: String,
    /// Status copied from the first primary record
    pub status: Option<String>,
    primary_line: usize,
    tallies: HashMap<String, RecordTally>,
    /// Declared class codes
    pub classes: OrderedSet,
    class_lines: HashMap<String, usize>,
    /// Repeated class declarations as (class code, line)
    pub duplicate_classes: Vec<(String, usize)>,
    /// Declared classes with at least one linked student
    pub person_linked: OrderedSet,
    /// Declared classes with at least one linked staff member
    pub staff_linked: OrderedSet,
    pub person_link_count: usize,
    pub staff_link_count: usize,
    /// Links whose class was never declared by this entity
    pub unresolved_links: Vec<ClassLink>,
    links: Vec<ClassLink>,
    /// Records of this entity, in file order
    pub records: Vec<&'a LineRecord>,
}

impl<'a> EntityAggregate<'a> {
    fn new(code: &str, status: Option<String>, primary_line: usize) -> Self {
        Self {
            code: code.to_string(),
            status,
            primary_line,
            tallies: HashMap::new(),
            classes: OrderedSet::new(),
            class_lines: HashMap::new(),
            duplicate_classes: Vec::new(),
            person_linked: OrderedSet::new(),
            staff_linked: OrderedSet::new(),
            person_link_count: 0,
            staff_link_count: 0,
            unresolved_links: Vec::new(),
            links: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn has_record(&self, record_type: &str) -> bool {
        self.record_count(record_type) > 0
    }

    pub fn record_count(&self, record_type: &str) -> usize {
        self.tallies.get(record_type).map_or(0, |t| t.count)
    }

    /// Line of the first record of a type, if the entity has one
    pub fn first_line_of(&self, record_type: &str) -> Option<usize> {
        self.tallies.get(record_type).map(|t| t.first_line)
    }

    /// Line where a class was first declared
    pub fn class_line(&self, class_code: &str) -> Option<usize> {
        self.class_lines.get(class_code).copied()
    }

    /// Line of the entity's first primary record
    pub fn line(&self) -> usize {
        self.primary_line
    }

    fn note(&mut self, record: &'a LineRecord) {
        self.tallies
            .entry(record.record_type.clone())
            .and_modify(|t| t.count += 1)
            .or_insert(RecordTally {
                count: 1,
                first_line: record.line,
            });
        self.records.push(record);
    }

    fn declare_class(&mut self, class_code: &str, line: usize) {
        if self.classes.insert(class_code) {
            self.class_lines.insert(class_code.to_string(), line);
        } else {
            self.duplicate_classes.push((class_code.to_string(), line));
        }
    }

    /// Resolve links once every class of the entity is known
    fn resolve_links(&mut self) {
        for link in std::mem::take(&mut self.links) {
            match link.kind {
                LinkKind::Person => self.person_link_count += 1,
                LinkKind::Staff => self.staff_link_count += 1,
            }

            if !self.classes.contains(&link.class_code) {
                self.unresolved_links.push(link);
                continue;
            }

            match link.kind {
                LinkKind::Person => self.person_linked.insert(&link.class_code),
                LinkKind::Staff => self.staff_linked.insert(&link.class_code),
            };
        }
    }
}

/// Entity aggregates keyed by entity code, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMap<'a> {
    entities: Vec<EntityAggregate<'a>>,
    index: HashMap<String, usize>,
}

impl<'a> EntityMap<'a> {
    pub fn get(&self, code: &str) -> Option<&EntityAggregate<'a>> {
        self.index.get(code).map(|&idx| &self.entities[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityAggregate<'a>> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    fn open(&mut self, code: &str, status: Option<String>, line: usize) -> usize {
        if let Some(idx) = self.position(code) {
            return idx;
        }
        let idx = self.entities.len();
        self.entities.push(EntityAggregate::new(code, status, line));
        self.index.insert(code.to_string(), idx);
        idx
    }
}

/// Read-only view of a file shared by all validators
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub layout: &'static PhaseLayout,
    pub records: &'a [LineRecord],
    pub entities: EntityMap<'a>,
    /// Number of primary records, duplicates included
    pub entity_count: usize,
    pub has_terminal: bool,
    /// Non-primary records that could not be attributed to any entity
    pub orphans: Vec<&'a LineRecord>,
    pub raw: Option<&'a [u8]>,
}

/// Builder working state; the current-entity cursor lives here only
struct ContextBuilder<'a> {
    layout: &'static PhaseLayout,
    entities: EntityMap<'a>,
    entity_count: usize,
    has_terminal: bool,
    orphans: Vec<&'a LineRecord>,
    /// Records attributed by key, held until every primary record is known
    keyed: Vec<&'a LineRecord>,
    current: Option<usize>,
}

impl<'a> ContextBuilder<'a> {
    fn new(layout: &'static PhaseLayout) -> Self {
        Self {
            layout,
            entities: EntityMap::default(),
            entity_count: 0,
            has_terminal: false,
            orphans: Vec::new(),
            keyed: Vec::new(),
            current: None,
        }
    }

    fn push(&mut self, record: &'a LineRecord) {
        match self.layout.role_of(&record.record_type) {
            Some(RecordRole::Terminal) => self.has_terminal = true,
            Some(RecordRole::Primary) => self.open_entity(record),
            Some(RecordRole::Secondary) => self.keyed.push(record),
            // Record types outside the layout belong to no entity
            None => self.orphans.push(record),
            Some(role) => match self.current {
                Some(idx) => self.attribute(idx, record, role),
                None => self.orphans.push(record),
            },
        }
    }

    /// Attribute keyed records against the complete entity map
    fn resolve_keyed(&mut self) {
        for record in std::mem::take(&mut self.keyed) {
            let key = record.field(self.layout.key_field).unwrap_or_default();
            match self.entities.position(key) {
                Some(idx) => self.attribute(idx, record, RecordRole::Secondary),
                None => self.orphans.push(record),
            }
        }
        self.orphans.sort_by_key(|record| record.line);
    }

    fn open_entity(&mut self, record: &'a LineRecord) {
        let key = record.field(self.layout.key_field).unwrap_or_default();
        let status = self
            .layout
            .status_field
            .and_then(|idx| record.field(idx))
            .map(str::to_string);

        self.entity_count += 1;
        let idx = self.entities.open(key, status, record.line);
        self.entities.entities[idx].note(record);
        self.current = Some(idx);
    }

    fn attribute(&mut self, idx: usize, record: &'a LineRecord, role: RecordRole) {
        let class_code = self
            .layout
            .record(&record.record_type)
            .and_then(|spec| spec.class_field)
            .and_then(|field| record.field(field))
            .unwrap_or_default();

        let entity = &mut self.entities.entities[idx];
        entity.note(record);

        let link_kind = match role {
            RecordRole::Class => {
                entity.declare_class(class_code, record.line);
                None
            }
            RecordRole::PersonLink => Some(LinkKind::Person),
            RecordRole::StaffLink => Some(LinkKind::Staff),
            _ => None,
        };

        if let Some(kind) = link_kind {
            entity.links.push(ClassLink {
                kind,
                record_type: record.record_type.clone(),
                class_code: class_code.to_string(),
                line: record.line,
            });
        }
    }

    fn finish(mut self, records: &'a [LineRecord], raw: Option<&'a [u8]>) -> ValidationContext<'a> {
        self.resolve_keyed();
        for entity in &mut self.entities.entities {
            entity.records.sort_by_key(|record| record.line);
            entity.resolve_links();
        }

        ValidationContext {
            layout: self.layout,
            records,
            entities: self.entities,
            entity_count: self.entity_count,
            has_terminal: self.has_terminal,
            orphans: self.orphans,
            raw,
        }
    }
}

/// Build the validation context for a phase in one pass over `records`
pub fn build_context<'a>(
    records: &'a [LineRecord],
    layout: &'static PhaseLayout,
    raw: Option<&'a [u8]>,
) -> ValidationContext<'a> {
    let mut builder = ContextBuilder::new(layout);
    for record in records {
        builder.push(record);
    }

    let context = builder.finish(records, raw);
    log::debug!(
        "built {} context: {} records, {} entities ({} primary records), terminal: {}",
        layout.phase,
        records.len(),
        context.entities.len(),
        context.entity_count,
        context.has_terminal
    );
    context
}
