//! Class layout: field offsets and vtable slots.
//!
//! Runs after declaration resolution, parents first and memoized. Inherited
//! fields keep their parent-assigned indices and own fields append after
//! them; word 0 of every object is the vtable pointer, so field *i* lives at
//! byte offset `(1 + i) * 4`. The method table starts as a copy of the
//! parent's, implemented interface prototypes claim slots next, and own
//! methods either replace the slot they override or append at the next dense
//! index. The vtable lists, per slot, the label of the most-derived
//! definition.

use crate::registry::{DeclId, DeclInfo, Registry};
use rustc_hash::FxHashMap;

/// Bytes per word; field and slot indices scale by this.
pub const WORD_SIZE: i32 = 4;

/// One vtable slot: the method name and the label of the most-derived
/// definition active at this slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSlot {
    pub name: String,
    pub label: String,
}

/// Layout of a single class, inherited members included.
#[derive(Debug, Clone, Default)]
pub struct ClassLayout {
    /// Number of fields, inherited ones included; excludes the vtable word.
    pub field_count: u32,
    field_index: FxHashMap<String, u32>,
    /// Dense method table; index is the vtable slot.
    pub methods: Vec<MethodSlot>,
    slot_index: FxHashMap<String, u32>,
}

impl ClassLayout {
    /// 0-based field index, if the class (or an ancestor) declares `name`.
    pub fn field_index(&self, name: &str) -> Option<u32> {
        self.field_index.get(name).copied()
    }

    /// Byte offset of a field within the object; word 0 is the vtable.
    pub fn field_offset(&self, name: &str) -> Option<i32> {
        self.field_index(name)
            .map(|i| (1 + i as i32) * WORD_SIZE)
    }

    /// Vtable slot of a method, if the class dispatches `name`.
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.slot_index.get(name).copied()
    }

    /// Object size in bytes: all fields plus the vtable word.
    pub fn object_size(&self) -> i32 {
        (1 + self.field_count as i32) * WORD_SIZE
    }

    /// The vtable labels in slot order.
    pub fn vtable(&self) -> Vec<String> {
        self.methods.iter().map(|m| m.label.clone()).collect()
    }

    fn add_field(&mut self, name: &str) {
        let index = self.field_count;
        self.field_index.insert(name.to_string(), index);
        self.field_count += 1;
    }

    fn place_method(&mut self, name: &str, label: String) {
        match self.slot_index.get(name) {
            Some(&slot) => {
                // Overriding replaces the inherited slot in place.
                self.methods[slot as usize] = MethodSlot {
                    name: name.to_string(),
                    label,
                };
            }
            None => {
                let slot = self.methods.len() as u32;
                self.slot_index.insert(name.to_string(), slot);
                self.methods.push(MethodSlot {
                    name: name.to_string(),
                    label,
                });
            }
        }
    }
}

/// Layouts for every class in the program.
#[derive(Debug, Default)]
pub struct Layouts {
    classes: FxHashMap<DeclId, ClassLayout>,
}

impl Layouts {
    pub fn of(&self, class: DeclId) -> &ClassLayout {
        &self.classes[&class]
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Compute layouts for all classes, parents before children.
pub fn build_layouts(registry: &Registry) -> Layouts {
    let mut layouts = Layouts::default();
    for i in 0..registry.decl_count() {
        let id = DeclId(i as u32);
        if matches!(registry.get(id), DeclInfo::Class(_)) {
            layout_class(registry, id, &mut layouts);
        }
    }
    layouts
}

fn layout_class(registry: &Registry, id: DeclId, layouts: &mut Layouts) {
    if layouts.classes.contains_key(&id) {
        return;
    }

    let info = registry.class(id);

    // Start from the parent's layout so inherited offsets and slots hold.
    let mut layout = match info.extends {
        Some(parent) => {
            layout_class(registry, parent, layouts);
            layouts.classes[&parent].clone()
        }
        None => ClassLayout::default(),
    };

    // Implemented interface prototypes claim slots before own methods, so a
    // method implementing a prototype lands on the slot the interface view
    // of the object dispatches through.
    for &iface in &info.implements {
        for &proto in &registry.iface(iface).methods {
            let name = &registry.func(proto).name;
            if layout.slot_of(name).is_none() {
                layout.place_method(name, format!("_{}.{}", info.name, name));
            }
        }
    }

    for &field in &info.fields {
        layout.add_field(&registry.var(field).name);
    }

    for &method in &info.methods {
        let name = &registry.func(method).name;
        layout.place_method(name, format!("_{}.{}", info.name, name));
    }

    layouts.classes.insert(id, layout);
}
