//! In-memory backend implementing the collaborator traits.
//!
//! This is the standalone storage the CLI evaluates against and the test
//! suite's double for the application layer. Entities keep their
//! properties in a `RefCell` so mutation works through shared handles.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::context::{Application, Entity, EntityRef, PropertyKey, SecurityContext};
use crate::value::Value;

/// A plain property-map entity.
pub struct MemoryEntity {
    id: String,
    type_name: String,
    properties: RefCell<HashMap<String, Value>>,
    security: SecurityContext,
}

impl MemoryEntity {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        MemoryEntity {
            id: id.into(),
            type_name: type_name.into(),
            properties: RefCell::new(HashMap::new()),
            security: SecurityContext::superuser(),
        }
    }

    pub fn with_property(self, key: impl Into<String>, value: Value) -> Self {
        self.properties.borrow_mut().insert(key.into(), value);
        self
    }

    /// Wrap a string-keyed value map as an entity, e.g. a parsed JSON
    /// document handed to the CLI.
    pub fn from_object(id: impl Into<String>, properties: HashMap<String, Value>) -> Self {
        MemoryEntity {
            id: id.into(),
            type_name: "Document".to_string(),
            properties: RefCell::new(properties),
            security: SecurityContext::superuser(),
        }
    }

    pub fn into_ref(self) -> EntityRef {
        Rc::new(self)
    }
}

impl Entity for MemoryEntity {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn get_property(&self, key: &str) -> Option<Value> {
        self.properties.borrow().get(key).cloned()
    }

    fn set_property(&self, key: &str, value: Value) -> Result<(), String> {
        self.properties.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn property_keys(&self) -> Vec<String> {
        self.properties.borrow().keys().cloned().collect()
    }

    fn security_context(&self) -> SecurityContext {
        self.security.clone()
    }
}

struct TypeDef {
    /// json name -> indexed flag
    keys: HashMap<String, bool>,
}

/// An in-memory application layer: a type schema plus an entity table.
#[derive(Default)]
pub struct MemoryApp {
    types: RefCell<HashMap<String, TypeDef>>,
    entities: RefCell<Vec<Rc<MemoryEntity>>>,
    next_id: Cell<u64>,
}

impl MemoryApp {
    pub fn new() -> Self {
        MemoryApp::default()
    }

    /// Register a type with its property keys and their indexed flags.
    pub fn define_type(&self, name: &str, keys: &[(&str, bool)]) {
        let defined = TypeDef {
            keys: keys
                .iter()
                .map(|(key, indexed)| (key.to_string(), *indexed))
                .collect(),
        };
        self.types.borrow_mut().insert(name.to_string(), defined);
    }

    /// Insert a pre-built entity and return its shared handle.
    pub fn insert(&self, entity: MemoryEntity) -> EntityRef {
        let handle = Rc::new(entity);
        self.entities.borrow_mut().push(Rc::clone(&handle));
        handle
    }

    pub fn entity_count(&self) -> usize {
        self.entities.borrow().len()
    }
}

impl Application for MemoryApp {
    fn entity_type(&self, name: &str) -> Option<String> {
        self.types.borrow().contains_key(name).then(|| name.to_string())
    }

    fn property_key(&self, type_name: &str, json_name: &str) -> Option<PropertyKey> {
        self.types
            .borrow()
            .get(type_name)?
            .keys
            .get(json_name)
            .map(|&indexed| PropertyKey {
                json_name: json_name.to_string(),
                indexed,
            })
    }

    fn find(&self, type_name: &str, filters: &[(String, Value)]) -> Result<Vec<EntityRef>, String> {
        let matches = self
            .entities
            .borrow()
            .iter()
            .filter(|e| e.type_name == type_name)
            .filter(|e| {
                filters.iter().all(|(key, expected)| {
                    e.get_property(key).as_ref() == Some(expected)
                })
            })
            .map(|e| Rc::clone(e) as EntityRef)
            .collect();
        Ok(matches)
    }

    fn create(
        &self,
        type_name: &str,
        properties: Vec<(String, Value)>,
    ) -> Result<EntityRef, String> {
        if !self.types.borrow().contains_key(type_name) {
            return Err(format!("unknown type '{}'", type_name));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let entity = MemoryEntity::new(format!("{}-{}", type_name.to_lowercase(), id), type_name);
        for (key, value) in properties {
            entity.properties.borrow_mut().insert(key, value);
        }
        Ok(self.insert(entity))
    }

    fn delete(&self, entity: &EntityRef) -> Result<(), String> {
        let id = entity.id();
        self.entities.borrow_mut().retain(|e| e.id != id);
        Ok(())
    }
}
