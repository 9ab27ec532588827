use std::collections::HashMap;

use super::{Applied, Builtin, FunctionContext, add, empty, has_min_args, ok};
use crate::evaluator::EvalError;
use crate::value::Value;

pub(super) fn register(map: &mut HashMap<&'static str, Builtin>) {
    add(map, "set", "Usage: ${set(entity, propertyKey, value, ...)}. Example: ${set(this, 'name', 'New name')}", func_set);
    add(map, "keys", "Usage: ${keys(entity)}. Example: ${keys(this)}", func_keys);
    add(map, "find", "Usage: ${find(type[, key, value, ...])}. Example: ${find('User', 'email', this.email)}", func_find);
    add(map, "create", "Usage: ${create(type[, key, value, ...])}. Example: ${create('Note', 'text', 'hello')}", func_create);
    add(map, "delete", "Usage: ${delete(entities...)}. Example: ${delete(first(find('Note')))}", func_delete);
    add(map, "merge_properties", "Usage: ${merge_properties(source, target[, keys...])}. Example: ${merge_properties(this, data, 'name')}", func_merge_properties);
}

/// Write one or more properties on an entity. Mutation is immediate and
/// not isolated: a later failure does not roll back earlier writes.
fn func_set(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 3) {
        return empty();
    }
    let Value::Entity(entity) = &args[0] else {
        return empty();
    };
    for pair in args[1..].chunks(2) {
        let [key, value] = pair else {
            return empty();
        };
        entity
            .set_property(&key.string_form(), value.clone())
            .map_err(|message| EvalError::Collaborator { message })?;
    }
    empty()
}

fn func_keys(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let Value::Entity(entity) = &args[0] else {
        return empty();
    };
    let mut keys = entity.property_keys();
    keys.sort();
    ok(Value::List(keys.into_iter().map(Value::String).collect()))
}

/// Look up entities of a type, optionally filtered by key/value pairs.
///
/// Every search key must exist in the type's schema and be indexed;
/// violating that precondition raises the 400-class error instead of
/// silently returning nothing.
fn func_find(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let requested = args[0].string_form();
    let Some(type_name) = fc.ctx.app().entity_type(&requested) else {
        return empty();
    };

    let mut filters = Vec::new();
    for pair in args[1..].chunks(2) {
        let [key, value] = pair else {
            return empty();
        };
        let json_name = key.string_form();
        let property = fc.ctx.app().property_key(&type_name, &json_name);
        match property {
            Some(p) if p.indexed => filters.push((p.json_name, value.clone())),
            _ => {
                return Err(EvalError::InvalidSearchKey {
                    key: json_name,
                    type_name,
                });
            }
        }
    }

    let found = fc
        .ctx
        .app()
        .find(&type_name, &filters)
        .map_err(|message| EvalError::Collaborator { message })?;
    ok(Value::List(found.into_iter().map(Value::Entity).collect()))
}

/// Create an entity with the given properties.
///
/// Unlike the lenient builtins, invalid type usage raises: creating an
/// entity of the evaluating entity's own type would let lifecycle
/// expressions recurse without bound, and an unknown type or property key
/// means the expression disagrees with the schema.
fn func_create(fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 1) {
        return empty();
    }
    let requested = args[0].string_form();
    let Some(type_name) = fc.ctx.app().entity_type(&requested) else {
        return Err(EvalError::TypeViolation {
            message: format!("create(): unknown type '{}'", requested),
        });
    };

    if let Some(entity) = fc.entity {
        if entity.type_name() == type_name {
            return Err(EvalError::TypeViolation {
                message: format!(
                    "create(): cannot create an entity of the evaluating entity's own type '{}'",
                    type_name
                ),
            });
        }
    }

    let mut properties = Vec::new();
    for pair in args[1..].chunks(2) {
        let [key, value] = pair else {
            return empty();
        };
        let json_name = key.string_form();
        match fc.ctx.app().property_key(&type_name, &json_name) {
            Some(p) => properties.push((p.json_name, value.clone())),
            None => {
                return Err(EvalError::InvalidSearchKey {
                    key: json_name,
                    type_name,
                });
            }
        }
    }

    let created = fc
        .ctx
        .app()
        .create(&type_name, properties)
        .map_err(|message| EvalError::Collaborator { message })?;
    ok(Value::Entity(created))
}

/// Delete every entity argument; non-entity arguments are ignored. Lists
/// of entities are accepted so `delete(find('Note'))` works.
fn func_delete(fc: &FunctionContext, args: &[Value]) -> Applied {
    if args.is_empty() {
        return empty();
    }
    for arg in args {
        match arg {
            Value::Entity(entity) => {
                fc.ctx
                    .app()
                    .delete(&std::rc::Rc::clone(entity))
                    .map_err(|message| EvalError::Collaborator { message })?;
            }
            Value::List(items) => {
                for item in items {
                    if let Value::Entity(entity) = item {
                        fc.ctx
                            .app()
                            .delete(&std::rc::Rc::clone(entity))
                            .map_err(|message| EvalError::Collaborator { message })?;
                    }
                }
            }
            _ => {}
        }
    }
    empty()
}

/// Copy property values from a source entity onto a target entity. With
/// no explicit keys, every source key is copied.
fn func_merge_properties(_fc: &FunctionContext, args: &[Value]) -> Applied {
    if !has_min_args(args, 2) {
        return empty();
    }
    let (Value::Entity(source), Value::Entity(target)) = (&args[0], &args[1]) else {
        return empty();
    };
    let keys: Vec<String> = if args.len() > 2 {
        args[2..].iter().map(|k| k.string_form()).collect()
    } else {
        source.property_keys()
    };
    for key in keys {
        if let Some(value) = source.get_property(&key) {
            target
                .set_property(&key, value)
                .map_err(|message| EvalError::Collaborator { message })?;
        }
    }
    empty()
}
