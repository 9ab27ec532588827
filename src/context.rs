use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::value::Value;

/// Shared handle to an entity. Evaluation is single-threaded (one
/// invocation per call stack), so plain reference counting is enough.
pub type EntityRef = Rc<dyn Entity>;

/// The security principal an evaluation runs under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityContext {
    pub user: Option<String>,
    pub super_user: bool,
}

impl SecurityContext {
    pub fn superuser() -> Self {
        SecurityContext {
            user: None,
            super_user: true,
        }
    }
}

/// A graph object the expression language can read and write.
///
/// Mutation goes through `&self`: implementors use interior mutability,
/// which keeps entity handles freely shareable inside an evaluation.
pub trait Entity {
    fn id(&self) -> String;
    fn type_name(&self) -> String;
    fn get_property(&self, key: &str) -> Option<Value>;
    fn set_property(&self, key: &str, value: Value) -> Result<(), String>;
    fn property_keys(&self) -> Vec<String>;
    fn security_context(&self) -> SecurityContext;
}

/// A property key as known to the application's schema, with the
/// predicate `find` needs before it may search on the key.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyKey {
    pub json_name: String,
    pub indexed: bool,
}

/// The application/query layer behind `find`, `create` and `delete`.
///
/// Implementations supply type lookup by name, property-key lookup by
/// JSON name, and the CRUD operations themselves. All errors are plain
/// messages; the builtins wrap them into the structured error channel.
pub trait Application {
    /// Resolve a type name; `None` when the type does not exist.
    fn entity_type(&self, name: &str) -> Option<String>;

    /// Look up a property key of the given type by its JSON name.
    fn property_key(&self, type_name: &str, json_name: &str) -> Option<PropertyKey>;

    fn find(&self, type_name: &str, filters: &[(String, Value)]) -> Result<Vec<EntityRef>, String>;

    fn create(&self, type_name: &str, properties: Vec<(String, Value)>)
        -> Result<EntityRef, String>;

    fn delete(&self, entity: &EntityRef) -> Result<(), String>;
}

/// An outbound mail, plaintext or HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub from_address: String,
    pub from_name: String,
    pub to_address: String,
    pub to_name: String,
    pub subject: String,
    pub content: String,
    pub html: bool,
}

/// Mail transport collaborator. Sending blocks inline with evaluation.
pub trait MailGateway {
    fn send(&self, message: MailMessage) -> Result<(), String>;
}

/// Geocoding collaborator: street, city, country to (latitude, longitude).
pub trait Geocoder {
    fn geocode(&self, street: &str, city: &str, country: &str) -> Option<(f64, f64)>;
}

/// Static evaluation settings.
///
/// `exchange_dir` is the only directory the sandboxed file builtins may
/// touch; caller-supplied filenames are reduced to their base name and
/// resolved inside it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub exchange_dir: PathBuf,
}

impl Settings {
    pub fn new(exchange_dir: impl Into<PathBuf>) -> Self {
        Settings {
            exchange_dir: exchange_dir.into(),
        }
    }

    /// Resolve a caller-supplied filename to a path inside the exchange
    /// directory. Only the base name survives, so traversal segments like
    /// `../` cannot escape the sandbox.
    pub fn exchange_path(&self, filename: &str) -> PathBuf {
        let base = std::path::Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.exchange_dir.join(base)
    }
}

/// Mutable evaluation state shared by a context and all of its scoped
/// children: the key/value store, the counters and the print buffer.
#[derive(Default)]
struct ContextState {
    store: RefCell<HashMap<String, Value>>,
    counters: RefCell<HashMap<u32, f64>>,
    output: RefCell<String>,
}

/// The evaluation context handed to every node and builtin.
///
/// Holds the collaborator references, the shared mutable state, and the
/// optional `data` element a scoped child context is bound to. Scoping
/// clones the context with a new `data` value; the state cell is shared,
/// so counters and stored values written inside an `each` body remain
/// visible afterwards.
#[derive(Clone)]
pub struct ActionContext<'a> {
    app: &'a dyn Application,
    mail: Option<&'a dyn MailGateway>,
    geocoder: Option<&'a dyn Geocoder>,
    settings: &'a Settings,
    state: Rc<ContextState>,
    data: Option<Value>,
}

impl<'a> ActionContext<'a> {
    pub fn new(app: &'a dyn Application, settings: &'a Settings) -> Self {
        ActionContext {
            app,
            mail: None,
            geocoder: None,
            settings,
            state: Rc::new(ContextState::default()),
            data: None,
        }
    }

    pub fn with_mail(mut self, mail: &'a dyn MailGateway) -> Self {
        self.mail = Some(mail);
        self
    }

    pub fn with_geocoder(mut self, geocoder: &'a dyn Geocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// A child context scoped to one data element, used for `each` and
    /// `filter` bodies. Shares this context's state cell.
    pub fn with_data(&self, element: Value) -> ActionContext<'a> {
        let mut child = self.clone();
        child.data = Some(element);
        child
    }

    pub fn app(&self) -> &'a dyn Application {
        self.app
    }

    pub fn mail(&self) -> Option<&'a dyn MailGateway> {
        self.mail
    }

    pub fn geocoder(&self) -> Option<&'a dyn Geocoder> {
        self.geocoder
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Resolve a dotted path against this context.
    ///
    /// The leading segment is special-cased: `this` is the entity, `data`
    /// the scoped element, `now` the current date. Anything else is tried
    /// as an entity property first and a stored value second. Remaining
    /// segments navigate entity properties and object keys; any miss
    /// yields null rather than an error.
    pub fn resolve_path(
        &self,
        _security: &SecurityContext,
        entity: Option<&EntityRef>,
        path: &str,
    ) -> Value {
        let mut segments = path.split('.').filter(|s| !s.is_empty());

        let Some(head) = segments.next() else {
            return Value::Null;
        };

        let mut value = match head {
            "this" => match entity {
                Some(e) => Value::Entity(Rc::clone(e)),
                None => Value::Null,
            },
            "data" => self.data.clone().unwrap_or(Value::Null),
            "now" => Value::Date(chrono::Utc::now().timestamp_millis()),
            other => {
                let from_entity = entity.and_then(|e| e.get_property(other));
                match from_entity {
                    Some(v) => v,
                    None => self
                        .state
                        .store
                        .borrow()
                        .get(other)
                        .cloned()
                        .unwrap_or(Value::Null),
                }
            }
        };

        for segment in segments {
            value = step(&value, segment);
            if value.is_null() {
                break;
            }
        }
        value
    }

    // --- shared state ---

    pub fn store(&self, key: &str, value: Value) {
        self.state.store.borrow_mut().insert(key.to_string(), value);
    }

    pub fn retrieve(&self, key: &str) -> Option<Value> {
        self.state.store.borrow().get(key).cloned()
    }

    pub fn counter(&self, level: u32) -> f64 {
        self.state
            .counters
            .borrow()
            .get(&level)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn increment_counter(&self, level: u32) {
        *self.state.counters.borrow_mut().entry(level).or_insert(0.0) += 1.0;
    }

    pub fn reset_counter(&self, level: u32) {
        self.state.counters.borrow_mut().insert(level, 0.0);
    }

    /// Append to the print buffer. `print` writes here instead of stdout
    /// so the embedding caller decides where the text ends up.
    pub fn print(&self, text: &str) {
        self.state.output.borrow_mut().push_str(text);
    }

    /// The accumulated print output.
    pub fn output(&self) -> String {
        self.state.output.borrow().clone()
    }

    /// Drain the print buffer.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.state.output.borrow_mut())
    }
}

/// One navigation step below the head segment.
fn step(value: &Value, segment: &str) -> Value {
    match value {
        Value::Entity(e) => e.get_property(segment).unwrap_or(Value::Null),
        Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
