//! Shared property registry
//!
//! A flat map of slash-separated names to shared scalar cells. Models resolve
//! the nodes they publish or consume once at load time and then read or write
//! them every frame without further lookups.
//!
//! The registry is shared by an executive, all of its models and all of its
//! children. Access is single-threaded and unlocked: one simulation instance
//! must never be shared across threads, which `Rc` enforces at compile time.
//!
//! # Example
//!
//! ```ignore
//! let pm = PropertyManager::new();
//! let node = pm.node("fcs/elevator-cmd-norm", true).unwrap();
//! node.set(0.25);
//! assert_eq!(pm.get("fcs/elevator-cmd-norm"), Some(0.25));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Handle to a single named value
///
/// Cloning the handle shares the underlying cell.
#[derive(Clone, Default)]
pub struct PropertyNode(Rc<Cell<f64>>);

impl PropertyNode {
    /// Create a detached node holding `value`
    pub fn new(value: f64) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    #[inline]
    pub fn get(&self) -> f64 {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.0.set(value);
    }

    #[inline]
    pub fn get_bool(&self) -> bool {
        self.0.get() != 0.0
    }

    #[inline]
    pub fn set_bool(&self, value: bool) {
        self.0.set(if value { 1.0 } else { 0.0 });
    }

    /// Read the value and put `idle` back in its place
    pub fn take(&self, idle: f64) -> f64 {
        self.0.replace(idle)
    }

    /// True when both handles refer to the same cell
    pub fn same_node(&self, other: &PropertyNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PropertyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyNode({})", self.get())
    }
}

type Registry = Rc<RefCell<BTreeMap<String, PropertyNode>>>;

/// Scoped view of the shared registry
///
/// The root executive uses unprefixed names; child executives get a view
/// prefixed with `fdm[n]/` over the same registry.
#[derive(Clone, Default)]
pub struct PropertyManager {
    registry: Registry,
    prefix: String,
}

impl PropertyManager {
    /// Create a new, empty registry with a root view
    pub fn new() -> Self {
        Self::default()
    }

    /// View of the same registry scoped under `fdm[id]/`
    pub fn instance(&self, id: u32) -> Self {
        let prefix = if id == 0 {
            String::new()
        } else {
            format!("fdm[{id}]/")
        };
        Self {
            registry: Rc::clone(&self.registry),
            prefix,
        }
    }

    /// Prefix applied to every name looked up through this view
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_name(&self, name: &str) -> String {
        let name = name.trim().trim_start_matches('/');
        format!("{}{}", self.prefix, name)
    }

    /// Look up a node, optionally creating it (initialised to zero)
    pub fn node(&self, name: &str, create: bool) -> Option<PropertyNode> {
        let full = self.full_name(name);
        if full.is_empty() || full.ends_with('/') {
            return None;
        }
        let mut registry = self.registry.borrow_mut();
        if let Some(node) = registry.get(&full) {
            return Some(node.clone());
        }
        if !create {
            return None;
        }
        let node = PropertyNode::default();
        registry.insert(full, node.clone());
        Some(node)
    }

    /// Publish `node` under `name`, replacing any previous binding
    ///
    /// Returns `false` when the name is not a valid leaf path; callers log
    /// the failure and carry on.
    pub fn tie(&self, name: &str, node: &PropertyNode) -> bool {
        let full = self.full_name(name);
        if full.is_empty() || full.ends_with('/') {
            return false;
        }
        self.registry.borrow_mut().insert(full, node.clone());
        true
    }

    /// Create (or fetch) a node and set its initial value
    pub fn bind(&self, name: &str, initial: f64) -> Option<PropertyNode> {
        let node = self.node(name, true)?;
        node.set(initial);
        Some(node)
    }

    /// Remove every binding under this view
    pub fn untie_all(&self) {
        let prefix = self.prefix.clone();
        self.registry.borrow_mut().retain(|k, _| {
            if prefix.is_empty() {
                // the root view owns only names outside of child scopes
                k.starts_with("fdm[")
            } else {
                !k.starts_with(&prefix)
            }
        });
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.borrow().contains_key(&self.full_name(name))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.registry
            .borrow()
            .get(&self.full_name(name))
            .map(PropertyNode::get)
    }

    /// Set an existing property; returns `false` if it does not exist
    pub fn set(&self, name: &str, value: f64) -> bool {
        match self.registry.borrow().get(&self.full_name(name)) {
            Some(node) => {
                node.set(value);
                true
            }
            None => false,
        }
    }

    /// Sorted names visible from this view, without the view prefix
    pub fn catalog(&self) -> Vec<String> {
        let prefix = &self.prefix;
        self.registry
            .borrow()
            .keys()
            .filter_map(|k| {
                if prefix.is_empty() {
                    (!k.starts_with("fdm[")).then(|| k.clone())
                } else {
                    k.strip_prefix(prefix.as_str()).map(str::to_string)
                }
            })
            .collect()
    }

    /// Number of nodes in the whole shared registry
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }
}

impl fmt::Debug for PropertyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyManager")
            .field("prefix", &self.prefix)
            .field("nodes", &self.len())
            .finish()
    }
}

/// Parse a property reference that may carry a leading minus sign
///
/// Returns the bare name and the sign (+1 or -1) to apply to its value.
pub fn signed_reference(text: &str) -> (&str, f64) {
    let text = text.trim();
    match text.strip_prefix('-') {
        Some(rest) => (rest.trim(), -1.0),
        None => (text, 1.0),
    }
}
