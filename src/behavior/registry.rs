//! Behavior registry: static table of behavior factories, one namespace per role.

use crate::behavior::{BehaviorRole, GeneratorBehavior, GraderBehavior};
use crate::error::{ApiError, BehaviorError};
use crate::types::Parameters;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub type GeneratorFactoryFn =
    dyn Fn(&Parameters) -> Result<Box<dyn GeneratorBehavior>, BehaviorError> + Send + Sync;
pub type GraderFactoryFn =
    dyn Fn(&Parameters) -> Result<Box<dyn GraderBehavior>, BehaviorError> + Send + Sync;

#[derive(Clone)]
enum FactoryFn {
    Generator(Arc<GeneratorFactoryFn>),
    Grader(Arc<GraderFactoryFn>),
}

/// Resolved, instantiable behavior implementation
#[derive(Clone)]
pub struct BehaviorFactory {
    type_name: String,
    factory: FactoryFn,
}

impl BehaviorFactory {
    pub fn role(&self) -> BehaviorRole {
        match self.factory {
            FactoryFn::Generator(_) => BehaviorRole::Generator,
            FactoryFn::Grader(_) => BehaviorRole::Grader,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl std::fmt::Debug for BehaviorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorFactory")
            .field("role", &self.role())
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Instantiated behavior of either role
pub enum Behavior {
    Generator(Box<dyn GeneratorBehavior>),
    Grader(Box<dyn GraderBehavior>),
}

impl Behavior {
    pub fn role(&self) -> BehaviorRole {
        match self {
            Behavior::Generator(_) => BehaviorRole::Generator,
            Behavior::Grader(_) => BehaviorRole::Grader,
        }
    }
}

/// Convert a behavior name to the type name implementations are registered under.
///
/// Tokens separated by `-` or `_` are capitalized and concatenated:
/// `"blind-guess"` becomes `"BlindGuess"`. Configuration tooling relies on this
/// exact convention.
pub fn to_camel_case(name: &str) -> String {
    name.split(|c| c == '-' || c == '_')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Behavior registry
///
/// Maps (role, type name) to a factory closure. Registration happens at startup;
/// lookups afterwards are read-only apart from the load log.
pub struct BehaviorRegistry {
    factories: HashMap<BehaviorRole, BTreeMap<String, BehaviorFactory>>,
    loaded: Mutex<HashSet<(BehaviorRole, String)>>,
}

impl BehaviorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Create a registry with the built-in behaviors installed
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::behavior::generators::register_builtins(&mut registry);
        crate::behavior::graders::register_builtins(&mut registry);
        registry
    }

    /// Register a generator implementation under its type name
    pub fn register_generator<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Parameters) -> Result<Box<dyn GeneratorBehavior>, BehaviorError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(type_name, FactoryFn::Generator(Arc::new(factory)))
    }

    /// Register a grader implementation under its type name
    pub fn register_grader<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Parameters) -> Result<Box<dyn GraderBehavior>, BehaviorError>
            + Send
            + Sync
            + 'static,
    {
        self.insert(type_name, FactoryFn::Grader(Arc::new(factory)))
    }

    fn insert(&mut self, type_name: &str, factory: FactoryFn) -> &mut Self {
        let factory = BehaviorFactory {
            type_name: type_name.to_string(),
            factory,
        };
        self.factories
            .entry(factory.role())
            .or_default()
            .insert(type_name.to_string(), factory);
        self
    }

    /// Resolve a behavior name within a role
    pub fn resolve(&self, role: BehaviorRole, behavior_name: &str) -> Result<BehaviorFactory, ApiError> {
        let type_name = to_camel_case(behavior_name);
        let factory = self
            .factories
            .get(&role)
            .and_then(|by_name| by_name.get(&type_name))
            .cloned()
            .ok_or_else(|| ApiError::BehaviorNotFound {
                role,
                behavior_name: behavior_name.to_string(),
                type_name: type_name.clone(),
            })?;

        if self.loaded.lock().insert((role, type_name.clone())) {
            debug!(%role, behavior = behavior_name, type_name = %type_name, "Loaded behavior implementation");
        }
        Ok(factory)
    }

    /// Construct a behavior from a resolved factory and a parameter bag
    pub fn instantiate(
        &self,
        factory: &BehaviorFactory,
        parameters: &Parameters,
    ) -> Result<Behavior, ApiError> {
        let to_load_error = |source| ApiError::BehaviorLoadError {
            role: factory.role(),
            behavior_name: factory.type_name.clone(),
            source,
        };
        match &factory.factory {
            FactoryFn::Generator(build) => build(parameters)
                .map(Behavior::Generator)
                .map_err(to_load_error),
            FactoryFn::Grader(build) => build(parameters)
                .map(Behavior::Grader)
                .map_err(to_load_error),
        }
    }

    /// Registered type names for a role, sorted
    pub fn list(&self, role: BehaviorRole) -> Vec<&str> {
        self.factories
            .get(&role)
            .map(|by_name| by_name.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, role: BehaviorRole, behavior_name: &str) -> bool {
        self.factories
            .get(&role)
            .map(|by_name| by_name.contains_key(&to_camel_case(behavior_name)))
            .unwrap_or(false)
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
