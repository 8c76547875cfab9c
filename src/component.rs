//! Components: persisted configuration records bound to a lazily created behavior.
//!
//! A component names a behavior and carries its parameters. The behavior
//! instance is constructed through the [`BehaviorRegistry`] on first use and
//! cached for the component's in-memory lifetime.

use crate::behavior::{Behavior, BehaviorRegistry, BehaviorRole, GeneratorBehavior, GraderBehavior};
use crate::error::{ApiError, BehaviorError};
use crate::types::Parameters;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

/// Stored configuration of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Identifier of the record; filled from the configuration table key when omitted
    #[serde(default)]
    pub component_id: String,

    /// Name of the behavior implementation to run
    pub behavior_name: String,

    /// Behavior parameters, passed through verbatim
    #[serde(default)]
    pub parameters: Parameters,

    /// Disabled components are skipped by orchestration
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl ComponentRecord {
    pub fn new(component_id: impl Into<String>, behavior_name: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            behavior_name: behavior_name.into(),
            parameters: Parameters::new(),
            enabled: true,
        }
    }

    pub fn with_parameter(mut self, name: &str, value: serde_json::Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Check required fields
    pub fn validate(&self) -> Result<(), String> {
        if self.component_id.trim().is_empty() {
            return Err("component_id cannot be empty".to_string());
        }
        if self.behavior_name.trim().is_empty() {
            return Err("behavior_name cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Role-specific behavior trait objects a component can bind
pub trait RoleBehavior: Send {
    const ROLE: BehaviorRole;
    /// Display name of components of this role
    const COMPONENT_KIND: &'static str;

    fn from_behavior(behavior: Behavior) -> Option<Box<Self>>;
}

impl RoleBehavior for dyn GeneratorBehavior {
    const ROLE: BehaviorRole = BehaviorRole::Generator;
    const COMPONENT_KIND: &'static str = "ExercisesCreator";

    fn from_behavior(behavior: Behavior) -> Option<Box<Self>> {
        match behavior {
            Behavior::Generator(b) => Some(b),
            Behavior::Grader(_) => None,
        }
    }
}

impl RoleBehavior for dyn GraderBehavior {
    const ROLE: BehaviorRole = BehaviorRole::Grader;
    const COMPONENT_KIND: &'static str = "ExercisesGrader";

    fn from_behavior(behavior: Behavior) -> Option<Box<Self>> {
        match behavior {
            Behavior::Grader(b) => Some(b),
            Behavior::Generator(_) => None,
        }
    }
}

/// Component of one role owning at most one behavior instance
pub struct Component<B: ?Sized + RoleBehavior> {
    record: ComponentRecord,
    behavior: Mutex<Option<Box<B>>>,
}

/// Component creating exercises
pub type ExercisesCreator = Component<dyn GeneratorBehavior>;

/// Component grading exercises
pub type ExercisesGrader = Component<dyn GraderBehavior>;

impl<B: ?Sized + RoleBehavior> Component<B> {
    pub fn new(record: ComponentRecord) -> Self {
        Self {
            record,
            behavior: Mutex::new(None),
        }
    }

    pub fn record(&self) -> &ComponentRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.component_id
    }

    pub fn behavior_name(&self) -> &str {
        &self.record.behavior_name
    }

    pub fn parameters(&self) -> &Parameters {
        &self.record.parameters
    }

    pub fn is_enabled(&self) -> bool {
        self.record.enabled
    }

    pub fn role(&self) -> BehaviorRole {
        B::ROLE
    }

    /// Whether the behavior instance has been constructed
    pub fn is_bound(&self) -> bool {
        self.behavior.lock().is_some()
    }

    /// Get the bound behavior, constructing it on first call.
    ///
    /// The guard holds the component's lock; runs holding it are serialized.
    /// Construction errors propagate unchanged and leave the component unbound.
    pub fn behavior(&self, registry: &BehaviorRegistry) -> Result<MappedMutexGuard<'_, B>, ApiError> {
        let mut slot = self.behavior.lock();
        if slot.is_none() {
            let factory = registry.resolve(B::ROLE, &self.record.behavior_name)?;
            let behavior = registry.instantiate(&factory, &self.record.parameters)?;
            let role = behavior.role();
            let bound = B::from_behavior(behavior).ok_or_else(|| ApiError::BehaviorLoadError {
                role: B::ROLE,
                behavior_name: self.record.behavior_name.clone(),
                source: BehaviorError::Failed(format!("factory produced a {} behavior", role)),
            })?;
            *slot = Some(bound);
        }
        MutexGuard::try_map(slot, |slot| slot.as_deref_mut()).map_err(|_| {
            ApiError::BehaviorLoadError {
                role: B::ROLE,
                behavior_name: self.record.behavior_name.clone(),
                source: BehaviorError::Failed("behavior slot is empty".to_string()),
            }
        })
    }
}

impl<B: ?Sized + RoleBehavior> std::fmt::Display for Component<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{} {}; parameters={}>",
            B::COMPONENT_KIND,
            self.record.behavior_name,
            serde_json::Value::Object(self.record.parameters.clone())
        )
    }
}

impl<B: ?Sized + RoleBehavior> std::fmt::Debug for Component<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(B::COMPONENT_KIND)
            .field("record", &self.record)
            // try_lock: formatting must not block on a running pipeline
            .field("bound", &self.behavior.try_lock().map(|slot| slot.is_some()))
            .finish()
    }
}
