//! Built-in generator behaviors.

pub mod quasi;

pub use quasi::Quasi;

use crate::behavior::registry::BehaviorRegistry;

pub(crate) fn register_builtins(registry: &mut BehaviorRegistry) {
    registry.register_generator("Quasi", quasi::build);
}
