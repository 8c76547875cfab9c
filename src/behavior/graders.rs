//! Built-in grader behaviors.

pub mod blind_guess;
pub mod constant;

pub use blind_guess::BlindGuess;
pub use constant::Constant;

use crate::behavior::registry::BehaviorRegistry;

pub(crate) fn register_builtins(registry: &mut BehaviorRegistry) {
    registry
        .register_grader("Constant", constant::build)
        .register_grader("BlindGuess", blind_guess::build);
}
