//! Domain layer: value objects, closed enumerations and pure routing logic.

pub mod coaching;
pub mod foundation;
pub mod routing;
