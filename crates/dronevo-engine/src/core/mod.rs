pub use self::{control::*, physics::*, vec2::*};

pub(crate) mod control;
pub(crate) mod physics;
pub(crate) mod vec2;
