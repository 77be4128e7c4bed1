use crate::core::ControlInput;

/// Maps an observation vector to a control command.
///
/// Implementations must be pure with respect to the observation: the same
/// input yields the same command, which keeps episodes reproducible.
pub trait Controller {
    fn act(&self, observation: &[f32]) -> ControlInput;
}

impl<C> Controller for &C
where
    C: Controller + ?Sized,
{
    fn act(&self, observation: &[f32]) -> ControlInput {
        (**self).act(observation)
    }
}

impl<C> Controller for Box<C>
where
    C: Controller + ?Sized,
{
    fn act(&self, observation: &[f32]) -> ControlInput {
        (**self).act(observation)
    }
}
