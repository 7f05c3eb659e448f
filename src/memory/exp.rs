use crate::env::Environment;

/// Represents a single experience or transition in the environment
pub struct Exp<E: Environment> {
    /// The state of the environment before taking the action
    pub state: E::State,
    /// The action taken in the given state
    pub action: E::Action,
    /// The state of the environment after the action is taken, or if terminal, `None`
    pub next_state: Option<E::State>,
    /// The reward received after taking the action
    pub reward: f32,
}

impl<E: Environment> Exp<E> {
    /// Whether the transition ended the episode in a terminal state
    ///
    /// Running out of steps is not terminal, so the value of a timed-out transition still bootstraps from `next_state`.
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_none()
    }
}

impl<E: Environment> Clone for Exp<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Environment> Copy for Exp<E> {}
