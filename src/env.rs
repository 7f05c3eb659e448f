use rand::Rng;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and a finite state space.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Copy;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Copy;

    /// Determine if the episode can continue
    ///
    /// This is false both in terminal states and once the episode's step budget is spent.
    fn is_active(&self) -> bool;

    /// Update the environment in response to an action taken by an agent, producing a new state and associated reward
    ///
    /// **Returns** `(next_state, reward)`, where `next_state` is `None` if the new state is terminal
    fn step(&mut self, action: Self::Action) -> (Option<Self::State>, f32);

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Choose an action uniformly at random
    fn random_action<R: Rng>(&self, rng: &mut R) -> Self::Action;
}

/// An environment with a discrete action space
pub trait DiscreteActionSpace: Environment {
    /// Get the available actions for the current state
    ///
    /// The returned list should never be empty, instead include an action that represents doing nothing if necessary.
    fn actions(&self) -> Vec<Self::Action>;
}
