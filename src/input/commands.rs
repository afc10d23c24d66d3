use crate::entity::collision::Tier;

/// The fixed input vocabulary the simulation consumes each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Advance one step.
    Move,
    Jump,
    /// Start a duck/slide, or end the current one.
    DuckToggle,
    ShieldToggle,
    /// Arrow-style direct selection of the shield position.
    ShieldSet(Tier),
    /// Wheel-style cycling of the shield position.
    ShieldCycle,
    PauseToggle,
    MenuSelect,
    Restart,
    Quit,
}

impl InputCommand {
    /// Commands that drive the mode machine rather than the player.
    pub fn is_control(self) -> bool {
        matches!(
            self,
            InputCommand::PauseToggle | InputCommand::MenuSelect | InputCommand::Restart | InputCommand::Quit
        )
    }
}
