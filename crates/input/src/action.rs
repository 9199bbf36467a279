use bitflags::bitflags;

/// A high-level camera action that any input device can produce.
///
/// The camera consumes actions, never raw key codes, so bindings can change
/// without touching movement logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    /// Held modifier that scales movement down for fine positioning.
    Slow,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::Ascend,
        Action::Descend,
        Action::Slow,
    ];

    /// Bit used for this action inside an [`ActionSet`].
    pub fn flag(self) -> ActionSet {
        match self {
            Action::MoveForward => ActionSet::MOVE_FORWARD,
            Action::MoveBackward => ActionSet::MOVE_BACKWARD,
            Action::StrafeLeft => ActionSet::STRAFE_LEFT,
            Action::StrafeRight => ActionSet::STRAFE_RIGHT,
            Action::Ascend => ActionSet::ASCEND,
            Action::Descend => ActionSet::DESCEND,
            Action::Slow => ActionSet::SLOW,
        }
    }
}

bitflags! {
    /// Set of actions currently held down.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ActionSet: u8 {
        const MOVE_FORWARD = 1 << 0;
        const MOVE_BACKWARD = 1 << 1;
        const STRAFE_LEFT = 1 << 2;
        const STRAFE_RIGHT = 1 << 3;
        const ASCEND = 1 << 4;
        const DESCEND = 1 << 5;
        const SLOW = 1 << 6;
    }
}

impl ActionSet {
    pub fn holds(self, action: Action) -> bool {
        self.contains(action.flag())
    }

    pub fn with(self, action: Action) -> Self {
        self | action.flag()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ActionSet::empty(), |set, action| set.with(action))
    }
}
