use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbedState {
    #[default]
    Detached,
    Embedding,
    Embedded,
    Detaching,
}

/// What the caller should do with an embed/detach request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Go ahead; the machine is now in the transient state.
    Proceed,
    /// Already in the requested end state.
    AlreadyDone,
    /// Another request is in flight (re-entrant call); ignore this one.
    Busy,
}

#[derive(Debug, Default)]
pub struct EmbedStateMachine {
    state: EmbedState,
}

impl EmbedStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EmbedState {
        self.state
    }

    pub fn begin_embed(&mut self) -> Transition {
        match self.state {
            EmbedState::Detached => self.move_to(EmbedState::Embedding),
            EmbedState::Embedded => Transition::AlreadyDone,
            busy => {
                warn!("[StateMachine] Embed requested while {:?}; ignored", busy);
                Transition::Busy
            }
        }
    }

    /// Ends an embed started with [`Self::begin_embed`].
    pub fn finish_embed(&mut self, success: bool) {
        debug_assert_eq!(self.state, EmbedState::Embedding);
        self.move_to(if success { EmbedState::Embedded } else { EmbedState::Detached });
    }

    pub fn begin_detach(&mut self) -> Transition {
        match self.state {
            EmbedState::Embedded => self.move_to(EmbedState::Detaching),
            EmbedState::Detached => Transition::AlreadyDone,
            busy => {
                warn!("[StateMachine] Detach requested while {:?}; ignored", busy);
                Transition::Busy
            }
        }
    }

    /// Detach always completes.
    pub fn finish_detach(&mut self) {
        debug_assert_eq!(self.state, EmbedState::Detaching);
        self.move_to(EmbedState::Detached);
    }

    fn move_to(&mut self, next: EmbedState) -> Transition {
        debug!("[StateMachine] {:?} -> {:?}", self.state, next);
        self.state = next;
        Transition::Proceed
    }
}
