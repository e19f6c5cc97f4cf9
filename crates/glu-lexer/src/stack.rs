use crate::rule::StateId;

/// Refused state stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("cannot pop the bootstrap state")]
    Underflow,
    #[error("state stack is limited to {limit} frames")]
    Overflow { limit: usize },
}

/// Stack of active lexer states. The bottom frame is the bootstrap state
/// and is never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStack {
    frames: Vec<StateId>,
    limit: usize,
}

impl StateStack {
    /// A stack holding only `bootstrap`, allowing at most `limit` frames.
    pub fn new(bootstrap: StateId, limit: usize) -> Self {
        Self {
            frames: vec![bootstrap],
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, state: StateId) -> Result<(), StackError> {
        if self.frames.len() >= self.limit {
            return Err(StackError::Overflow { limit: self.limit });
        }
        self.frames.push(state);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<StateId, StackError> {
        if self.frames.len() <= 1 {
            return Err(StackError::Underflow);
        }
        self.frames.pop().ok_or(StackError::Underflow)
    }

    /// Replace the top frame without changing depth.
    pub fn goto(&mut self, state: StateId) {
        if let Some(top) = self.frames.last_mut() {
            *top = state;
        }
    }

    pub fn current(&self) -> StateId {
        self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frames from bottom to top.
    pub fn frames(&self) -> &[StateId] {
        &self.frames
    }
}
