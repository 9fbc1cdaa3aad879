//! Handle-based registry of exercise sessions.

use crate::{
    config::Config,
    exercise::ExerciseType,
    landmarks::Frame,
    session::{AnalysisResult, ExerciseSession},
    Error, Result,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

/// Opaque identifier of a session owned by an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionHandle(u64);

impl SessionHandle {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Owns sessions on behalf of callers that address them by handle
#[derive(Default)]
pub struct Engine {
    next_id: u64,
    sessions: HashMap<SessionHandle, ExerciseSession>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new, independent session
    pub fn start(&mut self, exercise: ExerciseType, config: Config) -> Result<SessionHandle> {
        let session = ExerciseSession::start(exercise, config)?;
        self.next_id += 1;
        let handle = SessionHandle(self.next_id);
        debug!("Registered {handle} for {exercise}");
        self.sessions.insert(handle, session);
        Ok(handle)
    }

    pub fn process_frame(&mut self, handle: SessionHandle, frame: &Frame) -> Result<AnalysisResult> {
        self.session_mut(handle)?.process_frame(frame)
    }

    /// Close a session; it stays registered and keeps returning its terminal result
    pub fn stop(&mut self, handle: SessionHandle) -> Result<AnalysisResult> {
        Ok(self.session_mut(handle)?.stop())
    }

    pub fn session(&self, handle: SessionHandle) -> Result<&ExerciseSession> {
        self.sessions.get(&handle).ok_or(Error::UnknownSession(handle.0))
    }

    fn session_mut(&mut self, handle: SessionHandle) -> Result<&mut ExerciseSession> {
        self.sessions.get_mut(&handle).ok_or(Error::UnknownSession(handle.0))
    }

    /// Drop a session, returning its terminal result
    pub fn remove(&mut self, handle: SessionHandle) -> Result<AnalysisResult> {
        let mut session = self.sessions.remove(&handle).ok_or(Error::UnknownSession(handle.0))?;
        debug!("Removed {handle}");
        Ok(session.stop())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
