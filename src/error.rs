use std::fmt;

use thiserror::Error;

/// Hint shown to users when attaching fails; these are the known real-world causes.
const ATTACH_FAILED_HINT: &str = "Embedding into the desktop failed. Restart Windows Explorer, \
     or close wallpaper / desktop customization software, then try again.";

/// Step of [`crate::embed_host::EmbedHost::attach`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStep {
    ReadBounds,
    CreateSurface,
    ReparentContent,
    Layout,
    ZOrder,
}

impl fmt::Display for AttachStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttachStep::ReadBounds => "read bounds",
            AttachStep::CreateSurface => "create surface",
            AttachStep::ReparentContent => "reparent content",
            AttachStep::Layout => "layout",
            AttachStep::ZOrder => "z-order",
        })
    }
}

/// Non-critical step of a detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachStep {
    RemoveHook,
    RestoreContent,
    DestroySurface,
    RestoreBounds,
    ShowWindow,
}

impl fmt::Display for DetachStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetachStep::RemoveHook => "remove hit-test hook",
            DetachStep::RestoreContent => "restore content",
            DetachStep::DestroySurface => "destroy surface",
            DetachStep::RestoreBounds => "restore bounds",
            DetachStep::ShowWindow => "show window",
        })
    }
}

#[derive(Debug, Error)]
pub enum EmbedError {
    /// No usable embedding parent. The caller keeps the normal windowed presentation.
    #[error("no desktop host window found after {attempts} enumeration passes")]
    HostNotFound { attempts: u32 },

    /// Reparenting failed and was rolled back; the original window is still usable.
    #[error("attaching to the desktop failed at step `{step}`: {source}")]
    AttachFailed {
        step: AttachStep,
        #[source]
        source: anyhow::Error,
    },

    /// A restoration step failed during detach. Logged, never blocks the detach.
    #[error("detach step `{step}` failed: {source}")]
    DetachPartialFailure {
        step: DetachStep,
        #[source]
        source: anyhow::Error,
    },
}

impl EmbedError {
    pub fn attach(step: AttachStep, source: anyhow::Error) -> Self {
        EmbedError::AttachFailed { step, source }
    }

    pub fn detach(step: DetachStep, source: anyhow::Error) -> Self {
        EmbedError::DetachPartialFailure { step, source }
    }

    /// Actionable message for presenting to the user, if there is one.
    pub fn user_hint(&self) -> Option<&'static str> {
        match self {
            EmbedError::AttachFailed { .. } => Some(ATTACH_FAILED_HINT),
            _ => None,
        }
    }
}
