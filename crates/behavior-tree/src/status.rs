//! Status returned by behavior nodes.

use strum::Display;

/// The result of executing a behavior node for one tick.
///
/// `Error` is ordinary data, not an exception: it flows through composites and
/// decorators like the other three values, and a tick always runs to
/// completion. Drivers that want fail-fast behavior check for it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The behavior completed successfully.
    ///
    /// For conditions: The condition was met.
    /// For actions: The action finished.
    Success,

    /// The behavior failed.
    ///
    /// For conditions: The condition was not met.
    /// For actions: The action could not be carried out.
    Failure,

    /// The behavior needs more ticks to finish.
    ///
    /// The node stays open until a later tick returns something else or its
    /// branch is abandoned and it gets closed as an orphan.
    Running,

    /// The node is misconfigured (e.g. a decorator without a child).
    Error,
}

impl Status {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Returns `true` if this status is `Error`.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Status::Error)
    }

    /// Returns `true` for every status except `Running`.
    ///
    /// A node whose tick returns a finished status is closed right away.
    #[inline]
    pub fn is_done(self) -> bool {
        !self.is_running()
    }

    /// Swaps `Success` and `Failure`; `Running` and `Error` pass through.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            other => other,
        }
    }
}
