//! Run state definitions for the scrape orchestrator
//!
//! A category run moves through these states; the orchestrator rejects any
//! transition not listed in [`RunState::can_transition_to`].
use std::fmt;

/// Represents the current state of a category run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Nothing has happened yet
    Idle,

    /// A checkpoint was accepted and previous results are being reloaded
    Resuming,

    /// Starting from page 0, position 0
    Starting,

    /// A listing page is loaded and its stubs are being extracted
    PageLoop,

    /// Items of the current page are being processed
    ItemLoop,

    /// The last processed item has been persisted
    Checkpointed,

    /// Moving to the next listing page
    NextPage,

    /// No more pages to process
    Done,

    /// Documents released, run finished (successfully or not)
    Terminated,
}

impl RunState {
    /// Returns true if the run can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Terminated)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Any state may move to `Terminated` (fatal errors still tear down).
    pub fn can_transition_to(&self, next: RunState) -> bool {
        if next == Self::Terminated {
            return *self != Self::Terminated;
        }

        matches!(
            (self, next),
            (Self::Idle, Self::Resuming)
                | (Self::Idle, Self::Starting)
                | (Self::Resuming, Self::PageLoop)
                | (Self::Starting, Self::PageLoop)
                | (Self::PageLoop, Self::ItemLoop)
                | (Self::ItemLoop, Self::Checkpointed)
                | (Self::ItemLoop, Self::NextPage)
                | (Self::ItemLoop, Self::Done)
                | (Self::Checkpointed, Self::ItemLoop)
                | (Self::Checkpointed, Self::NextPage)
                | (Self::Checkpointed, Self::Done)
                | (Self::NextPage, Self::PageLoop)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resuming => "resuming",
            Self::Starting => "starting",
            Self::PageLoop => "page_loop",
            Self::ItemLoop => "item_loop",
            Self::Checkpointed => "checkpointed",
            Self::NextPage => "next_page",
            Self::Done => "done",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
