//! Explicit confirmation step for destructive operations.
//!
//! A controller parks the action in a [`ConfirmationGate`] together with the
//! prompts that must be acknowledged in order. Nothing is sent until the last
//! prompt is acknowledged; declining at any step drops the action.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation<T> {
    /// Another prompt must be acknowledged before anything is sent.
    Prompt(&'static str),
    Completed(T),
}

impl<T> Confirmation<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Confirmation::Completed(_))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Acknowledged<A> {
    NextPrompt(&'static str),
    Ready(A),
}

#[derive(Debug)]
struct PendingAction<A> {
    action: A,
    prompts: &'static [&'static str],
    step: usize,
}

#[derive(Debug)]
pub struct ConfirmationGate<A> {
    pending: Option<PendingAction<A>>,
}

impl<A> Default for ConfirmationGate<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A> ConfirmationGate<A> {
    /// Parks `action`, replacing anything already pending, and returns the
    /// first prompt.
    pub fn request(&mut self, action: A, prompts: &'static [&'static str]) -> &'static str {
        debug_assert!(!prompts.is_empty(), "confirmation needs at least one prompt");
        if self.pending.is_some() {
            debug!("replacing unconfirmed action");
        }
        self.pending = Some(PendingAction {
            action,
            prompts,
            step: 0,
        });
        prompts.first().copied().unwrap_or_default()
    }

    pub fn pending_prompt(&self) -> Option<&'static str> {
        self.pending
            .as_ref()
            .and_then(|pending| pending.prompts.get(pending.step).copied())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Acknowledges the current prompt. Returns `None` when nothing is pending.
    pub fn acknowledge(&mut self) -> Option<Acknowledged<A>> {
        let mut pending = self.pending.take()?;
        pending.step += 1;
        if let Some(next) = pending.prompts.get(pending.step).copied() {
            self.pending = Some(pending);
            return Some(Acknowledged::NextPrompt(next));
        }
        Some(Acknowledged::Ready(pending.action))
    }

    pub fn decline(&mut self) -> Option<A> {
        self.pending.take().map(|pending| pending.action)
    }
}
