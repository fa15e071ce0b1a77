//! Deferred install-prompt lifecycle.
//!
//! The platform hands the application a one-shot install prompt at a time of
//! its choosing; the UI stashes it and triggers it later on user action.
//! [`PromptSlot`] makes that stashed-prompt singleton's lifecycle explicit:
//! empty, deferred, consumed. Triggering consumes the prompt exactly once,
//! whatever the outcome; a slot with no prompt yields nothing and the UI
//! falls back to manual install instructions.

use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    Accepted,
    Dismissed,
}

/// A platform-provided install prompt. One-shot by construction: triggering
/// it goes through [`PromptSlot::trigger`], which takes it by value.
pub trait InstallPrompt {
    fn prompt(self) -> PromptOutcome;
}

pub enum PromptSlot<P> {
    Empty,
    Deferred(P),
    Consumed,
}

impl<P: InstallPrompt> PromptSlot<P> {
    pub fn new() -> PromptSlot<P> {
        PromptSlot::Empty
    }

    /// Stash the prompt the platform deferred to us. A later prompt replaces
    /// an earlier unconsumed one.
    pub fn defer(&mut self, prompt: P) {
        *self = PromptSlot::Deferred(prompt);
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PromptSlot::Deferred(_))
    }

    /// Trigger the deferred prompt, if there is one. Returns `None` when the
    /// slot is empty or already consumed; the caller shows the manual
    /// fallback in that case.
    pub fn trigger(&mut self) -> Option<PromptOutcome> {
        match mem::replace(self, PromptSlot::Consumed) {
            PromptSlot::Deferred(prompt) => Some(prompt.prompt()),
            PromptSlot::Empty => {
                *self = PromptSlot::Empty;
                None
            }
            PromptSlot::Consumed => None,
        }
    }
}

impl<P: InstallPrompt> Default for PromptSlot<P> {
    fn default() -> PromptSlot<P> {
        PromptSlot::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPrompt(PromptOutcome);

    impl InstallPrompt for FixedPrompt {
        fn prompt(self) -> PromptOutcome {
            self.0
        }
    }

    #[test]
    fn empty_slot_yields_nothing_and_stays_empty() {
        let mut slot: PromptSlot<FixedPrompt> = PromptSlot::new();
        assert!(slot.trigger().is_none());
        // Still able to receive a deferred prompt afterwards.
        slot.defer(FixedPrompt(PromptOutcome::Accepted));
        assert_eq!(slot.trigger(), Some(PromptOutcome::Accepted));
    }

    #[test]
    fn deferred_prompt_fires_exactly_once() {
        let mut slot = PromptSlot::new();
        slot.defer(FixedPrompt(PromptOutcome::Dismissed));
        assert!(slot.is_available());
        assert_eq!(slot.trigger(), Some(PromptOutcome::Dismissed));
        assert!(!slot.is_available());
        assert!(slot.trigger().is_none());
    }

    #[test]
    fn dismissal_still_consumes_the_prompt() {
        let mut slot = PromptSlot::new();
        slot.defer(FixedPrompt(PromptOutcome::Dismissed));
        slot.trigger();
        assert!(matches!(slot, PromptSlot::Consumed));
    }
}
