use securepass::{InstallPrompt, PromptOutcome, PromptSlot};

/// The terminal's stand-in for the platform install prompt: an interactive
/// confirm. Only deferred when someone is actually attending the terminal.
struct ConfirmPrompt;

impl InstallPrompt for ConfirmPrompt {
    fn prompt(self) -> PromptOutcome {
        let accepted = dialoguer::Confirm::new()
            .with_prompt("Install securepass on this device?")
            .default(true)
            .interact()
            // A prompt we couldn't show was effectively dismissed.
            .unwrap_or(false);
        if accepted {
            PromptOutcome::Accepted
        } else {
            PromptOutcome::Dismissed
        }
    }
}

pub(crate) fn install() {
    let mut slot = PromptSlot::new();
    if console::user_attended() {
        slot.defer(ConfirmPrompt);
    }
    match slot.trigger() {
        Some(PromptOutcome::Accepted) => eprintln!("Install accepted."),
        Some(PromptOutcome::Dismissed) => {
            eprintln!("Install dismissed; run `securepass install` again any time.")
        }
        None => eprintln!(
            "No install prompt is available here. To install manually:\n\
             • iOS: tap Share, then \"Add to Home Screen\"\n\
             • Desktop: use the install icon in the address bar"
        ),
    }
}
