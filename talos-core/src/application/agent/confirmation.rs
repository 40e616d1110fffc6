//! Destructive-command confirmation gate.
//!
//! When the invoker refuses a destructive command, the loop suspends at the
//! next assistant turn and asks the human. A recorded approval is good for
//! exactly one tool cycle; both flags drop the moment a new tool-calls
//! response begins, so the model can never bank an old "yes".

/// System message injected after the human approves a blocked command.
pub const RETRY_AUTHORIZATION: &str = "The user has explicitly approved the previously blocked \
command. Retry that exact command once, adding \"user_confirmed\": true to its arguments. This \
authorization covers only that single retry.";

const AFFIRMATIVES: &[&str] = &[
    "yes", "y", "ok", "okay", "confirm", "proceed", "sure", "ya", "iya", "oke", "lanjut",
    "lanjutkan", "setuju", "boleh",
];

const CONFIRMATION_PHRASES: &[&str] = &[
    "are you sure",
    "do you want",
    "would you like",
    "should i",
    "shall i",
    "confirm",
    "proceed",
    "apakah anda yakin",
    "apakah anda ingin",
    "lanjutkan",
];

/// Pending-confirmation flags for one session.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfirmationState {
    needs_user_input: bool,
    user_just_confirmed: bool,
}

impl ConfirmationState {
    pub fn needs_user_input(&self) -> bool {
        self.needs_user_input
    }

    pub fn user_just_confirmed(&self) -> bool {
        self.user_just_confirmed
    }

    /// A command was refused; the loop must stop for human input at the next
    /// assistant turn.
    pub fn block(&mut self) {
        self.needs_user_input = true;
    }

    /// The human approved the blocked command.
    pub fn confirm(&mut self) {
        self.user_just_confirmed = true;
    }

    /// A new tool-calls cycle begins; any prior approval is spent.
    pub fn reset(&mut self) {
        self.needs_user_input = false;
        self.user_just_confirmed = false;
    }
}

/// Decides whether free text expresses approval, and whether an assistant
/// message reads like a question waiting for one.
pub trait ConfirmationClassifier: Send + Sync {
    fn is_affirmative(&self, reply: &str) -> bool;

    fn seeks_confirmation(&self, content: &str) -> bool;
}

/// Keyword matcher over a fixed bilingual phrase set. Deliberately dumb: a
/// whole-reply match only, so "yes, but first explain" does not count as an
/// approval.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl ConfirmationClassifier for KeywordClassifier {
    fn is_affirmative(&self, reply: &str) -> bool {
        let normalized = reply
            .trim()
            .trim_end_matches(['!', '.'])
            .to_lowercase();
        AFFIRMATIVES.contains(&normalized.as_str())
    }

    fn seeks_confirmation(&self, content: &str) -> bool {
        if !content.contains('?') {
            return false;
        }
        let lower = content.to_lowercase();
        CONFIRMATION_PHRASES
            .iter()
            .any(|phrase| lower.contains(phrase))
    }
}
