//! Shell command safety classification
//!
//! Pattern-based screening for commands that destroy data and commands that
//! request elevated privileges. The pattern set is pinned and best-effort: a
//! command outside it is not proven safe, it just is not screened. Quoting and
//! substitution tricks can defeat the tokenizer, so the screen is a guard rail
//! for honest mistakes, not a sandbox.

use once_cell::sync::Lazy;
use regex::Regex;

/// Commands that remove or shred file data when they run at the head of a
/// pipeline segment.
const DESTRUCTIVE_COMMANDS: &[&str] = &["rm", "unlink", "shred", "wipefs"];

/// Privilege wrappers recognized at the head of a pipeline segment.
const PRIVILEGE_WRAPPERS: &[&str] = &["sudo", "doas"];

static ENV_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").expect("env assignment pattern compiles"));

static SEGMENT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;|&]+").expect("segment split pattern compiles"));

static DD_DEVICE_WRITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdd\b[^;|&]*\bof=/dev/").expect("dd pattern compiles"));

static DEVICE_REDIRECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r">\s*/dev/(sd|hd|vd|nvme|mmcblk)").expect("device redirect pattern compiles")
});

/// True when any pipeline segment starts a command that deletes or overwrites
/// data: `rm`, `unlink`, `shred`, `wipefs`, any `mkfs` variant, `dd` writing
/// to a block device, or a shell redirect onto a block device.
pub fn is_destructive(command: &str) -> bool {
    if DEVICE_REDIRECT.is_match(command) {
        return true;
    }

    SEGMENT_SPLIT.split(command).any(|segment| {
        let Some(effective) = effective_command(segment) else {
            return false;
        };
        DESTRUCTIVE_COMMANDS.contains(&effective)
            || effective.starts_with("mkfs")
            || (effective == "dd"
                && DD_DEVICE_WRITE.is_match(segment)
                && !segment.contains("of=/dev/null"))
    })
}

/// True when any pipeline segment is led by a privilege wrapper.
pub fn is_privileged(command: &str) -> bool {
    SEGMENT_SPLIT.split(command).any(|segment| {
        matches!(leading_word(segment), Some(word) if PRIVILEGE_WRAPPERS.contains(&word))
    })
}

/// First token of a segment after environment assignments.
fn leading_word(segment: &str) -> Option<&str> {
    segment
        .split_whitespace()
        .find(|token| !ENV_ASSIGN.is_match(token))
}

/// The command a segment actually runs: environment assignments and privilege
/// wrappers (with their flags) are skipped so `sudo rm` screens as `rm`.
fn effective_command(segment: &str) -> Option<&str> {
    let mut tokens = segment
        .split_whitespace()
        .filter(|token| !ENV_ASSIGN.is_match(token));

    let mut current = tokens.next()?;
    while PRIVILEGE_WRAPPERS.contains(&current) {
        current = tokens.next()?;
        while current.starts_with('-') {
            current = tokens.next()?;
        }
    }
    Some(current)
}
