//! Profile save/load action.
//!
//! A profile is a saved snapshot of all zone input routings, recallable by
//! number. The wire command differs only in its trailing operation token.

/// Whether a profile command stores or recalls the routing snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAction {
    Save,
    Load,
}

impl ProfileAction {
    /// Operation token as it appears in the `profile` wire command.
    pub fn wire_token(self) -> &'static str {
        match self {
            ProfileAction::Save => "SAVE",
            ProfileAction::Load => "LOAD",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
