//! Display names for input sources and profiles.
//!
//! The switch itself only knows numbers; users configure comma-separated
//! name lists so that "input 3" can be shown as "Blu-ray player". Names are
//! assigned to 1-based numbers in list order, and numbers beyond the list
//! fall back to a generated default.

const DEFAULT_INPUT_NAME_PREFIX: &str = "INPUT ";
const DEFAULT_PROFILE_NAME_PREFIX: &str = "PROFILE ";

/// Lookup table from input-source / profile numbers to configured names.
#[derive(Debug, Clone, Default)]
pub struct SourceNames {
    input_names: Vec<String>,
    profile_names: Vec<String>,
}

impl SourceNames {
    /// Builds the lookup from comma-separated name lists. Empty strings mean
    /// no names are configured and every lookup returns the default.
    pub fn new(input_names: &str, profile_names: &str) -> Self {
        Self {
            input_names: split_names(input_names),
            profile_names: split_names(profile_names),
        }
    }

    /// Configured name for the given 1-based input number, or `INPUT {n}`.
    pub fn input_name(&self, number: u8) -> String {
        lookup(&self.input_names, number, DEFAULT_INPUT_NAME_PREFIX)
    }

    /// Configured name for the given 1-based profile number, or `PROFILE {n}`.
    pub fn profile_name(&self, number: u8) -> String {
        lookup(&self.profile_names, number, DEFAULT_PROFILE_NAME_PREFIX)
    }
}

fn split_names(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(',').map(|s| s.trim().to_string()).collect()
}

fn lookup(names: &[String], number: u8, default_prefix: &str) -> String {
    if number >= 1 {
        if let Some(name) = names.get(usize::from(number) - 1) {
            if !name.is_empty() {
                return name.clone();
            }
        }
    }
    format!("{default_prefix}{number}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
