//! Runtime state sets and the patterns that match against them.
//!
//! A [`StateSet`] is the vector of interaction conditions a drawable is
//! currently rendered under (pressed, focused, ...). A [`StateSpec`] is a
//! pattern over such vectors: every token in `required` must be present and
//! no token in `excluded` may be present. The empty spec is the wildcard.

use bitflags::bitflags;

bitflags! {
    /// The set of condition tokens a drawable is currently rendered under.
    ///
    /// The named flags cover the standard interaction states; additional
    /// application-defined tokens can occupy the remaining bits via
    /// [`StateSet::from_bits_retain`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateSet: u32 {
        /// The owning window has focus.
        const WINDOW_FOCUSED = 1 << 0;
        /// The drawable's owner is enabled.
        const ENABLED = 1 << 1;
        /// The drawable's owner is selected.
        const SELECTED = 1 << 2;
        /// The drawable's owner has input focus.
        const FOCUSED = 1 << 3;
        /// A pointer or key press is active.
        const PRESSED = 1 << 4;
        /// The drawable's owner is activated.
        const ACTIVATED = 1 << 5;
        /// A pointer hovers over the drawable's owner.
        const HOVERED = 1 << 6;
        /// The drawable's owner is checked.
        const CHECKED = 1 << 7;
    }
}

/// A pattern over state sets: required tokens, excluded tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateSpec {
    required: StateSet,
    excluded: StateSet,
}

impl StateSpec {
    /// The pattern that matches any state set.
    pub const WILDCARD: StateSpec = StateSpec {
        required: StateSet::empty(),
        excluded: StateSet::empty(),
    };

    /// Creates a spec from required and excluded token sets.
    pub const fn new(required: StateSet, excluded: StateSet) -> Self {
        Self { required, excluded }
    }

    /// Creates a spec that only requires the given tokens.
    pub const fn requires(required: StateSet) -> Self {
        Self::new(required, StateSet::empty())
    }

    /// The tokens this spec requires.
    pub fn required(&self) -> StateSet {
        self.required
    }

    /// The tokens this spec excludes.
    pub fn excluded(&self) -> StateSet {
        self.excluded
    }

    /// Whether `state` satisfies this spec.
    pub fn matches(&self, state: StateSet) -> bool {
        state.contains(self.required) && (state & self.excluded).is_empty()
    }

    /// Whether this spec places no requirements at all.
    pub fn is_wildcard(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty()
    }
}

/// Index of the first spec in `specs` matched by `state`.
///
/// Matching is in insertion order, so callers encode specificity by
/// ordering: the first pattern that matches wins even when later patterns
/// would also match.
pub fn find_match(specs: &[StateSpec], state: StateSet) -> Option<usize> {
    specs.iter().position(|spec| spec.matches(state))
}

/// Index of the first spec that matches the empty state vector.
///
/// Used as the fallback when [`find_match`] finds nothing: a spec with no
/// required tokens accepts the empty vector and acts as the wildcard entry.
pub fn find_wildcard(specs: &[StateSpec]) -> Option<usize> {
    specs.iter().position(|spec| spec.matches(StateSet::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_matching() {
        let pressed = StateSpec::requires(StateSet::PRESSED);
        assert!(pressed.matches(StateSet::PRESSED | StateSet::ENABLED));
        assert!(!pressed.matches(StateSet::ENABLED));

        let not_enabled = StateSpec::new(StateSet::empty(), StateSet::ENABLED);
        assert!(not_enabled.matches(StateSet::PRESSED));
        assert!(!not_enabled.matches(StateSet::ENABLED | StateSet::PRESSED));

        assert!(StateSpec::WILDCARD.matches(StateSet::empty()));
        assert!(StateSpec::WILDCARD.matches(StateSet::all()));
    }

    #[test]
    fn test_first_match_wins() {
        let specs = [
            StateSpec::requires(StateSet::FOCUSED),
            StateSpec::requires(StateSet::PRESSED),
            StateSpec::WILDCARD,
        ];

        // Both the focused and pressed patterns match; the first one wins.
        let state = StateSet::PRESSED | StateSet::FOCUSED;
        assert_eq!(find_match(&specs, state), Some(0));

        assert_eq!(find_match(&specs, StateSet::PRESSED), Some(1));
        assert_eq!(find_match(&specs, StateSet::ENABLED), Some(2));
    }

    #[test]
    fn test_wildcard_fallback() {
        let specs = [
            StateSpec::requires(StateSet::PRESSED),
            StateSpec::new(StateSet::empty(), StateSet::ENABLED),
        ];

        // Nothing matches an enabled-only vector directly; the fallback
        // accepts the first spec with no positive requirements.
        assert_eq!(find_match(&specs, StateSet::ENABLED), None);
        assert_eq!(find_wildcard(&specs), Some(1));

        let none: [StateSpec; 0] = [];
        assert_eq!(find_wildcard(&none), None);
    }
}
