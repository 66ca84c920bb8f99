//! Dependency chain rules between system libraries
//!
//! Linking against a system copy of a media library requires system copies of
//! the libraries it was built against: a bundled libogg cannot satisfy a
//! system libtheora. The rules below force those sources.
//!
//! Rules are applied in one pass, in declaration order. A rule whose source
//! could still be forced by a later rule would need a second pass, so the
//! table is checked at compile time to be ordered: no rule forces the source
//! of an earlier rule. That also rules out cycles.

use symconf_config::{LibrarySource, OptionSet, SystemLibrary};

/// "If `source` uses the system copy, force `implied` to `implied_value`"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyRule {
    pub source: SystemLibrary,
    pub implied: SystemLibrary,
    pub implied_value: LibrarySource,
}

impl DependencyRule {
    pub const fn new(
        source: SystemLibrary,
        implied: SystemLibrary,
        implied_value: LibrarySource,
    ) -> Self {
        Self {
            source,
            implied,
            implied_value,
        }
    }

    const fn requires_system(source: SystemLibrary, implied: SystemLibrary) -> Self {
        Self::new(source, implied, LibrarySource::System)
    }
}

/// Fixed rule table
///
/// Order matters: theora forces vorbis before vorbis' own rule runs.
pub const DEPENDENCY_RULES: [DependencyRule; 4] = [
    DependencyRule::requires_system(SystemLibrary::Theora, SystemLibrary::Ogg),
    DependencyRule::requires_system(SystemLibrary::Theora, SystemLibrary::Vorbis),
    DependencyRule::requires_system(SystemLibrary::Vorbis, SystemLibrary::Ogg),
    DependencyRule::requires_system(SystemLibrary::Opus, SystemLibrary::Ogg),
];

/// Check that a single pass over `rules` reaches a fixed point
pub const fn rules_are_ordered(rules: &[DependencyRule]) -> bool {
    let mut i = 0;
    while i < rules.len() {
        if rules[i].source.index() == rules[i].implied.index() {
            return false;
        }
        let mut j = i;
        while j < rules.len() {
            if rules[j].implied.index() == rules[i].source.index() {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    rules_are_ordered(&DEPENDENCY_RULES),
    "dependency rules must be ordered so one pass reaches a fixed point"
);

/// Apply the fixed dependency rules
pub fn resolve(options: &OptionSet) -> OptionSet {
    apply_rules(options, &DEPENDENCY_RULES)
}

/// Apply `rules` in one pass over a copy of `options`
///
/// When several rules target the same library the last one wins.
pub fn apply_rules(options: &OptionSet, rules: &[DependencyRule]) -> OptionSet {
    let mut resolved = options.clone();

    for rule in rules {
        if !resolved.libraries.is_system(rule.source) {
            continue;
        }

        let current = resolved.libraries.get(rule.implied);
        if current != rule.implied_value {
            tracing::debug!(
                "{} forces {} to {:?} (was {:?})",
                rule.source.option_name(),
                rule.implied.option_name(),
                rule.implied_value,
                current
            );
        }
        resolved.libraries.set(rule.implied, rule.implied_value);
    }

    resolved
}
