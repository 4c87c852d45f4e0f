//! Flags and the conditions evaluated against them.

use std::collections::{BTreeMap, HashMap};

/// Index of a flag name in a [`FlagTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlagId(pub usize);

/// Named boolean flags, interned at load time.
///
/// Every flag mentioned anywhere in a story gets an id when the story is
/// loaded. Flags that were never mentioned read as unset.
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    names: Vec<String>,
    index: HashMap<String, FlagId>,
    values: Vec<bool>,
}

impl FlagTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, adding it (unset) if it is new.
    pub fn intern(&mut self, name: &str) -> FlagId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = FlagId(self.names.len());
        self.names.push(name.to_string());
        self.values.push(false);
        self.index.insert(name.to_string(), id);
        id
    }

    /// Looks up the id of a known flag.
    pub fn id(&self, name: &str) -> Option<FlagId> {
        self.index.get(name).copied()
    }

    /// Name of the flag with this id.
    pub fn name(&self, id: FlagId) -> &str {
        &self.names[id.0]
    }

    /// Whether the flag is set.
    pub fn is_set(&self, id: FlagId) -> bool {
        self.values.get(id.0).copied().unwrap_or(false)
    }

    /// Whether the named flag is set. Unknown names are unset.
    pub fn is_set_by_name(&self, name: &str) -> bool {
        self.id(name).is_some_and(|id| self.is_set(id))
    }

    /// Sets or clears a flag.
    pub fn set(&mut self, id: FlagId, value: bool) {
        if let Some(slot) = self.values.get_mut(id.0) {
            *slot = value;
        }
    }

    /// Sets or clears a flag by name, interning it if needed.
    pub fn set_by_name(&mut self, name: &str, value: bool) {
        let id = self.intern(name);
        self.set(id, value);
    }

    /// Replaces every value: flags missing from `values` become unset.
    pub fn overwrite(&mut self, values: &BTreeMap<String, bool>) {
        self.values.iter_mut().for_each(|v| *v = false);
        for (name, value) in values {
            self.set_by_name(name, *value);
        }
    }

    /// Snapshot of all known flags by name.
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        self.names
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Number of known flags.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no flag is known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One test inside a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// The flag must be set.
    FlagIsSet(FlagId),
    /// The flag must be unset.
    FlagIsNotSet(FlagId),
}

impl Clause {
    fn holds(&self, flags: &FlagTable) -> bool {
        match self {
            Self::FlagIsSet(id) => flags.is_set(*id),
            Self::FlagIsNotSet(id) => !flags.is_set(*id),
        }
    }
}

/// Visibility rule for a paragraph or an option.
///
/// A condition is a conjunction: it holds only when every clause holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Condition {
    /// Always visible.
    #[default]
    Always,
    /// Visible when all clauses hold.
    All(Vec<Clause>),
}

impl Condition {
    /// Builds a condition from resolved `if` and `unless` flag lists.
    pub fn from_lists(required: &[FlagId], forbidden: &[FlagId]) -> Self {
        if required.is_empty() && forbidden.is_empty() {
            return Self::Always;
        }
        let clauses = required
            .iter()
            .map(|id| Clause::FlagIsSet(*id))
            .chain(forbidden.iter().map(|id| Clause::FlagIsNotSet(*id)))
            .collect();
        Self::All(clauses)
    }

    /// Evaluates against the current flags.
    pub fn evaluate(&self, flags: &FlagTable) -> bool {
        match self {
            Self::Always => true,
            Self::All(clauses) => clauses.iter().all(|c| c.holds(flags)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_condition_is_always() {
        assert_eq!(Condition::from_lists(&[], &[]), Condition::Always);
        assert!(Condition::Always.evaluate(&FlagTable::new()));
    }

    #[test]
    fn conjunction_of_set_and_unset() {
        let mut flags = FlagTable::new();
        let key = flags.intern("has_key");
        let seen = flags.intern("seen_guard");
        let condition = Condition::from_lists(&[key], &[seen]);

        assert!(!condition.evaluate(&flags));
        flags.set(key, true);
        assert!(condition.evaluate(&flags));
        flags.set(seen, true);
        assert!(!condition.evaluate(&flags));
    }

    #[test]
    fn overwrite_clears_missing_flags() {
        let mut flags = FlagTable::new();
        flags.set_by_name("a", true);
        flags.set_by_name("b", true);

        let mut next = BTreeMap::new();
        next.insert("b".to_string(), true);
        next.insert("c".to_string(), true);
        flags.overwrite(&next);

        assert!(!flags.is_set_by_name("a"));
        assert!(flags.is_set_by_name("b"));
        assert!(flags.is_set_by_name("c"));
        assert_eq!(flags.len(), 3);
    }

    #[test]
    fn unknown_flag_reads_unset() {
        assert!(!FlagTable::new().is_set_by_name("ghost"));
    }
}
