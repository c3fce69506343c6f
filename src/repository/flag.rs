use std::fmt::Display;

/// Tags of a cached message, kept strictly ascending without duplicates so
/// membership checks can use binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Flags(Vec<String>);

impl Flags {
    pub fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_ok()
    }

    /// Inserts `tag` at its sorted position. Returns whether it was missing.
    pub fn insert(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Ok(_) => false,
            Err(index) => {
                self.0.insert(index, tag.to_string());
                true
            }
        }
    }

    /// Removes `tag` by index. Returns whether it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.position(tag) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Adds every tag of `add`, then removes every tag of `remove`.
    /// Returns whether anything changed.
    pub fn apply<A, R>(&mut self, add: &[A], remove: &[R]) -> bool
    where
        A: AsRef<str>,
        R: AsRef<str>,
    {
        let mut modified = false;
        for tag in add {
            modified |= self.insert(tag.as_ref());
        }
        for tag in remove {
            modified |= self.remove(tag.as_ref());
        }
        modified
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, tag: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|probe| probe.as_str().cmp(tag))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Flags {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut flags: Vec<String> = iter.into_iter().map(|s| s.as_ref().to_string()).collect();
        flags.sort();
        flags.dedup();
        Self(flags)
    }
}

impl Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.0.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    fn is_strictly_ascending(flags: &Flags) -> bool {
        flags
            .iter()
            .zip(flags.iter().skip(1))
            .all(|(a, b)| a < b)
    }

    #[fixture]
    fn flags() -> Flags {
        [r"\Seen", "$label1", r"\Flagged"].into_iter().collect()
    }

    #[rstest]
    fn test_collecting_sorts_and_dedups() {
        let flags: Flags = ["b", "a", "b", "c"].into_iter().collect();
        assert_eq!(vec!["a", "b", "c"], flags.iter().collect::<Vec<_>>());
    }

    #[rstest]
    fn test_insert_keeps_order(mut flags: Flags) {
        assert!(flags.insert(r"\Answered"));
        assert!(flags.contains(r"\Answered"));
        assert!(is_strictly_ascending(&flags));
    }

    #[rstest]
    fn test_insert_of_present_tag_is_noop(mut flags: Flags) {
        let before = flags.clone();
        assert!(!flags.insert(r"\Seen"));
        assert_eq!(before, flags);
    }

    #[rstest]
    fn test_remove_of_missing_tag_is_noop(mut flags: Flags) {
        let before = flags.clone();
        assert!(!flags.remove(r"\Draft"));
        assert_eq!(before, flags);
    }

    #[rstest]
    #[case(&[r"\Seen"], &[])]
    #[case(&["zeta", "alpha"], &[r"\Flagged"])]
    #[case(&["x", "x"], &["x"])]
    #[case(&[], &["$label1", "missing"])]
    fn test_apply_keeps_flags_strictly_ascending(
        mut flags: Flags,
        #[case] add: &[&str],
        #[case] remove: &[&str],
    ) {
        flags.apply(add, remove);
        assert!(is_strictly_ascending(&flags));
        for tag in remove {
            assert!(!flags.contains(tag));
        }
    }

    #[rstest]
    #[case(&[r"\Answered", "new"], &[r"\Seen"])]
    #[case(&["$label1"], &["$label1"])]
    #[case(&[], &[])]
    fn test_swapped_apply_restores_original(
        flags: Flags,
        #[case] add: &[&str],
        #[case] remove: &[&str],
    ) {
        // only tags that really changed can be restored by swapping
        let add: Vec<&str> = add.iter().copied().filter(|t| !flags.contains(t)).collect();
        let remove: Vec<&str> = remove
            .iter()
            .copied()
            .filter(|t| flags.contains(t) && !add.contains(t))
            .collect();
        let mut changed = flags.clone();
        changed.apply(&add, &remove);
        changed.apply(&remove, &add);
        assert_eq!(flags, changed);
    }

    #[rstest]
    fn test_display_lists_tags(flags: Flags) {
        assert_eq!(r"($label1 \Flagged \Seen)", flags.to_string());
    }
}
