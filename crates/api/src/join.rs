use std::collections::BTreeMap;

/// Named fan-out/fan-in join over a set of pending loads.
///
/// The primary and secondary load phases fetch several layers concurrently
/// and must not compute derived data (report counts, layer controls) until
/// every named slot has resolved. A slot resolves exactly once; completing
/// an unknown or already-resolved slot is a caller bug and is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJoin<T> {
    slots: BTreeMap<&'static str, Option<T>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum JoinError {
    UnknownSlot(&'static str),
    AlreadyResolved(&'static str),
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinError::UnknownSlot(name) => write!(f, "unknown join slot '{name}'"),
            JoinError::AlreadyResolved(name) => write!(f, "join slot '{name}' already resolved"),
        }
    }
}

impl std::error::Error for JoinError {}

impl<T> LoadJoin<T> {
    pub fn new(names: &[&'static str]) -> Self {
        LoadJoin {
            slots: names.iter().map(|&name| (name, None)).collect(),
        }
    }

    pub fn resolve(&mut self, name: &'static str, value: T) -> Result<(), JoinError> {
        match self.slots.get_mut(name) {
            None => Err(JoinError::UnknownSlot(name)),
            Some(Some(_)) => Err(JoinError::AlreadyResolved(name)),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    pub fn pending(&self) -> Vec<&'static str> {
        self.slots
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(&k, _)| k)
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.slots.get(name).and_then(Option::as_ref)
    }

    /// Consumes the join once complete; `None` while loads are outstanding.
    pub fn finish(self) -> Option<BTreeMap<&'static str, T>> {
        self.slots
            .into_iter()
            .map(|(name, value)| value.map(|value| (name, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{JoinError, LoadJoin};

    #[test]
    fn completes_only_when_every_slot_resolves() {
        let mut join: LoadJoin<u32> = LoadJoin::new(&["reports", "subdistrict"]);
        assert!(!join.is_complete());

        join.resolve("reports", 10).unwrap();
        assert!(!join.is_complete());
        assert_eq!(join.pending(), vec!["subdistrict"]);

        join.resolve("subdistrict", 20).unwrap();
        assert!(join.is_complete());

        let results = join.finish().expect("complete");
        assert_eq!(results["reports"], 10);
        assert_eq!(results["subdistrict"], 20);
    }

    #[test]
    fn duplicate_or_unknown_resolution_is_rejected() {
        let mut join: LoadJoin<u32> = LoadJoin::new(&["reports"]);
        join.resolve("reports", 1).unwrap();
        assert_eq!(
            join.resolve("reports", 2),
            Err(JoinError::AlreadyResolved("reports"))
        );
        assert_eq!(
            join.resolve("pumps", 3),
            Err(JoinError::UnknownSlot("pumps"))
        );
        // The first value survives the rejected duplicate.
        assert_eq!(join.get("reports"), Some(&1));
    }

    #[test]
    fn finish_before_completion_returns_nothing() {
        let join: LoadJoin<u32> = LoadJoin::new(&["reports"]);
        assert!(join.finish().is_none());
    }
}
