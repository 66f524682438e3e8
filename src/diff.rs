// src/diff.rs
use crate::snapshot::{Field, Snapshot};

/// One tracked field of a known entity that now holds a different, non-empty value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub entity: String,
    pub field: Field,
    pub old: String,
    pub new: String,
}

/// All changes for one entity, fields in [`Field::ALL`] order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityChanges {
    pub entity: String,
    pub changes: Vec<FieldChange>,
}

impl EntityChanges {
    pub fn new_value(&self, field: Field) -> Option<&str> {
        self.changes.iter().find(|c| c.field == field).map(|c| c.new.as_str())
    }

    /// Every tracked field changed at once.
    pub fn is_total(&self) -> bool {
        Field::ALL.iter().all(|f| self.new_value(*f).is_some())
    }
}

/// Outcome of comparing the fresh snapshot against the stored one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    /// Entities with at least one change, by name.
    pub changed: Vec<EntityChanges>,
    /// First sightings: recorded, never alerted on.
    pub baseline: Vec<String>,
    /// Known entities with nothing to report.
    pub unchanged: usize,
}

impl Diff {
    pub fn change_count(&self) -> usize {
        self.changed.iter().map(|e| e.changes.len()).sum()
    }
}

/// Compare `current` against `prior`.
///
/// Only names present in both are diffed. A field counts as changed when its
/// new value is non-empty and differs from the old one; a cell blanked
/// upstream is not news. Names that vanished from `current` produce nothing.
pub fn diff(prior: &Snapshot, current: &Snapshot) -> Diff {
    let mut out = Diff::default();

    for (name, now) in current.iter() {
        let Some(before) = prior.get(name) else {
            out.baseline.push(s!(name));
            continue;
        };

        let changes: Vec<FieldChange> = Field::ALL
            .iter()
            .filter_map(|&field| {
                let (old, new) = (before.get(field), now.get(field));
                (!new.is_empty() && new != old).then(|| FieldChange {
                    entity: s!(name),
                    field,
                    old: s!(old),
                    new: s!(new),
                })
            })
            .collect();

        if changes.is_empty() {
            out.unchanged += 1;
        } else {
            out.changed.push(EntityChanges { entity: s!(name), changes });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Entry;

    fn snap(items: &[(&str, &str, &str)]) -> Snapshot {
        items.iter().map(|(n, l, h)| (*n, Entry::new(*l, *h))).collect()
    }

    #[test]
    fn single_field_change() {
        let d = diff(
            &snap(&[("BlocoX", "Praça A", "14h")]),
            &snap(&[("BlocoX", "Praça B", "14h")]),
        );
        assert_eq!(d.changed.len(), 1);
        assert_eq!(d.changed[0].changes, vec![FieldChange {
            entity: s!("BlocoX"),
            field: Field::Location,
            old: s!("Praça A"),
            new: s!("Praça B"),
        }]);
        assert!(!d.changed[0].is_total());
    }

    #[test]
    fn both_fields_change() {
        let d = diff(
            &snap(&[("BlocoX", "Praça A", "14h")]),
            &snap(&[("BlocoX", "Praça B", "16h")]),
        );
        assert_eq!(d.change_count(), 2);
        assert!(d.changed[0].is_total());
        assert_eq!(d.changed[0].new_value(Field::Time), Some("16h"));
    }

    #[test]
    fn first_sighting_is_baseline_only() {
        let d = diff(&snap(&[]), &snap(&[("Novo", "Rua", "10h")]));
        assert!(d.changed.is_empty());
        assert_eq!(d.baseline, vec!["Novo"]);
    }

    #[test]
    fn blanked_value_is_not_a_change() {
        let d = diff(
            &snap(&[("BlocoX", "Praça A", "14h")]),
            &snap(&[("BlocoX", "", "14h")]),
        );
        assert!(d.changed.is_empty());
        assert_eq!(d.unchanged, 1);
    }

    #[test]
    fn value_filled_in_after_empty_is_a_change() {
        let d = diff(&snap(&[("X", "", "14h")]), &snap(&[("X", "Largo", "14h")]));
        assert_eq!(d.change_count(), 1);
        assert_eq!(d.changed[0].changes[0].old, "");
    }

    #[test]
    fn removals_are_silent() {
        let d = diff(&snap(&[("Gone", "A", "1h"), ("Kept", "B", "2h")]), &snap(&[("Kept", "B", "2h")]));
        assert_eq!(d, Diff { changed: vec![], baseline: vec![], unchanged: 1 });
    }

    #[test]
    fn identical_snapshots_are_idempotent() {
        let s = snap(&[("A", "x", "1h"), ("B", "y", "2h")]);
        let d = diff(&s, &s.clone());
        assert_eq!(d.change_count(), 0);
        assert_eq!(d.unchanged, 2);
    }
}
