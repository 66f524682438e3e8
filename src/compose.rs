// src/compose.rs
use crate::diff::EntityChanges;
use crate::snapshot::Field;

/// One push alert, ready to hand to a dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationMessage {
    pub entity: String,
    pub title: String,
    pub body: String,
}

/// Alert texts for an entity's changes.
///
/// All tracked fields changed → one combined alert. Otherwise one alert per
/// changed field (with two tracked fields that is at most one).
pub fn compose(changes: &EntityChanges, title: &str) -> Vec<NotificationMessage> {
    let msg = |body: String| NotificationMessage {
        entity: changes.entity.clone(),
        title: s!(title),
        body,
    };

    if changes.changes.is_empty() {
        return Vec::new();
    }

    if changes.is_total() {
        let local = changes.new_value(Field::Location).unwrap_or_default();
        let hora = changes.new_value(Field::Time).unwrap_or_default();
        return vec![msg(format!(
            "🎊 O bloco \"{}\" mudou tudo! Novo local: {} às {}.",
            changes.entity, local, hora
        ))];
    }

    changes
        .changes
        .iter()
        .map(|c| msg(field_text(&changes.entity, c.field, &c.new)))
        .collect()
}

fn field_text(entity: &str, field: Field, new: &str) -> String {
    match field {
        Field::Location => format!("📍 O bloco \"{entity}\" mudou de lugar! Novo local: {new}."),
        Field::Time => format!("⏰ O bloco \"{entity}\" mudou de horário! Agora é às: {new}."),
    }
}
