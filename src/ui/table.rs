use chrono::{DateTime, Utc};
use tabled::{settings::Style, Table, Tabled};
use crate::profile::{ProfileId, ProfileSummary};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            field: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "ID")]
    id: ProfileId,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Profile list with the active profile marked
pub fn profiles_table(profiles: &[ProfileSummary], current: Option<ProfileId>, now: DateTime<Utc>) -> String {
    if profiles.is_empty() {
        return String::new();
    }

    let rows: Vec<ProfileRow> = profiles
        .iter()
        .map(|p| ProfileRow {
            marker: if Some(p.id) == current { "*" } else { "" },
            id: p.id,
            name: p.name.clone(),
            updated: p.updated_label(now),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_profiles_table_marks_current() {
        let now = Utc::now();
        let profiles = vec![
            ProfileSummary { id: 2, name: "Manager Track".into(), updated_at: now },
            ProfileSummary { id: 1, name: "Default Profile".into(), updated_at: now - Duration::days(3) },
        ];

        let table = profiles_table(&profiles, Some(2), now);
        let marked = table.lines().find(|l| l.contains("Manager Track")).unwrap();
        assert!(marked.contains('*'));
        assert!(marked.contains("Today"));
        let other = table.lines().find(|l| l.contains("Default Profile")).unwrap();
        assert!(!other.contains('*'));
        assert!(other.contains("3 days ago"));
    }

    #[test]
    fn test_empty_inputs_render_nothing() {
        assert!(profiles_table(&[], None, Utc::now()).is_empty());
        assert!(TableBuilder::new().build().is_empty());
    }
}
