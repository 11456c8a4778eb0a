// src/group.rs
//! Group-key derivation. Input tables differ in which identifying columns
//! they carry, so the columns that jointly name one curve/work unit are
//! resolved through an ordered fallback cascade. The cascade looks only at
//! which columns exist, never at row content, so two tables with the same
//! columns always group identically.

use std::collections::HashMap;

use crate::table::Table;

/// Ordered candidate key tuples plus the degraded fallbacks.
pub struct KeyCascade {
    /// Tried in order; the first tuple whose every column exists wins.
    pub candidates: &'static [&'static [&'static str]],
    /// When no candidate matches fully: the intersection of this set with
    /// the columns actually present.
    pub always: &'static [&'static str],
    /// When even the intersection is empty: the single most identifying
    /// column.
    pub last_resort: &'static str,
}

/// Cascade identifying one production curve.
pub static CURVE_KEYS: KeyCascade = KeyCascade {
    candidates: &[
        &["IdEmpreendimento", "Obra", "SimulacaoId"],
        &["IdEmpreendimento", "SimulacaoId"],
        &["IdEmpreendimento", "Obra"],
        &["IdEmpreendimento"],
    ],
    always: &["IdEmpreendimento", "Obra", "SimulacaoId"],
    last_resort: "IdEmpreendimento",
};

impl KeyCascade {
    /// Resolve the key columns for `table`.
    pub fn resolve(&self, table: &Table) -> Vec<String> {
        for candidate in self.candidates {
            if candidate.iter().all(|c| table.column(c).is_some()) {
                return candidate.iter().map(|c| c.to_string()).collect();
            }
        }
        let present: Vec<String> = self
            .always
            .iter()
            .filter(|c| table.column(c).is_some())
            .map(|c| c.to_string())
            .collect();
        if present.is_empty() {
            vec![self.last_resort.to_string()]
        } else {
            present
        }
    }
}

/// Row indices of `table` bucketed by the display values of `key_columns`.
/// Rows keep their table order inside each bucket. Key columns missing from
/// the table contribute an empty component, which matches how blank cells
/// group.
pub fn group_rows(table: &Table, key_columns: &[String]) -> HashMap<Vec<String>, Vec<usize>> {
    let indices: Vec<Option<usize>> = key_columns.iter().map(|c| table.column(c)).collect();
    let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for row in 0..table.rows.len() {
        let key: Vec<String> = indices
            .iter()
            .map(|idx| match idx {
                Some(i) => table.cell(row, *i).display(),
                None => String::new(),
            })
            .collect();
        groups.entry(key).or_default().push(row);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn table(headers: &[&str]) -> Table {
        Table::new(headers.iter().map(|h| h.to_string()).collect())
    }

    #[test]
    fn most_specific_candidate_wins() {
        let t = table(&["IdEmpreendimento", "Obra", "SimulacaoId", "VPObra"]);
        assert_eq!(
            CURVE_KEYS.resolve(&t),
            vec!["IdEmpreendimento", "Obra", "SimulacaoId"]
        );
    }

    #[test]
    fn cascade_degrades_in_priority_order() {
        let t = table(&["IdEmpreendimento", "SimulacaoId"]);
        assert_eq!(
            CURVE_KEYS.resolve(&t),
            vec!["IdEmpreendimento", "SimulacaoId"]
        );
        let t = table(&["IdEmpreendimento", "Obra"]);
        assert_eq!(CURVE_KEYS.resolve(&t), vec!["IdEmpreendimento", "Obra"]);
        let t = table(&["IdEmpreendimento"]);
        assert_eq!(CURVE_KEYS.resolve(&t), vec!["IdEmpreendimento"]);
    }

    #[test]
    fn last_resort_when_nothing_identifying_exists() {
        let t = table(&["VPObra"]);
        assert_eq!(CURVE_KEYS.resolve(&t), vec!["IdEmpreendimento"]);
    }

    #[test]
    fn grouping_preserves_row_order_within_buckets() {
        let mut t = table(&["Obra", "V"]);
        for (obra, v) in [("a", "1"), ("b", "2"), ("a", "3")] {
            t.push_row(vec![Cell::Text(obra.into()), Cell::Text(v.into())]);
        }
        let groups = group_rows(&t, &["Obra".to_string()]);
        assert_eq!(groups[&vec!["a".to_string()]], vec![0, 2]);
        assert_eq!(groups[&vec!["b".to_string()]], vec![1]);
    }
}
