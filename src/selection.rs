/*!
 * Category selection
 *
 * Lays the category checkboxes out in a fixed number of columns and enforces
 * the limit on how many categories may be selected at once.
 */

use serde::Serialize;

/// One category checkbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkbox {
    pub label: String,
    pub checked: bool,
}

/// Checkboxes arranged column by column
///
/// Category `i` (in sorted order) sits in column `i % columns`, so reading
/// row by row reproduces the sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxGrid {
    pub columns: Vec<Vec<Checkbox>>,
}

impl CheckboxGrid {
    /// Build the grid; `checked` holds the labels currently ticked
    pub fn new<S: AsRef<str>>(categories: &[String], checked: &[S], columns: usize) -> Self {
        let columns = columns.max(1);
        let mut grid = vec![Vec::new(); columns];
        for (i, label) in categories.iter().enumerate() {
            grid[i % columns].push(Checkbox {
                label: label.clone(),
                checked: checked.iter().any(|c| c.as_ref() == label),
            });
        }
        Self { columns: grid }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, i.e. the height of the tallest column
    pub fn row_count(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Checkbox at a given row and column, if that cell is filled
    pub fn cell(&self, row: usize, column: usize) -> Option<&Checkbox> {
        self.columns.get(column)?.get(row)
    }

    /// Checkboxes in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &Checkbox> {
        (0..self.row_count())
            .flat_map(move |row| (0..self.column_count()).filter_map(move |col| self.cell(row, col)))
    }
}

/// Result of applying the selection limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Kept categories in the order they were selected
    pub categories: Vec<String>,
    /// Number of selections discarded because of the limit
    pub dropped: usize,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn was_truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Keep the first `max` selections, in selection order
pub fn apply_selection_limit(checked: &[String], max: usize) -> Selection {
    let kept = checked.len().min(max);
    Selection {
        categories: checked[..kept].to_vec(),
        dropped: checked.len() - kept,
    }
}

/// Toggle a label in a selection list, appending newly checked labels
pub fn toggle(checked: &mut Vec<String>, label: &str) {
    match checked.iter().position(|c| c == label) {
        Some(i) => {
            checked.remove(i);
        }
        None => checked.push(label.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_grid_places_by_modulo() {
        let cats = labels(&["a", "b", "c", "d", "e"]);
        let grid = CheckboxGrid::new(&cats, &["d"], 3);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.columns[0].iter().map(|c| c.label.as_str()).collect::<Vec<_>>(), vec!["a", "d"]);
        assert_eq!(grid.columns[2].len(), 1);
        assert!(grid.cell(1, 0).unwrap().checked);
        assert!(grid.cell(1, 2).is_none());
        let order: Vec<&str> = grid.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_grid_zero_columns_falls_back_to_one() {
        let grid = CheckboxGrid::new(&labels(&["a", "b"]), &[] as &[String], 0);
        assert_eq!(grid.column_count(), 1);
        assert_eq!(grid.row_count(), 2);
    }

    #[test]
    fn test_limit_keeps_first_in_selection_order() {
        let checked = labels(&["연고", "감기약", "혈압약", "소화제", "파스"]);
        let selection = apply_selection_limit(&checked, 3);
        assert_eq!(selection.categories, labels(&["연고", "감기약", "혈압약"]));
        assert_eq!(selection.dropped, 2);
        assert!(selection.was_truncated());
    }

    #[test]
    fn test_limit_under_cap_is_untouched() {
        let checked = labels(&["연고"]);
        let selection = apply_selection_limit(&checked, 3);
        assert_eq!(selection.categories, checked);
        assert!(!selection.was_truncated());
        assert!(apply_selection_limit(&[], 3).is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut checked = labels(&["a"]);
        toggle(&mut checked, "b");
        toggle(&mut checked, "a");
        assert_eq!(checked, labels(&["b"]));
    }
}
