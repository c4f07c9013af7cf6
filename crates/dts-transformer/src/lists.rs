//! Element removal in separated lists (`a, b, c`, `A | B | C`).

use std::ops::Range;
use text_edit::{EditBuffer, EditError};

/// Outcome of [`remove_list_items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListEdit {
    /// Nothing was marked.
    Unchanged,
    /// Some elements were removed; the list is still non-empty.
    Pruned,
    /// Every element was marked. Nothing was edited; the caller decides
    /// what replaces the whole list.
    Emptied,
}

/// Removes the marked elements of a separated list.
///
/// Exactly one separator goes with every run of removed elements: the one
/// after the run, or for a run at the end of the list the one before it.
/// No dangling separator is left at either list boundary.
pub(crate) fn remove_list_items(
    buffer: &mut EditBuffer<'_>,
    items: &[Range<usize>],
    removed: &[bool],
) -> Result<ListEdit, EditError> {
    debug_assert_eq!(items.len(), removed.len());
    if !removed.iter().any(|r| *r) {
        return Ok(ListEdit::Unchanged);
    }
    if removed.iter().all(|r| *r) {
        return Ok(ListEdit::Emptied);
    }

    let mut idx = 0;
    while idx < items.len() {
        if !removed[idx] {
            idx += 1;
            continue;
        }
        let first = idx;
        while idx < items.len() && removed[idx] {
            idx += 1;
        }
        let last = idx - 1;
        if idx < items.len() {
            buffer.remove(items[first].start, items[idx].start)?;
        } else {
            buffer.remove(items[first - 1].end, items[last].end)?;
        }
    }
    Ok(ListEdit::Pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ranges(source: &str, names: &[&str]) -> Vec<Range<usize>> {
        names
            .iter()
            .map(|name| {
                let start = source.find(name).unwrap();
                start..start + name.len()
            })
            .collect()
    }

    fn prune(source: &str, names: &[&str], removed: &[bool]) -> (ListEdit, String) {
        let mut buffer = EditBuffer::new(source);
        let edit = remove_list_items(&mut buffer, &ranges(source, names), removed).unwrap();
        (edit, buffer.finish())
    }

    #[test]
    fn test_first_element_takes_following_separator() {
        let (edit, out) = prune("export { a, b, c };", &["a", "b", "c"], &[true, false, false]);
        assert_eq!(edit, ListEdit::Pruned);
        assert_eq!(out, "export { b, c };");
    }

    #[test]
    fn test_middle_run() {
        let (_, out) = prune(
            "export { aa, bb, cc, dd };",
            &["aa", "bb", "cc", "dd"],
            &[false, true, true, false],
        );
        assert_eq!(out, "export { aa, dd };");
    }

    #[test]
    fn test_last_element_takes_preceding_separator() {
        let (_, out) = prune("export { a, b, c };", &["a", "b", "c"], &[false, false, true]);
        assert_eq!(out, "export { a, b };");
    }

    #[test]
    fn test_trailing_comma_survives() {
        let (_, out) = prune("export {\n  a,\n  b,\n};", &["a", "b"], &[false, true]);
        assert_eq!(out, "export {\n  a,\n};");
    }

    #[test]
    fn test_union_members() {
        let (_, out) = prune("type T = A | B | C;", &["A", "B", "C"], &[true, false, true]);
        assert_eq!(out, "type T = B;");
    }

    #[test]
    fn test_everything_marked_is_reported() {
        let (edit, out) = prune("export { a };", &["a"], &[true]);
        assert_eq!(edit, ListEdit::Emptied);
        assert_eq!(out, "export { a };");
    }
}
