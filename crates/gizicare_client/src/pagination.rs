//! Compact page-button lists for paged tables.

use serde::Serialize;
use std::fmt;

/// Rows per page on the activity history screen.
pub const DEFAULT_PER_PAGE: usize = 5;
/// Window width around the current page.
pub const DEFAULT_MAX_BUTTONS: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageButton {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageButton {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(n) => s.serialize_u32(*n),
            Self::Ellipsis => s.serialize_str("..."),
        }
    }
}

impl fmt::Display for PageButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("..."),
        }
    }
}

/// Buttons to show for `current` (1-based) out of `total` pages.
///
/// Short ranges list every page; longer ones keep the first and last page
/// as anchors around a window of `max_buttons` pages. `current` is clamped
/// into `1..=total`.
pub fn pagination_display(current: u32, total: u32, max_buttons: u32) -> Vec<PageButton> {
    if total == 0 {
        return Vec::new();
    }
    let max_buttons = max_buttons.max(1);
    if total <= max_buttons + 2 {
        return (1..=total).map(PageButton::Page).collect();
    }
    let current = current.clamp(1, total);

    let mut buttons = Vec::with_capacity(max_buttons as usize + 4);
    if current <= max_buttons {
        buttons.extend((1..=max_buttons).map(PageButton::Page));
        buttons.push(PageButton::Ellipsis);
        buttons.push(PageButton::Page(total));
    } else if current > total - max_buttons {
        buttons.push(PageButton::Page(1));
        buttons.push(PageButton::Ellipsis);
        buttons.extend((total - max_buttons + 1..=total).map(PageButton::Page));
    } else {
        buttons.push(PageButton::Page(1));
        buttons.push(PageButton::Ellipsis);
        let start = current - (max_buttons - 1) / 2;
        buttons.extend((start..start + max_buttons).map(PageButton::Page));
        buttons.push(PageButton::Ellipsis);
        buttons.push(PageButton::Page(total));
    }
    buttons
}

pub fn total_pages(len: usize, per_page: usize) -> u32 {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page) as u32
}

/// Rows of page `page` (1-based). Out-of-range pages are empty.
pub fn page_slice<T>(items: &[T], page: u32, per_page: usize) -> &[T] {
    if page == 0 || per_page == 0 {
        return &[];
    }
    let start = (page as usize - 1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageButton::{Ellipsis, Page};

    #[test]
    fn first_page_of_ten() {
        assert_eq!(
            pagination_display(1, 10, 3),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn last_page_of_ten() {
        assert_eq!(
            pagination_display(10, 10, 3),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn middle_page_has_two_ellipses() {
        assert_eq!(
            pagination_display(5, 10, 3),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn short_range_lists_everything() {
        assert_eq!(
            pagination_display(2, 4, 3),
            vec![Page(1), Page(2), Page(3), Page(4)]
        );
        assert_eq!(pagination_display(1, 5, 3).len(), 5);
        assert!(pagination_display(1, 0, 3).is_empty());
    }

    #[test]
    fn never_repeats_adjacent_pages() {
        for max in 1..=5 {
            for total in 1..=30 {
                for current in 1..=total {
                    let buttons = pagination_display(current, total, max);
                    let pages: Vec<u32> = buttons
                        .iter()
                        .filter_map(|b| match b {
                            Page(n) => Some(*n),
                            Ellipsis => None,
                        })
                        .collect();
                    assert!(
                        pages.windows(2).all(|w| w[0] < w[1]),
                        "max={max} total={total} current={current}: {buttons:?}"
                    );
                    assert!(pages.contains(&current));
                    for pair in buttons.windows(2) {
                        assert_ne!(pair[0], pair[1]);
                    }
                }
            }
        }
    }

    #[test]
    fn ellipsis_serializes_as_dots() {
        let v = serde_json::to_value(pagination_display(1, 10, 3)).unwrap();
        assert_eq!(v, serde_json::json!([1, 2, 3, "...", 10]));
    }

    #[test]
    fn slices_pages() {
        let rows: Vec<u32> = (1..=12).collect();
        assert_eq!(total_pages(rows.len(), 5), 3);
        assert_eq!(page_slice(&rows, 3, 5), &[11, 12]);
        assert!(page_slice(&rows, 4, 5).is_empty());
        assert!(page_slice(&rows, 0, 5).is_empty());
        assert_eq!(total_pages(0, 5), 0);
    }
}
