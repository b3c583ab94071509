use std::cmp::Ordering;

use crate::parse::parse_percentage;
use crate::table::{HeaderCell, Table};
use crate::{info_time, Error, Result, PERCENTAGE_SORT_TAGS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn as_class(self) -> &'static str {
        match self {
            SortOrder::Asc => "sort-asc",
            SortOrder::Desc => "sort-desc",
        }
    }

    pub fn from_attr(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn from_class(s: &str) -> Option<Self> {
        match s {
            "sort-asc" => Some(SortOrder::Asc),
            "sort-desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// How the values of a column compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Percentage,
    Text,
}

impl SortKind {
    pub fn of(header: &HeaderCell) -> Self {
        match header.data_sort.as_deref() {
            Some(tag) if PERCENTAGE_SORT_TAGS.contains(&tag) => SortKind::Percentage,
            _ => SortKind::Text,
        }
    }
}

/// Outcome of wiring a table for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    Wired,
    AlreadyWired,
    TooFewRows,
}

/// Wires the table for header sorting, unless it has one row or less.
/// A table is only ever wired once.
pub fn add_sorting_to_table(table: &mut Table) -> Attach {
    if table.sorting_enabled {
        return Attach::AlreadyWired;
    }
    if table.rows.len() <= 1 {
        return Attach::TooFewRows;
    }
    table.enable_sorting()
}

impl Table {
    /// Wires the table regardless of its current row count.
    pub fn enable_sorting(&mut self) -> Attach {
        if self.sorting_enabled {
            return Attach::AlreadyWired;
        }
        self.sorting_enabled = true;
        Attach::Wired
    }

    /// A click on header `column`: ascending on the first click, flipping after that.
    /// Markers on every other header are cleared and the body rows reordered in place.
    pub fn click_header(&mut self, column: usize) -> Result<SortOrder> {
        if !self.sorting_enabled {
            return Err(Error::SortingNotEnabled);
        }
        let len = self.headers.len();
        let header = self
            .headers
            .get(column)
            .ok_or(Error::ColumnOutOfRange { column, len })?;

        let order = header.sort_order.map_or(SortOrder::Asc, SortOrder::toggle);
        let kind = SortKind::of(header);

        for h in self.headers.iter_mut() {
            h.sort_order = None;
        }
        self.headers[column].sort_order = Some(order);

        self.sort_by_column(column, kind, order);
        log_sorting_classes(self);
        Ok(order)
    }

    /// Stable sort of the body rows by one column.
    pub fn sort_by_column(&mut self, column: usize, kind: SortKind, order: SortOrder) {
        self.rows.sort_by(|a, b| {
            let ord = compare_cells(kind, a.text_at(column), b.text_at(column));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    /// The header currently carrying a sort marker.
    pub fn active_sort(&self) -> Option<(usize, SortOrder)> {
        self.headers
            .iter()
            .enumerate()
            .find_map(|(i, h)| h.sort_order.map(|o| (i, o)))
    }
}

/// Percentage cells compare as numbers, cells that don't parse go after every number.
/// Everything else compares as text.
pub fn compare_cells(kind: SortKind, a: &str, b: &str) -> Ordering {
    match kind {
        SortKind::Percentage => match (parse_percentage(a), parse_percentage(b)) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKind::Text => compare_text(a.trim(), b.trim()),
    }
}

/// Case and accent insensitive first. On ties lowercase goes before
/// uppercase, then the raw text decides.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    fmt_sortable_entry(a)
        .cmp(&fmt_sortable_entry(b))
        .then_with(|| swap_case(a).cmp(&swap_case(b)))
        .then_with(|| a.cmp(b))
}

fn swap_case(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if c.is_lowercase() {
                c.to_uppercase().collect::<Vec<_>>()
            } else {
                c.to_lowercase().collect::<Vec<_>>()
            }
        })
        .collect()
}

pub fn sort_list_alphabetically(items: &mut [String]) {
    items.sort_by(|a, b| compare_text(&a.trim().to_uppercase(), &b.trim().to_uppercase()));
}

pub fn log_sorting_classes(table: &Table) {
    for (i, h) in table.headers.iter().enumerate() {
        let class = h.sort_order.map_or("none", SortOrder::as_class);
        info_time!("Column {}: {}", i + 1, class);
    }
}

/// Converts letters with accents to letters without accents so that the words can be
/// sorted_correctly.
#[inline]
fn fmt_sortable_entry(token: &str) -> String {
    token
        .to_lowercase()
        .replace(['á', 'à', 'â', 'ã', 'ä', 'å'], "a")
        .replace(['ç'], "c")
        .replace(['é', 'è', 'ê', 'ë'], "e")
        .replace(['í', 'ì', 'î', 'ï'], "i")
        .replace(['ó', 'ò', 'ô', 'õ', 'ö'], "o")
        .replace(['ú', 'ù', 'û', 'ü'], "u")
        .replace(['ý', 'ÿ'], "y")
        .replace(['ñ'], "n")
        .replace(['ŕ'], "r")
}
