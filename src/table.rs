//! Owned model of an HTML `<table>`.
//!
//! A scraped document is read-only, so every table that has to be sorted,
//! filtered or merged into is lifted into a [`Table`] first and rendered back
//! to markup with [`Table::to_html`] when done.

use scraper::ElementRef;

use crate::parse::{create_selector, element_text};
use crate::sort::SortOrder;
use crate::{Result, MENU_FILTER_CLASS};

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    /// `data-sort`, tells the sorter what kind of values the column holds.
    pub data_sort: Option<String>,
    pub classes: Vec<String>,
    /// `data-sort-order` plus the matching `sort-asc`/`sort-desc` class.
    pub sort_order: Option<SortOrder>,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>, data_sort: Option<&str>) -> Self {
        Self {
            text: text.into(),
            data_sort: data_sort.map(Into::into),
            classes: Vec::new(),
            sort_order: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub text: String,
    pub classes: Vec<String>,
    pub title: Option<String>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Trimmed text of a cell, empty when the row is too short.
    pub fn text_at(&self, column: usize) -> &str {
        self.cells.get(column).map(|c| c.text.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Tag from the `.menu-filter` group the table belongs to, if any.
    pub filter: Option<String>,
    pub visible: bool,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Row>,
    /// Id of the `<tbody>`, pages address the side bet rows through it.
    pub body_id: Option<String>,
    pub(crate) sorting_enabled: bool,
}

impl Table {
    pub fn new(id: Option<&str>, headers: Vec<HeaderCell>) -> Self {
        Self {
            id: id.map(Into::into),
            classes: Vec::new(),
            filter: None,
            visible: true,
            headers,
            rows: Vec::new(),
            body_id: None,
            sorting_enabled: false,
        }
    }

    /// Lifts a `<table>` element into the model.
    /// Headers are every `th` of the table, rows are `tbody tr` with their `td` cells.
    pub fn from_element(table: ElementRef) -> Result<Self> {
        let th_selector = create_selector("th")?;
        let row_selector = create_selector("tbody tr")?;
        let td_selector = create_selector("td")?;
        let body_selector = create_selector("tbody")?;

        let el = table.value();
        let headers = table
            .select(&th_selector)
            .map(|th| HeaderCell {
                text: element_text(th),
                data_sort: th.value().attr("data-sort").map(Into::into),
                classes: th
                    .value()
                    .classes()
                    .filter(|c| SortOrder::from_class(c).is_none())
                    .map(Into::into)
                    .collect(),
                sort_order: th.value().attr("data-sort-order").and_then(SortOrder::from_attr),
            })
            .collect();
        let rows = table
            .select(&row_selector)
            .map(|tr| {
                Row::new(
                    tr.select(&td_selector)
                        .map(|td| Cell {
                            text: element_text(td),
                            classes: td.value().classes().map(Into::into).collect(),
                            title: td.value().attr("title").map(Into::into),
                        })
                        .collect(),
                )
            })
            .collect();

        Ok(Self {
            id: el.id().map(Into::into),
            classes: el.classes().map(Into::into).collect(),
            filter: menu_filter_of(table),
            visible: true,
            headers,
            rows,
            body_id: table
                .select(&body_selector)
                .next()
                .and_then(|tbody| tbody.value().id())
                .map(Into::into),
            sorting_enabled: false,
        })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_sorting_enabled(&self) -> bool {
        self.sorting_enabled
    }

    pub fn column_texts(&self, column: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r.text_at(column)).collect()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<table");
        push_attr(&mut out, "id", self.id.as_deref());
        push_classes(&mut out, self.classes.iter().map(String::as_str));
        push_attr(&mut out, "data-filter", self.filter.as_deref());
        if !self.visible {
            out.push_str(r#" style="display: none""#);
        }
        out.push_str(">\n    <thead>\n        <tr>\n");
        for h in &self.headers {
            out.push_str("            <th");
            push_attr(&mut out, "data-sort", h.data_sort.as_deref());
            push_attr(&mut out, "data-sort-order", h.sort_order.map(SortOrder::as_attr));
            push_classes(
                &mut out,
                h.classes
                    .iter()
                    .map(String::as_str)
                    .chain(h.sort_order.map(SortOrder::as_class)),
            );
            out.push('>');
            out.push_str(&escape_html(&h.text));
            out.push_str("</th>\n");
        }
        out.push_str("        </tr>\n    </thead>\n    <tbody");
        push_attr(&mut out, "id", self.body_id.as_deref());
        out.push_str(">\n");
        for row in &self.rows {
            out.push_str("        <tr>\n");
            for cell in &row.cells {
                out.push_str("            <td");
                push_attr(&mut out, "title", cell.title.as_deref());
                push_classes(&mut out, cell.classes.iter().map(String::as_str));
                out.push('>');
                out.push_str(&escape_html(&cell.text));
                out.push_str("</td>\n");
            }
            out.push_str("        </tr>\n");
        }
        out.push_str("    </tbody>\n</table>");
        out
    }
}

/// `data-filter` of the table itself when it is a `.menu-filter`,
/// otherwise of the closest `.menu-filter` ancestor.
fn menu_filter_of(table: ElementRef) -> Option<String> {
    std::iter::once(table)
        .chain(table.ancestors().filter_map(ElementRef::wrap))
        .find(|el| {
            el.value()
                .has_class(MENU_FILTER_CLASS, scraper::CaseSensitivity::CaseSensitive)
        })
        .map(|el| el.value().attr("data-filter").unwrap_or_default().to_string())
}

fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(&format!(r#" {name}="{}""#, escape_html(value)));
    }
}

fn push_classes<'a>(out: &mut String, classes: impl Iterator<Item = &'a str>) {
    let joined = classes.collect::<Vec<_>>().join(" ");
    if !joined.is_empty() {
        push_attr(out, "class", Some(&joined));
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    const PAGE: &str = r#"
        <div class="menu-filter" data-filter="6-deck">
            <table id="odds" class="mainGame">
                <thead><tr>
                    <th data-sort="betType">Bet Type</th>
                    <th data-sort="rtp" data-sort-order="asc" class="wide sort-asc">RTP</th>
                </tr></thead>
                <tbody>
                    <tr><td> Banker </td><td title="x">98.94%</td></tr>
                    <tr><td>Tie</td><td>85.64%</td></tr>
                </tbody>
            </table>
        </div>"#;

    fn first_table(html: &Html) -> Table {
        let sel = create_selector("table").unwrap();
        Table::from_element(html.select(&sel).next().unwrap()).unwrap()
    }

    #[test]
    fn lifts_headers_rows_and_filter() {
        let table = first_table(&Html::parse_document(PAGE));
        assert_eq!(table.id.as_deref(), Some("odds"));
        assert!(table.has_class("mainGame"));
        assert_eq!(table.filter.as_deref(), Some("6-deck"));
        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.headers[1].data_sort.as_deref(), Some("rtp"));
        assert_eq!(table.headers[1].sort_order, Some(SortOrder::Asc));
        assert_eq!(table.headers[1].classes, vec!["wide".to_string()]);
        assert_eq!(table.column_texts(0), vec!["Banker", "Tie"]);
        assert_eq!(table.rows[0].cells[1].title.as_deref(), Some("x"));
        assert!(!table.is_sorting_enabled());
    }

    #[test]
    fn table_outside_a_filter_group_has_no_tag() {
        let html = Html::parse_document("<table><tbody><tr><td>a</td></tr></tbody></table>");
        assert_eq!(first_table(&html).filter, None);
    }

    #[test]
    fn renders_escaped_markup_that_parses_back() {
        let mut table = Table::new(Some("t"), vec![HeaderCell::new("A&B", Some("gameName"))]);
        table.rows.push(Row::new(vec![Cell::new("<Hold'em>").with_title("Bet Type: \"Ante\"")]));
        table.visible = false;

        let html = table.to_html();
        assert!(html.contains("A&amp;B"));
        assert!(html.contains("&lt;Hold&#39;em&gt;"));
        assert!(html.contains(r#"style="display: none""#));

        let back = first_table(&Html::parse_fragment(&html));
        assert_eq!(back.headers[0].text, "A&B");
        assert_eq!(back.rows[0].cells[0].text, "<Hold'em>");
        assert_eq!(back.rows[0].cells[0].title.as_deref(), Some("Bet Type: \"Ante\""));
    }

    #[test]
    fn body_id_survives_rendering() {
        let html = Html::parse_document(
            r#"<table id="sideBets"><thead><tr><th>Bet Type</th></tr></thead>
            <tbody id="sideBets-tbody"><tr><td>Lucky Ladies</td></tr></tbody></table>"#,
        );
        let table = first_table(&html);
        assert_eq!(table.body_id.as_deref(), Some("sideBets-tbody"));

        let rendered = table.to_html();
        assert!(rendered.contains(r#"<tbody id="sideBets-tbody">"#));
        let back = first_table(&Html::parse_fragment(&rendered));
        assert_eq!(back.body_id.as_deref(), Some("sideBets-tbody"));
        assert_eq!(back.column_texts(0), vec!["Lucky Ladies"]);

        let plain = Table::new(Some("t"), vec![HeaderCell::new("A", None)]);
        assert!(plain.to_html().contains("<tbody>\n"));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let row = Row::new(vec![Cell::new(" x ")]);
        assert_eq!(row.text_at(0), "x");
        assert_eq!(row.text_at(3), "");
    }
}
