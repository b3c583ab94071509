//! State and handlers of a main site page: search box, deck menu, sorted
//! game lists and the side bet table that is filled from other pages.

use std::collections::HashSet;

use scraper::{ElementRef, Html};

use crate::parse::{create_selector, element_text, game_name};
use crate::request::PageSource;
use crate::rtp::scrape_page;
use crate::sort::{add_sorting_to_table, sort_list_alphabetically};
use crate::table::{escape_html, Cell, Table};
use crate::{
    error_time, info_time, Result, CURRENT_PAGE, DECK_COLUMN_COUNT, INDEX_PATH, MENU_SELECT_ID,
    SELECT_ALL, SIDE_BETS_TABLE_ID, SORTED_LIST_IDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub text: String,
    /// `data-name`, only set on `.game-item`s.
    pub name: Option<String>,
    /// `data-url`, where a click on the item leads.
    pub url: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedList {
    pub id: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuSelect {
    pub options: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct MainPage {
    path: String,
    /// `data-game` on `<body>`.
    pub game: Option<String>,
    /// `data-side-bets` on `<body>`, comma separated page urls.
    pub side_bet_files: Option<String>,
    pub menu: Option<MenuSelect>,
    pub tables: Vec<Table>,
    pub lists: Vec<NamedList>,
}

impl MainPage {
    pub fn parse(html: &str, path: &str) -> Result<Self> {
        Self::from_document(&Html::parse_document(html), path)
    }

    pub fn from_document(doc: &Html, path: &str) -> Result<Self> {
        let body_selector = create_selector("body")?;
        let table_selector = create_selector("table")?;
        let select_selector = create_selector(&format!("#{MENU_SELECT_ID}"))?;
        let option_selector = create_selector("option")?;

        let body = doc.select(&body_selector).next();
        let body_attr = |name: &str| body.and_then(|b| b.value().attr(name)).map(String::from);

        let menu = doc.select(&select_selector).next().map(|select| {
            let options = select
                .select(&option_selector)
                .map(option_value)
                .collect::<Vec<_>>();
            let value = select
                .select(&option_selector)
                .find(|o| o.value().attr("selected").is_some())
                .map(option_value)
                .or_else(|| options.first().cloned())
                .unwrap_or_default();
            MenuSelect { options, value }
        });

        let tables = doc
            .select(&table_selector)
            .map(Table::from_element)
            .collect::<Result<Vec<_>>>()?;

        let mut lists = Vec::new();
        for id in SORTED_LIST_IDS {
            let selector = create_selector(&format!("#{id} li"))?;
            let items = doc.select(&selector).map(list_item).collect::<Vec<_>>();
            if !items.is_empty() {
                lists.push(NamedList {
                    id: id.to_string(),
                    items,
                });
            }
        }

        Ok(Self {
            path: path.into(),
            game: body_attr("data-game"),
            side_bet_files: body_attr("data-side-bets"),
            menu,
            tables,
            lists,
        })
    }

    pub async fn load(source: &impl PageSource, url: &str) -> Result<Self> {
        let path = url.to_string();
        scrape_page(source, url, move |doc| MainPage::from_document(doc, &path)).await?
    }

    /// Loads the page the source is based on. `path` is only kept to tell
    /// the index apart from game pages.
    pub async fn load_current(source: &impl PageSource, path: &str) -> Result<Self> {
        let path = path.to_string();
        scrape_page(source, CURRENT_PAGE, move |doc| MainPage::from_document(doc, &path)).await?
    }

    pub fn is_index(&self) -> bool {
        self.path == INDEX_PATH
    }

    pub fn side_bets_table(&self) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.id.as_deref() == Some(SIDE_BETS_TABLE_ID))
    }

    pub fn side_bets_table_mut(&mut self) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(SIDE_BETS_TABLE_ID))
    }

    /// Deck tags of the page's own `.menu-filter` tables.
    pub fn filter_tags(&self) -> HashSet<String> {
        self.tables.iter().filter_map(|t| t.filter.clone()).collect()
    }

    /// Shows the game items whose name contains `query`, case-insensitively.
    /// Only the index page has a search box.
    pub fn search(&mut self, query: &str) {
        if !self.is_index() {
            return;
        }
        let query = query.to_lowercase();
        for item in self.lists.iter_mut().flat_map(|l| l.items.iter_mut()) {
            if let Some(name) = &item.name {
                item.visible = name.to_lowercase().contains(&query);
            }
        }
    }

    /// Where clicking the game item named `name` leads.
    pub fn navigate_to(&self, name: &str) -> Option<&str> {
        if !self.is_index() {
            return None;
        }
        self.lists
            .iter()
            .flat_map(|l| l.items.iter())
            .find(|i| i.name.as_deref() == Some(name))
            .and_then(|i| i.url.as_deref())
    }

    /// Shows a filterable table when its tag is the selection, or everything on `all`.
    pub fn filter_tables(&mut self, selection: &str) {
        for table in self.tables.iter_mut() {
            if let Some(tag) = &table.filter {
                table.visible = selection == SELECT_ALL || selection == tag;
            }
        }
    }

    /// Refills the side bet table from the pages in `data-side-bets`.
    ///
    /// Only tables whose deck tag is selected and also exists on this page
    /// are merged. Pages are fetched one after the other, a failing page is
    /// logged and skipped.
    pub async fn update_side_bets(&mut self, source: &impl PageSource, selection: &str) {
        let Some(files) = self.side_bet_files.clone() else {
            return;
        };
        let main_tags = self.filter_tags();
        let Some(side_bets) = self.side_bets_table_mut() else {
            error_time!("Page lists side bets but has no #{SIDE_BETS_TABLE_ID} table.");
            return;
        };
        side_bets.rows.clear();
        let columns = side_bets.headers.len();

        for file in files.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let scraped = scrape_page(source, file, |doc| -> Result<(String, Vec<Table>)> {
                Ok((game_name(doc)?, filter_tables_of(doc)?))
            })
            .await
            .and_then(|r| r);
            let (header, tables) = match scraped {
                Ok(s) => s,
                Err(e) => {
                    error_time!("Error fetching or processing side bets from {file}: {e}");
                    continue;
                }
            };

            let mut merged = 0;
            for table in tables {
                let deck = table.filter.unwrap_or_default();
                let selected = selection == SELECT_ALL || selection == deck;
                if !selected || !main_tags.contains(&deck) {
                    continue;
                }
                for mut row in table.rows {
                    relabel_row(&mut row.cells, &header, &deck, columns);
                    side_bets.rows.push(row);
                    merged += 1;
                }
            }
            info_time!("Merged {merged} side bet rows from {file}");
        }

        side_bets.enable_sorting();
    }

    /// Menu change: filter the tables, then refill the side bets.
    pub async fn select(&mut self, source: &impl PageSource, option: &str) {
        if let Some(menu) = self.menu.as_mut() {
            menu.value = option.to_string();
        }
        self.filter_tables(option);
        self.update_side_bets(source, option).await;
    }

    /// Everything the page does once loaded.
    pub async fn initialize(&mut self, source: &impl PageSource) {
        if let Some(value) = self.menu.as_ref().map(|m| m.value.clone()) {
            self.filter_tables(&value);
            self.update_side_bets(source, &value).await;
        }
        if self.is_index() {
            self.sort_lists();
        }
        for table in self.tables.iter_mut() {
            if table.id.as_deref() == Some(SIDE_BETS_TABLE_ID) {
                table.enable_sorting();
            } else {
                add_sorting_to_table(table);
            }
        }
    }

    pub fn sort_lists(&mut self) {
        for list in self.lists.iter_mut() {
            let mut keys = list.items.iter().map(|i| i.text.clone()).collect::<Vec<_>>();
            sort_list_alphabetically(&mut keys);
            // Reorder the items to follow the sorted texts; equal texts keep their order.
            let mut items = std::mem::take(&mut list.items);
            for key in keys {
                if let Some(pos) = items.iter().position(|i| i.text == key) {
                    list.items.push(items.remove(pos));
                }
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<main>\n");
        for list in &self.lists {
            out.push_str(&format!(r#"<ul id="{}">"#, escape_html(&list.id)));
            out.push('\n');
            for item in &list.items {
                out.push_str("    <li");
                if item.name.is_some() {
                    out.push_str(r#" class="game-item""#);
                }
                for (attr, value) in [("data-name", &item.name), ("data-url", &item.url)] {
                    if let Some(value) = value {
                        out.push_str(&format!(r#" {attr}="{}""#, escape_html(value)));
                    }
                }
                if !item.visible {
                    out.push_str(r#" style="display: none""#);
                }
                out.push_str(&format!(">{}</li>\n", escape_html(&item.text)));
            }
            out.push_str("</ul>\n");
        }
        for table in &self.tables {
            out.push_str(&table.to_html());
            out.push('\n');
        }
        out.push_str("</main>\n");
        out
    }
}

/// Prefixes the bet type with the page header, adds the deck column when the
/// side bet table has one, and numbers the cells `column-N`.
fn relabel_row(cells: &mut Vec<Cell>, header: &str, deck: &str, columns: usize) {
    if let Some(first) = cells.first_mut() {
        first.text = format!("{header} - {}", first.text);
    }
    if columns == DECK_COLUMN_COUNT {
        cells.insert(cells.len().min(1), Cell::new(deck));
    }
    for (i, cell) in cells.iter_mut().enumerate() {
        cell.classes.push(format!("column-{}", i + 1));
    }
}

fn filter_tables_of(doc: &Html) -> Result<Vec<Table>> {
    let selector = create_selector("table")?;
    let tables = doc
        .select(&selector)
        .map(Table::from_element)
        .collect::<Result<Vec<_>>>()?;
    Ok(tables.into_iter().filter(|t| t.filter.is_some()).collect())
}

fn option_value(option: ElementRef) -> String {
    option
        .value()
        .attr("value")
        .map(String::from)
        .unwrap_or_else(|| element_text(option))
}

fn list_item(li: ElementRef) -> ListItem {
    let el = li.value();
    let is_game = el.has_class("game-item", scraper::CaseSensitivity::CaseSensitive);
    ListItem {
        text: element_text(li),
        name: is_game.then(|| el.attr("data-name").unwrap_or_default().to_string()),
        url: el.attr("data-url").map(String::from),
        visible: true,
    }
}
