use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::rtp::RtpSample;
use crate::{Error, Result, BET_TYPE_HEADER, GAME_LINK_SELECTOR, MAIN_GAME_TABLE, RTP_HEADER};

/// Leading number the way a browser's `parseFloat` reads it.
static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float pattern")
});

/// Which columns a table needs to contribute samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extraction {
    /// Only the "RTP" column, samples carry no bet type.
    RtpOnly,
    /// Both "RTP" and "Bet Type" columns, each sample keeps its row's bet type.
    #[default]
    WithBetType,
}

#[inline]
pub(crate) fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

/// Trimmed text content of an element.
pub(crate) fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Reads a percentage cell: `%` signs dropped, then the leading number.
/// `None` when nothing numeric is left.
pub fn parse_percentage(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace('%', "");
    let m = LEADING_FLOAT.find(cleaned.trim_start())?;
    m.as_str().parse().ok().filter(|v: &f64| v.is_finite())
}

/// Collects RTP values from every `table.mainGame` of the document.
///
/// The columns are found by their header text, trimmed and lowercased.
/// Rows that are too short or whose RTP cell is not a number are skipped.
pub fn extract_rtp_values(doc: &Html, mode: Extraction) -> Result<Vec<RtpSample>> {
    let table_selector = create_selector(MAIN_GAME_TABLE)?;
    let header_selector = create_selector("thead th")?;
    let row_selector = create_selector("tbody tr")?;
    let cell_selector = create_selector("td")?;

    let mut samples = Vec::new();
    for table in doc.select(&table_selector) {
        let mut rtp_column = None;
        let mut bet_type_column = None;
        for (i, th) in table.select(&header_selector).enumerate() {
            let text = element_text(th).to_lowercase();
            if text == RTP_HEADER {
                rtp_column = Some(i);
            } else if text == BET_TYPE_HEADER {
                bet_type_column = Some(i);
            }
        }

        let Some(rtp_column) = rtp_column else {
            continue;
        };
        let bet_type_column = match (mode, bet_type_column) {
            (Extraction::RtpOnly, _) => None,
            (Extraction::WithBetType, Some(c)) => Some(c),
            (Extraction::WithBetType, None) => continue,
        };

        for row in table.select(&row_selector) {
            let cells = row.select(&cell_selector).collect::<Vec<_>>();
            let needed = rtp_column.max(bet_type_column.unwrap_or(0));
            if cells.len() <= needed {
                continue;
            }
            let Some(value) = parse_percentage(&element_text(cells[rtp_column])) else {
                continue;
            };
            samples.push(RtpSample {
                value,
                bet_type: bet_type_column.map(|c| element_text(cells[c])),
            });
        }
    }
    Ok(samples)
}

/// Name of the game or side bet: text of `header h1`.
pub fn game_name(doc: &Html) -> Result<String> {
    let sel_str = "header h1";
    let selector = create_selector(sel_str)?;
    doc.select(&selector)
        .next()
        .map(element_text)
        .ok_or_else(|| Error::ParseMissingSelector(sel_str.into()))
}

/// `href`s of the game links listed on the index page.
pub fn game_links(doc: &Html) -> Result<Vec<String>> {
    let selector = create_selector(GAME_LINK_SELECTOR)?;
    Ok(doc
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(Into::into)
        .collect())
}
