use chrono::Local;
use scraper::Html;
use tokio::task::spawn_blocking;

use crate::nav::default_navigation_bar;
use crate::parse::{extract_rtp_values, game_links, game_name, Extraction};
use crate::request::PageSource;
use crate::sort::{add_sorting_to_table, Attach};
use crate::table::{Cell, HeaderCell, Row, Table};
use crate::{error_time, info_time, warn_time, Result, HOME_HREF, RESULTS_TABLE_ID};

/// One scraped RTP value, with the bet type of its row when the table has one.
#[derive(Debug, Clone, PartialEq)]
pub struct RtpSample {
    pub value: f64,
    pub bet_type: Option<String>,
}

/// Min/max RTP of a single game, already formatted to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEntry {
    pub name: String,
    pub min_rtp: String,
    pub max_rtp: String,
    pub min_bet_type: Option<String>,
    pub max_bet_type: Option<String>,
}

impl GameEntry {
    /// `None` when there are no samples.
    pub fn from_samples(name: impl Into<String>, samples: &[RtpSample]) -> Option<Self> {
        let (min, max) = min_max(samples)?;
        Some(Self {
            name: name.into(),
            min_rtp: format!("{:.2}", min.value),
            max_rtp: format!("{:.2}", max.value),
            min_bet_type: min.bet_type.clone(),
            max_bet_type: max.bet_type.clone(),
        })
    }
}

/// Smallest and largest sample. On ties the first one wins, so each extreme
/// keeps the bet type of the row that produced it.
pub fn min_max(samples: &[RtpSample]) -> Option<(&RtpSample, &RtpSample)> {
    let first = samples.first()?;
    Some(samples.iter().skip(1).fold((first, first), |(min, max), s| {
        (
            if s.value < min.value { s } else { min },
            if s.value > max.value { s } else { max },
        )
    }))
}

/// Fetches a page and runs `f` on the parsed document on the blocking pool.
/// The document never crosses an `.await`, only what `f` returns does.
pub async fn scrape_page<S, T, F>(source: &S, url: &str, f: F) -> Result<T>
where
    S: PageSource,
    T: Send + 'static,
    F: FnOnce(&Html) -> T + Send + 'static,
{
    let text = source.fetch(url).await?;
    let res = spawn_blocking(move || {
        let doc = Html::parse_document(&text);
        f(&doc)
    })
    .await?;
    Ok(res)
}

type NamedSamples = (String, Vec<RtpSample>);

/// Scrapes every game page in order and computes its min/max RTP.
/// A page that fails or has no RTP values is logged and skipped.
pub async fn collect_game_entries(
    source: &impl PageSource,
    files: &[String],
    mode: Extraction,
) -> Vec<GameEntry> {
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let scraped = scrape_page(source, file, move |doc| -> Result<Option<NamedSamples>> {
            let samples = extract_rtp_values(doc, mode)?;
            if samples.is_empty() {
                return Ok(None);
            }
            Ok(Some((game_name(doc)?, samples)))
        })
        .await
        .and_then(|r| r);

        match scraped {
            Ok(Some((name, samples))) => {
                if let Some(entry) = GameEntry::from_samples(name, &samples) {
                    info_time!("{}: {}% - {}%", entry.name, entry.min_rtp, entry.max_rtp);
                    entries.push(entry);
                }
            }
            Ok(None) => warn_time!("No RTP values found for {file}"),
            Err(e) => error_time!("Failed to process file {file}: {e}"),
        }
    }
    entries
}

/// Reads the list of game pages from the index page's game links.
pub async fn discover_game_files(source: &impl PageSource, index_url: &str) -> Result<Vec<String>> {
    let files = scrape_page(source, index_url, |doc| game_links(doc)).await??;
    if files.is_empty() {
        warn_time!("No game files found in {index_url}.");
    }
    Ok(files)
}

/// The summary table, headers tagged with `data-sort` so the sorter knows
/// which columns are percentages.
pub fn build_results_table(entries: &[GameEntry]) -> Table {
    let mut table = Table::new(
        Some(RESULTS_TABLE_ID),
        vec![
            HeaderCell::new("Game Name", Some("gameName")),
            HeaderCell::new("Min RTP", Some("minRTP")),
            HeaderCell::new("Max RTP", Some("maxRTP")),
        ],
    );
    table.rows = entries
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::new(&e.name),
                rtp_cell(&e.min_rtp, e.min_bet_type.as_deref()),
                rtp_cell(&e.max_rtp, e.max_bet_type.as_deref()),
            ])
        })
        .collect();
    table
}

fn rtp_cell(value: &str, bet_type: Option<&str>) -> Cell {
    let cell = Cell::new(format!("{value}%"));
    match bet_type {
        Some(bet_type) => cell.with_title(format!("Bet Type: {bet_type}")),
        None => cell,
    }
}

/// The `<section>` appended to the results page: the table and the button bar.
pub fn render_results_section(table: &Table) -> String {
    format!(
        "<section>\n{}\n{}\n</section>\n",
        table.to_html(),
        default_navigation_bar(HOME_HREF)
    )
}

#[derive(Debug, Clone)]
pub struct ResultsPage {
    pub entries: Vec<GameEntry>,
    pub table: Table,
}

impl ResultsPage {
    pub fn new(entries: Vec<GameEntry>) -> Self {
        let mut table = build_results_table(&entries);
        match add_sorting_to_table(&mut table) {
            Attach::Wired | Attach::AlreadyWired => {}
            Attach::TooFewRows => {
                warn_time!("Results table has {} rows, left unsorted.", table.rows.len())
            }
        }
        Self { entries, table }
    }

    pub fn to_html(&self) -> String {
        render_results_section(&self.table)
    }
}

/// Discovers the games from the index, scrapes them one by one and builds the
/// sortable summary. `None` when the index lists no games.
pub async fn display_min_max_rtps(
    source: &impl PageSource,
    index_url: &str,
    mode: Extraction,
) -> Result<Option<ResultsPage>> {
    let start_time = Local::now();
    let files = discover_game_files(source, index_url).await?;
    if files.is_empty() {
        return Ok(None);
    }
    let entries = collect_game_entries(source, &files, mode).await;
    info_time!(start_time, "Scraped {} of {} games.", entries.len(), files.len());
    Ok(Some(ResultsPage::new(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::memory::MemorySource;
    use crate::sort::SortOrder;

    fn sample(value: f64, bet_type: &str) -> RtpSample {
        RtpSample {
            value,
            bet_type: Some(bet_type.into()),
        }
    }

    fn game_page(name: &str, rows: &[(&str, &str)]) -> String {
        let rows = rows
            .iter()
            .map(|(b, r)| format!("<tr><td>{b}</td><td>{r}</td></tr>"))
            .collect::<String>();
        format!(
            r#"<html><body><header><h1>{name}</h1></header>
            <table class="mainGame"><thead><tr><th>Bet Type</th><th>RTP</th></tr></thead>
            <tbody>{rows}</tbody></table></body></html>"#
        )
    }

    const INDEX: &str = r#"<ul id="main-game-names">
        <li class="game-item"><a href="/game/roulette">Roulette</a></li>
        <li class="game-item"><a href="/game/missing">Missing</a></li>
        <li class="game-item"><a href="/game/empty">Empty</a></li>
        <li class="game-item"><a href="/game/baccarat">Baccarat</a></li>
    </ul>"#;

    fn site() -> MemorySource {
        MemorySource::default()
            .with("../", INDEX)
            .with(
                "/game/roulette",
                &game_page("Roulette", &[("Straight Up", "97.30%"), ("Red/Black", "97.30%")]),
            )
            .with("/game/empty", "<header><h1>Empty</h1></header><p>soon</p>")
            .with(
                "/game/baccarat",
                &game_page(
                    "Baccarat",
                    &[
                        ("Banker", "98.94%"),
                        ("Tie", "85.64%"),
                        ("Player", "98.76%"),
                        ("Pair", "n/a"),
                    ],
                ),
            )
    }

    #[test]
    fn extremes_keep_their_own_bet_type() {
        let samples = vec![
            sample(98.76, "Player"),
            sample(85.64, "Tie"),
            sample(98.94, "Banker"),
            sample(85.64, "Tie 2"),
        ];
        let entry = GameEntry::from_samples("Baccarat", &samples).unwrap();
        assert_eq!(entry.min_rtp, "85.64");
        assert_eq!(entry.max_rtp, "98.94");
        assert_eq!(entry.min_bet_type.as_deref(), Some("Tie"));
        assert_eq!(entry.max_bet_type.as_deref(), Some("Banker"));
    }

    #[test]
    fn no_samples_no_entry() {
        assert_eq!(GameEntry::from_samples("x", &[]), None);
    }

    #[test]
    fn formats_two_decimals() {
        let samples = [sample(97.0, "a"), sample(99.456, "b")];
        let entry = GameEntry::from_samples("x", &samples).unwrap();
        assert_eq!(entry.min_rtp, "97.00");
        assert_eq!(entry.max_rtp, "99.46");
    }

    #[tokio::test]
    async fn skips_failing_and_empty_pages() {
        let src = site();
        let files = discover_game_files(&src, "../").await.unwrap();
        assert_eq!(files.len(), 4);

        let entries = collect_game_entries(&src, &files, Extraction::WithBetType).await;
        let names = entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Roulette", "Baccarat"]);
        assert_eq!(entries[1].min_bet_type.as_deref(), Some("Tie"));
    }

    #[tokio::test]
    async fn page_without_table_yields_nothing() {
        let src = site();
        let entries =
            collect_game_entries(&src, &["/game/empty".to_string()], Extraction::RtpOnly).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn missing_index_is_an_error() {
        let src = MemorySource::default();
        assert!(display_min_max_rtps(&src, "../", Extraction::WithBetType).await.is_err());
    }

    #[tokio::test]
    async fn empty_index_builds_nothing() {
        let src = MemorySource::default().with("../", "<ul id=\"main-game-names\"></ul>");
        let page = display_min_max_rtps(&src, "../", Extraction::WithBetType)
            .await
            .unwrap();
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn results_page_is_sortable() {
        let src = site();
        let mut page = display_min_max_rtps(&src, "../", Extraction::WithBetType)
            .await
            .unwrap()
            .unwrap();
        assert!(page.table.is_sorting_enabled());

        assert_eq!(page.table.click_header(1).unwrap(), SortOrder::Asc);
        assert_eq!(page.table.column_texts(0), vec!["Baccarat", "Roulette"]);
        assert_eq!(page.table.click_header(1).unwrap(), SortOrder::Desc);
        assert_eq!(page.table.column_texts(0), vec!["Roulette", "Baccarat"]);

        let html = page.to_html();
        assert!(html.contains(r#"<table id="min-max-rtp-table">"#));
        assert!(html.contains(r#"data-sort="minRTP""#));
        assert!(html.contains(r#"title="Bet Type: Tie">85.64%</td>"#));
        assert!(html.contains(r#"id="home-button""#));
    }
}
