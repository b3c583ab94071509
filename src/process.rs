use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::controller::MainPage;
use crate::nav::load_and_inject;
use crate::parse::Extraction;
use crate::request::{DirSource, HttpSource, PageSource};
use crate::rtp::display_min_max_rtps;
use crate::table::Table;
use crate::{error_time, info_time, warn_time, Result, CURRENT_PAGE};

/// Where the site's pages come from.
#[derive(Debug, Clone)]
pub enum Source {
    Http(HttpSource),
    Dir(DirSource),
}

impl Source {
    /// `page` is the page the run pretends to be on, relative urls resolve from it.
    pub fn http(base: &str, page: &str) -> Result<Self> {
        let site = HttpSource::new(Client::new(), base)?;
        Ok(Source::Http(site.with_page(page)?))
    }

    pub fn dir(root: impl Into<PathBuf>, page: &str) -> Result<Self> {
        Ok(Source::Dir(DirSource::new(root, page)?))
    }
}

impl PageSource for Source {
    async fn fetch(&self, url: &str) -> Result<String> {
        match self {
            Source::Http(s) => s.fetch(url).await,
            Source::Dir(s) => s.fetch(url).await,
        }
    }
}

/// Builds the min/max RTP summary section from the games listed on the index.
pub async fn process_rtp_range(
    source: &Source,
    index_url: &str,
    mode: Extraction,
    clicks: &[usize],
    out: Option<&Path>,
) -> Result<()> {
    let start_time = Local::now();
    info_time!("Started scraping RTP values");

    let Some(mut page) = display_min_max_rtps(source, index_url, mode).await? else {
        return Ok(());
    };
    apply_clicks(&mut page.table, clicks);
    write_output(out, &page.to_html()).await?;

    info_time!(start_time, "Finished {} games.", page.entries.len());
    Ok(())
}

/// Loads a game page, selects a deck and merges in its side bets.
/// The source must already be based on `page_url`.
pub async fn process_side_bets(
    source: &Source,
    page_url: &str,
    selection: Option<&str>,
    clicks: &[usize],
    out: Option<&Path>,
) -> Result<()> {
    let start_time = Local::now();
    let mut page = MainPage::load_current(source, page_url).await?;
    page.initialize(source).await;
    if let Some(selection) = selection {
        page.select(source, selection).await;
    }
    match page.side_bets_table_mut() {
        Some(table) => apply_clicks(table, clicks),
        None if !clicks.is_empty() => warn_time!("No side bet table to sort on {page_url}"),
        None => {}
    }
    write_output(out, &page.to_html()).await?;

    info_time!(start_time, "Processed page {page_url}");
    Ok(())
}

/// Fetches the page the source is based on and fills its button container
/// with the shared buttons.
pub async fn process_nav(source: &Source, page_url: &str, out: Option<&Path>) -> Result<()> {
    let page = source.fetch(CURRENT_PAGE).await?;
    let html = load_and_inject(source, &page).await;
    write_output(out, &html).await?;
    info_time!("Injected navigation into {page_url}");
    Ok(())
}

fn apply_clicks(table: &mut Table, clicks: &[usize]) {
    for &column in clicks {
        if let Err(e) = table.click_header(column) {
            error_time!("Couldn't sort by column {column}: {e}");
        }
    }
}

async fn write_output(out: Option<&Path>, html: &str) -> Result<()> {
    match out {
        Some(path) => {
            let mut file = File::create(path).await?;
            file.write_all(html.as_bytes()).await?;
            info_time!("Wrote the results to file: {}", path.display());
        }
        None => print!("{html}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::memory::scratch_site;

    const BLACKJACK: &str = r#"<html><body data-side-bets="/side_bets/sb_perfect_pairs">
        <header><h1>Blackjack</h1></header>
        <select id="menu-select"><option value="6-deck" selected>6 Decks</option></select>
        <table class="menu-filter mainGame" data-filter="6-deck">
            <tbody><tr><td>Main</td><td>99.5%</td></tr></tbody>
        </table>
        <table id="sideBets">
            <thead><tr><th>Bet Type</th><th>Deck</th><th>Payout</th><th data-sort="rtp">RTP</th></tr></thead>
            <tbody id="sideBets-tbody"></tbody>
        </table>
        <div id="buttons-container"></div>
    </body></html>"#;

    const PERFECT_PAIRS: &str = r#"<header><h1>Perfect Pairs</h1></header>
        <table class="menu-filter" data-filter="6-deck"><tbody>
            <tr><td>Mixed Pair</td><td>6:1</td><td>95.9%</td></tr>
            <tr><td>Perfect Pair</td><td>25:1</td><td>93.9%</td></tr>
        </tbody></table>"#;

    async fn write_site(name: &str) -> PathBuf {
        let root = scratch_site(name);
        for dir in ["main_games", "side_bets"] {
            tokio::fs::create_dir_all(root.join(dir)).await.unwrap();
        }
        tokio::fs::write(root.join("main_games/blackjack.html"), BLACKJACK)
            .await
            .unwrap();
        tokio::fs::write(root.join("side_bets/sb_perfect_pairs.html"), PERFECT_PAIRS)
            .await
            .unwrap();
        tokio::fs::write(root.join("buttons.html"), r#"<button id="home-button">Home</button>"#)
            .await
            .unwrap();
        root
    }

    #[tokio::test]
    async fn side_bets_for_a_relative_page() {
        let root = write_site("side-bets").await;
        let page = "main_games/blackjack.html";
        let source = Source::dir(&root, page).unwrap();
        let out = root.join("out.html");

        process_side_bets(&source, page, None, &[3], Some(out.as_path())).await.unwrap();

        let html = tokio::fs::read_to_string(&out).await.unwrap();
        assert!(html.contains(r#"<tbody id="sideBets-tbody">"#));
        let perfect = html.find("Perfect Pairs - Perfect Pair").unwrap();
        let mixed = html.find("Perfect Pairs - Mixed Pair").unwrap();
        assert!(perfect < mixed, "sorted by RTP ascending");
    }

    #[tokio::test]
    async fn nav_for_a_relative_page() {
        let root = write_site("nav").await;
        let page = "main_games/blackjack.html";
        let source = Source::dir(&root, page).unwrap();
        let out = root.join("out.html");

        process_nav(&source, page, Some(out.as_path())).await.unwrap();

        let html = tokio::fs::read_to_string(&out).await.unwrap();
        assert!(html.contains(r#"<button id="home-button">Home</button>"#));
        assert!(html.contains("<h1>Blackjack</h1>"));
    }

    #[tokio::test]
    async fn missing_page_is_an_error() {
        let root = write_site("missing").await;
        let source = Source::dir(&root, "main_games/craps.html").unwrap();
        assert!(process_nav(&source, "main_games/craps.html", None).await.is_err());
    }
}
