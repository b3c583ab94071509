//! Scraping and table tooling for a static casino odds reference site.
//!
//! Game pages carry RTP tables; this crate reads them back, builds the
//! min/max RTP summary, sorts tables the way the site's header clicks do and
//! merges side bet tables from their own pages into a game page.

mod error;
mod macros;

pub mod controller;
pub mod nav;
pub mod parse;
pub mod process;
pub mod request;
pub mod rtp;
pub mod sort;
pub mod table;

pub use error::{Error, Result};

/// Tables whose rows feed the RTP summary.
const MAIN_GAME_TABLE: &str = "table.mainGame";
const RTP_HEADER: &str = "rtp";
const BET_TYPE_HEADER: &str = "bet type";
const GAME_LINK_SELECTOR: &str = "#main-game-names .game-item a";

/// `data-sort` values of columns holding percentages.
const PERCENTAGE_SORT_TAGS: [&str; 4] = ["minRTP", "maxRTP", "rtp", "houseEdge"];

const RESULTS_TABLE_ID: &str = "min-max-rtp-table";
const HOME_HREF: &str = "../..";
pub const DEFAULT_RESULTS_PAGE: &str = "static/rtpResults.html";
pub const DEFAULT_INDEX_URL: &str = "../";

const NAV_BUTTONS_URL: &str = "../buttons.html";
const NAV_CONTAINER_ID: &str = "buttons-container";

const MENU_FILTER_CLASS: &str = "menu-filter";
const MENU_SELECT_ID: &str = "menu-select";
const SIDE_BETS_TABLE_ID: &str = "sideBets";
const SELECT_ALL: &str = "all";
/// Side bet tables with this many columns get a deck column.
const DECK_COLUMN_COUNT: usize = 4;
const SORTED_LIST_IDS: [&str; 2] = ["main-game-names", "side-bet-names"];
const INDEX_PATH: &str = "/";

/// Host the local directory source pretends to serve from, only used to resolve urls.
const LOCAL_HOST_BASE: &str = "http://localhost/";
/// Joined onto a source's base this is the base page itself.
const CURRENT_PAGE: &str = "";
