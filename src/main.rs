use std::path::PathBuf;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use oddsref::{
    info_time,
    parse::Extraction,
    process::{process_nav, process_rtp_range, process_side_bets, Source},
    Result, DEFAULT_INDEX_URL, DEFAULT_RESULTS_PAGE,
};

#[derive(Parser)]
#[command(about = "Scrapes and sorts the RTP tables of the odds reference site")]
struct Opts {
    #[command(flatten)]
    site: SiteArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
#[group(multiple = false)]
struct SiteArgs {
    /// Base url of the running site, e.g. http://127.0.0.41:8080/
    #[arg(long)]
    base: Option<String>,
    /// Local copy of the site's root directory, the current directory by default
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Min/max RTP of every game listed on the index
    RtpRange {
        /// Page the relative urls resolve from
        #[arg(long, default_value = DEFAULT_RESULTS_PAGE)]
        page: String,
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        index: String,
        /// Only read the RTP column, without bet types
        #[arg(long)]
        basic: bool,
        /// Header to click, zero based. Repeat to click again.
        #[arg(long = "sort")]
        sort: Vec<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Game page with its side bets merged for the selected deck
    SideBets {
        /// Page path from the site root, e.g. main_games/blackjack.html
        #[arg(long)]
        page: String,
        /// Menu option, `all` shows every deck
        #[arg(long)]
        select: Option<String>,
        #[arg(long = "sort")]
        sort: Vec<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Page with the shared navigation buttons injected
    Nav {
        /// Page path from the site root
        #[arg(long)]
        page: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl SiteArgs {
    fn source(&self, page: &str) -> Result<Source> {
        match (&self.base, &self.root) {
            (Some(base), _) => Source::http(base, page),
            (None, Some(root)) => Source::dir(root, page),
            (None, None) => Source::dir(".", page),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let opts = Opts::parse();

    match opts.command {
        Command::RtpRange {
            page,
            index,
            basic,
            sort,
            out,
        } => {
            let source = opts.site.source(&page)?;
            let mode = if basic {
                Extraction::RtpOnly
            } else {
                Extraction::WithBetType
            };
            process_rtp_range(&source, &index, mode, &sort, out.as_deref()).await?;
        }
        Command::SideBets {
            page,
            select,
            sort,
            out,
        } => {
            let source = opts.site.source(&page)?;
            process_side_bets(&source, &page, select.as_deref(), &sort, out.as_deref()).await?;
        }
        Command::Nav { page, out } => {
            let source = opts.site.source(&page)?;
            process_nav(&source, &page, out.as_deref()).await?;
        }
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}
