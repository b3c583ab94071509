use scraper::Html;

use crate::parse::create_selector;
use crate::request::PageSource;
use crate::table::escape_html;
use crate::{error_time, Error, Result, NAV_BUTTONS_URL, NAV_CONTAINER_ID};

/// The button bar every results page ends with.
pub fn default_navigation_bar(home_href: &str) -> String {
    format!(
        r#"<div id="{NAV_CONTAINER_ID}">
    <button id="home-button" onclick="location.href='{}'">Home</button>
    <button id="back-button" onclick="window.history.back()">Back</button>
    <button id="reset-button" onclick="location.reload()">Reset</button>
</div>"#,
        escape_html(home_href)
    )
}

/// Fetches the shared button fragment.
pub async fn load_navigation_buttons(source: &impl PageSource) -> Result<String> {
    source.fetch(NAV_BUTTONS_URL).await
}

/// Puts `fragment` inside the page's `#buttons-container`, replacing what was there.
/// The page comes back re-serialized.
pub fn inject_navigation(page_html: &str, fragment: &str) -> Result<String> {
    let sel_str = format!("#{NAV_CONTAINER_ID}");
    let selector = create_selector(&sel_str)?;
    let doc = Html::parse_document(page_html);
    let container = doc
        .select(&selector)
        .next()
        .ok_or_else(|| Error::ParseMissingSelector(sel_str.clone()))?;

    let el = container.value();
    let attrs = el
        .attrs()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect::<String>();
    let name = el.name();
    let replacement = format!("<{name}{attrs}>{fragment}</{name}>");

    // The container serializes the same way on its own as inside the document.
    Ok(doc.html().replacen(&container.html(), &replacement, 1))
}

/// Loads the buttons and injects them. Failures are logged and the page is
/// returned unchanged.
pub async fn load_and_inject(source: &impl PageSource, page_html: &str) -> String {
    let injected = match load_navigation_buttons(source).await {
        Ok(fragment) => inject_navigation(page_html, &fragment),
        Err(e) => Err(e),
    };
    match injected {
        Ok(html) => html,
        Err(e) => {
            error_time!("Error loading navigation buttons: {e}");
            page_html.to_string()
        }
    }
}
