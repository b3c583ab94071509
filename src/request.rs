use std::future::Future;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use reqwest::{Client, Url};

use crate::{info_time, Error, Result, LOCAL_HOST_BASE};

/// Anything that can hand out the HTML of a page of the site.
/// `url` can be relative, it is resolved against the source's base page.
pub trait PageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches pages over HTTP, relative to `base`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    // Client uses Arc so we can clone cheaply
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(client: Client, base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|_| Error::BadUrl {
            base: base.into(),
            url: String::new(),
        })?;
        Ok(Self { client, base })
    }

    /// Same client, relative urls now resolve from `page`.
    pub fn with_page(&self, page: &str) -> Result<Self> {
        Ok(Self {
            client: self.client.clone(),
            base: self.resolve(page)?,
        })
    }

    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base.join(url).map_err(|_| Error::BadUrl {
            base: self.base.to_string(),
            url: url.into(),
        })
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let url = self.resolve(url)?;
        info_time!("Requesting page: {url}");
        let res = self.client.get(url.clone()).send().await?;
        if !res.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: res.status(),
            });
        }
        let html = res.text().await?;
        Ok(html)
    }
}

/// Serves pages from a local copy of the static site.
/// `page` is the path of the page the relative urls are resolved from,
/// e.g. `static/rtpResults.html`.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    base: Url,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>, page: &str) -> Result<Self> {
        let host = Url::parse(LOCAL_HOST_BASE).map_err(|_| Error::BadUrl {
            base: LOCAL_HOST_BASE.into(),
            url: page.into(),
        })?;
        let base = host.join(page.trim_start_matches('/')).map_err(|_| Error::BadUrl {
            base: LOCAL_HOST_BASE.into(),
            url: page.into(),
        })?;
        Ok(Self {
            root: root.into(),
            base,
        })
    }

    /// Maps a url to a file under the root. `..` can't climb above the root
    /// because the url parser already normalized the path, and decoded
    /// segments that would climb or nest are refused.
    pub fn resolve(&self, url: &str) -> Result<PathBuf> {
        let bad_url = || Error::BadUrl {
            base: self.base.to_string(),
            url: url.into(),
        };
        let joined = self.base.join(url).map_err(|_| bad_url())?;
        let mut path = self.root.clone();
        for segment in joined.path_segments().into_iter().flatten() {
            if segment.is_empty() {
                continue;
            }
            let decoded = percent_decode_str(segment)
                .decode_utf8()
                .map_err(|_| bad_url())?;
            if decoded == ".." || decoded.contains(['/', '\\']) {
                return Err(bad_url());
            }
            path.push(&*decoded);
        }
        if joined.path().ends_with('/') {
            path.push("index.html");
        }
        Ok(path)
    }
}

impl PageSource for DirSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let path = self.resolve(url)?;
        info_time!("Reading page: {}", path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Routes like `/game/blackjack` map to `game/blackjack.html`.
                let with_ext = with_html_extension(&path);
                match with_ext {
                    Some(p) => tokio::fs::read_to_string(&p)
                        .await
                        .map_err(|_| Error::PageNotFound(url.into())),
                    None => Err(Error::PageNotFound(url.into())),
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn with_html_extension(path: &Path) -> Option<PathBuf> {
    if path.extension().is_some() {
        return None;
    }
    Some(path.with_extension("html"))
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;

    use super::*;

    /// In-memory site keyed by the exact url string the code asks for.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct MemorySource {
        pages: HashMap<String, String>,
    }

    impl MemorySource {
        pub(crate) fn with(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.into(), html.into());
            self
        }
    }

    impl PageSource for MemorySource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::PageNotFound(url.into()))
        }
    }

    /// Fresh directory under the system temp dir.
    pub(crate) fn scratch_site(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("oddsref-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        root
    }
}
