use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{self, Category, CATALOG_SEGMENT, SITE_DOMAIN, SITE_ROOT};
use crate::fetch::PageFetcher;

/// "Veja mais" buttons on a category listing, one per product.
static PRODUCT_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.btn-default.tiny-btn.btn-veja-mais").unwrap());

pub type UrlSet = BTreeSet<String>;

/// Decides whether a URL points at a single product page.
pub struct UrlFilter {
    excluded: HashSet<String>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(config::index_urls())
    }
}

impl UrlFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Leaf product URLs only: not an index page, inside the catalog, no
    /// trailing slash, and at least `category/product` after the catalog segment.
    pub fn accepts(&self, url: &str) -> bool {
        if self.excluded.contains(url) || url.ends_with('/') {
            return false;
        }
        match url.split(CATALOG_SEGMENT).nth(1) {
            Some(path) => path.contains('/'),
            None => false,
        }
    }

    pub fn apply(&self, candidates: UrlSet) -> UrlSet {
        candidates.into_iter().filter(|u| self.accepts(u)).collect()
    }
}

fn is_site_host(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|h| h == SITE_DOMAIN || h.ends_with(&format!(".{SITE_DOMAIN}")))
}

/// Absolute URL for an href. Bare "produtos/…" hrefs hang off the site root,
/// everything else resolves against the listing page.
fn resolve_href(href: &str, page: &Url, root: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = if href.starts_with(CATALOG_SEGMENT.trim_start_matches('/')) {
        root
    } else {
        page
    };
    base.join(href).ok()
}

/// Product links on one listing page, resolved, restricted to the site, and filtered.
pub fn discover_urls(html: &str, page_url: &str, filter: &UrlFilter) -> UrlSet {
    let (page, root) = match (Url::parse(page_url), Url::parse(SITE_ROOT)) {
        (Ok(page), Ok(root)) => (page, root),
        _ => {
            warn!("Cannot resolve links against {}", page_url);
            return UrlSet::new();
        }
    };

    let doc = Html::parse_document(html);
    let candidates: UrlSet = doc
        .select(&PRODUCT_LINK_SEL)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_href(href, &page, &root))
        .filter(is_site_host)
        .map(String::from)
        .collect();

    let found = candidates.len();
    let products = filter.apply(candidates);
    debug!("{}: {} links, {} product URLs", page_url, found, products.len());
    products
}

/// Visit each category listing in order and union the product URLs found.
/// A category that fails to load contributes nothing.
pub async fn collect_catalog<F: PageFetcher>(
    fetcher: &F,
    categories: &[Category],
    filter: &UrlFilter,
    delay: Duration,
) -> UrlSet {
    let pb = ProgressBar::new(categories.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut all = UrlSet::new();
    for (i, category) in categories.iter().enumerate() {
        pb.set_message(category.name);
        let found = match fetcher.fetch(category.url).await {
            Ok(html) => discover_urls(&html, category.url, filter),
            Err(e) => {
                warn!("Skipping category {}: {}", category.name, e);
                UrlSet::new()
            }
        };
        info!("{}: {} product URLs", category.name, found.len());
        all.extend(found);
        pb.inc(1);

        if i + 1 < categories.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    info!("Collected {} unique product URLs", all.len());
    all
}

/// Count URLs by the path component right after the catalog segment.
pub fn count_by_category<'a, I>(urls: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for url in urls {
        if let Some(slug) = url
            .split(CATALOG_SEGMENT)
            .nth(1)
            .and_then(|rest| rest.split('/').next())
        {
            *counts.entry(slug.to_string()).or_default() += 1;
        }
    }
    counts
}
