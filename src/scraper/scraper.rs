// scraper.rs
use crate::db::auctions::save_listings;
use crate::db::connection::Database;
use crate::db::logs::append_log;
use crate::domain::auction::{ListingSummary, LOG_SUCCESS};
use crate::domain::logic::{classify_status, extract_amount, extract_geography};
use crate::errors::ServerError;
use crate::pacing::Pacer;
use crate::scraper::client::Fetch;
use crate::scraper::models::{SearchRequest, BOE_BASE_URL, BOE_SEARCH_URL, VIEW_PARAM};
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

/// Marker the portal prints instead of a result list.
const NO_RESULTS_MARKER: &str = "No se han encontrado";

/// Query parameters that may carry the auction id on a result link, in order.
const ID_PARAMS: &[&str] = &["idSub", "id"];

pub struct BoeScraper<F> {
    fetch: F,
    search_url: String,
    base_url: Url,
}

/// Parsed listing blocks of one result page.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub items: Vec<ListingSummary>,
    /// Blocks without a usable id on their detail link.
    pub dropped: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub partitions: usize,
    pub failed_partitions: usize,
    pub items: usize,
}

impl<F: Fetch> BoeScraper<F> {
    pub fn new(fetch: F) -> Result<Self, ScraperError> {
        Self::with_urls(fetch, BOE_SEARCH_URL, BOE_BASE_URL)
    }

    pub fn with_urls(fetch: F, search_url: &str, base_url: &str) -> Result<Self, ScraperError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            fetch,
            search_url: search_url.to_string(),
            base_url,
        })
    }

    /// Search one province and parse its result page.
    pub fn scrape_partition(&self, province: &str) -> Result<SearchPage, ScraperError> {
        let form = SearchRequest::for_province(province).to_form();
        let html = self.fetch.post_form(&self.search_url, &form)?;
        parse_search_results(&html, &self.base_url)
    }

    /// Fetch one secondary view (`ver=<view>`) of a listing's detail page.
    pub fn fetch_view(&self, listing_url: &str, view: &str) -> Result<String, ScraperError> {
        let url = view_url(listing_url, view)?;
        self.fetch.get(&url, &[])
    }
}

/// Run one discovery pass over `partitions`, upserting every listing found.
///
/// A failing partition counts as empty and the run moves on. Store errors
/// are fatal.
pub fn run_discovery<F: Fetch>(
    db: &Database,
    scraper: &BoeScraper<F>,
    partitions: &[String],
    delay: Duration,
) -> Result<DiscoveryReport, ServerError> {
    let mut pacer = Pacer::new(delay);
    let mut report = DiscoveryReport::default();

    tracing::info!(partitions = partitions.len(), "Starting BOE discovery");

    for province in partitions {
        pacer.wait();
        report.partitions += 1;

        let page = match scraper.scrape_partition(province) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(%province, error = %e, "Partition search failed");
                report.failed_partitions += 1;
                continue;
            }
        };

        let saved = save_listings(db, &page.items)?;
        report.items += saved;

        tracing::info!(
            %province,
            found = saved,
            dropped = page.dropped,
            "Partition scraped"
        );
    }

    let outcome = if report.failed_partitions == 0 {
        LOG_SUCCESS
    } else {
        "PARTIAL"
    };
    append_log(
        db,
        &format!(
            "Scraped {} items from {} partitions ({} failed)",
            report.items, report.partitions, report.failed_partitions
        ),
        outcome,
    )?;

    tracing::info!(items = report.items, "✅ Discovery finished");
    Ok(report)
}

/// Extract the listing blocks of a search result page.
///
/// A page without blocks is an empty result, whether or not it carries the
/// "no results" marker.
pub fn parse_search_results(html: &str, base_url: &Url) -> Result<SearchPage, ScraperError> {
    let mut page = SearchPage::default();

    let document = Html::parse_document(html);
    let block_sel = selector(".resultado-busqueda")?;
    let title_sel = selector("h3")?;
    let court_sel = selector("h4")?;
    let line_sel = selector("p")?;
    let link_sel = selector("a")?;

    for block in document.select(&block_sel) {
        let href = block
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));

        let Some((url, id)) = href.and_then(|href| resolve_listing_link(href, base_url)) else {
            tracing::debug!(href = ?href, "Dropping listing block without id");
            page.dropped += 1;
            continue;
        };

        let title = first_text(block, &title_sel);
        let court = first_text(block, &court_sel);

        let mut lines = block.select(&line_sel).map(element_text);
        let status_line = lines.next().unwrap_or_default();
        let detail_line = lines.next().unwrap_or_default();

        let (city, province) = extract_geography(&detail_line);

        page.items.push(ListingSummary {
            id,
            title,
            court,
            status: classify_status(&status_line),
            amount: extract_amount(&status_line, &detail_line),
            url,
            city,
            province,
            detail_line,
        });
    }

    if page.items.is_empty() && page.dropped == 0 && html.contains(NO_RESULTS_MARKER) {
        tracing::debug!("Search returned no results");
    }

    Ok(page)
}

/// Resolve a result link against the portal base and pull the auction id
/// from its query string.
fn resolve_listing_link(href: &str, base_url: &Url) -> Option<(String, String)> {
    let full = base_url.join(href).ok()?;

    let id = ID_PARAMS.iter().find_map(|param| {
        full.query_pairs()
            .find(|(k, v)| &**k == *param && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    })?;

    Some((full.to_string(), id))
}

/// The listing URL with its view selector forced to `view`.
pub fn view_url(listing_url: &str, view: &str) -> Result<String, ScraperError> {
    let mut url = Url::parse(listing_url)
        .map_err(|e| ScraperError::InvalidUrl(format!("{listing_url}: {e}")))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| &**k != VIEW_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(VIEW_PARAM, view);

    Ok(url.to_string())
}

pub(crate) fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("{css}: {e}")))
}

/// All text below `el`, whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(block: ElementRef<'_>, sel: &Selector) -> String {
    block
        .select(sel)
        .next()
        .map(element_text)
        .unwrap_or_default()
}
