// detail.rs
use crate::db::auctions::{apply_enrichment, select_pending_enrichment};
use crate::db::connection::Database;
use crate::domain::auction::EnrichmentFields;
use crate::domain::logic::parse_money;
use crate::errors::ServerError;
use crate::pacing::Pacer;
use crate::scraper::client::Fetch;
use crate::scraper::models::{VIEW_ASSETS, VIEW_GENERAL};
use crate::scraper::scraper::{element_text, selector, BoeScraper};
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html};
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EnrichmentReport {
    pub attempted: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Text of the `td` next to the first `th` whose text contains `label`.
/// Empty when the label is missing or has no value cell.
pub fn table_value(document: &Html, label: &str) -> Result<String, ScraperError> {
    let th = selector("th")?;

    let value = document
        .select(&th)
        .find(|cell| element_text(*cell).contains(label))
        .and_then(|cell| cell.next_siblings().find_map(ElementRef::wrap))
        .filter(|sibling| sibling.value().name() == "td")
        .map(element_text)
        .unwrap_or_default();

    Ok(value)
}

fn money_value(document: &Html, label: &str) -> Result<Option<f64>, ScraperError> {
    Ok(parse_money(&table_value(document, label)?))
}

/// Fill the general-information fields (`ver=1`).
pub fn parse_general_view(html: &str, fields: &mut EnrichmentFields) -> Result<(), ScraperError> {
    let doc = Html::parse_document(html);

    fields.identifier = table_value(&doc, "Identificador")?;
    fields.auction_type = table_value(&doc, "Tipo de subasta")?;
    fields.claim_amount = money_value(&doc, "Cantidad reclamada")?;
    fields.appraisal_amount = money_value(&doc, "Tasación")?;
    fields.min_bid = money_value(&doc, "Puja mínima")?;
    fields.deposit_amount = money_value(&doc, "Importe del depósito")?;
    Ok(())
}

/// Fill the asset fields (`ver=3`).
pub fn parse_assets_view(html: &str, fields: &mut EnrichmentFields) -> Result<(), ScraperError> {
    let doc = Html::parse_document(html);

    fields.catastral_ref = table_value(&doc, "Referencia catastral")?;
    fields.full_address = table_value(&doc, "Dirección")?;
    fields.postal_code = table_value(&doc, "Código Postal")?;
    fields.visitable = table_value(&doc, "Visitable")?;
    fields.possession_status = table_value(&doc, "Situación posesoria")?;
    Ok(())
}

/// Fetch both secondary views of one listing and merge what they carry.
pub fn fetch_enrichment<F: Fetch>(
    scraper: &BoeScraper<F>,
    listing_url: &str,
) -> Result<EnrichmentFields, ScraperError> {
    let mut fields = EnrichmentFields::default();

    let general = scraper.fetch_view(listing_url, VIEW_GENERAL)?;
    parse_general_view(&general, &mut fields)?;

    let assets = scraper.fetch_view(listing_url, VIEW_ASSETS)?;
    parse_assets_view(&assets, &mut fields)?;

    Ok(fields)
}

/// Enrich up to `batch` pending records, one at a time.
///
/// A record whose fetch, parse or store write fails stays pending and is
/// picked up again by a later run.
pub fn run_enrichment<F: Fetch>(
    db: &Database,
    scraper: &BoeScraper<F>,
    batch: usize,
    delay: Duration,
) -> Result<EnrichmentReport, ServerError> {
    let pending = select_pending_enrichment(db, batch)?;
    let mut report = EnrichmentReport::default();
    let mut pacer = Pacer::new(delay);

    tracing::info!(pending = pending.len(), "Auctions pending detailed scrape");

    for auction in &pending {
        pacer.wait();
        report.attempted += 1;

        match fetch_enrichment(scraper, &auction.url) {
            Ok(fields) => match apply_enrichment(db, &auction.id, &fields) {
                Ok(()) => {
                    report.enriched += 1;
                    tracing::debug!(id = %auction.id, identifier = %fields.identifier, "Enriched");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(id = %auction.id, error = %e, "Failed to store enrichment");
                }
            },
            Err(e) => {
                report.failed += 1;
                tracing::warn!(id = %auction.id, error = %e, "Failed to enrich");
            }
        }
    }

    tracing::info!(
        enriched = report.enriched,
        failed = report.failed,
        "Enrichment finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERAL_HTML: &str = r#"
        <table>
          <tr><th>Identificador</th><td><strong>SUB-JA-2026-250001</strong></td></tr>
          <tr><th>Tipo de subasta</th><td>JUDICIAL EN VIA DE APREMIO</td></tr>
          <tr><th>Cantidad reclamada</th><td>150.320,11 €</td></tr>
          <tr><th>Tasación</th><td>210.000,00 €</td></tr>
          <tr><th>Puja mínima</th><td>Sin puja mínima</td></tr>
          <tr><th>Importe del depósito</th><td>10.500,00 €</td></tr>
        </table>
    "#;

    #[test]
    fn general_view_fields() {
        let mut fields = EnrichmentFields::default();
        parse_general_view(GENERAL_HTML, &mut fields).unwrap();

        assert_eq!(fields.identifier, "SUB-JA-2026-250001");
        assert_eq!(fields.auction_type, "JUDICIAL EN VIA DE APREMIO");
        assert_eq!(fields.claim_amount, Some(150320.11));
        assert_eq!(fields.appraisal_amount, Some(210000.0));
        assert_eq!(fields.min_bid, None);
        assert_eq!(fields.deposit_amount, Some(10500.0));
    }

    #[test]
    fn missing_label_is_empty() {
        let doc = Html::parse_document("<table><tr><th>Otro</th><td>x</td></tr></table>");
        assert_eq!(table_value(&doc, "Visitable").unwrap(), "");
    }

    #[test]
    fn label_without_value_cell_is_empty() {
        let doc = Html::parse_document(
            "<table><tr><th>Visitable</th><th>No consta</th></tr><tr><th>Visitable</th><td>Sí</td></tr></table>",
        );
        // first matching header wins, even without a td next to it
        assert_eq!(table_value(&doc, "Visitable").unwrap(), "");
    }
}
