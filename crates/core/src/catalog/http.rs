//! HTTP catalog backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::offering::{sort_by_priority, Offering};

use super::{CatalogError, OfferingCatalog};

/// Catalog fetched from the public IPO listing API.
pub struct HttpCatalog {
    client: Client,
    config: CatalogConfig,
}

impl HttpCatalog {
    /// Create a new catalog client with the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| CatalogError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl OfferingCatalog for HttpCatalog {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<Offering>, CatalogError> {
        let page_size = self.config.page_size.to_string();
        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("stockSymbol", ""),
                ("pageNo", "1"),
                ("itemsPerPage", page_size.as_str()),
                ("pagePerDisplay", "20"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: CatalogResponse = response.json().await?;
        let offerings = parse_rows(body.result.data);
        debug!(count = offerings.len(), "Catalog fetch complete");
        Ok(offerings)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    result: CatalogResult,
}

#[derive(Debug, Deserialize)]
struct CatalogResult {
    #[serde(default)]
    data: Vec<CatalogRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogRow {
    ipo_id: serde_json::Value,
    company_name: String,
    #[serde(default)]
    stock_symbol: Option<String>,
    #[serde(default)]
    sector_name: Option<String>,
    #[serde(default)]
    share_type: String,
    #[serde(default)]
    price_per_unit: Option<f64>,
    #[serde(default)]
    units: Option<f64>,
    #[serde(rename = "openingDateAD")]
    opening_date_ad: String,
    #[serde(rename = "closingDateAD")]
    closing_date_ad: String,
    #[serde(default)]
    status: String,
}

/// Convert raw rows into offerings sorted by display priority, dropping rows
/// with unusable ids or dates.
fn parse_rows(rows: Vec<CatalogRow>) -> Vec<Offering> {
    let mut offerings: Vec<Offering> = rows
        .into_iter()
        .filter_map(|row| {
            let id = match &row.ipo_id {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                other => {
                    warn!(company = %row.company_name, id = %other, "Skipping catalog row without id");
                    return None;
                }
            };
            let (Some(start_date), Some(end_date)) = (
                parse_catalog_date(&row.opening_date_ad),
                parse_catalog_date(&row.closing_date_ad),
            ) else {
                warn!(
                    offering_id = %id,
                    opening = %row.opening_date_ad,
                    closing = %row.closing_date_ad,
                    "Skipping catalog row with unparseable dates"
                );
                return None;
            };

            Some(Offering {
                id,
                company_name: row.company_name,
                share_type: row.share_type,
                status: row.status,
                start_date,
                end_date,
                stock_symbol: row.stock_symbol,
                sector_name: row.sector_name,
                price_per_unit: row.price_per_unit,
                units: row.units.filter(|u| *u >= 0.0).map(|u| u as u64),
            })
        })
        .collect();

    sort_by_priority(&mut offerings);
    offerings
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_catalog_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "result": {
            "data": [
                {
                    "ipoId": 101,
                    "companyName": "Beta Hydro Ltd.",
                    "stockSymbol": "BHL",
                    "sectorName": "Hydro Power",
                    "shareType": "Local",
                    "pricePerUnit": 100.0,
                    "units": 50000,
                    "openingDateAD": "2024-03-10",
                    "closingDateAD": "2024-03-14",
                    "status": "Open"
                },
                {
                    "ipoId": 102,
                    "companyName": "Alpha Corp",
                    "shareType": "ordinary",
                    "openingDateAD": "2024-03-11T00:00:00",
                    "closingDateAD": "2024-03-15T00:00:00",
                    "status": "Open"
                },
                {
                    "ipoId": 103,
                    "companyName": "Gamma Bank",
                    "shareType": "ordinary",
                    "openingDateAD": "not a date",
                    "closingDateAD": "2024-03-15",
                    "status": "Nearing"
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_response_sorts_and_filters() {
        let response: CatalogResponse = serde_json::from_str(SAMPLE).unwrap();
        let offerings = parse_rows(response.result.data);

        assert_eq!(offerings.len(), 2);
        assert_eq!(offerings[0].id, "102");
        assert_eq!(offerings[0].company_name, "Alpha Corp");
        assert_eq!(
            offerings[0].start_date,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
        assert_eq!(offerings[1].id, "101");
        assert_eq!(offerings[1].stock_symbol.as_deref(), Some("BHL"));
        assert_eq!(offerings[1].units, Some(50000));
    }

    #[test]
    fn test_string_ids_are_accepted() {
        let json = r#"{"result": {"data": [{
            "ipoId": " 77 ",
            "companyName": "Delta",
            "shareType": "ordinary",
            "openingDateAD": "2024-01-01",
            "closingDateAD": "2024-01-02",
            "status": "Closed"
        }]}}"#;
        let response: CatalogResponse = serde_json::from_str(json).unwrap();
        let offerings = parse_rows(response.result.data);
        assert_eq!(offerings[0].id, "77");
    }

    #[test]
    fn test_parse_catalog_date() {
        assert_eq!(
            parse_catalog_date("2024-03-10"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(
            parse_catalog_date("2024-03-10T05:45:00"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(parse_catalog_date("03/10/2024"), None);
        assert_eq!(parse_catalog_date(""), None);
    }
}
