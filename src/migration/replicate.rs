//! Copies every product from one content API project into another.

use super::{
    mapper::map_product,
    report::{PhaseReport, RecordOutcome},
};
use crate::{
    config::settings::MigrationSettings,
    errors::Result,
    source::{CatalogSource, pager::fetch_all},
    throttle::Throttle,
};
use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

/// Product as sent to the target project.
///
/// The category is passed through as the source had it, null included, so the
/// target's own category values are never widened.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCopy {
    /// Display name
    pub name: String,
    /// Current price
    pub price: f64,
    /// URL-safe key
    pub slug: String,
    /// Source category, unchanged
    pub category: Option<String>,
}

/// Something that can create products, i.e. the target project.
#[async_trait]
pub trait ProductSink: Send + Sync {
    /// Creates one product and returns its new identifier, if the target reports one.
    async fn create_product(&self, product: &ProductCopy) -> Result<Option<String>>;
}

/// Fetches all products from `from` and creates each one in `to`, one at a time.
///
/// Products the mapper rejects are skipped; a failed create is recorded and the
/// next product is still attempted.
///
/// # Errors
/// Returns the first fetch error.
#[instrument(skip_all)]
pub async fn replicate_products<S, T>(from: &S, to: &T, settings: &MigrationSettings) -> Result<PhaseReport>
where
    S: CatalogSource + ?Sized,
    T: ProductSink + ?Sized,
{
    let products = fetch_all(
        "products",
        settings.page_size,
        &Throttle::new(settings.fetch_delay()),
        move |first, skip| from.product_page(first, skip),
    )
    .await?;

    let throttle = Throttle::new(settings.replicate_delay());
    let mut phase = PhaseReport::new("products", products.len());

    for (index, record) in products.iter().enumerate() {
        if index > 0 {
            throttle.pause().await;
        }

        let key = record
            .name
            .clone()
            .or_else(|| record.id.clone())
            .unwrap_or_else(|| format!("#{index}"));

        // Required fields are checked the same way as for the migration.
        let outcome = match map_product(record) {
            Ok(mapped) => match to
                .create_product(&ProductCopy {
                    name: mapped.name,
                    price: mapped.price,
                    slug: mapped.slug,
                    category: record.category.clone(),
                })
                .await
            {
                Ok(created) => {
                    info!(
                        "Created {key} as {}",
                        created.as_deref().unwrap_or("<unknown id>")
                    );
                    RecordOutcome::Written
                }
                Err(e) => {
                    error!("Failed to create {key}: {e}");
                    RecordOutcome::Failed(e.to_string())
                }
            },
            Err(reason) => {
                warn!("Skipping {key}: {reason}");
                RecordOutcome::Skipped(reason)
            }
        };
        phase.record(key, outcome);
    }

    info!("{phase}");
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        source::SourceProduct,
        test_utils::{InMemorySource, RecordingSink, source_product},
    };
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_replicates_every_valid_product() -> Result<()> {
        let mut products: Vec<SourceProduct> = (0..5)
            .map(|i| source_product(&format!("p-{i}"), &format!("Product {i}"), 10.0))
            .collect();
        products.push(SourceProduct {
            name: Some("No slug".to_string()),
            slug: None,
            ..source_product("p-x", "No slug", 1.0)
        });
        let source = InMemorySource::new(products, vec![]);
        let sink = RecordingSink::rejecting("slug-p-3");

        let report = replicate_products(&source, &sink, &MigrationSettings::unthrottled(2)).await?;

        assert_eq!(report.fetched, 6);
        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 2);
        let slugs: Vec<String> = sink.created().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["slug-p-0", "slug-p-1", "slug-p-2", "slug-p-4"]);
        assert_eq!(source.product_requests(), vec![(2, 0), (2, 2), (2, 4), (2, 6)]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_pages_and_creates() -> Result<()> {
        let products = (0..5)
            .map(|i| source_product(&format!("p-{i}"), &format!("Product {i}"), 10.0))
            .collect();
        let source = InMemorySource::new(products, vec![]);
        let sink = RecordingSink::default();
        let settings = MigrationSettings {
            fetch_delay_ms: 100,
            replicate_delay_ms: 200,
            ..MigrationSettings::unthrottled(2)
        };

        let started = Instant::now();
        replicate_products(&source, &sink, &settings).await?;

        // Three pages and five creates.
        assert_eq!(started.elapsed(), Duration::from_millis(2 * 100 + 4 * 200));
        Ok(())
    }

    #[tokio::test]
    async fn test_category_is_copied_unchanged() -> Result<()> {
        let with_category = SourceProduct {
            category: Some("drinks".to_string()),
            ..source_product("p-2", "Coffee", 35.0)
        };
        let source = InMemorySource::new(
            vec![source_product("p-1", "Tea", 20.0), with_category],
            vec![],
        );
        let sink = RecordingSink::default();

        replicate_products(&source, &sink, &MigrationSettings::unthrottled(100)).await?;

        let created = sink.created();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].category, None);
        assert_eq!(created[1].category.as_deref(), Some("drinks"));
        Ok(())
    }
}
