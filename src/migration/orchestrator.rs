//! Runs a migration: optional clear, then products, then sales.
//!
//! Fetching is all-or-nothing: a page error aborts the run. Writing is per
//! record: a skipped or rejected record is tallied and the run moves on.

use super::{
    mapper::{map_product, map_sale},
    report::{ClearSummary, MigrationReport, PhaseReport, RecordOutcome},
    writer::{WriteMode, write_product, write_sale},
};
use crate::{
    config::settings::MigrationSettings,
    entities::{Product, Sale, SoldItem},
    errors::Result,
    source::{CatalogSource, pager::fetch_all},
    throttle::Throttle,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{error, info, instrument, warn};

/// Whether the destination is emptied before migrating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MigrationMode {
    /// Delete all sold items, sales and products first
    Fresh,
    /// Keep existing rows and upsert on top of them
    #[default]
    Incremental,
}

/// One migration run from a catalog source into the destination database.
pub struct Migrator<'a, S: CatalogSource + ?Sized> {
    db: &'a DatabaseConnection,
    source: &'a S,
    settings: MigrationSettings,
    mode: MigrationMode,
    write_mode: WriteMode,
}

impl<'a, S: CatalogSource + ?Sized> Migrator<'a, S> {
    /// Incremental upsert run with default settings.
    pub fn new(db: &'a DatabaseConnection, source: &'a S) -> Self {
        Self {
            db,
            source,
            settings: MigrationSettings::default(),
            mode: MigrationMode::Incremental,
            write_mode: WriteMode::Upsert,
        }
    }

    /// Sets page size and delays.
    #[must_use]
    pub fn with_settings(mut self, settings: MigrationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets fresh or incremental mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: MigrationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets insert or upsert writes.
    #[must_use]
    pub const fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Runs every stage and returns the per-record report.
    ///
    /// # Errors
    /// Returns the first fetch error. Write errors are recorded in the report.
    #[instrument(skip(self), fields(mode = ?self.mode, write_mode = ?self.write_mode))]
    pub async fn run(&self) -> Result<MigrationReport> {
        info!("Starting migration");

        let cleared = match self.mode {
            MigrationMode::Fresh => Some(clear_destination(self.db).await),
            MigrationMode::Incremental => None,
        };

        let products = self.migrate_products().await?;
        info!("{products}");

        let mut report = MigrationReport {
            cleared,
            products,
            ..MigrationReport::default()
        };
        self.migrate_sales(&mut report).await?;
        info!("{}", report.sales);

        info!("Migration complete");
        Ok(report)
    }

    async fn migrate_products(&self) -> Result<PhaseReport> {
        let source = self.source;
        let records = fetch_all(
            "products",
            self.settings.page_size,
            &Throttle::new(self.settings.fetch_delay()),
            move |first, skip| source.product_page(first, skip),
        )
        .await?;

        let throttle = Throttle::new(self.settings.product_write_delay());
        let mut phase = PhaseReport::new("products", records.len());

        for (index, record) in records.iter().enumerate() {
            if index > 0 {
                throttle.pause().await;
            }

            let key = record
                .id
                .clone()
                .or_else(|| record.name.clone())
                .unwrap_or_else(|| format!("#{index}"));

            let outcome = match map_product(record) {
                Ok(product) => match write_product(self.db, &product, self.write_mode).await {
                    Ok(_) => RecordOutcome::Written,
                    Err(e) => {
                        error!("Failed to write product {key}: {e}");
                        RecordOutcome::Failed(e.to_string())
                    }
                },
                Err(reason) => {
                    warn!("Skipping product {key}: {reason}");
                    RecordOutcome::Skipped(reason)
                }
            };
            phase.record(key, outcome);
        }

        Ok(phase)
    }

    async fn migrate_sales(&self, report: &mut MigrationReport) -> Result<()> {
        let source = self.source;
        let records = fetch_all(
            "sales",
            self.settings.page_size,
            &Throttle::new(self.settings.fetch_delay()),
            move |first, skip| source.sale_page(first, skip),
        )
        .await?;

        let throttle = Throttle::new(self.settings.sale_write_delay());
        report.sales = PhaseReport::new("sales", records.len());

        for (index, record) in records.iter().enumerate() {
            if index > 0 {
                throttle.pause().await;
            }

            let key = record.id.clone().unwrap_or_else(|| format!("#{index}"));

            let outcome = match map_sale(record) {
                Ok(sale) => match write_sale(self.db, &sale, self.write_mode).await {
                    Ok(written) => {
                        report.sold_items.written += written.items_written;
                        report.sold_items.failed += written.items_failed;
                        report.sold_items.unresolved_products += written.unresolved_products;
                        RecordOutcome::Written
                    }
                    Err(e) => {
                        error!("Failed to write sale {key}: {e}");
                        RecordOutcome::Failed(e.to_string())
                    }
                },
                Err(reason) => {
                    warn!("Skipping sale {key}: {reason}");
                    RecordOutcome::Skipped(reason)
                }
            };
            report.sales.record(key, outcome);
        }

        Ok(())
    }
}

/// Deletes every sold item, sale and product, in that order.
///
/// A failing delete is logged and the next table is still attempted.
#[instrument(skip(db))]
pub async fn clear_destination(db: &DatabaseConnection) -> ClearSummary {
    info!("Clearing destination tables");

    let sold_items = log_delete("sold_items", SoldItem::delete_many().exec(db).await);
    let sales = log_delete("sales", Sale::delete_many().exec(db).await);
    let products = log_delete("products", Product::delete_many().exec(db).await);

    ClearSummary {
        sold_items,
        sales,
        products,
    }
}

fn log_delete(
    table: &str,
    result: std::result::Result<sea_orm::DeleteResult, sea_orm::DbErr>,
) -> Option<u64> {
    match result {
        Ok(deleted) => {
            info!("Deleted {} rows from {table}", deleted.rows_affected);
            Some(deleted.rows_affected)
        }
        Err(e) => {
            warn!("Failed to clear {table}: {e}");
            None
        }
    }
}
