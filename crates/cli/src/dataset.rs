use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use smartcart_core::domain::{CatalogItem, ItemId, TransactionId, TransactionRecord};
use smartcart_core::store::TransactionStore;

/// Sale line as it appears in a dataset file. Feeds exported from daily sales
/// reports have no basket id, in which case the date becomes the basket.
#[derive(Debug, Deserialize)]
struct SaleRow {
    #[serde(default)]
    transaction_id: Option<TransactionId>,
    date: NaiveDate,
    item_id: ItemId,
    quantity: u32,
    unit_price: Decimal,
}

impl From<SaleRow> for TransactionRecord {
    fn from(row: SaleRow) -> Self {
        let transaction_id =
            row.transaction_id.unwrap_or_else(|| TransactionId::from_date(row.date));
        TransactionRecord::new(transaction_id, row.date, row.item_id, row.quantity, row.unit_price)
    }
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    transactions: Vec<SaleRow>,
    #[serde(default)]
    catalog: Vec<CatalogItem>,
}

/// Daily sales export: `date,sku,units_sold,price`.
pub const SALES_FILE: &str = "sales.csv";
/// SKU master: `sku,price,base_daily_demand`.
pub const SKUS_FILE: &str = "skus.csv";

#[derive(Debug, Deserialize)]
struct SalesCsvRow {
    date: NaiveDate,
    sku: ItemId,
    units_sold: u32,
    price: Decimal,
}

impl From<SalesCsvRow> for TransactionRecord {
    fn from(row: SalesCsvRow) -> Self {
        TransactionRecord::from_daily_sale(row.date, row.sku, row.units_sold, row.price)
    }
}

#[derive(Debug, Deserialize)]
struct SkuCsvRow {
    sku: ItemId,
    price: Decimal,
    base_daily_demand: f64,
}

impl From<SkuCsvRow> for CatalogItem {
    fn from(row: SkuCsvRow) -> Self {
        CatalogItem::new(row.sku, row.price, row.base_daily_demand)
    }
}

/// Loads a dataset by path shape: a directory holding `sales.csv` and
/// `skus.csv`, a `.csv` sales file with `skus.csv` beside it, or a JSON
/// document.
pub fn load(path: &Path) -> Result<TransactionStore> {
    if path.is_dir() {
        return load_csv(&path.join(SALES_FILE), &path.join(SKUS_FILE));
    }
    if path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("csv")) {
        return load_csv(path, &path.with_file_name(SKUS_FILE));
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read dataset `{}`", path.display()))?;
    parse(&raw).with_context(|| format!("could not parse dataset `{}`", path.display()))
}

pub fn load_csv(sales_path: &Path, skus_path: &Path) -> Result<TransactionStore> {
    let sales = fs::read_to_string(sales_path)
        .with_context(|| format!("could not read sales file `{}`", sales_path.display()))?;
    let skus = fs::read_to_string(skus_path)
        .with_context(|| format!("could not read sku file `{}`", skus_path.display()))?;
    parse_csv(&sales, &skus).with_context(|| {
        format!("could not parse `{}` / `{}`", sales_path.display(), skus_path.display())
    })
}

/// Sales rows carry no basket id, so each sale date becomes one basket.
pub fn parse_csv(sales: &str, skus: &str) -> Result<TransactionStore> {
    let mut sales_reader = ReaderBuilder::new().trim(Trim::All).from_reader(sales.as_bytes());
    let transactions = sales_reader
        .deserialize::<SalesCsvRow>()
        .map(|row| row.map(TransactionRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid sales row")?;

    let mut skus_reader = ReaderBuilder::new().trim(Trim::All).from_reader(skus.as_bytes());
    let catalog = skus_reader
        .deserialize::<SkuCsvRow>()
        .map(|row| row.map(CatalogItem::from))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid sku row")?;

    Ok(TransactionStore::new(transactions, catalog))
}

pub fn parse(raw: &str) -> Result<TransactionStore> {
    let file: DatasetFile = serde_json::from_str(raw)?;
    let transactions = file.transactions.into_iter().map(TransactionRecord::from).collect();
    Ok(TransactionStore::new(transactions, file.catalog))
}

/// Three days of sales over six SKUs, used when no dataset is configured.
pub fn demo() -> TransactionStore {
    const SALES: &[(u32, &str, u32, i64)] = &[
        (1, "SKU0009", 2, 1000),
        (1, "SKU0012", 1, 500),
        (2, "SKU0009", 3, 1000),
        (2, "SKU0034", 1, 2000),
        (3, "SKU0012", 5, 500),
        (3, "SKU0034", 2, 2000),
        (3, "SKU0050", 1, 1500),
    ];
    const CATALOG: &[(&str, i64, f64)] = &[
        ("SKU0009", 1000, 50.0),
        ("SKU0012", 500, 40.0),
        ("SKU0034", 2000, 60.0),
        ("SKU0050", 1500, 25.0),
        ("SKU0070", 3000, 10.0),
        ("SKU0080", 5000, 5.0),
    ];

    let transactions = SALES
        .iter()
        .filter_map(|(day, item, quantity, cents)| {
            let date = NaiveDate::from_ymd_opt(2023, 1, *day)?;
            Some(TransactionRecord::from_daily_sale(date, *item, *quantity, Decimal::new(*cents, 2)))
        })
        .collect();
    let catalog = CATALOG
        .iter()
        .map(|(item, cents, demand)| CatalogItem::new(*item, Decimal::new(*cents, 2), *demand))
        .collect();

    TransactionStore::new(transactions, catalog)
}
