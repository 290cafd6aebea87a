#[cfg(test)]
mod tests;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::{info, warn};

use crate::config::Config;
use crate::datasets::{DATASETS, DatasetKind, Record, load_records};

/// Placeholder rendered for fields absent from a source row, so retrieval
/// never silently loses a field name.
pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed seed for the row-cap sample, keeping runs repeatable.
const SAMPLE_SEED: u64 = 42;

/// A self-contained narrative text block built from one tabular row, plus
/// the identifying metadata stored alongside its embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// The dataset schema this document was built from.
    #[inline]
    pub fn source(&self) -> &str {
        self.metadata.get("source").map_or("unknown", String::as_str)
    }
}

/// Convert tabular rows into documents, one per row.
///
/// When `row_cap` is set and the row count exceeds it, a deterministic
/// reproducible sample of exactly `row_cap` rows is drawn instead of
/// truncating from the front.
#[inline]
pub fn build_documents(
    records: &[Record],
    kind: DatasetKind,
    row_cap: Option<usize>,
) -> Vec<Document> {
    let sampled = sample_rows(records, row_cap);

    sampled
        .iter()
        .map(|&(index, record)| match kind {
            DatasetKind::SupplyChain => build_supply_chain_document(record, index),
            DatasetKind::Orders => build_orders_document(record, index),
            DatasetKind::FreightRates => build_freight_document(record),
        })
        .collect()
}

/// Draw the post-cap row set, pairing each record with its original index
/// (used as the order-id fallback).
fn sample_rows(records: &[Record], row_cap: Option<usize>) -> Vec<(usize, &Record)> {
    let indexed: Vec<(usize, &Record)> = records.iter().enumerate().collect();

    match row_cap {
        Some(cap) if records.len() > cap => {
            let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
            let picks = rand::seq::index::sample(&mut rng, records.len(), cap);
            picks.iter().map(|i| indexed[i]).collect()
        }
        _ => indexed,
    }
}

fn build_supply_chain_document(record: &Record, index: usize) -> Document {
    let fallback_id = index.to_string();
    let order_id = record.get_or("Order Id", &fallback_id);
    let price = record.get_f64_or("Product Price", 0.0);
    let quantity = record.get_or("Order Item Quantity", "1");

    let mut content = String::new();
    let _ = writeln!(content, "Orden de Envío #{}", order_id);
    let _ = writeln!(content, "======================================");
    let _ = writeln!(
        content,
        "Cliente: {} ({})",
        record.get_or("Customer Full Name", NOT_AVAILABLE),
        record.get_or("Customer Segment", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "Ciudad: {}, {}, {}",
        record.get_or("Customer City", NOT_AVAILABLE),
        record.get_or("Customer State", NOT_AVAILABLE),
        record.get_or("Customer Country", NOT_AVAILABLE)
    );
    let _ = writeln!(content);
    let _ = writeln!(
        content,
        "Producto: {}",
        record.get_or("Product Name", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "Categoría: {} > {}",
        record.get_or("Category Name", NOT_AVAILABLE),
        record.get_or("Department Name", NOT_AVAILABLE)
    );
    let _ = writeln!(content, "Precio: ${:.2}", price);
    let _ = writeln!(content, "Cantidad: {}", quantity);
    let _ = writeln!(content);
    let _ = writeln!(content, "Envío:");
    let _ = writeln!(
        content,
        "- Modo: {}",
        record.get_or("Shipping Mode", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "- Estado: {}",
        record.get_or("Delivery Status", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "- Días programados: {}",
        record.get_or("Days for shipping (scheduled)", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "- Días reales: {}",
        record.get_or("Days for shipping (real)", NOT_AVAILABLE)
    );
    let _ = writeln!(content);
    let _ = writeln!(content, "Mercado: {}", record.get_or("Market", NOT_AVAILABLE));
    let _ = write!(
        content,
        "Región: {}",
        record.get_or("Order Region", NOT_AVAILABLE)
    );

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "source".to_string(),
        DatasetKind::SupplyChain.source_tag().to_string(),
    );
    metadata.insert("order_id".to_string(), order_id.to_string());
    metadata.insert(
        "category".to_string(),
        record.get_or("Category Name", "").to_string(),
    );
    metadata.insert(
        "shipping_mode".to_string(),
        record.get_or("Shipping Mode", "").to_string(),
    );
    metadata.insert("market".to_string(), record.get_or("Market", "").to_string());

    Document { content, metadata }
}

fn build_orders_document(record: &Record, index: usize) -> Document {
    let fallback_id = index.to_string();
    let order_id = record.get_or("Order ID", &fallback_id);

    let mut content = String::new();
    let _ = writeln!(content, "Orden de Logística");
    let _ = writeln!(content, "==================");
    let _ = writeln!(content, "ID de Orden: {}", order_id);
    let _ = writeln!(
        content,
        "Origen: {}",
        record.get_or("Origin Port", NOT_AVAILABLE)
    );
    let _ = writeln!(content, "Destino: Puerto de destino");
    let _ = writeln!(
        content,
        "Planta: {}",
        record.get_or("Plant Code", NOT_AVAILABLE)
    );
    let _ = writeln!(content);
    let _ = writeln!(
        content,
        "Unidades: {}",
        record.get_or("Unit quantity", NOT_AVAILABLE)
    );
    let _ = writeln!(content, "Peso: {} kg", record.get_or("Weight", NOT_AVAILABLE));
    let _ = writeln!(content);
    let _ = writeln!(
        content,
        "Servicio: {}",
        record.get_or("Service Level", NOT_AVAILABLE)
    );
    let _ = write!(content, "Carrier: {}", record.get_or("Carrier", NOT_AVAILABLE));

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "source".to_string(),
        DatasetKind::Orders.source_tag().to_string(),
    );
    metadata.insert("order_id".to_string(), order_id.to_string());
    metadata.insert(
        "origin".to_string(),
        record.get_or("Origin Port", "").to_string(),
    );
    metadata.insert(
        "plant".to_string(),
        record.get_or("Plant Code", "").to_string(),
    );

    Document { content, metadata }
}

fn build_freight_document(record: &Record) -> Document {
    let rate = record.get_f64_or("rate", 0.0);

    let mut content = String::new();
    let _ = writeln!(content, "Tarifa de Flete");
    let _ = writeln!(content, "===============");
    let _ = writeln!(content, "Carrier: {}", record.get_or("Carrier", NOT_AVAILABLE));
    let _ = writeln!(
        content,
        "Puerto de Origen: {}",
        record.get_or("orig_port_cd", NOT_AVAILABLE)
    );
    let _ = writeln!(
        content,
        "Puerto de Destino: {}",
        record.get_or("dest_port_cd", NOT_AVAILABLE)
    );
    let _ = writeln!(content);
    let _ = writeln!(content, "Rango de Peso:");
    let _ = writeln!(
        content,
        "- Mínimo: {} kg",
        record.get_or("minm_wgh_qty", "0")
    );
    let _ = writeln!(content, "- Máximo: {} kg", record.get_or("max_wgh_qty", "0"));
    let _ = writeln!(content);
    let _ = writeln!(content, "Tarifa: ${:.2}", rate);
    let _ = writeln!(
        content,
        "Modo de Transporte: {}",
        record.get_or("mode_dsc", NOT_AVAILABLE)
    );
    let _ = write!(
        content,
        "Tipo de Servicio: {}",
        record.get_or("svc_cd", NOT_AVAILABLE)
    );

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "source".to_string(),
        DatasetKind::FreightRates.source_tag().to_string(),
    );
    metadata.insert(
        "carrier".to_string(),
        record.get_or("Carrier", "").to_string(),
    );
    metadata.insert("mode".to_string(), record.get_or("mode_dsc", "").to_string());

    Document { content, metadata }
}

/// Load every cached dataset and convert it to documents.
///
/// A dataset that fails to load is logged and skipped; the others still
/// contribute their documents. `row_cap_override` replaces the configured
/// supply chain cap when set.
#[inline]
pub fn load_documents(config: &Config, row_cap_override: Option<usize>) -> Vec<Document> {
    let data_dir = config.data_dir();
    let mut all_documents = Vec::new();

    for spec in &DATASETS {
        let path = data_dir.join(spec.filename);
        if !path.exists() {
            info!("{}: not downloaded, skipping", spec.name);
            continue;
        }

        let row_cap = match spec.kind {
            DatasetKind::SupplyChain => {
                Some(row_cap_override.unwrap_or(config.datasets.supply_chain_row_cap))
            }
            _ => spec.row_cap,
        };

        match load_records(&path) {
            Ok(records) => {
                let documents = build_documents(&records, spec.kind, row_cap);
                info!("{}: built {} documents", spec.name, documents.len());
                all_documents.extend(documents);
            }
            Err(e) => {
                warn!("{}: failed to load, skipping: {}", spec.name, e);
            }
        }
    }

    info!("Loaded {} documents in total", all_documents.len());
    all_documents
}
