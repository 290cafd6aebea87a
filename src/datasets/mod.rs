
use csv::StringRecord;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::{RagError, Result};

const DOWNLOAD_TIMEOUT_SECONDS: u64 = 120;

/// Schema kinds for the known tabular sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    SupplyChain,
    Orders,
    FreightRates,
}

impl DatasetKind {
    /// Tag stored in every document's `source` metadata field.
    #[inline]
    pub fn source_tag(self) -> &'static str {
        match self {
            Self::SupplyChain => "supply_chain_dataset",
            Self::Orders => "order_list",
            Self::FreightRates => "freight_rates",
        }
    }
}

/// Static descriptor for one remote tabular dataset.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub url: &'static str,
    pub filename: &'static str,
    pub description: &'static str,
    pub kind: DatasetKind,
    /// Maximum rows converted to documents, enforced via deterministic
    /// sampling. `None` means every row is kept.
    pub row_cap: Option<usize>,
}

/// The fixed set of logistics datasets this assistant knows about.
pub const DATASETS: [DatasetSpec; 3] = [
    DatasetSpec {
        name: "supply_chain",
        url: "https://raw.githubusercontent.com/ashishpatel26/DataCo-SMART-SUPPLY-CHAIN-FOR-BIG-DATA-ANALYSIS/master/DataCoSupplyChainDataset.csv",
        filename: "supply_chain_dataset.csv",
        description: "DataCo Supply Chain - Datos de ventas, envios y clientes",
        kind: DatasetKind::SupplyChain,
        row_cap: Some(500),
    },
    DatasetSpec {
        name: "orders",
        url: "https://raw.githubusercontent.com/ashishpatel26/Supply-Chain-Logistics-Problem/master/OrderList.csv",
        filename: "order_list.csv",
        description: "Order List - Ordenes de envio con origen, planta y carrier",
        kind: DatasetKind::Orders,
        row_cap: None,
    },
    DatasetSpec {
        name: "freight_rates",
        url: "https://raw.githubusercontent.com/ashishpatel26/Supply-Chain-Logistics-Problem/master/FreightRates.csv",
        filename: "freight_rates.csv",
        description: "Freight Rates - Tarifas de flete por carrier y ruta",
        kind: DatasetKind::FreightRates,
        row_cap: None,
    },
];

/// One row from a tabular source. Read-only; every field is treated as
/// optional with an explicit declared default at access time.
#[derive(Debug, Clone)]
pub struct Record {
    headers: Arc<StringRecord>,
    fields: StringRecord,
}

impl Record {
    #[inline]
    pub fn new(headers: Arc<StringRecord>, fields: StringRecord) -> Self {
        Self { headers, fields }
    }

    /// Look up a field by column name. Blank cells count as missing.
    #[inline]
    pub fn get(&self, column: &str) -> Option<&str> {
        let index = self.headers.iter().position(|h| h.trim() == column)?;
        let value = self.fields.get(index)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }

    /// Field accessor with a declared default for missing or blank cells.
    #[inline]
    pub fn get_or<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        self.get(column).unwrap_or(default)
    }

    /// Numeric field accessor with a declared default.
    #[inline]
    pub fn get_f64_or(&self, column: &str, default: f64) -> f64 {
        self.get(column)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

/// Download all datasets into the local cache directory.
///
/// Idempotent: files already present are skipped unless `force` is set.
/// A failed fetch is logged and skipped; the returned map only contains
/// datasets that are present locally afterwards.
#[inline]
pub fn download_datasets(config: &Config, force: bool) -> Result<BTreeMap<String, PathBuf>> {
    let data_dir = config.data_dir();
    fs::create_dir_all(&data_dir)?;

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DOWNLOAD_TIMEOUT_SECONDS)))
        .build()
        .into();

    let mut downloaded = BTreeMap::new();

    for spec in &DATASETS {
        let path = data_dir.join(spec.filename);

        if path.exists() && !force {
            info!("{}: already cached at {}", spec.name, path.display());
            downloaded.insert(spec.name.to_string(), path);
            continue;
        }

        info!("Downloading {} from {}", spec.name, spec.url);
        match fetch_dataset(&agent, spec.url, &path) {
            Ok(()) => {
                info!("{}: saved to {}", spec.name, path.display());
                downloaded.insert(spec.name.to_string(), path);
            }
            Err(e) => {
                warn!("{}: download failed, skipping: {}", spec.name, e);
            }
        }
    }

    Ok(downloaded)
}

fn fetch_dataset(agent: &ureq::Agent, url: &str, path: &Path) -> Result<()> {
    let response = agent
        .get(url)
        .call()
        .map_err(|e| RagError::Acquisition(format!("GET {} failed: {}", url, e)))?;

    // Write through a temp file so a failed transfer never leaves a
    // truncated cache entry behind.
    let tmp_path = path.with_extension("part");
    let mut file = fs::File::create(&tmp_path)?;
    let mut reader = response.into_body().into_reader();
    std::io::copy(&mut reader, &mut file)
        .map_err(|e| RagError::Acquisition(format!("transfer from {} failed: {}", url, e)))?;
    file.flush()?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Load all rows of a cached CSV file.
///
/// The supply chain dataset ships latin-1 encoded text; invalid UTF-8 byte
/// sequences are replaced rather than failing the whole dataset.
#[inline]
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    debug!("Loading CSV records from {}", path.display());

    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = Arc::new(
        reader
            .headers()
            .map_err(|e| RagError::Parse(format!("{}: {}", path.display(), e)))?
            .clone(),
    );

    let mut records = Vec::new();
    for row in reader.records() {
        let fields = row.map_err(|e| RagError::Parse(format!("{}: {}", path.display(), e)))?;
        records.push(Record::new(Arc::clone(&headers), fields));
    }

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
