//! JSON-file-backed supplier and invoice stores.
//!
//! Host-side repository implementations: the core only sees the
//! repository traits. Files are loaded on open and rewritten after
//! every committed mutation, so a batch interrupted by the host never
//! loses already-persisted records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use fattix_core::{
    ArtifactSink, IngestError, InvoiceRecord, InvoiceRepository, OcrResult, SupplierCandidate,
    SupplierId, SupplierRepository,
};

/// A supplier record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSupplier {
    id: SupplierId,
    #[serde(flatten)]
    candidate: SupplierCandidate,
}

/// Supplier repository backed by a JSON file.
pub struct SupplierStore {
    path: PathBuf,
    suppliers: Vec<StoredSupplier>,
}

impl SupplierStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let suppliers = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            suppliers,
        })
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    fn save(&self) -> Result<(), IngestError> {
        let content = serde_json::to_string_pretty(&self.suppliers)
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| IngestError::Persistence(e.to_string()))
    }
}

impl SupplierRepository for SupplierStore {
    fn find_by_tax_code(&self, tax_code: &str) -> Result<Option<SupplierId>, IngestError> {
        Ok(self
            .suppliers
            .iter()
            .find(|s| s.candidate.tax_code == tax_code)
            .map(|s| s.id.clone()))
    }

    fn create_or_associate(
        &mut self,
        candidate: &SupplierCandidate,
    ) -> Result<SupplierId, IngestError> {
        if let Some(existing) = self.find_by_tax_code(&candidate.tax_code)? {
            return Ok(existing);
        }

        let id = SupplierId(format!("S-{:04}", self.suppliers.len() + 1));
        self.suppliers.push(StoredSupplier {
            id: id.clone(),
            candidate: candidate.clone(),
        });
        self.save()?;
        debug!(supplier = %id, tax_code = %candidate.tax_code, "supplier stored");
        Ok(id)
    }
}

/// Invoice repository backed by a JSON file.
pub struct InvoiceStore {
    path: PathBuf,
    invoices: Vec<InvoiceRecord>,
}

impl InvoiceStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let invoices = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            invoices,
        })
    }

    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    fn save(&self) -> Result<(), IngestError> {
        let content = serde_json::to_string_pretty(&self.invoices)
            .map_err(|e| IngestError::Persistence(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| IngestError::Persistence(e.to_string()))
    }
}

impl InvoiceRepository for InvoiceStore {
    fn list_known(&self) -> Result<Vec<(String, SupplierId)>, IngestError> {
        Ok(self
            .invoices
            .iter()
            .map(|i| (i.invoice_number.clone(), i.supplier_id.clone()))
            .collect())
    }

    fn create(&mut self, record: &InvoiceRecord) -> Result<(), IngestError> {
        self.invoices.push(record.clone());
        self.save()?;
        debug!(invoice = %record.invoice_number, "invoice stored");
        Ok(())
    }
}

/// Artifact sink writing OCR text exports into a directory.
pub struct FileArtifactSink {
    dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(dir: &Path) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

impl ArtifactSink for FileArtifactSink {
    fn persist_text(&mut self, file_id: &str, result: &OcrResult) -> Result<(), IngestError> {
        let path = self.dir.join(format!("{}.txt", file_id));
        fs::write(&path, result.full_text()).map_err(|e| IngestError::Artifact(e.to_string()))?;
        debug!(path = %path.display(), "OCR text export written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(tax_code: &str) -> SupplierCandidate {
        SupplierCandidate {
            tax_code: tax_code.to_string(),
            name: format!("Fornitore {}", tax_code),
            country: "Italy".to_string(),
            tax_country: "IT".to_string(),
            ..SupplierCandidate::default()
        }
    }

    #[test]
    fn supplier_store_roundtrips_and_keeps_ids_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suppliers.json");

        let mut store = SupplierStore::open(&path).unwrap();
        let first = store.create_or_associate(&candidate("111")).unwrap();
        let second = store.create_or_associate(&candidate("222")).unwrap();
        assert_ne!(first, second);

        // Same tax code associates instead of creating
        let again = store.create_or_associate(&candidate("111")).unwrap();
        assert_eq!(first, again);
        assert_eq!(store.len(), 2);

        // A fresh open sees the same records
        let reopened = SupplierStore::open(&path).unwrap();
        assert_eq!(reopened.find_by_tax_code("111").unwrap(), Some(first));
        assert_eq!(reopened.find_by_tax_code("999").unwrap(), None);
    }

    #[test]
    fn invoice_store_lists_known_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.json");

        let mut store = InvoiceStore::open(&path).unwrap();
        let record = InvoiceRecord {
            file_id: "FT-1".to_string(),
            invoice_number: "FT-1".to_string(),
            invoice_date: "2024-01-01".to_string(),
            total_amount: rust_decimal::Decimal::ZERO,
            supplier_id: SupplierId("S-0001".to_string()),
            lines: Vec::new(),
        };
        store.create(&record).unwrap();

        let reopened = InvoiceStore::open(&path).unwrap();
        assert_eq!(
            reopened.list_known().unwrap(),
            vec![("FT-1".to_string(), SupplierId("S-0001".to_string()))]
        );
    }
}
