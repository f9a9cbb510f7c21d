use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::parser::nutrients::{Nutrient, NutrientRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const CATEGORY_COLUMN: usize = 2;

/// One extracted product, ready for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub name: String,
    pub url: String,
    pub category: String,
    pub nutrients: NutrientRecord,
}

impl ProductRecord {
    fn csv_row(&self) -> Vec<String> {
        let mut row = vec![self.name.clone(), self.url.clone(), self.category.clone()];
        row.extend(self.nutrients.values().iter().map(|v| v.to_string()));
        row
    }
}

pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["NOME_PRODUTO", "URL", "CATEGORIA"];
    header.extend(Nutrient::ALL.iter().map(|n| n.column()));
    header
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Write discovered URLs as a pretty-printed JSON array.
pub fn save_urls(path: &Path, urls: &BTreeSet<String>) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, urls)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

pub fn load_urls(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid URL list in {}", path.display()))
}

/// Write records as CSV (UTF-8 with BOM), fixed column order.
pub fn save_products(path: &Path, records: &[ProductRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer.write_record(csv_header())?;
    for record in records {
        writer.write_record(record.csv_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub struct CsvSummary {
    pub rows: usize,
    /// (category, rows), most frequent first.
    pub by_category: Vec<(String, usize)>,
}

pub fn summarize_products(path: &Path) -> Result<CsvSummary> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        rows += 1;
        let category = record.get(CATEGORY_COLUMN).unwrap_or_default().to_string();
        *counts.entry(category).or_default() += 1;
    }

    let mut by_category: Vec<_> = counts.into_iter().collect();
    by_category.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(CsvSummary { rows, by_category })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, category: &str, sodium: f64) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            url: format!("https://www.sadia.com.br/produtos/x/{name}"),
            category: category.to_string(),
            nutrients: NutrientRecord {
                sodium_mg: sodium,
                ..NutrientRecord::default()
            },
        }
    }

    #[test]
    fn urls_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados").join("urls.json");
        let urls: BTreeSet<String> = ["https://www.sadia.com.br/produtos/b/x", "https://www.sadia.com.br/produtos/a/y"]
            .into_iter()
            .map(String::from)
            .collect();

        save_urls(&path, &urls).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  \""));

        let loaded = load_urls(&path).unwrap();
        assert_eq!(loaded, vec!["https://www.sadia.com.br/produtos/a/y", "https://www.sadia.com.br/produtos/b/x"]);
    }

    #[test]
    fn load_urls_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_urls(&path).is_err());
        assert!(load_urls(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn csv_has_bom_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("produtos.csv");
        save_products(&path, &[record("Frango - Sadia", "Aves", 450.0)]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "NOME_PRODUTO,URL,CATEGORIA,PORCAO (g),CALORIAS (kcal),CARBOIDRATOS (g),PROTEINAS (g),\
             GORDURAS_TOTAIS (g),GORDURAS_SATURADAS (g),FIBRAS (g),ACUCARES (g),SODIO (mg)"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Frango - Sadia,https://www.sadia.com.br/produtos/x/Frango - Sadia,Aves,100,0,0,0,0,0,0,0,450"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn summary_counts_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("produtos.csv");
        save_products(
            &path,
            &[
                record("a", "Aves", 1.0),
                record("b", "Frios", 1.0),
                record("c", "Aves", 2.5),
            ],
        )
        .unwrap();

        let summary = summarize_products(&path).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.by_category[0], ("Aves".to_string(), 2));
        assert_eq!(summary.by_category[1], ("Frios".to_string(), 1));
    }
}
