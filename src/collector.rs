use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::fetch::PageFetcher;
use crate::parser;
use crate::store::ProductRecord;

/// Fetch and parse each product page in order. Pages that fail to load are
/// skipped; every page that loads yields exactly one record.
pub async fn collect_products<F: PageFetcher>(
    fetcher: &F,
    urls: &[String],
    delay: Duration,
) -> Vec<ProductRecord> {
    let total = urls.len();
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut records = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (i, url) in urls.iter().enumerate() {
        match fetcher.fetch(url).await {
            Ok(html) => {
                let record = parser::process_page(url, &html);
                info!("[{}/{}] {} ({})", i + 1, total, record.name, record.category);
                records.push(record);
            }
            Err(e) => {
                failed += 1;
                warn!("[{}/{}] skipped: {}", i + 1, total, e);
            }
        }
        pb.inc(1);

        if i + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    info!("Extracted {} products ({} fetch errors)", records.len(), failed);
    records
}
