//! Machine translation of blank cells.
//!
//! Before upload, blank mutation cells of rows whose primary value is set can
//! be pre-filled by a [`TranslationProvider`]. Non-blank cells are never
//! touched. Filled cells are reported per sheet so the sheet backend can mark
//! them for review.
//!
//! Rate limiting pauses the whole fill: on `RateLimited` the fill sleeps for
//! the advertised time and retries the same cell.

mod libre;

pub use libre::LibreTranslateProvider;

use std::future::Future;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::sync::rows::FIRST_MUTATION_COLUMN;
use crate::sync::ExportSheet;

/// Filled `(row, column)` cells per sheet title.
pub type TranslatedCells = IndexMap<String, Vec<(usize, usize)>>;

/// A machine translation service.
pub trait TranslationProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Translate `text` from `source_lang` into `target_lang`.
    fn translate(
        &self,
        source_lang: &str,
        text: &str,
        target_lang: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Fill blank mutation cells of every sheet.
///
/// Row 0 of each sheet is the header; mutation columns are named by it.
/// Filled cells are also recorded in each sheet's `translated_cells`.
///
/// # Errors
///
/// Returns the provider's error, or `RateLimited` once `max_retries`
/// consecutive rate-limit pauses for one cell are used up.
pub async fn fill_blank_cells<P: TranslationProvider>(
    provider: &P,
    sheets: &mut [ExportSheet],
    source_lang: &str,
    max_retries: u32,
) -> Result<TranslatedCells> {
    let mut filled = TranslatedCells::new();

    for sheet in sheets.iter_mut() {
        let Some((header, data)) = sheet.rows.split_first_mut() else {
            continue;
        };
        let mut cells = Vec::new();

        for (offset, row) in data.iter_mut().enumerate() {
            let primary = match row.get(1) {
                Some(p) if !p.trim().is_empty() => p.clone(),
                _ => continue,
            };
            for col in FIRST_MUTATION_COLUMN..header.len() {
                if row.get(col).is_some_and(|cell| !cell.is_empty()) {
                    continue;
                }
                let target = &header[col];
                let text = translate_with_retry(provider, source_lang, &primary, target, max_retries).await?;
                if row.len() <= col {
                    row.resize(col + 1, String::new());
                }
                row[col] = text;
                cells.push((offset + 1, col));
            }
        }

        if !cells.is_empty() {
            info!(sheet = %sheet.title, cells = cells.len(), provider = provider.name(), "Machine-translated blank cells");
            sheet.translated_cells.clone_from(&cells);
            filled.insert(sheet.title.clone(), cells);
        }
    }

    Ok(filled)
}

async fn translate_with_retry<P: TranslationProvider>(
    provider: &P,
    source_lang: &str,
    text: &str,
    target_lang: &str,
    max_retries: u32,
) -> Result<String> {
    let mut attempts = 0;
    loop {
        match provider.translate(source_lang, text, target_lang).await {
            Err(Error::RateLimited { retry_after_secs }) if attempts < max_retries => {
                attempts += 1;
                warn!(retry_after_secs, attempt = attempts, "Translation rate limited, pausing");
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
            }
            Ok(translated) => {
                debug!(target_lang, "Translated cell");
                return Ok(translated);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Uppercases text; rate-limits the first `limited` calls.
    struct FakeProvider {
        limited: u32,
        calls: AtomicU32,
    }

    impl FakeProvider {
        fn new(limited: u32) -> Self {
            Self {
                limited,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl TranslationProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn translate(&self, _source: &str, text: &str, target: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.limited {
                return Err(Error::RateLimited { retry_after_secs: 0 });
            }
            Ok(format!("{}:{}", target, text.to_uppercase()))
        }
    }

    fn sheet(rows: &[&[&str]]) -> ExportSheet {
        ExportSheet {
            title: "messages#1".to_string(),
            path: "messages.properties".to_string(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(ToString::to_string).collect())
                .collect(),
            translated_cells: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_fills_only_blank_cells() {
        let mut sheets = vec![sheet(&[
            &["key", "primary", "de", "fr"],
            &["farewell", "bye", "", "Au revoir"],
            &["empty", "", "", ""],
        ])];

        let filled = fill_blank_cells(&FakeProvider::new(0), &mut sheets, "en", 3).await.unwrap();

        assert_eq!(sheets[0].rows[1], vec!["farewell", "bye", "de:BYE", "Au revoir"]);
        assert_eq!(sheets[0].rows[2], vec!["empty", "", "", ""]);
        assert_eq!(filled["messages#1"], vec![(1, 2)]);
        assert_eq!(sheets[0].translated_cells, vec![(1, 2)]);
    }

    #[tokio::test]
    async fn test_retries_after_rate_limit() {
        let mut sheets = vec![sheet(&[&["key", "primary", "de"], &["a", "x", ""]])];
        let provider = FakeProvider::new(2);

        fill_blank_cells(&provider, &mut sheets, "en", 2).await.unwrap();

        assert_eq!(sheets[0].rows[1][2], "de:X");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut sheets = vec![sheet(&[&["key", "primary", "de"], &["a", "x", ""]])];

        let err = fill_blank_cells(&FakeProvider::new(10), &mut sheets, "en", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(sheets[0].rows[1][2], "");
    }

    #[tokio::test]
    async fn test_short_rows_are_padded() {
        let mut sheets = vec![sheet(&[&["key", "primary", "de"], &["a", "x"]])];
        fill_blank_cells(&FakeProvider::new(0), &mut sheets, "en", 0).await.unwrap();
        assert_eq!(sheets[0].rows[1], vec!["a", "x", "de:X"]);
    }
}
