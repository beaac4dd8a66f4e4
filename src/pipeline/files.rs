// 入出力ファイル: 入力ディレクトリの走査と出力文書の書き出し

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

use crate::error::PdfSearchError;
use crate::pipeline::orchestrator::{BatchInput, BatchReport, ItemReport, ItemState, PageFailure};

/// PDFs found in an input directory.
#[derive(Debug, Default)]
pub struct CollectedInputs {
    pub inputs: Vec<BatchInput>,
    /// Files that matched but could not be read, already marked Failed.
    pub unreadable: Vec<ItemReport>,
}

impl CollectedInputs {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.unreadable.is_empty()
    }
}

/// `*.pdf` (大文字小文字を区別しない) をファイル名順に読み込む。
///
/// エラーになるのはディレクトリ自体が読めない場合のみ。
/// 個々のファイルの読み込み失敗はそのアイテムの入力エラーとして `unreadable` に入る。
pub fn collect_inputs(dir: &Path) -> crate::error::Result<CollectedInputs> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            // リンク切れのシンボリックリンクも拾い、読み込み失敗として報告する
            entry
                .file_type()
                .is_ok_and(|ft| ft.is_file() || ft.is_symlink())
        })
        .map(|entry| entry.path())
        .filter(|path| !path.is_dir() && is_pdf(path))
        .collect();
    paths.sort();

    let mut collected = CollectedInputs::default();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match read_input(&path, &name) {
            Ok(input) => collected.inputs.push(input),
            Err(e) => {
                let error =
                    PdfSearchError::input(format!("failed to read {}: {e}", path.display()));
                warn!(name = %name, error = %error, "unreadable input");
                collected.unreadable.push(ItemReport::unreadable(&name, &error));
            }
        }
    }
    Ok(collected)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn read_input(path: &Path, name: &str) -> std::io::Result<BatchInput> {
    let bytes = std::fs::read(path)?;
    let metadata = std::fs::metadata(path)?;
    // 作成日時が取れないファイルシステムでは更新日時を使う
    let created = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now());
    Ok(BatchInput {
        name: name.to_string(),
        bytes,
        created,
    })
}

/// 出力文書を `output_dir` に書き出す。
///
/// 書けなかった文書は報告から外し、そのページの失敗として記録する。
/// 1件の失敗で残りの書き出しは止めない。
pub fn write_documents(output_dir: &Path, report: &mut BatchReport) {
    for item in &mut report.items {
        let mut failures = Vec::new();
        item.documents.retain(|doc| {
            let path = output_dir.join(&doc.filename);
            match std::fs::write(&path, &doc.bytes) {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        item = %item.item_id,
                        path = %path.display(),
                        error = %e,
                        "failed to write document"
                    );
                    failures.push(PageFailure {
                        item_id: item.item_id.clone(),
                        page_index: Some(doc.page_index),
                        reason: format!("failed to write {}: {e}", path.display()),
                    });
                    false
                }
            }
        });
        if failures.is_empty() {
            continue;
        }
        item.failures.extend(failures);
        if item.documents.is_empty() {
            item.transition(ItemState::Failed);
        }
    }
}
