// 進捗: バッチ全体のページカウンタと、ページ毎に発行するスナップショット

use std::fmt;
use std::sync::mpsc::Sender;

use serde::Serialize;

/// Stage a page had reached when its progress event was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Rasterizing,
    Recognizing,
    Assembling,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Rasterizing => "rasterizing",
            Phase::Recognizing => "recognizing",
            Phase::Assembling => "assembling",
            Phase::Done => "done",
        })
    }
}

/// Page counters for one batch run. `completed` never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    total: u64,
    completed: u64,
}

impl ProgressState {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            completed: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub(crate) fn complete_page(&mut self) {
        self.completed += 1;
    }

    /// 事前スキャンのページ数と実際のラスタライズ結果が異なる場合に分母を補正する。
    pub(crate) fn rebase_item(&mut self, probed: u64, actual: u64) {
        self.total = self.total.saturating_sub(probed) + actual;
    }
}

/// Snapshot published after every page. Owned by the receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub item_name: String,
    /// 0-based page index within the item.
    pub page_index: usize,
    pub total_pages_in_item: usize,
    pub completed_pages_overall: u64,
    pub total_pages_overall: u64,
    pub phase: Phase,
    /// The page failed at `phase`.
    pub failed: bool,
}

impl ProgressEvent {
    /// Overall completion in percent.
    pub fn percent(&self) -> f64 {
        if self.total_pages_overall == 0 {
            return 100.0;
        }
        self.completed_pages_overall as f64 * 100.0 / self.total_pages_overall as f64
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: page {}/{} {}",
            self.item_name,
            self.page_index + 1,
            self.total_pages_in_item,
            self.phase
        )?;
        if self.failed {
            f.write_str(" (failed)")?;
        }
        write!(
            f,
            " [{}/{} pages, {:.0}%]",
            self.completed_pages_overall,
            self.total_pages_overall,
            self.percent()
        )
    }
}

/// Receives progress snapshots.
pub trait ProgressSink {
    fn publish(&mut self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent),
{
    fn publish(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards snapshots to another thread. A dropped receiver is ignored.
impl ProgressSink for Sender<ProgressEvent> {
    fn publish(&mut self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}
