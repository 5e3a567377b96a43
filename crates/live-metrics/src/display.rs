//! Display slots the poller writes into.
//!
//! The page (or whatever hosts the cards) owns the slots. The poller only
//! asks whether a slot exists and writes text into it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One of the four metric cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayTarget {
    ModelAccuracy,
    TrainingSamples,
    AvgFuelSavings,
    PredictionTime,
}

impl DisplayTarget {
    /// All targets in render order.
    pub const ALL: [DisplayTarget; 4] = [
        DisplayTarget::ModelAccuracy,
        DisplayTarget::TrainingSamples,
        DisplayTarget::AvgFuelSavings,
        DisplayTarget::PredictionTime,
    ];

    /// Stable element identifier.
    pub fn id(&self) -> &'static str {
        match self {
            DisplayTarget::ModelAccuracy => "modelAccuracy",
            DisplayTarget::TrainingSamples => "trainingSamples",
            DisplayTarget::AvgFuelSavings => "avgFuelSavings",
            DisplayTarget::PredictionTime => "predictionTime",
        }
    }

    /// Look up a target by its element identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Human readable card label.
    pub fn label(&self) -> &'static str {
        match self {
            DisplayTarget::ModelAccuracy => "Model Accuracy",
            DisplayTarget::TrainingSamples => "Training Samples",
            DisplayTarget::AvgFuelSavings => "Avg Fuel Savings",
            DisplayTarget::PredictionTime => "Prediction Time",
        }
    }
}

impl fmt::Display for DisplayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Access to the slots hosting the metric cards.
///
/// Implementations handle their own synchronisation; the poller may call
/// them from several ticks at once.
pub trait DisplayBoard: Send + Sync {
    /// Whether the slot is present right now.
    fn has_target(&self, target: DisplayTarget) -> bool;

    /// Replace the text content of a slot.
    fn set_text(&self, target: DisplayTarget, text: &str);
}

/// In-memory board.
#[derive(Debug, Default)]
pub struct MemoryBoard {
    present: HashSet<DisplayTarget>,
    inner: Mutex<BoardState>,
}

#[derive(Debug, Default)]
struct BoardState {
    texts: HashMap<DisplayTarget, String>,
    writes: usize,
}

impl MemoryBoard {
    /// Board exposing all four slots.
    pub fn full() -> Self {
        Self::with_targets(DisplayTarget::ALL)
    }

    /// Board exposing only the given slots.
    pub fn with_targets(targets: impl IntoIterator<Item = DisplayTarget>) -> Self {
        Self {
            present: targets.into_iter().collect(),
            inner: Mutex::new(BoardState::default()),
        }
    }

    /// Current text of a slot, if anything was written to it.
    pub fn text(&self, target: DisplayTarget) -> Option<String> {
        self.inner.lock().texts.get(&target).cloned()
    }

    /// Total number of writes performed.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    /// Copy of every written slot.
    pub fn snapshot(&self) -> HashMap<DisplayTarget, String> {
        self.inner.lock().texts.clone()
    }
}

impl DisplayBoard for MemoryBoard {
    fn has_target(&self, target: DisplayTarget) -> bool {
        self.present.contains(&target)
    }

    fn set_text(&self, target: DisplayTarget, text: &str) {
        let mut state = self.inner.lock();
        state.texts.insert(target, text.to_string());
        state.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_ids_round_trip() {
        for target in DisplayTarget::ALL {
            assert_eq!(DisplayTarget::from_id(target.id()), Some(target));
        }
        assert_eq!(DisplayTarget::from_id("modelVersion"), None);
        assert_eq!(DisplayTarget::PredictionTime.to_string(), "predictionTime");
    }

    #[test]
    fn test_memory_board_partial() {
        let board = MemoryBoard::with_targets([DisplayTarget::ModelAccuracy]);
        assert!(board.has_target(DisplayTarget::ModelAccuracy));
        assert!(!board.has_target(DisplayTarget::TrainingSamples));

        board.set_text(DisplayTarget::ModelAccuracy, "92.3%");
        board.set_text(DisplayTarget::ModelAccuracy, "92.4%");
        assert_eq!(board.text(DisplayTarget::ModelAccuracy).as_deref(), Some("92.4%"));
        assert_eq!(board.writes(), 2);
        assert_eq!(board.snapshot().len(), 1);
    }
}
