use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use stocktake_core::api::{ApiError, StocklistApi};
use stocktake_core::counting::CountSubmission;

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

#[derive(Debug, Clone, Default)]
pub(crate) struct Spinner {
    frame_index: usize,
}

impl Spinner {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    pub(crate) fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

#[derive(Debug)]
pub(crate) struct CountOutcome {
    pub(crate) submission: CountSubmission,
    pub(crate) result: Result<bool, ApiError>,
}

/// Sends one amount off the UI thread and reports back on the receiver.
pub(crate) trait CountSubmitter: Send + Sync {
    fn spawn_submit(&self, submission: CountSubmission) -> Receiver<CountOutcome>;
}

pub(crate) struct ApiCountSubmitter {
    api: Arc<dyn StocklistApi>,
}

impl ApiCountSubmitter {
    pub(crate) fn new(api: Arc<dyn StocklistApi>) -> Self {
        Self { api }
    }
}

impl CountSubmitter for ApiCountSubmitter {
    fn spawn_submit(&self, submission: CountSubmission) -> Receiver<CountOutcome> {
        let (sender, receiver) = mpsc::channel();
        let api = Arc::clone(&self.api);
        std::thread::spawn(move || {
            let result = api
                .create_list_item(submission.list_id, submission.item_id, submission.amount)
                .map(|response| response.created);
            let _ = sender.send(CountOutcome { submission, result });
        });
        receiver
    }
}
