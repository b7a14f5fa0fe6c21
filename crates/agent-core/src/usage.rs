use parking_lot::Mutex;
use serde::Serialize;

use crate::request::{Generation, RepairRequest, TokenUsage};

/// Running totals of generation traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost: f64,
}

/// Tracks token usage and estimated spend.
///
/// Providers that do not report usage are estimated at four characters per
/// token.
#[derive(Debug, Default)]
pub struct UsageTracker {
    price_per_1k_tokens: f64,
    totals: Mutex<UsageSnapshot>,
}

impl UsageTracker {
    pub fn new(price_per_1k_tokens: f64) -> Self {
        Self {
            price_per_1k_tokens,
            totals: Mutex::new(UsageSnapshot::default()),
        }
    }

    pub fn record(&self, request: &RepairRequest, generation: &Generation) {
        let usage = generation.usage.unwrap_or_else(|| TokenUsage {
            prompt_tokens: estimate_tokens(&request.content)
                + estimate_tokens(&request.error_message)
                + request.page_html.as_deref().map(estimate_tokens).unwrap_or(0),
            completion_tokens: estimate_tokens(&generation.text),
        });
        let mut totals = self.totals.lock();
        totals.requests += 1;
        totals.prompt_tokens += usage.prompt_tokens;
        totals.completion_tokens += usage.completion_tokens;
        totals.estimated_cost += usage.total() as f64 / 1000.0 * self.price_per_1k_tokens;
    }

    pub fn record_cache_hit(&self) {
        self.totals.lock().cache_hits += 1;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        *self.totals.lock()
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}
