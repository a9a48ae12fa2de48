//! Application state.

use std::collections::HashMap;
use std::sync::Arc;

use clab_genai::{DirectClient, GenAiConfig, GenerationClient};
use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::ApiResult;

/// Per-token credit balances.
///
/// Balances only go down and may go negative; nothing is rejected on them.
#[derive(Debug)]
pub struct CreditLedger {
    default_credits: i64,
    balances: Mutex<HashMap<String, i64>>,
}

impl CreditLedger {
    pub fn new(default_credits: i64) -> Self {
        Self {
            default_credits,
            balances: Mutex::new(HashMap::new()),
        }
    }

    /// Current balance for `token`.
    pub async fn balance(&self, token: &str) -> i64 {
        let balances = self.balances.lock().await;
        balances.get(token).copied().unwrap_or(self.default_credits)
    }

    /// Charge one credit and return the new balance.
    pub async fn charge(&self, token: &str) -> i64 {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .entry(token.to_string())
            .or_insert(self.default_credits);
        *balance -= 1;
        *balance
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub client: Arc<dyn GenerationClient>,
    pub credits: Arc<CreditLedger>,
}

impl AppState {
    /// Build state backed by the direct Gemini client.
    pub fn new(config: ApiConfig, genai: &GenAiConfig) -> ApiResult<Self> {
        let client = DirectClient::new(genai)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Build state around an existing client.
    pub fn with_client(config: ApiConfig, client: Arc<dyn GenerationClient>) -> Self {
        let credits = Arc::new(CreditLedger::new(config.default_credits));
        Self {
            config: Arc::new(config),
            client,
            credits,
        }
    }
}
