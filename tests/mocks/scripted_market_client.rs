use async_trait::async_trait;
use moonset_data::client::AsyncMarketClient;
use moonset_data::error::{MarketDataError, MarketDataResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Client double that replays scripted responses in order.
///
/// Paths containing a routed fragment always get that route's body. Other
/// calls consume the script; once it runs out they get the fallback response
/// (a 500 unless set otherwise). Requested paths are recorded.
#[derive(Clone)]
pub struct ScriptedMarketClient {
    routes: Arc<Mutex<Vec<(String, Value)>>>,
    script: Arc<Mutex<VecDeque<MarketDataResult<Value>>>>,
    fallback: Arc<dyn Fn() -> MarketDataResult<Value> + Send + Sync>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedMarketClient {
    pub fn new() -> Self {
        Self::with_fallback(|| {
            Err(MarketDataError::ApiError {
                status: 500,
                message: "no scripted response".to_string(),
            })
        })
    }

    fn with_fallback(
        fallback: impl Fn() -> MarketDataResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            routes: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(fallback),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `value`.
    pub fn always(value: Value) -> Self {
        Self::with_fallback(move || Ok(value.clone()))
    }

    /// Always answer with the error `make_error` builds.
    pub fn always_failing(make_error: impl Fn() -> MarketDataError + Send + Sync + 'static) -> Self {
        Self::with_fallback(move || Err(make_error()))
    }

    /// Answer every path containing `fragment` with `value`.
    pub fn route(&self, fragment: &str, value: Value) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_string(), value));
        self
    }

    pub fn push(&self, response: MarketDataResult<Value>) -> &Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AsyncMarketClient for ScriptedMarketClient {
    async fn get_json(&self, path: &str) -> MarketDataResult<Value> {
        self.requests.lock().unwrap().push(path.to_string());
        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| path.contains(fragment.as_str()))
            .map(|(_, value)| value.clone());
        if let Some(value) = routed {
            return Ok(value);
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| (self.fallback)())
    }
}
