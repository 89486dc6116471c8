use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1/authenticate";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
}

static API_BASE_URL: OnceLock<String> = OnceLock::new();

fn cache_base_url(value: &str) -> String {
    let value = value.trim().to_string();
    let _ = API_BASE_URL.set(value.clone());
    API_BASE_URL.get().cloned().unwrap_or(value)
}

/// Pins the base URL before anything resolves it. Returns false if a value
/// was already cached.
pub fn set_api_base_url(value: &str) -> bool {
    API_BASE_URL.set(value.trim().to_string()).is_ok()
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::RuntimeConfig;

    fn read_key(global: &str, keys: [&str; 2]) -> Option<String> {
        let w = web_sys::window()?;
        let any = js_sys::Reflect::get(&w, &global.into()).ok()?;
        if any.is_undefined() || any.is_null() {
            return None;
        }
        let obj = js_sys::Object::from(any);
        keys.iter()
            .filter_map(|key| js_sys::Reflect::get(&obj, &(*key).into()).ok())
            .find(|v| !v.is_undefined() && !v.is_null())
            .and_then(|v| v.as_string())
    }

    // window.__APPARTNERS_ENV = { API_BASE_URL: "..." } (env.js) wins over
    // window.__APPARTNERS_CONFIG = { api_base_url: "..." }.
    pub(super) fn snapshot_from_globals() -> Option<String> {
        read_key("__APPARTNERS_ENV", ["API_BASE_URL", "api_base_url"])
            .or_else(|| read_key("__APPARTNERS_CONFIG", ["api_base_url", "API_BASE_URL"]))
    }

    pub(super) async fn fetch_runtime_config() -> Option<RuntimeConfig> {
        let origin = web_sys::window()?.location().origin().ok()?;
        let resp = reqwest::get(format!("{}/config.json", origin)).await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<RuntimeConfig>().await.ok()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    pub const ENV_KEY: &str = "APPARTNERS_API_BASE_URL";

    pub(super) fn snapshot_from_env() -> Option<String> {
        dotenvy::dotenv().ok();
        std::env::var(ENV_KEY)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn await_api_base_url() -> String {
    if let Some(cached) = API_BASE_URL.get() {
        return cached.clone();
    }
    if let Some(existing) = browser::snapshot_from_globals() {
        return cache_base_url(&existing);
    }
    if let Some(url) = browser::fetch_runtime_config()
        .await
        .and_then(|cfg| cfg.api_base_url)
    {
        return cache_base_url(&url);
    }
    cache_base_url(DEFAULT_API_BASE_URL)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn await_api_base_url() -> String {
    if let Some(cached) = API_BASE_URL.get() {
        return cached.clone();
    }
    match native::snapshot_from_env() {
        Some(url) => cache_base_url(&url),
        None => cache_base_url(DEFAULT_API_BASE_URL),
    }
}

pub async fn init() {
    let url = await_api_base_url().await;
    log::info!("API base URL resolved to {}", url);
}
