pub mod api;
pub mod config;
pub mod pages;
pub mod utils;

#[cfg(test)]
mod test_support;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Starting Appartners frontend (wasm)");

    // Resolve the API base URL from env.js / config.json without blocking.
    leptos::spawn_local(async move {
        config::init().await;
    });
}
