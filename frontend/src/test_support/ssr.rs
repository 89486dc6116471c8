/// Runs `f` inside a throwaway reactive runtime so view models can create
/// signals and actions on the host.
pub fn with_runtime<T>(f: impl FnOnce() -> T) -> T {
    let runtime = leptos::create_runtime();
    let result = f();
    runtime.dispose();
    result
}

/// Drives `f` to completion on a current-thread tokio runtime inside a
/// `LocalSet`, so `spawn_local` work such as dispatched actions can run.
pub fn with_local_runtime_async<F, Fut>(f: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime");
    tokio::task::LocalSet::new().block_on(&runtime, f());
}
