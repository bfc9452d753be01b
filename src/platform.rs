//! Browser Platform Glue
//!
//! Plugs the browser event loop, timers and console into the engine's
//! executor, delay and logging seams.

use std::time::Duration;

use collection_sync::Delay;
use futures::future::LocalBoxFuture;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use log::{Level, LevelFilter, SetLoggerError};
use rolling_logger::RollingLogger;
use wasm_bindgen::JsValue;

/// Runs engine futures on the Leptos local executor
pub struct LeptosSpawner;

impl LocalSpawn for LeptosSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        leptos::task::spawn_local(future);
        Ok(())
    }
}

/// Retry backoff on browser timers
pub struct GlooDelay;

impl Delay for GlooDelay {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}

fn console_sink(level: Level, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        Level::Error => web_sys::console::error_1(&line),
        Level::Warn => web_sys::console::warn_1(&line),
        Level::Info => web_sys::console::info_1(&line),
        Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
    }
}

/// Install the rolling logger with a console sink
pub fn init_logging() -> Result<(), SetLoggerError> {
    let level = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info };
    RollingLogger::builder().level(level).sink(console_sink).init()?;
    Ok(())
}
