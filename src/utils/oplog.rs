//! One structured line per service operation, on the `bookstore::ops` target.
//!
//! Lines are JSON objects so they can be grepped out of `ops.log` and parsed. A thread-local
//! sink mirrors them for tests without touching the global logger.

use std::cell::RefCell;

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Guard that disables the thread-local sink on drop.
pub struct OpSinkGuard;
impl Drop for OpSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Enable the thread-local sink for the current thread. Returns a guard that will disable it on drop.
pub fn enable_thread_sink() -> OpSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    OpSinkGuard
}

/// Push a line into the thread-local sink if enabled.
pub fn write_str(line: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(line.to_owned());
        }
    });
}

/// Drain the captured lines for the current thread. Empty when the sink is disabled.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Drained lines parsed back into JSON; lines that are not JSON are skipped.
pub fn drain_json() -> Vec<serde_json::Value> {
    drain().iter().filter_map(|l| serde_json::from_str(l).ok()).collect()
}

/// Emit an operation record built from `key => value` pairs.
///
/// ```ignore
/// oplog!("find_by_genre", "collection" => name, "returned" => n);
/// ```
#[macro_export]
macro_rules! oplog {
    ($op:expr $(, $k:literal => $v:expr)* $(,)?) => {{
        let mut __m = serde_json::Map::new();
        __m.insert("op".to_string(), serde_json::Value::from($op));
        $( __m.insert($k.to_string(), serde_json::json!($v)); )*
        let __s = serde_json::Value::Object(__m).to_string();
        $crate::utils::oplog::write_str(&__s);
        log::info!(target: $crate::logger::OPS_TARGET, "{}", __s);
    }};
}
