use serde::Serialize;

/// Serialize `value` to single-line JSON and hand it to `log_action`, but
/// only when DEBUG is enabled; payloads are not rendered otherwise.
pub(crate) fn with_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize + ?Sized,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let json = serde_json::to_string(value)
        .unwrap_or_else(|error| format!("<json serialize failed: {error}>"));
    log_action(json.as_str());
}
