//! Canonical dashboard path and the redirect for legacy paths.

/// Client-side navigation capability.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

pub fn dashboard_path(org_slug: &str) -> String {
    format!("/organizations/{}/", org_slug)
}

/// Where to send a visitor who reached the dashboard via `path`.
///
/// Returns `None` when the path already carries an `/organizations/{slug}`
/// segment. Any other path is legacy and maps to the canonical dashboard.
pub fn legacy_redirect(path: &str, org_slug: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (Some("organizations"), Some(_)) => None,
        _ => Some(dashboard_path(org_slug)),
    }
}

/// Navigator for headless use: the redirect is only logged.
#[derive(Debug, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        log::info!("Routing: redirect to {}", path);
    }
}

/// Keeps every redirect it receives.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    redirects: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNavigator {
    pub(crate) fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

#[cfg(test)]
impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }
}
