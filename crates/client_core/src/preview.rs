use std::collections::HashSet;
use std::sync::Mutex;

/// Registry of ephemeral in-memory object urls, modelling the
/// create-on-select / revoke-on-clear lifecycle of local file previews.
/// Every url handed out must be revoked when the reference holding it is
/// superseded or reset.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    inner: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next: u64,
    live: HashSet<String>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, filename: &str) -> String {
        let mut inner = self.lock();
        let url = format!("mem://attachments/{}/{filename}", inner.next);
        inner.next += 1;
        inner.live.insert(url.clone());
        url
    }

    /// Returns false when the url was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().live.remove(url)
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.lock().live.contains(url)
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
