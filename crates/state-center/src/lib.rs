use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{to_writer_pretty, Value};
use soultest_core_types::{Cookie, SessionId};
use tracing::debug;

/// Variables, cookies and session metadata for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub variables: BTreeMap<String, String>,
    pub cookies: Vec<Cookie>,
    pub session_id: SessionId,
    pub current_url: Option<String>,
    pub page_title: Option<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Replace `${name}` with the variable's value. Unknown names stay verbatim.
    pub fn interpolate(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.variables.get(name.trim()) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("${");
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

struct Versioned {
    context: Arc<ExecutionContext>,
    version: u64,
}

/// Single-writer, copy-on-write owner of an [`ExecutionContext`].
///
/// Readers get either a deep copy or a shared snapshot that later writes
/// never touch. Every committed change bumps [`version`](Self::version).
pub struct ExecutionContextManager {
    state: RwLock<Versioned>,
}

impl Default for ExecutionContextManager {
    fn default() -> Self {
        Self::new(SessionId::new())
    }
}

impl ExecutionContextManager {
    pub fn new(session_id: SessionId) -> Self {
        Self::from_context(ExecutionContext::new(session_id))
    }

    pub fn from_context(context: ExecutionContext) -> Self {
        Self {
            state: RwLock::new(Versioned {
                context: Arc::new(context),
                version: 0,
            }),
        }
    }

    /// Deep copy of the current context.
    pub fn context(&self) -> ExecutionContext {
        (*self.state.read().context).clone()
    }

    /// Shared, immutable view of the current context.
    pub fn snapshot(&self) -> Arc<ExecutionContext> {
        Arc::clone(&self.state.read().context)
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    pub fn session_id(&self) -> SessionId {
        self.state.read().context.session_id.clone()
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        self.state.read().context.variable(name).map(str::to_string)
    }

    pub fn interpolate(&self, input: &str) -> String {
        self.state.read().context.interpolate(input)
    }

    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        self.commit(|ctx| {
            ctx.variables.insert(name, value);
        });
    }

    /// Replace the cookie jar.
    pub fn update_cookies(&self, cookies: Vec<Cookie>) {
        self.commit(|ctx| ctx.cookies = cookies);
    }

    pub fn set_current_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.commit(|ctx| ctx.current_url = Some(url));
    }

    pub fn set_page_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.commit(|ctx| ctx.page_title = Some(title));
    }

    /// Merge one metadata key, keeping the others.
    pub fn set_metadata(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.commit(|ctx| {
            ctx.metadata.insert(key, value);
        });
    }

    /// Independent manager starting from a copy of this context.
    pub fn fork(&self) -> ExecutionContextManager {
        Self::from_context(self.context())
    }

    /// Take variables and metadata from `other` (its values win), append its
    /// cookies. The session id stays ours.
    pub fn merge(&self, other: &ExecutionContextManager) {
        let theirs = other.snapshot();
        self.commit(|ctx| {
            ctx.variables.extend(
                theirs
                    .variables
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            ctx.metadata.extend(
                theirs
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            ctx.cookies.extend(theirs.cookies.iter().cloned());
        });
    }

    /// Clear variables and cookies; the session id survives.
    pub fn reset(&self) {
        self.commit(|ctx| {
            ctx.variables.clear();
            ctx.cookies.clear();
        });
    }

    /// Write the current context as pretty JSON.
    pub fn write_snapshot<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let snapshot = self.snapshot();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &*snapshot)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        writer.flush()?;
        Ok(())
    }

    fn commit(&self, change: impl FnOnce(&mut ExecutionContext)) {
        let mut guard = self.state.write();
        change(Arc::make_mut(&mut guard.context));
        guard.version += 1;
        debug!(version = guard.version, "execution context updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_is_a_deep_copy() {
        let manager = ExecutionContextManager::default();
        manager.set_variable("user", "jane");
        let mut copy = manager.context();
        copy.variables.insert("user".into(), "mallory".into());
        assert_eq!(manager.variable("user").as_deref(), Some("jane"));
    }

    #[test]
    fn snapshots_are_unaffected_by_later_writes() {
        let manager = ExecutionContextManager::default();
        manager.set_current_url("https://x.test/a");
        let before = manager.snapshot();
        manager.set_current_url("https://x.test/b");
        assert_eq!(before.current_url.as_deref(), Some("https://x.test/a"));
        assert_eq!(
            manager.snapshot().current_url.as_deref(),
            Some("https://x.test/b")
        );
    }

    #[test]
    fn every_commit_bumps_version() {
        let manager = ExecutionContextManager::default();
        assert_eq!(manager.version(), 0);
        manager.set_variable("a", "1");
        manager.set_page_title("Home");
        manager.set_metadata("browser", json!("chromium"));
        manager.update_cookies(vec![Cookie::new("sid", "abc")]);
        assert_eq!(manager.version(), 4);
    }

    #[test]
    fn metadata_merges_one_key() {
        let manager = ExecutionContextManager::default();
        manager.set_metadata("a", json!(1));
        manager.set_metadata("b", json!({"nested": true}));
        manager.set_metadata("a", json!(2));
        let ctx = manager.context();
        assert_eq!(ctx.metadata.len(), 2);
        assert_eq!(ctx.metadata["a"], json!(2));
    }

    #[test]
    fn fork_is_independent_and_merge_folds_back() {
        let parent = ExecutionContextManager::new(SessionId("parent".into()));
        parent.set_variable("shared", "from-parent");
        parent.update_cookies(vec![Cookie::new("a", "1")]);

        let child = parent.fork();
        child.set_variable("shared", "from-child");
        child.set_variable("extra", "x");
        child.update_cookies(vec![Cookie::new("b", "2")]);
        assert_eq!(parent.variable("shared").as_deref(), Some("from-parent"));

        parent.merge(&child);
        let ctx = parent.context();
        assert_eq!(ctx.variable("shared"), Some("from-child"));
        assert_eq!(ctx.variable("extra"), Some("x"));
        let names: Vec<_> = ctx.cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(ctx.session_id, SessionId("parent".into()));
    }

    #[test]
    fn reset_keeps_session() {
        let manager = ExecutionContextManager::new(SessionId("s-1".into()));
        manager.set_variable("a", "1");
        manager.update_cookies(vec![Cookie::new("sid", "abc")]);
        manager.reset();
        let ctx = manager.context();
        assert!(ctx.variables.is_empty());
        assert!(ctx.cookies.is_empty());
        assert_eq!(ctx.session_id.0, "s-1");
    }

    #[test]
    fn interpolation() {
        let manager = ExecutionContextManager::default();
        manager.set_variable("host", "x.test");
        manager.set_variable("user", "jane");
        assert_eq!(
            manager.interpolate("https://${host}/u/${ user }?q=${missing}"),
            "https://x.test/u/jane?q=${missing}"
        );
        assert_eq!(manager.interpolate("plain ${unterminated"), "plain ${unterminated");
    }

    #[test]
    fn snapshot_file_is_json() {
        let manager = ExecutionContextManager::new(SessionId("file".into()));
        manager.set_variable("k", "v");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.json");
        manager.write_snapshot(&path).unwrap();
        let written: ExecutionContext =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, manager.context());
    }
}
