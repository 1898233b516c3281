//! The namespace store adapter.
//!
//! [`Kando`] resolves the medium named by a type path, loads the namespace
//! root, runs the tree operation and writes the root back (or removes it).
//! Session writes may carry an expiration, enforced lazily on read and by
//! the background sweep.

use crate::config::KandoConfig;
use crate::error::KandoResult;
use crate::expiration::{self, ExpirationSweep, SweepReport};
use crate::namespace;
use crate::path::{MediumKind, TypePath};
use crate::tree;
use kando_storage::{probe, Medium, MemoryMedium, StorageError};
use kando_util::{expires_at, now_millis};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Dotted-path access to JSON namespaces stored in key-value mediums.
///
/// ```rust,ignore
/// let kando = Kando::new();
/// kando.set("local.user.profile", &json!({"name": "Alice", "age": 30}))?;
/// kando.set("local.user.profile.name", &"Alice Johnson")?;
/// assert_eq!(kando.get("local.user.profile.age")?, Some(json!(30)));
/// kando.delete("local.user")?;
/// ```
pub struct Kando {
    local: Option<Arc<dyn Medium>>,
    session: Option<Arc<dyn Medium>>,
    fallback: Arc<dyn Medium>,
    config: KandoConfig,
    // Held for every read-mutate-write, including sweep ticks.
    lock: Arc<Mutex<()>>,
    sweep: ExpirationSweep,
}

impl Kando {
    /// Adapter with no local or session medium: everything lands in the
    /// shared in-memory fallback.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> KandoBuilder {
        KandoBuilder::default()
    }

    pub fn config(&self) -> &KandoConfig {
        &self.config
    }

    /// The medium operations on `kind` will use right now.
    ///
    /// A configured medium that fails the write probe is replaced by the
    /// fallback for this call.
    pub fn medium(&self, kind: &MediumKind) -> Arc<dyn Medium> {
        let named = match kind {
            MediumKind::Local => self.local.as_ref(),
            MediumKind::Session => self.session.as_ref(),
            MediumKind::Other(_) => None,
        };

        match named {
            Some(medium) if probe(medium.as_ref(), &self.config.probe_key) => medium.clone(),
            _ => {
                debug!(medium = %kind, "Using in-memory fallback medium");
                self.fallback.clone()
            }
        }
    }

    /// Single entry point.
    ///
    /// `data` selects the operation: `None` reads, `Some(Value::Null)`
    /// deletes, any other value writes. `expiration_seconds` only applies to
    /// writes on the session medium. Only reads return a value.
    pub fn apply(
        &self,
        type_path: &str,
        data: Option<Value>,
        expiration_seconds: Option<u64>,
    ) -> KandoResult<Option<Value>> {
        let type_path = TypePath::parse(type_path)?;
        let _guard = self.lock()?;
        let medium = self.medium(type_path.medium());

        match data {
            None => self.read(&type_path, medium.as_ref()),
            Some(Value::Null) => {
                self.remove(&type_path, medium.as_ref())?;
                Ok(None)
            }
            Some(value) => {
                self.write(&type_path, medium, value, expiration_seconds)?;
                Ok(None)
            }
        }
    }

    /// Read the value at `type_path`.
    pub fn get(&self, type_path: &str) -> KandoResult<Option<Value>> {
        self.apply(type_path, None, None)
    }

    /// Read the value at `type_path` as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, type_path: &str) -> KandoResult<Option<T>> {
        match self.get(type_path)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Write `value` at `type_path`.
    ///
    /// A value that serializes to `null` deletes the path.
    pub fn set<T: Serialize + ?Sized>(&self, type_path: &str, value: &T) -> KandoResult<()> {
        self.apply(type_path, Some(serde_json::to_value(value)?), None)?;
        Ok(())
    }

    /// Write `value` at a session `type_path`, expiring after `seconds`.
    pub fn set_expiring<T: Serialize + ?Sized>(
        &self,
        type_path: &str,
        value: &T,
        seconds: u64,
    ) -> KandoResult<()> {
        self.apply(type_path, Some(serde_json::to_value(value)?), Some(seconds))?;
        Ok(())
    }

    /// Delete the value at `type_path`. Missing paths are a no-op.
    pub fn delete(&self, type_path: &str) -> KandoResult<()> {
        self.apply(type_path, Some(Value::Null), None)?;
        Ok(())
    }

    /// Run one sweep pass over the session medium now.
    pub fn sweep_now(&self) -> KandoResult<SweepReport> {
        let _guard = self.lock()?;
        let medium = self.medium(&MediumKind::Session);
        expiration::sweep_once(medium.as_ref(), now_millis())
    }

    /// Whether the background sweep is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweep.is_running()
    }

    fn lock(&self) -> KandoResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()).into())
    }

    fn read(&self, type_path: &TypePath, medium: &dyn Medium) -> KandoResult<Option<Value>> {
        let path = type_path.path();

        if type_path.medium().is_session()
            && expiration::evict_if_expired(medium, path, now_millis())?
        {
            return Ok(None);
        }

        let root = namespace::load_root(medium, type_path.root_key())?;
        Ok(tree::get(&root, path).cloned())
    }

    fn remove(&self, type_path: &TypePath, medium: &dyn Medium) -> KandoResult<()> {
        let removed = namespace::remove_path(medium, type_path.path())?;
        debug!(path = %type_path, removed, "Deleted");

        if type_path.medium().is_session() {
            expiration::remove_record(medium, type_path.path())?;
        }
        Ok(())
    }

    fn write(
        &self,
        type_path: &TypePath,
        medium: Arc<dyn Medium>,
        value: Value,
        expiration_seconds: Option<u64>,
    ) -> KandoResult<()> {
        let root_key = type_path.root_key();
        let mut root = namespace::load_root(medium.as_ref(), root_key)?;
        tree::set(&mut root, type_path.path(), value)?;
        namespace::persist(medium.as_ref(), root_key, &root)?;
        debug!(path = %type_path, "Wrote");

        if !type_path.medium().is_session() {
            return Ok(());
        }
        // A fresh write replaces whatever expiry the path carried
        expiration::remove_record(medium.as_ref(), type_path.path())?;
        if let Some(seconds) = expiration_seconds.filter(|seconds| *seconds > 0) {
            let deadline = expires_at(now_millis(), seconds);
            expiration::write_record(medium.as_ref(), type_path.path(), deadline)?;
            self.sweep.ensure_running(medium, self.lock.clone());
        }
        Ok(())
    }
}

impl Default for Kando {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Kando`].
#[derive(Default)]
pub struct KandoBuilder {
    local: Option<Arc<dyn Medium>>,
    session: Option<Arc<dyn Medium>>,
    fallback: Option<Arc<dyn Medium>>,
    config: Option<KandoConfig>,
}

impl KandoBuilder {
    /// Medium behind `local.*` paths.
    pub fn local(mut self, medium: Arc<dyn Medium>) -> Self {
        self.local = Some(medium);
        self
    }

    /// Medium behind `session.*` paths.
    pub fn session(mut self, medium: Arc<dyn Medium>) -> Self {
        self.session = Some(medium);
        self
    }

    /// Medium used when a named medium is missing or unusable.
    ///
    /// Defaults to [`MemoryMedium::shared`].
    pub fn fallback(mut self, medium: Arc<dyn Medium>) -> Self {
        self.fallback = Some(medium);
        self
    }

    pub fn config(mut self, config: KandoConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Kando {
        let config = self.config.unwrap_or_default();
        let fallback = self
            .fallback
            .unwrap_or_else(|| MemoryMedium::shared() as Arc<dyn Medium>);

        Kando {
            local: self.local,
            session: self.session,
            fallback,
            sweep: ExpirationSweep::new(config.sweep_interval()),
            config,
            lock: Arc::new(Mutex::new(())),
        }
    }
}
