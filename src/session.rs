//! Process-wide authentication session.
//!
//! The current token lives in memory for fast reads and is mirrored in a
//! durable [`TokenStorage`] under [`SESSION_TOKEN_KEY`] so a restarted
//! process (or reloaded page) can restore it.

use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, PoisonError, RwLock},
};

use crate::{ApiError, Result};

/// Storage key the session token is persisted under.
pub const SESSION_TOKEN_KEY: &str = "token";

/// Durable client-side key-value store.
pub trait TokenStorage: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Ephemeral in-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-populated with a token, as if persisted by an
    /// earlier session.
    pub fn with_token(token: impl Into<String>) -> Self {
        let storage = Self::default();
        storage
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(SESSION_TOKEN_KEY.to_owned(), token.into());
        storage
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// File-backed storage: one JSON object mapping keys to strings.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStorage {
    path: std::path::PathBuf,
    lock: Mutex<()>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    /// Uses `path` as the backing file. The file is created on first write.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(err) => {
                return Err(ApiError::Storage(format!(
                    "could not read {}: {err}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|err| {
            ApiError::Storage(format!("invalid session file {}: {err}", self.path.display()))
        })
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)
            .map_err(|err| ApiError::Storage(format!("could not encode session: {err}")))?;
        std::fs::write(&self.path, content).map_err(|err| {
            ApiError::Storage(format!("could not write {}: {err}", self.path.display()))
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TokenStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// `window.localStorage` in browser runtimes.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    /// Uses the global `localStorage` of the current window.
    pub fn new() -> Self {
        Self
    }

    fn call(method: &str, args: &[&str]) -> Result<wasm_bindgen::JsValue> {
        use wasm_bindgen::{JsCast, JsValue};

        let storage = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("localStorage"))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
            .ok_or_else(|| ApiError::Storage("localStorage is not available".to_owned()))?;
        let function = js_sys::Reflect::get(&storage, &JsValue::from_str(method))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| ApiError::Storage(format!("localStorage.{method} is not callable")))?;
        let args: js_sys::Array = args.iter().map(|arg| JsValue::from_str(arg)).collect();
        function
            .apply(&storage, &args)
            .map_err(|err| ApiError::Storage(format!("localStorage.{method} failed: {err:?}")))
    }
}

#[cfg(target_arch = "wasm32")]
impl TokenStorage for BrowserStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(Self::call("getItem", &[key])?.as_string())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        Self::call("setItem", &[key, value]).map(|_| ())
    }

    fn remove(&self, key: &str) -> Result<()> {
        Self::call("removeItem", &[key]).map(|_| ())
    }
}

/// Current authentication session, shared by every in-flight request.
///
/// Writes go through [`login`](Self::login), [`logout`](Self::logout) and
/// [`invalidate`](Self::invalidate) only. Clearing is idempotent: storage is
/// touched once, on the transition from a token to no token.
pub struct SessionStore {
    token: RwLock<Option<String>>,
    storage: Box<dyn TokenStorage>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authenticated = self.is_authenticated();
        f.debug_struct("SessionStore")
            .field("token", &authenticated.then_some("<redacted>"))
            .finish()
    }
}

impl SessionStore {
    /// Creates an empty session that is never persisted beyond this process.
    pub fn in_memory() -> Self {
        Self {
            token: RwLock::new(None),
            storage: Box::new(MemoryStorage::new()),
        }
    }

    /// Restores the session persisted in `storage`, if any.
    pub fn restore(storage: impl TokenStorage + 'static) -> Result<Self> {
        let token = storage
            .load(SESSION_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty());
        Ok(Self {
            token: RwLock::new(token),
            storage: Box::new(storage),
        })
    }

    /// Returns the current token, if any.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stores the token issued by a successful login.
    pub fn login(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "login token must not be empty".to_owned(),
            ));
        }
        self.storage.save(SESSION_TOKEN_KEY, &token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    /// Ends the session explicitly. Returns whether a token was cleared.
    pub fn logout(&self) -> Result<bool> {
        self.clear()
    }

    /// Ends the session after the backend rejected the credential.
    ///
    /// Returns whether a token was cleared; `false` when another request
    /// already invalidated it.
    pub fn invalidate(&self) -> Result<bool> {
        self.clear()
    }

    // Only the take is under the lock; storage I/O never blocks readers.
    fn clear(&self) -> Result<bool> {
        let previous = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_none() {
            return Ok(false);
        }
        self.storage.remove(SESSION_TOKEN_KEY)?;
        Ok(true)
    }
}
