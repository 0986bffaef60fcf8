use std::{
    fs::{self, File},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "Tubular";
const SESSION_FILENAME: &str = "session.json";

/// Server-issued identity of the logged-in user, including the bearer token
/// attached to every library request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(rename = "_id")]
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub email: Arc<str>,
    pub token: Arc<str>,
}

/// Cheap to clone, shareable handle that holds the active user session.  The
/// session persists across runs in the platform config directory and is
/// removed from disk again on logout.
#[derive(Clone)]
pub struct SessionService {
    current: Arc<Mutex<Option<UserSession>>>,
    storage_dir: Option<PathBuf>,
}

impl SessionService {
    /// Create a service backed by the platform config directory, restoring
    /// any session persisted by a previous run.
    pub fn new() -> Self {
        Self::with_storage(Self::default_storage_dir())
    }

    /// Create a service persisting into `storage_dir`.  `None` keeps the
    /// session in memory only.
    pub fn with_storage(storage_dir: Option<PathBuf>) -> Self {
        let this = Self {
            current: Arc::default(),
            storage_dir,
        };
        if let Some(session) = this.load_from_disk() {
            this.current.lock().replace(session);
        }
        this
    }

    pub fn is_connected(&self) -> bool {
        self.current.lock().is_some()
    }

    pub fn user(&self) -> Option<UserSession> {
        self.current.lock().clone()
    }

    pub fn token(&self) -> Option<Arc<str>> {
        self.current.lock().as_ref().map(|user| user.token.clone())
    }

    /// Attach a freshly authenticated user and persist it.
    pub fn attach(&self, session: UserSession) {
        self.save_to_disk(&session);
        self.current.lock().replace(session);
    }

    /// Drop the active session and its persisted copy.
    pub fn clear(&self) {
        self.current.lock().take();
        if let Some(path) = self.session_path() {
            let _ = fs::remove_file(path);
        }
    }

    fn default_storage_dir() -> Option<PathBuf> {
        const USE_XDG_ON_MACOS: bool = false;

        AppDirs::new(Some(APP_NAME), USE_XDG_ON_MACOS).map(|dirs| dirs.config_dir)
    }

    fn session_path(&self) -> Option<PathBuf> {
        self.storage_dir
            .as_ref()
            .map(|dir| dir.join(SESSION_FILENAME))
    }

    fn load_from_disk(&self) -> Option<UserSession> {
        let path = self.session_path()?;
        let file = File::open(&path).ok()?;
        log::info!("restoring session: {:?}", &path);
        match serde_json::from_reader(file) {
            Ok(session) => Some(session),
            Err(err) => {
                log::error!("failed to read persisted session: {:?}", err);
                None
            }
        }
    }

    fn save_to_disk(&self, session: &UserSession) {
        let Some(dir) = self.storage_dir.as_ref() else {
            return;
        };
        fs::create_dir_all(dir).expect("Failed to create session dir");
        let file = File::create(dir.join(SESSION_FILENAME)).expect("Failed to create session file");
        serde_json::to_writer_pretty(file, session).expect("Failed to write session");
    }
}

impl Default for SessionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserSession {
        UserSession {
            id: "u1".into(),
            name: "Ales".into(),
            email: "ales@example.com".into(),
            token: "secret-token".into(),
        }
    }

    #[test]
    fn attach_exposes_token() {
        let service = SessionService::with_storage(None);
        assert!(!service.is_connected());
        assert_eq!(service.token(), None);

        service.attach(user());
        assert!(service.is_connected());
        assert_eq!(service.token().as_deref(), Some("secret-token"));

        service.clear();
        assert!(!service.is_connected());
        assert_eq!(service.token(), None);
    }

    #[test]
    fn session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let service = SessionService::with_storage(Some(dir.path().to_path_buf()));
        service.attach(user());

        let restored = SessionService::with_storage(Some(dir.path().to_path_buf()));
        assert_eq!(restored.user().unwrap().email.as_ref(), "ales@example.com");
    }

    #[test]
    fn logout_removes_persisted_session() {
        let dir = tempfile::tempdir().unwrap();

        let service = SessionService::with_storage(Some(dir.path().to_path_buf()));
        service.attach(user());
        service.clear();

        let restored = SessionService::with_storage(Some(dir.path().to_path_buf()));
        assert!(!restored.is_connected());
    }

    #[test]
    fn clone_shares_state() {
        let service = SessionService::with_storage(None);
        let handle = service.clone();
        service.attach(user());
        assert!(handle.is_connected());
    }
}
