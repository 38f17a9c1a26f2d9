/// Server-side session store
///
/// Sessions live in memory, keyed by an opaque v4 id. The browser only ever
/// holds that id, inside a cookie signed with a key derived from the
/// configured secret. OAuth tokens never leave the server.
use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha512};
use uuid::Uuid;

use crate::services::oauth::OAuthCredentials;

pub const SESSION_COOKIE_NAME: &str = "yt_session";

/// Lifetime of a session that has not finished the OAuth flow.
pub const PENDING_LOGIN_TTL_SECS: i64 = 10 * 60;

/// Upper bound accepted for `SESSION_TTL_SECS` (one year).
pub const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    /// CSRF state issued at login start, cleared by the callback.
    pub oauth_state: Option<String>,
    pub credentials: Option<OAuthCredentials>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    sessions: DashMap<Uuid, Session>,
    ttl: Duration,
    pending_ttl: Duration,
    key: Key,
    secure_cookie: bool,
}

impl SessionStore {
    pub fn new(secret: &str, ttl_secs: i64, secure_cookie: bool) -> Self {
        // SHA-512 yields exactly the 64 bytes a cookie Key needs
        let digest = Sha512::digest(secret.as_bytes());
        let ttl = Duration::seconds(ttl_secs.clamp(1, MAX_SESSION_TTL_SECS));
        Self {
            sessions: DashMap::new(),
            pending_ttl: ttl.min(Duration::seconds(PENDING_LOGIN_TTL_SECS)),
            ttl,
            key: Key::from(digest.as_slice()),
            secure_cookie,
        }
    }

    /// New anonymous session. It only lives long enough to finish a login.
    pub fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            oauth_state: None,
            credentials: None,
            display_name: None,
            created_at: now,
            expires_at: now + self.pending_ttl,
        };
        self.sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, "session created");
        session
    }

    /// Finish a login: the pending session is destroyed and the credentials
    /// move to a session under a new id with the full lifetime. Returns
    /// `None` when the pending session is gone or expired.
    pub fn sign_in(
        &self,
        pending_id: Uuid,
        credentials: OAuthCredentials,
        display_name: Option<String>,
    ) -> Option<Session> {
        let now = Utc::now();
        let (_, pending) = self.sessions.remove(&pending_id)?;
        if pending.is_expired_at(now) {
            return None;
        }

        let session = Session {
            id: Uuid::new_v4(),
            oauth_state: None,
            credentials: Some(credentials),
            display_name,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.insert(session.id, session.clone());
        tracing::debug!(previous = %pending_id, session_id = %session.id, "session id rotated on sign-in");
        Some(session)
    }

    /// Returns a snapshot; expired sessions are removed on sight.
    pub fn get(&self, id: Uuid) -> Option<Session> {
        let now = Utc::now();
        let expired = match self.sessions.get(&id) {
            Some(entry) if !entry.is_expired_at(now) => return Some(entry.value().clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(&id);
            tracing::debug!(session_id = %id, "session expired");
        }
        None
    }

    /// Mutate a live session in place and return the updated snapshot.
    pub fn update<F>(&self, id: Uuid, f: F) -> Option<Session>
    where
        F: FnOnce(&mut Session),
    {
        let now = Utc::now();
        let mut entry = self.sessions.get_mut(&id)?;
        if entry.is_expired_at(now) {
            drop(entry);
            self.sessions.remove(&id);
            return None;
        }
        f(entry.value_mut());
        Some(entry.value().clone())
    }

    pub fn destroy(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "session destroyed");
        }
        removed
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Signed cookie carrying the session id.
    pub fn session_cookie(&self, id: Uuid) -> Cookie<'static> {
        let cookie = Cookie::build(SESSION_COOKIE_NAME, id.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(actix_web::cookie::time::Duration::seconds(
                self.ttl.num_seconds(),
            ))
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(SESSION_COOKIE_NAME)
            .cloned()
            .unwrap_or_else(|| Cookie::named(SESSION_COOKIE_NAME))
    }

    /// Cookie that tells the browser to forget the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE_NAME, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Session id from a correctly signed cookie, if any.
    pub fn session_id_from_request(&self, req: &HttpRequest) -> Option<Uuid> {
        let raw = req.cookie(SESSION_COOKIE_NAME)?;
        let mut jar = CookieJar::new();
        jar.add_original(raw);
        let verified = jar.signed(&self.key).get(SESSION_COOKIE_NAME)?;
        Uuid::parse_str(verified.value()).ok()
    }

    pub fn load_from_request(&self, req: &HttpRequest) -> Option<Session> {
        self.session_id_from_request(req).and_then(|id| self.get(id))
    }

    /// Existing session for this request, or a fresh one.
    pub fn load_or_create(&self, req: &HttpRequest) -> Session {
        self.load_from_request(req).unwrap_or_else(|| self.create())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn store() -> SessionStore {
        SessionStore::new("test-secret", 3600, false)
    }

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            access_token: "ya29.token".into(),
            refresh_token: Some("1//refresh".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            scopes: vec![],
            expires_at: None,
        }
    }

    #[test]
    fn signed_cookie_round_trips_through_request() {
        let store = store();
        let session = store.create();
        let cookie = store.session_cookie(session.id);
        assert_ne!(cookie.value(), session.id.to_string());

        let req = TestRequest::default().cookie(cookie).to_http_request();
        let loaded = store.load_from_request(&req).expect("session");
        assert_eq!(loaded.id, session.id);
        assert!(!loaded.is_authenticated());
    }

    #[test]
    fn unsigned_or_foreign_cookies_are_rejected() {
        let store = store();
        let session = store.create();

        let forged = Cookie::new(SESSION_COOKIE_NAME, session.id.to_string());
        let req = TestRequest::default().cookie(forged).to_http_request();
        assert!(store.session_id_from_request(&req).is_none());

        let other = SessionStore::new("another-secret", 3600, false);
        let foreign = other.session_cookie(session.id);
        let req = TestRequest::default().cookie(foreign).to_http_request();
        assert!(store.session_id_from_request(&req).is_none());
    }

    #[test]
    fn update_and_destroy() {
        let store = store();
        let session = store.create();

        let updated = store
            .update(session.id, |s| s.display_name = Some("Kanal".into()))
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Kanal"));
        assert_eq!(
            store.get(session.id).unwrap().display_name.as_deref(),
            Some("Kanal")
        );

        assert!(store.destroy(session.id));
        assert!(store.get(session.id).is_none());
        assert!(store.update(session.id, |_| {}).is_none());
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = store();
        let session = store.create();
        store.update(session.id, |s| s.expires_at = Utc::now() - Duration::seconds(1));

        let live = store.create();
        assert_eq!(store.purge_expired(), 1);
        assert!(store.get(session.id).is_none());
        assert!(store.get(live.id).is_some());
    }

    #[test]
    fn anonymous_sessions_get_the_short_lifetime() {
        let store = store();
        let session = store.create();
        let lifetime = session.expires_at - session.created_at;
        assert_eq!(lifetime, Duration::seconds(PENDING_LOGIN_TTL_SECS));

        // Never longer than the configured TTL
        let short = SessionStore::new("test-secret", 60, false);
        let session = short.create();
        assert_eq!(session.expires_at - session.created_at, Duration::seconds(60));
    }

    #[test]
    fn sign_in_rotates_the_session_id() {
        let store = store();
        let pending = store.create();
        store.update(pending.id, |s| s.oauth_state = Some("state".into()));

        let session = store
            .sign_in(pending.id, credentials(), Some("Kanal".into()))
            .expect("signed in");

        assert_ne!(session.id, pending.id);
        assert!(session.is_authenticated());
        assert!(session.oauth_state.is_none());
        assert_eq!(session.expires_at - session.created_at, Duration::seconds(3600));
        assert!(store.get(pending.id).is_none());
        assert_eq!(store.len(), 1);

        // The pending id cannot be promoted twice
        assert!(store.sign_in(pending.id, credentials(), None).is_none());
    }

    #[test]
    fn expired_pending_session_cannot_sign_in() {
        let store = store();
        let pending = store.create();
        store.update(pending.id, |s| s.expires_at = Utc::now() - Duration::seconds(1));

        assert!(store.sign_in(pending.id, credentials(), None).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let store = SessionStore::new("test-secret", i64::MAX, false);
        assert_eq!(store.ttl, Duration::seconds(MAX_SESSION_TTL_SECS));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = store().removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(
            cookie.max_age(),
            Some(actix_web::cookie::time::Duration::ZERO)
        );
    }
}
