//! # Sessions
//!
//! `push session/login` hands out a session id to use as the bearer token;
//! `push session/logout` revokes it. Any credentials that satisfy the
//! contract are accepted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use switchyard_core::{
    Contract, HandlerError, HandlerResult, Request, Response, Router, Status, StringField,
};
use tracing::info;
use uuid::Uuid;

/// Open sessions keyed by session id
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    fn open(&self, username: String) -> Result<String, HandlerError> {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .map_err(|_| "session store lock poisoned")?
            .insert(session_id.clone(), username);
        Ok(session_id)
    }

    fn close(&self, session_id: &str) -> Result<Option<String>, HandlerError> {
        Ok(self
            .sessions
            .write()
            .map_err(|_| "session store lock poisoned")?
            .remove(session_id))
    }
}

/// Credentials schema for `session/login`
pub fn login_contract() -> Contract {
    Contract::new()
        .with(StringField::new("username").required().length(1, 128))
        .with(StringField::new("password").required().length(8, 128))
}

/// Register the session routes
pub fn register(router: &mut Router, store: &SessionStore) {
    let s = store.clone();
    router.public_push(
        "session/login",
        move |req, res| login(&s, req, res),
        Some(login_contract()),
    );

    let s = store.clone();
    router.private_push("session/logout", move |req, res| logout(&s, req, res), None);
}

fn login(store: &SessionStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let username = request.payload.get_string("username", "");
    info!(request_id = %request.id, user = %username, "Opening session");

    let session_id = store.open(username)?;
    response.payload.set("sessionId", session_id);
    Ok(())
}

fn logout(store: &SessionStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let token = request.token().unwrap_or_default();
    match store.close(&token)? {
        Some(username) => info!(request_id = %request.id, user = %username, "Session closed"),
        None => response.status = Status::NotAuthorized,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{Dispatcher, RequestKind, ValueMap};

    fn dispatcher(store: &SessionStore) -> Dispatcher {
        let mut router = Router::new();
        register(&mut router, store);
        router.seal()
    }

    fn send(dispatcher: &Dispatcher, request: Request) -> Response {
        let mut request = request;
        let mut response = Response::for_request(&request);
        dispatcher.handle(&mut request, &mut response).unwrap();
        response
    }

    fn login_request(username: &str, password: &str) -> Request {
        let mut payload = ValueMap::new();
        payload.set("username", username).set("password", password);
        Request::new()
            .with_kind(RequestKind::Push)
            .with_path("/session/login")
            .with_payload(payload)
    }

    #[test]
    fn test_login_then_logout() {
        let dispatcher = dispatcher(&SessionStore::default());

        let response = send(&dispatcher, login_request("ann", "correct horse"));
        assert_eq!(response.status, Status::Ok);
        let session_id = response.payload.get_string("sessionId", "");
        assert_eq!(session_id.len(), 32);

        let logout = Request::new()
            .with_kind(RequestKind::Push)
            .with_path("/session/logout")
            .with_token(session_id.as_str());
        assert_eq!(send(&dispatcher, logout.clone()).status, Status::Ok);
        assert_eq!(send(&dispatcher, logout).status, Status::NotAuthorized);
    }

    #[test]
    fn test_login_rejects_short_password() {
        let response = send(&dispatcher(&SessionStore::default()), login_request("ann", "short"));
        assert_eq!(response.status, Status::InvalidData);
        assert!(!response.payload.has("sessionId"));
    }

    #[test]
    fn test_logout_without_token() {
        let request = Request::new()
            .with_kind(RequestKind::Push)
            .with_path("/session/logout");
        let response = send(&dispatcher(&SessionStore::default()), request);
        assert_eq!(response.status, Status::AuthenticationRequired);
    }
}
