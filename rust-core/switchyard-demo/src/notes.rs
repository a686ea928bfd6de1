//! # Notes Resource
//!
//! In-memory CRUD over `/notes`:
//!
//! - `pull  /notes`      list every note
//! - `pull  /notes/:id`  fetch one note
//! - `push  /notes`      create a note, answers `ResourceCreated` with its id
//! - `update /notes/:id` rename or rewrite a note
//! - `delete /notes/:id` remove a note (bearer token required)

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use switchyard_core::{
    Contract, HandlerError, HandlerResult, Record, RecordField, Request, Response, Router, Status,
    StringField, Value, ValueMap,
};
use tracing::debug;
use uuid::Uuid;

/// A stored note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub name: String,
    pub contents: String,
}

impl Record for Note {
    fn fields() -> Vec<RecordField<Self>> {
        vec![
            RecordField::<Self>::string("id", |n| n.id.clone(), |n, v| n.id = v),
            RecordField::<Self>::string("name", |n| n.name.clone(), |n, v| n.name = v),
            RecordField::<Self>::string("contents", |n| n.contents.clone(), |n, v| n.contents = v),
        ]
    }
}

impl Note {
    fn to_value_map(&self) -> ValueMap {
        let mut map = ValueMap::new();
        map.from_record(self);
        map
    }
}

/// Shared note storage, ordered by id
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Arc<RwLock<BTreeMap<String, Note>>>,
}

impl NoteStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Note>>, HandlerError> {
        self.notes.read().map_err(|_| "note store lock poisoned".into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Note>>, HandlerError> {
        self.notes.write().map_err(|_| "note store lock poisoned".into())
    }
}

/// Payload schema shared by create and update
pub fn note_contract() -> Contract {
    Contract::new()
        .with(StringField::new("name").required().length(3, 32))
        .with(StringField::new("contents").optional().length(1, 100))
}

/// Register the notes routes
pub fn register(router: &mut Router, store: &NoteStore) {
    let s = store.clone();
    router.public_pull("notes", move |req, res| list(&s, req, res), None);

    let s = store.clone();
    router.public_pull("notes/:id", move |req, res| fetch(&s, req, res), None);

    let s = store.clone();
    router.public_push(
        "notes",
        move |req, res| create(&s, req, res),
        Some(note_contract()),
    );

    let s = store.clone();
    router.public_update(
        "notes/:id",
        move |req, res| update(&s, req, res),
        Some(note_contract()),
    );

    let s = store.clone();
    router.private_delete("notes/:id", move |req, res| remove(&s, req, res), None);
}

fn list(store: &NoteStore, _: &mut Request, response: &mut Response) -> HandlerResult {
    let notes: Vec<Value> = store
        .read()?
        .values()
        .map(|note| Value::from(note.to_value_map()))
        .collect();
    response.payload.set("notes", notes);
    Ok(())
}

fn fetch(store: &NoteStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let id = request.route_data.get_string("id", "");
    match store.read()?.get(&id) {
        Some(note) => {
            response.payload.from_record(note);
        }
        None => response.status = Status::ResourceNotFound,
    }
    Ok(())
}

fn create(store: &NoteStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let mut note = Note::default();
    request.payload.to_record(&mut note);
    note.id = Uuid::new_v4().simple().to_string();

    debug!(request_id = %request.id, note = %note.id, "Creating note");
    response.payload.set("id", note.id.as_str());
    store.write()?.insert(note.id.clone(), note);
    response.status = Status::ResourceCreated;
    Ok(())
}

fn update(store: &NoteStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let id = request.route_data.get_string("id", "");
    let mut notes = store.write()?;
    let Some(note) = notes.get_mut(&id) else {
        response.status = Status::ResourceNotFound;
        return Ok(());
    };

    request.payload.to_record(note);
    note.id = id;
    response.payload.from_record(&*note);
    Ok(())
}

fn remove(store: &NoteStore, request: &mut Request, response: &mut Response) -> HandlerResult {
    let id = request.route_data.get_string("id", "");
    if store.write()?.remove(&id).is_none() {
        response.status = Status::ResourceNotFound;
    }
    Ok(())
}
