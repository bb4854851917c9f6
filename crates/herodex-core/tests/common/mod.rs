//! Scripted remote source shared by the store tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herodex_core::{ApiError, Config, Hero, HeroCache, HeroSource, HeroStore, HeroesPage};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListPaginated(u32, u32),
    ListByNames(Vec<String>),
    GetById(i64),
    GetByName(String),
    Search(String),
    Create(Hero),
    Update(Hero),
    Delete(i64),
}

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// Remote source that answers from per-operation queues and records every call.
/// An empty queue answers with a server error.
#[derive(Default)]
pub struct ScriptedSource {
    calls: Mutex<Vec<Call>>,
    pages: Queue<HeroesPage>,
    heroes: Queue<Hero>,
    searches: Queue<Vec<Hero>>,
    deletes: Queue<()>,
    /// When set, the next list call waits for this before answering
    list_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

fn unscripted<T>() -> Result<T, ApiError> {
    Err(ApiError::ServerError("unscripted call".to_string()))
}

fn pop<T>(queue: &Queue<T>) -> Result<T, ApiError> {
    queue
        .lock()
        .expect("queue lock")
        .pop_front()
        .unwrap_or_else(unscripted)
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, page: Result<HeroesPage, ApiError>) {
        self.pages.lock().expect("lock").push_back(page);
    }

    pub fn push_hero(&self, hero: Result<Hero, ApiError>) {
        self.heroes.lock().expect("lock").push_back(hero);
    }

    pub fn push_search(&self, result: Result<Vec<Hero>, ApiError>) {
        self.searches.lock().expect("lock").push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), ApiError>) {
        self.deletes.lock().expect("lock").push_back(result);
    }

    pub fn gate_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.list_gate.lock().expect("lock") = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl HeroSource for ScriptedSource {
    async fn list_paginated(&self, page: u32, limit: u32) -> Result<HeroesPage, ApiError> {
        self.record(Call::ListPaginated(page, limit));
        let response = pop(&self.pages);
        let gate = self.list_gate.lock().expect("lock").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    async fn list_by_names(&self, names: &[String]) -> Result<HeroesPage, ApiError> {
        self.record(Call::ListByNames(names.to_vec()));
        pop(&self.pages)
    }

    async fn get_by_id(&self, id: i64) -> Result<Hero, ApiError> {
        self.record(Call::GetById(id));
        pop(&self.heroes)
    }

    async fn get_by_name(&self, name: &str) -> Result<Hero, ApiError> {
        self.record(Call::GetByName(name.to_string()));
        pop(&self.heroes)
    }

    async fn search(&self, query: &str) -> Result<Vec<Hero>, ApiError> {
        self.record(Call::Search(query.to_string()));
        pop(&self.searches)
    }

    async fn create(&self, hero: &Hero) -> Result<Hero, ApiError> {
        self.record(Call::Create(hero.clone()));
        pop(&self.heroes)
    }

    async fn update(&self, hero: &Hero) -> Result<Hero, ApiError> {
        self.record(Call::Update(hero.clone()));
        pop(&self.heroes)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.record(Call::Delete(id));
        pop(&self.deletes)
    }
}

pub fn hero(id: i64, name: &str) -> Hero {
    Hero::named(name).with_id(id)
}

pub fn heroes(count: i64) -> Vec<Hero> {
    (1..=count).map(|i| hero(i, &format!("Hero {}", i))).collect()
}

pub fn ids(items: &[Hero]) -> Vec<i64> {
    items.iter().filter_map(|h| h.id).collect()
}

pub fn server_error() -> ApiError {
    ApiError::ServerError("connection reset".to_string())
}

pub fn not_found() -> ApiError {
    ApiError::NotFound("Hero not found".to_string())
}

/// Store with default config over a scripted source and an in-memory cache.
pub fn store(source: &Arc<ScriptedSource>, cache: &HeroCache) -> HeroStore<Arc<ScriptedSource>> {
    HeroStore::new(Arc::clone(source), cache.clone(), &Config::default())
}
