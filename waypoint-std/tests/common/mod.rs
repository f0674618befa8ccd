#![allow(dead_code)]

use std::sync::Arc;
use waypoint_std::{
    CompileOptions, FrameTicker, Matcher, MemoryHistory, RouteConfig, TransitionEngine,
    testing::CallLog,
    waypoint_core::RecordId,
};

/// An engine wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub engine: TransitionEngine,
    pub history: MemoryHistory,
    pub ticker: FrameTicker,
    pub log: CallLog,
}

impl Harness {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self::with_history(routes, MemoryHistory::new())
    }

    pub fn with_history(routes: Vec<RouteConfig>, history: MemoryHistory) -> Self {
        let matcher = Matcher::from_routes(&routes, CompileOptions::default()).unwrap();
        let ticker = FrameTicker::new();
        let engine = TransitionEngine::new(
            Arc::new(matcher),
            Arc::new(history.clone()),
            Arc::new(ticker.clone()),
        );
        Self {
            engine,
            history,
            ticker,
            log: CallLog::new(),
        }
    }

    pub fn record_id(&self, path: &str) -> RecordId {
        self.engine
            .matcher()
            .with_table(|table| table.by_path(path).unwrap().id)
    }

    pub fn current_path(&self) -> String {
        self.engine.current().full_path().to_string()
    }
}
