//! Question history for one REPL session
//!
//! Each question is answered from scratch; the history is only shown back to
//! the user and never fed into a prompt.

use crate::types::execution::AgentRun;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Maximum number of questions kept in history
const MAX_HISTORY_SIZE: usize = 1000;

/// Record of an answered (or exhausted) question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub answer: Option<String>,
    pub iterations: usize,
    pub duration_ms: u64,
    pub asked_at: DateTime<Utc>,
}

impl From<&AgentRun> for QuestionRecord {
    fn from(run: &AgentRun) -> Self {
        QuestionRecord {
            question: run.question.clone(),
            answer: run.final_answer().map(str::to_string),
            iterations: run.iterations,
            duration_ms: run.duration.as_millis() as u64,
            asked_at: run.started_at,
        }
    }
}

/// Session history with a bounded FIFO of questions
pub struct SessionHistory {
    records: VecDeque<QuestionRecord>,
    started: Instant,
    total_asked: usize,
}

impl SessionHistory {
    pub fn new() -> Self {
        SessionHistory {
            records: VecDeque::new(),
            started: Instant::now(),
            total_asked: 0,
        }
    }

    /// Record a finished run, evicting the oldest entry at capacity
    pub fn record(&mut self, run: &AgentRun) {
        if self.records.len() >= MAX_HISTORY_SIZE {
            self.records.pop_front();
        }
        self.records.push_back(QuestionRecord::from(run));
        self.total_asked += 1;
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Vec<&QuestionRecord> {
        self.records.iter().rev().take(limit).collect()
    }

    pub fn answered_count(&self) -> usize {
        self.records.iter().filter(|r| r.answer.is_some()).count()
    }

    /// Questions asked this session, including evicted ones
    pub fn total_asked(&self) -> usize {
        self.total_asked
    }

    pub fn session_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
