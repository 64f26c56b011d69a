// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The key-value store contract and the in-process backend.
//!
//! The trait mirrors what the hub needs from a linearizable-per-key store:
//! plain strings, sets, sorted sets, counters-as-strings, and three atomic
//! multi-op commands that a networked backend would run as server-side
//! scripts in a single round trip. `MemoryStore` executes everything under
//! one mutex, which makes those commands trivially atomic; it backs tests
//! and single-process deployments.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::HubError;
use crate::state::epoch_ms;

/// Outcome of a sliding-window probe. A denied probe consumes no slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindowDecision {
    pub allowed: bool,
    pub remaining: u64,
}

/// A write operation for pipeline batching.
#[derive(Debug, Clone)]
pub enum KvOp {
    Set { key: String, value: String },
    Del { key: String },
    Expire { key: String, ttl: Duration },
    IncrBy { key: String, delta: i64 },
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
    ZAdd { key: String, member: String, score: u64 },
}

/// Async store contract. All operations are linearizable per key; the
/// `compare_*` and `sliding_window` commands are atomic across their
/// internal reads and writes.
#[async_trait]
pub trait Kv: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, HubError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), HubError>;
    async fn del(&self, key: &str) -> Result<bool, HubError>;
    async fn exists(&self, key: &str) -> Result<bool, HubError>;
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, HubError>;

    /// Set `key` to `value` only if absent, with a TTL. Returns whether the
    /// write happened.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, HubError>;

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, HubError>;

    async fn zadd(&self, key: &str, member: &str, score: u64) -> Result<(), HubError>;
    async fn zcard(&self, key: &str) -> Result<u64, HubError>;
    /// Inclusive index range over members ordered by (score, member);
    /// negative indexes count from the tail.
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, HubError>;
    async fn zrange_by_score(
        &self,
        key: &str,
        min: u64,
        max: u64,
        limit: usize,
    ) -> Result<Vec<String>, HubError>;
    async fn zremrange_by_score(&self, key: &str, max_inclusive: u64) -> Result<u64, HubError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, HubError>;
    async fn srem(&self, key: &str, member: &str) -> Result<bool, HubError>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, HubError>;
    async fn scard(&self, key: &str) -> Result<u64, HubError>;

    /// Delete `key` iff its current value equals `expected`.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, HubError>;
    /// Reset the TTL of `key` iff its current value equals `expected`.
    async fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> Result<bool, HubError>;

    /// One atomic sliding-window probe: drop entries scored at or before
    /// `window_start_ms`, then admit iff the remaining cardinality is under
    /// `budget`, recording the admission at `now_ms` and refreshing the TTL.
    async fn sliding_window(
        &self,
        key: &str,
        now_ms: u64,
        window_start_ms: u64,
        budget: u64,
        ttl: Duration,
    ) -> Result<SlidingWindowDecision, HubError>;

    /// Apply a batch of write ops atomically.
    async fn pipeline(&self, ops: Vec<KvOp>) -> Result<(), HubError>;
}

// -- In-memory backend --------------------------------------------------------

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(HashSet<String>),
    ZSet(HashMap<String, u64>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at_ms: Option<u64>,
}

#[derive(Default)]
struct Inner {
    map: HashMap<String, Entry>,
    /// Tie-breaker so same-millisecond window admissions stay distinct.
    window_seq: u64,
}

/// Single-process store: one mutex over the whole keyspace, lazy TTL expiry.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn wrong_kind(key: &str) -> HubError {
    HubError::Transient(format!("wrong value kind at key {key}"))
}

impl Inner {
    fn purge_expired(&mut self, key: &str, now_ms: u64) {
        if let Some(entry) = self.map.get(key) {
            if entry.expires_at_ms.is_some_and(|at| at <= now_ms) {
                self.map.remove(key);
            }
        }
    }

    fn live(&mut self, key: &str, now_ms: u64) -> Option<&mut Entry> {
        self.purge_expired(key, now_ms);
        self.map.get_mut(key)
    }

    fn str_value(&mut self, key: &str, now_ms: u64) -> Result<Option<String>, HubError> {
        match self.live(key, now_ms) {
            Some(Entry { value: Value::Str(s), .. }) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(None),
        }
    }

    fn set_entry(&mut self, key: &str, value: Value, expires_at_ms: Option<u64>) {
        self.map.insert(key.to_owned(), Entry { value, expires_at_ms });
    }

    fn set_members(&mut self, key: &str, now_ms: u64) -> Result<&mut HashSet<String>, HubError> {
        self.purge_expired(key, now_ms);
        let entry = self
            .map
            .entry(key.to_owned())
            .or_insert_with(|| Entry { value: Value::Set(HashSet::new()), expires_at_ms: None });
        match &mut entry.value {
            Value::Set(members) => Ok(members),
            _ => Err(wrong_kind(key)),
        }
    }

    fn zset_members(&mut self, key: &str, now_ms: u64) -> Result<&mut HashMap<String, u64>, HubError> {
        self.purge_expired(key, now_ms);
        let entry = self
            .map
            .entry(key.to_owned())
            .or_insert_with(|| Entry { value: Value::ZSet(HashMap::new()), expires_at_ms: None });
        match &mut entry.value {
            Value::ZSet(members) => Ok(members),
            _ => Err(wrong_kind(key)),
        }
    }

    /// Members ordered by (score, member).
    fn zset_sorted(&mut self, key: &str, now_ms: u64) -> Result<Vec<(String, u64)>, HubError> {
        let sorted = match self.live(key, now_ms) {
            Some(Entry { value: Value::ZSet(members), .. }) => {
                let mut pairs: Vec<(String, u64)> =
                    members.iter().map(|(m, s)| (m.clone(), *s)).collect();
                pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                pairs
            }
            Some(_) => return Err(wrong_kind(key)),
            None => Vec::new(),
        };
        Ok(sorted)
    }

    fn incr_by(&mut self, key: &str, delta: i64, now_ms: u64) -> Result<i64, HubError> {
        let current = match self.str_value(key, now_ms)? {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| HubError::Transient(format!("non-numeric counter at key {key}")))?,
            None => 0,
        };
        let next = current + delta;
        let expires = self.live(key, now_ms).and_then(|e| e.expires_at_ms);
        self.set_entry(key, Value::Str(next.to_string()), expires);
        Ok(next)
    }

    fn apply(&mut self, op: KvOp, now_ms: u64) -> Result<(), HubError> {
        match op {
            KvOp::Set { key, value } => {
                self.set_entry(&key, Value::Str(value), None);
                Ok(())
            }
            KvOp::Del { key } => {
                self.map.remove(&key);
                Ok(())
            }
            KvOp::Expire { key, ttl } => {
                if let Some(entry) = self.live(&key, now_ms) {
                    entry.expires_at_ms = Some(now_ms + ttl.as_millis() as u64);
                }
                Ok(())
            }
            KvOp::IncrBy { key, delta } => self.incr_by(&key, delta, now_ms).map(|_| ()),
            KvOp::SAdd { key, member } => {
                self.set_members(&key, now_ms)?.insert(member);
                Ok(())
            }
            KvOp::SRem { key, member } => {
                if let Some(Entry { value: Value::Set(members), .. }) = self.live(&key, now_ms) {
                    members.remove(&member);
                }
                Ok(())
            }
            KvOp::ZAdd { key, member, score } => {
                self.zset_members(&key, now_ms)?.insert(member, score);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Kv for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, HubError> {
        self.inner.lock().str_value(key, epoch_ms())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), HubError> {
        self.inner.lock().set_entry(key, Value::Str(value.to_owned()), None);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, HubError> {
        let mut inner = self.inner.lock();
        inner.purge_expired(key, epoch_ms());
        Ok(inner.map.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, HubError> {
        Ok(self.inner.lock().live(key, epoch_ms()).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        match inner.live(key, now_ms) {
            Some(entry) => {
                entry.expires_at_ms = Some(now_ms + ttl.as_millis() as u64);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        if inner.live(key, now_ms).is_some() {
            return Ok(false);
        }
        inner.set_entry(
            key,
            Value::Str(value.to_owned()),
            Some(now_ms + ttl.as_millis() as u64),
        );
        Ok(true)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, HubError> {
        self.inner.lock().incr_by(key, delta, epoch_ms())
    }

    async fn zadd(&self, key: &str, member: &str, score: u64) -> Result<(), HubError> {
        self.inner.lock().zset_members(key, epoch_ms())?.insert(member.to_owned(), score);
        Ok(())
    }

    async fn zcard(&self, key: &str) -> Result<u64, HubError> {
        match self.inner.lock().live(key, epoch_ms()) {
            Some(Entry { value: Value::ZSet(members), .. }) => Ok(members.len() as u64),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(0),
        }
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, HubError> {
        let sorted = self.inner.lock().zset_sorted(key, epoch_ms())?;
        let len = sorted.len() as i64;
        let norm = |i: i64| -> i64 {
            if i < 0 {
                (len + i).max(0)
            } else {
                i.min(len)
            }
        };
        let (from, to) = (norm(start), norm(stop));
        if from > to || len == 0 {
            return Ok(Vec::new());
        }
        let to = to.min(len - 1);
        Ok(sorted[from as usize..=to as usize].iter().map(|(m, _)| m.clone()).collect())
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: u64,
        max: u64,
        limit: usize,
    ) -> Result<Vec<String>, HubError> {
        let sorted = self.inner.lock().zset_sorted(key, epoch_ms())?;
        Ok(sorted
            .into_iter()
            .filter(|(_, score)| *score >= min && *score <= max)
            .take(limit)
            .map(|(member, _)| member)
            .collect())
    }

    async fn zremrange_by_score(&self, key: &str, max_inclusive: u64) -> Result<u64, HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        match inner.live(key, now_ms) {
            Some(Entry { value: Value::ZSet(members), .. }) => {
                let before = members.len();
                members.retain(|_, score| *score > max_inclusive);
                Ok((before - members.len()) as u64)
            }
            Some(_) => Err(wrong_kind(key)),
            None => Ok(0),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, HubError> {
        Ok(self.inner.lock().set_members(key, epoch_ms())?.insert(member.to_owned()))
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, HubError> {
        match self.inner.lock().live(key, epoch_ms()) {
            Some(Entry { value: Value::Set(members), .. }) => Ok(members.remove(member)),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(false),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, HubError> {
        match self.inner.lock().live(key, epoch_ms()) {
            Some(Entry { value: Value::Set(members), .. }) => {
                let mut out: Vec<String> = members.iter().cloned().collect();
                out.sort();
                Ok(out)
            }
            Some(_) => Err(wrong_kind(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn scard(&self, key: &str) -> Result<u64, HubError> {
        match self.inner.lock().live(key, epoch_ms()) {
            Some(Entry { value: Value::Set(members), .. }) => Ok(members.len() as u64),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(0),
        }
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        match inner.str_value(key, now_ms)? {
            Some(current) if current == expected => {
                inner.map.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_expire(
        &self,
        key: &str,
        expected: &str,
        ttl: Duration,
    ) -> Result<bool, HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        match inner.str_value(key, now_ms)? {
            Some(current) if current == expected => {
                if let Some(entry) = inner.live(key, now_ms) {
                    entry.expires_at_ms = Some(now_ms + ttl.as_millis() as u64);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sliding_window(
        &self,
        key: &str,
        now_ms: u64,
        window_start_ms: u64,
        budget: u64,
        ttl: Duration,
    ) -> Result<SlidingWindowDecision, HubError> {
        let mut inner = self.inner.lock();
        let seq = {
            inner.window_seq += 1;
            inner.window_seq
        };
        let members = inner.zset_members(key, now_ms)?;
        members.retain(|_, score| *score > window_start_ms);
        let count = members.len() as u64;

        if count >= budget {
            return Ok(SlidingWindowDecision { allowed: false, remaining: 0 });
        }

        // Unique member per admission so same-millisecond arrivals all count.
        members.insert(format!("{now_ms}:{seq}"), now_ms);
        if let Some(entry) = inner.live(key, now_ms) {
            entry.expires_at_ms = Some(now_ms + ttl.as_millis() as u64);
        }
        Ok(SlidingWindowDecision { allowed: true, remaining: budget - count - 1 })
    }

    async fn pipeline(&self, ops: Vec<KvOp>) -> Result<(), HubError> {
        let now_ms = epoch_ms();
        let mut inner = self.inner.lock();
        for op in ops {
            inner.apply(op, now_ms)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
