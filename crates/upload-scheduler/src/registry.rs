//! Per-user ordered upload queues.

use crate::completion::{self, Awaiting, Completion};
use std::collections::{HashMap, VecDeque};
use tokio::time::Instant;

/// A pending or active transfer, identified by `(username, filename)`.
///
/// Duplicate `(username, filename)` pairs are permitted — they are distinct
/// queue entries, each tracked and released independently, so a retried
/// upload of the same file completes one attempt at a time.
pub struct Upload {
    /// Peer identity.
    pub username: String,
    /// Opaque filename, compared only for equality against engine calls.
    pub filename: String,
    /// Set at `Enqueue`.
    pub enqueued_at: Instant,
    /// Set the first time `AwaitStart` is called for this upload.
    pub ready_at: Option<Instant>,
    /// Set when the Admission Loop releases this upload.
    pub started_at: Option<Instant>,
    /// The group that donated the slot, set together with `started_at`.
    pub pinned_group: Option<String>,
    completion: Option<Completion>,
    awaiting: Option<Awaiting>,
}

impl Upload {
    fn new(username: String, filename: String, enqueued_at: Instant) -> Self {
        let (completion, awaiting) = completion::pair();
        Self {
            username,
            filename,
            enqueued_at,
            ready_at: None,
            started_at: None,
            pinned_group: None,
            completion: Some(completion),
            awaiting: Some(awaiting),
        }
    }

    /// Takes the `Awaiting` future for this upload. Called exactly once, by
    /// `AwaitStart`.
    ///
    /// # Panics
    ///
    /// Panics if called a second time for the same upload — a second
    /// `AwaitStart` on the same upload is a caller error.
    pub(crate) fn claim_awaiting(&mut self) -> Awaiting {
        self.awaiting
            .take()
            .expect("AwaitStart called twice for the same upload")
    }

    /// `true` iff `ready_at` is set and `started_at` is not — i.e. this
    /// upload is eligible for release by the Admission Loop.
    pub fn is_ready(&self) -> bool {
        self.ready_at.is_some() && self.started_at.is_none()
    }

    /// Marks this upload as started under group `group_name`, returning the
    /// `Completion` handle so the caller can signal it outside the lock.
    ///
    /// # Panics
    ///
    /// Panics if called twice for the same upload — the Admission Loop
    /// never selects an upload that is already started, since each
    /// invocation releases at most one upload and a started upload is no
    /// longer "ready".
    pub(crate) fn start(&mut self, group_name: &str, now: Instant) -> Completion {
        assert!(
            self.started_at.is_none(),
            "admission loop selected an already-started upload"
        );
        self.started_at = Some(now);
        self.pinned_group = Some(group_name.to_string());
        self.completion
            .take()
            .expect("completion signaled before upload started")
    }
}

/// Holds every pending/active upload, grouped by username in enqueue order.
///
/// This is a plain struct with no locking or atomics of its own — the
/// surrounding `tokio::sync::Mutex<SchedulerState>` is the only
/// synchronization boundary.
#[derive(Default)]
pub struct Registry {
    uploads: HashMap<String, VecDeque<Upload>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new upload to `username`'s list, creating the list on
    /// demand. Enqueuing never returns a value; the `Awaiting` future is
    /// produced now and stored on the `Upload` until `AwaitStart` claims it
    /// with `Upload::claim_awaiting`.
    pub fn add(&mut self, username: &str, filename: &str, now: Instant) {
        let upload = Upload::new(username.to_string(), filename.to_string(), now);
        self.uploads
            .entry(username.to_string())
            .or_default()
            .push_back(upload);
    }

    /// Returns the first matching upload in enqueue order, if any.
    pub fn find(&self, username: &str, filename: &str) -> Option<&Upload> {
        self.uploads
            .get(username)
            .and_then(|list| list.iter().find(|u| u.filename == filename))
    }

    /// Returns the first matching upload in enqueue order, if any.
    pub fn find_mut(&mut self, username: &str, filename: &str) -> Option<&mut Upload> {
        self.uploads
            .get_mut(username)
            .and_then(|list| list.iter_mut().find(|u| u.filename == filename))
    }

    /// Removes the first matching upload, purging the user's entry if the
    /// list becomes empty.
    pub fn remove(&mut self, username: &str, filename: &str) -> Option<Upload> {
        let list = self.uploads.get_mut(username)?;
        let index = list.iter().position(|u| u.filename == filename)?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.uploads.remove(username);
        }
        removed
    }

    /// Iterates every ready-but-not-started upload, together with its
    /// owning username, across all users. Used by the Admission Loop to
    /// build the transient ready-by-group view on each invocation.
    pub fn ready_uploads(&self) -> impl Iterator<Item = (&str, &Upload)> {
        self.uploads
            .iter()
            .flat_map(|(username, list)| list.iter().map(move |u| (username.as_str(), u)))
            .filter(|(_, u)| u.is_ready())
    }

    /// All uploads belonging to `username`, in enqueue order.
    pub fn uploads_for_user(&self, username: &str) -> impl Iterator<Item = &Upload> {
        self.uploads.get(username).into_iter().flatten()
    }

    /// All `(username, upload)` pairs across every user, in no particular
    /// cross-user order (callers that need a specific order sort the
    /// result themselves — see `crate::scheduler::estimate_position`).
    pub fn all_uploads(&self) -> impl Iterator<Item = (&str, &Upload)> {
        self.uploads
            .iter()
            .flat_map(|(username, list)| list.iter().map(move |u| (username.as_str(), u)))
    }

    /// Total number of uploads tracked for `username`.
    pub fn user_queue_len(&self, username: &str) -> usize {
        self.uploads.get(username).map_or(0, VecDeque::len)
    }
}
