use crate::model::comment::Comment;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Per-report comment lists, loaded lazily when a report's details open.
/// Least recently opened threads are evicted past `capacity`.
pub struct CommentThreads {
    threads: LruCache<String, Vec<Comment>>,
}

impl CommentThreads {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            threads: LruCache::new(capacity),
        }
    }

    pub fn get(&self, report_id: &str) -> Option<&[Comment]> {
        self.threads.peek(report_id).map(Vec::as_slice)
    }

    pub fn replace(&mut self, report_id: &str, comments: Vec<Comment>) {
        self.threads.put(report_id.to_string(), comments);
    }

    /// Append to the comment's thread, opening the thread if needed
    pub fn push(&mut self, comment: Comment) {
        match self.threads.get_mut(&comment.report_id) {
            Some(thread) => thread.push(comment),
            None => {
                self.threads.put(comment.report_id.clone(), vec![comment]);
            }
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let stale: Vec<String> = self
            .threads
            .iter()
            .filter(|(id, _)| !keep(id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in stale {
            self.threads.pop(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
