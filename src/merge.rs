//! Merging freshly fetched batches into the feed.
//!
//! Articles are identified by `id` alone. New articles go to the front of the
//! feed, and both the new batch and the existing feed keep their relative
//! order.

use std::collections::HashSet;

use crate::article::Article;

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub articles: Vec<Article>,
    /// Number of incoming articles that made it into the feed.
    pub added: usize,
}

impl Merged {
    pub fn changed(&self) -> bool {
        self.added > 0
    }
}

/// Prepend the articles of `incoming` whose id is not yet in `existing`.
///
/// When nothing is new, `existing` is handed back untouched so callers can
/// skip the persistence write.
pub fn merge(existing: Vec<Article>, incoming: Vec<Article>) -> Merged {
    let fresh: Vec<usize> = {
        let mut seen: HashSet<&str> = existing.iter().map(|a| a.id.as_str()).collect();
        incoming
            .iter()
            .enumerate()
            .filter(|(_, article)| seen.insert(article.id.as_str()))
            .map(|(index, _)| index)
            .collect()
    };

    if fresh.is_empty() {
        return Merged {
            articles: existing,
            added: 0,
        };
    }

    let added = fresh.len();
    let mut fresh = fresh.into_iter().peekable();
    let mut articles = Vec::with_capacity(added + existing.len());
    for (index, article) in incoming.into_iter().enumerate() {
        if fresh.peek() == Some(&index) {
            fresh.next();
            articles.push(article);
        }
    }
    articles.extend(existing);

    Merged { articles, added }
}
