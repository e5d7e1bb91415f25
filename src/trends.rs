use std::collections::HashMap;

use serde::Serialize;

use crate::article::Article;

pub const DEFAULT_TREND_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Most frequent keywords across `articles`, highest count first. Ties keep
/// the order in which the keywords were first seen.
pub fn top_keywords(articles: &[Article], limit: usize) -> Vec<KeywordCount> {
    let mut counts: Vec<KeywordCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for keyword in articles.iter().flat_map(|a| a.keywords.iter()) {
        match index.get(keyword.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(keyword.as_str(), counts.len());
                counts.push(KeywordCount {
                    keyword: keyword.clone(),
                    count: 1,
                });
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
