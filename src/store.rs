use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{debug, warn};

use crate::article::Article;

const ARTICLES_KEY: &str = "news_data";
const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => anyhow::bail!("unknown theme: {}", other),
        }
    }
}

/// Durable key-value storage backed by SQLite.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Read the persisted feed. A stored value that no longer parses is
    /// treated as absent.
    pub async fn load(&self) -> anyhow::Result<Option<Vec<Article>>> {
        let Some(raw) = self.get(ARTICLES_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(articles) => Ok(Some(articles)),
            Err(e) => {
                warn!("Ignoring unreadable persisted feed: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist the feed. An empty feed is never written so a transient empty
    /// state cannot wipe an earlier save.
    pub async fn save(&self, articles: &[Article]) -> anyhow::Result<()> {
        if articles.is_empty() {
            debug!("Skipping save of empty feed");
            return Ok(());
        }

        let json = serde_json::to_string(articles)?;
        self.set(ARTICLES_KEY, &json).await
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(ARTICLES_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn load_theme(&self) -> anyhow::Result<Theme> {
        let theme = match self.get(THEME_KEY).await?.as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        };
        Ok(theme)
    }

    pub async fn save_theme(&self, theme: Theme) -> anyhow::Result<()> {
        self.set(THEME_KEY, theme.as_str()).await
    }
}
