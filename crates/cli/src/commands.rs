//! Command handlers. Output goes to the supplied writer; logs go to stderr.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use hvsum_core::cache::{ContentStore, FileStore, NullStore};
use hvsum_core::session::{SessionRegistry, SessionSeed};
use hvsum_core::config::MAX_SEARCH_CONCURRENCY;
use hvsum_core::{AppConfig, SearchBatch, SearchOrchestrator, SearchProvider, format_search_results};

use crate::args::{CacheCommand, SearchArgs, SessionCommand};
use crate::error::CliError;

/// Everything a command needs, wired from the config.
#[derive(Debug)]
pub struct App {
    pub config: AppConfig,
    pub store: Arc<dyn ContentStore>,
    pub sessions: SessionRegistry,
}

impl App {
    /// Open the cache and session directories described by `config`.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn ContentStore> = if config.cache_enabled {
            let dir = config.cache_dir();
            let store = FileStore::open(&dir)
                .await
                .with_context(|| format!("opening cache directory {}", dir.display()))?;
            Arc::new(store.with_pending_grace(config.pending_grace()))
        } else {
            tracing::debug!("cache disabled");
            Arc::new(NullStore)
        };

        let dir = config.sessions_dir();
        let sessions = SessionRegistry::open(&dir)
            .await
            .with_context(|| format!("opening sessions directory {}", dir.display()))?;

        Ok(Self { config, store, sessions })
    }

    /// Startup housekeeping. Failures are logged, never fatal.
    pub async fn sweep_on_startup(&self) {
        match self.store.sweep_expired().await {
            Ok(0) => {}
            Ok(cleaned) => tracing::info!(cleaned, "removed expired cache entries"),
            Err(e) => tracing::warn!(error = %e, "cache sweep failed"),
        }
    }

    fn require_sessions(&self) -> Result<(), CliError> {
        if self.config.session_persist { Ok(()) } else { Err(CliError::SessionsDisabled) }
    }

    pub async fn search(
        &self, provider: Arc<dyn SearchProvider>, args: &SearchArgs, out: &mut impl Write,
    ) -> Result<()> {
        if let Some(id) = &args.session {
            self.require_sessions()?;
            if !self.sessions.exists(id).await {
                return Err(CliError::UnknownSession(id.clone()).into());
            }
        }

        let mut batch = SearchBatch::new(args.queries.iter().cloned())
            .limit_per_query(args.limit.unwrap_or(self.config.results_per_query))
            .max_results(args.max_results.unwrap_or(self.config.max_search_results))
            .concurrency(args.concurrency.unwrap_or(self.config.search_concurrency));
        if let Some(id) = &args.session {
            batch = batch.session(id.clone());
        }

        if batch.limit_per_query == 0 || batch.max_results == 0 {
            return Err(CliError::InvalidArgument("result limits must be greater than 0".into()).into());
        }
        if !(1..=MAX_SEARCH_CONCURRENCY).contains(&batch.concurrency) {
            return Err(CliError::InvalidArgument(format!(
                "concurrency must be between 1 and {MAX_SEARCH_CONCURRENCY}"
            ))
            .into());
        }

        let orchestrator = SearchOrchestrator::new(provider, self.store.clone(), self.config.cache_ttl_hours);
        let results = orchestrator.search_many(&batch).await?;

        if args.json {
            serde_json::to_writer_pretty(&mut *out, &results)?;
            writeln!(out)?;
        } else if results.is_empty() {
            writeln!(out, "No results.")?;
        } else {
            write!(out, "{}", format_search_results(&results))?;
        }
        Ok(())
    }

    pub async fn cache(&self, command: CacheCommand, out: &mut impl Write) -> Result<()> {
        match command {
            CacheCommand::Clear => {
                let removed = self.store.clear().await?;
                writeln!(out, "Removed {removed} cache entries.")?;
            }
            CacheCommand::Sweep => {
                let cleaned = self.store.sweep_expired().await?;
                writeln!(out, "Swept {cleaned} expired or abandoned entries.")?;
            }
        }
        Ok(())
    }

    pub async fn session(&self, command: SessionCommand, out: &mut impl Write) -> Result<()> {
        self.require_sessions()?;

        match command {
            SessionCommand::New { title, query } => {
                let title = title.or_else(|| query.clone()).unwrap_or_default();
                let seed = SessionSeed { title, query, search_enabled: true, ..Default::default() };
                let session = self.sessions.create(seed).await?;
                writeln!(out, "{}", session.id)?;
            }
            SessionCommand::List { limit } => {
                let now = chrono::Utc::now();
                let sessions = self.sessions.recent(limit).await?;
                if sessions.is_empty() {
                    writeln!(out, "No saved sessions.")?;
                }
                for s in sessions {
                    writeln!(
                        out,
                        "{}\t{}\t{}\t{} messages",
                        s.id,
                        s.display_title(),
                        s.age_label(now),
                        s.conversation_len()
                    )?;
                }
            }
            SessionCommand::Show { id } => {
                let s = self.sessions.load(&id).await?;
                let now = chrono::Utc::now();
                writeln!(out, "ID: {}", s.id)?;
                writeln!(out, "Title: {}", s.display_title())?;
                writeln!(out, "Created: {} ({})", s.created_at.format("%Y-%m-%d %H:%M:%S"), s.age_label(now))?;
                writeln!(out, "Last accessed: {}", s.last_accessed_at.format("%Y-%m-%d %H:%M:%S"))?;
                writeln!(out, "Last modified: {}", s.last_modified.format("%Y-%m-%d %H:%M:%S"))?;
                writeln!(out, "Message count: {}", s.conversation_len())?;
                writeln!(out, "Search enabled: {}", s.search_enabled)?;
                if let Some(url) = &s.url {
                    writeln!(out, "Source URL: {url}")?;
                }
                if let Some(query) = &s.query {
                    writeln!(out, "Search query: {query}")?;
                }
            }
            SessionCommand::Keep { id } => {
                let mut s = self.sessions.load(&id).await?;
                let committed = self.sessions.finish(self.store.as_ref(), &mut s, true).await?;
                writeln!(out, "Kept {id}; committed {committed} cache entries.")?;
            }
            SessionCommand::Discard { id } => {
                let discarded = match self.sessions.load(&id).await {
                    Ok(mut s) => self.sessions.finish(self.store.as_ref(), &mut s, false).await?,
                    // transcript already gone; still drop anything cached under the id
                    Err(hvsum_core::Error::SessionNotFound(_)) => self.store.discard(&id).await?,
                    Err(e) => return Err(e.into()),
                };
                writeln!(out, "Discarded {id}; removed {discarded} cache entries.")?;
            }
            SessionCommand::Clean { days } => {
                let days = days.unwrap_or(self.config.session_max_age_days);
                let cleaned = self.sessions.clean_old(days).await?;
                writeln!(out, "Removed {cleaned} sessions older than {days} days.")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hvsum_core::SearchResult;
    use hvsum_core::cache::{Payload, fingerprint};

    struct FixedProvider;

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, hvsum_core::Error> {
            Ok((0..limit)
                .map(|i| SearchResult::new(format!("{query} {i}"), format!("https://{query}.example/{i}"), "s", "fixed"))
                .collect())
        }
    }

    async fn app(tmp: &tempfile::TempDir) -> App {
        let config = AppConfig { config_dir: tmp.path().to_path_buf(), ..Default::default() };
        App::open(config).await.unwrap()
    }

    fn search_args(queries: &[&str]) -> SearchArgs {
        SearchArgs {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            limit: Some(2),
            max_results: None,
            concurrency: None,
            session: None,
            json: false,
        }
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;
        assert!(app.config.cache_dir().is_dir());
        assert!(app.config.sessions_dir().is_dir());
    }

    #[tokio::test]
    async fn test_search_prints_block() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;
        let mut out = Vec::new();

        app.search(Arc::new(FixedProvider), &search_args(&["rust", "tokio"]), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- WEB SEARCH RESULTS ---"));
        assert!(text.contains("Result 4:"));
        assert!(text.contains("https://tokio.example/1"));
    }

    #[tokio::test]
    async fn test_search_json() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;
        let mut out = Vec::new();
        let args = SearchArgs { json: true, max_results: Some(1), ..search_args(&["rust"]) };

        app.search(Arc::new(FixedProvider), &args, &mut out).await.unwrap();

        let results: Vec<SearchResult> = serde_json::from_slice(&out).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_engine, "fixed");
    }

    #[tokio::test]
    async fn test_search_rejects_concurrency_above_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;

        for concurrency in [0, MAX_SEARCH_CONCURRENCY + 1] {
            let args = SearchArgs { concurrency: Some(concurrency), ..search_args(&["rust"]) };
            let err = app.search(Arc::new(FixedProvider), &args, &mut Vec::new()).await.unwrap_err();
            assert!(err.to_string().contains("INVALID_INPUT"), "{err}");
        }

        let args = SearchArgs { concurrency: Some(MAX_SEARCH_CONCURRENCY), ..search_args(&["rust"]) };
        app.search(Arc::new(FixedProvider), &args, &mut Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_unknown_session() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;
        let args = SearchArgs { session: Some("session_404".into()), ..search_args(&["rust"]) };

        let err = app.search(Arc::new(FixedProvider), &args, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("SESSION_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_session_search_then_discard() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;

        let mut out = Vec::new();
        app.session(SessionCommand::New { title: Some("t".into()), query: None }, &mut out).await.unwrap();
        let id = String::from_utf8(out).unwrap().trim().to_string();

        let args = SearchArgs { session: Some(id.clone()), ..search_args(&["rust"]) };
        app.search(Arc::new(FixedProvider), &args, &mut Vec::new()).await.unwrap();

        let key = fingerprint("search:rust:2");
        assert!(app.store.get(&key).await.is_some());

        let mut out = Vec::new();
        app.session(SessionCommand::Discard { id: id.clone() }, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("removed 1 cache entries"));
        assert!(app.store.get(&key).await.is_none());
        assert!(!app.sessions.exists(&id).await);
    }

    #[tokio::test]
    async fn test_session_keep_commits() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;

        let mut out = Vec::new();
        app.session(SessionCommand::New { title: None, query: Some("tokio".into()) }, &mut out).await.unwrap();
        let id = String::from_utf8(out).unwrap().trim().to_string();

        let key = fingerprint("qa:q:s");
        app.store.set(&key, Payload::Text("a".into()), 24, Some(&id)).await.unwrap();

        let mut out = Vec::new();
        app.session(SessionCommand::Keep { id: id.clone() }, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("committed 1"));

        // committed entries survive a later discard of the same id
        app.session(SessionCommand::Discard { id }, &mut Vec::new()).await.unwrap();
        assert!(app.store.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_session_list_and_show() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;

        let mut out = Vec::new();
        app.session(SessionCommand::New { title: None, query: Some("tokio".into()) }, &mut out).await.unwrap();
        let id = String::from_utf8(out).unwrap().trim().to_string();

        let mut out = Vec::new();
        app.session(SessionCommand::List { limit: 5 }, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&id));
        assert!(text.contains("tokio"));

        let mut out = Vec::new();
        app.session(SessionCommand::Show { id }, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Search query: tokio"));
    }

    #[tokio::test]
    async fn test_sessions_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig { config_dir: tmp.path().to_path_buf(), session_persist: false, ..Default::default() };
        let app = App::open(config).await.unwrap();

        let err = app.session(SessionCommand::List { limit: 5 }, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("sessions are disabled"));
    }

    #[tokio::test]
    async fn test_cache_disabled_uses_null_store() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig { config_dir: tmp.path().to_path_buf(), cache_enabled: false, ..Default::default() };
        let app = App::open(config).await.unwrap();

        app.search(Arc::new(FixedProvider), &search_args(&["rust"]), &mut Vec::new()).await.unwrap();
        assert!(app.store.get(&fingerprint("search:rust:2")).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear_and_sweep() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(&tmp).await;
        app.search(Arc::new(FixedProvider), &search_args(&["rust", "tokio"]), &mut Vec::new()).await.unwrap();

        let mut out = Vec::new();
        app.cache(CacheCommand::Sweep, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Swept 0 expired or abandoned entries.\n");

        let mut out = Vec::new();
        app.cache(CacheCommand::Clear, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Removed 2 cache entries.\n");
    }
}
