use clap::{Args, Parser, Subcommand};

/// Web search and session cache tooling for hvsum.
#[derive(Debug, Parser)]
#[command(name = "hvsum", version, about)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Clear the whole result cache and exit
    #[arg(long)]
    pub clean_cache: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one or more web searches through the cache
    Search(SearchArgs),

    /// Result cache housekeeping
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Interactive session management
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Queries to run; each is dispatched once
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Results requested per query
    #[arg(long)]
    pub limit: Option<usize>,

    /// Cap on the merged result list
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Maximum queries in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Cache results as pending entries of this session
    #[arg(long)]
    pub session: Option<String>,

    /// Print results as JSON instead of the prompt block
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CacheCommand {
    /// Delete every cache entry
    Clear,
    /// Delete expired and abandoned entries
    Sweep,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SessionCommand {
    /// Start a new session
    New {
        #[arg(long)]
        title: Option<String>,
        /// Search query the session is about
        #[arg(long)]
        query: Option<String>,
    },
    /// List recent sessions
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show one session
    Show { id: String },
    /// Keep a session and commit its cached results
    Keep { id: String },
    /// Drop a session and discard its cached results
    Discard { id: String },
    /// Delete sessions not accessed recently
    Clean {
        /// Defaults to `session_max_age_days` from the config
        #[arg(long)]
        days: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["hvsum", "--debug", "search", "rust", "tokio", "--limit", "5", "--json"]).unwrap();
        assert!(cli.debug);
        let Some(Command::Search(args)) = cli.command else { panic!("expected search") };
        assert_eq!(args.queries, vec!["rust", "tokio"]);
        assert_eq!(args.limit, Some(5));
        assert!(args.json);
    }

    #[test]
    fn test_parse_search_requires_query() {
        assert!(Cli::try_parse_from(["hvsum", "search"]).is_err());
    }

    #[test]
    fn test_parse_session_and_cache() {
        let cli = Cli::try_parse_from(["hvsum", "session", "keep", "session_1"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Session(SessionCommand::Keep { id })) if id == "session_1"));

        let cli = Cli::try_parse_from(["hvsum", "cache", "sweep", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Some(Command::Cache(CacheCommand::Sweep))));
    }

    #[test]
    fn test_parse_clean_cache_flag() {
        let cli = Cli::try_parse_from(["hvsum", "--clean-cache"]).unwrap();
        assert!(cli.clean_cache);
        assert!(cli.command.is_none());
    }
}
