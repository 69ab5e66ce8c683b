//! # semgraph CLI Module
//!
//! This module implements the CLI interface for semgraph.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store status
//! - `init` - Initialize a new database
//! - `add` / `remove` / `exists` - Entity lifecycle
//! - `match` / `remove-pattern` - Pattern queries
//! - `star` / `ego` / `degree` - Neighborhood queries
//! - `attr` - Read and update entity attributes
//! - `export` / `import` - Snapshot transfer
//! - `hash` - Compute BLAKE3 hash of the store snapshot

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use semgraph_core::{BackendKind, HypergraphError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// semgraph - Semantic Hypergraph Store
///
/// Stores recursive hyperedges such as `(says/pd mary/c (is/pd sky/c blue/c))`
/// and answers structural pattern queries over them.
#[derive(Parser, Debug)]
#[command(name = "semgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides the configuration file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory" (snapshot file)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store status
    Status,

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Add an edge or atom (children are added as non-primary)
    Add {
        /// Entity text, e.g. "(is/pd sky/c blue/c)"
        entity: String,

        /// Store the entity itself as non-primary
        #[arg(long)]
        non_primary: bool,
    },

    /// Remove an entity
    Remove {
        /// Entity text
        entity: String,

        /// Also remove every sub-edge at any depth
        #[arg(long)]
        deep: bool,

        /// With --deep, keep sub-edges still contained by other edges
        #[arg(long, requires = "deep")]
        keep_shared: bool,
    },

    /// Check whether an entity is stored
    Exists {
        /// Entity text
        entity: String,
    },

    /// List stored entities matching a pattern
    Match {
        /// Pattern text, e.g. "(is/pd * ...)"
        pattern: String,

        /// Stop after this many results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the edges that directly contain an entity
    Star {
        /// Entity text
        entity: String,

        /// Stop after this many results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the atoms of every edge containing an entity
    Ego {
        /// Entity text
        entity: String,
    },

    /// Count the edges containing an entity
    Degree {
        /// Entity text
        entity: String,

        /// Count containing edges at any depth
        #[arg(long)]
        deep: bool,
    },

    /// Remove every entity matching a pattern
    RemovePattern {
        /// Pattern text
        pattern: String,
    },

    /// Read or update entity attributes
    Attr {
        #[command(subcommand)]
        action: AttrCommand,
    },

    /// Export the store as a binary snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a binary snapshot into the store
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute BLAKE3 hash of the store snapshot
    Hash,
}

/// Attribute subcommands.
#[derive(Subcommand, Debug)]
pub enum AttrCommand {
    /// Print an attribute value
    Get { entity: String, name: String },

    /// Set an attribute value
    Set {
        entity: String,
        name: String,
        value: String,

        /// Value type (str, int, float)
        #[arg(short = 't', long = "type", default_value = "str")]
        kind: String,
    },

    /// Increment a numeric attribute (absent counts as 0)
    Inc { entity: String, name: String },

    /// Decrement a numeric attribute (absent counts as 0)
    Dec { entity: String, name: String },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HypergraphError> {
    let config =
        AppConfig::load(cli.config.as_deref())?.with_overrides(cli.database, cli.backend);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Add {
            entity,
            non_primary,
        }) => cmd_add(&config, json_mode, &entity, !non_primary),
        Some(Commands::Remove {
            entity,
            deep,
            keep_shared,
        }) => cmd_remove(&config, json_mode, &entity, deep, keep_shared),
        Some(Commands::Exists { entity }) => cmd_exists(&config, json_mode, &entity),
        Some(Commands::Match { pattern, limit }) => cmd_match(&config, json_mode, &pattern, limit),
        Some(Commands::Star { entity, limit }) => cmd_star(&config, json_mode, &entity, limit),
        Some(Commands::Ego { entity }) => cmd_ego(&config, json_mode, &entity),
        Some(Commands::Degree { entity, deep }) => cmd_degree(&config, json_mode, &entity, deep),
        Some(Commands::RemovePattern { pattern }) => {
            cmd_remove_pattern(&config, json_mode, &pattern)
        }
        Some(Commands::Attr { action }) => cmd_attr(&config, json_mode, action),
        Some(Commands::Export { output }) => cmd_export(&config, &output),
        Some(Commands::Import { input }) => cmd_import(&config, &input),
        Some(Commands::Hash) => cmd_hash(&config, json_mode),
        // No subcommand: show status
        None => cmd_status(&config, json_mode),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "semgraph", "-B", "memory", "-D", "kb.snap", "--json-mode", "add", "sky/c",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(BackendKind::Memory));
        assert_eq!(cli.database, Some(PathBuf::from("kb.snap")));
        assert!(cli.json_mode);
        match cli.command {
            Some(Commands::Add {
                entity,
                non_primary,
            }) => {
                assert_eq!(entity, "sky/c");
                assert!(!non_primary);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["semgraph", "-B", "postgres", "status"]).is_err());
    }

    #[test]
    fn keep_shared_requires_deep() {
        assert!(Cli::try_parse_from(["semgraph", "remove", "(a b)", "--keep-shared"]).is_err());
        assert!(
            Cli::try_parse_from(["semgraph", "remove", "(a b)", "--deep", "--keep-shared"]).is_ok()
        );
    }

    #[test]
    fn attr_set_parses_type() {
        let cli =
            Cli::try_parse_from(["semgraph", "attr", "set", "sky/c", "weight", "3", "-t", "int"])
                .unwrap();
        match cli.command {
            Some(Commands::Attr {
                action: AttrCommand::Set { kind, value, .. },
            }) => {
                assert_eq!(kind, "int");
                assert_eq!(value, "3");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
