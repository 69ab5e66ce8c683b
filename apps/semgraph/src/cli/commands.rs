//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command opens the configured store, runs one operation and closes it.
//! With the `memory` backend the database path holds a snapshot file that is
//! loaded before the command and rewritten after any mutation.

use super::AttrCommand;
use crate::{api, config::AppConfig};
use semgraph_core::{
    AddOptions, AttributeValue, BackendKind, DeepRemoval, Entity, Hypergraph, HypergraphError,
    HypergraphExt, RemoveOptions, StarOptions, Store, StoreConfig,
    formats::{
        MAX_SNAPSHOT_SIZE, Snapshot, import_snapshot, snapshot_crypto_hash, snapshot_to_bytes,
    },
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HypergraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HypergraphError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HypergraphError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HypergraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        HypergraphError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HypergraphError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, HypergraphError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HypergraphError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(HypergraphError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HypergraphError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a snapshot file with path and size checks.
fn read_snapshot_file(path: &Path) -> Result<Vec<u8>, HypergraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_SNAPSHOT_SIZE as u64)?;
    std::fs::read(&validated).map_err(|e| HypergraphError::Io(format!("Read file: {}", e)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// STORE LIFECYCLE
// =============================================================================

/// Open the configured store, loading the snapshot file for `memory`.
pub fn open_store(config: &StoreConfig) -> Result<Store, HypergraphError> {
    let mut store = Store::open(config)?;
    if config.backend == BackendKind::Memory {
        if let Some(path) = config.path.as_deref().filter(|p| p.exists()) {
            let data = read_snapshot_file(path)?;
            let restored = import_snapshot(&mut store, &data)?;
            tracing::debug!(path = %path.display(), restored, "loaded snapshot file");
        }
    }
    Ok(store)
}

/// Persist the store after a mutation and release it.
pub fn save_store(store: &mut Store, config: &StoreConfig) -> Result<(), HypergraphError> {
    if !store.is_persistent() {
        if let Some(path) = config.path.as_deref() {
            let data = snapshot_to_bytes(&Snapshot::capture(store)?)?;
            std::fs::write(path, &data)
                .map_err(|e| HypergraphError::Io(format!("Write db: {}", e)))?;
        }
    }
    store.close()
}

/// Parse `value` as an attribute of the named type.
pub fn parse_attribute_value(value: &str, kind: &str) -> Result<AttributeValue, HypergraphError> {
    match kind {
        "str" | "string" => Ok(AttributeValue::Str(value.to_string())),
        "int" => value.trim().parse().map(AttributeValue::Int).map_err(|_| {
            HypergraphError::Config(format!("'{}' is not a valid integer", value))
        }),
        "float" => value.trim().parse().map(AttributeValue::Float).map_err(|_| {
            HypergraphError::Config(format!("'{}' is not a valid float", value))
        }),
        other => Err(HypergraphError::Config(format!(
            "Unknown attribute type: {}. Use: str, int, float",
            other
        ))),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server. A `memory` store is written back on shutdown.
pub async fn cmd_server(config: &AppConfig) -> Result<(), HypergraphError> {
    let store = open_store(&config.store)?;

    println!("semgraph HTTP Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.server.addr());
    println!("  Backend:  {:?}", config.store.backend);
    println!("  Database: {:?}", config.store.path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health         - Health check");
    println!("  GET  /status         - Store counts");
    println!("  POST /add            - Add an entity");
    println!("  POST /remove         - Remove an entity");
    println!("  POST /exists         - Existence check");
    println!("  POST /match          - Pattern query");
    println!("  POST /star           - Containing edges");
    println!("  POST /ego            - Neighboring atoms");
    println!("  POST /degree         - Degree / deep degree");
    println!("  POST /remove_pattern - Remove by pattern");
    println!("  POST /attribute      - Attribute get/set/inc/dec");
    println!("  POST /export         - Export snapshot");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = api::AppState::new(store);
    api::run_server(&config.server, state.clone()).await?;

    let mut store = state.store.write().await;
    save_store(&mut store, &config.store)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), HypergraphError> {
    let store = open_store(&config.store)?;
    let counts = store.counts()?;

    if json_mode {
        print_json(&serde_json::json!({
            "name": store.name(),
            "database": config.store.path.as_deref().map(|p| p.to_string_lossy()),
            "backend": store.backend(),
            "atoms": counts.atoms,
            "edges": counts.edges,
            "primary_atoms": counts.primary_atoms,
            "primary_edges": counts.primary_edges,
        }));
        return Ok(());
    }

    println!("semgraph Store Status");
    println!("=====================");
    println!("Name:     {}", store.name());
    println!("Database: {:?}", config.store.path);
    println!("Backend:  {:?}", store.backend());
    println!();
    println!("Atoms:          {}", counts.atoms);
    println!("Edges:          {}", counts.edges);
    println!("Primary Atoms:  {}", counts.primary_atoms);
    println!("Primary Edges:  {}", counts.primary_edges);

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(config: &AppConfig, force: bool) -> Result<(), HypergraphError> {
    let path = config.store.path.as_deref().ok_or_else(|| {
        HypergraphError::Config("init requires a database path (--database)".to_string())
    })?;

    if path.exists() {
        if !force {
            return Err(HypergraphError::Config(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(path)
            .map_err(|e| HypergraphError::Io(format!("Remove db: {}", e)))?;
    }

    let mut store = Store::open(&config.store)?;
    save_store(&mut store, &config.store)?;

    match config.store.backend {
        BackendKind::Redb => println!("Initialized new redb database at {:?}", path),
        BackendKind::Memory => println!("Initialized new snapshot file at {:?}", path),
    }

    Ok(())
}

// =============================================================================
// ENTITY COMMANDS
// =============================================================================

/// Add an entity.
pub fn cmd_add(
    config: &AppConfig,
    json_mode: bool,
    text: &str,
    primary: bool,
) -> Result<(), HypergraphError> {
    let entity = Entity::parse(text)?;
    let mut store = open_store(&config.store)?;
    let added = store.add_with(entity, AddOptions { primary })?;
    save_store(&mut store, &config.store)?;

    if json_mode {
        print_json(&serde_json::json!({ "added": added.to_string(), "primary": primary }));
    } else {
        println!("Added {}", added);
    }
    Ok(())
}

/// Remove an entity.
pub fn cmd_remove(
    config: &AppConfig,
    json_mode: bool,
    text: &str,
    deep: bool,
    keep_shared: bool,
) -> Result<(), HypergraphError> {
    let entity = Entity::parse(text)?;
    let options = RemoveOptions {
        deep,
        sharing: if keep_shared {
            DeepRemoval::KeepShared
        } else {
            DeepRemoval::Unconditional
        },
    };

    let mut store = open_store(&config.store)?;
    let removed = store.remove_with(&entity, options)?;
    save_store(&mut store, &config.store)?;

    if json_mode {
        print_json(&serde_json::json!({ "entity": entity.to_string(), "removed": removed }));
    } else if removed {
        println!("Removed {}", entity);
    } else {
        println!("{} not found", entity);
    }
    Ok(())
}

/// Check existence.
pub fn cmd_exists(config: &AppConfig, json_mode: bool, text: &str) -> Result<(), HypergraphError> {
    let entity = Entity::parse(text)?;
    let store = open_store(&config.store)?;
    let exists = store.exists(&entity)?;
    let primary = exists && store.is_primary(&entity)?;

    if json_mode {
        print_json(&serde_json::json!({
            "entity": entity.to_string(),
            "exists": exists,
            "primary": primary,
        }));
    } else if exists {
        println!("{} exists ({})", entity, if primary { "primary" } else { "non-primary" });
    } else {
        println!("{} not found", entity);
    }
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

fn print_entities(json_mode: bool, key: &str, entities: &[String]) {
    if json_mode {
        let mut output = serde_json::Map::new();
        output.insert(key.to_string(), serde_json::json!(entities));
        output.insert("count".to_string(), serde_json::json!(entities.len()));
        print_json(&serde_json::Value::Object(output));
        return;
    }
    for entity in entities {
        println!("{}", entity);
    }
    println!("({} results)", entities.len());
}

/// List entities matching a pattern.
pub fn cmd_match(
    config: &AppConfig,
    json_mode: bool,
    pattern: &str,
    limit: Option<usize>,
) -> Result<(), HypergraphError> {
    let store = open_store(&config.store)?;
    let found: Vec<String> = store
        .match_all(pattern)?
        .take(limit.unwrap_or(usize::MAX))
        .map(|e| e.to_string())
        .collect();
    print_entities(json_mode, "matches", &found);
    Ok(())
}

/// List the edges containing an entity.
pub fn cmd_star(
    config: &AppConfig,
    json_mode: bool,
    text: &str,
    limit: Option<usize>,
) -> Result<(), HypergraphError> {
    let center = Entity::parse(text)?;
    let store = open_store(&config.store)?;
    let edges: Vec<String> = store
        .star(&center, StarOptions { limit })?
        .iter()
        .map(|e| e.to_string())
        .collect();
    print_entities(json_mode, "edges", &edges);
    Ok(())
}

/// List the ego atoms of an entity.
pub fn cmd_ego(config: &AppConfig, json_mode: bool, text: &str) -> Result<(), HypergraphError> {
    let center = Entity::parse(text)?;
    let store = open_store(&config.store)?;
    let atoms: Vec<String> = store.ego(&center)?.iter().map(|a| a.to_string()).collect();
    print_entities(json_mode, "atoms", &atoms);
    Ok(())
}

/// Print the degree or deep degree of an entity.
pub fn cmd_degree(
    config: &AppConfig,
    json_mode: bool,
    text: &str,
    deep: bool,
) -> Result<(), HypergraphError> {
    let entity = Entity::parse(text)?;
    let store = open_store(&config.store)?;
    let degree = if deep {
        store.deep_degree(&entity)?
    } else {
        store.degree(&entity)?
    };

    if json_mode {
        print_json(&serde_json::json!({
            "entity": entity.to_string(),
            "deep": deep,
            "degree": degree,
        }));
    } else {
        println!("{}", degree);
    }
    Ok(())
}

/// Remove every entity matching a pattern.
pub fn cmd_remove_pattern(
    config: &AppConfig,
    json_mode: bool,
    pattern: &str,
) -> Result<(), HypergraphError> {
    let mut store = open_store(&config.store)?;
    let removed = store.remove_by_pattern(pattern)?;
    save_store(&mut store, &config.store)?;

    if json_mode {
        print_json(&serde_json::json!({ "pattern": pattern, "removed": removed }));
    } else {
        println!("Removed {} entities", removed);
    }
    Ok(())
}

// =============================================================================
// ATTRIBUTE COMMAND
// =============================================================================

/// Read or update an attribute.
pub fn cmd_attr(
    config: &AppConfig,
    json_mode: bool,
    action: AttrCommand,
) -> Result<(), HypergraphError> {
    let mut store = open_store(&config.store)?;

    let (entity, name, value, mutated) = match action {
        AttrCommand::Get { entity, name } => {
            let entity = Entity::parse(&entity)?;
            let value = store.attribute(&entity, &name)?;
            (entity, name, value, false)
        }
        AttrCommand::Set {
            entity,
            name,
            value,
            kind,
        } => {
            let entity = Entity::parse(&entity)?;
            let value = parse_attribute_value(&value, &kind)?;
            let stored = store.set_attribute(&entity, &name, value.clone())?;
            (entity, name, stored.then_some(value), stored)
        }
        AttrCommand::Inc { entity, name } => {
            let entity = Entity::parse(&entity)?;
            let value = store.inc_attribute(&entity, &name)?;
            let mutated = value.is_some();
            (entity, name, value, mutated)
        }
        AttrCommand::Dec { entity, name } => {
            let entity = Entity::parse(&entity)?;
            let value = store.dec_attribute(&entity, &name)?;
            let mutated = value.is_some();
            (entity, name, value, mutated)
        }
    };

    if mutated {
        save_store(&mut store, &config.store)?;
    }

    if json_mode {
        print_json(&serde_json::json!({
            "entity": entity.to_string(),
            "name": name,
            "value": value.as_ref().map(AttributeValue::as_string),
            "type": value.as_ref().map(AttributeValue::kind),
        }));
    } else {
        match value {
            Some(value) => println!("{} = {} ({})", name, value, value.kind()),
            None => println!("{} has no attribute '{}'", entity, name),
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT / HASH
// =============================================================================

/// Export the store as a snapshot file.
pub fn cmd_export(config: &AppConfig, output: &Path) -> Result<(), HypergraphError> {
    let validated_output = validate_output_path(output)?;

    let store = open_store(&config.store)?;
    let snapshot = Snapshot::capture(&store)?;
    let data = snapshot_to_bytes(&snapshot)?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| HypergraphError::Io(format!("Write file: {}", e)))?;

    println!("Checksum: {}", snapshot.checksum);
    println!(
        "Exported {} entities ({} bytes) to {:?}",
        snapshot.entries.len(),
        data.len(),
        validated_output
    );
    Ok(())
}

/// Import a snapshot file into the store.
pub fn cmd_import(config: &AppConfig, input: &Path) -> Result<(), HypergraphError> {
    let data = read_snapshot_file(input)?;

    let mut store = open_store(&config.store)?;
    let restored = import_snapshot(&mut store, &data)?;
    let counts = store.counts()?;
    save_store(&mut store, &config.store)?;

    println!("Imported {} entities", restored);
    println!("Store now has {} atoms, {} edges", counts.atoms, counts.edges);
    Ok(())
}

/// Compute the BLAKE3 hash of the store snapshot.
pub fn cmd_hash(config: &AppConfig, json_mode: bool) -> Result<(), HypergraphError> {
    let store = open_store(&config.store)?;
    let snapshot = Snapshot::capture(&store)?;
    let hash = snapshot_crypto_hash(&snapshot_to_bytes(&snapshot)?);

    if json_mode {
        print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": hash,
            "entities": snapshot.entries.len(),
        }));
    } else {
        println!("BLAKE3: {}", hash);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
