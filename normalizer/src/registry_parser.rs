use crate::base_parser::{Parser, ParserConstructor};
use crate::parsers::all_parsers;
use crate::{Options, RegistryError, Schema};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static GLOBAL_REGISTRY: LazyLock<ParserRegistry> = LazyLock::new(ParserRegistry::new);

/// ParserRegistry - maps parser ids to constructors
///
/// Built once before use and only read afterwards, so shared lookups need no
/// locking. `global()` holds the process-wide instance with every built-in
/// parser; custom registries can be assembled with `empty()` + `register()`.
///
/// ## Adding a New Parser
///
/// To add a new built-in parser, only `parsers.rs` needs to change.
pub struct ParserRegistry {
    constructors: HashMap<&'static str, ParserConstructor>,
}

impl ParserRegistry {
    /// Create a new registry with all parsers from the central list
    pub fn new() -> Self {
        info!("Initializing ParserRegistry");
        let mut registry = Self::empty();
        for (id, constructor) in all_parsers() {
            registry.register(id, constructor);
        }

        info!("Registered {} parsers: {}", registry.constructors.len(), registry.ids().join(", "));
        registry
    }

    /// A registry with no parsers
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// The process-wide registry of built-in parsers
    pub fn global() -> &'static ParserRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a parser constructor under `id`, replacing any previous entry
    pub fn register(&mut self, id: &'static str, constructor: ParserConstructor) {
        debug!("Registering parser: {}", id);
        if self.constructors.insert(id, constructor).is_some() {
            warn!("Parser '{}' registered twice, keeping the latest", id);
        }
    }

    /// Get a parser constructor by id
    pub fn lookup(&self, id: &str) -> Result<ParserConstructor, RegistryError> {
        debug!("Looking up parser by id: {}", id);
        self.constructors.get(id).copied().ok_or_else(|| {
            warn!("Parser not found: {}", id);
            RegistryError::UnknownParser(id.to_string())
        })
    }

    /// Look up `id` and construct a parser for `schema` and `options`
    pub fn build(&self, id: &str, schema: Schema, options: Options) -> Result<Box<dyn Parser>, RegistryError> {
        let constructor = self.lookup(id)?;
        Ok(constructor(schema, options))
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.constructors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
