use serde::{Deserialize, Serialize};

/// Root configuration structure, read from `.methodset.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MethodSetConfig {
    /// Resolver behavior
    #[serde(default)]
    pub resolver: Option<ResolverConfig>,
}

impl MethodSetConfig {
    /// Resolver settings, defaulted when the section is absent
    pub fn resolver(&self) -> ResolverConfig {
        self.resolver.clone().unwrap_or_default()
    }
}

/// How a composite's embedded interface takes part in method promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceEmbedding {
    /// Embedded interfaces contribute nothing and are not traversed
    #[default]
    Ignore,
    /// Embedded interfaces contribute their requirements as by-value methods
    Promote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub interface_embedding: InterfaceEmbedding,

    /// Memoize satisfaction answers per (type, mode, interface)
    #[serde(default = "default_memoize")]
    pub memoize: bool,

    /// Fan batch queries out over the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_memoize() -> bool {
    true
}

fn default_parallel() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            interface_embedding: InterfaceEmbedding::default(),
            memoize: default_memoize(),
            parallel: default_parallel(),
        }
    }
}

impl ResolverConfig {
    pub fn with_interface_embedding(mut self, policy: InterfaceEmbedding) -> Self {
        self.interface_embedding = policy;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
