/// Table shown when no (or an unknown) table is requested.
pub const DEFAULT_TABLE: &str = "humor_flavors";

/// Tables that may be listed unless overridden by configuration.
pub const ALLOWED_TABLES: &[&str] = &["humor_flavors", "captions", "images"];

/// Allow-list of listable tables with a bounded default.
///
/// The default table is always a member of the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCatalog {
    allowed: Vec<String>,
    default: String,
}

impl Default for TableCatalog {
    fn default() -> Self {
        Self::new(ALLOWED_TABLES.iter().map(|t| (*t).to_string()), DEFAULT_TABLE)
    }
}

impl TableCatalog {
    /// Build a catalog. Blank and repeated names are dropped; the default is added if absent.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = String>, default: impl Into<String>) -> Self {
        let default = default.into();
        let mut allowed = allowed.into_iter().fold(Vec::<String>::new(), |mut acc, t| {
            let t = t.trim();
            if !t.is_empty() && !acc.iter().any(|seen| seen == t) {
                acc.push(t.to_string());
            }
            acc
        });
        if !allowed.contains(&default) {
            allowed.insert(0, default.clone());
        }
        Self { allowed, default }
    }

    #[must_use]
    pub fn is_allowed(&self, table: &str) -> bool {
        self.allowed.iter().any(|t| t == table)
    }

    /// The requested table if allow-listed, otherwise the default.
    #[must_use]
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(t) if self.is_allowed(t) => t,
            _ => &self.default,
        }
    }

    #[must_use]
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    #[must_use]
    pub fn default_table(&self) -> &str {
        &self.default
    }
}
