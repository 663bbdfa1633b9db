//! Migration resources and the provider abstraction that yields them.

/// A named, versioned schema change. Migrations apply in ascending lexical
/// order of `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
  pub name:    String,
  pub content: String,
}

impl Migration {
  pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
    Self { name: name.into(), content: content.into() }
  }
}

/// Supplies the full set of migrations known to this build.
///
/// Implemented by the store crate for compiled-in SQL and for a directory of
/// `.sql` files; tests supply their own in-memory lists.
pub trait MigrationSource: Send + Sync {
  fn migrations(&self) -> crate::Result<Vec<Migration>>;
}

impl MigrationSource for Vec<Migration> {
  fn migrations(&self) -> crate::Result<Vec<Migration>> { Ok(self.clone()) }
}
