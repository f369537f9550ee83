//! Schema bootstrap
//!
//! The harness works against two tables: `items` and their `subitems`. Both are
//! created with `if not exists`, so bootstrapping a store that already holds
//! data leaves that data untouched.
//!
//! # Example
//!
//! ```rust
//! use rowfarm::database::{SchemaBootstrapper, Table};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! SchemaBootstrapper::bootstrap(&conn).unwrap();
//! SchemaBootstrapper::bootstrap(&conn).unwrap(); // no-op the second time
//! assert!(SchemaBootstrapper::is_present(&conn).unwrap());
//! assert_eq!(Table::Items.name(), "items");
//! ```

use rusqlite::Connection;

/// Statement set creating the harness tables when absent
pub const BOOTSTRAP_SQL: &str = "
create table if not exists items (
  id integer primary key autoincrement,
  name text
);

create table if not exists subitems (
  id integer primary key autoincrement,
  item_id integer references items (id),
  name text
);
";

/// Insert one item and hand back its id
pub const INSERT_ITEM_SQL: &str = "insert into items (name) values (?1) returning id";

/// Insert one subitem for an existing item and hand back its id
pub const INSERT_SUBITEM_SQL: &str =
    "insert into subitems (item_id, name) values (?1, ?2) returning id";

/// Harness tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Parent rows
    Items,
    /// Child rows, two per item
    Subitems,
}

impl Table {
    /// All harness tables, parents first
    pub const ALL: [Table; 2] = [Table::Items, Table::Subitems];

    /// SQL name of the table
    pub fn name(&self) -> &'static str {
        match self {
            Table::Items => "items",
            Table::Subitems => "subitems",
        }
    }
}

/// Creates the harness tables
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaBootstrapper;

impl SchemaBootstrapper {
    /// Run the bootstrap statement set against a connection
    ///
    /// # Arguments
    /// * `conn` - Open connection
    ///
    /// # Returns
    /// `Ok(())` if both tables exist afterwards, `Err` otherwise
    pub fn bootstrap(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(BOOTSTRAP_SQL)
    }

    /// Check whether both harness tables exist
    pub fn is_present(conn: &Connection) -> rusqlite::Result<bool> {
        let found: i64 = conn.query_row(
            "select count(*) from sqlite_master where type = 'table' and name in (?1, ?2)",
            [Table::Items.name(), Table::Subitems.name()],
            |row| row.get(0),
        )?;
        Ok(found == Table::ALL.len() as i64)
    }
}
