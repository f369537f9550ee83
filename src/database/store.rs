//! Store handle
//!
//! A [`Store`] owns the single engine connection. Every operation takes the
//! connection lock for exactly one engine call, so nothing is held open between
//! calls. A [`StoreHandle`] is the shared, cloneable reference the components are
//! built from; it moves from [`Lifecycle::Uninitialized`] to [`Lifecycle::Ready`]
//! once and never back.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::database::{StoreHandle, StoreSource, Table};
//!
//! # async fn demo() -> rowfarm::Result<()> {
//! let handle = StoreHandle::new();
//! handle.initialize(StoreSource::Memory).await?;
//!
//! let store = handle.ready()?;
//! let id = store.insert_item("parent")?;
//! store.insert_subitem(id, "child")?;
//! assert_eq!(store.count(Table::Subitems)?, 1);
//! # Ok(())
//! # }
//! ```

use crate::database::schema::{SchemaBootstrapper, Table, INSERT_ITEM_SQL, INSERT_SUBITEM_SQL};
use crate::error::{Error, Result};
use crate::types::{ResultSet, Value};
use log::{debug, error, info};
use rusqlite::{backup, params, Batch, Connection, DatabaseName};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Where a store is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    /// Fresh in-memory database
    Memory,
    /// Database file, created if missing
    File(PathBuf),
    /// In-memory copy of an exported binary image
    Snapshot(Vec<u8>),
}

impl StoreSource {
    /// Whether the store starts empty and is gone when the process exits
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, StoreSource::Memory)
    }
}

impl fmt::Display for StoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSource::Memory => write!(f, "in-memory"),
            StoreSource::File(path) => write!(f, "file {}", path.display()),
            StoreSource::Snapshot(bytes) => write!(f, "snapshot of {} bytes", bytes.len()),
        }
    }
}

/// Bootstrapped engine instance
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Load the engine from `source` and bootstrap the schema
    ///
    /// # Arguments
    /// * `source` - Where to load the database from
    ///
    /// # Returns
    /// `Ok(Store)` with both tables present, `Err` if the engine cannot be
    /// loaded or the bootstrap fails
    pub fn open(source: &StoreSource) -> Result<Self> {
        let conn = Self::connect(source)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.bootstrap()?;
        Ok(store)
    }

    fn connect(source: &StoreSource) -> Result<Connection> {
        let conn = match source {
            StoreSource::Memory => Connection::open_in_memory(),
            StoreSource::File(path) => Connection::open(path),
            StoreSource::Snapshot(bytes) => return Self::restore(bytes),
        };
        conn.map_err(|e| Error::Initialization(e.to_string()))
    }

    /// Copy a binary image into a fresh in-memory connection
    fn restore(bytes: &[u8]) -> Result<Connection> {
        let mut image = tempfile::NamedTempFile::new()?;
        image.write_all(bytes)?;
        image.flush()?;

        let mut conn =
            Connection::open_in_memory().map_err(|e| Error::Initialization(e.to_string()))?;
        conn.restore(
            DatabaseName::Main,
            image.path(),
            None::<fn(backup::Progress)>,
        )
        .map_err(|e| Error::Initialization(format!("invalid snapshot: {}", e)))?;
        Ok(conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Create the harness tables when absent
    pub fn bootstrap(&self) -> Result<()> {
        let conn = self.lock()?;
        if SchemaBootstrapper::is_present(&conn).map_err(Error::Bootstrap)? {
            debug!("harness tables already present");
            return Ok(());
        }
        SchemaBootstrapper::bootstrap(&conn).map_err(Error::Bootstrap)?;
        info!("created harness tables");
        Ok(())
    }

    /// Insert one item
    ///
    /// # Returns
    /// Store-assigned id of the new item
    pub fn insert_item(&self, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(INSERT_ITEM_SQL)?;
        let id = stmt.query_row(params![name], |row| row.get(0))?;
        Ok(id)
    }

    /// Insert one subitem referencing `item_id`
    ///
    /// # Returns
    /// Store-assigned id of the new subitem
    pub fn insert_subitem(&self, item_id: i64, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(INSERT_SUBITEM_SQL)?;
        let id = stmt.query_row(params![item_id, name], |row| row.get(0))?;
        Ok(id)
    }

    /// Run SQL text statement by statement
    ///
    /// Statements are prepared one at a time, so later statements may refer to
    /// objects created by earlier ones. A failure stops the run; statements that
    /// already ran stay applied. Nothing is bound, so placeholders read as NULL.
    ///
    /// # Returns
    /// One result set per statement that produced at least one row
    pub fn exec(&self, sql: &str) -> Result<Vec<ResultSet>> {
        let conn = self.lock()?;
        let mut batch = Batch::new(&conn, sql);
        let mut result_sets = Vec::new();

        while let Some(mut stmt) = batch.next()? {
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let column_count = columns.len();

            let mut set: Option<ResultSet> = None;
            let mut rows = stmt.raw_query();
            while let Some(row) = rows.next()? {
                let values = (0..column_count)
                    .map(|idx| row.get_ref(idx).map(Value::from))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                set.get_or_insert_with(|| ResultSet::new(columns.clone()))
                    .values
                    .push(values);
            }
            result_sets.extend(set);
        }

        Ok(result_sets)
    }

    /// Serialize the whole main database into its binary file image
    pub fn export(&self) -> Result<Vec<u8>> {
        let conn = self.lock()?;
        let data = conn.serialize(DatabaseName::Main)?;
        Ok(data.to_vec())
    }

    /// Number of rows in a harness table
    pub fn count(&self, table: Table) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("select count(*) from {}", table.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// Names of all user tables, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "select name from sqlite_master
             where type = 'table' and name not like 'sqlite_%'
             order by name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

/// Lifecycle of the shared store
#[derive(Debug, Clone, Default)]
pub enum Lifecycle {
    /// No operations permitted
    #[default]
    Uninitialized,
    /// Schema present, all operations permitted
    Ready(Arc<Store>),
}

/// Shared reference to the store, injected into every component
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    state: Arc<RwLock<Lifecycle>>,
}

impl StoreHandle {
    /// Create an uninitialized handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already opened store in a ready handle
    pub fn from_store(store: Store) -> Self {
        Self {
            state: Arc::new(RwLock::new(Lifecycle::Ready(Arc::new(store)))),
        }
    }

    /// Load the engine and bootstrap the schema
    ///
    /// The engine is opened on the blocking pool. On failure the handle stays
    /// uninitialized; nothing retries automatically.
    ///
    /// # Arguments
    /// * `source` - Where to load the database from
    ///
    /// # Returns
    /// `Ok(())` once the handle is ready, `Err(Error::AlreadyInitialized)` if it
    /// already was, or the load/bootstrap failure
    pub async fn initialize(&self, source: StoreSource) -> Result<()> {
        if self.is_ready() {
            return Err(Error::AlreadyInitialized);
        }

        let description = source.to_string();
        info!("initializing {} store", description);

        let opened = tokio::task::spawn_blocking(move || Store::open(&source))
            .await
            .map_err(|e| Error::Initialization(e.to_string()))
            .and_then(|result| result);
        let store = match opened {
            Ok(store) => store,
            Err(e) => {
                error!("store initialization failed: {}", e);
                return Err(e);
            }
        };

        let tables = store.table_names()?;

        let mut state = self.state.write().map_err(|_| Error::LockPoisoned)?;
        if let Lifecycle::Ready(_) = *state {
            return Err(Error::AlreadyInitialized);
        }
        *state = Lifecycle::Ready(Arc::new(store));
        info!("{} store ready (tables: {})", description, tables.join(", "));
        Ok(())
    }

    /// The ready store, or `Error::NotReady`
    pub fn ready(&self) -> Result<Arc<Store>> {
        let state = self.state.read().map_err(|_| Error::LockPoisoned)?;
        match &*state {
            Lifecycle::Ready(store) => Ok(Arc::clone(store)),
            Lifecycle::Uninitialized => Err(Error::NotReady),
        }
    }

    /// Whether the store is ready
    pub fn is_ready(&self) -> bool {
        self.ready().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_bootstraps_schema() {
        let store = Store::open(&StoreSource::Memory).unwrap();
        assert_eq!(
            store.table_names().unwrap(),
            vec!["items".to_string(), "subitems".to_string()]
        );
        assert_eq!(store.count(Table::Items).unwrap(), 0);
    }

    #[test]
    fn test_only_fresh_memory_is_ephemeral() {
        assert!(StoreSource::Memory.is_ephemeral());
        assert!(!StoreSource::File(PathBuf::from("db.sqlite")).is_ephemeral());
        assert!(!StoreSource::Snapshot(Vec::new()).is_ephemeral());
    }

    #[test]
    fn test_reopening_file_store_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = StoreSource::File(dir.path().join("rows.sqlite"));

        let store = Store::open(&source).unwrap();
        store.insert_item("persisted").unwrap();
        drop(store);

        let reopened = Store::open(&source).unwrap();
        assert_eq!(reopened.count(Table::Items).unwrap(), 1);
        assert_eq!(reopened.table_names().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_ids_increase() {
        let store = Store::open(&StoreSource::Memory).unwrap();
        let first = store.insert_item("a").unwrap();
        let second = store.insert_item("b").unwrap();
        assert!(second > first);

        let child = store.insert_subitem(second, "c").unwrap();
        assert!(child >= 1);
        assert_eq!(store.count(Table::Subitems).unwrap(), 1);
    }

    #[test]
    fn test_bootstrap_twice_keeps_data() {
        let store = Store::open(&StoreSource::Memory).unwrap();
        let id = store.insert_item("keep").unwrap();
        store.insert_subitem(id, "keep too").unwrap();

        store.bootstrap().unwrap();

        assert_eq!(store.table_names().unwrap().len(), 2);
        assert_eq!(store.count(Table::Items).unwrap(), 1);
        assert_eq!(store.count(Table::Subitems).unwrap(), 1);
    }

    #[test]
    fn test_exec_multiple_result_sets() {
        let store = Store::open(&StoreSource::Memory).unwrap();
        let sets = store
            .exec("create table t (x); insert into t values (1), (2); select x from t; select 'y' as y;")
            .unwrap();

        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].columns, vec!["x".to_string()]);
        assert_eq!(
            sets[0].values,
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]]
        );
        assert_eq!(sets[1].values, vec![vec![Value::Text("y".to_string())]]);
    }

    #[test]
    fn test_exec_keeps_statements_before_failure() {
        let store = Store::open(&StoreSource::Memory).unwrap();
        let err = store
            .exec("insert into items (name) values ('kept'); select * from missing;")
            .unwrap_err();

        assert!(matches!(err, Error::Engine(_)));
        assert_eq!(store.count(Table::Items).unwrap(), 1);
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.sqlite");

        {
            let store = Store::open(&StoreSource::File(path.clone())).unwrap();
            store.insert_item("persisted").unwrap();
        }

        let reopened = Store::open(&StoreSource::File(path)).unwrap();
        assert_eq!(reopened.count(Table::Items).unwrap(), 1);
    }

    #[test]
    fn test_open_rejects_garbage_snapshot() {
        let err = Store::open(&StoreSource::Snapshot(b"definitely not sqlite".to_vec()))
            .unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[tokio::test]
    async fn test_handle_not_ready_before_initialize() {
        let handle = StoreHandle::new();
        assert!(!handle.is_ready());
        assert!(matches!(handle.ready(), Err(Error::NotReady)));
    }

    #[tokio::test]
    async fn test_handle_initialize_once() {
        let handle = StoreHandle::new();
        handle.initialize(StoreSource::Memory).await.unwrap();
        assert!(handle.is_ready());

        let err = handle.initialize(StoreSource::Memory).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized));

        // Clones share the same store
        let clone = handle.clone();
        clone.ready().unwrap().insert_item("shared").unwrap();
        assert_eq!(handle.ready().unwrap().count(Table::Items).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_handle_stays_uninitialized_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("nested").join("rows.sqlite");

        let handle = StoreHandle::new();
        let err = handle
            .initialize(StoreSource::File(path))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
        assert!(matches!(handle.ready(), Err(Error::NotReady)));
    }
}
