//! Overlap-base: an ephemeral SQLite database storing annotation types and their locations.

use crate::{AnnotationTable, Error, Result, TypeGroup};
use crate::utils;

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use rusqlite::{Connection, OpenFlags, Row, Statement};
use tempfile::TempPath;


//-----------------------------------------------------------------------------

/// Ephemeral storage for an [`OverlapBase`] database.
///
/// The storage is an empty temporary file that is removed when the structure is dropped.
/// This happens on every exit path, including errors and panics while the database is being populated or queried.
/// The storage handle must be passed explicitly to [`OverlapBase::create`] and [`OverlapBase::open`].
///
/// # Examples
///
/// ```
/// use overlap_base::{AnnotationTable, Annotation, OverlapBase, Storage};
///
/// let table = AnnotationTable::from_annotations(vec![
///     Annotation::new("chr1", "exon", 10),
///     Annotation::new("chr1", "exon", 15),
///     Annotation::new("chr1", "intron", 13),
///     Annotation::new("chr1", "intron", 20),
/// ]);
///
/// let storage = Storage::new().unwrap();
/// let filename = storage.path().to_path_buf();
/// OverlapBase::create(&storage, &table).unwrap();
///
/// let database = OverlapBase::open(&storage).unwrap();
/// assert_eq!(database.sequences(), 1);
/// assert_eq!(database.types(), 2);
/// assert_eq!(database.locations(), 14);
///
/// let rows = database.overlap_join().unwrap();
/// assert_eq!(rows.len(), 6);
/// assert_eq!(rows[0].label, "chr1 exon");
/// assert_eq!(rows[0].match_handle, 2);
/// assert_eq!(rows[0].location, 13);
///
/// // The file is removed with the storage.
/// drop(database);
/// drop(storage);
/// assert!(!filename.exists());
/// ```
#[derive(Debug)]
pub struct Storage {
    path: TempPath,
}

impl Storage {
    // Prefix for temporary file names.
    const PREFIX: &'static str = "overlap-base-";

    // Suffix for temporary file names.
    const SUFFIX: &'static str = ".db";

    /// Creates a new temporary file in the system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the file cannot be created.
    pub fn new() -> Result<Self> {
        let file = Self::builder().tempfile().map_err(Error::schema)?;
        Ok(Storage { path: file.into_temp_path() })
    }

    /// Creates a new temporary file in the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the file cannot be created.
    pub fn new_in<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let file = Self::builder().tempfile_in(&dir).map_err(|x| {
            Error::Schema(format!("Cannot create a temporary file in {}: {}", dir.as_ref().display(), x))
        })?;
        Ok(Storage { path: file.into_temp_path() })
    }

    fn builder() -> tempfile::Builder<'static, 'static> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(Self::PREFIX).suffix(Self::SUFFIX);
        builder
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

//-----------------------------------------------------------------------------

/// A row returned by the overlap join.
///
/// Annotation type A is identified by its composite label and annotation type B by its handle.
/// See [`OverlapBase::type_labels`] for resolving the handles.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinRow {
    /// Composite label `<sequence> <type>` of type A.
    pub label: String,
    /// Handle of type B.
    pub match_handle: usize,
    /// Location shared by the types.
    pub location: i64,
}

impl JoinRow {
    /// Creates a new join row.
    pub fn new(label: &str, match_handle: usize, location: i64) -> Self {
        JoinRow { label: label.to_string(), match_handle, location }
    }
}

//-----------------------------------------------------------------------------

/// A database connection to an Overlap-base database.
///
/// The database is created with [`OverlapBase::create`] in a write phase and then opened read-only with [`OverlapBase::open`].
/// The connection borrows the [`Storage`], which guarantees that the file outlives it.
///
/// Table `Sequence` stores the sequences, table `SequenceType` the annotation types, and table `SequenceTypeLocation` every location covered by each type.
/// Deleting a sequence deletes its types, and deleting a type deletes its locations.
/// Table `Tags` stores header information as key-value pairs.
#[derive(Debug)]
pub struct OverlapBase<'a> {
    connection: Connection,
    storage: &'a Storage,
    version: String,
    sequences: usize,
    types: usize,
    locations: usize,
}

/// Using the database.
impl<'a> OverlapBase<'a> {
    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    /// Current database version.
    pub const VERSION: &'static str = "Overlap-base v0.1.0";

    // Key for sequence count.
    const KEY_SEQUENCES: &'static str = "sequences";

    // Key for type count.
    const KEY_TYPES: &'static str = "types";

    // Key for location count.
    const KEY_LOCATIONS: &'static str = "locations";

    /// Opens a read-only connection to the database in the storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the database cannot be opened, the header is missing, or the version is wrong.
    pub fn open(storage: &'a Storage) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(storage.path(), flags).map_err(Error::schema)?;

        // Get the header information.
        let mut get_tag = connection.prepare(
            "SELECT value FROM Tags WHERE key = ?1"
        ).map_err(Error::schema)?;
        let version = get_string_value(&mut get_tag, Self::KEY_VERSION)?;
        if version != Self::VERSION {
            return Err(Error::Schema(format!("Unsupported database version: {} (expected {})", version, Self::VERSION)));
        }
        let sequences = get_numeric_value(&mut get_tag, Self::KEY_SEQUENCES)?;
        let types = get_numeric_value(&mut get_tag, Self::KEY_TYPES)?;
        let locations = get_numeric_value(&mut get_tag, Self::KEY_LOCATIONS)?;
        drop(get_tag);

        Ok(OverlapBase {
            connection,
            storage,
            version,
            sequences, types, locations,
        })
    }

    /// Returns the filename of the database.
    pub fn filename(&self) -> &Path {
        self.storage.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        utils::file_size(self.filename())
    }

    /// Returns the version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the number of sequences.
    pub fn sequences(&self) -> usize {
        self.sequences
    }

    /// Returns the number of annotation types.
    pub fn types(&self) -> usize {
        self.types
    }

    /// Returns the total number of locations over all types.
    pub fn locations(&self) -> usize {
        self.locations
    }

    /// Returns every location shared by an ordered pair of distinct annotation types.
    ///
    /// There is one row for each (A, B, location) triple, and both orientations (A, B) and (B, A) are included.
    /// The rows are sorted by the label of A, the handle of B, and the location.
    /// Labels are compared as byte strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the query fails.
    pub fn overlap_join(&self) -> Result<Vec<JoinRow>> {
        let mut statement = self.connection.prepare(
            "SELECT Sequence.name || ' ' || SequenceType.name AS label, B.sequence_type_id AS match_id, A.location
            FROM SequenceTypeLocation A
            INNER JOIN SequenceTypeLocation B ON A.location = B.location
            INNER JOIN SequenceType ON A.sequence_type_id = SequenceType.id
            INNER JOIN Sequence ON SequenceType.sequence_id = Sequence.id
            WHERE A.sequence_type_id != B.sequence_type_id
            ORDER BY label, match_id, A.location"
        ).map_err(Error::query)?;

        let mut result: Vec<JoinRow> = Vec::new();
        let mut rows = statement.query(()).map_err(Error::query)?;
        while let Some(row) = rows.next().map_err(Error::query)? {
            let join_row = Self::row_to_join_row(row).map_err(Error::query)?;
            result.push(join_row);
        }
        debug!("Overlap join: {} rows", result.len());

        Ok(result)
    }

    fn row_to_join_row(row: &Row) -> rusqlite::Result<JoinRow> {
        let label = row.get(0)?;
        let match_handle = row.get(1)?;
        let location = row.get(2)?;
        Ok(JoinRow { label, match_handle, location })
    }

    /// Returns a map from the handle of every annotation type to its composite label `<sequence> <type>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] if the query fails.
    pub fn type_labels(&self) -> Result<HashMap<usize, String>> {
        let mut statement = self.connection.prepare(
            "SELECT SequenceType.id, Sequence.name || ' ' || SequenceType.name
            FROM SequenceType INNER JOIN Sequence ON SequenceType.sequence_id = Sequence.id"
        ).map_err(Error::query)?;

        let mut result: HashMap<usize, String> = HashMap::new();
        let mut rows = statement.query(()).map_err(Error::query)?;
        while let Some(row) = rows.next().map_err(Error::query)? {
            let handle: usize = row.get(0).map_err(Error::query)?;
            let label: String = row.get(1).map_err(Error::query)?;
            result.insert(handle, label);
        }

        Ok(result)
    }
}

//-----------------------------------------------------------------------------

/// Creating the database.
impl<'a> OverlapBase<'a> {
    /// Creates the database in the storage from the annotations.
    ///
    /// Each annotation type covers every location between its smallest and largest observed location.
    /// The connection is closed before returning; use [`OverlapBase::open`] to query the database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the database already contains tables or if the schema cannot be created.
    /// Passes through any database errors as [`Error::Schema`].
    pub fn create(storage: &Storage, table: &AnnotationTable) -> Result<()> {
        info!("Creating database {}", storage.path().display());
        let mut connection = Connection::open(storage.path()).map_err(Error::schema)?;
        Self::create_tables(&connection)?;

        let groups = table.groups();
        Self::insert_tags(table, &groups, &mut connection).map_err(Error::schema)?;
        Self::insert_sequences(table, &mut connection).map_err(Error::schema)?;
        Self::insert_types(&groups, &mut connection).map_err(Error::schema)?;
        Self::insert_locations(&groups, &mut connection).map_err(Error::schema)?;

        connection.close().map_err(|(_, x)| Error::schema(x))?;
        Ok(())
    }

    fn create_tables(connection: &Connection) -> Result<()> {
        let existing: usize = connection.query_row(
            "SELECT COUNT(*) FROM sqlite_schema WHERE type = 'table'",
            (),
            |row| row.get(0)
        ).map_err(Error::schema)?;
        if existing > 0 {
            return Err(Error::Schema(format!("The database already contains {} tables", existing)));
        }

        connection.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE Tags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            ) STRICT;

            CREATE TABLE Sequence (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            ) STRICT;

            CREATE TABLE SequenceType (
                id INTEGER PRIMARY KEY,
                sequence_id INTEGER NOT NULL REFERENCES Sequence(id) ON DELETE CASCADE,
                name TEXT NOT NULL
            ) STRICT;

            CREATE TABLE SequenceTypeLocation (
                id INTEGER PRIMARY KEY,
                sequence_type_id INTEGER NOT NULL REFERENCES SequenceType(id) ON DELETE CASCADE,
                location INTEGER NOT NULL,
                UNIQUE (sequence_type_id, location)
            ) STRICT;

            CREATE INDEX LocationIndex ON SequenceTypeLocation(location);"
        ).map_err(Error::schema)
    }

    fn insert_tags(table: &AnnotationTable, groups: &[TypeGroup], connection: &mut Connection) -> rusqlite::Result<()> {
        let locations = groups.iter().fold(0usize, |sum, group| sum.saturating_add(group.len()));

        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)"
            )?;
            insert.execute((Self::KEY_VERSION, Self::VERSION))?;
            insert.execute((Self::KEY_SEQUENCES, table.sequences().len().to_string()))?;
            insert.execute((Self::KEY_TYPES, groups.len().to_string()))?;
            insert.execute((Self::KEY_LOCATIONS, locations.to_string()))?;
        }
        transaction.commit()?;

        debug!("Inserted header for {} sequences, {} types, and {} locations", table.sequences().len(), groups.len(), locations);
        Ok(())
    }

    fn insert_sequences(table: &AnnotationTable, connection: &mut Connection) -> rusqlite::Result<()> {
        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Sequence(id, name) VALUES (?1, ?2)"
            )?;
            for (offset, sequence) in table.sequences().iter().enumerate() {
                insert.execute((offset + 1, &sequence.name))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        info!("Inserted {} sequences", inserted);
        Ok(())
    }

    fn insert_types(groups: &[TypeGroup], connection: &mut Connection) -> rusqlite::Result<()> {
        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO SequenceType(id, sequence_id, name) VALUES (?1, ?2, ?3)"
            )?;
            for group in groups.iter() {
                insert.execute((group.handle, group.sequence_handle, &group.name))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        info!("Inserted {} annotation types", inserted);
        Ok(())
    }

    fn insert_locations(groups: &[TypeGroup], connection: &mut Connection) -> rusqlite::Result<()> {
        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO SequenceTypeLocation(sequence_type_id, location) VALUES (?1, ?2)"
            )?;
            for group in groups.iter() {
                for location in group.locations() {
                    insert.execute((group.handle, location))?;
                    inserted += 1;
                }
            }
        }
        transaction.commit()?;

        info!("Inserted {} locations", inserted);
        Ok(())
    }
}

//-----------------------------------------------------------------------------

// Executes the statement, which is expected to return a single string value.
// Then returns the value.
fn get_string_value(statement: &mut Statement, key: &str) -> Result<String> {
    let result: rusqlite::Result<String> = statement.query_row(
        (key,),
        |row| row.get(0)
    );
    result.map_err(|x| Error::Schema(format!("Key not found: {} ({})", key, x)))
}

// Executes the statement, which is expected to return a single string value.
// Then returns the value as an integer.
fn get_numeric_value(statement: &mut Statement, key: &str) -> Result<usize> {
    let value = get_string_value(statement, key)?;
    value.parse::<usize>().map_err(|x| Error::Schema(format!("Invalid value for key {}: {}", key, x)))
}

//-----------------------------------------------------------------------------
