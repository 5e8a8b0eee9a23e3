use crate::catalog;
use crate::errors::GymError;
use crate::model::{SchemaId, TableResult, Value};
use crate::normalize::parse_temporal;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, InterruptHandle, Statement};

/// One in-memory SQLite database.
///
/// `schema` records the last seed applied; it goes stale the moment a user
/// statement runs and is only trusted again after `reset` + `seed`.
pub struct EngineInstance {
    id: u64,
    conn: Connection,
    schema: Option<SchemaId>,
}

impl std::fmt::Debug for EngineInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineInstance")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .finish()
    }
}

impl EngineInstance {
    pub fn open(id: u64) -> Result<Self, GymError> {
        Ok(Self {
            id,
            conn: fresh_connection()?,
            schema: None,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn schema(&self) -> Option<SchemaId> {
        self.schema
    }

    /// Return the database to a blank state by swapping in a new connection.
    ///
    /// Session state (pragmas, attached databases, temp objects, open
    /// transactions, registered functions) dies with the old connection.
    pub fn reset(&mut self) -> Result<(), GymError> {
        self.schema = None;
        let old = std::mem::replace(&mut self.conn, fresh_connection()?);
        old.close().map_err(|(_, e)| GymError::Engine(e))
    }

    pub fn seed(&mut self, schema: SchemaId) -> Result<(), GymError> {
        self.conn.execute_batch(catalog::seed(schema))?;
        self.schema = Some(schema);
        Ok(())
    }

    /// Run every `;`-separated statement in order, returning one table per statement.
    ///
    /// Statements without result columns (DDL, DML) yield an empty table.
    pub fn execute(&self, sql: &str) -> Result<Vec<TableResult>, GymError> {
        let mut results = Vec::new();
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch.next()? {
            results.push(to_table_result(&mut stmt)?);
        }
        Ok(results)
    }

    /// Result of the final statement of the batch; empty when there is none.
    pub fn execute_last(&self, sql: &str) -> Result<TableResult, GymError> {
        Ok(self.execute(sql)?.pop().unwrap_or_else(TableResult::empty))
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    pub fn close(self) -> Result<(), GymError> {
        self.conn.close().map_err(|(_, e)| GymError::Engine(e))
    }
}

fn fresh_connection() -> Result<Connection, GymError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    Ok(conn)
}

fn to_table_result(stmt: &mut Statement<'_>) -> Result<TableResult, GymError> {
    let fields: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    if fields.is_empty() {
        stmt.raw_execute()?;
        return Ok(TableResult::empty());
    }

    let temporal: Vec<bool> = stmt
        .columns()
        .iter()
        .map(|c| is_temporal(c.decl_type()))
        .collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.raw_query();
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(fields.len());
        for (idx, temporal) in temporal.iter().enumerate() {
            values.push(to_value(row.get_ref(idx)?, *temporal));
        }
        rows.push(values);
    }

    Ok(TableResult { fields, rows })
}

fn is_temporal(decl_type: Option<&str>) -> bool {
    decl_type.is_some_and(|t| {
        let t = t.to_ascii_uppercase();
        t.contains("DATE") || t.contains("TIME")
    })
}

fn to_value(v: ValueRef<'_>, temporal: bool) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            match temporal.then(|| parse_temporal(&s)).flatten() {
                Some(ts) => Value::Timestamp(ts),
                None => Value::Text(s),
            }
        }
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(schema: SchemaId) -> EngineInstance {
        let mut inst = EngineInstance::open(1).unwrap();
        inst.seed(schema).unwrap();
        inst
    }

    #[test]
    fn test_execute_returns_last_statement() {
        let inst = seeded(SchemaId::Employees);
        let t = inst
            .execute_last("CREATE TABLE scratch(x INTEGER); INSERT INTO scratch VALUES (7); SELECT x FROM scratch;")
            .unwrap();
        assert_eq!(t.fields, vec!["x".to_string()]);
        assert_eq!(t.rows, vec![vec![Value::Integer(7)]]);
    }

    #[test]
    fn test_ddl_only_yields_empty_table() {
        let inst = seeded(SchemaId::Employees);
        let t = inst.execute_last("CREATE TABLE scratch(x INTEGER);").unwrap();
        assert!(t.fields.is_empty());
        assert!(t.rows.is_empty());

        let blank = inst.execute_last("   -- nothing here\n").unwrap();
        assert_eq!(blank, TableResult::empty());
    }

    #[test]
    fn test_date_columns_become_timestamps() {
        let inst = seeded(SchemaId::Employees);
        let t = inst
            .execute_last("SELECT hire_date, first_name FROM employees WHERE id = 1")
            .unwrap();
        assert!(matches!(t.rows[0][0], Value::Timestamp(_)));
        assert_eq!(t.rows[0][0].to_string(), "2015-03-01T00:00:00.000Z");
        assert_eq!(t.rows[0][1], Value::Text("Ava".into()));
    }

    #[test]
    fn test_syntax_error_surfaces_engine_message() {
        let inst = seeded(SchemaId::Movies);
        let err = inst.execute_last("SELEC title FROM movies").unwrap_err();
        assert!(matches!(err, GymError::Engine(_)));
        assert!(err.to_string().contains("syntax error"), "{}", err);
    }

    #[test]
    fn test_reset_restores_seeded_state() {
        let mut inst = seeded(SchemaId::Employees);
        inst.execute(
            "BEGIN; DELETE FROM salaries; \
             CREATE VIEW rich AS SELECT * FROM employees WHERE salary > 100000; \
             CREATE TEMP TABLE scratch(x); \
             CREATE TRIGGER no_delete BEFORE DELETE ON departments BEGIN SELECT RAISE(ABORT, 'nope'); END; \
             PRAGMA foreign_keys = OFF;",
        )
        .unwrap();
        inst.reset().unwrap();
        assert_eq!(inst.schema(), None);

        let objects = inst
            .execute_last("SELECT count(*) AS n FROM sqlite_master")
            .unwrap();
        assert_eq!(objects.rows, vec![vec![Value::Integer(0)]]);

        inst.seed(SchemaId::Employees).unwrap();
        let n = inst
            .execute_last("SELECT count(*) FROM salaries")
            .unwrap();
        assert_eq!(n.rows, vec![vec![Value::Integer(10)]]);
        let fk = inst.execute_last("PRAGMA foreign_keys").unwrap();
        assert_eq!(fk.rows, vec![vec![Value::Integer(1)]]);
    }

    #[test]
    fn test_reset_clears_session_pragmas() {
        let like = "SELECT count(*) FROM movies WHERE title LIKE 'inception'";
        let mut inst = seeded(SchemaId::Movies);
        inst.execute("PRAGMA case_sensitive_like = ON; PRAGMA recursive_triggers = ON;")
            .unwrap();
        assert_eq!(
            inst.execute_last(like).unwrap().rows,
            vec![vec![Value::Integer(0)]]
        );

        inst.reset().unwrap();
        inst.seed(SchemaId::Movies).unwrap();
        assert_eq!(
            inst.execute_last(like).unwrap().rows,
            vec![vec![Value::Integer(1)]]
        );
        let recursive = inst.execute_last("PRAGMA recursive_triggers").unwrap();
        assert_eq!(recursive.rows, vec![vec![Value::Integer(0)]]);
        assert_eq!(inst.id(), 1);
    }

    #[test]
    fn test_reset_detaches_databases() {
        let mut inst = seeded(SchemaId::Ecommerce);
        inst.execute("ATTACH DATABASE ':memory:' AS side; CREATE TABLE side.t(x);")
            .unwrap();
        inst.reset().unwrap();
        let dbs = inst.execute_last("PRAGMA database_list").unwrap();
        assert!(dbs.rows.iter().all(|r| r[1] != Value::Text("side".into())));
    }
}
