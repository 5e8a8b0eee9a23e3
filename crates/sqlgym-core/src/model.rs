use crate::errors::GymError;
use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_POOL_SIZE: usize = 2;
pub const DEFAULT_MAX_TOTAL_INSTANCES: usize = 10;
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;

/// ISO-8601 with millisecond precision and a UTC designator.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GymConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "is_default_settings")]
    pub settings: Settings,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

impl GymConfig {
    pub fn challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    /// Challenges matching every given filter; `None` means "any".
    pub fn filter(&self, concept: Option<&str>, difficulty: Option<Difficulty>) -> Vec<&Challenge> {
        self.challenges
            .iter()
            .filter(|c| {
                concept.map_or(true, |wanted| {
                    c.concepts.iter().any(|k| k.eq_ignore_ascii_case(wanted))
                })
            })
            .filter(|c| difficulty.map_or(true, |d| c.difficulty == d))
            .collect()
    }
}

fn is_default_settings(s: &Settings) -> bool {
    s == &Settings::default()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub pool: PoolSettings,
    /// `0` disables the timeout; absent means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_timeout_ms: Option<u64>,
    #[serde(default)]
    pub column_matching: ColumnMatching,
}

impl Settings {
    pub fn statement_timeout(&self) -> Option<Duration> {
        match self
            .statement_timeout_ms
            .unwrap_or(DEFAULT_STATEMENT_TIMEOUT_MS)
        {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolSettings {
    /// Idle instances kept per schema.
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,
    /// Ceiling on idle + checked-out instances across every schema.
    #[serde(default = "default_max_total_instances")]
    pub max_total_instances: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            max_total_instances: DEFAULT_MAX_TOTAL_INSTANCES,
        }
    }
}

fn default_max_pool_size() -> usize {
    DEFAULT_MAX_POOL_SIZE
}

fn default_max_total_instances() -> usize {
    DEFAULT_MAX_TOTAL_INSTANCES
}

/// How result columns line up when two tables are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatching {
    /// Compare positional value tuples; field names are ignored.
    #[default]
    Values,
    /// Require the same field names and compare values by name, in any column order.
    Named,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaId {
    Employees,
    Ecommerce,
    Movies,
}

impl SchemaId {
    pub const ALL: [SchemaId; 3] = [SchemaId::Employees, SchemaId::Ecommerce, SchemaId::Movies];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaId::Employees => "employees",
            SchemaId::Ecommerce => "ecommerce",
            SchemaId::Movies => "movies",
        }
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaId {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GymError::UnknownSchema(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub points: u32,
    pub database: SchemaId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub starter_sql: String,
    pub solution_sql: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<String>,
}

/// A single cell as produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Text from a DATE/DATETIME/TIMESTAMP column that parsed as a date.
    Timestamp(NaiveDateTime),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(ISO_FORMAT)),
            Value::Blob(bytes) => bytes.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(ISO_FORMAT)),
            Value::Blob(bytes) => {
                f.write_str("x'")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                f.write_str("'")
            }
        }
    }
}

pub type Row = Vec<Value>;

/// Field names plus rows whose values line up with `fields`.
///
/// Serialized as `{"fields": [...], "rows": [{field: value, ...}, ...]}` with
/// row keys in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableResult {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct RowMap<'a> {
    fields: &'a [String],
    values: &'a [Value],
}

impl Serialize for RowMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for TableResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<RowMap<'_>> = self
            .rows
            .iter()
            .map(|values| RowMap {
                fields: &self.fields,
                values,
            })
            .collect();
        let mut st = serializer.serialize_struct("TableResult", 2)?;
        st.serialize_field("fields", &self.fields)?;
        st.serialize_field("rows", &rows)?;
        st.end()
    }
}

/// Terminal outcome of a validated run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        matches: bool,
        actual: TableResult,
        expected: TableResult,
        duration_ms: u64,
    },
    Failed {
        error: String,
    },
}

impl RunOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, RunOutcome::Completed { matches: true, .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RunOutcome::Failed { error } => Some(error),
            RunOutcome::Completed { .. } => None,
        }
    }
}

/// Outcome of a freeform run: a table on success, an error otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct PlaygroundResult {
    pub sql: String,
    pub result: Option<TableResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_id_parse() {
        assert_eq!("employees".parse::<SchemaId>().unwrap(), SchemaId::Employees);
        assert_eq!(" Movies ".parse::<SchemaId>().unwrap(), SchemaId::Movies);

        let err = "payroll".parse::<SchemaId>().unwrap_err();
        assert!(matches!(err, GymError::UnknownSchema(ref s) if s == "payroll"));
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn test_statement_timeout_zero_disables() {
        let mut s = Settings::default();
        assert_eq!(
            s.statement_timeout(),
            Some(Duration::from_millis(DEFAULT_STATEMENT_TIMEOUT_MS))
        );
        s.statement_timeout_ms = Some(0);
        assert_eq!(s.statement_timeout(), None);
        s.statement_timeout_ms = Some(250);
        assert_eq!(s.statement_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_table_result_serializes_rows_as_ordered_maps() {
        let t = TableResult {
            fields: vec!["name".into(), "price".into()],
            rows: vec![vec![Value::Text("Lamp".into()), Value::Real(59.5)]],
        };
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(
            json,
            r#"{"fields":["name","price"],"rows":[{"name":"Lamp","price":59.5}]}"#
        );
    }

    #[test]
    fn test_run_outcome_serialization_is_tagged() {
        let failed = RunOutcome::Failed {
            error: "near \"SELEC\": syntax error".into(),
        };
        let v = serde_json::to_value(&failed).unwrap();
        assert_eq!(v["status"], "failed");
        assert!(!failed.is_match());
        assert!(failed.error().is_some());
    }

    #[test]
    fn test_timestamp_renders_iso() {
        let ts = chrono::NaiveDate::from_ymd_opt(2015, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2015-03-01T00:00:00.000Z");
        assert_eq!(
            serde_json::to_string(&Value::Timestamp(ts)).unwrap(),
            "\"2015-03-01T00:00:00.000Z\""
        );
    }
}
