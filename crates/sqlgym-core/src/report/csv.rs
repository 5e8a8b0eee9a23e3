use crate::model::TableResult;
use anyhow::bail;

/// RFC 4180 style CSV with a header line. Nulls are written as empty cells.
pub fn to_csv(table: &TableResult) -> anyhow::Result<String> {
    if table.fields.is_empty() || table.is_empty() {
        bail!("no rows to export");
    }

    let mut out = String::new();
    let header: Vec<String> = table.fields.iter().map(|f| escape(f)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| {
                if v.is_null() {
                    String::new()
                } else {
                    escape(&v.to_string())
                }
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    Ok(out)
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_csv_escaping() {
        let t = TableResult {
            fields: vec!["name".into(), "note".into()],
            rows: vec![
                vec![Value::Text("Lamp, brass".into()), Value::Text("say \"hi\"".into())],
                vec![Value::Integer(3), Value::Null],
                vec![Value::Text("two\nlines".into()), Value::Real(1.5)],
            ],
        };
        let csv = to_csv(&t).unwrap();
        assert_eq!(
            csv,
            "name,note\n\"Lamp, brass\",\"say \"\"hi\"\"\"\n3,\n\"two\nlines\",1.5\n"
        );
    }

    #[test]
    fn test_empty_result_rejected() {
        let t = TableResult {
            fields: vec!["x".into()],
            rows: vec![],
        };
        let err = to_csv(&t).unwrap_err();
        assert_eq!(err.to_string(), "no rows to export");
        assert!(to_csv(&TableResult::empty()).is_err());
    }
}
