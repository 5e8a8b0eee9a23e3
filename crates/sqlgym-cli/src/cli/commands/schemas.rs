use super::{exit_codes, parse_format, parse_schema};
use crate::cli::args::SchemasArgs;
use sqlgym_core::catalog;
use sqlgym_core::model::SchemaId;
use sqlgym_core::report::Format;
use std::collections::BTreeMap;

pub fn cmd_schemas(args: SchemasArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format, &[Format::Text, Format::Json]) {
        Ok(f) => f,
        Err(e) => return Ok(e.report()),
    };
    let ids: Vec<SchemaId> = match args.schema.as_deref().map(parse_schema) {
        Some(Ok(id)) => vec![id],
        Some(Err(e)) => return Ok(e.report()),
        None => SchemaId::ALL.to_vec(),
    };

    if format == Format::Json {
        let map: BTreeMap<&str, &[catalog::TableInfo]> =
            ids.iter().map(|id| (id.as_str(), catalog::tables(*id))).collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(exit_codes::OK);
    }

    for id in ids {
        println!("{}", id);
        for t in catalog::tables(id) {
            println!("  {:<16} {}", t.table, t.description);
            println!("  {:<16} ({})", "", t.columns.join(", "));
        }
    }
    Ok(exit_codes::OK)
}
