//! Statement assembly for the generic operations.
//!
//! Everything here is pure: arguments in, [`BuiltQuery`] out.  All argument
//! checks happen here, so a failure never reaches the store.

use crate::filter::Filter;
use crate::query::{BuiltQuery, SqlBuilder, SqlValue};
use crate::repository::params::{DeleteArgs, FieldValues, ListArgs, UpdateArgs};
use crate::schema::{EntitySchema, FieldDef};
use crate::DbError;

/// `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ..] [OFFSET ..]`
pub fn select(schema: &EntitySchema, args: &ListArgs) -> Result<BuiltQuery, DbError> {
    args.validate()?;
    let filter = Filter::parse(schema, args.filter.as_ref())?;

    let mut sql = SqlBuilder::new(format!(
        "SELECT {} FROM {}",
        schema.column_list(),
        schema.table
    ));
    push_where(&mut sql, filter.as_ref());

    for (i, order) in args.order_by.iter().enumerate() {
        let field = schema.field(&order.field).ok_or_else(|| {
            DbError::validation(format!("cannot order by unknown field '{}'", order.field))
        })?;
        sql.push(if i == 0 { " ORDER BY " } else { ", " })
            .push(field.name)
            .push(" ")
            .push(order.direction.as_sql());
    }
    if let Some(limit) = args.limit {
        sql.push(" LIMIT ").push_param(SqlValue::Int(limit));
    }
    if let Some(offset) = args.offset {
        sql.push(" OFFSET ").push_param(SqlValue::Int(offset));
    }

    Ok(sql.build())
}

/// `INSERT INTO <table> (<cols>) VALUES ($1, ..) RETURNING <pk>` for one object.
pub fn insert(schema: &EntitySchema, object: &FieldValues) -> Result<BuiltQuery, DbError> {
    if object.is_empty() {
        return Err(DbError::validation("passed empty object to insert"));
    }
    let values = writable_values(schema, object)?;

    if let Some(missing) = schema
        .fields
        .iter()
        .find(|f| f.is_required() && !object.contains_key(f.name))
    {
        return Err(DbError::validation(format!(
            "missing required field '{}'",
            missing.name
        )));
    }

    let columns: Vec<&str> = values.iter().map(|(field, _)| field.name).collect();
    let mut sql = SqlBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        schema.table,
        columns.join(", ")
    ));
    for (i, (_, value)) in values.into_iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_param(value);
    }
    sql.push(") RETURNING ").push(schema.primary_key());

    Ok(sql.build())
}

/// Re-read freshly inserted rows, in insertion order.
pub fn select_by_ids(schema: &EntitySchema, ids: &[i64]) -> BuiltQuery {
    let pk = schema.primary_key();
    let mut sql = SqlBuilder::new(format!(
        "SELECT {} FROM {} WHERE {pk} = ANY(",
        schema.column_list(),
        schema.table
    ));
    sql.push_param(SqlValue::IntArray(ids.to_vec()))
        .push(") ORDER BY ")
        .push(pk);
    sql.build()
}

/// `UPDATE <table> SET col = $1, .. [WHERE ..] RETURNING <columns>`
///
/// Updates always return the rows they touched, filtered or not.
pub fn update(schema: &EntitySchema, args: &UpdateArgs) -> Result<BuiltQuery, DbError> {
    args.validate()?;
    let values = writable_values(schema, &args.set)?;
    let filter = Filter::parse(schema, args.filter.as_ref())?;

    let mut sql = SqlBuilder::new(format!("UPDATE {} SET ", schema.table));
    for (i, (field, value)) in values.into_iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push(field.name).push(" = ").push_param(value);
    }
    push_where(&mut sql, filter.as_ref());
    sql.push(" RETURNING ").push(&schema.column_list());

    Ok(sql.build())
}

/// `DELETE FROM <table> [WHERE ..]`
pub fn delete(schema: &EntitySchema, args: &DeleteArgs) -> Result<BuiltQuery, DbError> {
    let filter = Filter::parse(schema, args.filter.as_ref())?;

    let mut sql = SqlBuilder::new(format!("DELETE FROM {}", schema.table));
    push_where(&mut sql, filter.as_ref());

    Ok(sql.build())
}

fn push_where(sql: &mut SqlBuilder, filter: Option<&Filter>) {
    if let Some(filter) = filter {
        sql.push(" WHERE ");
        filter.render(sql);
    }
}

/// Check every key against the schema and convert its value.
///
/// The result follows schema declaration order, not the caller's key order.
fn writable_values(
    schema: &EntitySchema,
    object: &FieldValues,
) -> Result<Vec<(&'static FieldDef, SqlValue)>, DbError> {
    for key in object.keys() {
        match schema.field(key) {
            None => {
                return Err(DbError::validation(format!(
                    "unknown field '{key}' for entity '{}'",
                    schema.name
                )))
            }
            Some(field) if field.read_only => {
                return Err(DbError::validation(format!("field '{key}' is read-only")))
            }
            Some(_) => {}
        }
    }

    schema
        .fields
        .iter()
        .filter_map(|field| object.get(field.name).map(|value| (field, value)))
        .map(|(field, value)| {
            schema
                .to_sql_value(field, value)
                .map(|converted| (field, converted))
                .map_err(|e| DbError::Validation(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::params::{OrderBy, SortDirection};
    use crate::schema::BOOK_SCHEMA;
    use serde_json::{json, Value};

    fn object(value: Value) -> FieldValues {
        value.as_object().cloned().expect("json object")
    }

    #[test]
    fn list_without_filter_has_no_where() {
        let q = select(&BOOK_SCHEMA, &ListArgs::default()).unwrap();
        assert_eq!(q.sql, "SELECT id, title, author, year FROM books");
        assert!(q.params.is_empty());
    }

    #[test]
    fn list_with_filter_ordering_and_paging() {
        let args = ListArgs {
            filter: Some(json!({ "year": { "_lt": 1970 } })),
            order_by: vec![
                OrderBy { field: "year".into(), direction: SortDirection::Desc },
                OrderBy { field: "id".into(), direction: SortDirection::Asc },
            ],
            limit: Some(10),
            offset: Some(20),
        };
        let q = select(&BOOK_SCHEMA, &args).unwrap();
        assert_eq!(
            q.sql,
            "SELECT id, title, author, year FROM books WHERE year < $1 \
             ORDER BY year DESC, id ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            q.params,
            vec![SqlValue::Int(1970), SqlValue::Int(10), SqlValue::Int(20)]
        );
    }

    #[test]
    fn list_rejects_unknown_order_field() {
        let args = ListArgs {
            order_by: vec![OrderBy { field: "isbn".into(), direction: SortDirection::Asc }],
            ..ListArgs::default()
        };
        assert!(matches!(select(&BOOK_SCHEMA, &args), Err(DbError::Validation(_))));
    }

    #[test]
    fn list_surfaces_filter_errors() {
        let args = ListArgs::filtered(json!({ "pages": { "_gt": 100 } }));
        assert!(matches!(select(&BOOK_SCHEMA, &args), Err(DbError::Filter(_))));
    }

    #[test]
    fn insert_binds_every_value() {
        let q = insert(
            &BOOK_SCHEMA,
            &object(json!({ "year": 1965, "title": "Dune", "author": "Herbert" })),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO books (title, author, year) VALUES ($1, $2, $3) RETURNING id"
        );
        assert_eq!(
            q.params,
            vec![
                SqlValue::Text("Dune".into()),
                SqlValue::Text("Herbert".into()),
                SqlValue::Int(1965),
            ]
        );
    }

    #[test]
    fn insert_keeps_quotes_out_of_sql() {
        let q = insert(
            &BOOK_SCHEMA,
            &object(json!({ "title": "O'Brien's Tale", "author": "x", "year": 1 })),
        )
        .unwrap();
        assert!(!q.sql.contains("O'Brien"));
        assert_eq!(q.params[0], SqlValue::Text("O'Brien's Tale".into()));
    }

    #[test]
    fn insert_validates_object_shape() {
        let missing = insert(&BOOK_SCHEMA, &object(json!({ "title": "Dune", "year": 1965 })));
        assert!(matches!(missing, Err(DbError::Validation(msg)) if msg.contains("author")));

        let read_only = insert(
            &BOOK_SCHEMA,
            &object(json!({ "id": 5, "title": "Dune", "author": "Herbert", "year": 1965 })),
        );
        assert!(matches!(read_only, Err(DbError::Validation(msg)) if msg.contains("read-only")));

        let unknown = insert(
            &BOOK_SCHEMA,
            &object(json!({ "isbn": "x", "title": "Dune", "author": "Herbert", "year": 1965 })),
        );
        assert!(matches!(unknown, Err(DbError::Validation(msg)) if msg.contains("isbn")));

        let wrong_type = insert(
            &BOOK_SCHEMA,
            &object(json!({ "title": "Dune", "author": "Herbert", "year": "1965" })),
        );
        assert!(matches!(wrong_type, Err(DbError::Validation(_))));

        assert!(matches!(
            insert(&BOOK_SCHEMA, &FieldValues::new()),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn reselect_by_ids() {
        let q = select_by_ids(&BOOK_SCHEMA, &[3, 4]);
        assert_eq!(
            q.sql,
            "SELECT id, title, author, year FROM books WHERE id = ANY($1) ORDER BY id"
        );
        assert_eq!(q.params, vec![SqlValue::IntArray(vec![3, 4])]);
    }

    #[test]
    fn update_numbers_filter_params_after_set_params() {
        let args = UpdateArgs {
            set: object(json!({ "year": 1966, "title": "Dune Messiah" })),
            filter: Some(json!({ "id": { "_eq": 1 } })),
        };
        let q = update(&BOOK_SCHEMA, &args).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE books SET title = $1, year = $2 WHERE id = $3 \
             RETURNING id, title, author, year"
        );
        assert_eq!(
            q.params,
            vec![
                SqlValue::Text("Dune Messiah".into()),
                SqlValue::Int(1966),
                SqlValue::Int(1),
            ]
        );
    }

    #[test]
    fn update_without_filter_still_returns_rows() {
        let args = UpdateArgs {
            set: object(json!({ "year": 2000 })),
            filter: None,
        };
        let q = update(&BOOK_SCHEMA, &args).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE books SET year = $1 RETURNING id, title, author, year"
        );
    }

    #[test]
    fn update_rejects_empty_and_read_only_sets() {
        assert!(matches!(
            update(&BOOK_SCHEMA, &UpdateArgs::default()),
            Err(DbError::Validation(_))
        ));

        let args = UpdateArgs {
            set: object(json!({ "id": 9 })),
            filter: None,
        };
        assert!(matches!(update(&BOOK_SCHEMA, &args), Err(DbError::Validation(_))));
    }

    #[test]
    fn delete_with_and_without_filter() {
        let q = delete(&BOOK_SCHEMA, &DeleteArgs::default()).unwrap();
        assert_eq!(q.sql, "DELETE FROM books");

        let q = delete(
            &BOOK_SCHEMA,
            &DeleteArgs { filter: Some(json!({ "year": { "_lt": 1970 } })) },
        )
        .unwrap();
        assert_eq!(q.sql, "DELETE FROM books WHERE year < $1");
        assert_eq!(q.params, vec![SqlValue::Int(1970)]);
    }
}
