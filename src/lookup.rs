use std::fmt;

use anyhow::anyhow;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};
use tracing::debug;

use crate::{
    entities::{director, genre, role},
    error::AppResult,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NamedTable {
    Director,
    Genre,
    Role,
}

impl fmt::Display for NamedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NamedTable::Director => "director",
            NamedTable::Genre => "genre",
            NamedTable::Role => "role",
        })
    }
}

pub async fn find_id<C: ConnectionTrait>(
    conn: &C,
    table: NamedTable,
    name: &str,
) -> AppResult<Option<i32>> {
    let id = match table {
        NamedTable::Director => {
            director::Entity::find()
                .select_only()
                .column(director::Column::Id)
                .filter(director::Column::Name.eq(name))
                .into_tuple::<i32>()
                .one(conn)
                .await?
        },
        NamedTable::Genre => {
            genre::Entity::find()
                .select_only()
                .column(genre::Column::Id)
                .filter(genre::Column::Name.eq(name))
                .into_tuple::<i32>()
                .one(conn)
                .await?
        },
        NamedTable::Role => {
            role::Entity::find()
                .select_only()
                .column(role::Column::Id)
                .filter(role::Column::RoleType.eq(name))
                .into_tuple::<i32>()
                .one(conn)
                .await?
        },
    };
    Ok(id)
}

pub async fn resolve_or_create<C: ConnectionTrait>(
    conn: &C,
    table: NamedTable,
    name: &str,
) -> AppResult<i32> {
    if let Some(id) = find_id(conn, table, name).await? {
        return Ok(id);
    }

    let inserted = match table {
        NamedTable::Director => {
            let model = director::ActiveModel { name: Set(name.to_string()), ..Default::default() };
            director::Entity::insert(model)
                .on_conflict(OnConflict::column(director::Column::Name).do_nothing().to_owned())
                .exec_without_returning(conn)
                .await?
        },
        NamedTable::Genre => {
            let model = genre::ActiveModel { name: Set(name.to_string()), ..Default::default() };
            genre::Entity::insert(model)
                .on_conflict(OnConflict::column(genre::Column::Name).do_nothing().to_owned())
                .exec_without_returning(conn)
                .await?
        },
        NamedTable::Role => {
            let model = role::ActiveModel { role_type: Set(name.to_string()), ..Default::default() };
            role::Entity::insert(model)
                .on_conflict(OnConflict::column(role::Column::RoleType).do_nothing().to_owned())
                .exec_without_returning(conn)
                .await?
        },
    };
    debug!(%table, name, inserted, "created named row");

    // re-read rather than trusting the insert result, which is 0 when a
    // concurrent writer won the conflict
    find_id(conn, table, name)
        .await?
        .ok_or_else(|| anyhow!("{table} {name:?} missing after insert").into())
}
