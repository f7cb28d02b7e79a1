//! Unfiltered delete wipes the table, so it lives in its own test binary.

mod common;

use common::{book, insert_args, repository, unique_author};
use db::repository::{DeleteArgs, ListArgs};
use db::BookStore;

#[tokio::test]
#[ignore = "requires database"]
async fn delete_without_filter_removes_every_row() {
    let repo = repository().await;
    let author = unique_author("delete-all");
    repo.insert(insert_args(vec![
        book("Dune", &author, 1965),
        book("Hyperion", &author, 1989),
    ]))
    .await
    .expect("insert failed");

    let before = repo.list(ListArgs::default()).await.expect("list failed");
    let result = repo.delete(DeleteArgs::default()).await.expect("delete failed");

    assert_eq!(result.affected_rows, before.len() as u64);
    assert!(result.returning.is_none());
    assert!(repo.list(ListArgs::default()).await.unwrap().is_empty());
}
