//! Lending flows against an in-memory store

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use lending_server::{
    catalog::{mirror::Placement, CatalogMirror},
    error::AppError,
    models::Book,
    services::{catalog::CatalogService, lending::LendingCoordinator},
};

use common::MemoryStore;

fn setup(books: Vec<Book>) -> (Arc<MemoryStore>, Arc<CatalogMirror>, LendingCoordinator) {
    let store = Arc::new(MemoryStore::with_books(books.clone()));
    let mirror = Arc::new(CatalogMirror::from_books(books));
    let lending = LendingCoordinator::new(store.clone(), mirror.clone());
    (store, mirror, lending)
}

#[tokio::test]
async fn test_take_then_return_restores_state() {
    let (store, mirror, lending) = setup(vec![Book::new(5, "Dune", "Ann")]);

    let taken = lending.checkout(5, None, "u1").await.unwrap();
    assert!(taken.blocked);
    assert_eq!(taken.take_count, 1);
    assert!(mirror.available().await.is_empty());
    assert_eq!(mirror.loans_of("u1").await, vec![taken.clone()]);
    assert!(store.row("Ann", 5).await.unwrap().blocked);

    let returned = lending.return_book(5, None, "u1").await.unwrap();
    assert!(!returned.blocked);
    assert!(mirror.loans_of("u1").await.is_empty());
    assert_eq!(mirror.available().await.len(), 1);

    let row = store.row("Ann", 5).await.unwrap();
    assert!(!row.blocked);
    assert_eq!(row.take_count, 1);
    assert_eq!(mirror.available().await[0].take_count, 1);
}

#[tokio::test]
async fn test_take_count_follows_store_across_cycles() {
    let (store, mirror, lending) = setup(vec![Book::new(5, "Dune", "Ann")]);

    for cycle in 1..=3 {
        let taken = lending.checkout(5, None, "u1").await.unwrap();
        assert_eq!(taken.take_count, cycle);
        assert_eq!(mirror.loans_of("u1").await[0].take_count, cycle);

        let returned = lending.return_book(5, None, "u1").await.unwrap();
        assert_eq!(returned.take_count, cycle);
    }

    assert_eq!(mirror.available().await[0].take_count, 3);
    assert_eq!(store.row("Ann", 5).await.unwrap().take_count, 3);
}

#[tokio::test]
async fn test_second_checkout_conflicts() {
    let (_store, mirror, lending) = setup(vec![Book::new(5, "Dune", "Ann")]);

    lending.checkout(5, None, "u1").await.unwrap();
    let err = lending.checkout(5, None, "u2").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(mirror.loans_of("u2").await.is_empty());
}

#[tokio::test]
async fn test_unknown_index_conflicts() {
    let (_store, _mirror, lending) = setup(vec![Book::new(1, "Dune", "Ann")]);

    let err = lending.checkout(42, None, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_return_by_non_holder_is_not_found() {
    let (store, mirror, lending) = setup(vec![Book::new(5, "Dune", "Ann")]);

    lending.checkout(5, None, "u1").await.unwrap();
    let err = lending.return_book(5, None, "u2").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(mirror.loans_of("u1").await.len(), 1);
    assert!(store.row("Ann", 5).await.unwrap().blocked);
}

#[tokio::test]
async fn test_shared_index_is_addressed_by_author() {
    let (store, mirror, lending) = setup(vec![
        Book::new(1, "Dune", "Ann"),
        Book::new(1, "Emma", "Bob"),
    ]);

    let err = lending.checkout(1, None, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(mirror.available().await.len(), 2);

    let bob = lending.checkout(1, Some("Bob"), "u1").await.unwrap();
    assert_eq!(bob.title, "Emma");
    assert!(!store.row("Ann", 1).await.unwrap().blocked);

    let err = lending.checkout(1, Some("Bob"), "u2").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    lending.checkout(1, Some("Ann"), "u1").await.unwrap();
    let err = lending.return_book(1, None, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let returned = lending.return_book(1, Some("Ann"), "u1").await.unwrap();
    assert_eq!(returned.author, "Ann");

    let snapshot = mirror.snapshot().await;
    assert_eq!(snapshot.holder_of("Ann", 1), Some(Placement::Available));
    assert_eq!(snapshot.holder_of("Bob", 1), Some(Placement::Lent("u1")));
    assert!(!store.row("Ann", 1).await.unwrap().blocked);
    assert!(store.row("Bob", 1).await.unwrap().blocked);
}

#[tokio::test]
async fn test_concurrent_checkouts_of_shared_index_lend_once() {
    let (store, mirror, lending) = setup(vec![
        Book::new(1, "Dune", "Ann"),
        Book::new(1, "Emma", "Bob"),
    ]);

    let mut handles = Vec::new();
    for n in 0..16 {
        let lending = lending.clone();
        handles.push(tokio::spawn(async move {
            lending.checkout(1, Some("Ann"), &format!("user{}", n)).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(book) => {
                assert_eq!(book.author, "Ann");
                winners += 1;
            }
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);

    let snapshot = mirror.snapshot().await;
    assert_eq!(snapshot.holder_of("Bob", 1), Some(Placement::Available));
    assert_eq!(store.row("Ann", 1).await.unwrap().take_count, 1);
    assert_eq!(store.row("Bob", 1).await.unwrap().take_count, 0);
}

#[tokio::test]
async fn test_books_lent_before_startup_stay_unavailable() {
    let mut lent = Book::new(2, "Emma", "Ann");
    lent.blocked = true;
    let (_store, mirror, lending) = setup(vec![Book::new(1, "Dune", "Ann"), lent]);

    let err = lending.checkout(2, None, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = lending.return_book(2, None, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let snapshot = mirror.snapshot().await;
    assert_eq!(snapshot.holder_of("Ann", 2), Some(Placement::Unattributed));
}

#[tokio::test]
async fn test_concurrent_checkouts_lend_once() {
    let (store, mirror, lending) = setup(vec![Book::new(7, "Dune", "Ann")]);

    let mut handles = Vec::new();
    for n in 0..16 {
        let lending = lending.clone();
        handles.push(tokio::spawn(async move {
            lending.checkout(7, None, &format!("user{}", n)).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);

    let snapshot = mirror.snapshot().await;
    let held: usize = snapshot.loans.values().map(Vec::len).sum();
    assert_eq!(held, 1);
    assert!(snapshot.available.is_empty());
    assert_eq!(store.row("Ann", 7).await.unwrap().take_count, 1);
}

#[tokio::test]
async fn test_concurrent_mixed_traffic_keeps_each_copy_in_one_place() {
    let books: Vec<Book> = (1..=6)
        .flat_map(|i| {
            [
                Book::new(i, format!("Ann {i}"), "Ann"),
                Book::new(i, format!("Bob {i}"), "Bob"),
            ]
        })
        .collect();
    let (_store, mirror, lending) = setup(books);

    let mut handles = Vec::new();
    for n in 0..24 {
        let lending = lending.clone();
        handles.push(tokio::spawn(async move {
            let username = format!("user{}", n % 4);
            let index = (n % 6) + 1;
            let author = if n % 2 == 0 { "Ann" } else { "Bob" };
            if lending.checkout(index, Some(author), &username).await.is_ok() && n % 3 == 0 {
                let _ = lending.return_book(index, Some(author), &username).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = mirror.snapshot().await;
    let mut seen = HashSet::new();
    let copies = snapshot
        .available
        .iter()
        .chain(snapshot.loans.values().flatten())
        .chain(snapshot.unattributed.iter());
    for book in copies {
        assert!(
            seen.insert((book.author.clone(), book.index)),
            "{} #{} appears twice",
            book.author,
            book.index
        );
    }
    assert_eq!(seen.len(), 12);
    for (username, loans) in &snapshot.loans {
        assert!(!loans.is_empty(), "{username} has an empty loan list");
        assert!(loans.iter().all(|b| b.blocked));
    }
    assert!(snapshot.available.iter().all(|b| !b.blocked));
}

#[tokio::test]
async fn test_authors_listed_once_in_first_seen_order() {
    let store = Arc::new(MemoryStore::default());
    let mirror = Arc::new(CatalogMirror::new());
    let catalog = CatalogService::new(store, mirror.clone());

    catalog.add_book("Dune", "Ann").await.unwrap();
    catalog.add_book("Emma", "Bob").await.unwrap();
    catalog.add_book("Ulysses", "Ann").await.unwrap();

    assert_eq!(catalog.list_authors().await, vec!["Ann", "Bob"]);
    assert_eq!(mirror.scan_authors().await, mirror.snapshot().await.authors);
}

#[tokio::test]
async fn test_added_books_take_smallest_free_index_per_author() {
    let books = vec![Book::new(1, "Dune", "Ann"), Book::new(3, "Emma", "Ann")];
    let store = Arc::new(MemoryStore::with_books(books.clone()));
    let mirror = Arc::new(CatalogMirror::from_books(books));
    let catalog = CatalogService::new(store.clone(), mirror);

    let second = catalog.add_book("Ulysses", "Ann").await.unwrap();
    assert_eq!(second.index, 2);
    let fourth = catalog.add_book("Walden", "Ann").await.unwrap();
    assert_eq!(fourth.index, 4);
    let other = catalog.add_book("Beloved", "Bob").await.unwrap();
    assert_eq!(other.index, 1);

    assert!(store.row("Ann", 2).await.is_some());
    let err = catalog.add_book("Dune", "Ann").await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
}
