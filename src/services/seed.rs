//! Startup bootstrap and demo data
//!
//! When the store is empty a batch of fake books is written to it; the
//! mirror is then built from whatever the store holds.

use std::collections::HashSet;

use rand::{distributions::Alphanumeric, seq::SliceRandom, Rng};

use crate::{
    catalog::CatalogMirror,
    config::SeedConfig,
    error::{AppError, AppResult},
    models::Book,
    repository::CatalogStore,
};

use super::auth::AuthService;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Boris", "Clara", "Dmitri", "Elena", "Felix", "Greta", "Hugo", "Irene", "Jonas",
    "Katya", "Leon", "Mira", "Nikolai", "Olga", "Pavel",
];

const LAST_NAMES: &[&str] = &[
    "Orlova", "Weiss", "Marsh", "Petrov", "Lindqvist", "Moreau", "Sokolov", "Hart", "Brandt",
    "Novak", "Castell", "Ivers",
];

/// Demo usernames are a first name plus a number in this range.
const USERNAME_SUFFIXES: std::ops::Range<u32> = 100..10_000;

/// Registration attempts allowed per requested account.
const ATTEMPTS_PER_ACCOUNT: u32 = 8;

const ADJECTIVES: &[&str] = &[
    "Silent", "Hidden", "Northern", "Last", "Crimson", "Quiet", "Endless", "Broken", "Golden",
    "Distant", "Winter", "Restless",
];

const NOUNS: &[&str] = &[
    "River", "Garden", "Harbor", "Letter", "Orchard", "Lantern", "Station", "Archive", "Voyage",
    "Mirror", "Forest", "Bridge",
];

/// Seed the store when it is empty, then build the mirror from it.
pub async fn bootstrap_catalog(store: &dyn CatalogStore, seed: &SeedConfig) -> AppResult<CatalogMirror> {
    let mut books = store.list_books().await?;

    if books.is_empty() && seed.books > 0 {
        let generated = generate_books(seed.books, seed.authors, &mut rand::thread_rng())?;
        for book in &generated {
            store.insert_book(book).await?;
        }
        tracing::info!(books = generated.len(), "Seeded empty catalog");
        books = generated;
    }

    tracing::info!(books = books.len(), "Catalog loaded");
    Ok(CatalogMirror::from_books(books))
}

/// Books with indices `1..=count` and titles unique per author.
pub fn generate_books<R: Rng>(count: u32, authors: u32, rng: &mut R) -> AppResult<Vec<Book>> {
    let count = i32::try_from(count).map_err(|_| {
        AppError::Validation(format!("Cannot seed {} books: index out of range", count))
    })?;

    let authors: Vec<String> = (0..authors.max(1)).map(|_| fake_name(rng)).collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut books = Vec::with_capacity(count as usize);

    for index in 1..=count {
        let author = authors[rng.gen_range(0..authors.len())].clone();
        let mut title = fake_title(rng);
        let mut attempt = 2;
        while !seen.insert((title.clone(), author.clone())) {
            title = format!("{} {}", fake_title(rng), attempt);
            attempt += 1;
        }
        books.push(Book::new(index, title, author));
    }
    Ok(books)
}

/// How many accounts to create and how many registrations to try.
fn account_budget(requested: u32) -> (u32, u32) {
    let space = FIRST_NAMES.len() as u32 * USERNAME_SUFFIXES.len() as u32;
    let target = requested.min(space);
    (target, target.saturating_mul(ATTEMPTS_PER_ACCOUNT))
}

/// Register demo accounts; returns their usernames.
///
/// Stops early, with a warning, when random usernames keep colliding.
pub async fn seed_accounts(auth: &AuthService, count: u32) -> AppResult<Vec<String>> {
    let (target, attempts) = account_budget(count);
    if target < count {
        tracing::warn!(requested = count, target, "Too many demo accounts requested");
    }
    let mut created = Vec::with_capacity(target as usize);

    for _ in 0..attempts {
        if created.len() >= target as usize {
            break;
        }
        let (username, password) = {
            let mut rng = rand::thread_rng();
            let username = format!(
                "{}{}",
                FIRST_NAMES.choose(&mut rng).unwrap_or(&"reader").to_lowercase(),
                rng.gen_range(USERNAME_SUFFIXES)
            );
            let password: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(10)
                .map(char::from)
                .collect();
            (username, password)
        };

        // collisions are skipped
        if auth.register(&username, &password).await.is_ok() {
            tracing::debug!(%username, %password, "Created demo account");
            created.push(username);
        }
    }

    if created.len() < target as usize {
        tracing::warn!(created = created.len(), target, "Demo account seeding stopped early");
    }
    Ok(created)
}

fn fake_name<R: Rng>(rng: &mut R) -> String {
    format!(
        "{} {}",
        FIRST_NAMES.choose(rng).unwrap_or(&"Anon"),
        LAST_NAMES.choose(rng).unwrap_or(&"Author")
    )
}

fn fake_title<R: Rng>(rng: &mut R) -> String {
    format!(
        "The {} {}",
        ADJECTIVES.choose(rng).unwrap_or(&"Untitled"),
        NOUNS.choose(rng).unwrap_or(&"Book")
    )
}
