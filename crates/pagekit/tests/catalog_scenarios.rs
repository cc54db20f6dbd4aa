//! End-to-end catalog scenarios against the in-memory session.
//!
//! Every scenario runs unchanged on both built-in vocabularies: the page
//! models only know semantic locator names.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use pagekit::prelude::*;
use pagekit::vocabulary::names;
use pagekit::{sample_movies, FakeSession};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn setup(vocabulary: Vocabulary) -> (FakeSession, Arc<LocatorRegistry>) {
    pagekit::logging::init_test_tracing();
    let registry = Arc::new(vocabulary.registry().unwrap());
    let session = FakeSession::new(&registry, sample_movies());
    (session, registry)
}

fn options() -> WaitOptions {
    WaitOptions::new().with_timeout(2_000).with_poll_interval(50)
}

// === Favorites flow ===

#[tokio::test(start_paused = true)]
async fn sort_by_year_then_favorite_first_item() {
    for vocabulary in Vocabulary::ALL {
        let (session, registry) = setup(vocabulary);
        let ctx = PageContext::new(&session, registry).with_options(options());

        let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
        assert_eq!(catalog.list_visible_items().await.unwrap().len(), 6);

        catalog.sort_by(SortCriterion::Year).await.unwrap();
        let items = catalog.list_visible_items().await.unwrap();
        let newest = items[0].clone();
        assert!(
            items.iter().all(|item| newest.year >= item.year),
            "{vocabulary}: first year {} is not the newest",
            newest.year
        );

        let title = catalog.toggle_favorite(0).await.unwrap();
        assert_eq!(title, newest.title);

        let favorites = catalog.open_favorites().await.unwrap();
        assert_eq!(favorites.list_visible_items().await.unwrap(), vec![newest]);
    }
}

#[tokio::test(start_paused = true)]
async fn empty_favorites_is_an_empty_list() {
    for vocabulary in Vocabulary::ALL {
        let (session, registry) = setup(vocabulary);
        let ctx = PageContext::new(&session, registry).with_options(options());
        let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
        let favorites = catalog.open_favorites().await.unwrap();
        assert!(favorites.list_visible_items().await.unwrap().is_empty());
        assert!(favorites.item_titles().await.unwrap().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn empty_catalog_is_an_empty_list() {
    for vocabulary in Vocabulary::ALL {
        let registry = Arc::new(vocabulary.registry().unwrap());
        let session = FakeSession::new(&registry, Vec::new());
        let ctx = PageContext::new(&session, registry).with_options(options());

        let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
        assert!(catalog.list_visible_items().await.unwrap().is_empty());
        catalog.sort_by(SortCriterion::Title).await.unwrap();
        assert!(catalog.item_titles().await.unwrap().is_empty());
        catalog.sort_by(SortCriterion::Year).await.unwrap();
        assert!(catalog.item_years().await.unwrap().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn toggling_twice_restores_favorite_state() {
    let (session, registry) = setup(Vocabulary::V2);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    catalog.toggle_favorite(4).await.unwrap();
    assert_eq!(session.favorite_titles(), vec!["amélie".to_string()]);
    catalog.toggle_favorite(4).await.unwrap();
    assert!(session.favorite_titles().is_empty());

    let favorites = catalog.open_favorites().await.unwrap();
    assert!(favorites.item_titles().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn favorites_keep_insertion_order_and_survive_navigation() {
    let (session, registry) = setup(Vocabulary::V1);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    catalog.toggle_favorite("Interstellar").await.unwrap();
    catalog.add_first_to_favorites().await.unwrap();

    let favorites = catalog.open_favorites().await.unwrap();
    assert_eq!(
        favorites.item_titles().await.unwrap(),
        vec!["Interstellar".to_string(), "The Matrix".to_string()]
    );

    let catalog = favorites.open_catalog().await.unwrap();
    let detail = catalog.open_detail("Interstellar").await.unwrap();
    let summary = detail.summary().await.unwrap();
    assert_eq!(summary.year, 2014);
    assert_eq!(summary.genre, "Sci-Fi");

    let catalog = detail.back_to_catalog().await.unwrap();
    assert_eq!(catalog.item_titles().await.unwrap()[0], "The Matrix");
}

// === Sorting ===

#[tokio::test(start_paused = true)]
async fn clear_sort_restores_original_order() {
    for vocabulary in Vocabulary::ALL {
        let (session, registry) = setup(vocabulary);
        session.set_render_delay(2);
        let ctx = PageContext::new(&session, registry).with_options(options());
        let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
        let original = catalog.item_titles().await.unwrap();

        for criterion in [SortCriterion::Title, SortCriterion::Year] {
            catalog.sort_by(criterion).await.unwrap();
            assert_ne!(catalog.item_titles().await.unwrap(), original);
            catalog.sort_by(SortCriterion::None).await.unwrap();
            assert_eq!(catalog.item_titles().await.unwrap(), original);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn title_sort_ignores_case() {
    let (session, registry) = setup(Vocabulary::V1);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
    catalog.sort_by(SortCriterion::Title).await.unwrap();
    assert_eq!(
        catalog.item_titles().await.unwrap(),
        vec![
            "amélie",
            "Inception",
            "Interstellar",
            "Parasite",
            "Spirited Away",
            "The Matrix"
        ]
    );
}

// === Failure handling ===

#[tokio::test(start_paused = true)]
async fn single_rerender_is_absorbed() {
    let (session, registry) = setup(Vocabulary::V1);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    session.stale_next(1);
    catalog.sort_by(SortCriterion::Year).await.unwrap();
    assert_eq!(catalog.item_years().await.unwrap()[0], 2019);
}

#[tokio::test(start_paused = true)]
async fn repeated_staleness_surfaces() {
    let (session, registry) = setup(Vocabulary::V1);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    session.stale_next(2);
    let err = catalog.sort_by(SortCriterion::Title).await.unwrap_err();
    match err {
        PageError::StaleElement { locator, action } => {
            assert_eq!(locator, names::SORT_TITLE);
            assert_eq!(action, Action::Click);
        }
        other => panic!("expected staleness, got {other}"),
    }
    assert!(session.clicks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blocked_toggle_surfaces_without_retry() {
    let (session, registry) = setup(Vocabulary::V2);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    session.block(names::FAV_BUTTON, "overlapped by toast");
    let err = catalog.toggle_favorite(1).await.unwrap_err();
    assert!(matches!(
        err,
        PageError::InteractionBlocked {
            action: Action::Click,
            ..
        }
    ));
    assert_eq!(err.locator(), Some(names::FAV_BUTTON));
    assert!(session.favorite_titles().is_empty());

    session.unblock(names::FAV_BUTTON);
    assert_eq!(catalog.toggle_favorite(1).await.unwrap(), "Inception");
}

#[tokio::test(start_paused = true)]
async fn wrong_screen_times_out_within_window() {
    let (session, registry) = setup(Vocabulary::V1);
    let ctx = PageContext::new(&session, registry).with_options(options());

    let start = tokio::time::Instant::now();
    let err = ctx.open::<FavoritesPage<'_, _>>().await.err().unwrap();
    let elapsed = start.elapsed();

    match err {
        PageError::Timeout {
            locator, condition, ..
        } => {
            assert_eq!(locator, names::ROOT);
            assert_eq!(condition, WaitCondition::Present);
        }
        other => panic!("expected timeout, got {other}"),
    }
    assert!(elapsed >= Duration::from_millis(2_000));
    assert!(elapsed <= Duration::from_millis(2_050));

    // The session is still usable after the timeout.
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
    assert_eq!(catalog.item_titles().await.unwrap().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn toast_clears_before_toggle_returns() {
    let (session, registry) = setup(Vocabulary::V1);
    session.set_toast_polls(4);
    let ctx = PageContext::new(&session, registry).with_options(options());
    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();

    let start = tokio::time::Instant::now();
    catalog.toggle_favorite(0).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(200));
}

// === Configuration ===

#[tokio::test(start_paused = true)]
async fn registry_file_drives_the_same_scenario() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        r"groups:
  catalog:
    - {{ name: root, test_id: movie-list }}
    - {{ name: cards, test_id: movie-card }}
    - {{ name: title, css: .movie-title }}
    - {{ name: year, css: .movie-year }}
    - {{ name: genre, css: .movie-genre }}
    - {{ name: fav_button, test_id: fav-btn }}
    - {{ name: sort_title, test_id: sort-by-name-button }}
    - {{ name: sort_year, test_id: sort-by-year-button }}
    - {{ name: clear_sort, test_id: clear-sorting-button }}
    - {{ name: favorites_link, test_id: favorites-link }}
  favorites:
    - {{ name: root, test_id: favorites-list }}
    - {{ name: cards, test_id: movie-card, min_count: 0 }}
    - {{ name: title, css: .movie-title }}
    - {{ name: year, css: .movie-year }}
    - {{ name: genre, css: .movie-genre }}
    - {{ name: fav_button, test_id: fav-btn }}
    - {{ name: catalog_link, test_id: home-link }}
"
    )
    .unwrap();

    let config = HarnessConfig::from_vars([
        ("PAGEKIT_LOCATORS", file.path().to_string_lossy().into_owned()),
        ("PAGEKIT_TIMEOUT_MS", "1000".to_string()),
        ("PAGEKIT_POLL_INTERVAL_MS", "20".to_string()),
    ])
    .unwrap();
    let session = FakeSession::new(&config.registry().unwrap(), sample_movies());
    let ctx = config.page_context(&session).unwrap();

    let catalog: CatalogPage<'_, _> = ctx.open().await.unwrap();
    catalog.sort_by(SortCriterion::Year).await.unwrap();
    let title = catalog.add_first_to_favorites().await.unwrap();
    let favorites = catalog.open_favorites().await.unwrap();
    assert_eq!(favorites.item_titles().await.unwrap(), vec![title]);
}

#[tokio::test(start_paused = true)]
async fn launch_starts_every_scenario_from_the_app_url() {
    let config = HarnessConfig::from_vars([
        ("PAGEKIT_VOCABULARY", "v2".to_string()),
        ("PAGEKIT_APP_URL", "http://127.0.0.1:5173".to_string()),
    ])
    .unwrap();
    let session = FakeSession::new(&config.registry().unwrap(), sample_movies());

    let catalog: CatalogPage<'_, _> = config.launch(&session).await.unwrap();
    catalog.sort_by(SortCriterion::Year).await.unwrap();
    catalog.add_first_to_favorites().await.unwrap();

    // A second launch reloads the document: unsorted, nothing favorited.
    let catalog: CatalogPage<'_, _> = config.launch(&session).await.unwrap();
    assert_eq!(catalog.item_titles().await.unwrap()[0], "The Matrix");
    assert!(session.favorite_titles().is_empty());
    assert_eq!(
        session.visited(),
        vec!["http://127.0.0.1:5173".to_string(); 2]
    );
}

// === Concurrency ===

#[tokio::test(start_paused = true)]
async fn independent_sessions_run_concurrently() {
    let (first, registry) = setup(Vocabulary::V1);
    let second = FakeSession::new(&Vocabulary::V2.registry().unwrap(), sample_movies());
    second.set_render_delay(3);

    let v1 = PageContext::new(&first, registry).with_options(options());
    let v2 = PageContext::new(&second, Arc::new(Vocabulary::V2.registry().unwrap()))
        .with_options(options());

    let favorite_newest = async {
        let catalog: CatalogPage<'_, _> = v1.open().await?;
        catalog.sort_by(SortCriterion::Year).await?;
        let title = catalog.add_first_to_favorites().await?;
        Ok::<_, PageError>(title)
    };
    let favorite_alphabetical_first = async {
        let catalog: CatalogPage<'_, _> = v2.open().await?;
        catalog.sort_by(SortCriterion::Title).await?;
        let title = catalog.add_first_to_favorites().await?;
        Ok::<_, PageError>(title)
    };

    let (a, b) = tokio::join!(favorite_newest, favorite_alphabetical_first);
    assert_eq!(a.unwrap(), "Parasite");
    assert_eq!(b.unwrap(), "amélie");
    assert_eq!(first.favorite_titles(), vec!["Parasite".to_string()]);
    assert_eq!(second.favorite_titles(), vec!["amélie".to_string()]);
}
