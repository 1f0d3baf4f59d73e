use anyhow::Result;
use campus_market::adapters::Dataset;
use campus_market::core::detail::load_detail;
use campus_market::core::listing_form::{submit_listing, ListingDraft};
use campus_market::core::saved::SavedListings;
use campus_market::core::seller::{load_seller_page, update_status};
use campus_market::core::{
    Category, ConfigProvider, ListingId, ListingRepository, ListingStatus, SortKey, StatusChange,
    UserId,
};
use campus_market::domain::model::{Credentials, SignUpRequest};
use campus_market::{
    Catalog, CatalogQuery, InMemoryAuthenticator, InMemoryRepository, MarketConfig, MarketError,
    Session,
};
use chrono::Utc;
use tempfile::TempDir;

fn lamp_draft() -> ListingDraft {
    ListingDraft {
        title: "Desk lamp".to_string(),
        description: "LED, three brightness levels".to_string(),
        price: "18".to_string(),
        category: "Furniture".to_string(),
        condition: "Good".to_string(),
        images: vec!["https://cdn.example.com/lamp.jpg".to_string()],
    }
}

async fn signed_in_as(repo: &InMemoryRepository, id: &str) -> Session {
    let profile = repo.get_profile(&UserId::from(id)).await.unwrap().unwrap();
    Session::signed_in(profile)
}

#[tokio::test]
async fn test_browse_seeded_catalog() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let catalog = Catalog::new(repo.list_listings().await?);

    let newest = catalog.query(&CatalogQuery::new().only_active());
    let titles: Vec<&str> = newest.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Computer Science Textbook", "MacBook Pro 2022"]);

    let electronics = catalog.query(
        &CatalogQuery::new()
            .with_category(Some(Category::Electronics))
            .sorted_by(SortKey::PriceHigh),
    );
    assert_eq!(electronics.len(), 1);
    assert_eq!(electronics[0].seller.as_ref().unwrap().full_name, "Jane Doe");
    Ok(())
}

#[tokio::test]
async fn test_sell_then_find_in_catalog() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let session = signed_in_as(&repo, "1").await;
    let config = MarketConfig::default();

    let created = submit_listing(&repo, &session, &lamp_draft(), config.max_images()).await?;
    assert_eq!(created.id, ListingId::from("3"));
    assert_eq!(created.seller_id, UserId::from("1"));

    let catalog = Catalog::new(repo.list_listings().await?);
    let found = catalog.query(&CatalogQuery::new().with_search("LAMP"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);
    Ok(())
}

#[tokio::test]
async fn test_anonymous_cannot_sell() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let err = submit_listing(&repo, &Session::anonymous(), &lamp_draft(), 4)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Unauthenticated));
    assert_eq!(repo.list_listings().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_mark_sold_hides_from_browse_and_is_final() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let session = signed_in_as(&repo, "1").await;
    let id = ListingId::from("1");

    let sold = update_status(&repo, &session, &id, StatusChange::MarkSold, Utc::now()).await?;
    assert_eq!(sold.status(), ListingStatus::Sold);

    let catalog = Catalog::new(repo.list_listings().await?);
    assert_eq!(catalog.query(&CatalogQuery::new().only_active()).len(), 1);
    assert_eq!(catalog.query(&CatalogQuery::new()).len(), 2);

    // 售出後不可再刪除
    let err = update_status(&repo, &session, &id, StatusChange::Delete, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::IllegalTransition { .. }));
    let stored = repo.get_listing(&id).await?.unwrap();
    assert_eq!(stored.status(), ListingStatus::Sold);
    Ok(())
}

#[tokio::test]
async fn test_only_seller_changes_status() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let session = signed_in_as(&repo, "2").await;

    let err = update_status(
        &repo,
        &session,
        &ListingId::from("1"),
        StatusChange::Delete,
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::Forbidden { .. }));

    let listing = repo.get_listing(&ListingId::from("1")).await?.unwrap();
    assert!(listing.is_active());
    Ok(())
}

#[tokio::test]
async fn test_seller_page_and_detail() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());

    let page = load_seller_page(&repo, &UserId::from("2"), &CatalogQuery::new().only_active()).await?;
    assert_eq!(page.profile.full_name, "Jane Doe");
    assert_eq!(page.listings.len(), 1);

    let detail = load_detail(&repo, &ListingId::from("2")).await?;
    let viewer = signed_in_as(&repo, "1").await.snapshot();
    assert!(detail.can_message(&viewer));
    assert!(!detail.is_owned_by(&viewer));

    let missing = load_seller_page(&repo, &UserId::from("nobody"), &CatalogQuery::new()).await;
    assert!(matches!(missing, Err(MarketError::NotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_saved_listings_flow() -> Result<()> {
    let repo = InMemoryRepository::seeded(Utc::now());
    let user = UserId::from("1");

    let mut saved = SavedListings::from_records(repo.saved_listings(&user).await?);
    assert!(saved.is_saved(&user, &ListingId::from("2")));

    // 重複收藏不會新增紀錄
    assert!(!saved.save(&user, &ListingId::from("2"), Utc::now()));
    assert!(saved.save(&user, &ListingId::from("1"), Utc::now()));

    let listings = repo.list_listings().await?;
    let resolved = saved.resolve(&user, &listings);
    assert_eq!(resolved.len(), 2);
    assert!(resolved.iter().all(|r| r.listing.is_some()));
    Ok(())
}

#[tokio::test]
async fn test_sign_up_and_sign_in_with_institutional_email() -> Result<()> {
    let auth = InMemoryAuthenticator::new();
    let config = MarketConfig::default();

    let rejected = Session::sign_up(
        &auth,
        &SignUpRequest {
            email: "someone@gmail.com".to_string(),
            password: "secret123".to_string(),
            full_name: "Someone".to_string(),
        },
        config.institutional_domain(),
    )
    .await;
    assert!(matches!(rejected, Err(MarketError::InvalidEmailDomain { .. })));

    let profile = Session::sign_up(
        &auth,
        &SignUpRequest {
            email: "student@queensu.ca".to_string(),
            password: "secret123".to_string(),
            full_name: "Student".to_string(),
        },
        config.institutional_domain(),
    )
    .await?;

    let mut session = Session::anonymous();
    let bad = session
        .sign_in(
            &auth,
            &Credentials {
                email: "student@queensu.ca".to_string(),
                password: "not-the-password".to_string(),
            },
            config.institutional_domain(),
        )
        .await;
    assert!(matches!(bad, Err(MarketError::AuthenticationFailed { .. })));
    assert!(!session.snapshot().is_signed_in());

    session
        .sign_in(
            &auth,
            &Credentials {
                email: "student@queensu.ca".to_string(),
                password: "secret123".to_string(),
            },
            config.institutional_domain(),
        )
        .await?;
    assert_eq!(session.snapshot().current_user_id(), Some(&profile.id));

    session.sign_out(&auth).await?;
    assert!(!session.snapshot().is_signed_in());
    Ok(())
}

#[tokio::test]
async fn test_json_dataset_round_trip_through_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("market.json");

    let repo = InMemoryRepository::seeded(Utc::now());
    let session = signed_in_as(&repo, "2").await;
    submit_listing(&repo, &session, &lamp_draft(), 4).await?;
    repo.write_json_file(&path).await?;

    let reloaded = InMemoryRepository::from_json_file(&path).await?;
    let dataset: Dataset = reloaded.snapshot().await;
    assert_eq!(dataset.profiles.len(), 2);
    assert_eq!(dataset.listings.len(), 3);
    assert_eq!(dataset.saved_listings.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_dataset_with_malformed_category_still_loads() -> Result<()> {
    let content = r#"{
        "profiles": [
            {"id": "u1", "email": "a@queensu.ca", "full_name": "A", "created_at": "2024-01-01T00:00:00Z"}
        ],
        "listings": [
            {"id": "1", "title": "Kayak", "price": 300, "category": "Boats", "seller_id": "u1",
             "created_at": "2024-01-02T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z"}
        ]
    }"#;

    let repo = InMemoryRepository::from_json_str(content)?;
    let catalog = Catalog::new(repo.list_listings().await?);

    assert_eq!(catalog.query(&CatalogQuery::new()).len(), 1);
    assert!(catalog
        .query(&CatalogQuery::new().with_category(Some(Category::SportsEquipment)))
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sell_into_dataset_with_largest_numeric_id() -> Result<()> {
    let content = r#"{
        "profiles": [
            {"id": "u1", "email": "a@queensu.ca", "full_name": "A", "created_at": "2024-01-01T00:00:00Z"}
        ],
        "listings": [
            {"id": "18446744073709551615", "title": "Kayak", "price": 300, "seller_id": "u1",
             "created_at": "2024-01-02T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z"}
        ]
    }"#;

    let repo = InMemoryRepository::from_json_str(content)?;
    let session = signed_in_as(&repo, "u1").await;
    let created = submit_listing(&repo, &session, &lamp_draft(), 4).await?;

    assert_eq!(created.id, ListingId::from("1"));
    assert_eq!(repo.list_listings().await?.len(), 2);
    Ok(())
}
