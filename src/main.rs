use campus_market::adapters::{InMemoryRepository, RestRepository};
use campus_market::config::{BackendKind, Command};
use campus_market::core::detail::load_detail;
use campus_market::core::listing_form::{submit_listing, ListingDraft};
use campus_market::core::render;
use campus_market::core::saved::SavedListings;
use campus_market::core::seller::{load_seller_page, update_status};
use campus_market::core::{
    Category, ConfigProvider, ListingId, ListingRepository, SavedListing, StatusChange, UserId,
};
use campus_market::utils::error::ErrorSeverity;
use campus_market::utils::logger::{init_logger, LogFormat};
use campus_market::utils::validation::Validate;
use campus_market::{Catalog, CatalogQuery, CliConfig, MarketConfig, MarketError, Result, Session};
use chrono::Utc;
use clap::Parser;

enum Backend {
    Memory {
        repository: InMemoryRepository,
        data_file: Option<String>,
    },
    Rest(RestRepository),
}

impl Backend {
    async fn connect(config: &MarketConfig) -> Result<Self> {
        match config.backend.r#type {
            BackendKind::Memory => {
                let repository = match &config.backend.data_file {
                    Some(path) => {
                        tracing::info!("📁 Loading marketplace data from: {}", path);
                        InMemoryRepository::from_json_file(path).await?
                    }
                    None => {
                        tracing::info!("Using built-in demo data");
                        InMemoryRepository::seeded(Utc::now())
                    }
                };
                Ok(Backend::Memory {
                    repository,
                    data_file: config.backend.data_file.clone(),
                })
            }
            BackendKind::Rest => {
                let url = config.backend.url.clone().unwrap_or_default();
                let api_key = config.backend.api_key.clone().unwrap_or_default();
                tracing::info!("🌐 Using backend at {}", url);
                let mut repository = RestRepository::new(url, api_key);
                if let Some(timeout) = config.backend.timeout_seconds {
                    repository = repository.with_timeout(timeout);
                }
                Ok(Backend::Rest(repository))
            }
        }
    }

    fn repository(&self) -> &dyn ListingRepository {
        match self {
            Backend::Memory { repository, .. } => repository,
            Backend::Rest(repository) => repository,
        }
    }

    /// 記憶體後端的變更寫回資料檔
    async fn persist(&self) -> Result<()> {
        if let Backend::Memory {
            repository,
            data_file: Some(path),
        } = self
        {
            repository.write_json_file(path).await?;
        }
        Ok(())
    }
}

fn load_config(cli: &CliConfig) -> Result<MarketConfig> {
    let mut config = match &cli.config {
        Some(path) => MarketConfig::from_file(path)?,
        None => MarketConfig::default(),
    };

    // 命令列覆蓋設定
    if let Some(data) = &cli.data {
        config.backend.r#type = BackendKind::Memory;
        config.backend.data_file = Some(data.clone());
    }

    config.validate()?;
    Ok(config)
}

async fn open_session(repository: &dyn ListingRepository, user: Option<&str>) -> Result<Session> {
    match user {
        Some(id) => {
            let id = UserId::from(id);
            let profile = repository
                .get_profile(&id)
                .await?
                .ok_or_else(|| MarketError::NotFound {
                    entity: "Profile",
                    id: id.to_string(),
                })?;
            Ok(Session::signed_in(profile))
        }
        None => Ok(Session::anonymous()),
    }
}

async fn run(command: Command, config: &MarketConfig, backend: &Backend, session: &Session) -> Result<()> {
    let repository = backend.repository();

    match command {
        Command::Browse {
            search,
            category,
            sort,
            format,
            active_only,
        } => {
            let query = CatalogQuery::for_view(config, sort, active_only)
                .with_search(search)
                .with_category(Category::parse_filter(&category)?);

            let catalog = Catalog::new(repository.list_listings().await?);
            let results = catalog.query(&query);
            tracing::info!("🔍 {} of {} listings match", results.len(), catalog.len());
            println!("{}", render::render(&results, format)?);
        }
        Command::Show { id } => {
            let detail = load_detail(repository, &ListingId::from(id)).await?;
            println!("{}", render::render_detail(&detail, &session.snapshot()));
        }
        Command::Seller {
            id,
            sort,
            format,
            active_only,
        } => {
            let query = CatalogQuery::for_view(config, sort, active_only);
            let page = load_seller_page(repository, &UserId::from(id), &query).await?;

            println!(
                "{} · member since {}",
                page.profile.full_name,
                page.profile.created_at.format("%B %Y")
            );
            let listings: Vec<_> = page.listings.iter().collect();
            println!("{}", render::render(&listings, format)?);
        }
        Command::Saved => {
            let user = session.require_user()?;
            let saved = SavedListings::from_records(repository.saved_listings(&user.id).await?);
            let listings = repository.list_listings().await?;
            println!("{}", render::render_saved(&saved.resolve(&user.id, &listings)));
        }
        Command::ToggleSave { id } => {
            let user = session.require_user()?;
            let id = ListingId::from(id);
            if repository.get_listing(&id).await?.is_none() {
                return Err(MarketError::NotFound {
                    entity: "Listing",
                    id: id.to_string(),
                });
            }

            let now = Utc::now();
            let mut saved = SavedListings::from_records(repository.saved_listings(&user.id).await?);
            if saved.toggle(&user.id, &id, now) {
                repository
                    .save_listing(SavedListing::new(user.id.clone(), id, now))
                    .await?;
                println!("Added to saved listings");
            } else {
                repository.unsave_listing(&user.id, &id).await?;
                println!("Removed from saved listings");
            }
            backend.persist().await?;
        }
        Command::Sell {
            title,
            description,
            price,
            category,
            condition,
            images,
        } => {
            let draft = ListingDraft {
                title,
                description,
                price,
                category,
                condition,
                images,
            };
            let listing = submit_listing(repository, session, &draft, config.max_images()).await?;
            backend.persist().await?;
            println!("✅ Listing created successfully (id {})", listing.id);
        }
        Command::MarkSold { id } => {
            update_status(repository, session, &ListingId::from(id), StatusChange::MarkSold, Utc::now())
                .await?;
            backend.persist().await?;
            println!("Listing status updated successfully");
        }
        Command::Delete { id } => {
            update_status(repository, session, &ListingId::from(id), StatusChange::Delete, Utc::now())
                .await?;
            backend.persist().await?;
            println!("Listing status updated successfully");
        }
    }

    Ok(())
}

fn exit_with(e: &MarketError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,      // 找不到或輸入錯誤
        ErrorSeverity::Medium => 2,   // 可重試
        ErrorSeverity::High => 1,     // 處理錯誤
        ErrorSeverity::Critical => 3, // 系統或設定錯誤
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration failed: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    // 初始化日誌
    let format = if cli.json_logs || config.json_logs() {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_logger(format, cli.verbose);

    tracing::info!("Starting {}", config.marketplace.name);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let backend = match Backend::connect(&config).await {
        Ok(backend) => backend,
        Err(e) => exit_with(&e),
    };

    let session = match open_session(backend.repository(), cli.user.as_deref()).await {
        Ok(session) => session,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run(cli.command, &config, &backend, &session).await {
        exit_with(&e);
    }
}
