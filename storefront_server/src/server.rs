use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use storefront_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    seed::{seed_admin, seed_demo_catalog},
    traits::StorefrontDatabase,
    AuthApi,
    CartApi,
    CatalogApi,
    DashboardApi,
    OrderFlowApi,
    ReviewApi,
    Storage,
};

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::{AccountCheckFactory, JwtMiddlewareFactory},
    routes::*,
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = Storage::connect(&config.storage).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    prepare_store(&db, &config).await?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_event_hooks());
    let producers = handlers.producers();
    let srv = create_server_instance(config, db, producers)?;
    // Handlers shut down by themselves once the server, and with it every producer, is dropped.
    handlers.start_handlers().await;
    srv.await?;
    Ok(())
}

/// Creates the bootstrap admin and, if asked to, the demo catalog.
pub async fn prepare_store<B: StorefrontDatabase>(db: &B, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(());
    };
    let admin = seed_admin(db.clone(), admin).await?;
    if config.seed_demo_catalog {
        let count = seed_demo_catalog(db, admin.id).await?;
        if count > 0 {
            info!("🏷️ Added {count} demo products to the catalog");
        }
    }
    Ok(())
}

pub fn create_event_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_placed(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Order #{} placed by user #{}: {} lines, {} paid by {} ({})",
                ev.order.id,
                ev.order.user_id,
                ev.items.len(),
                ev.order.total_amount,
                ev.payment.method,
                ev.payment.status
            );
        })
    });
    hooks.on_order_status_changed(|ev| {
        Box::pin(async move {
            info!("📬️ Order #{} moved from {} to {}", ev.order.id, ev.old_status, ev.new_status());
        })
    });
    hooks
}

pub fn create_server_instance<B>(config: ServerConfig, db: B, producers: EventProducers) -> Result<Server, ServerError>
where B: StorefrontDatabase + Send + 'static {
    let issuer = Arc::new(TokenIssuer::new(&config.auth));
    let options = ServerOptions::from_config(&config);
    let low_stock_threshold = config.low_stock_threshold;
    let srv = HttpServer::new(move || {
        let db = db.clone();
        let producers = producers.clone();
        App::new()
            .wrap(JwtMiddlewareFactory::new(Arc::clone(&issuer)))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .app_data(web::Data::from(Arc::clone(&issuer)))
            .app_data(web::Data::new(options))
            .configure(|cfg| register_apis(cfg, &db, producers, low_stock_threshold))
            .configure(register_routes::<B>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the engine APIs as application data for the handlers in [`crate::routes`].
pub fn register_apis<B: StorefrontDatabase + 'static>(
    cfg: &mut web::ServiceConfig,
    db: &B,
    producers: EventProducers,
    low_stock_threshold: i64,
) {
    cfg.app_data(web::Data::new(AuthApi::new(db.clone())))
        .app_data(web::Data::new(CatalogApi::new(db.clone())))
        .app_data(web::Data::new(CartApi::new(db.clone())))
        .app_data(web::Data::new(OrderFlowApi::new(db.clone(), producers)))
        .app_data(web::Data::new(ReviewApi::new(db.clone())))
        .app_data(web::Data::new(DashboardApi::new(db.clone()).with_low_stock_threshold(low_stock_threshold)));
}

pub fn register_routes<B: StorefrontDatabase + 'static>(cfg: &mut web::ServiceConfig) {
    // Routes that require authentication, or a particular role
    let api_scope = web::scope("/api")
        .service(MyProfileRoute::<B>::new())
        .service(UpdateMyProfileRoute::<B>::new())
        .service(LogoutRoute::new())
        .service(ViewCartRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        .service(SetCartQuantityRoute::<B>::new())
        .service(RemoveFromCartRoute::<B>::new())
        .service(CheckoutRoute::<B>::new())
        .service(MyOrdersRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(CancelOrderRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(UpdateShipmentRoute::<B>::new())
        .service(AddReviewRoute::<B>::new())
        .service(DeleteReviewRoute::<B>::new())
        .service(SellerProductsRoute::<B>::new())
        .service(CreateProductRoute::<B>::new())
        .service(UpdateProductRoute::<B>::new())
        .service(DeleteProductRoute::<B>::new())
        .service(SellerOrdersRoute::<B>::new())
        .service(SellerStatsRoute::<B>::new())
        .service(UsersRoute::<B>::new())
        .service(UpdateRoleRoute::<B>::new())
        .service(DeleteUserRoute::<B>::new())
        .service(SearchOrdersRoute::<B>::new())
        .service(AdminStatsRoute::<B>::new())
        .service(CreateCategoryRoute::<B>::new())
        .service(UpdateCategoryRoute::<B>::new())
        .service(DeleteCategoryRoute::<B>::new());
    // Tokens are checked against the current account on every route
    let root = web::scope("")
        .wrap(AccountCheckFactory::<B>::new())
        .service(health)
        .service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(ProductsRoute::<B>::new())
        .service(ProductRoute::<B>::new())
        .service(ProductReviewsRoute::<B>::new())
        .service(CategoriesRoute::<B>::new())
        .service(CategoryRoute::<B>::new())
        .service(api_scope);
    cfg.service(root);
}
