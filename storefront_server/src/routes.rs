//! Request handler definitions
//!
//! Define each route and its handler here. Handlers only translate between HTTP and the engine APIs: ownership and
//! business rules are enforced by the APIs themselves. Keep this module neat and tidy 🙏
//!
//! Every route is authenticated by the JWT middleware when a token is present. Routes that need a user extract
//! [`JwtClaims`]; role tiers are enforced per route with `requires [...]`, which lets a request through when the
//! caller has *any* of the listed roles.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any I/O or database work must be awaited, never blocked on.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    auth_objects::{LoginRequest, ProfileUpdate, RegisterRequest},
    cart_objects::{CartItemRequest, CartQuantity},
    catalog_objects::{NewCategoryRequest, NewProductRequest, NewReviewRequest},
    db_types::{CategoryUpdate, ProductUpdate, Role, ShipmentUpdate},
    order_objects::{CheckoutRequest, StatusUpdateRequest},
    traits::{CartManagement, CatalogManagement, OrderManagement, ReviewManagement, StorefrontDatabase, UserManagement},
    AuthApi,
    CartApi,
    CatalogApi,
    DashboardApi,
    OrderFlowApi,
    ReviewApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        JsonResponse,
        LoginResponse,
        OrderSearchParams,
        PageParams,
        ProductQueryParams,
        RoleUpdateRequest,
        SellerOrderParams,
    },
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl UserManagement);
/// Creates a customer or seller account. Admin accounts cannot be registered this way.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST register for {}", req.username);
    let user = api.register(req).await?;
    Ok(HttpResponse::Created().json(user))
}

route!(login => Post "/auth/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// Users log in with their username (or email address) and password, and receive an access token in return. The
/// token must be supplied on every call to the `/api` routes, either as `Authorization: Bearer <token>` or in the
/// `sf_access_token` header.
///
/// The token is valid for a fixed period (`SF_JWT_LIFETIME_MINUTES`) and is not refreshed.
pub async fn login<B: UserManagement>(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    issuer: web::Data<TokenIssuer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let login = body.into_inner();
    let ip = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown address".into());
    debug!("💻️ POST login for {} from {ip}", login.login);
    let user = api.login(login).await.map_err(|e| {
        info!("💻️ Failed login attempt from {ip}. {e}");
        ServerError::from(e)
    })?;
    let token = issuer.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(LoginResponse { user, token }))
}

route!(logout => Post "/logout" requires [Role::Customer, Role::Seller, Role::Admin]);
/// Tokens are stateless, so logging out is up to the client, which should discard its token. This route only
/// acknowledges the request.
pub async fn logout(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST logout for {}", claims.username);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Logged out. Please discard your access token.")))
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(my_profile => Get "/me" impl UserManagement);
pub async fn my_profile<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for {}", claims.username);
    let user = api.profile(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(update_my_profile => Patch "/me" impl UserManagement);
pub async fn update_my_profile<B: UserManagement>(
    claims: JwtClaims,
    body: web::Json<ProfileUpdate>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PATCH profile for {}", claims.username);
    let user = api.update_profile(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement, ReviewManagement);
/// The public product listing. Supports `category_id`, `seller_id`, `q` (search), `min_price`, `max_price`,
/// `in_stock`, `sort` (`newest`, `price_asc`, `price_desc`, `name`), `offset` and `limit`.
///
/// `include_inactive=true` is honoured for admins, and for sellers listing their own products.
pub async fn products<B: CatalogManagement + ReviewManagement>(
    claims: Option<JwtClaims>,
    query: web::Query<ProductQueryParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, page) = query.into_inner().into_filter();
    trace!("💻️ GET products {filter:?}");
    let viewer = claims.map(|c| c.actor());
    let products = api.list_products(filter, &page, viewer.as_ref()).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product => Get "/products/{id}" impl CatalogManagement, ReviewManagement);
pub async fn product<B: CatalogManagement + ReviewManagement>(
    claims: Option<JwtClaims>,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET product {id}");
    let viewer = claims.map(|c| c.actor());
    let detail = api.product_detail(id, viewer.as_ref()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(categories => Get "/categories" impl CatalogManagement, ReviewManagement);
pub async fn categories<B: CatalogManagement + ReviewManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET categories");
    let categories = api.categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

route!(category => Get "/categories/{id}" impl CatalogManagement, ReviewManagement);
pub async fn category<B: CatalogManagement + ReviewManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET category {id}");
    let category = api.category(id).await?;
    Ok(HttpResponse::Ok().json(category))
}

//----------------------------------------------   Reviews  ----------------------------------------------------
route!(product_reviews => Get "/products/{id}/reviews" impl CatalogManagement, ReviewManagement);
pub async fn product_reviews<B: CatalogManagement + ReviewManagement>(
    path: web::Path<i64>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET reviews for product {id}");
    let reviews = api.reviews(id).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

route!(add_review => Post "/products/{id}/reviews" impl CatalogManagement, ReviewManagement);
/// Reviews are one per user and product. Sellers cannot review their own products.
pub async fn add_review<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<NewReviewRequest>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST review for product {product_id} by {}", claims.username);
    let review = api.add_review(&claims.actor(), product_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

route!(delete_review => Delete "/reviews/{id}" impl CatalogManagement, ReviewManagement);
pub async fn delete_review<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE review {id} by {}", claims.username);
    api.delete_review(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Review {id} deleted"))))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(view_cart => Get "/cart" impl CartManagement, CatalogManagement);
pub async fn view_cart<B: CartManagement + CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for {}", claims.username);
    let cart = api.view(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart" impl CartManagement, CatalogManagement);
/// Adds the product to the cart, or increases the quantity if it is already there.
pub async fn add_to_cart<B: CartManagement + CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST {} x product {} to cart of {}", req.quantity, req.product_id, claims.username);
    let item = api.add_item(claims.user_id, req).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(clear_cart => Delete "/cart" impl CartManagement, CatalogManagement);
pub async fn clear_cart<B: CartManagement + CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart of {}", claims.username);
    let removed = api.clear(claims.user_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Removed {removed} items from the cart"))))
}

route!(set_cart_quantity => Patch "/cart/{product_id}" impl CartManagement, CatalogManagement);
/// Sets the quantity of a product in the cart. A quantity of zero removes the line.
pub async fn set_cart_quantity<B: CartManagement + CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<CartQuantity>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ PATCH product {product_id} in cart of {} to {quantity}", claims.username);
    match api.set_quantity(claims.user_id, product_id, quantity).await? {
        Some(item) => Ok(HttpResponse::Ok().json(item)),
        None => Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {product_id} removed from cart")))),
    }
}

route!(remove_from_cart => Delete "/cart/{product_id}" impl CartManagement, CatalogManagement);
pub async fn remove_from_cart<B: CartManagement + CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE product {product_id} from cart of {}", claims.username);
    api.remove_item(claims.user_id, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {product_id} removed from cart"))))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(checkout => Post "/checkout" impl CartManagement, CatalogManagement, OrderManagement);
/// Turns the caller's cart into an order. Card and PayPal payments are settled immediately; cash on delivery is
/// collected when the order is delivered.
pub async fn checkout<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST checkout for {}", claims.username);
    let details = api.checkout(claims.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(details))
}

route!(my_orders => Get "/orders" impl CartManagement, CatalogManagement, OrderManagement);
/// The caller's own orders, newest first.
pub async fn my_orders<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    query: web::Query<PageParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for {}", claims.username);
    let orders = api.order_history(claims.user_id, &query.pagination()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl CartManagement, CatalogManagement, OrderManagement);
/// An order with its items, payment and shipment. Visible to the customer who placed it, admins, and sellers with
/// products in the order.
pub async fn order_by_id<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET order {id} for {}", claims.username);
    let details = api.order_details(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(cancel_order => Post "/orders/{id}/cancel" impl CartManagement, CatalogManagement, OrderManagement);
pub async fn cancel_order<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST cancel order {id} by {}", claims.username);
    let details = api.cancel_order(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(update_order_status => Patch "/orders/{id}/status" impl CartManagement, CatalogManagement, OrderManagement
    where requires [Role::Seller, Role::Admin]);
pub async fn update_order_status<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PATCH order {id} status to {status} by {}", claims.username);
    let details = api.update_status(&claims.actor(), id, status).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(update_shipment => Patch "/orders/{id}/shipment" impl CartManagement, CatalogManagement, OrderManagement
    where requires [Role::Seller, Role::Admin]);
pub async fn update_shipment<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ShipmentUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH shipment for order {id} by {}", claims.username);
    let details = api.update_shipment(&claims.actor(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

//----------------------------------------------   Seller  ----------------------------------------------------
route!(seller_products => Get "/seller/products" impl CatalogManagement, ReviewManagement
    where requires [Role::Seller, Role::Admin]);
/// All of the caller's products, including inactive ones.
pub async fn seller_products<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    query: web::Query<PageParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET seller products for {}", claims.username);
    let products = api.seller_products(&claims.actor(), &query.pagination()).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(create_product => Post "/seller/products" impl CatalogManagement, ReviewManagement
    where requires [Role::Seller, Role::Admin]);
pub async fn create_product<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    body: web::Json<NewProductRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST new product '{}' by {}", req.name, claims.username);
    let product = api.create_product(&claims.actor(), req).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Patch "/seller/products/{id}" impl CatalogManagement, ReviewManagement
    where requires [Role::Seller, Role::Admin]);
/// Sellers may only edit their own products. Admins may edit any product.
pub async fn update_product<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH product {id} by {}", claims.username);
    let product = api.update_product(&claims.actor(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/seller/products/{id}" impl CatalogManagement, ReviewManagement
    where requires [Role::Seller, Role::Admin]);
pub async fn delete_product<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE product {id} by {}", claims.username);
    api.delete_product(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {id} deleted"))))
}

route!(seller_orders => Get "/seller/orders" impl CartManagement, CatalogManagement, OrderManagement
    where requires [Role::Seller, Role::Admin]);
/// Orders that contain at least one of the caller's products. Filter with `?status=`.
pub async fn seller_orders<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    query: web::Query<SellerOrderParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    debug!("💻️ GET seller orders for {}", claims.username);
    let page = PageParams { offset: params.offset, limit: params.limit }.pagination();
    let orders = api.seller_orders(&claims.actor(), params.status, &page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(seller_stats => Get "/seller/stats" impl StorefrontDatabase where requires [Role::Seller, Role::Admin]);
pub async fn seller_stats<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<DashboardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET seller stats for {}", claims.username);
    let stats = api.seller_stats(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(users => Get "/admin/users" impl UserManagement where requires [Role::Admin]);
pub async fn users<B: UserManagement>(
    query: web::Query<PageParams>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET users");
    let users = api.list_users(&query.pagination()).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(update_role => Patch "/admin/users/{id}/role" impl UserManagement where requires [Role::Admin]);
/// Changes a user's role. The change takes effect the next time the user logs in.
pub async fn update_role<B: UserManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<RoleUpdateRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let role = body.into_inner().role;
    info!("💻️ PATCH role of user {id} to {role} by {}", claims.username);
    let user = api.set_role(&claims.actor(), id, role).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(delete_user => Delete "/admin/users/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn delete_user<B: UserManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ DELETE user {id} by {}", claims.username);
    api.delete_user(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("User {id} deleted"))))
}

route!(search_orders => Get "/admin/orders" impl CartManagement, CatalogManagement, OrderManagement
    where requires [Role::Admin]);
/// Searches all orders. Supports `user_id`, `seller_id`, `status`, `since`, `until`, `offset` and `limit`.
pub async fn search_orders<B: CartManagement + CatalogManagement + OrderManagement>(
    claims: JwtClaims,
    query: web::Query<OrderSearchParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (filter, page) = query.into_inner().into_filter();
    debug!("💻️ GET search orders {filter:?}");
    let orders = api.search_orders(&claims.actor(), &filter, &page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(admin_stats => Get "/admin/stats" impl StorefrontDatabase where requires [Role::Admin]);
pub async fn admin_stats<B: StorefrontDatabase>(
    claims: JwtClaims,
    api: web::Data<DashboardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET admin stats");
    let stats = api.admin_stats(&claims.actor()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(create_category => Post "/admin/categories" impl CatalogManagement, ReviewManagement
    where requires [Role::Admin]);
pub async fn create_category<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    body: web::Json<NewCategoryRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST new category '{}'", req.name);
    let category = api.create_category(&claims.actor(), req).await?;
    Ok(HttpResponse::Created().json(category))
}

route!(update_category => Patch "/admin/categories/{id}" impl CatalogManagement, ReviewManagement
    where requires [Role::Admin]);
pub async fn update_category<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<CategoryUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH category {id}");
    let category = api.update_category(&claims.actor(), id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

route!(delete_category => Delete "/admin/categories/{id}" impl CatalogManagement, ReviewManagement
    where requires [Role::Admin]);
pub async fn delete_category<B: CatalogManagement + ReviewManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE category {id}");
    api.delete_category(&claims.actor(), id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Category {id} deleted"))))
}
