use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use plateful::{
    database::{
        review_service::MAX_REVIEW_LEN, BookmarkService, BookmarkToggle, DatabaseManager,
        FollowService, NewUserFields, RestaurantRow, RestaurantStore, ReviewRow, ReviewService,
        UserRow, UserService,
    },
    IngestEngine, IngestError, OpenDataClient,
};

/// Entities shown on the browse page
const BROWSE_PAGE_SIZE: usize = 20;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<IngestEngine<OpenDataClient, RestaurantStore>>,
    pub restaurants: RestaurantStore,
    pub users: UserService,
    pub bookmarks: BookmarkService,
    pub reviews: ReviewService,
    pub follows: FollowService,
}

// API types
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct RestaurantDetail {
    pub restaurant: RestaurantRow,
    pub reviews: Vec<ReviewRow>,
}

#[derive(Serialize)]
pub struct UserProfile {
    pub user: UserRow,
    pub bookmarks: Vec<RestaurantRow>,
    pub reviews: Vec<ReviewRow>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub user_id: Uuid,
    pub body: String,
}

#[derive(Deserialize)]
pub struct UserIdRequest {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct ToggleBookmarkRequest {
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
}

#[derive(Serialize)]
pub struct ToggleBookmarkResponse {
    pub toggle: BookmarkToggle,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("plateful=info,plateful_web_server=info,tower_http=debug")
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let db = DatabaseManager::with_default_config().await?;
    db.verify_schema().await?;

    let client = OpenDataClient::from_env()?;
    let engine = Arc::new(IngestEngine::new(client, db.restaurant_store()));

    let app_state = AppState {
        engine,
        restaurants: db.restaurant_store(),
        users: db.user_service(),
        bookmarks: db.bookmark_service(),
        reviews: db.review_service(),
        follows: db.follow_service(),
    };

    let app = create_router(app_state);

    // Determine port
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // Restaurants
        .route("/api/restaurants", get(browse_restaurants))
        .route("/api/restaurants/search", get(search_restaurants))
        .route("/api/restaurants/:restaurant_id", get(get_restaurant))
        .route("/api/restaurants/:restaurant_id/reviews", post(create_review))
        .route("/api/reviews/:review_id", delete(delete_review))
        // Cuisine browsing
        .route("/api/cuisines", get(list_cuisines))
        .route("/api/cuisines/:cuisine", get(cuisine_restaurants))
        // Users
        .route("/api/users", get(list_users))
        .route("/api/users/register", post(register_user))
        .route("/api/users/login", post(login_user))
        .route("/api/users/:user_id", get(user_profile))
        .route("/api/users/:user_id/bookmarks", get(user_bookmarks))
        .route("/api/users/:user_id/follow", post(follow_user))
        .route("/api/users/:user_id/unfollow", post(unfollow_user))
        .route("/api/users/:user_id/followers", get(user_followers))
        .route("/api/users/:user_id/following", get(user_following))
        // Bookmarks
        .route("/api/bookmarks/toggle", post(toggle_bookmark))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, String)>;

/// Map ingest failures so "source unreachable" stays distinguishable from an
/// empty result set.
fn ingest_error(e: IngestError) -> (StatusCode, String) {
    match e {
        IngestError::Source(e) => {
            warn!("Restaurant feed unavailable: {e}");
            (
                StatusCode::BAD_GATEWAY,
                "Restaurant feed unavailable".to_string(),
            )
        }
        IngestError::Store(e) => {
            error!("Store failure during sync: {e:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            )
        }
    }
}

fn db_error(e: anyhow::Error) -> (StatusCode, String) {
    error!("Database error: {e:?}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Database error".to_string(),
    )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<String>> {
    ApiResponse::ok("OK".to_string())
}

// Browse: full feed sync, first page of entities
async fn browse_restaurants(State(state): State<AppState>) -> HandlerResult<Vec<RestaurantRow>> {
    let mut restaurants = state.engine.sync_all().await.map_err(ingest_error)?;
    restaurants.truncate(BROWSE_PAGE_SIZE);
    Ok(ApiResponse::ok(restaurants))
}

// Search by name with address-level dedup
async fn search_restaurants(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<RestaurantRow>> {
    // The feed stores names uppercased, so the filter is uppercased too
    let name = query
        .q
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_uppercase);

    let restaurants = state
        .engine
        .sync_unique(name.as_deref())
        .await
        .map_err(ingest_error)?;
    Ok(ApiResponse::ok(restaurants))
}

// Restaurant detail with its reviews, newest first
async fn get_restaurant(
    Path(restaurant_id): Path<Uuid>,
    State(state): State<AppState>,
) -> HandlerResult<RestaurantDetail> {
    let restaurant = state
        .restaurants
        .get_by_id(restaurant_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Restaurant not found".to_string()))?;

    let reviews = state
        .reviews
        .list_for_restaurant(restaurant_id)
        .await
        .map_err(db_error)?;

    Ok(ApiResponse::ok(RestaurantDetail {
        restaurant,
        reviews,
    }))
}

async fn create_review(
    Path(restaurant_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> HandlerResult<ReviewRow> {
    if request.body.chars().count() > MAX_REVIEW_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Review exceeds {} characters", MAX_REVIEW_LEN),
        ));
    }

    state
        .restaurants
        .get_by_id(restaurant_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Restaurant not found".to_string()))?;

    let review = state
        .reviews
        .create(request.user_id, restaurant_id, &request.body)
        .await
        .map_err(db_error)?;

    Ok(ApiResponse::ok(review))
}

async fn delete_review(
    Path(review_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UserIdRequest>,
) -> HandlerResult<bool> {
    let deleted = state
        .reviews
        .delete(review_id, request.user_id)
        .await
        .map_err(db_error)?;

    if !deleted {
        return Err((
            StatusCode::FORBIDDEN,
            "Review not found or not yours to delete".to_string(),
        ));
    }

    Ok(ApiResponse::ok(true))
}

async fn list_cuisines(State(state): State<AppState>) -> HandlerResult<Vec<String>> {
    let cuisines = state.restaurants.list_cuisines().await.map_err(db_error)?;
    Ok(ApiResponse::ok(cuisines))
}

async fn cuisine_restaurants(
    Path(cuisine): Path<String>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<RestaurantRow>> {
    let restaurants = state
        .restaurants
        .list_by_cuisine(&cuisine)
        .await
        .map_err(db_error)?;
    Ok(ApiResponse::ok(restaurants))
}

async fn list_users(
    Query(query): Query<SearchQuery>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<UserRow>> {
    let users = state
        .users
        .search(query.q.as_deref())
        .await
        .map_err(db_error)?;
    Ok(ApiResponse::ok(users))
}

async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> HandlerResult<UserRow> {
    let fields = NewUserFields {
        username: request.username,
        password: request.password,
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    let user = state.users.register(&fields).await.map_err(db_error)?;
    Ok(ApiResponse::ok(user))
}

async fn login_user(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<UserRow> {
    let user = state
        .users
        .authenticate(&request.username, &request.password)
        .await
        .map_err(db_error)?
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()))?;

    Ok(ApiResponse::ok(user))
}

async fn user_profile(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> HandlerResult<UserProfile> {
    let user = state
        .users
        .get_by_id(user_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let bookmarks = state
        .bookmarks
        .list_for_user(user_id)
        .await
        .map_err(db_error)?;
    let reviews = state.reviews.list_for_user(user_id).await.map_err(db_error)?;

    Ok(ApiResponse::ok(UserProfile {
        user,
        bookmarks,
        reviews,
    }))
}

async fn user_bookmarks(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<RestaurantRow>> {
    let bookmarks = state
        .bookmarks
        .list_for_user(user_id)
        .await
        .map_err(db_error)?;
    Ok(ApiResponse::ok(bookmarks))
}

async fn follow_user(
    Path(followed_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UserIdRequest>,
) -> HandlerResult<bool> {
    if request.user_id == followed_id {
        return Err((
            StatusCode::BAD_REQUEST,
            "Users cannot follow themselves".to_string(),
        ));
    }

    let added = state
        .follows
        .follow(request.user_id, followed_id)
        .await
        .map_err(db_error)?;
    Ok(ApiResponse::ok(added))
}

async fn unfollow_user(
    Path(followed_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UserIdRequest>,
) -> HandlerResult<bool> {
    let removed = state
        .follows
        .unfollow(request.user_id, followed_id)
        .await
        .map_err(db_error)?;
    Ok(ApiResponse::ok(removed))
}

async fn user_followers(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<UserRow>> {
    let followers = state.follows.followers(user_id).await.map_err(db_error)?;
    Ok(ApiResponse::ok(followers))
}

async fn user_following(
    Path(user_id): Path<Uuid>,
    State(state): State<AppState>,
) -> HandlerResult<Vec<UserRow>> {
    let following = state.follows.following(user_id).await.map_err(db_error)?;
    Ok(ApiResponse::ok(following))
}

async fn toggle_bookmark(
    State(state): State<AppState>,
    Json(request): Json<ToggleBookmarkRequest>,
) -> HandlerResult<ToggleBookmarkResponse> {
    state
        .restaurants
        .get_by_id(request.restaurant_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Restaurant not found".to_string()))?;

    let toggle = state
        .bookmarks
        .toggle(request.user_id, request.restaurant_id)
        .await
        .map_err(db_error)?;

    Ok(ApiResponse::ok(ToggleBookmarkResponse { toggle }))
}
