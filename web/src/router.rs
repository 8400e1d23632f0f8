use crate::controller::{
    currency_controller, exchange_rate_controller, health_check_controller, order_controller,
    payment_method_controller, user_controller,
};
use crate::{cors_layer, sse::handler, AppState};
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "RayEx Platform API"
        ),
        paths(
            health_check_controller::banner,
            health_check_controller::health_check,
            currency_controller::index,
            currency_controller::read,
            currency_controller::create,
            currency_controller::update,
            currency_controller::toggle,
            currency_controller::delete,
            exchange_rate_controller::index,
            exchange_rate_controller::read,
            exchange_rate_controller::upsert,
            exchange_rate_controller::update,
            exchange_rate_controller::refresh,
            exchange_rate_controller::refresh_all,
            order_controller::index,
            order_controller::by_user,
            order_controller::read,
            order_controller::create,
            order_controller::update_status,
            payment_method_controller::index,
            payment_method_controller::read,
            payment_method_controller::create,
            payment_method_controller::update,
            payment_method_controller::delete,
            user_controller::sync,
            user_controller::index,
            user_controller::read,
            user_controller::update_status,
            handler::sse_handler,
        ),
        components(
            schemas(
                domain::currencies::Model,
                domain::currencies::CurrencyType,
                domain::exchange_rates::Model,
                domain::orders::Model,
                domain::orders::OrderStatus,
                domain::payment_methods::Model,
                domain::users::Model,
                domain::users::UserRole,
                domain::users::UserStatus,
                domain::users::VerificationStatus,
                domain::currency::NewCurrency,
                domain::currency::CurrencyUpdate,
                domain::exchange_rate::RateInput,
                domain::exchange_rate::RateUpdate,
                domain::order::NewOrder,
                domain::order::StatusUpdate,
                domain::payment_method::NewPaymentMethod,
                domain::payment_method::PaymentMethodUpdate,
                domain::payment_method::PaymentDetails,
                domain::user::UserSync,
                domain::user::UserStatusUpdate,
            )
        ),
        tags(
            (name = "rayex_platform", description = "RayEx currency exchange API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .merge(health_routes())
        .merge(currency_routes(app_state.clone()))
        .merge(exchange_rate_routes(app_state.clone()))
        .merge(order_routes(app_state.clone()))
        .merge(payment_method_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(realtime_routes(app_state))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(cors)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_check_controller::banner))
        .route("/health", get(health_check_controller::health_check))
}

fn currency_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/currencies",
            get(currency_controller::index).post(currency_controller::create),
        )
        .route(
            "/api/currencies/:id",
            get(currency_controller::read)
                .put(currency_controller::update)
                .delete(currency_controller::delete),
        )
        .route(
            "/api/currencies/:id/toggle",
            post(currency_controller::toggle),
        )
        .with_state(app_state)
}

fn exchange_rate_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/exchange-rates",
            get(exchange_rate_controller::index).post(exchange_rate_controller::upsert),
        )
        .route(
            "/api/exchange-rates/refresh-all",
            post(exchange_rate_controller::refresh_all),
        )
        .route(
            "/api/exchange-rates/:id",
            get(exchange_rate_controller::read).put(exchange_rate_controller::update),
        )
        .route(
            "/api/exchange-rates/:id/refresh",
            post(exchange_rate_controller::refresh),
        )
        .with_state(app_state)
}

fn order_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/orders",
            get(order_controller::index).post(order_controller::create),
        )
        .route("/api/orders/by-user", get(order_controller::by_user))
        .route("/api/orders/:id", get(order_controller::read))
        .route(
            "/api/orders/:id/status",
            put(order_controller::update_status),
        )
        .with_state(app_state)
}

fn payment_method_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/payment-methods",
            get(payment_method_controller::index).post(payment_method_controller::create),
        )
        .route(
            "/api/payment-methods/:id",
            get(payment_method_controller::read)
                .put(payment_method_controller::update)
                .delete(payment_method_controller::delete),
        )
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(user_controller::index))
        .route("/api/users/sync", post(user_controller::sync))
        .route("/api/users/:id", get(user_controller::read))
        .route("/api/users/:id/status", put(user_controller::update_status))
        .with_state(app_state)
}

fn realtime_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/realtime/sse", get(handler::sse_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::app_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use domain::Id;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn currency_body(code: &str) -> Value {
        json!({
            "code": code,
            "name": format!("{code} currency"),
            "symbol": code,
            "flag": code,
            "type": "fiat"
        })
    }

    async fn create_currency(app: &Router, code: &str) -> Value {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/currencies", currency_body(code)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }

    async fn create_payment_method(app: &Router, currency: &Value) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/payment-methods",
                json!({
                    "name": "Bank transfer",
                    "type": "bank_transfer",
                    "currencyId": currency["id"],
                    "iban": "DE89370400440532013000"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = define_routes(app_state());

        let response = app.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn currency_crud_round() {
        let app = define_routes(app_state());
        let usd = create_currency(&app, "USD").await;
        assert_eq!(usd["decimals"], 2);
        assert_eq!(usd["active"], true);
        let id = usd["id"].as_str().unwrap().to_string();

        let duplicate = app
            .clone()
            .oneshot(json_request("POST", "/api/currencies", currency_body("USD")))
            .await
            .unwrap();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(duplicate).await,
            json!({"success": false, "message": "Currency with this code already exists"})
        );

        let toggled = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/currencies/{id}/toggle"),
                json!({}),
            ))
            .await
            .unwrap();
        let toggled = body_json(toggled).await;
        assert_eq!(toggled["data"]["active"], false);
        assert_eq!(toggled["message"], "Currency deactivated successfully");

        let deleted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/currencies/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let missing = app
            .oneshot(get_request(&format!("/api/currencies/{id}")))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_fields_are_a_bad_request() {
        let app = define_routes(app_state());

        let response = app
            .oneshot(json_request("POST", "/api/currencies", json!({"code": "USD"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Missing required fields");
    }

    #[tokio::test]
    async fn rate_update_is_pushed_to_public_stream() {
        let state = app_state();
        let app = define_routes(state.clone());
        let usd = create_currency(&app, "USD").await;
        let eur = create_currency(&app, "EUR").await;

        let stream = app
            .clone()
            .oneshot(get_request("/api/realtime/sse?role=public"))
            .await
            .unwrap();
        let mut frames = stream.into_body().into_data_stream();
        frames.next().await.unwrap().unwrap(); // connected

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/exchange-rates",
                json!({
                    "fromCurrencyId": usd["id"],
                    "toCurrencyId": eur["id"],
                    "rate": 0.92
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let frame = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame = String::from_utf8(frame.to_vec()).unwrap();
        assert!(frame.starts_with("event: rate_updated\n"), "got {frame:?}");
        assert!(frame.contains(r#""fromCurrency":{"#));
    }

    #[tokio::test]
    async fn orders_are_listed_with_pagination_and_by_user() {
        let app = define_routes(app_state());
        let usd = create_currency(&app, "USD").await;
        let eur = create_currency(&app, "EUR").await;
        let method = create_payment_method(&app, &usd).await;

        for email in ["ana@example.com", "bo@example.com", "ana@example.com"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/orders",
                    json!({
                        "userEmail": email,
                        "fromCurrencyId": usd["id"],
                        "fromAmount": 100.0,
                        "toCurrencyId": eur["id"],
                        "toAmount": 92.0,
                        "paymentMethodId": method["id"],
                        "exchangeRate": 0.92
                    }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let page = body_json(
            app.clone()
                .oneshot(get_request("/api/orders?page=1&limit=2"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(page["data"].as_array().unwrap().len(), 2);
        assert_eq!(
            page["pagination"],
            json!({"page": 1, "limit": 2, "total": 3, "totalPages": 2})
        );

        let mine = body_json(
            app.clone()
                .oneshot(get_request("/api/orders/by-user?email=ana@example.com"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(mine["data"].as_array().unwrap().len(), 2);

        let no_email = app
            .oneshot(get_request("/api/orders/by-user"))
            .await
            .unwrap();
        assert_eq!(no_email.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = define_routes(app_state());

        let response = app
            .oneshot(get_request("/api-docs/openapi.json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/api/orders/{id}/status"].is_object());
        assert!(doc["paths"]["/api/users/{id}/status"].is_object());
        assert!(doc["paths"]["/api/payment-methods/{id}"].is_object());
        let id = &doc["components"]["schemas"]["domain.currencies.Model"]["properties"]["id"];
        assert_eq!(id["type"], "string");
        assert_eq!(id["format"], "uuid");
        let param = &doc["paths"]["/api/currencies/{id}"]["get"]["parameters"][0];
        assert_eq!(param["name"], "id");
        assert_eq!(param["schema"]["type"], "string");
    }

    #[tokio::test]
    async fn payment_methods_crud_and_order_validation() {
        let app = define_routes(app_state());
        let usd = create_currency(&app, "USD").await;
        let eur = create_currency(&app, "EUR").await;
        let method = create_payment_method(&app, &usd).await;
        assert_eq!(method["active"], true);
        assert_eq!(method["type"], "bank_transfer");
        let id = method["id"].as_str().unwrap().to_string();

        let listed = body_json(
            app.clone()
                .oneshot(get_request("/api/payment-methods"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(listed["data"][0]["currency"]["code"], "USD");

        let missing = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/payment-methods",
                json!({"name": "Wallet"}),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(missing).await["message"],
            "Missing required fields: name, type, currencyId"
        );

        let order = json!({
            "userEmail": "ana@example.com",
            "fromCurrencyId": usd["id"],
            "fromAmount": 100.0,
            "toCurrencyId": eur["id"],
            "toAmount": 92.0,
            "paymentMethodId": Id::new_v4(),
            "exchangeRate": 0.92
        });
        let unknown = app
            .clone()
            .oneshot(json_request("POST", "/api/orders", order.clone()))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let mut order = order;
        order["paymentMethodId"] = json!(id);
        let placed = app
            .clone()
            .oneshot(json_request("POST", "/api/orders", order))
            .await
            .unwrap();
        assert_eq!(placed.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(placed).await["data"]["paymentMethod"]["name"],
            "Bank transfer"
        );

        let in_use = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/payment-methods/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(in_use.status(), StatusCode::CONFLICT);

        let updated = app
            .oneshot(json_request(
                "PUT",
                &format!("/api/payment-methods/{id}"),
                json!({"active": false, "instructions": "Quote the order id"}),
            ))
            .await
            .unwrap();
        let updated = body_json(updated).await;
        assert_eq!(updated["data"]["active"], false);
        assert_eq!(updated["data"]["iban"], "DE89370400440532013000");
        assert_eq!(updated["data"]["instructions"], "Quote the order id");
    }

    #[tokio::test]
    async fn user_status_change_is_pushed_to_admins() {
        let state = app_state();
        let app = define_routes(state.clone());

        let synced = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users/sync",
                json!({"name": "Ana", "email": "ana@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(synced.status(), StatusCode::OK);
        let user = body_json(synced).await["data"].clone();
        let id = user["id"].as_str().unwrap().to_string();

        let stream = app
            .clone()
            .oneshot(get_request("/api/realtime/sse?role=admin"))
            .await
            .unwrap();
        let mut frames = stream.into_body().into_data_stream();
        frames.next().await.unwrap().unwrap(); // connected

        let invalid = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/users/{id}/status"),
                json!({"status": "banned"}),
            ))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/users/{id}/status"),
                json!({"status": "suspended"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let frame = tokio::time::timeout(Duration::from_secs(1), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame = String::from_utf8(frame.to_vec()).unwrap();
        assert!(frame.starts_with("event: user_updated\n"), "got {frame:?}");
        assert!(frame.contains(r#""status":"suspended""#));

        let page = body_json(
            app.clone()
                .oneshot(get_request("/api/users?status=suspended"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["pagination"]["total"], 1);

        let detail = body_json(
            app.oneshot(get_request(&format!("/api/users/{id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(detail["data"]["email"], "ana@example.com");
        assert_eq!(detail["data"]["orders"], json!([]));
    }
}
