use crate::middleware::secret_key;
use crate::{consts, AppState};
use actix_web::{http::StatusCode, middleware::from_fn, web, HttpResponse};
use application::error::AppError;
use application::resolver::ColorMode;
use domain::color::ColorHex;
use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Resolve(#[from] AppError),
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Resolve(AppError::UnsupportedMode(_)) => StatusCode::BAD_REQUEST,
            Self::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // 内部错误只记日志，不把上游信息带给调用方
    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return HttpResponse::build(status).finish();
        }
        HttpResponse::build(status).body(self.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TrackColorRequest {
    from: Option<String>,
    colors: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct TrackColorResponse {
    color: Option<String>,
}

/// 校验后的请求参数
#[derive(Debug, PartialEq)]
pub struct TrackColorQuery {
    pub mode: ColorMode,
    pub palette: Vec<ColorHex>,
}

/// 解析请求体：空请求体等同于 `{}`，`from` 缺省为 album
pub fn parse_request(body: &[u8]) -> Result<TrackColorQuery, ApiError> {
    let request: TrackColorRequest = if body.iter().all(u8::is_ascii_whitespace) {
        TrackColorRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let mode = match request.from.as_deref() {
        None => ColorMode::Album,
        Some(from) => from
            .parse::<ColorMode>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };

    let palette = request
        .colors
        .unwrap_or_default()
        .iter()
        .map(|c| ColorHex::parse(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(TrackColorQuery { mode, palette })
}

async fn track_color(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let query = parse_request(&body)?;

    let color = state
        .resolver
        .resolve_with_palette(&query.mode.to_string(), &query.palette)
        .await
        .map_err(|e| {
            error!("Failed to resolve track color ({}): {}", query.mode, e);
            e
        })?;

    Ok(HttpResponse::Ok().json(TrackColorResponse {
        color: color.map(String::from),
    }))
}

pub fn configure_service(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(consts::TRACK_COLOR_PATH)
            .wrap(from_fn(secret_key::verify_secret_key))
            .route(web::post().to(track_color))
            .route(web::get().to(track_color)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, App};
    use application::auth::{CredentialExchange, TokenCache, TokenGrant};
    use application::playback::{PlaybackSource, PlaybackStateClient};
    use application::resolver::ColorResolver;
    use application::strategy::{Capability, ColorStrategy};
    use async_trait::async_trait;
    use domain::playback::PlaybackSnapshot;
    use domain::token::{AccessToken, TokenRepository};
    use infra::config::AppConfigImpl;
    use infra::InMemoryTokenRepository;
    use serde_json::json;
    use std::sync::Arc;

    struct RejectingExchange;

    #[async_trait]
    impl CredentialExchange for RejectingExchange {
        async fn refresh(&self) -> Result<TokenGrant, AppError> {
            Err(AppError::AuthRefresh {
                status: Some(400),
                message: "invalid_grant".to_string(),
            })
        }
    }

    struct FixedPlayback(Result<PlaybackSnapshot, u16>);

    #[async_trait]
    impl PlaybackSource for FixedPlayback {
        async fn fetch(&self, _bearer: &str) -> Result<PlaybackSnapshot, AppError> {
            self.0.clone().map_err(|status| AppError::PlaybackFetch {
                status: Some(status),
                message: "upstream".to_string(),
            })
        }
    }

    struct FixedStrategy(&'static str);

    #[async_trait]
    impl ColorStrategy for FixedStrategy {
        fn capability(&self) -> Capability {
            Capability::AlbumArt
        }

        async fn extract(&self, _track: &PlaybackSnapshot) -> Result<Option<ColorHex>, AppError> {
            Ok(Some(ColorHex::parse(self.0)?))
        }
    }

    fn app_config() -> AppConfigImpl {
        let config = config::Config::builder()
            .set_override("secret_key", "s3cret")
            .unwrap()
            .set_override("spotify.client_id", "id")
            .unwrap()
            .set_override("spotify.client_secret", "secret")
            .unwrap()
            .set_override("spotify.refresh_token", "refresh")
            .unwrap()
            .set_override("token_store.backend", "memory")
            .unwrap()
            .build()
            .unwrap();
        AppConfigImpl::from_config(config).unwrap()
    }

    async fn state(playback: Result<PlaybackSnapshot, u16>) -> web::Data<AppState> {
        let repo = InMemoryTokenRepository::new();
        repo.insert(&AccessToken::expiring_in("cached", 3600).unwrap())
            .await
            .unwrap();
        let tokens = Arc::new(TokenCache::new(Arc::new(repo), Arc::new(RejectingExchange)));
        let playback = Arc::new(PlaybackStateClient::new(
            tokens,
            Arc::new(FixedPlayback(playback)),
        ));
        let resolver = ColorResolver::new(playback, vec![Arc::new(FixedStrategy("#FF0000"))]);

        web::Data::new(AppState {
            app_cfg: app_config(),
            resolver: Arc::new(resolver),
        })
    }

    fn playing() -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: true,
            track_name: "Yellow".to_string(),
            primary_artist: "Coldplay".to_string(),
            album_image_url: Some("https://i.scdn.co/image/640".to_string()),
        }
    }

    #[test]
    fn test_parse_request_defaults() {
        assert_eq!(
            parse_request(b"").unwrap(),
            TrackColorQuery {
                mode: ColorMode::Album,
                palette: vec![]
            }
        );
        assert_eq!(parse_request(b"{}").unwrap().mode, ColorMode::Album);
    }

    #[test]
    fn test_parse_request_with_palette() {
        let query =
            parse_request(br##"{"from":"lyrics","colors":["#FE0101","#0f0"],"extra":1}"##).unwrap();

        assert_eq!(query.mode, ColorMode::Lyrics);
        assert_eq!(
            query.palette,
            vec![
                ColorHex::parse("#FE0101").unwrap(),
                ColorHex::parse("#0f0").unwrap()
            ]
        );
    }

    #[test]
    fn test_parse_request_rejects_invalid_input() {
        for body in [
            &br#"{"from":"artist"}"#[..],
            &br#"{"from":"Album"}"#[..],
            &br##"{"colors":["#12345"]}"##[..],
            &br#"{"colors":["red"]}"#[..],
            &br##"{"colors":"#ffffff"}"##[..],
            &b"not json"[..],
        ] {
            assert!(
                matches!(parse_request(body), Err(ApiError::BadRequest(_))),
                "body {:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[actix_web::test]
    async fn test_missing_secret_is_unauthorized() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(playing())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .set_payload("{\"from\":\"bogus\"}")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "wrong"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_invalid_body_is_bad_request() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(playing())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .set_payload(r#"{"colors":["blue"]}"#)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_color_mapped_to_palette() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(playing())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .set_json(json!({"from": "album", "colors": ["#00FF00", "#FE0101"]}))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({"color": "#FE0101"}));
    }

    #[actix_web::test]
    async fn test_raw_color_without_palette() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(playing())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({"color": "#FF0000"}));
    }

    #[actix_web::test]
    async fn test_get_route_resolves_color() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(playing())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"color": "#FF0000"}));

        let req = actix_test::TestRequest::get()
            .uri(consts::TRACK_COLOR_PATH)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_nothing_playing_is_null() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Ok(PlaybackSnapshot::idle())).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .set_json(json!({"colors": ["#00FF00"]}))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, json!({"color": null}));
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_internal_error() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(Err(503)).await)
                .configure(configure_service),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri(consts::TRACK_COLOR_PATH)
            .insert_header((consts::SECRET_KEY_HEADER, "s3cret"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
