use crate::color_api::ApiError;
use crate::{consts, AppState};
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, ResponseError,
};
use log::warn;

fn secret_matches(provided: Option<&str>, expected: &str) -> bool {
    matches!(provided, Some(value) if !expected.is_empty() && value == expected)
}

/// 校验 `secret_key` 请求头，先于请求体校验执行
pub async fn verify_secret_key(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let provided = req
        .headers()
        .get(consts::SECRET_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    let authorized = req
        .app_data::<web::Data<AppState>>()
        .map(|state| secret_matches(provided, state.app_cfg.secret_key()))
        .unwrap_or(false);

    if !authorized {
        warn!(
            "Rejected request to {} from {:?}: bad secret key",
            req.path(),
            req.peer_addr()
        );
        let rsp = req.into_response(ApiError::Unauthorized.error_response());
        return Ok(rsp.map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
