use crate::{
    error::{KafkaCode, Result},
    protocol::{
        api_versions::response::ApiVersion, ApiKey, ApiVersionsRequest, ApiVersionsResponse,
        Response,
    },
};

pub(crate) fn handle(req: &ApiVersionsRequest) -> Result<Option<Response>> {
    let api_keys = ApiKey::ALL
        .iter()
        .map(|key| {
            let (min_version, max_version) = key.versions();
            ApiVersion {
                api_key: i16::from(*key),
                min_version,
                max_version,
            }
        })
        .collect();

    // too new for us, answer in a layout every client can read
    let (version, error_code) = if ApiKey::ApiVersions.supports(req.version) {
        (req.version, KafkaCode::None)
    } else {
        (0, KafkaCode::UnsupportedVersion)
    };

    Ok(Some(Response::ApiVersions(ApiVersionsResponse {
        version,
        error_code,
        api_keys,
        throttle_time_ms: 0,
    })))
}
