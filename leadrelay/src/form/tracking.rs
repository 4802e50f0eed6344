use url::Url;

use crate::api::models::leads::{TrackingKey, TrackingParams};

/// Campaign tracking parameters present in `page_url`'s query string.
///
/// Only recognised keys with a non-empty value are kept. A key repeated in the query
/// keeps its first value.
pub fn extract_tracking_params(page_url: &Url) -> TrackingParams {
    let mut params = TrackingParams::new();
    for (key, value) in page_url.query_pairs() {
        if let Some(key) = TrackingKey::parse(&key)
            && !value.is_empty()
            && params.get(key).is_none()
        {
            params.insert(key, value.into_owned());
        }
    }
    params
}
