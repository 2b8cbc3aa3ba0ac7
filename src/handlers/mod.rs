pub mod account;
pub mod admin;
pub mod application;
pub mod fallback;
pub mod health;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::config::Config;
    use crate::core::state::MemoryState;
    use crate::security::admin_policy::AdminPolicy;
    use crate::stores::kv::MemoryKv;
    use crate::stores::record_store::{RecordStore, StorageKeys};
    use axum::body::Body;
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;

    pub fn create_test_state() -> Arc<MemoryState> {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();
        let store = RecordStore::new(
            MemoryKv::new(),
            StorageKeys::default(),
            AdminPolicy::new(&config.admin.usernames),
        );
        Arc::new(MemoryState::new(store))
    }

    pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let body = Body::new(response.into_body());
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
