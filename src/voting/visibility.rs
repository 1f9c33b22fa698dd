use log::info;

use crate::error::Result;
use crate::model::{
    db::{SettingValue, RESULTS_VISIBILITY},
    mongodb::Id,
};
use crate::store::Store;

use super::require_admin;

/// Whether results have been released. False until an admin says otherwise.
pub async fn get_visibility(store: &dyn Store) -> Result<bool> {
    Ok(store
        .setting(RESULTS_VISIBILITY)
        .await?
        .map_or(false, |value| value.is_truthy()))
}

/// Release or hide results. Admin only.
pub async fn set_visibility(store: &dyn Store, caller: Id, visible: bool) -> Result<bool> {
    require_admin(store, caller).await?;
    let value = store
        .upsert_setting(RESULTS_VISIBILITY, SettingValue::from(visible))
        .await?;
    info!("Results visibility set to {visible} by {caller}");
    Ok(value.is_truthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{MemoryStore, SettingsStore};
    use crate::voting::testing::populated;

    #[rocket::async_test]
    async fn defaults_to_hidden() {
        let store = MemoryStore::new();
        assert!(!get_visibility(&store).await.unwrap());
    }

    #[rocket::async_test]
    async fn admin_toggles() {
        let (store, admin, _, _) = populated().await;
        assert!(set_visibility(&store, admin.id, true).await.unwrap());
        assert!(get_visibility(&store).await.unwrap());
        assert!(!set_visibility(&store, admin.id, false).await.unwrap());
        assert!(!get_visibility(&store).await.unwrap());
    }

    #[rocket::async_test]
    async fn voter_refused() {
        let (store, admin, voter, _) = populated().await;
        let result = set_visibility(&store, voter.id, true).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(!get_visibility(&store).await.unwrap());

        set_visibility(&store, admin.id, true).await.unwrap();
        let result = set_visibility(&store, voter.id, false).await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(get_visibility(&store).await.unwrap());
    }

    #[rocket::async_test]
    async fn reads_loose_values() {
        let store = MemoryStore::new();
        store
            .upsert_setting(RESULTS_VISIBILITY, SettingValue::Text("yes".to_string()))
            .await
            .unwrap();
        assert!(get_visibility(&store).await.unwrap());
        store
            .upsert_setting(RESULTS_VISIBILITY, SettingValue::Number(0.0))
            .await
            .unwrap();
        assert!(!get_visibility(&store).await.unwrap());
    }
}
