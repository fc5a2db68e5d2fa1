use crate::store::keys;
use crate::store::operations::users::User;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_normalize_user_keys", m002_normalize_user_keys),
    ]
}

/// Applies every migration newer than the stored schema version.
///
/// Migrations must be idempotent: a crash between `func()` and
/// `set_version()` reruns the step on the next start. Versions only move
/// forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: "corrupt schema version marker".to_string(),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Early databases keyed accounts by the name exactly as typed. Re-key them
/// by the normalized name so lookups are case-insensitive.
fn m002_normalize_user_keys(store: &Store) -> Result<(), StoreError> {
    for item in store.users.iter() {
        let (raw_key, value) = item?;
        let user: User = Store::deserialize(&value)?;
        let normalized = keys::user_key(&user.name);
        if raw_key.as_ref() == normalized.as_bytes() {
            continue;
        }

        if store.users.get(normalized.as_bytes())?.is_some() {
            tracing::warn!(
                user = %user.name,
                "Skipping re-key, normalized name already taken"
            );
            continue;
        }
        store.users.insert(normalized.as_bytes(), value)?;
        store.users.remove(raw_key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::curriculum::Level;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db2");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }

    #[test]
    fn legacy_user_keys_are_normalized() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db3").to_str().unwrap()).unwrap();

        let user = User::new("MixedCase", "h".to_string(), Level::B1);
        store
            .users
            .insert("MixedCase", Store::serialize(&user).unwrap())
            .unwrap();

        run(&store).unwrap();

        assert!(store.users.get("MixedCase").unwrap().is_none());
        assert_eq!(store.load_user("mixedcase").unwrap().unwrap().level, Level::B1);
    }
}
