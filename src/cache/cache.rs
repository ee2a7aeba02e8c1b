use std::{
    fmt::{self, Display},
    future::Future,
};

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{CacheError, Error},
    CACHE_TTL_SECONDS,
};

// Caching - keys

#[derive(Serialize, Clone, Debug)]
pub struct CacheKey<T: ToString + Serialize> {
    value: T,
    kind: CacheKeyType,
}

impl<T: ToString + Serialize> CacheKey<T> {
    pub fn from(kind: CacheKeyType, key: T) -> Self {
        Self {
            value: key,
            kind,
        }
    }

}

impl<T: ToString + Serialize> Display for CacheKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CacheKeyType::Tag => write!(f, "tag-{}", self.value.to_string()),
            CacheKeyType::Ingredient => write!(f, "ingredient-{}", self.value.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum CacheKeyType {
    Tag,
    Ingredient,
}

impl CacheKeyType {
    pub fn new<T: ToString + Serialize>(self, key: T) -> CacheKey<T> {
        CacheKey::from(self, key)
    }
}

impl<T: ToString + Serialize> From<&CacheKey<T>> for CacheLifetime {
    fn from(key: &CacheKey<T>) -> Self {
        match key.kind {
            CacheKeyType::Tag => CacheLifetime::BindTagCache,
            CacheKeyType::Ingredient => CacheLifetime::BindIngredientCache,
        }
    }
}

// Cache - wrappers

/// Every cached value remembers the binding of its catalog at write time and
/// is stale once that binding changes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CacheLifetime {
    BindTagCache,
    BindIngredientCache,
}

impl CacheLifetime {
    fn bind_key(&self) -> &'static str {
        match self {
            CacheLifetime::BindTagCache => "tag-cache-key",
            CacheLifetime::BindIngredientCache => "ingredient-cache-key",
        }
    }

    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, Error> {
        get_cache_value::<&str, String>(self.bind_key(), cache).await
    }

    pub async fn validate_cache_bind(
        &self,
        bind: &Option<String>,
        cache: &mut MultiplexedConnection,
    ) -> Result<bool, Error> {
        Ok(bind == &self.get_cache_bind(cache).await?)
    }

    pub async fn invalidate(&self, cache: &mut MultiplexedConnection) -> Result<(), Error> {
        let bind = uuid::Uuid::new_v4().to_string();
        log::trace!("> Rotating {}", self.bind_key());
        set_cache_value(self.bind_key(), bind, cache).await
    }
}

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T: Serialize + DeserializeOwned + Send + Sync + Clone> RedisValue<T> {
    fn new(value: T, lifetime: CacheLifetime, bind: Option<String>) -> Self {
        Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        }
    }

    async fn validate(&self, cache: &mut MultiplexedConnection) -> Result<bool, Error> {
        self._lifetime.validate_cache_bind(&self._bind, cache).await
    }

    /// Stored value under `key` if its binding is still current.
    async fn lookup<K>(
        key: &CacheKey<K>,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<Self>, Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
    {
        let value = get_cache_value::<String, RedisValue<T>>(key.to_string(), cache)
            .await
            .unwrap_or_else(|_| {
                let mut c = cache.clone();
                let k = key.to_string();
                tokio::spawn(async move {
                    log::error!("> Failed to deserialize cached value. Deleting {}", &k);
                    if let Err(e) = delete_cache_value(k, &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            });
        match value {
            Some(value) => {
                log::trace!("> Found {key}");
                match value.validate(cache).await? {
                    true => Ok(Some(value)),
                    false => {
                        log::trace!("> Invalidated {key}");
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }

    /// Stores `value` under the binding read before it was fetched, so a write
    /// that lands in between leaves the entry already stale.
    async fn store<K>(
        key: &CacheKey<K>,
        value: T,
        bind: Option<String>,
        cache: &mut MultiplexedConnection,
    ) -> Self
    where
        K: ToString + Serialize + Clone + Send + Sync,
    {
        let value = RedisValue::new(value, CacheLifetime::from(key), bind);

        if let Err(e) =
            set_expiring_cache_value(key.to_string(), value.clone(), CACHE_TTL_SECONDS, cache).await
        {
            log::error!("> Failed to store {key}: {e}");
        }

        value
    }

    pub async fn get_or_optional<F, Fut, K>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<Option<RedisValue<T>>, Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<T>, Error>> + Send,
    {
        if let Some(value) = Self::lookup(&key, cache).await? {
            return Ok(Some(value));
        }

        let bind = CacheLifetime::from(&key).get_cache_bind(cache).await?;
        log::trace!("> Fetching {key}");
        match callback().await? {
            Some(value) => Ok(Some(Self::store(&key, value, bind, cache).await)),
            None => Ok(None),
        }
    }

    pub async fn get_or<F, Fut, K>(
        key: CacheKey<K>,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<RedisValue<T>, Error>
    where
        K: ToString + Serialize + Clone + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        if let Some(value) = Self::lookup(&key, cache).await? {
            return Ok(value);
        }

        let bind = CacheLifetime::from(&key).get_cache_bind(cache).await?;
        log::trace!("> Fetching {key}");
        let value = callback().await?;
        Ok(Self::store(&key, value, bind, cache).await)
    }
}

/// Reads through the cache when one is configured, straight from `callback`
/// otherwise.
pub async fn cached<T, F, Fut, K>(
    key: CacheKey<K>,
    cache: Option<MultiplexedConnection>,
    callback: F,
) -> Result<T, Error>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
    K: ToString + Serialize + Clone + Send + Sync,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, Error>> + Send,
{
    match cache {
        Some(mut cache) => Ok(RedisValue::get_or(key, &mut cache, callback).await?.value),
        None => callback().await,
    }
}

pub async fn cached_optional<T, F, Fut, K>(
    key: CacheKey<K>,
    cache: Option<MultiplexedConnection>,
    callback: F,
) -> Result<Option<T>, Error>
where
    T: Serialize + DeserializeOwned + Send + Sync + Clone,
    K: ToString + Serialize + Clone + Send + Sync,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<T>, Error>> + Send,
{
    match cache {
        Some(mut cache) => Ok(RedisValue::get_or_optional(key, &mut cache, callback)
            .await?
            .map(|cached| cached.value)),
        None => callback().await,
    }
}

pub async fn invalidate_cache(
    lifetime: CacheLifetime,
    cache: Option<MultiplexedConnection>,
) -> Result<(), Error> {
    match cache {
        Some(mut cache) => lifetime.invalidate(&mut cache).await,
        None => Ok(()),
    }
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache.set(key, value).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn set_expiring_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    seconds: u64,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache
        .set_ex(key, value, seconds)
        .await
        .map_err(CacheError::from)?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), Error> {
    let _: () = cache.del(key).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, Error> {
    let value: Option<V> = cache.get(key).await.map_err(CacheError::from)?;

    Ok(value)
}
