//! Listing and stat plumbing between the adapter and the upstream facade.
//!
//! The upstream exposes objects and common prefixes but cannot answer "is
//! this path a directory?" directly, so directory-ness is decided here by
//! probing: stat first, then a single-entry listing of `path + "/"`.

use std::sync::Arc;

use common::RemotePath;

use crate::cache::{MetaKey, MetadataCache, ObjectEntry};
use crate::upstream::{ListParams, ObjectStore, PathType, UpstreamError};

use super::fileinfo::ObjectInfo;

pub(crate) const PATH_DELIMITER: &str = "/";
pub(crate) const MAX_PAGE_SIZE: u64 = 1000;

pub(crate) type FilterFn = fn(parent: &str, path: &str) -> bool;

/// Basename with the semantics the hidden-name checks need: the empty and
/// root paths map to `"."`, which is never considered hidden.
pub(crate) fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ".";
    }
    trimmed.rsplit('/').next().unwrap_or(".")
}

pub(crate) fn is_hidden(base: &str) -> bool {
    base != "." && base.starts_with('.')
}

/// Filter out dotfiles.
pub(crate) fn skip_hidden(_parent: &str, path: &str) -> bool {
    !is_hidden(basename(path))
}

/// Filter out entries shorter than the listed prefix. The server should
/// never return these.
pub(crate) fn skip_empty(parent: &str, path: &str) -> bool {
    path.len() >= parent.len()
}

/// List one directory of the remote tree.
///
/// `amount <= 0` means unbounded: all pages are drained and the result is
/// served from (and stored into) the listing cache. Bounded listings never
/// touch the cache. When filters are present, pages of [`MAX_PAGE_SIZE`]
/// are fetched regardless of `amount`, because filtering shrinks the
/// visible count unpredictably.
pub(crate) async fn list_directory(
    cache: &MetadataCache,
    store: &dyn ObjectStore,
    location: &RemotePath,
    amount: i64,
    filters: &[FilterFn],
) -> Result<Arc<Vec<ObjectInfo>>, UpstreamError> {
    let cache_key = MetaKey::from_location(location);

    let mut dir_path = location.path.clone();
    if !dir_path.is_empty() && !dir_path.ends_with(PATH_DELIMITER) {
        dir_path.push_str(PATH_DELIMITER);
    }

    let listing_amount = if amount <= 0 || amount >= MAX_PAGE_SIZE as i64 || !filters.is_empty() {
        MAX_PAGE_SIZE
    } else {
        amount as u64
    };

    if amount <= 0 {
        if let Some(cached) = cache.get_listing(&cache_key) {
            return Ok(cached);
        }
    }

    let mut results: Vec<ObjectInfo> = Vec::new();
    let mut has_more = true;
    let mut next_offset = String::new();
    while has_more && (amount <= 0 || (results.len() as i64) < amount) {
        let page = store
            .list_objects(
                &location.repository,
                &location.reference,
                &ListParams {
                    prefix: dir_path.clone(),
                    delimiter: PATH_DELIMITER.to_string(),
                    after: next_offset.clone(),
                    amount: listing_amount,
                },
            )
            .await?;

        for result in page.results {
            let entry_path = result.path.trim_end_matches(PATH_DELIMITER).to_string();
            if !filters.iter().all(|filter| filter(&dir_path, &entry_path)) {
                continue;
            }
            let dir = result.path_type == PathType::CommonPrefix;
            results.push(ObjectInfo {
                location: RemotePath::new(
                    location.repository.clone(),
                    location.reference.clone(),
                    entry_path,
                ),
                dir,
                stat: Some(result),
            });
            if amount > 0 && results.len() as i64 >= amount {
                break;
            }
        }
        has_more = page.pagination.has_more;
        next_offset = page.pagination.next_offset;
    }

    let results = Arc::new(results);
    if amount <= 0 {
        cache.set_listing(cache_key, results.clone());
    }
    Ok(results)
}

/// Directory probe: a path is a directory iff listing `path + "/"` yields
/// at least one entry. A cached full listing for the path settles it
/// without going upstream.
pub(crate) async fn get_dir_info(
    cache: &MetadataCache,
    store: &dyn ObjectStore,
    location: &RemotePath,
) -> Result<ObjectInfo, UpstreamError> {
    let cache_key = MetaKey::from_location(location);
    if cache.get_listing(&cache_key).is_some() {
        return Ok(ObjectInfo::directory(location.clone()));
    }
    let listing = list_directory(cache, store, location, 1, &[]).await?;
    if listing.is_empty() {
        return Err(UpstreamError::NotFound);
    }
    Ok(ObjectInfo::directory(location.clone()))
}

/// Stat one object, with positive and negative caching.
pub(crate) async fn get_file_info(
    cache: &MetadataCache,
    store: &dyn ObjectStore,
    location: &RemotePath,
) -> Result<ObjectInfo, UpstreamError> {
    if location.path.is_empty() {
        // The upstream cannot stat a repository root.
        return Err(UpstreamError::NotFound);
    }
    let cache_key = MetaKey::from_location(location);
    if let Some(entry) = cache.get_object(&cache_key) {
        return match entry {
            ObjectEntry::Present(info) => Ok(info),
            ObjectEntry::Missing => Err(UpstreamError::NotFound),
        };
    }
    match store
        .stat_object(&location.repository, &location.reference, &location.path)
        .await
    {
        Ok(stat) => {
            let info = ObjectInfo::file(location.clone(), stat);
            cache.set_object(cache_key, ObjectEntry::Present(info.clone()));
            Ok(info)
        }
        Err(UpstreamError::NotFound) => {
            cache.set_object(cache_key, ObjectEntry::Missing);
            Err(UpstreamError::NotFound)
        }
        Err(err) => Err(err),
    }
}
