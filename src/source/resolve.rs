//! Service-name resolution and deduplication.

use std::collections::HashSet;
use std::sync::Arc;

use super::{LogSource, SourceDescriptor, SourceError};

/// Resolve service-name filters into a deduplicated set of descriptors.
///
/// An empty filter list means every running container. Named filters are
/// looked up concurrently, one task per filter; if any lookup fails the whole
/// call fails without a partial result. Matches from overlapping filters are
/// deduplicated by container id, first seen wins. Zero matches is a valid
/// empty result, not an error.
pub async fn resolve(
    source: &Arc<dyn LogSource>,
    filters: &[String],
) -> Result<Vec<SourceDescriptor>, SourceError> {
    if filters.is_empty() {
        return source.list_all().await;
    }

    let mut lookups = Vec::with_capacity(filters.len());
    for name in filters {
        let source = Arc::clone(source);
        let name = name.clone();
        lookups.push(tokio::spawn(
            async move { source.list_by_service(&name).await },
        ));
    }

    let mut found = Vec::new();
    for lookup in lookups {
        let batch = lookup
            .await
            .map_err(|err| SourceError::Backend(format!("lookup task failed: {err}")))??;
        found.extend(batch);
    }

    let mut seen = HashSet::new();
    found.retain(|descriptor| seen.insert(descriptor.id.clone()));
    Ok(found)
}
