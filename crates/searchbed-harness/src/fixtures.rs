//! Fixture population
//!
//! Bulk-submits a manager's declared documents and makes them visible with
//! exactly one commit/refresh pair per population. Visibility is the
//! guarantee test bodies rely on: after [`populate`] returns, every
//! submitted document can be read back from that manager.

use searchbed_core::document::{DocumentsByType, document_count};
use searchbed_core::error::HarnessResult;
use searchbed_core::manager::ManagerHandle;

/// Submit every document in `documents_by_type` to `handle` in declared
/// order, then issue one `commit` and one `refresh`.
///
/// A fixture set with zero documents is a no-op: no bulk, commit, or
/// refresh call is made.
pub fn populate(handle: &dyn ManagerHandle, documents_by_type: &DocumentsByType) -> HarnessResult<()> {
    let total = document_count(documents_by_type);
    if total == 0 {
        return Ok(());
    }

    for (doc_type, documents) in documents_by_type {
        for document in documents {
            handle.bulk_index(doc_type, document)?;
        }
    }

    handle.commit()?;
    handle.refresh()?;
    tracing::debug!(documents = total, "fixture population committed");
    Ok(())
}
