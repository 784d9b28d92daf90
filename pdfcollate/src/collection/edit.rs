//! Applying edit scripts to a collection.

use super::{DocumentId, PageCollection, PageId};
use crate::config::{Edit, PageRef};
use crate::error::{PdfCollateError, Result};

impl PageCollection {
    /// Apply one edit step.
    ///
    /// `inputs[n]` is the document uploaded for input `n + 1`, or `None` when
    /// that upload was rejected. Returns whether the collection changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit names a rejected input or a page number
    /// the document never had. Pages that existed but were already removed
    /// are skipped.
    pub fn apply_edit(&mut self, edit: &Edit, inputs: &[Option<DocumentId>]) -> Result<bool> {
        let changed = match edit {
            Edit::Move { page, to } => match self.resolve_page(edit, page, inputs)? {
                Some(id) => self.reorder(id, *to),
                None => false,
            },
            Edit::Delete { page } => match self.resolve_page(edit, page, inputs)? {
                Some(id) => self.delete_one(id).is_some(),
                None => false,
            },
            Edit::Select { page } => match self.resolve_page(edit, page, inputs)? {
                Some(id) => {
                    self.toggle_select(id);
                    true
                }
                None => false,
            },
            Edit::DeleteSelected => !self.delete_selected().is_empty(),
            Edit::ClearSelection => {
                let had_selection = !self.selection().is_empty();
                self.clear_selection();
                had_selection
            }
            Edit::RemoveDocument { document } => {
                let id = resolve_input(edit, *document, inputs)?;
                self.remove_document(id).is_some()
            }
        };

        tracing::debug!(%edit, changed, "Applied edit");
        Ok(changed)
    }

    /// Apply edit steps in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// See [`PageCollection::apply_edit`].
    pub fn apply_edits(&mut self, edits: &[Edit], inputs: &[Option<DocumentId>]) -> Result<()> {
        for edit in edits {
            self.apply_edit(edit, inputs)?;
        }
        Ok(())
    }

    fn resolve_page(
        &self,
        edit: &Edit,
        page: &PageRef,
        inputs: &[Option<DocumentId>],
    ) -> Result<Option<PageId>> {
        let id = resolve_input(edit, page.document, inputs)?;

        if let Some(found) = self.find_page(id, page.page) {
            return Ok(Some(found.id));
        }

        match self.document(id) {
            Some(doc) if page.page > doc.page_count() => Err(PdfCollateError::invalid_edit(
                edit.to_string(),
                format!(
                    "input {} has only {} page(s)",
                    page.document,
                    doc.page_count()
                ),
            )),
            _ => {
                tracing::warn!(%edit, "Page already removed, skipping edit");
                Ok(None)
            }
        }
    }
}

fn resolve_input(edit: &Edit, position: usize, inputs: &[Option<DocumentId>]) -> Result<DocumentId> {
    let slot = position
        .checked_sub(1)
        .and_then(|index| inputs.get(index))
        .ok_or_else(|| {
            PdfCollateError::invalid_edit(edit.to_string(), format!("no input {position}"))
        })?;

    (*slot).ok_or_else(|| {
        PdfCollateError::invalid_edit(
            edit.to_string(),
            format!("input {position} was rejected"),
        )
    })
}
