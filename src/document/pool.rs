//! Role-scoped document table
//!
//! A run holds exactly four long-lived documents, one per role. Each role is
//! used by one operation at a time and never shared with another role.

use crate::document::{Browser, Document, DocumentResult};
use std::fmt;

/// What a document is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentRole {
    /// Catalog listing pages
    Main,

    /// Product detail pages
    ItemDetail,

    /// Dropdown targets and swatch pages of swatch × dropdown products
    ComboOuter,

    /// Option selection inside swatch × dropdown products
    ComboInner,
}

impl DocumentRole {
    pub fn all() -> [DocumentRole; 4] {
        [Self::Main, Self::ItemDetail, Self::ComboOuter, Self::ComboInner]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ItemDetail => "item_detail",
            Self::ComboOuter => "combo_outer",
            Self::ComboInner => "combo_inner",
        }
    }
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The documents a variation resolver works with
pub struct VariantDocuments<'a, D> {
    pub detail: &'a mut D,
    pub outer: &'a mut D,
    pub inner: &'a mut D,
}

/// Fixed table of documents indexed by role
pub struct DocumentPool<D> {
    main: D,
    item_detail: D,
    combo_outer: D,
    combo_inner: D,
}

impl<D: Document> DocumentPool<D> {
    /// Opens one document per role
    pub async fn acquire<B>(browser: &B) -> DocumentResult<Self>
    where
        B: Browser<Document = D>,
    {
        let main = browser.new_document().await?;
        let item_detail = browser.new_document().await?;
        let combo_outer = browser.new_document().await?;
        let combo_inner = browser.new_document().await?;

        tracing::debug!("Opened {} documents", DocumentRole::all().len());

        Ok(Self {
            main,
            item_detail,
            combo_outer,
            combo_inner,
        })
    }

    pub fn get(&self, role: DocumentRole) -> &D {
        match role {
            DocumentRole::Main => &self.main,
            DocumentRole::ItemDetail => &self.item_detail,
            DocumentRole::ComboOuter => &self.combo_outer,
            DocumentRole::ComboInner => &self.combo_inner,
        }
    }

    pub fn get_mut(&mut self, role: DocumentRole) -> &mut D {
        match role {
            DocumentRole::Main => &mut self.main,
            DocumentRole::ItemDetail => &mut self.item_detail,
            DocumentRole::ComboOuter => &mut self.combo_outer,
            DocumentRole::ComboInner => &mut self.combo_inner,
        }
    }

    /// Borrows the three documents used while resolving variations
    pub fn variant_documents(&mut self) -> VariantDocuments<'_, D> {
        VariantDocuments {
            detail: &mut self.item_detail,
            outer: &mut self.combo_outer,
            inner: &mut self.combo_inner,
        }
    }

    /// Closes every document
    ///
    /// All roles are closed even if one fails; the first error is returned.
    pub async fn release(mut self) -> DocumentResult<()> {
        let mut first_error = None;

        for role in DocumentRole::all() {
            if let Err(e) = self.get_mut(role).close().await {
                tracing::warn!("Failed to close {} document: {}", role, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
