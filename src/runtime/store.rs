use crate::error::StoreError;
use crate::runtime::types::{
    DivisionFields, DivisionRef, ParagraphFields, ParagraphKey, ParagraphRef, SectionFields,
    SectionRef, SubDivisionFields, SubDivisionRef, SupplementaryUnitFields, SupplementaryUnitRef,
};
use async_trait::async_trait;

/// Insert-or-update persistence keyed by natural keys. Calling any method
/// twice with the same key must return the same reference and overwrite the
/// non-key fields with the latest values.
#[async_trait]
pub trait UpsertAdapter: Send + Sync {
    async fn upsert_division(
        &self,
        number: &str,
        fields: &DivisionFields,
    ) -> Result<DivisionRef, StoreError>;

    async fn upsert_subdivision(
        &self,
        division: DivisionRef,
        code: &str,
        fields: &SubDivisionFields,
    ) -> Result<SubDivisionRef, StoreError>;

    /// Sections are keyed by (division, number); the placeholder section "-"
    /// is keyed by its sub-division instead.
    async fn upsert_section(
        &self,
        subdivision: SubDivisionRef,
        number: &str,
        fields: &SectionFields,
    ) -> Result<SectionRef, StoreError>;

    async fn upsert_paragraph(
        &self,
        section: SectionRef,
        key: &ParagraphKey,
        fields: &ParagraphFields,
    ) -> Result<ParagraphRef, StoreError>;

    async fn upsert_supplementary_unit(
        &self,
        division: DivisionRef,
        number: &str,
        fields: &SupplementaryUnitFields,
    ) -> Result<SupplementaryUnitRef, StoreError>;
}
