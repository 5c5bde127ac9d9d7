use crate::error::StoreError;
use crate::runtime::callbacks::post_upsert;
use crate::runtime::store::UpsertAdapter;
use crate::runtime::types::{
    DivisionFields, DivisionRef, ParagraphFields, ParagraphKey, ParagraphRef, SectionFields,
    SectionRef, SubDivisionFields, SubDivisionRef, SupplementaryUnitFields, SupplementaryUnitRef,
    UpsertOp,
};
use crate::types::CallbackTarget;
use async_trait::async_trait;
use reqwest::Client;

/// Forwards every upsert to the callback host, which owns the natural-key
/// uniqueness and answers with the surrogate id.
pub struct HttpUpsertStore {
    client: Client,
    target: CallbackTarget,
}

impl HttpUpsertStore {
    pub fn new(client: Client, target: CallbackTarget) -> Self {
        Self { client, target }
    }

    async fn send(&self, op: UpsertOp) -> Result<i64, StoreError> {
        post_upsert(&self.client, &self.target, &op).await
    }
}

#[async_trait]
impl UpsertAdapter for HttpUpsertStore {
    async fn upsert_division(
        &self,
        number: &str,
        fields: &DivisionFields,
    ) -> Result<DivisionRef, StoreError> {
        self.send(UpsertOp::Division {
            number: number.to_string(),
            fields: fields.clone(),
        })
        .await
        .map(DivisionRef)
    }

    async fn upsert_subdivision(
        &self,
        division: DivisionRef,
        code: &str,
        fields: &SubDivisionFields,
    ) -> Result<SubDivisionRef, StoreError> {
        self.send(UpsertOp::SubDivision {
            division,
            code: code.to_string(),
            fields: fields.clone(),
        })
        .await
        .map(SubDivisionRef)
    }

    async fn upsert_section(
        &self,
        subdivision: SubDivisionRef,
        number: &str,
        fields: &SectionFields,
    ) -> Result<SectionRef, StoreError> {
        self.send(UpsertOp::Section {
            subdivision,
            number: number.to_string(),
            fields: fields.clone(),
        })
        .await
        .map(SectionRef)
    }

    async fn upsert_paragraph(
        &self,
        section: SectionRef,
        key: &ParagraphKey,
        fields: &ParagraphFields,
    ) -> Result<ParagraphRef, StoreError> {
        self.send(UpsertOp::Paragraph {
            section,
            key: key.clone(),
            fields: fields.clone(),
        })
        .await
        .map(ParagraphRef)
    }

    async fn upsert_supplementary_unit(
        &self,
        division: DivisionRef,
        number: &str,
        fields: &SupplementaryUnitFields,
    ) -> Result<SupplementaryUnitRef, StoreError> {
        self.send(UpsertOp::SupplementaryUnit {
            division,
            number: number.to_string(),
            fields: fields.clone(),
        })
        .await
        .map(SupplementaryUnitRef)
    }
}
