use crate::error::IngestError;
use crate::runtime::store::UpsertAdapter;
use crate::runtime::types::{
    DivisionFields, ParagraphFields, ParagraphKey, ParagraphRef, PersistSummary, SectionFields,
    SectionRef, SubDivisionFields, SupplementaryUnitFields,
};
use crate::types::{Paragraph, ParsedDocument};
use std::collections::HashMap;

/// Writes a parsed document top-down (division, sub-divisions, sections,
/// paragraphs, then supplementary units) so every reference exists before a
/// child needs it. Stops at the first store error; rows already written stay
/// valid because each upsert is independently idempotent.
pub async fn persist_document(
    document: &ParsedDocument,
    store: &dyn UpsertAdapter,
) -> Result<PersistSummary, IngestError> {
    let mut summary = PersistSummary::default();
    let division = &document.division;

    let division_ref = store
        .upsert_division(
            &division.number,
            &DivisionFields {
                title: division.title.clone(),
                authority: division.authority.clone(),
                source: division.source.clone(),
            },
        )
        .await?;
    summary.divisions += 1;

    for subdivision in &document.subdivisions {
        let subdivision_ref = store
            .upsert_subdivision(
                division_ref,
                &subdivision.code,
                &SubDivisionFields {
                    title: subdivision.title.clone(),
                },
            )
            .await?;
        summary.subdivisions += 1;

        for section in &subdivision.sections {
            let section_ref = store
                .upsert_section(
                    subdivision_ref,
                    &section.number,
                    &SectionFields {
                        title: section.title.clone(),
                        body: section.body.clone(),
                    },
                )
                .await?;
            summary.sections += 1;
            summary.paragraphs += persist_paragraphs(store, section_ref, &section.paragraphs).await?;
        }
    }

    for unit in &document.supplementary_units {
        store
            .upsert_supplementary_unit(
                division_ref,
                &unit.number,
                &SupplementaryUnitFields {
                    title: unit.title.clone(),
                    body: unit.body.clone(),
                },
            )
            .await?;
        summary.supplementary_units += 1;
    }

    tracing::debug!(
        "[regtree] Persisted division {}: {} sections, {} paragraphs",
        division.number,
        summary.sections,
        summary.paragraphs
    );
    Ok(summary)
}

async fn persist_paragraphs(
    store: &dyn UpsertAdapter,
    section: SectionRef,
    paragraphs: &[Paragraph],
) -> Result<usize, IngestError> {
    let mut refs: Vec<ParagraphRef> = Vec::with_capacity(paragraphs.len());
    let mut occurrences: HashMap<(Option<usize>, &str, u8), u32> = HashMap::new();

    for (position, paragraph) in paragraphs.iter().enumerate() {
        let parent = match paragraph.parent {
            Some(index) => Some(*refs.get(index).ok_or_else(|| {
                IngestError::Store(format!(
                    "paragraph {} refers to parent {index} that was not written first",
                    paragraph.label
                ))
            })?),
            None => None,
        };

        let occurrence = occurrences
            .entry((paragraph.parent, paragraph.label.as_str(), paragraph.level))
            .or_insert(0);
        let key = ParagraphKey {
            label: paragraph.label.clone(),
            level: paragraph.level,
            parent,
            occurrence: *occurrence,
        };
        *occurrence += 1;

        let paragraph_ref = store
            .upsert_paragraph(
                section,
                &key,
                &ParagraphFields {
                    body: paragraph.body.clone(),
                    position: position as i64,
                },
            )
            .await?;
        refs.push(paragraph_ref);
    }

    Ok(refs.len())
}
