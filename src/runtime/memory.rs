use crate::error::StoreError;
use crate::runtime::store::UpsertAdapter;
use crate::runtime::types::{
    DivisionFields, DivisionRef, ParagraphFields, ParagraphKey, ParagraphRef, PersistSummary,
    SectionFields, SectionRef, SubDivisionFields, SubDivisionRef, SupplementaryUnitFields,
    SupplementaryUnitRef, UpsertOp,
};
use crate::types::SENTINEL_SECTION_NUMBER;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDivision {
    pub id: DivisionRef,
    pub number: String,
    pub fields: DivisionFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSubDivision {
    pub id: SubDivisionRef,
    pub division: DivisionRef,
    pub code: String,
    pub fields: SubDivisionFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSection {
    pub id: SectionRef,
    pub division: DivisionRef,
    pub subdivision: SubDivisionRef,
    pub number: String,
    pub fields: SectionFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredParagraph {
    pub id: ParagraphRef,
    pub section: SectionRef,
    pub key: ParagraphKey,
    pub fields: ParagraphFields,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSupplementaryUnit {
    pub id: SupplementaryUnitRef,
    pub division: DivisionRef,
    pub number: String,
    pub fields: SupplementaryUnitFields,
}

/// Everything a `MemoryStore` holds, plus the journal of calls it received.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    pub divisions: Vec<StoredDivision>,
    pub subdivisions: Vec<StoredSubDivision>,
    pub sections: Vec<StoredSection>,
    pub paragraphs: Vec<StoredParagraph>,
    pub supplementary_units: Vec<StoredSupplementaryUnit>,
    pub journal: Vec<UpsertOp>,
}

impl MemorySnapshot {
    pub fn counts(&self) -> PersistSummary {
        PersistSummary {
            divisions: self.divisions.len(),
            subdivisions: self.subdivisions.len(),
            sections: self.sections.len(),
            paragraphs: self.paragraphs.len(),
            supplementary_units: self.supplementary_units.len(),
        }
    }

    pub fn section(&self, number: &str) -> Option<&StoredSection> {
        self.sections.iter().find(|section| section.number == number)
    }

    pub fn paragraphs_of(&self, section: SectionRef) -> Vec<&StoredParagraph> {
        self.paragraphs
            .iter()
            .filter(|paragraph| paragraph.section == section)
            .collect()
    }
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    data: MemorySnapshot,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn division(&mut self, number: &str, fields: &DivisionFields) -> DivisionRef {
        if let Some(existing) = self.data.divisions.iter_mut().find(|d| d.number == number) {
            existing.fields = fields.clone();
            return existing.id;
        }
        let id = DivisionRef(self.next_id());
        self.data.divisions.push(StoredDivision {
            id,
            number: number.to_string(),
            fields: fields.clone(),
        });
        id
    }

    fn subdivision(
        &mut self,
        division: DivisionRef,
        code: &str,
        fields: &SubDivisionFields,
    ) -> Result<SubDivisionRef, StoreError> {
        if !self.data.divisions.iter().any(|d| d.id == division) {
            return Err(StoreError::Backend(format!("unknown division ref {}", division.0)));
        }
        if let Some(existing) = self
            .data
            .subdivisions
            .iter_mut()
            .find(|s| s.division == division && s.code == code)
        {
            existing.fields = fields.clone();
            return Ok(existing.id);
        }
        let id = SubDivisionRef(self.next_id());
        self.data.subdivisions.push(StoredSubDivision {
            id,
            division,
            code: code.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    fn section(
        &mut self,
        subdivision: SubDivisionRef,
        number: &str,
        fields: &SectionFields,
    ) -> Result<SectionRef, StoreError> {
        let Some(division) = self
            .data
            .subdivisions
            .iter()
            .find(|s| s.id == subdivision)
            .map(|s| s.division)
        else {
            return Err(StoreError::Backend(format!(
                "unknown subdivision ref {}",
                subdivision.0
            )));
        };

        let sentinel = number == SENTINEL_SECTION_NUMBER;
        let existing = self.data.sections.iter_mut().find(|s| {
            s.number == number
                && if sentinel {
                    s.subdivision == subdivision
                } else {
                    s.division == division
                }
        });
        if let Some(existing) = existing {
            if existing.subdivision != subdivision {
                return Err(StoreError::Conflict(format!(
                    "section {number} already belongs to subdivision ref {}",
                    existing.subdivision.0
                )));
            }
            existing.fields = fields.clone();
            return Ok(existing.id);
        }

        let id = SectionRef(self.next_id());
        self.data.sections.push(StoredSection {
            id,
            division,
            subdivision,
            number: number.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    fn paragraph(
        &mut self,
        section: SectionRef,
        key: &ParagraphKey,
        fields: &ParagraphFields,
    ) -> Result<ParagraphRef, StoreError> {
        if !self.data.sections.iter().any(|s| s.id == section) {
            return Err(StoreError::Backend(format!("unknown section ref {}", section.0)));
        }
        if let Some(parent) = key.parent {
            let Some(parent_row) = self.data.paragraphs.iter().find(|p| p.id == parent) else {
                return Err(StoreError::Backend(format!("unknown paragraph ref {}", parent.0)));
            };
            if parent_row.section != section {
                return Err(StoreError::Conflict(format!(
                    "parent paragraph {} belongs to section ref {}, not {}",
                    parent.0, parent_row.section.0, section.0
                )));
            }
        }

        if let Some(existing) = self
            .data
            .paragraphs
            .iter_mut()
            .find(|p| p.section == section && p.key == *key)
        {
            existing.fields = fields.clone();
            return Ok(existing.id);
        }
        let id = ParagraphRef(self.next_id());
        self.data.paragraphs.push(StoredParagraph {
            id,
            section,
            key: key.clone(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    fn supplementary_unit(
        &mut self,
        division: DivisionRef,
        number: &str,
        fields: &SupplementaryUnitFields,
    ) -> Result<SupplementaryUnitRef, StoreError> {
        if !self.data.divisions.iter().any(|d| d.id == division) {
            return Err(StoreError::Backend(format!("unknown division ref {}", division.0)));
        }
        if let Some(existing) = self
            .data
            .supplementary_units
            .iter_mut()
            .find(|u| u.division == division && u.number == number)
        {
            existing.fields = fields.clone();
            return Ok(existing.id);
        }
        let id = SupplementaryUnitRef(self.next_id());
        self.data.supplementary_units.push(StoredSupplementaryUnit {
            id,
            division,
            number: number.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }
}

/// In-process store keyed on natural keys. Only calls that succeed are
/// journaled.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<MemorySnapshot, StoreError> {
        Ok(self.lock()?.data.clone())
    }

    pub fn counts(&self) -> Result<PersistSummary, StoreError> {
        Ok(self.lock()?.data.counts())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Backend(format!("memory store poisoned: {e}")))
    }
}

#[async_trait]
impl UpsertAdapter for MemoryStore {
    async fn upsert_division(
        &self,
        number: &str,
        fields: &DivisionFields,
    ) -> Result<DivisionRef, StoreError> {
        let mut state = self.lock()?;
        let id = state.division(number, fields);
        state.data.journal.push(UpsertOp::Division {
            number: number.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    async fn upsert_subdivision(
        &self,
        division: DivisionRef,
        code: &str,
        fields: &SubDivisionFields,
    ) -> Result<SubDivisionRef, StoreError> {
        let mut state = self.lock()?;
        let id = state.subdivision(division, code, fields)?;
        state.data.journal.push(UpsertOp::SubDivision {
            division,
            code: code.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    async fn upsert_section(
        &self,
        subdivision: SubDivisionRef,
        number: &str,
        fields: &SectionFields,
    ) -> Result<SectionRef, StoreError> {
        let mut state = self.lock()?;
        let id = state.section(subdivision, number, fields)?;
        state.data.journal.push(UpsertOp::Section {
            subdivision,
            number: number.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    async fn upsert_paragraph(
        &self,
        section: SectionRef,
        key: &ParagraphKey,
        fields: &ParagraphFields,
    ) -> Result<ParagraphRef, StoreError> {
        let mut state = self.lock()?;
        let id = state.paragraph(section, key, fields)?;
        state.data.journal.push(UpsertOp::Paragraph {
            section,
            key: key.clone(),
            fields: fields.clone(),
        });
        Ok(id)
    }

    async fn upsert_supplementary_unit(
        &self,
        division: DivisionRef,
        number: &str,
        fields: &SupplementaryUnitFields,
    ) -> Result<SupplementaryUnitRef, StoreError> {
        let mut state = self.lock()?;
        let id = state.supplementary_unit(division, number, fields)?;
        state.data.journal.push(UpsertOp::SupplementaryUnit {
            division,
            number: number.to_string(),
            fields: fields.clone(),
        });
        Ok(id)
    }
}
