use rust_xlsxwriter::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateFilter, CandidateStatus};
use crate::models::history::{FinalStatus, HistoryFilter, HistoryRecord};
use crate::models::job::JobFilter;
use crate::services::candidate_service::project_stages;
use crate::store::SharedStore;
use crate::utils::cpf::format_cpf;
use crate::utils::time::now;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const EMPTY: &str = "—";

/// Shared look of both reports.
struct Palette {
    title_bg: Color,
    header_bg: Color,
    alt_row: Color,
    border: Color,
}

impl Palette {
    fn new() -> Self {
        Self {
            title_bg: Color::RGB(0x1E293B),
            header_bg: Color::RGB(0x0F172A),
            alt_row: Color::RGB(0xF8FAFC),
            border: Color::RGB(0xE2E8F0),
        }
    }

    fn row_format(&self, idx: usize) -> Format {
        let bg = if idx % 2 == 0 { self.alt_row } else { Color::White };
        Format::new()
            .set_font_size(10)
            .set_background_color(bg)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(self.border)
    }

    fn badge(&self, color: Color) -> Format {
        Format::new()
            .set_font_size(10)
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(color)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(self.border)
    }
}

/// Writes the title, subtitle and header rows. Returns the first data row.
fn write_banner(
    worksheet: &mut Worksheet,
    palette: &Palette,
    title: &str,
    total: usize,
    columns: &[(&str, f64)],
) -> Result<u32> {
    let last_col = (columns.len() - 1) as u16;
    for (i, (_, width)) in columns.iter().enumerate() {
        worksheet.set_column_width(i as u16, *width)?;
    }

    let title_format = Format::new()
        .set_font_size(16)
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(palette.title_bg)
        .set_align(FormatAlign::CenterAcross)
        .set_align(FormatAlign::VerticalCenter);
    worksheet.set_row_height(0, 40)?;
    worksheet.merge_range(0, 0, 0, last_col, title, &title_format)?;

    let subtitle_format = Format::new()
        .set_font_size(10)
        .set_italic()
        .set_font_color(Color::RGB(0x94A3B8))
        .set_background_color(palette.title_bg)
        .set_align(FormatAlign::CenterAcross);
    let subtitle = format!(
        "Exportado em {}  •  Total de registros: {}",
        now().format("%d/%m/%Y %H:%M UTC"),
        total
    );
    worksheet.set_row_height(1, 22)?;
    worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10)
        .set_font_color(Color::White)
        .set_background_color(palette.header_bg)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
        .set_border_color(palette.border);
    worksheet.set_row_height(2, 30)?;
    for (i, (name, _)) in columns.iter().enumerate() {
        worksheet.write_string_with_format(2, i as u16, *name, &header_format)?;
    }
    Ok(3)
}

fn finish(worksheet: &mut Worksheet, first_row: u32, rows: usize, columns: usize) -> Result<()> {
    worksheet.set_freeze_panes(first_row, 0)?;
    let last_row = (first_row + rows as u32).saturating_sub(1).max(first_row - 1);
    worksheet.autofilter(first_row - 1, 0, last_row, (columns - 1) as u16)?;
    Ok(())
}

fn status_label(status: CandidateStatus) -> (&'static str, Color) {
    match status {
        CandidateStatus::New => ("Novo", Color::RGB(0x3B82F6)),
        CandidateStatus::InProcess => ("Em processo", Color::RGB(0xF59E0B)),
        CandidateStatus::Hired => ("Contratado", Color::RGB(0x10B981)),
        CandidateStatus::Dismissed => ("Dispensado", Color::RGB(0xEF4444)),
    }
}

fn outcome_label(status: FinalStatus) -> (&'static str, Color) {
    match status {
        FinalStatus::Rejected => ("Reprovado", Color::RGB(0xEF4444)),
        FinalStatus::TalentPool => ("Banco de talentos", Color::RGB(0x8B5CF6)),
        FinalStatus::Withdrawn => ("Desistente", Color::RGB(0x64748B)),
        FinalStatus::Approved => ("Aprovado", Color::RGB(0x10B981)),
    }
}

fn job_title(job_titles: &HashMap<Uuid, String>, job_id: Option<Uuid>) -> String {
    job_id
        .and_then(|id| job_titles.get(&id).cloned())
        .unwrap_or_else(|| EMPTY.to_string())
}

fn tax_id_display(tax_id: Option<&str>) -> String {
    tax_id.map(format_cpf).unwrap_or_else(|| EMPTY.to_string())
}

pub fn generate_candidates_xlsx(
    candidates: &[Candidate],
    job_titles: &HashMap<Uuid, String>,
) -> Result<Vec<u8>> {
    let palette = Palette::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Candidatos")?;

    let columns = [
        ("Nº", 6.0),
        ("Nome", 30.0),
        ("E-mail", 30.0),
        ("Telefone", 18.0),
        ("CPF", 16.0),
        ("Cargo pretendido", 24.0),
        ("Vaga", 28.0),
        ("Etapa", 20.0),
        ("Status", 16.0),
        ("Banco de talentos", 18.0),
        ("Setor de interesse", 20.0),
        ("Observações", 40.0),
        ("Data da candidatura", 20.0),
    ];
    let first = write_banner(
        worksheet,
        &palette,
        "Relatório de candidatos",
        candidates.len(),
        &columns,
    )?;

    for (idx, c) in candidates.iter().enumerate() {
        let row = first + idx as u32;
        let base = palette.row_format(idx);
        let center = base.clone().set_align(FormatAlign::Center);
        let wrap = base.clone().set_text_wrap();
        worksheet.set_row_height(row, 22)?;

        worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center)?;
        worksheet.write_string_with_format(row, 1, &c.full_name, &base.clone().set_bold())?;
        worksheet.write_string_with_format(row, 2, &c.email, &base)?;
        worksheet.write_string_with_format(row, 3, c.phone.as_deref().unwrap_or(EMPTY), &base)?;
        worksheet.write_string_with_format(row, 4, &tax_id_display(c.tax_id.as_deref()), &center)?;
        worksheet.write_string_with_format(
            row,
            5,
            c.desired_role.as_deref().unwrap_or(EMPTY),
            &base,
        )?;
        worksheet.write_string_with_format(row, 6, &job_title(job_titles, c.job_id), &wrap)?;
        worksheet.write_string_with_format(row, 7, c.board_stage().label(), &center)?;
        let (label, color) = status_label(c.status);
        worksheet.write_string_with_format(row, 8, label, &palette.badge(color))?;
        worksheet.write_string_with_format(
            row,
            9,
            if c.talent_pool { "Sim" } else { "Não" },
            &center,
        )?;
        worksheet.write_string_with_format(
            row,
            10,
            c.sector_of_interest.as_deref().unwrap_or(EMPTY),
            &base,
        )?;
        worksheet.write_string_with_format(
            row,
            11,
            c.talent_notes.as_deref().unwrap_or(EMPTY),
            &wrap,
        )?;
        worksheet.write_string_with_format(
            row,
            12,
            &c.created_at.format("%d/%m/%Y %H:%M").to_string(),
            &center,
        )?;
    }

    finish(worksheet, first, candidates.len(), columns.len())?;
    Ok(workbook.save_to_buffer()?)
}

pub fn generate_history_xlsx(
    records: &[HistoryRecord],
    job_titles: &HashMap<Uuid, String>,
) -> Result<Vec<u8>> {
    let palette = Palette::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Histórico")?;

    let columns = [
        ("Nº", 6.0),
        ("Nome", 30.0),
        ("Telefone", 18.0),
        ("CPF", 16.0),
        ("E-mail", 28.0),
        ("Cargo pretendido", 24.0),
        ("Vaga", 28.0),
        ("Resultado", 18.0),
        ("Última etapa", 20.0),
        ("Nota", 8.0),
        ("Observações", 40.0),
        ("Data da candidatura", 20.0),
    ];
    let first = write_banner(
        worksheet,
        &palette,
        "Histórico de candidaturas",
        records.len(),
        &columns,
    )?;

    for (idx, r) in records.iter().enumerate() {
        let row = first + idx as u32;
        let base = palette.row_format(idx);
        let center = base.clone().set_align(FormatAlign::Center);
        let wrap = base.clone().set_text_wrap();
        worksheet.set_row_height(row, 22)?;

        worksheet.write_number_with_format(row, 0, (idx + 1) as f64, &center)?;
        worksheet.write_string_with_format(row, 1, &r.full_name, &base.clone().set_bold())?;
        worksheet.write_string_with_format(row, 2, r.phone.as_deref().unwrap_or(EMPTY), &base)?;
        worksheet.write_string_with_format(row, 3, &tax_id_display(r.tax_id.as_deref()), &center)?;
        worksheet.write_string_with_format(row, 4, r.email.as_deref().unwrap_or(EMPTY), &base)?;
        worksheet.write_string_with_format(
            row,
            5,
            r.desired_role.as_deref().unwrap_or(EMPTY),
            &base,
        )?;
        worksheet.write_string_with_format(row, 6, &job_title(job_titles, r.job_id), &wrap)?;
        let (label, color) = outcome_label(r.final_status);
        worksheet.write_string_with_format(row, 7, label, &palette.badge(color))?;
        worksheet.write_string_with_format(
            row,
            8,
            r.final_stage.map(|s| s.label()).unwrap_or(EMPTY),
            &center,
        )?;
        match r.score {
            Some(score) => {
                worksheet.write_string_with_format(row, 9, &score.to_string(), &center)?
            }
            None => worksheet.write_string_with_format(row, 9, EMPTY, &center)?,
        };
        worksheet.write_string_with_format(row, 10, r.notes.as_deref().unwrap_or(EMPTY), &wrap)?;
        worksheet.write_string_with_format(
            row,
            11,
            &r.application_date.format("%d/%m/%Y").to_string(),
            &center,
        )?;
    }

    finish(worksheet, first, records.len(), columns.len())?;
    Ok(workbook.save_to_buffer()?)
}

#[derive(Clone)]
pub struct ExportService {
    store: SharedStore,
}

impl ExportService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All active candidates, or only `ids` when given and non-empty.
    pub async fn candidates(&self, ids: Option<Vec<Uuid>>) -> Result<Vec<u8>> {
        let mut candidates = self.store.list_candidates(&CandidateFilter::default()).await?;
        if let Some(ids) = ids.filter(|ids| !ids.is_empty()) {
            candidates.retain(|c| ids.contains(&c.id));
        }
        let candidates = project_stages(&self.store, candidates).await?;
        let titles = self.job_titles().await?;
        tracing::info!(rows = candidates.len(), "exporting candidates");
        generate_candidates_xlsx(&candidates, &titles)
    }

    pub async fn history(&self, filter: HistoryFilter) -> Result<Vec<u8>> {
        let records = self.store.list_history(&filter).await?;
        let titles = self.job_titles().await?;
        tracing::info!(rows = records.len(), "exporting history");
        generate_history_xlsx(&records, &titles)
    }

    async fn job_titles(&self) -> Result<HashMap<Uuid, String>> {
        let (jobs, _) = self
            .store
            .list_jobs(&JobFilter::default(), i64::MAX, 0)
            .await?;
        Ok(jobs.into_iter().map(|j| (j.id, j.title)).collect())
    }
}
