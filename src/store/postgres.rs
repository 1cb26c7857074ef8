use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::RecruitmentStore;
use crate::error::{Error, Result};
use crate::models::{
    candidate::{Candidate, CandidateChanges, CandidateFilter, NewCandidate},
    history::{HistoryFilter, HistoryLookup, HistoryRecord, NewHistoryRecord},
    job::{Job, JobChanges, JobFilter, NewJob},
    notification::{NewNotification, Notification},
    stage::{NewStageRecord, PipelineStage, StageRecord, STAGE_STATUS_IN_PROGRESS},
    user::{NewUser, Theme, User},
};
use crate::utils::{cpf::digits_only, text::escape_like};

const CANDIDATE_COLUMNS: &str = "id, full_name, email, phone, tax_id, desired_role, message, resume_url, job_id, current_stage, status, talent_pool, sector_of_interest, talent_notes, created_at, updated_at";
const STAGE_COLUMNS: &str = "id, candidate_id, history_id, stage, status, score, notes, rejection_reason, created_by, created_at";
const HISTORY_COLUMNS: &str = "id, full_name, phone, tax_id, email, desired_role, job_id, final_status, final_stage, score, notes, application_date";
const JOB_COLUMNS: &str = "id, title, description, responsibilities, benefits, requirements, location, active, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, full_name, password_hash, role, theme, created_at";
const NOTIFICATION_COLUMNS: &str = "id, kind, title, message, candidate_id, read_at, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_column<T>(column: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Internal(format!("Unexpected value in column {}: {}", column, e)))
}

#[derive(FromRow)]
struct CandidateRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone: Option<String>,
    tax_id: Option<String>,
    desired_role: Option<String>,
    message: Option<String>,
    resume_url: Option<String>,
    job_id: Option<Uuid>,
    current_stage: Option<String>,
    status: String,
    talent_pool: bool,
    sector_of_interest: Option<String>,
    talent_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Candidate {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            tax_id: row.tax_id,
            desired_role: row.desired_role,
            message: row.message,
            resume_url: row.resume_url,
            job_id: row.job_id,
            current_stage: row
                .current_stage
                .as_deref()
                .map(|s| parse_column::<PipelineStage>("current_stage", s))
                .transpose()?,
            status: parse_column("status", &row.status)?,
            talent_pool: row.talent_pool,
            sector_of_interest: row.sector_of_interest,
            talent_notes: row.talent_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct StageRow {
    id: Uuid,
    candidate_id: Uuid,
    history_id: Option<Uuid>,
    stage: String,
    status: String,
    score: Option<Decimal>,
    notes: Option<String>,
    rejection_reason: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StageRow> for StageRecord {
    type Error = Error;

    fn try_from(row: StageRow) -> Result<Self> {
        Ok(StageRecord {
            id: row.id,
            candidate_id: row.candidate_id,
            history_id: row.history_id,
            stage: parse_column("stage", &row.stage)?,
            status: row.status,
            score: row.score,
            notes: row.notes,
            rejection_reason: row.rejection_reason,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct HistoryRow {
    id: Uuid,
    full_name: String,
    phone: Option<String>,
    tax_id: Option<String>,
    email: Option<String>,
    desired_role: Option<String>,
    job_id: Option<Uuid>,
    final_status: String,
    final_stage: Option<String>,
    score: Option<Decimal>,
    notes: Option<String>,
    application_date: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        Ok(HistoryRecord {
            id: row.id,
            full_name: row.full_name,
            phone: row.phone,
            tax_id: row.tax_id,
            email: row.email,
            desired_role: row.desired_role,
            job_id: row.job_id,
            final_status: parse_column("final_status", &row.final_status)?,
            final_stage: row
                .final_stage
                .as_deref()
                .map(|s| parse_column::<PipelineStage>("final_stage", s))
                .transpose()?,
            score: row.score,
            notes: row.notes,
            application_date: row.application_date,
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    theme: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: row.role,
            theme: Theme::from_stored(row.theme.as_deref()),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    responsibilities: Vec<String>,
    benefits: Vec<String>,
    requirements: Vec<String>,
    location: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            title: row.title,
            description: row.description,
            responsibilities: row.responsibilities,
            benefits: row.benefits,
            requirements: row.requirements,
            location: row.location,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: String,
    title: String,
    message: String,
    candidate_id: Option<Uuid>,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            kind: row.kind,
            title: row.title,
            message: row.message,
            candidate_id: row.candidate_id,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Appends `(a OR b OR c)` for the duplicate-check criteria.
fn push_lookup_predicate(builder: &mut QueryBuilder<'_, Postgres>, lookup: &HistoryLookup) {
    builder.push("(");
    let mut criteria = builder.separated(" OR ");
    if let Some(tax_id) = &lookup.tax_id {
        criteria.push("regexp_replace(COALESCE(tax_id, ''), '\\D', '', 'g') = ");
        criteria.push_bind_unseparated(tax_id.clone());
    }
    if let Some(phone) = &lookup.phone {
        criteria.push("regexp_replace(COALESCE(phone, ''), '\\D', '', 'g') LIKE ");
        criteria.push_bind_unseparated(format!("%{}%", phone));
    }
    if let Some(name) = &lookup.name {
        criteria.push("full_name ILIKE ");
        criteria.push_bind_unseparated(format!("%{}%", escape_like(name)));
    }
    builder.push(")");
}

#[async_trait]
impl RecruitmentStore for PgStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate> {
        let sql = format!(
            r#"
            INSERT INTO candidates (full_name, email, phone, tax_id, desired_role, message, resume_url, job_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'new')
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(candidate.full_name)
            .bind(candidate.email)
            .bind(candidate.phone)
            .bind(candidate.tax_id)
            .bind(candidate.desired_role)
            .bind(candidate.message)
            .bind(candidate.resume_url)
            .bind(candidate.job_id)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let sql = format!("SELECT {} FROM candidates WHERE id = $1", CANDIDATE_COLUMNS);
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn find_candidate_by_tax_id(&self, tax_id: &str) -> Result<Option<Candidate>> {
        let sql = format!(
            "SELECT {} FROM candidates WHERE regexp_replace(COALESCE(tax_id, ''), '\\D', '', 'g') = $1 LIMIT 1",
            CANDIDATE_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(digits_only(tax_id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn list_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM candidates WHERE TRUE", CANDIDATE_COLUMNS));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(flag) = filter.talent_pool {
            builder.push(" AND talent_pool = ").push_bind(flag);
        }
        if let Some(sector) = &filter.sector {
            builder
                .push(" AND sector_of_interest ILIKE ")
                .push_bind(escape_like(sector));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR desired_role ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY created_at DESC");
        let rows = builder
            .build_query_as::<CandidateRow>()
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        changes: &CandidateChanges,
    ) -> Result<Option<Candidate>> {
        let sql = format!(
            r#"
            UPDATE candidates
            SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                tax_id = COALESCE($5, tax_id),
                desired_role = COALESCE($6, desired_role),
                message = COALESCE($7, message),
                resume_url = COALESCE($8, resume_url),
                job_id = COALESCE($9, job_id),
                current_stage = COALESCE($10, current_stage),
                status = COALESCE($11, status),
                talent_pool = COALESCE($12, talent_pool),
                sector_of_interest = COALESCE($13, sector_of_interest),
                talent_notes = COALESCE($14, talent_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CANDIDATE_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(id)
            .bind(changes.full_name.clone())
            .bind(changes.email.clone())
            .bind(changes.phone.clone())
            .bind(changes.tax_id.clone())
            .bind(changes.desired_role.clone())
            .bind(changes.message.clone())
            .bind(changes.resume_url.clone())
            .bind(changes.job_id)
            .bind(changes.current_stage.map(|s| s.as_str()))
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.talent_pool)
            .bind(changes.sector_of_interest.clone())
            .bind(changes.talent_notes.clone())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Candidate::try_from).transpose()
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stage_records WHERE candidate_id = $1 AND history_id IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }

    async fn append_stage_record(&self, record: NewStageRecord) -> Result<StageRecord> {
        let mut conn = self.pool.acquire().await?;
        insert_stage_record(&mut *conn, record).await?.try_into()
    }

    async fn stage_records(&self, candidate_id: Uuid) -> Result<Vec<StageRecord>> {
        let sql = format!(
            "SELECT {} FROM stage_records WHERE candidate_id = $1 AND history_id IS NULL ORDER BY created_at ASC, seq ASC",
            STAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, StageRow>(&sql)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn stage_records_for(&self, candidate_ids: &[Uuid]) -> Result<Vec<StageRecord>> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM stage_records WHERE candidate_id = ANY($1) AND history_id IS NULL ORDER BY created_at ASC, seq ASC",
            STAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, StageRow>(&sql)
            .bind(candidate_ids)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn archive_candidate(
        &self,
        candidate_id: Uuid,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord> {
        let mut tx = self.pool.begin().await?;
        let row = archive_in(&mut *tx, candidate_id, record).await?;
        tx.commit().await?;
        row.try_into()
    }

    async fn reject_candidate(
        &self,
        stage: NewStageRecord,
        record: NewHistoryRecord,
    ) -> Result<(StageRecord, HistoryRecord)> {
        let candidate_id = stage.candidate_id;
        let mut tx = self.pool.begin().await?;
        let stage_row = insert_stage_record(&mut *tx, stage).await?;
        let history_row = archive_in(&mut *tx, candidate_id, record).await?;
        tx.commit().await?;

        let mut appended = StageRecord::try_from(stage_row)?;
        let history = HistoryRecord::try_from(history_row)?;
        appended.history_id = Some(history.id);
        Ok((appended, history))
    }

    async fn history_stage_records(&self, history_id: Uuid) -> Result<Vec<StageRecord>> {
        let sql = format!(
            "SELECT {} FROM stage_records WHERE history_id = $1 ORDER BY created_at ASC, seq ASC",
            STAGE_COLUMNS
        );
        let rows = sqlx::query_as::<_, StageRow>(&sql)
            .bind(history_id)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn lookup_history(&self, lookup: &HistoryLookup) -> Result<Vec<HistoryRecord>> {
        if lookup.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM candidate_history WHERE ",
            HISTORY_COLUMNS
        ));
        push_lookup_predicate(&mut builder, lookup);
        builder.push(" ORDER BY application_date DESC");
        let rows = builder
            .build_query_as::<HistoryRow>()
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list_history(&self, filter: &HistoryFilter) -> Result<Vec<HistoryRecord>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM candidate_history WHERE TRUE",
            HISTORY_COLUMNS
        ));
        if let Some(status) = filter.final_status {
            builder.push(" AND final_status = ").push_bind(status.as_str());
        }
        if let Some(search) = &filter.search {
            builder
                .push(" AND full_name ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)));
        }
        builder.push(" ORDER BY application_date DESC");
        let rows = builder
            .build_query_as::<HistoryRow>()
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn get_history(&self, id: Uuid) -> Result<Option<HistoryRecord>> {
        let sql = format!("SELECT {} FROM candidate_history WHERE id = $1", HISTORY_COLUMNS);
        let row = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(HistoryRecord::try_from).transpose()
    }

    async fn insert_job(&self, job: NewJob) -> Result<Job> {
        let sql = format!(
            r#"
            INSERT INTO jobs (title, description, responsibilities, benefits, requirements, location, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(job.title)
            .bind(job.description)
            .bind(job.responsibilities)
            .bind(job.benefits)
            .bind(job.requirements)
            .bind(job.location)
            .bind(job.active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Job>, i64)> {
        fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
            if let Some(active) = filter.active {
                builder.push(" AND active = ").push_bind(active);
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", escape_like(search));
                builder
                    .push(" AND (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR location ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut items: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM jobs WHERE TRUE", JOB_COLUMNS));
        push_filters(&mut items, filter);
        items
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = items
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM jobs WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> Result<Option<Job>> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                responsibilities = COALESCE($4, responsibilities),
                benefits = COALESCE($5, benefits),
                requirements = COALESCE($6, requirements),
                location = COALESCE($7, location),
                active = COALESCE($8, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .bind(changes.title.clone())
            .bind(changes.description.clone())
            .bind(changes.responsibilities.clone())
            .bind(changes.benefits.clone())
            .bind(changes.requirements.clone())
            .bind(changes.location.clone())
            .bind(changes.active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_job(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, full_name, password_hash, role, theme)
            VALUES (LOWER($1), $2, $3, $4, 'dark')
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.email)
            .bind(user.full_name)
            .bind(user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = LOWER($1)", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn set_user_theme(&self, id: Uuid, theme: Theme) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET theme = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(theme.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let sql = format!(
            r#"
            INSERT INTO notifications (kind, title, message, candidate_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(notification.kind)
            .bind(notification.title)
            .bind(notification.message)
            .bind(notification.candidate_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn list_notifications(
        &self,
        unread_only: bool,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE ($1 = FALSE OR read_at IS NULL)
              AND ($2::timestamptz IS NULL OR created_at > $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(unread_only)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_unread_notifications(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE read_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, NOW()) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self) -> Result<u64> {
        let res = sqlx::query("UPDATE notifications SET read_at = NOW() WHERE read_at IS NULL")
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

/// Appends to the log of an active candidate. `NotFound` when the candidate
/// row does not exist.
async fn insert_stage_record(conn: &mut PgConnection, record: NewStageRecord) -> Result<StageRow> {
    let sql = format!(
        r#"
        INSERT INTO stage_records (candidate_id, stage, status, score, notes, rejection_reason, created_by)
        SELECT $1, $2, $3, $4, $5, $6, $7
        WHERE EXISTS (SELECT 1 FROM candidates WHERE id = $1)
        RETURNING {}
        "#,
        STAGE_COLUMNS
    );
    sqlx::query_as::<_, StageRow>(&sql)
        .bind(record.candidate_id)
        .bind(record.stage.as_str())
        .bind(STAGE_STATUS_IN_PROGRESS)
        .bind(record.score)
        .bind(record.notes)
        .bind(record.rejection_reason)
        .bind(record.created_by)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
}

/// History insert, log hand-over and candidate delete. Runs inside the
/// caller's transaction; an error leaves it to roll back on drop.
async fn archive_in(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    record: NewHistoryRecord,
) -> Result<HistoryRow> {
    let sql = format!(
        r#"
        INSERT INTO candidate_history (full_name, phone, tax_id, email, desired_role, job_id, final_status, final_stage, score, notes, application_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {}
        "#,
        HISTORY_COLUMNS
    );
    let row = sqlx::query_as::<_, HistoryRow>(&sql)
        .bind(record.full_name)
        .bind(record.phone)
        .bind(record.tax_id)
        .bind(record.email)
        .bind(record.desired_role)
        .bind(record.job_id)
        .bind(record.final_status.as_str())
        .bind(record.final_stage.map(|s| s.as_str()))
        .bind(record.score)
        .bind(record.notes)
        .bind(record.application_date)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query(
        "UPDATE stage_records SET history_id = $1 WHERE candidate_id = $2 AND history_id IS NULL",
    )
    .bind(row.id)
    .bind(candidate_id)
    .execute(&mut *conn)
    .await?;

    let deleted = sqlx::query("DELETE FROM candidates WHERE id = $1")
        .bind(candidate_id)
        .execute(&mut *conn)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(Error::NotFound("Candidate not found".to_string()));
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_predicate_joins_criteria_with_or() {
        let lookup = HistoryLookup::new(Some("Ana"), Some("11987654321"), Some("52998224725"));
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 WHERE ");
        push_lookup_predicate(&mut builder, &lookup);
        let sql = builder.sql().to_string();
        assert_eq!(sql.matches(" OR ").count(), 2);
        assert!(sql.contains("full_name ILIKE $3"));
        assert!(sql.contains("tax_id"));
    }

    #[test]
    fn lookup_predicate_with_single_criterion() {
        let lookup = HistoryLookup::new(None, None, Some("52998224725"));
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("");
        push_lookup_predicate(&mut builder, &lookup);
        let sql = builder.sql().to_string();
        assert!(!sql.contains(" OR "));
        assert!(sql.ends_with("= $1)"));
    }
}
