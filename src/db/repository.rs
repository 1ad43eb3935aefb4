//! Repository pattern implementation for data access layer
//!
//! Each repository owns the SQL for one table family. Search methods build a
//! `WHERE` clause from optional filters and always page with LIMIT/OFFSET.

use crate::auth::identity::IdentityStore;
use crate::auth::roles::Role;
use crate::core::error::{CuraError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{
    ClinicalTrial, Favorite, Forum, ForumPost, ForumReply, HealthExpert, Identity,
    MeetingRequest, PatientProfile, Publication, ResearcherProfile,
};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Generic repository trait for entities with a string primary key
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<()>;
}

/// Offset pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Build a page, clamping to sane bounds
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset: offset.max(0),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    fn sql(&self) -> String {
        format!(" LIMIT {} OFFSET {}", self.limit, self.offset)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Current time as stored in the database
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh entity identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn json_list(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn role_column(row: &Row, idx: usize) -> rusqlite::Result<Role> {
    let raw: String = row.get(idx)?;
    raw.parse::<Role>().map_err(|e| conversion_error(idx, e))
}

/// Escape LIKE wildcards in user input and wrap it for a substring match
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// True for UNIQUE / PRIMARY KEY constraint failures
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn conflict_or_db(err: rusqlite::Error, message: &str) -> CuraError {
    if is_unique_violation(&err) {
        CuraError::Conflict(message.to_string())
    } else {
        CuraError::DatabaseError(err)
    }
}

/// Collects `WHERE` conditions and their string parameters
#[derive(Default)]
struct Filter {
    conditions: Vec<String>,
    params: Vec<String>,
}

impl Filter {
    fn push(&mut self, condition: &str, params: impl IntoIterator<Item = String>) {
        self.conditions.push(condition.to_string());
        self.params.extend(params);
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

fn query_list<T, F>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &[String],
    map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql).map_err(CuraError::DatabaseError)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), map)
        .map_err(CuraError::DatabaseError)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(CuraError::DatabaseError)?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

const USER_COLUMNS: &str = "id, email, password_hash, role, is_active, created_at, updated_at";

fn identity_from_row(row: &Row) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: role_column(row, 3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Repository for user identities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by normalized email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let email = email.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                    [&email],
                    identity_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Identity>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                    [&id],
                    identity_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Insert a new identity; a taken email is a conflict
    pub async fn insert(&self, identity: &Identity) -> Result<()> {
        let identity = identity.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, email, password_hash, role, is_active, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &identity.id,
                        &identity.email,
                        &identity.password_hash,
                        identity.role.as_str(),
                        identity.is_active,
                        &identity.created_at,
                    ],
                )
                .map_err(|e| conflict_or_db(e, "Email already registered"))?;
                Ok(())
            })
            .await
    }

    /// Replace a user's password hash
    pub async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let password_hash = password_hash.to_string();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
                    rusqlite::params![&password_hash, now_timestamp(), &user_id],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }

    /// Flip the active flag
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<()> {
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?",
                    rusqlite::params![is_active, now_timestamp(), &user_id],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| {
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
                    .map_err(CuraError::DatabaseError)
            })
            .await
    }
}

#[async_trait]
impl IdentityStore for UserRepository {
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        self.find_by_email(email).await
    }

    async fn find_identity_by_id(&self, id: &str) -> Result<Option<Identity>> {
        self.find_by_id(id).await
    }

    async fn insert_identity(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Identity> {
        let identity = Identity {
            id: new_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            is_active: true,
            created_at: now_timestamp(),
            updated_at: None,
        };
        self.insert(&identity).await?;
        Ok(identity)
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

const PATIENT_COLUMNS: &str = "id, user_id, full_name, conditions, location, age, gender, \
     additional_info, created_at, updated_at";

fn patient_from_row(row: &Row) -> rusqlite::Result<PatientProfile> {
    Ok(PatientProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        conditions: json_list(row, 3)?,
        location: row.get(4)?,
        age: row.get(5)?,
        gender: row.get(6)?,
        additional_info: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const RESEARCHER_COLUMNS: &str = "id, user_id, full_name, institution, specialties, \
     research_interests, orcid, researchgate_url, bio, location, available_for_meetings, \
     created_at, updated_at";

fn researcher_from_row(row: &Row) -> rusqlite::Result<ResearcherProfile> {
    Ok(ResearcherProfile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        institution: row.get(3)?,
        specialties: json_list(row, 4)?,
        research_interests: json_list(row, 5)?,
        orcid: row.get(6)?,
        researchgate_url: row.get(7)?,
        bio: row.get(8)?,
        location: row.get(9)?,
        available_for_meetings: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Repository for patient and researcher profiles
pub struct ProfileRepository {
    db: Arc<DatabaseManager>,
}

impl ProfileRepository {
    /// Create a new ProfileRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Get the patient profile owned by a user
    pub async fn find_patient(&self, user_id: &str) -> Result<Option<PatientProfile>> {
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM patient_profiles WHERE user_id = ?", PATIENT_COLUMNS),
                    [&user_id],
                    patient_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Create the user's patient profile, or replace its fields if it exists.
    ///
    /// The stored row is returned, keeping the original id and created_at.
    pub async fn upsert_patient(&self, profile: &PatientProfile) -> Result<PatientProfile> {
        let profile = profile.clone();
        self.db
            .transaction(move |tx| {
                tx.execute(
                    "INSERT INTO patient_profiles (id, user_id, full_name, conditions, location, \
                     age, gender, additional_info, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(user_id) DO UPDATE SET \
                     full_name = excluded.full_name, conditions = excluded.conditions, \
                     location = excluded.location, age = excluded.age, gender = excluded.gender, \
                     additional_info = excluded.additional_info, updated_at = ?",
                    rusqlite::params![
                        &profile.id,
                        &profile.user_id,
                        &profile.full_name,
                        to_json_list(&profile.conditions),
                        &profile.location,
                        &profile.age,
                        &profile.gender,
                        &profile.additional_info,
                        &profile.created_at,
                        now_timestamp(),
                    ],
                )
                .map_err(CuraError::DatabaseError)?;

                tx.query_row(
                    &format!("SELECT {} FROM patient_profiles WHERE user_id = ?", PATIENT_COLUMNS),
                    [&profile.user_id],
                    patient_from_row,
                )
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Get the researcher profile owned by a user
    pub async fn find_researcher(&self, user_id: &str) -> Result<Option<ResearcherProfile>> {
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT {} FROM researcher_profiles WHERE user_id = ?",
                        RESEARCHER_COLUMNS
                    ),
                    [&user_id],
                    researcher_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Create the user's researcher profile, or replace its fields if it exists
    pub async fn upsert_researcher(
        &self,
        profile: &ResearcherProfile,
    ) -> Result<ResearcherProfile> {
        let profile = profile.clone();
        self.db
            .transaction(move |tx| {
                tx.execute(
                    "INSERT INTO researcher_profiles (id, user_id, full_name, institution, \
                     specialties, research_interests, orcid, researchgate_url, bio, location, \
                     available_for_meetings, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
                     ON CONFLICT(user_id) DO UPDATE SET \
                     full_name = excluded.full_name, institution = excluded.institution, \
                     specialties = excluded.specialties, \
                     research_interests = excluded.research_interests, orcid = excluded.orcid, \
                     researchgate_url = excluded.researchgate_url, bio = excluded.bio, \
                     location = excluded.location, \
                     available_for_meetings = excluded.available_for_meetings, updated_at = ?",
                    rusqlite::params![
                        &profile.id,
                        &profile.user_id,
                        &profile.full_name,
                        &profile.institution,
                        to_json_list(&profile.specialties),
                        to_json_list(&profile.research_interests),
                        &profile.orcid,
                        &profile.researchgate_url,
                        &profile.bio,
                        &profile.location,
                        profile.available_for_meetings,
                        &profile.created_at,
                        now_timestamp(),
                    ],
                )
                .map_err(CuraError::DatabaseError)?;

                tx.query_row(
                    &format!(
                        "SELECT {} FROM researcher_profiles WHERE user_id = ?",
                        RESEARCHER_COLUMNS
                    ),
                    [&profile.user_id],
                    researcher_from_row,
                )
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Researcher directory, optionally filtered by an exact specialty
    pub async fn search_researchers(
        &self,
        specialty: Option<String>,
        page: Page,
    ) -> Result<Vec<ResearcherProfile>> {
        self.db
            .execute(move |conn| {
                let mut filter = Filter::default();
                if let Some(s) = specialty {
                    filter.push(
                        "EXISTS (SELECT 1 FROM json_each(specialties) WHERE value = ?)",
                        [s],
                    );
                }

                let sql = format!(
                    "SELECT {} FROM researcher_profiles{} ORDER BY created_at DESC{}",
                    RESEARCHER_COLUMNS,
                    filter.where_clause(),
                    page.sql()
                );
                query_list(conn, &sql, &filter.params, researcher_from_row)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Clinical trials
// ---------------------------------------------------------------------------

const TRIAL_COLUMNS: &str = "id, nct_id, title, description, status, phase, conditions, \
     eligibility, locations, contact_email, contact_phone, start_date, completion_date, \
     enrollment, url, source, ai_summary, created_by, created_at";

fn trial_from_row(row: &Row) -> rusqlite::Result<ClinicalTrial> {
    Ok(ClinicalTrial {
        id: row.get(0)?,
        nct_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        phase: row.get(5)?,
        conditions: json_list(row, 6)?,
        eligibility: row.get(7)?,
        locations: json_list(row, 8)?,
        contact_email: row.get(9)?,
        contact_phone: row.get(10)?,
        start_date: row.get(11)?,
        completion_date: row.get(12)?,
        enrollment: row.get(13)?,
        url: row.get(14)?,
        source: row.get(15)?,
        ai_summary: row.get(16)?,
        created_by: row.get(17)?,
        created_at: row.get(18)?,
    })
}

/// Search filters for clinical trials
#[derive(Debug, Clone, Default)]
pub struct TrialFilter {
    /// Substring of title or description, case-insensitive
    pub keywords: Option<String>,
    pub status: Option<String>,
    /// Exact entry of the locations list
    pub location: Option<String>,
}

/// Repository for clinical trials
pub struct TrialRepository {
    db: Arc<DatabaseManager>,
}

impl TrialRepository {
    /// Create a new TrialRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Search trials, newest first
    pub async fn search(&self, filter: TrialFilter, page: Page) -> Result<Vec<ClinicalTrial>> {
        self.db
            .execute(move |conn| {
                let mut where_ = Filter::default();
                if let Some(k) = filter.keywords {
                    let pattern = like_pattern(&k);
                    where_.push(
                        "(title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
                        [pattern.clone(), pattern],
                    );
                }
                if let Some(s) = filter.status {
                    where_.push("status = ?", [s]);
                }
                if let Some(l) = filter.location {
                    where_.push(
                        "EXISTS (SELECT 1 FROM json_each(locations) WHERE value = ?)",
                        [l],
                    );
                }

                let sql = format!(
                    "SELECT {} FROM clinical_trials{} ORDER BY created_at DESC{}",
                    TRIAL_COLUMNS,
                    where_.where_clause(),
                    page.sql()
                );
                query_list(conn, &sql, &where_.params, trial_from_row)
            })
            .await
    }
}

#[async_trait]
impl Repository<ClinicalTrial> for TrialRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ClinicalTrial>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM clinical_trials WHERE id = ?", TRIAL_COLUMNS),
                    [&id],
                    trial_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    async fn create(&self, trial: &ClinicalTrial) -> Result<()> {
        let trial = trial.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO clinical_trials ({}) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        TRIAL_COLUMNS
                    ),
                    rusqlite::params![
                        &trial.id,
                        &trial.nct_id,
                        &trial.title,
                        &trial.description,
                        &trial.status,
                        &trial.phase,
                        to_json_list(&trial.conditions),
                        &trial.eligibility,
                        to_json_list(&trial.locations),
                        &trial.contact_email,
                        &trial.contact_phone,
                        &trial.start_date,
                        &trial.completion_date,
                        &trial.enrollment,
                        &trial.url,
                        &trial.source,
                        &trial.ai_summary,
                        &trial.created_by,
                        &trial.created_at,
                    ],
                )
                .map_err(|e| conflict_or_db(e, "Trial already exists"))?;
                Ok(())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Publications
// ---------------------------------------------------------------------------

const PUBLICATION_COLUMNS: &str = "id, title, authors, abstract, journal, publication_date, \
     doi, pmid, url, keywords, conditions, ai_summary, created_by, created_at";

fn publication_from_row(row: &Row) -> rusqlite::Result<Publication> {
    Ok(Publication {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: json_list(row, 2)?,
        abstract_text: row.get(3)?,
        journal: row.get(4)?,
        publication_date: row.get(5)?,
        doi: row.get(6)?,
        pmid: row.get(7)?,
        url: row.get(8)?,
        keywords: json_list(row, 9)?,
        conditions: json_list(row, 10)?,
        ai_summary: row.get(11)?,
        created_by: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// Repository for publications
pub struct PublicationRepository {
    db: Arc<DatabaseManager>,
}

impl PublicationRepository {
    /// Create a new PublicationRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Search publications by title/abstract substring, newest first
    pub async fn search(&self, keywords: Option<String>, page: Page) -> Result<Vec<Publication>> {
        self.db
            .execute(move |conn| {
                let mut filter = Filter::default();
                if let Some(k) = keywords {
                    let pattern = like_pattern(&k);
                    filter.push(
                        "(title LIKE ? ESCAPE '\\' OR abstract LIKE ? ESCAPE '\\')",
                        [pattern.clone(), pattern],
                    );
                }

                let sql = format!(
                    "SELECT {} FROM publications{} ORDER BY created_at DESC{}",
                    PUBLICATION_COLUMNS,
                    filter.where_clause(),
                    page.sql()
                );
                query_list(conn, &sql, &filter.params, publication_from_row)
            })
            .await
    }
}

#[async_trait]
impl Repository<Publication> for PublicationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Publication>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM publications WHERE id = ?", PUBLICATION_COLUMNS),
                    [&id],
                    publication_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    async fn create(&self, publication: &Publication) -> Result<()> {
        let p = publication.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO publications ({}) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        PUBLICATION_COLUMNS
                    ),
                    rusqlite::params![
                        &p.id,
                        &p.title,
                        to_json_list(&p.authors),
                        &p.abstract_text,
                        &p.journal,
                        &p.publication_date,
                        &p.doi,
                        &p.pmid,
                        &p.url,
                        to_json_list(&p.keywords),
                        to_json_list(&p.conditions),
                        &p.ai_summary,
                        &p.created_by,
                        &p.created_at,
                    ],
                )
                .map_err(|e| conflict_or_db(e, "Publication already exists"))?;
                Ok(())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Health experts
// ---------------------------------------------------------------------------

const EXPERT_COLUMNS: &str = "id, full_name, specialties, institution, location, email, phone, \
     bio, research_interests, orcid, is_platform_member, publications_count, created_at";

fn expert_from_row(row: &Row) -> rusqlite::Result<HealthExpert> {
    Ok(HealthExpert {
        id: row.get(0)?,
        full_name: row.get(1)?,
        specialties: json_list(row, 2)?,
        institution: row.get(3)?,
        location: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        bio: row.get(7)?,
        research_interests: json_list(row, 8)?,
        orcid: row.get(9)?,
        is_platform_member: row.get(10)?,
        publications_count: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Repository for the health expert directory
pub struct ExpertRepository {
    db: Arc<DatabaseManager>,
}

impl ExpertRepository {
    /// Create a new ExpertRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Search experts by exact specialty and/or location substring
    pub async fn search(
        &self,
        specialty: Option<String>,
        location: Option<String>,
        page: Page,
    ) -> Result<Vec<HealthExpert>> {
        self.db
            .execute(move |conn| {
                let mut filter = Filter::default();
                if let Some(s) = specialty {
                    filter.push(
                        "EXISTS (SELECT 1 FROM json_each(specialties) WHERE value = ?)",
                        [s],
                    );
                }
                if let Some(l) = location {
                    filter.push("location LIKE ? ESCAPE '\\'", [like_pattern(&l)]);
                }

                let sql = format!(
                    "SELECT {} FROM health_experts{} ORDER BY full_name ASC{}",
                    EXPERT_COLUMNS,
                    filter.where_clause(),
                    page.sql()
                );
                query_list(conn, &sql, &filter.params, expert_from_row)
            })
            .await
    }
}

#[async_trait]
impl Repository<HealthExpert> for ExpertRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<HealthExpert>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM health_experts WHERE id = ?", EXPERT_COLUMNS),
                    [&id],
                    expert_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    async fn create(&self, expert: &HealthExpert) -> Result<()> {
        let e = expert.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO health_experts ({}) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        EXPERT_COLUMNS
                    ),
                    rusqlite::params![
                        &e.id,
                        &e.full_name,
                        to_json_list(&e.specialties),
                        &e.institution,
                        &e.location,
                        &e.email,
                        &e.phone,
                        &e.bio,
                        to_json_list(&e.research_interests),
                        &e.orcid,
                        e.is_platform_member,
                        e.publications_count,
                        &e.created_at,
                    ],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

const FAVORITE_COLUMNS: &str = "id, user_id, favorite_type, favorite_id, notes, created_at";

fn favorite_from_row(row: &Row) -> rusqlite::Result<Favorite> {
    Ok(Favorite {
        id: row.get(0)?,
        user_id: row.get(1)?,
        favorite_type: row.get(2)?,
        favorite_id: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Repository for per-user favorites
pub struct FavoriteRepository {
    db: Arc<DatabaseManager>,
}

impl FavoriteRepository {
    /// Create a new FavoriteRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Get a user's favorites, optionally of one type
    pub async fn get_by_user(
        &self,
        user_id: &str,
        favorite_type: Option<String>,
    ) -> Result<Vec<Favorite>> {
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                let mut filter = Filter::default();
                filter.push("user_id = ?", [user_id]);
                if let Some(t) = favorite_type {
                    filter.push("favorite_type = ?", [t]);
                }

                let sql = format!(
                    "SELECT {} FROM favorites{} ORDER BY created_at DESC",
                    FAVORITE_COLUMNS,
                    filter.where_clause()
                );
                query_list(conn, &sql, &filter.params, favorite_from_row)
            })
            .await
    }

    /// Check whether a user already favorited an item
    pub async fn exists(
        &self,
        user_id: &str,
        favorite_type: &str,
        favorite_id: &str,
    ) -> Result<bool> {
        let user_id = user_id.to_string();
        let favorite_type = favorite_type.to_string();
        let favorite_id = favorite_id.to_string();
        self.db
            .execute(move |conn| {
                let count: i64 = conn
                    .query_row(
                        "SELECT COUNT(*) FROM favorites \
                         WHERE user_id = ? AND favorite_type = ? AND favorite_id = ?",
                        rusqlite::params![&user_id, &favorite_type, &favorite_id],
                        |row| row.get(0),
                    )
                    .map_err(CuraError::DatabaseError)?;
                Ok(count > 0)
            })
            .await
    }

    /// Add a favorite; duplicates are a conflict
    pub async fn add(&self, favorite: &Favorite) -> Result<()> {
        let favorite = favorite.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO favorites \
                     (id, user_id, favorite_type, favorite_id, notes, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &favorite.id,
                        &favorite.user_id,
                        &favorite.favorite_type,
                        &favorite.favorite_id,
                        &favorite.notes,
                        &favorite.created_at,
                    ],
                )
                .map_err(|e| conflict_or_db(e, "Already favorited"))?;
                Ok(())
            })
            .await
    }

    /// Remove a favorite owned by `user_id`; false if no such row
    pub async fn remove(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        self.db
            .execute(move |conn| {
                let removed = conn
                    .execute(
                        "DELETE FROM favorites WHERE id = ? AND user_id = ?",
                        rusqlite::params![&id, &user_id],
                    )
                    .map_err(CuraError::DatabaseError)?;
                Ok(removed > 0)
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Forums
// ---------------------------------------------------------------------------

const FORUM_COLUMNS: &str = "id, name, description, category, created_by, is_active, created_at";
const POST_COLUMNS: &str = "id, forum_id, user_id, author_type, title, content, created_at";
const REPLY_COLUMNS: &str = "id, post_id, user_id, content, created_at";

fn forum_from_row(row: &Row) -> rusqlite::Result<Forum> {
    Ok(Forum {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        created_by: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<ForumPost> {
    Ok(ForumPost {
        id: row.get(0)?,
        forum_id: row.get(1)?,
        user_id: row.get(2)?,
        author_type: role_column(row, 3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn reply_from_row(row: &Row) -> rusqlite::Result<ForumReply> {
    Ok(ForumReply {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Repository for forums, posts and replies
pub struct ForumRepository {
    db: Arc<DatabaseManager>,
}

impl ForumRepository {
    /// Create a new ForumRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// List active forums
    pub async fn list(&self, page: Page) -> Result<Vec<Forum>> {
        self.db
            .execute(move |conn| {
                let sql = format!(
                    "SELECT {} FROM forums WHERE is_active = 1 ORDER BY created_at DESC{}",
                    FORUM_COLUMNS,
                    page.sql()
                );
                query_list(conn, &sql, &[], forum_from_row)
            })
            .await
    }

    /// Posts in a forum, oldest first
    pub async fn list_posts(&self, forum_id: &str, page: Page) -> Result<Vec<ForumPost>> {
        let forum_id = forum_id.to_string();
        self.db
            .execute(move |conn| {
                let sql = format!(
                    "SELECT {} FROM forum_posts WHERE forum_id = ? ORDER BY created_at ASC{}",
                    POST_COLUMNS,
                    page.sql()
                );
                query_list(conn, &sql, &[forum_id], post_from_row)
            })
            .await
    }

    /// Find a post by ID
    pub async fn find_post(&self, id: &str) -> Result<Option<ForumPost>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM forum_posts WHERE id = ?", POST_COLUMNS),
                    [&id],
                    post_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    /// Insert a post
    pub async fn create_post(&self, post: &ForumPost) -> Result<()> {
        let post = post.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO forum_posts ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                        POST_COLUMNS
                    ),
                    rusqlite::params![
                        &post.id,
                        &post.forum_id,
                        &post.user_id,
                        post.author_type.as_str(),
                        &post.title,
                        &post.content,
                        &post.created_at,
                    ],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }

    /// Replies to a post, oldest first
    pub async fn list_replies(&self, post_id: &str, page: Page) -> Result<Vec<ForumReply>> {
        let post_id = post_id.to_string();
        self.db
            .execute(move |conn| {
                let sql = format!(
                    "SELECT {} FROM forum_replies WHERE post_id = ? ORDER BY created_at ASC{}",
                    REPLY_COLUMNS,
                    page.sql()
                );
                query_list(conn, &sql, &[post_id], reply_from_row)
            })
            .await
    }

    /// Insert a reply
    pub async fn create_reply(&self, reply: &ForumReply) -> Result<()> {
        let reply = reply.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO forum_replies ({}) VALUES (?, ?, ?, ?, ?)",
                        REPLY_COLUMNS
                    ),
                    rusqlite::params![
                        &reply.id,
                        &reply.post_id,
                        &reply.user_id,
                        &reply.content,
                        &reply.created_at,
                    ],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl Repository<Forum> for ForumRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Forum>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                conn.query_row(
                    &format!("SELECT {} FROM forums WHERE id = ?", FORUM_COLUMNS),
                    [&id],
                    forum_from_row,
                )
                .optional()
                .map_err(CuraError::DatabaseError)
            })
            .await
    }

    async fn create(&self, forum: &Forum) -> Result<()> {
        let forum = forum.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    &format!("INSERT INTO forums ({}) VALUES (?, ?, ?, ?, ?, ?, ?)", FORUM_COLUMNS),
                    rusqlite::params![
                        &forum.id,
                        &forum.name,
                        &forum.description,
                        &forum.category,
                        &forum.created_by,
                        forum.is_active,
                        &forum.created_at,
                    ],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }
}

// ---------------------------------------------------------------------------
// Meeting requests
// ---------------------------------------------------------------------------

const MEETING_COLUMNS: &str =
    "id, requester_id, expert_id, message, contact_info, status, created_at, updated_at";

fn meeting_from_row(row: &Row) -> rusqlite::Result<MeetingRequest> {
    let contact_info: String = row.get(4)?;
    Ok(MeetingRequest {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        expert_id: row.get(2)?,
        message: row.get(3)?,
        contact_info: serde_json::from_str(&contact_info).map_err(|e| conversion_error(4, e))?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Repository for meeting requests
pub struct MeetingRequestRepository {
    db: Arc<DatabaseManager>,
}

impl MeetingRequestRepository {
    /// Create a new MeetingRequestRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Insert a meeting request
    pub async fn create(&self, request: &MeetingRequest) -> Result<()> {
        let request = request.clone();
        let contact_info = serde_json::to_string(&request.contact_info)
            .map_err(|e| CuraError::InvalidRequest(format!("Invalid contact_info: {}", e)))?;
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO meeting_requests \
                     (id, requester_id, expert_id, message, contact_info, status, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &request.id,
                        &request.requester_id,
                        &request.expert_id,
                        &request.message,
                        &contact_info,
                        &request.status,
                        &request.created_at,
                    ],
                )
                .map_err(CuraError::DatabaseError)?;
                Ok(())
            })
            .await
    }

    /// Requests sent by a user, newest first
    pub async fn find_by_requester(&self, requester_id: &str) -> Result<Vec<MeetingRequest>> {
        let requester_id = requester_id.to_string();
        self.db
            .execute(move |conn| {
                let sql = format!(
                    "SELECT {} FROM meeting_requests WHERE requester_id = ? \
                     ORDER BY created_at DESC",
                    MEETING_COLUMNS
                );
                query_list(conn, &sql, &[requester_id], meeting_from_row)
            })
            .await
    }
}
