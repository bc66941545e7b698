use crate::domain::analysis::{AnalysisResult, AnalysisSummary};
use crate::domain::error::{AppError, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Pool, Sqlite,
};
use std::str::FromStr;
use uuid::Uuid;

/// Persisted history of completed analyses.
pub struct AnalysisRepository {
    pool: Pool<Sqlite>,
}

impl AnalysisRepository {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                fiscal_year TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        Ok(Self { pool })
    }

    /// Store the analysis and stamp it with its new id and creation time.
    pub async fn save(&self, analysis: &mut AnalysisResult) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now();
        analysis.analysis_id = Some(id.clone());
        analysis.created_at = Some(created_at);

        let payload = serde_json::to_string(analysis)?;

        sqlx::query(
            "INSERT INTO analyses (id, company_name, fiscal_year, payload, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&analysis.general_information.company_name)
        .bind(&analysis.general_information.fiscal_year)
        .bind(payload)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save analysis: {}", e)))?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<AnalysisResult> {
        let payload: Option<(String,)> = sqlx::query_as("SELECT payload FROM analyses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch analysis: {}", e)))?;

        let (payload,) =
            payload.ok_or_else(|| AppError::NotFound(format!("Analysis {} not found", id)))?;
        Ok(serde_json::from_str(&payload)?)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AnalysisSummary>> {
        sqlx::query_as::<_, AnalysisEntity>(
            "SELECT id, company_name, fiscal_year, created_at FROM analyses ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct AnalysisEntity {
    id: String,
    company_name: String,
    fiscal_year: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<AnalysisEntity> for AnalysisSummary {
    fn from(e: AnalysisEntity) -> Self {
        Self {
            analysis_id: e.id,
            company_name: e.company_name,
            fiscal_year: e.fiscal_year,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{GeneralInformation, TaxBreakdown, TaxReturnSummary};

    fn analysis(company: &str) -> AnalysisResult {
        AnalysisResult {
            analysis_id: None,
            created_at: None,
            general_information: GeneralInformation {
                company_name: company.to_string(),
                fiscal_year: "2023".to_string(),
            },
            tax_return_summary: TaxReturnSummary {
                breakdown: TaxBreakdown {
                    revenue: 100.0,
                    expenses: 50.0,
                    depreciation: 0.0,
                    deductions: 0.0,
                    taxable_income: 50.0,
                    applied_tax_rate: "19.0%".to_string(),
                    final_tax_owed: 9.5,
                },
            },
            file_metadata: vec![],
            audit_flags: vec!["note".to_string()],
        }
    }

    async fn repository(dir: &tempfile::TempDir) -> AnalysisRepository {
        let url = format!("sqlite://{}", dir.path().join("history.db").display());
        AnalysisRepository::init(&url).await.unwrap()
    }

    #[actix_web::test]
    async fn test_save_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;

        let mut result = analysis("Acme Bv");
        repo.save(&mut result).await.unwrap();
        let id = result.analysis_id.clone().unwrap();

        let stored = repo.get(&id).await.unwrap();
        assert_eq!(stored, result);
    }

    #[actix_web::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        assert!(matches!(repo.get("nope").await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_list_recent_limits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        for company in ["A", "B", "C"] {
            repo.save(&mut analysis(company)).await.unwrap();
        }

        let recent = repo.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|s| s.fiscal_year == "2023"));
    }
}
